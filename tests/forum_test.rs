use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use skinsense_api::{
    CommentSource, ForumConfig, ForumSearch, RedditComments, RedditSearchClient,
};

async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn stub_post(title: &str, subreddit: &str) -> Value {
    json!({
        "data": {
            "title": title,
            "selftext": "I tried this and it works",
            "score": 60,
            "num_comments": 12,
            "created_utc": 1_700_000_000.0,
            "permalink": format!("/r/{}/comments/1/{}", subreddit, title),
            "subreddit": subreddit
        }
    })
}

async fn search_with_one_blocked_channel(
    Path(sub): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    if sub == "SkincareAddiction" {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(Json(json!({
        "data": {
            "children": [
                stub_post("cerave-review", &sub),
                stub_post("cerave-question", &sub)
            ]
        }
    })))
}

fn client_for(base_url: String) -> RedditSearchClient {
    RedditSearchClient::new(ForumConfig {
        base_url,
        ..ForumConfig::default()
    })
}

#[tokio::test]
async fn one_rate_limited_channel_does_not_suppress_the_other() {
    let app = Router::new().route("/r/:sub/search.json", get(search_with_one_blocked_channel));
    let base_url = spawn_stub(app).await;

    let posts = client_for(base_url).search("Moisturizing Cream", "CeraVe").await;

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.subreddit == "AsianBeauty"));
    assert!(posts.iter().all(|p| p.match_score == 1.0));
}

#[tokio::test]
async fn all_channels_failing_degrades_to_empty() {
    let app = Router::new().route(
        "/r/:sub/search.json",
        get(|| async { StatusCode::TOO_MANY_REQUESTS }),
    );
    let base_url = spawn_stub(app).await;

    let posts = client_for(base_url).search("Moisturizing Cream", "CeraVe").await;
    assert!(posts.is_empty());
}

#[tokio::test]
async fn search_results_are_capped_at_ten() {
    let app = Router::new().route(
        "/r/:sub/search.json",
        get(|Path(sub): Path<String>| async move {
            let children: Vec<Value> = (0..9)
                .map(|i| stub_post(&format!("post-{}", i), &sub))
                .collect();
            Json(json!({ "data": { "children": children } }))
        }),
    );
    let base_url = spawn_stub(app).await;

    let posts = client_for(base_url).search("Moisturizing Cream", "CeraVe").await;
    assert_eq!(posts.len(), 10);
}

fn comment(body: &str, score: i64) -> Value {
    json!({ "data": { "body": body, "score": score } })
}

#[tokio::test]
async fn comment_fetch_filters_and_survives_failures() {
    let app = Router::new().route(
        "/post.json",
        get(|| async {
            Json(json!([
                { "data": {} },
                { "data": { "children": [
                    comment("I have tried a lot of creams and this one finally works for me.", 10),
                    comment("nice", 25),
                    comment("This is a long enough comment that mentions moisturizing results daily.", 1),
                ] } }
            ]))
        }),
    );
    let base_url = spawn_stub(app).await;

    let source = RedditComments::new("SkinSense-test/1.0", 5);
    let comments = source
        .top_comments(&format!("{}/post", base_url), "Moisturizing Cream")
        .await;

    assert_eq!(comments.len(), 1);
    assert!(comments[0].body.contains("finally works"));

    // A dead endpoint is a non-event.
    let none = source
        .top_comments("http://127.0.0.1:1/gone", "Moisturizing Cream")
        .await;
    assert!(none.is_empty());
}
