use clap::Parser;
use skinsense_api::api::serve;
use skinsense_api::{
    AnalysisPipeline, AppConfig, ProductCache, RedditComments, RedditSearchClient, WorkersAiClient,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skinsense-api", about = "Skincare product analysis backend")]
struct Cli {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Cache database URL (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database_url) = cli.database_url {
        config.database_url = database_url;
    }

    info!("Starting SkinSense API (model: {})", config.llm.model);

    let cache = ProductCache::connect(&config.database_url).await?;
    let llm = Arc::new(WorkersAiClient::new(config.llm.clone()));
    let comments = Arc::new(RedditComments::new(
        &config.forum.user_agent,
        config.forum.timeout_seconds,
    ));
    let forum = Arc::new(RedditSearchClient::new(config.forum.clone()));

    let pipeline = Arc::new(AnalysisPipeline::new(cache, llm, forum, comments));

    serve(&config.host, config.port, pipeline).await
}
