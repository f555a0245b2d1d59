use crate::llm::{salvage_json, LlmClient};
use crate::types::{IngredientEntry, IngredientReport, Result, UserProfile};
use serde_json::Value;
use tracing::{debug, warn};

/// Classify ingredients into good/bad sets for a specific user profile.
///
/// Empty input short-circuits without a model call. The model transport is
/// on the critical path and its failure propagates; malformed model output
/// is not a failure and degrades field-by-field to neutral defaults.
pub async fn classify_ingredients(
    llm: &dyn LlmClient,
    ingredients: &[String],
    profile: &UserProfile,
) -> Result<IngredientReport> {
    if ingredients.is_empty() {
        debug!("No ingredients to classify, skipping model call");
        return Ok(IngredientReport::neutral("No ingredients found to analyze."));
    }

    let prompt = build_prompt(ingredients, profile);
    let reply = llm.chat(&prompt).await?;

    match salvage_json(&reply) {
        Some(parsed) => Ok(report_from_value(&parsed)),
        None => {
            warn!("Unparseable classifier reply ({} chars), using defaults", reply.len());
            Ok(IngredientReport::neutral("Analysis completed"))
        }
    }
}

fn build_prompt(ingredients: &[String], profile: &UserProfile) -> String {
    format!(
        r#"You are a skincare expert. Analyze these ingredients for someone with {skin_type} skin in a {climate} climate with concerns about {concerns}.

Ingredients: {ingredients}

Categorize each ingredient as GOOD or BAD for this person. Return JSON:
{{
  "good": [{{"name": "Niacinamide", "reason": "Controls oil"}}],
  "bad": [{{"name": "Alcohol", "reason": "Drying"}}],
  "score": 7.5,
  "reasoning": "Overall assessment"
}}

Score should be 1-10."#,
        skin_type = profile.skin_type,
        climate = profile.climate,
        concerns = profile.concerns.join(", "),
        ingredients = ingredients.join(", "),
    )
}

fn report_from_value(parsed: &Value) -> IngredientReport {
    IngredientReport {
        good: entry_list(parsed.get("good")),
        bad: entry_list(parsed.get("bad")),
        score: parsed.get("score").and_then(Value::as_f64).unwrap_or(5.0),
        reasoning: parsed
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or("Analysis completed")
            .to_string(),
    }
}

fn entry_list(value: Option<&Value>) -> Vec<IngredientEntry> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
