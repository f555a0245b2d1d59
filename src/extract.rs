use crate::llm::{salvage_json, LlmClient};
use crate::types::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Raw product identity scraped from a page by the extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub brand: String,
}

/// Cleaned product identity with the model's confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedProduct {
    pub product_name: String,
    pub brand: String,
    pub confidence: f64,
}

/// Confidence reported when the model reply is unusable and the raw page
/// values are passed through unchanged.
const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Clean up a scraped product name and brand with the language model.
///
/// The raw page values always survive as the fallback: an unusable model
/// reply lowers confidence, it never loses the product identity.
pub async fn extract_product(
    llm: &dyn LlmClient,
    page_info: &PageInfo,
    page_text: &str,
) -> Result<ExtractedProduct> {
    let short_text: String = page_text.chars().take(500).collect();
    let prompt = build_prompt(page_info, &short_text);

    let reply = llm.chat(&prompt).await?;

    let mut extracted = ExtractedProduct {
        product_name: page_info.product_name.clone(),
        brand: page_info.brand.clone(),
        confidence: FALLBACK_CONFIDENCE,
    };

    let Some(parsed) = salvage_json(&reply) else {
        warn!("Unparseable extraction reply, keeping raw page values");
        return Ok(extracted);
    };

    if let Some(name) = parsed.get("productName").and_then(|v| v.as_str()) {
        if !name.is_empty() {
            extracted.product_name = name.to_string();
        }
    }
    if let Some(brand) = parsed.get("brand").and_then(|v| v.as_str()) {
        if !brand.is_empty() {
            extracted.brand = brand.to_string();
        }
    }
    if let Some(confidence) = parsed.get("confidence").and_then(|v| v.as_f64()) {
        extracted.confidence = confidence;
    }

    Ok(extracted)
}

fn build_prompt(page_info: &PageInfo, short_text: &str) -> String {
    format!(
        r#"Extract the clean product name and brand from this e-commerce page.

Product name from page: "{name}"
Brand from page: "{brand}"
Page text: "{text}"

Return a JSON object like this:
{{
  "productName": "clean product name",
  "brand": "brand name",
  "confidence": 0.9
}}

Example:
Input: "Buy CeraVe Moisturizing Cream - 19 oz | Free Shipping"
Output: {{"productName": "Moisturizing Cream", "brand": "CeraVe", "confidence": 0.95}}"#,
        name = page_info.product_name,
        brand = page_info.brand,
        text = short_text,
    )
}
