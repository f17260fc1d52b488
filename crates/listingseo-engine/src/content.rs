//! Optimized title/description generation with a deterministic offline path.

use std::sync::Arc;
use std::time::Duration;

use listingseo_core::{Marketplace, NewGeneratedContent};
use serde_json::Value;

use crate::keywords::dedupe_case_insensitive;
use crate::providers::TextGenerator;

pub const MAX_TITLE_CHARS: usize = 150;
pub const MAX_DESCRIPTION_CHARS: usize = 800;
pub const MAX_RECOMMENDED_KEYWORDS: usize = 25;
/// Keywords included in the prompt.
const PROMPT_KEYWORD_LIMIT: usize = 40;

/// Score used when the model answers without a usable `seoScore`.
pub const DEFAULT_MODEL_SCORE: i32 = 78;
/// Score when no generator is configured.
pub const FALLBACK_SCORE_NO_PROVIDER: i32 = 72;
/// Score when the generator call fails or its answer cannot be parsed.
pub const FALLBACK_SCORE_PROVIDER_ERROR: i32 = 73;

const MIN_MODEL_SCORE: i32 = 60;
const MAX_MODEL_SCORE: i32 = 100;

/// Inputs for one generation.
#[derive(Debug, Clone, Copy)]
pub struct ContentRequest<'a> {
    pub product_name: &'a str,
    pub product_description: &'a str,
    pub competitor_titles: &'a [String],
    pub keywords: &'a [String],
    pub marketplace: Marketplace,
}

#[derive(Clone)]
pub struct ContentGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
}

impl ContentGenerator {
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    /// Produce listing content for `request`.
    ///
    /// Never fails. Without a generator, or when the call errors, times out,
    /// or returns no parseable JSON object, the offline template is used.
    pub async fn generate(&self, request: &ContentRequest<'_>) -> NewGeneratedContent {
        let Some(generator) = &self.generator else {
            return fallback_content(request, FALLBACK_SCORE_NO_PROVIDER, String::new(), String::new());
        };

        let prompt = build_prompt(request);

        let raw = match tokio::time::timeout(self.timeout, generator.generate(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "content generation failed; using offline template");
                return fallback_content(request, FALLBACK_SCORE_PROVIDER_ERROR, prompt, String::new());
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "content generation timed out; using offline template"
                );
                return fallback_content(request, FALLBACK_SCORE_PROVIDER_ERROR, prompt, String::new());
            }
        };

        let Some(parsed) = parse_trailing_json(&raw) else {
            tracing::warn!("model answer had no parseable JSON object; using offline template");
            return fallback_content(request, FALLBACK_SCORE_PROVIDER_ERROR, prompt, raw);
        };

        content_from_model(request, &parsed, prompt, raw)
    }
}

/// Prompt asking the model to work only from competitor-derived material.
#[must_use]
pub fn build_prompt(request: &ContentRequest<'_>) -> String {
    let keywords = dedupe_case_insensitive(request.keywords, PROMPT_KEYWORD_LIMIT);
    format!(
        "You are an e-commerce SEO specialist writing a {marketplace} listing.\n\
         Base your wording ONLY on the competitor titles and competitor keywords below; \
         do not mine the seller's own description for keywords.\n\
         Requirements:\n\
         - title: at most {MAX_TITLE_CHARS} characters, with 2-4 of the highest-value keywords worked in naturally\n\
         - description: 300-700 characters, benefit-led, using 6-10 keywords naturally\n\
         - keywords: an array of 15-25 search keywords\n\
         - seoScore: a number from 0 to 100\n\
         Reply with a single JSON object with exactly the keys title, description, keywords, seoScore.\n\
         Product: {product}\n\
         Competitor titles: {titles}\n\
         Competitor keywords: {keywords}\n",
        marketplace = request.marketplace,
        product = request.product_name,
        titles = request.competitor_titles.join(" | "),
        keywords = keywords.join(", "),
    )
}

/// Parse the JSON object that ends the model's answer.
///
/// Trailing Markdown code fences are ignored; the object spans from the first
/// `{` to the closing `}` at the end of the text.
#[must_use]
pub fn parse_trailing_json(text: &str) -> Option<Value> {
    let trimmed = text.trim().trim_end_matches('`').trim_end();
    if !trimmed.ends_with('}') {
        return None;
    }
    let start = trimmed.find('{')?;
    match serde_json::from_str::<Value>(&trimmed[start..]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn content_from_model(
    request: &ContentRequest<'_>,
    parsed: &Value,
    prompt: String,
    raw: String,
) -> NewGeneratedContent {
    let title = non_empty_str(parsed.get("title")).unwrap_or(request.product_name);
    let description = non_empty_str(parsed.get("description")).unwrap_or(raw.as_str());

    let model_keywords: Vec<String> = parsed
        .get("keywords")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let recommended_keywords = dedupe_case_insensitive(
        model_keywords.iter().chain(request.keywords.iter()),
        MAX_RECOMMENDED_KEYWORDS,
    );

    NewGeneratedContent {
        optimized_title: truncate_chars(title.trim(), MAX_TITLE_CHARS),
        optimized_description: truncate_chars(description.trim(), MAX_DESCRIPTION_CHARS),
        recommended_keywords,
        seo_score: score_from(parsed.get("seoScore")),
        prompt,
        raw_response: raw,
    }
}

fn fallback_content(
    request: &ContentRequest<'_>,
    seo_score: i32,
    prompt: String,
    raw_response: String,
) -> NewGeneratedContent {
    let description = format!(
        "Optimized listing for {}. Product: {}. {}",
        request.marketplace, request.product_name, request.product_description
    );

    NewGeneratedContent {
        optimized_title: truncate_chars(request.product_name.trim(), MAX_TITLE_CHARS),
        optimized_description: truncate_chars(description.trim_end(), MAX_DESCRIPTION_CHARS),
        recommended_keywords: dedupe_case_insensitive(request.keywords, MAX_RECOMMENDED_KEYWORDS),
        seo_score,
        prompt,
        raw_response,
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Model score rounded and clamped to 60..=100; missing, zero, or
/// non-numeric values give [`DEFAULT_MODEL_SCORE`].
fn score_from(value: Option<&Value>) -> i32 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(score) if score.is_finite() && score != 0.0 => {
            #[allow(clippy::cast_possible_truncation)]
            let rounded = score.clamp(f64::from(i32::MIN), f64::from(i32::MAX)).round() as i32;
            rounded.clamp(MIN_MODEL_SCORE, MAX_MODEL_SCORE)
        }
        _ => DEFAULT_MODEL_SCORE,
    }
}

/// Truncate to at most `max` characters on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
