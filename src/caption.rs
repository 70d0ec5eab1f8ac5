use crate::{config::Config, domain::CaptionSource, errors::AppError, models::CaptionPair};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const FALLBACK_CAPTION: &str = "YOLO to the moon!";
pub const FALLBACK_VIBE: &str = "Retro Chaos Glitch";

const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Calls the Gemini text API for a caption/vibe pair. Any failure — network,
/// non-2xx status, timeout, or a response without the expected labeled
/// lines — resolves to the fixed fallback values, never an error.
pub struct GeminiCaptionGenerator {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiCaptionGenerator {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.caption_timeout_secs))
            .build()
            .map_err(|e| AppError::InitError(format!("Failed to build HTTP client: {}", e)))?;
        let endpoint = config
            .gemini_endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Ok(Self {
            http,
            endpoint,
            api_key: config.gemini_api_key.clone(),
        })
    }

    async fn request_text(&self, title: &str, tags: &[String]) -> anyhow::Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(title, tags),
                }],
            }],
        };
        let url = format!("{}?key={}", self.endpoint, self.api_key);

        let response: GenerateResponse = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?
            .error_for_status()
            .context("Gemini returned an error status")?
            .json()
            .await
            .context("Gemini response was not valid JSON")?;

        response
            .candidates
            .into_iter()
            .flatten()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .context("Gemini response contained no candidate text")
    }
}

#[async_trait]
impl CaptionSource for GeminiCaptionGenerator {
    async fn generate(&self, title: &str, tags: &[String]) -> CaptionPair {
        match self.request_text(title, tags).await {
            Ok(text) => parse_pair(&text),
            Err(err) => {
                tracing::warn!(error = %err, %title, "Caption generation failed, using fallback pair");
                CaptionPair {
                    ai_caption: FALLBACK_CAPTION.to_string(),
                    ai_vibe: FALLBACK_VIBE.to_string(),
                }
            }
        }
    }
}

fn build_prompt(title: &str, tags: &[String]) -> String {
    format!(
        "Generate a funny caption and a one-liner cyberpunk vibe for a meme.\n\
         Title: \"{}\"\n\
         Tags: {}\n\
         \n\
         Format:\n\
         Caption: ...\n\
         Vibe: ...\n",
        title,
        tags.join(", ")
    )
}

/// Pulls the `Caption:` / `Vibe:` lines out of the model's reply. Either
/// field that fails to match falls back on its own.
fn parse_pair(text: &str) -> CaptionPair {
    CaptionPair {
        ai_caption: extract_labeled(text, "Caption:")
            .unwrap_or_else(|| FALLBACK_CAPTION.to_string()),
        ai_vibe: extract_labeled(text, "Vibe:").unwrap_or_else(|| FALLBACK_VIBE.to_string()),
    }
}

fn extract_labeled(text: &str, label: &str) -> Option<String> {
    for line in text.lines() {
        let line = line.trim_start();
        if let Some(prefix) = line.get(..label.len()) {
            if prefix.eq_ignore_ascii_case(label) {
                let value = line[label.len()..].trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

// --- Gemini API payloads ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labeled_lines() {
        let text = "Caption: Much wow, very future\nVibe: Chrome Doge Dreams";
        let pair = parse_pair(text);
        assert_eq!(pair.ai_caption, "Much wow, very future");
        assert_eq!(pair.ai_vibe, "Chrome Doge Dreams");
    }

    #[test]
    fn labels_match_case_insensitively_with_leading_noise() {
        let text = "Sure! Here you go:\n  caption:   Stonks only go up  \nVIBE: Neon Overdrive";
        let pair = parse_pair(text);
        assert_eq!(pair.ai_caption, "Stonks only go up");
        assert_eq!(pair.ai_vibe, "Neon Overdrive");
    }

    #[test]
    fn missing_field_falls_back_individually() {
        let pair = parse_pair("Caption: still good");
        assert_eq!(pair.ai_caption, "still good");
        assert_eq!(pair.ai_vibe, FALLBACK_VIBE);

        let pair = parse_pair("no labels at all");
        assert_eq!(pair.ai_caption, FALLBACK_CAPTION);
        assert_eq!(pair.ai_vibe, FALLBACK_VIBE);
    }

    #[test]
    fn empty_label_value_counts_as_missing() {
        let pair = parse_pair("Caption:\nVibe: fine");
        assert_eq!(pair.ai_caption, FALLBACK_CAPTION);
        assert_eq!(pair.ai_vibe, "fine");
    }

    #[test]
    fn prompt_embeds_title_and_tags() {
        let prompt = build_prompt("Doge2077", &["doge".to_string(), "cyber".to_string()]);
        assert!(prompt.contains("Title: \"Doge2077\""));
        assert!(prompt.contains("Tags: doge, cyber"));
    }

    #[tokio::test]
    async fn unreachable_upstream_yields_fallback_pair() {
        let config = Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            client_origin: None,
            aws_region: "us-east-1".to_string(),
            aws_endpoint: None,
            memes_table: "memes".to_string(),
            bids_table: "bids".to_string(),
            gemini_api_key: "test-key".to_string(),
            // Nothing listens here; the request fails fast.
            gemini_endpoint: Some("http://127.0.0.1:9/generate".to_string()),
            caption_timeout_secs: 1,
        };
        let generator = GeminiCaptionGenerator::new(&config).unwrap();
        let pair = generator.generate("Doge2077", &[]).await;
        assert_eq!(pair.ai_caption, FALLBACK_CAPTION);
        assert_eq!(pair.ai_vibe, FALLBACK_VIBE);
    }
}
