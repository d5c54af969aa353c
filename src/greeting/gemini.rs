use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::GreetingProvider;
use crate::attendance::AttendanceKind;
use crate::capture::StillImage;

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String, //base64 string
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    status: Option<String>,
}

pub struct GeminiGreeter {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGreeter {
    pub fn new(api_key: String, model: String, endpoint: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        info!(
            "Initialized Gemini greeter with model {} at {}",
            model, base_url
        );

        Ok(Self {
            client,
            api_key,
            model,
            base_url,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

fn prompt(staff_name: &str, kind: AttendanceKind) -> String {
    match kind {
        AttendanceKind::ClockIn => format!(
            "The user {} is clocking in for work. Analyze their facial expression in the image \
             and generate a short, warm, professional, and energetic 1-sentence welcome message. \
             If they look happy, mention it. If they look tired, be encouraging.",
            staff_name
        ),
        AttendanceKind::ClockOut => format!(
            "The user {} is clocking out. Generate a warm 1-sentence goodbye message thanking \
             them for their hard work based on the image.",
            staff_name
        ),
    }
}

fn request_body(image: &StillImage, staff_name: &str, kind: AttendanceKind) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.to_string(),
                        data: BASE64.encode(&image.bytes),
                    },
                },
                Part::Text {
                    text: prompt(staff_name, kind),
                },
            ],
        }],
    }
}

fn response_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default()
}

#[async_trait]
impl GreetingProvider for GeminiGreeter {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn generate(
        &self,
        image: &StillImage,
        staff_name: &str,
        kind: AttendanceKind,
    ) -> Result<String> {
        let body = request_body(image, staff_name, kind);

        debug!("Requesting {} greeting for {}", kind.as_str(), staff_name);

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send request to Gemini")?;

        let status = response.status();
        let response_text_raw = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            error!(
                "Gemini request failed with status {}: {}",
                status, response_text_raw
            );

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text_raw) {
                return Err(anyhow!(
                    "Gemini error: {} (status: {:?})",
                    error_response.error.message,
                    error_response.error.status
                ));
            }

            return Err(anyhow!(
                "Gemini request failed with status {}: {}",
                status,
                response_text_raw
            ));
        }

        let parsed: GenerateResponse = serde_json::from_str(&response_text_raw)
            .context("Failed to parse Gemini response")?;

        Ok(response_text(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let image = StillImage::png(vec![0xde, 0xad]);
        let body = request_body(&image, "Alex Chen", AttendanceKind::ClockIn);
        let json = serde_json::to_value(&body).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[0]["inline_data"]["data"], "3q0=");
        assert!(parts[1]["text"]
            .as_str()
            .unwrap()
            .contains("Alex Chen is clocking in"));
    }

    #[test]
    fn test_response_text_joins_parts() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Great "},{"text":"to see you!"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(parsed), "Great to see you!");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response_text(parsed), "");
    }

    #[test]
    fn test_url_uses_model() {
        let greeter = GeminiGreeter::new(
            "key".to_string(),
            "gemini-2.5-flash".to_string(),
            Some("http://localhost:9999/v1beta/".to_string()),
        )
        .unwrap();
        assert_eq!(
            greeter.url(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_clock_out_prompt() {
        assert!(prompt("Sam", AttendanceKind::ClockOut).contains("Sam is clocking out"));
    }
}
