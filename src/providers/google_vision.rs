use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, endpoint_url, post_json};
use super::{Capability, OcrRequest, Provider, RecognizedText};
use crate::errors::ProviderError;

/// Provider name used in logs and attempt records
pub const PROVIDER_NAME: &str = "google-vision";

/// Confidence reported when the annotation carries none
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Google Cloud Vision client for text detection
#[derive(Debug)]
pub struct GoogleVision {
    client: Client,
    api_key: String,
    endpoint: String,
}

/// Annotate request body
#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    pub requests: Vec<AnnotateImageRequest>,
}

#[derive(Debug, Serialize)]
pub struct AnnotateImageRequest {
    pub image: ImageContent,
    pub features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
pub struct ImageContent {
    /// Base64 encoded image bytes
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: String,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
}

/// Annotate response body
#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateImageResponse {
    #[serde(rename = "textAnnotations", default)]
    pub text_annotations: Vec<TextAnnotation>,
}

#[derive(Debug, Deserialize)]
pub struct TextAnnotation {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// BCP-47 language of the detected text
    #[serde(default)]
    pub locale: Option<String>,
}

impl AnnotateRequest {
    /// Single-image TEXT_DETECTION request
    pub fn text_detection(image: &[u8]) -> Self {
        Self {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: BASE64.encode(image),
                },
                features: vec![Feature {
                    feature_type: "TEXT_DETECTION".to_string(),
                    max_results: 1,
                }],
            }],
        }
    }
}

impl GoogleVision {
    /// Create a new Vision client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Pull the first full-text annotation out of a response
    pub fn extract_text(response: &AnnotateResponse) -> Result<RecognizedText, ProviderError> {
        let annotation = response
            .responses
            .first()
            .and_then(|r| r.text_annotations.first())
            .filter(|a| !a.description.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER_NAME, "no text detected in image"))?;

        Ok(RecognizedText {
            text: annotation.description.clone(),
            // Vision reports a language locale, not a script
            detected_script: None,
            confidence: annotation.confidence.unwrap_or(DEFAULT_CONFIDENCE),
        })
    }
}

#[async_trait]
impl Provider for GoogleVision {
    type Input = OcrRequest;
    type Output = RecognizedText;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capability(&self) -> Capability {
        Capability::Ocr
    }

    async fn invoke(&self, input: &OcrRequest) -> Result<RecognizedText, ProviderError> {
        if input.image.is_empty() {
            return Err(ProviderError::malformed(PROVIDER_NAME, "empty image payload"));
        }

        let url = endpoint_url(PROVIDER_NAME, &self.endpoint, "v1/images:annotate", Some(&self.api_key))?;
        let request = AnnotateRequest::text_detection(&input.image);
        let response: AnnotateResponse = post_json(&self.client, PROVIDER_NAME, url, &request).await?;

        Self::extract_text(&response)
    }
}
