use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, endpoint_url, post_json};
use super::{Capability, Provider, TranslatedText, TranslationRequest};
use crate::errors::ProviderError;

pub const PROVIDER_NAME: &str = "google-translate";

/// Google Cloud Translation (v2) client, the primary translation provider
#[derive(Debug)]
pub struct GoogleTranslate {
    client: Client,
    api_key: String,
    endpoint: String,
}

/// Translate request body; source is omitted so the API auto-detects it
#[derive(Debug, Serialize)]
pub struct TranslateRequestBody<'a> {
    pub q: &'a str,
    pub target: &'a str,
    pub format: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TranslateResponse {
    pub data: Option<TranslateData>,
}

#[derive(Debug, Deserialize)]
pub struct TranslateData {
    #[serde(default)]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
pub struct Translation {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
    #[serde(rename = "detectedSourceLanguage", default)]
    pub detected_source_language: Option<String>,
}

impl GoogleTranslate {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn extract_text(response: &TranslateResponse) -> Result<TranslatedText, ProviderError> {
        response
            .data
            .as_ref()
            .and_then(|d| d.translations.first())
            .map(|t| TranslatedText {
                translated_text: t.translated_text.clone(),
            })
            .ok_or_else(|| ProviderError::malformed(PROVIDER_NAME, "response has no translations"))
    }
}

#[async_trait]
impl Provider for GoogleTranslate {
    type Input = TranslationRequest;
    type Output = TranslatedText;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capability(&self) -> Capability {
        Capability::Translation
    }

    async fn invoke(&self, input: &TranslationRequest) -> Result<TranslatedText, ProviderError> {
        let url = endpoint_url(PROVIDER_NAME, &self.endpoint, "language/translate/v2", Some(&self.api_key))?;
        let body = TranslateRequestBody {
            q: &input.text,
            target: &input.target_language,
            format: "text",
        };

        let response: TranslateResponse = post_json(&self.client, PROVIDER_NAME, url, &body).await?;
        Self::extract_text(&response)
    }
}
