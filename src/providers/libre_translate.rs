use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, endpoint_url, post_json};
use super::{Capability, Provider, TranslatedText, TranslationRequest};
use crate::errors::ProviderError;

pub const PROVIDER_NAME: &str = "libretranslate";

/// LibreTranslate client, the open fallback translation endpoint
#[derive(Debug)]
pub struct LibreTranslate {
    client: Client,
    endpoint: String,
    /// Only required by hosted instances that enforce keys
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibreRequest<'a> {
    pub q: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct LibreResponse {
    #[serde(rename = "translatedText")]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LibreTranslate {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl Provider for LibreTranslate {
    type Input = TranslationRequest;
    type Output = TranslatedText;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capability(&self) -> Capability {
        Capability::Translation
    }

    async fn invoke(&self, input: &TranslationRequest) -> Result<TranslatedText, ProviderError> {
        let url = endpoint_url(PROVIDER_NAME, &self.endpoint, "translate", None)?;
        let body = LibreRequest {
            q: &input.text,
            source: "auto",
            target: &input.target_language,
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response: LibreResponse = post_json(&self.client, PROVIDER_NAME, url, &body).await?;

        match response.translated_text {
            Some(text) => Ok(TranslatedText { translated_text: text }),
            None => Err(ProviderError::malformed(
                PROVIDER_NAME,
                response.error.unwrap_or_else(|| "missing translatedText".to_string()),
            )),
        }
    }
}
