use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, endpoint_url, post_json};
use super::{Capability, Provider, SpeechRequest, SynthesizedAudio};
use crate::errors::ProviderError;

pub const PROVIDER_NAME: &str = "google-tts";

/// Voice and encoding parameters sent with every synthesis request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// MP3, OGG_OPUS or LINEAR16
    #[serde(default = "default_audio_encoding")]
    pub audio_encoding: String,

    #[serde(default = "default_speaking_rate")]
    pub speaking_rate: f32,

    #[serde(default)]
    pub pitch: f32,

    #[serde(default = "default_ssml_gender")]
    pub ssml_gender: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            audio_encoding: default_audio_encoding(),
            speaking_rate: default_speaking_rate(),
            pitch: 0.0,
            ssml_gender: default_ssml_gender(),
        }
    }
}

impl AudioSettings {
    /// File extension and content type for the configured encoding
    pub fn container(&self) -> (&'static str, &'static str) {
        match self.audio_encoding.to_uppercase().as_str() {
            "OGG_OPUS" => ("ogg", "audio/ogg"),
            "LINEAR16" => ("wav", "audio/wav"),
            _ => ("mp3", "audio/mpeg"),
        }
    }
}

fn default_audio_encoding() -> String {
    "MP3".to_string()
}

fn default_speaking_rate() -> f32 {
    0.9
}

fn default_ssml_gender() -> String {
    "NEUTRAL".to_string()
}

/// Google Cloud Text-to-Speech client
#[derive(Debug)]
pub struct GoogleTts {
    client: Client,
    api_key: String,
    endpoint: String,
    settings: AudioSettings,
}

#[derive(Debug, Serialize)]
pub struct SynthesizeRequest<'a> {
    pub input: SynthesisInput<'a>,
    pub voice: VoiceSelection<'a>,
    #[serde(rename = "audioConfig")]
    pub audio_config: AudioConfig<'a>,
}

#[derive(Debug, Serialize)]
pub struct SynthesisInput<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct VoiceSelection<'a> {
    #[serde(rename = "languageCode")]
    pub language_code: &'a str,
    #[serde(rename = "ssmlGender")]
    pub ssml_gender: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AudioConfig<'a> {
    #[serde(rename = "audioEncoding")]
    pub audio_encoding: &'a str,
    #[serde(rename = "speakingRate")]
    pub speaking_rate: f32,
    pub pitch: f32,
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeResponse {
    /// Base64 encoded audio
    #[serde(rename = "audioContent")]
    pub audio_content: Option<String>,
}

impl GoogleTts {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
        settings: AudioSettings,
    ) -> Self {
        Self {
            client: build_client(timeout),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            settings,
        }
    }

    pub fn build_request<'a>(&'a self, input: &'a SpeechRequest) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput { text: &input.text },
            voice: VoiceSelection {
                language_code: &input.voice_locale,
                ssml_gender: &self.settings.ssml_gender,
            },
            audio_config: AudioConfig {
                audio_encoding: &self.settings.audio_encoding,
                speaking_rate: self.settings.speaking_rate,
                pitch: self.settings.pitch,
            },
        }
    }

    /// Decode the audio payload; an absent or empty payload is malformed
    pub fn decode_audio(&self, response: &SynthesizeResponse) -> Result<SynthesizedAudio, ProviderError> {
        let encoded = response
            .audio_content
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::malformed(PROVIDER_NAME, "no audio content received"))?;

        let decoded = BASE64
            .decode(encoded)
            .map_err(|e| ProviderError::malformed(PROVIDER_NAME, format!("invalid base64 audio: {}", e)))?;

        let (extension, content_type) = self.settings.container();
        Ok(SynthesizedAudio {
            bytes: Bytes::from(decoded),
            extension: extension.to_string(),
            content_type: content_type.to_string(),
        })
    }
}

#[async_trait]
impl Provider for GoogleTts {
    type Input = SpeechRequest;
    type Output = SynthesizedAudio;

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn capability(&self) -> Capability {
        Capability::Speech
    }

    async fn invoke(&self, input: &SpeechRequest) -> Result<SynthesizedAudio, ProviderError> {
        let url = endpoint_url(PROVIDER_NAME, &self.endpoint, "v1/text:synthesize", Some(&self.api_key))?;
        let request = self.build_request(input);
        let response: SynthesizeResponse = post_json(&self.client, PROVIDER_NAME, url, &request).await?;

        self.decode_audio(&response)
    }
}
