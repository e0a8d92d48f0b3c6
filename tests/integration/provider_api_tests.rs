/*!
 * Integration tests for the provider clients against mocked HTTP endpoints
 */

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inscriptor::errors::ProviderErrorKind;
use inscriptor::providers::google_tts::AudioSettings;
use inscriptor::providers::{
    GoogleTranslate, GoogleTts, GoogleVision, LibreTranslate, OcrRequest, Provider, SpeechRequest,
    TranslationRequest,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn ocr_request() -> OcrRequest {
    OcrRequest {
        image: Bytes::from_static(b"stone"),
        reference: "U1/1-a.png".to_string(),
    }
}

fn translation_request(target: &str) -> TranslationRequest {
    TranslationRequest {
        text: "Ancient text".to_string(),
        target_language: target.to_string(),
    }
}

async fn respond_with_status(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream says no"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_googleVision_withAnnotation_shouldReturnText() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "requests": [{
                "image": { "content": BASE64.encode(b"stone") },
                "features": [{ "type": "TEXT_DETECTION", "maxResults": 1 }]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{
                "textAnnotations": [
                    { "description": "Ancient text", "confidence": 0.82 },
                    { "description": "Ancient" }
                ]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleVision::new("test-key", server.uri(), TIMEOUT);
    let result = client.invoke(&ocr_request()).await.unwrap();

    assert_eq!(result.text, "Ancient text");
    assert_eq!(result.confidence, 0.82);
    assert!(result.detected_script.is_none());
}

#[tokio::test]
async fn test_googleVision_withNoAnnotations_shouldBeMalformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [{}] })))
        .mount(&server)
        .await;

    let client = GoogleVision::new("test-key", server.uri(), TIMEOUT);
    let error = client.invoke(&ocr_request()).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::MalformedResponse);
    assert_eq!(error.provider, "google-vision");
}

#[tokio::test]
async fn test_googleVision_withForbidden_shouldBeUnauthorized() {
    let server = MockServer::start().await;
    respond_with_status(&server, 403).await;

    let client = GoogleVision::new("bad-key", server.uri(), TIMEOUT);
    let error = client.invoke(&ocr_request()).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::Unauthorized);
    assert!(!error.message.contains("bad-key"));
}

#[tokio::test]
async fn test_googleTranslate_withTranslation_shouldReturnIt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/language/translate/v2"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "q": "Ancient text", "target": "es", "format": "text" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "translations": [{ "translatedText": "Texto antiguo", "detectedSourceLanguage": "en" }] }
        })))
        .mount(&server)
        .await;

    let client = GoogleTranslate::new("test-key", server.uri(), TIMEOUT);
    let result = client.invoke(&translation_request("es")).await.unwrap();

    assert_eq!(result.translated_text, "Texto antiguo");
}

#[tokio::test]
async fn test_googleTranslate_withRateLimit_shouldBeRateLimited() {
    let server = MockServer::start().await;
    respond_with_status(&server, 429).await;

    let client = GoogleTranslate::new("test-key", server.uri(), TIMEOUT);
    let error = client.invoke(&translation_request("es")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::RateLimited);
}

#[tokio::test]
async fn test_googleTranslate_withGarbageBody_shouldBeMalformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = GoogleTranslate::new("test-key", server.uri(), TIMEOUT);
    let error = client.invoke(&translation_request("es")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_libreTranslate_shouldSendAutoSourceAndKey() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .and(body_partial_json(json!({
            "q": "Ancient text",
            "source": "auto",
            "target": "hi",
            "api_key": "libre-key"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "translatedText": "प्राचीन पाठ" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LibreTranslate::new(server.uri(), Some("libre-key".to_string()), TIMEOUT);
    let result = client.invoke(&translation_request("hi")).await.unwrap();

    assert_eq!(result.translated_text, "प्राचीन पाठ");
}

#[tokio::test]
async fn test_libreTranslate_withErrorField_shouldBeMalformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "target not supported" })))
        .mount(&server)
        .await;

    let client = LibreTranslate::new(server.uri(), None, TIMEOUT);
    let error = client.invoke(&translation_request("xx")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::MalformedResponse);
    assert!(error.message.contains("target not supported"));
}

#[tokio::test]
async fn test_libreTranslate_withServerError_shouldBeUnavailable() {
    let server = MockServer::start().await;
    respond_with_status(&server, 503).await;

    let client = LibreTranslate::new(server.uri(), None, TIMEOUT);
    let error = client.invoke(&translation_request("es")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::Unavailable);
}

#[tokio::test]
async fn test_libreTranslate_withGatewayTimeout_shouldBeTimeout() {
    let server = MockServer::start().await;
    respond_with_status(&server, 504).await;

    let client = LibreTranslate::new(server.uri(), None, TIMEOUT);
    let error = client.invoke(&translation_request("es")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::Timeout);
}

#[tokio::test]
async fn test_libreTranslate_withSlowServer_shouldTimeOut() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "translatedText": "late" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = LibreTranslate::new(server.uri(), None, Duration::from_millis(50));
    let error = client.invoke(&translation_request("es")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachableEndpoint_shouldBeUnavailable() {
    // Nothing listens on port 9 of localhost
    let client = LibreTranslate::new("http://127.0.0.1:9", None, TIMEOUT);
    let error = client.invoke(&translation_request("es")).await.unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::Unavailable);
}

#[tokio::test]
async fn test_googleTts_withAudio_shouldDecodeIt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "input": { "text": "Texto antiguo" },
            "voice": { "languageCode": "es-ES", "ssmlGender": "NEUTRAL" },
            "audioConfig": { "audioEncoding": "MP3" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "audioContent": BASE64.encode(b"ID3 audio")
        })))
        .mount(&server)
        .await;

    let client = GoogleTts::new("test-key", server.uri(), TIMEOUT, AudioSettings::default());
    let audio = client
        .invoke(&SpeechRequest {
            text: "Texto antiguo".to_string(),
            voice_locale: "es-ES".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(audio.bytes, Bytes::from_static(b"ID3 audio"));
    assert_eq!(audio.extension, "mp3");
    assert_eq!(audio.content_type, "audio/mpeg");
}

#[tokio::test]
async fn test_googleTts_withoutAudioContent_shouldBeMalformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = GoogleTts::new("test-key", server.uri(), TIMEOUT, AudioSettings::default());
    let error = client
        .invoke(&SpeechRequest {
            text: "Texto antiguo".to_string(),
            voice_locale: "es-ES".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(error.kind, ProviderErrorKind::MalformedResponse);
}
