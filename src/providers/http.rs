/*!
 * Shared HTTP transport for the REST provider clients.
 *
 * Maps transport failures and HTTP statuses onto `ProviderErrorKind`:
 * - 401 / 403 -> Unauthorized
 * - 429 -> RateLimited
 * - 408 / 504 and client-side timeouts -> Timeout
 * - any other non-2xx, connect and DNS failures -> Unavailable
 * - 2xx bodies that do not parse -> MalformedResponse
 */

use std::time::Duration;

use log::debug;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::{ProviderError, ProviderErrorKind};

/// Longest slice of an error body kept in diagnostics
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Build an HTTP client bounded by the given per-call timeout
pub fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_default()
}

/// Join `path` onto `base` and append the API key as a `key` query parameter
pub fn endpoint_url(
    provider: &str,
    base: &str,
    path: &str,
    api_key: Option<&str>,
) -> Result<Url, ProviderError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    let mut url = Url::parse(&joined)
        .map_err(|e| ProviderError::unavailable(provider, format!("invalid endpoint '{}': {}", joined, e)))?;

    if let Some(key) = api_key {
        url.query_pairs_mut().append_pair("key", key);
    }

    Ok(url)
}

/// Classify a failure that happened before a status line was received
pub fn classify_send_error(provider: &str, error: reqwest::Error) -> ProviderError {
    // The URL carries the API key, keep it out of messages
    let timed_out = error.is_timeout();
    let message = error.without_url().to_string();

    if timed_out {
        ProviderError::new(provider, ProviderErrorKind::Timeout, message)
    } else {
        ProviderError::unavailable(provider, message)
    }
}

/// Classify a non-success HTTP status
pub fn classify_status(provider: &str, status: StatusCode, body: &str) -> ProviderError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body, MAX_ERROR_BODY_CHARS));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::unauthorized(provider, detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(provider, detail),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            ProviderError::new(provider, ProviderErrorKind::Timeout, detail)
        }
        _ => ProviderError::unavailable(provider, detail),
    }
}

/// POST a JSON body and decode a JSON response
pub async fn post_json<B, R>(client: &Client, provider: &str, url: Url, body: &B) -> Result<R, ProviderError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    debug!("{}: POST {}{}", provider, url.origin().ascii_serialization(), url.path());

    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .json(body)
        .send()
        .await
        .map_err(|e| classify_send_error(provider, e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| classify_send_error(provider, e))?;

    if !status.is_success() {
        return Err(classify_status(provider, status, &text));
    }

    serde_json::from_str::<R>(&text).map_err(|e| {
        ProviderError::malformed(
            provider,
            format!("{} (body: {})", e, truncate(&text, MAX_ERROR_BODY_CHARS)),
        )
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    } else {
        text.to_string()
    }
}
