//! Typed client over the upstream heroes REST API.
//!
//! Every operation issues exactly one HTTP call and classifies the outcome
//! into [`UpstreamError`]. The upstream occasionally answers HTTP 200 with a
//! `{code, message}` error body instead of the expected payload; that case
//! is detected here and reported as [`UpstreamError::Business`], distinct
//! from transport-level failure. Retry decisions belong to callers.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use herogate_core::{Hero, HeroProfile, Result, UpstreamError};

/// HTTP client for the upstream heroes service.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    name: &'a str,
    password: &'a str,
}

impl UpstreamClient {
    /// Creates a client for the given base URL with a per-request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should not happen in
    /// practice).
    #[must_use]
    pub fn new(base_url: &Url, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /heroes, the full hero roster.
    pub async fn list_heroes(&self) -> Result<Vec<Hero>> {
        let response = self
            .http
            .get(self.endpoint("/heroes"))
            .send()
            .await
            .map_err(into_transport)?;
        decode_payload(response).await
    }

    /// GET /heroes/{id}, a single hero; 404 when absent.
    pub async fn get_hero(&self, hero_id: &str) -> Result<Hero> {
        let response = self
            .http
            .get(self.endpoint(&format!("/heroes/{hero_id}")))
            .send()
            .await
            .map_err(into_transport)?;
        decode_payload(response).await
    }

    /// GET /heroes/{id}/profile, the hero's ability scores.
    pub async fn get_hero_profile(&self, hero_id: &str) -> Result<HeroProfile> {
        let response = self
            .http
            .get(self.endpoint(&format!("/heroes/{hero_id}/profile")))
            .send()
            .await
            .map_err(into_transport)?;
        decode_payload(response).await
    }

    /// POST /auth, validates credentials; 200 on success, 401 on bad
    /// credentials. The success body carries no payload worth parsing.
    pub async fn authenticate(&self, name: &str, password: &str) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint("/auth"))
            .json(&AuthRequest { name, password })
            .send()
            .await
            .map_err(into_transport)?;

        let response = classify_status(response)?;
        let body = response.text().await.map_err(into_transport)?;
        match probe_error_body(&body) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Maps the response status into the error taxonomy, passing 2xx through.
fn classify_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    match status.as_u16() {
        404 => Err(UpstreamError::NotFound),
        401 => Err(UpstreamError::Unauthorized),
        _ if !status.is_success() => Err(UpstreamError::transport_status(
            status.as_u16(),
            status
                .canonical_reason()
                .unwrap_or("unexpected upstream status"),
        )),
        _ => Ok(response),
    }
}

/// Decodes a 2xx payload, checking for an embedded error body first.
async fn decode_payload<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let response = classify_status(response)?;
    let body = response.text().await.map_err(into_transport)?;

    if let Some(err) = probe_error_body(&body) {
        return Err(err);
    }

    serde_json::from_str(&body)
        .map_err(|e| UpstreamError::transport(format!("failed to decode upstream payload: {e}")))
}

/// A 200 response whose body is a JSON object with a `code` field is a
/// backend-side business error, not a payload. Arrays and scalars are never
/// probed.
fn probe_error_body(body: &str) -> Option<UpstreamError> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    let code = object.get("code")?.as_i64().unwrap_or_default();
    let message = object
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("upstream reported a backend error");
    Some(UpstreamError::business(code, message))
}

fn into_transport(err: reqwest::Error) -> UpstreamError {
    UpstreamError::Transport {
        status: err.status().map(|s| s.as_u16()),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_body_detects_code_field() {
        let err = probe_error_body(r#"{"code": 1000, "message": "Backend error"}"#).unwrap();
        assert!(matches!(
            err,
            UpstreamError::Business { code: 1000, ref message } if message == "Backend error"
        ));
    }

    #[test]
    fn test_probe_error_body_ignores_payload_shapes() {
        // Hero payloads and arrays must pass through untouched.
        assert!(probe_error_body(r#"{"id": "1", "name": "H", "image": "u"}"#).is_none());
        assert!(probe_error_body(r#"[{"id": "1"}]"#).is_none());
        assert!(probe_error_body("OK").is_none());
    }

    #[test]
    fn test_probe_error_body_without_message() {
        let err = probe_error_body(r#"{"code": 1000}"#).unwrap();
        assert!(matches!(err, UpstreamError::Business { code: 1000, .. }));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = UpstreamClient::new(
            &Url::parse("http://localhost:9999/").unwrap(),
            Duration::from_secs(1),
        );
        assert_eq!(client.endpoint("/heroes"), "http://localhost:9999/heroes");
    }
}
