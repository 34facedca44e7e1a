//! Caller authentication gate.
//!
//! Each request resolves to one of two outcomes: `Authenticated` or
//! `Unauthenticated`. There is no third "blocked" state: invalid credentials
//! degrade to the public view, and only an unavailable authentication
//! backend rejects the whole request with 503.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use herogate_core::UpstreamError;
use herogate_upstream::{RetryPolicy, UpstreamClient, with_retry};

use crate::error::ApiError;
use crate::server::AppState;

/// Outcome of the authentication gate for one request. Computed once by the
/// middleware, stored in request extensions, immutable downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Unauthenticated,
}

impl AuthOutcome {
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Resolves caller identity against the upstream `/auth` endpoint.
#[derive(Clone)]
pub struct AuthGate {
    upstream: Arc<UpstreamClient>,
    retry: RetryPolicy,
}

impl AuthGate {
    pub fn new(upstream: Arc<UpstreamClient>, retry: RetryPolicy) -> Self {
        Self { upstream, retry }
    }

    /// Validate credentials upstream, retrying only transient business
    /// errors (200-with-error-body). A 401, immediate or after the retry
    /// budget, degrades to `Unauthenticated`; any other failure rejects
    /// the request.
    pub async fn resolve(&self, name: &str, password: &str) -> Result<AuthOutcome, ApiError> {
        let result = with_retry(
            self.retry,
            "authenticate",
            UpstreamError::is_business,
            || self.upstream.authenticate(name, password),
        )
        .await;

        match result {
            Ok(()) => Ok(AuthOutcome::Authenticated),
            Err(UpstreamError::Unauthorized) => {
                // Recorded for audit visibility; the request itself proceeds.
                tracing::warn!(name = %name, "credentials rejected, serving public view");
                Ok(AuthOutcome::Unauthenticated)
            }
            Err(err) => {
                tracing::error!(error = %err, "authentication backend unavailable");
                Err(ApiError::service_unavailable(
                    "Authentication service is currently unavailable. Please try again later.",
                ))
            }
        }
    }
}

/// Middleware: derive the caller's [`AuthOutcome`] from the `Name` and
/// `Password` headers and store it in request extensions. Requests without
/// credentials proceed unauthenticated and never touch the upstream.
pub async fn authentication_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let name = header_value(&req, "name");
    let password = header_value(&req, "password");

    let outcome = match (name, password) {
        (Some(name), Some(password)) => match state.gate.resolve(&name, &password).await {
            Ok(outcome) => outcome,
            Err(err) => return err.into_response(),
        },
        _ => AuthOutcome::Unauthenticated,
    };

    req.extensions_mut().insert(outcome);
    next.run(req).await
}

fn header_value(req: &Request<Body>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
