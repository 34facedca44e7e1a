use thiserror::Error;

/// Classified failures raised by the upstream heroes API.
///
/// The client raises these raw; only the aggregation service and the
/// authentication gate remap them into client-facing errors.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream returned HTTP 404 for the requested resource.
    #[error("upstream resource not found")]
    NotFound,

    /// Upstream rejected the supplied credentials with HTTP 401.
    #[error("upstream rejected credentials")]
    Unauthorized,

    /// Upstream returned HTTP 200 but the body carried an error code
    /// instead of the expected payload.
    #[error("upstream business error (code {code}): {message}")]
    Business { code: i64, message: String },

    /// Any other non-2xx response or network-level failure.
    #[error("upstream transport error: {message}")]
    Transport { status: Option<u16>, message: String },
}

impl UpstreamError {
    /// Create a new Business error.
    pub fn business(code: i64, message: impl Into<String>) -> Self {
        Self::Business {
            code,
            message: message.into(),
        }
    }

    /// Create a new Transport error carrying an HTTP status.
    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a new Transport error with no HTTP status (connect failures,
    /// timeouts, decode failures).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// The HTTP status observed upstream, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound => Some(404),
            Self::Unauthorized => Some(401),
            Self::Business { .. } => Some(200),
            Self::Transport { status, .. } => *status,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_business(&self) -> bool {
        matches!(self, Self::Business { .. })
    }
}

/// Convenience result type for upstream operations.
pub type Result<T> = std::result::Result<T, UpstreamError>;
