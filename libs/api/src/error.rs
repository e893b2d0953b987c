/// Category of an API error. Lets the loader decide whether a failure is
/// fatal (primary fetch) or degradable (lookup expansion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration: permanent, fail before any request.
    Config,
    /// Non-success HTTP status from the source API.
    Upstream,
    /// Request exceeded its deadline.
    Timeout,
    /// Transport-level failure (connect, read body).
    Io,
    /// Response body could not be parsed.
    Format,
    /// Logical error (not found, invalid state, generic).
    Logic,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Upstream => f.write_str("upstream"),
            ErrorKind::Timeout => f.write_str("timeout"),
            ErrorKind::Io => f.write_str("io"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Logic => f.write_str("logic"),
        }
    }
}

/// Unified error type for the source, store and parser seams.
///
/// Carries an `ErrorKind` for categorization, a human-readable message and,
/// for upstream failures, the HTTP status. `From` impls assign the kind
/// automatically so implementations can use `?`.
#[derive(Clone)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    status: Option<u16>,
}

impl ApiError {
    /// Generic logic error (default kind).
    pub fn new(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Logic, message: msg.into(), status: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into(), status: None }
    }

    /// Non-success response. The body is kept verbatim in the message.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            format!("HTTP {status}: {body}")
        };
        Self { kind: ErrorKind::Upstream, message, status: Some(status) }
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Timeout, message: msg.into(), status: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Io, message: msg.into(), status: None }
    }

    pub fn format_err(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into(), status: None }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status for `ErrorKind::Upstream` errors.
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<String> for ApiError {
    fn from(s: String) -> Self { Self::new(s) }
}

impl From<&str> for ApiError {
    fn from(s: &str) -> Self { Self::new(s) }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self { Self::io(e.to_string()) }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self { Self::format_err(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_keeps_status_and_body() {
        let e = ApiError::upstream(404, r#"{"message":"Not Found"}"#);
        assert_eq!(e.kind(), ErrorKind::Upstream);
        assert_eq!(e.status(), Some(404));
        assert_eq!(e.to_string(), r#"HTTP 404: {"message":"Not Found"}"#);
    }

    #[test]
    fn upstream_without_body() {
        assert_eq!(ApiError::upstream(502, "").to_string(), "HTTP 502");
    }

    #[test]
    fn serde_errors_are_format_errors() {
        let e: ApiError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(e.kind(), ErrorKind::Format);
        assert_eq!(e.status(), None);
    }
}
