// Uniform error value for every remote call.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No session token; the call was not attempted.
    #[error("not signed in")]
    Unauthenticated,

    /// The server answered with a non-2xx status.
    #[error("{}", describe_status(*status, detail.as_deref()))]
    Status { status: u16, detail: Option<String> },

    /// The request never produced a response (connect, timeout, TLS).
    #[error("could not reach the server: {0}")]
    Transport(String),

    /// The response body did not match the expected shape.
    #[error("unexpected response from the server: {0}")]
    Decode(String),

    #[error("invalid API URL `{0}`")]
    InvalidUrl(String),
}

impl ApiError {
    /// Normalize a non-2xx response body into a status error.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status { status, detail: extract_detail(body) }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for missing tokens and 401/403 responses.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthenticated) || matches!(self.status(), Some(401 | 403))
    }

    /// The server-provided reason when there is one, `fallback` otherwise.
    pub fn detail_or(&self, fallback: &str) -> String {
        match self {
            Self::Status { detail: Some(detail), .. } => detail.clone(),
            Self::Unauthenticated => self.to_string(),
            _ => fallback.to_string(),
        }
    }
}

fn describe_status(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("server returned {status}: {detail}"),
        None => format!("server returned {status}"),
    }
}

/// Pull a human-readable reason out of an error body.
///
/// Accepts `{"detail": "..."}`, validation lists
/// `{"detail": [{"msg": "..."}]}`, `{"error": {"message": "..."}}`, and
/// short plain-text bodies.
pub fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        let looks_like_markup = trimmed.starts_with('<');
        return (!looks_like_markup && trimmed.len() <= 200).then(|| trimmed.to_string());
    };

    let detail = match &value["detail"] {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item["msg"].as_str())
            .next()
            .map(ToOwned::to_owned),
        _ => None,
    };

    detail
        .or_else(|| value["error"]["message"].as_str().map(ToOwned::to_owned))
        .or_else(|| value["message"].as_str().map(ToOwned::to_owned))
        .filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_string_detail() {
        let error = ApiError::from_response(401, r#"{"detail":"Invalid email or password"}"#);
        assert_eq!(error.detail_or("Login failed"), "Invalid email or password");
        assert!(error.is_auth());
    }

    #[test]
    fn extracts_first_validation_message() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"}]}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("value is not a valid email address"));
    }

    #[test]
    fn extracts_nested_error_message() {
        let body = r#"{"error":{"code":"RATE_LIMITED","message":"slow down"}}"#;
        assert_eq!(extract_detail(body).as_deref(), Some("slow down"));
    }

    #[test]
    fn falls_back_when_body_has_no_detail() {
        let error = ApiError::from_response(502, "<html><body>Bad Gateway</body></html>");
        assert_eq!(error.detail_or("Query failed"), "Query failed");
        assert_eq!(error.to_string(), "server returned 502");
    }

    #[test]
    fn short_plain_text_is_kept() {
        assert_eq!(extract_detail("Internal Server Error").as_deref(), Some("Internal Server Error"));
    }

    #[test]
    fn transport_errors_use_fallback_message() {
        let error = ApiError::Transport("connection refused".into());
        assert_eq!(error.detail_or("Registration failed"), "Registration failed");
        assert!(!error.is_auth());
    }
}
