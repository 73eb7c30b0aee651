use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 406 | 409 | 422 => Self::Validation,
            429 => Self::RateLimited,
            _ => Self::Internal,
        }
    }
}

/// Error body returned by the admin backend on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

#[derive(Debug, Error)]
#[error("{code:?} (http {status}): {message}")]
pub struct ApiException {
    pub code: ErrorCode,
    pub status: u16,
    pub message: String,
}

impl ApiException {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::from_status(status),
            status,
            message: message.into(),
        }
    }

    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(api_error) if !api_error.error_message.is_empty() => {
                Self::new(status, api_error.error_message)
            }
            _ => Self::new(status, body.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_error_envelope() {
        let err = ApiException::from_body(
            401,
            r#"{"error_code": 10, "error_message": "NotAuthenticated", "arguments": []}"#,
        );
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "NotAuthenticated");
    }

    #[test]
    fn falls_back_to_raw_body_when_not_json() {
        let err = ApiException::from_body(502, "  bad gateway\n");
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "bad gateway");
        assert_eq!(err.to_string(), "Internal (http 502): bad gateway");
    }
}
