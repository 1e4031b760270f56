use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned {status}: {message}")]
    Service { status: StatusCode, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("row not found")]
    RowNotFound,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("account created; confirm the email address before signing in")]
    ConfirmationRequired,

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("realtime channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Builds a `Service` error from a non-success response body. The
    /// auth and table endpoints disagree on the error field name, so a
    /// handful are tried before falling back to the raw body.
    pub(crate) fn service(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| {
                        value
                            .get(key)
                            .and_then(|field| field.as_str())
                            .map(str::to_owned)
                    })
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("no error details")
                        .to_string()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });
        ApiError::Service { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn message_of(err: ApiError) -> String {
        match err {
            ApiError::Service { message, .. } => message,
            other => panic!("expected Service error, got {other:?}"),
        }
    }

    #[test]
    fn service_error_reads_table_api_message() {
        let err = ApiError::service(
            StatusCode::BAD_REQUEST,
            r#"{"code":"PGRST102","message":"column posts.missing does not exist","details":null}"#,
        );
        assert_eq!(message_of(err), "column posts.missing does not exist");
    }

    #[test]
    fn service_error_reads_auth_api_message() {
        let err = ApiError::service(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(message_of(err), "Invalid login credentials");
    }

    #[test]
    fn service_error_falls_back_to_body() {
        let err = ApiError::service(StatusCode::BAD_GATEWAY, "upstream unavailable");
        assert_eq!(message_of(err), "upstream unavailable");
    }

    #[test]
    fn service_error_handles_empty_body() {
        let err = ApiError::service(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(message_of(err), "Internal Server Error");
    }
}
