use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The backend answered with a non-success status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ClientError {
    /// Message suitable for rendering in a chat bubble
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }
}

/// Failure while reading an already-open reply stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Stream error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_user_message() {
        let err = ClientError::Api {
            status: 422,
            message: "Thread not found".to_string(),
        };

        assert_eq!(err.user_message(), "Thread not found");
        assert_eq!(err.to_string(), "Thread not found (HTTP 422)");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_unauthorized() {
        let err = ClientError::Api {
            status: 401,
            message: "Not authenticated".to_string(),
        };
        assert!(err.is_unauthorized());
    }
}
