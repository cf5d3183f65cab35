use thiserror::Error;

use super::Partition;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to fetch {partition}: {status}")]
    Http {
        partition: Partition,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response for {partition}: {message}")]
    InvalidResponse {
        partition: Partition,
        message: String,
    },
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(partition: Partition, status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::Http {
            partition,
            status,
            body: Self::truncate_body(body),
        }
    }

    pub fn invalid(partition: Partition, message: impl Into<String>) -> Self {
        ApiError::InvalidResponse {
            partition,
            message: message.into(),
        }
    }

    /// The partition this error is attributed to, when known.
    pub fn partition(&self) -> Option<Partition> {
        match self {
            ApiError::Http { partition, .. } | ApiError::InvalidResponse { partition, .. } => {
                Some(*partition)
            }
            ApiError::Network(_) => None,
        }
    }
}
