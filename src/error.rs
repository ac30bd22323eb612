/// Status reported for failures that never produced an HTTP response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    #[error("Content API error {status}: {message} ({url})")]
    Upstream {
        status: u16,
        message: String,
        url: String,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl ContentError {
    pub fn not_found(resource: &'static str, key: impl ToString) -> Self {
        ContentError::NotFound {
            resource,
            key: key.to_string(),
        }
    }

    /// Network and decode failures share the upstream kind with a generic status.
    pub fn transport(err: reqwest::Error, url: &str) -> Self {
        tracing::error!("Request to {} failed: {}", url, err);
        ContentError::Upstream {
            status: TRANSPORT_FAILURE_STATUS,
            message: format!("Failed to fetch data from content API: {}", err),
            url: url.to_string(),
        }
    }

    /// HTTP status a caller should present for this failure.
    pub fn status(&self) -> u16 {
        match self {
            ContentError::NotFound { .. } => 404,
            ContentError::Upstream { status, .. } => *status,
            ContentError::InvalidQuery(_) => 400,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

pub type ContentResult<T> = Result<T, ContentError>;
