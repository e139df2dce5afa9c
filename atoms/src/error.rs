use lambda_http::http::StatusCode;

/// Failure taxonomy shared by every atom and block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtomError {
    /// Referenced catalog or image no longer exists at mutation time
    #[error("{0}")]
    NotFound(String),

    /// Upload rejected by type/size policy, or a malformed image URL
    #[error("{0}")]
    Validation(String),

    /// The underlying repository call itself failed
    #[error("{0}")]
    Repository(String),

    /// The image store rejected or lost an object
    #[error("{0}")]
    Storage(String),

    /// Catalog version moved under a read-modify-write
    #[error("{0}")]
    Conflict(String),

    /// Multi-file upload where nothing could be committed
    #[error("{succeeded} upload(s) succeeded, {failed} failed: {detail}")]
    PartialBatch {
        succeeded: usize,
        failed: usize,
        detail: String,
    },
}

pub type AtomResult<T> = Result<T, AtomError>;

impl AtomError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AtomError::NotFound(_) => StatusCode::NOT_FOUND,
            AtomError::Validation(_) => StatusCode::BAD_REQUEST,
            AtomError::Conflict(_) => StatusCode::CONFLICT,
            AtomError::PartialBatch { .. } => StatusCode::BAD_GATEWAY,
            AtomError::Repository(_) | AtomError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
