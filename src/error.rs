use http::StatusCode;
use thiserror::Error;

/// Errors returned by the tree-editor views and repository.
#[derive(Debug, Error)]
pub enum TreeEditorError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("invalid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("missing request parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("invalid primary key `{0}`")]
    InvalidPrimaryKey(String),

    #[error("object with primary key `{0}` does not exist")]
    ObjectNotFound(String),

    #[error("permission denied")]
    PermissionDenied,

    #[error("incorrect lookup parameters: {0}")]
    IncorrectLookupParameters(String),

    #[error("tree row {index} is inconsistent: {detail}")]
    InconsistentTree { index: usize, detail: String },

    #[error("tree-editor invariant violation: {0}")]
    Invariant(String),
}

impl TreeEditorError {
    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }

    pub(crate) fn inconsistent(index: usize, detail: impl Into<String>) -> Self {
        Self::InconsistentTree {
            index,
            detail: detail.into(),
        }
    }

    /// HTTP status an embedding web layer should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Payload(_)
            | Self::MissingParameter(_)
            | Self::InvalidPrimaryKey(_)
            | Self::IncorrectLookupParameters(_)
            | Self::InconsistentTree { .. } => StatusCode::BAD_REQUEST,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::ObjectNotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Invariant(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
