use thiserror::Error;

use crate::hierarchy::{EntityKind, HierarchyError};
use crate::lock::LockError;
use crate::quiz::QuizResult;
use crate::store::StoreError;

/// Error type for engine operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("content {content_id} is locked")]
    Locked { content_id: String },

    #[error("quiz of chapter {chapter_id} is locked")]
    QuizLocked { chapter_id: String },

    #[error("quiz {} already passed", .result.quiz_id)]
    AlreadyPassed { result: Box<QuizResult> },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl ProgressError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        ProgressError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// HTTP status the web layer answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            ProgressError::NotFound { .. } => 404,
            ProgressError::Locked { .. } | ProgressError::QuizLocked { .. } => 403,
            ProgressError::AlreadyPassed { .. } => 409,
            ProgressError::InvalidInput(_) => 400,
            ProgressError::Store(_) | ProgressError::Lock(_) => 500,
        }
    }
}

impl From<HierarchyError> for ProgressError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::NotFound { kind, id } => ProgressError::NotFound { kind, id },
            other => ProgressError::Store(StoreError::Storage(other.to_string())),
        }
    }
}
