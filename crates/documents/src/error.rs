use thiserror::Error;

use folio_core::InfrastructureError;

use crate::document::Stage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersioningError {
    /// Document or requested version does not exist.
    #[error("not found")]
    NotFound,

    #[error("a document already exists for stage '{0}'")]
    DuplicateStage(Stage),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

impl VersioningError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateStage(_) => "duplicate_stage",
            Self::Validation(_) => "validation_error",
            Self::Infrastructure(e) => e.kind(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::DuplicateStage(_) => 409,
            Self::Validation(_) => 400,
            Self::Infrastructure(_) => 500,
        }
    }
}
