//! `folio-core`: shared building blocks for every Folio crate.
//!
//! Strongly-typed identifiers and the error taxonomy that crosses crate
//! boundaries. No IO lives here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, InfrastructureError};
pub use id::{CollaboratorId, DocumentId, ProjectId, UserId, VersionId};
