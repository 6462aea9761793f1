//! crates/storyweaver_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like stores or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Project, StoryImage, StoryResponse, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., store, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The uniform CRUD contract over users and projects. Implemented by the
/// remote REST store, the local fallback store, and the decorator that
/// composes the two.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// Find-or-create by email. Idempotent: the same email always resolves
    /// to the same identity within one store.
    async fn login_or_create_user(&self, email: &str) -> PortResult<User>;

    /// Full-record replace by id. No conflict detection - last write wins.
    async fn update_user(&self, user: &User) -> PortResult<User>;

    /// All projects owned by `user_id`. An empty list is a valid result.
    async fn list_projects(&self, user_id: Uuid) -> PortResult<Vec<Project>>;

    /// Upsert by project id: replace if present, append otherwise.
    async fn save_project(&self, project: &Project) -> PortResult<Project>;
}

#[async_trait]
pub trait StorySynthesisService: Send + Sync {
    /// Turns a non-empty ordered image sequence into a titled set of
    /// per-image narrative segments, personalized to `user` when given.
    /// Fails as a whole on transport or parse errors - no partial story.
    async fn generate_story(
        &self,
        images: &[StoryImage],
        user: Option<&User>,
    ) -> PortResult<StoryResponse>;
}

#[async_trait]
pub trait BookRenderer: Send + Sync {
    /// Lays the finished pages out into a paginated document and returns
    /// its bytes. Pages are processed strictly in sequence order.
    async fn render(&self, title: &str, pages: &[StoryImage]) -> PortResult<Vec<u8>>;
}
