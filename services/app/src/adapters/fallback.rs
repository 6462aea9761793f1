//! services/app/src/adapters/fallback.rs
//!
//! The try-remote-fall-back-local policy as one reusable decorator. Every
//! operation first asks the primary store; on any primary failure the call
//! is retried once against the fallback store and the failure never reaches
//! the caller. Errors from the fallback side do propagate. The two stores
//! are never reconciled with each other - a record created locally while
//! the backend was down stays invisible to it.

use std::sync::Arc;

use async_trait::async_trait;
use storyweaver_core::domain::{Project, User};
use storyweaver_core::ports::{PersistenceService, PortResult};
use tracing::warn;
use uuid::Uuid;

/// Composes two `PersistenceService` implementations behind the same port.
#[derive(Clone)]
pub struct FallbackStore {
    primary: Arc<dyn PersistenceService>,
    fallback: Arc<dyn PersistenceService>,
}

impl FallbackStore {
    /// Creates a new `FallbackStore` trying `primary` first.
    pub fn new(primary: Arc<dyn PersistenceService>, fallback: Arc<dyn PersistenceService>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PersistenceService for FallbackStore {
    async fn login_or_create_user(&self, email: &str) -> PortResult<User> {
        match self.primary.login_or_create_user(email).await {
            Ok(user) => Ok(user),
            Err(err) => {
                warn!(error = %err, "primary store unavailable, using local fallback for login");
                self.fallback.login_or_create_user(email).await
            }
        }
    }

    async fn update_user(&self, user: &User) -> PortResult<User> {
        match self.primary.update_user(user).await {
            Ok(user) => Ok(user),
            Err(err) => {
                warn!(error = %err, "primary store unavailable, using local fallback for update user");
                self.fallback.update_user(user).await
            }
        }
    }

    async fn list_projects(&self, user_id: Uuid) -> PortResult<Vec<Project>> {
        match self.primary.list_projects(user_id).await {
            Ok(projects) => Ok(projects),
            Err(err) => {
                warn!(error = %err, "primary store unavailable, using local fallback for list projects");
                self.fallback.list_projects(user_id).await
            }
        }
    }

    async fn save_project(&self, project: &Project) -> PortResult<Project> {
        match self.primary.save_project(project).await {
            Ok(project) => Ok(project),
            Err(err) => {
                warn!(error = %err, "primary store unavailable, using local fallback for save project");
                self.fallback.save_project(project).await
            }
        }
    }
}
