//! services/app/src/adapters/remote_store.rs
//!
//! This module contains the remote store adapter, the concrete implementation
//! of the `PersistenceService` port against the backend's REST API. Any
//! transport error or non-2xx status surfaces as a `PortError`, which the
//! fallback decorator turns into a local-store recovery.

use async_trait::async_trait;
use storyweaver_core::domain::{Project, User};
use storyweaver_core::ports::{PersistenceService, PortError, PortResult};
use uuid::Uuid;

use crate::adapters::records::{ProjectRecord, UserRecord};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A REST adapter that implements the `PersistenceService` port.
#[derive(Clone)]
pub struct RemoteStoreAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteStoreAdapter {
    /// Creates a new `RemoteStoreAdapter` targeting `base_url`
    /// (e.g. `http://localhost:5000/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

//=========================================================================================
// `PersistenceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceService for RemoteStoreAdapter {
    async fn login_or_create_user(&self, email: &str) -> PortResult<User> {
        let record: UserRecord = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn update_user(&self, user: &User) -> PortResult<User> {
        let record: UserRecord = self
            .client
            .put(format!("{}/users/{}", self.base_url, user.id))
            .json(&UserRecord::from_domain(user))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }

    async fn list_projects(&self, user_id: Uuid) -> PortResult<Vec<Project>> {
        let records: Vec<ProjectRecord> = self
            .client
            .get(format!("{}/projects", self.base_url))
            .query(&[("userId", user_id.to_string())])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn save_project(&self, project: &Project) -> PortResult<Project> {
        let record: ProjectRecord = self
            .client
            .post(format!("{}/projects", self.base_url))
            .json(&ProjectRecord::from_domain(project))
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(record.to_domain())
    }
}
