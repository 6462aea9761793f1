//! services/app/src/adapters/local_store.rs
//!
//! This module contains the local fallback store, used whenever the remote
//! backend is unreachable. It keeps the two fixed collections (`users`,
//! `projects`) in one JSON file and read-modify-writes the whole file per
//! call, with no locking. Concurrent saves race at collection granularity;
//! last write wins. Unlike the remote path, failures here (corrupt file,
//! full disk) propagate to the caller - corruption is an error, not
//! something to recover from silently.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storyweaver_core::domain::{Project, User};
use storyweaver_core::ports::{PersistenceService, PortError, PortResult};
use uuid::Uuid;

use crate::adapters::records::{ProjectRecord, UserRecord};

//=========================================================================================
// The On-Disk Collections
//=========================================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    users: Vec<UserRecord>,
    #[serde(default)]
    projects: Vec<ProjectRecord>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A single-file store that implements the `PersistenceService` port.
#[derive(Clone)]
pub struct LocalStoreAdapter {
    path: PathBuf,
}

impl LocalStoreAdapter {
    /// Creates a new `LocalStoreAdapter` persisting to `path`. The file is
    /// created lazily on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> PortResult<StoreFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PortError::Unexpected(format!("Corrupt local store: {}", e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreFile::default()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn persist(&self, store: &StoreFile) -> PortResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        let bytes = serde_json::to_vec_pretty(store)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// `PersistenceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceService for LocalStoreAdapter {
    async fn login_or_create_user(&self, email: &str) -> PortResult<User> {
        let mut store = self.load().await?;
        if let Some(record) = store.users.iter().find(|u| u.email == email) {
            return Ok(record.clone().to_domain());
        }

        // First login for this email: fresh identity, blank profile
        // until onboarding fills it in.
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: String::new(),
            age: String::new(),
            phone_number: None,
        };
        store.users.push(record.clone());
        self.persist(&store).await?;
        Ok(record.to_domain())
    }

    async fn update_user(&self, user: &User) -> PortResult<User> {
        let mut store = self.load().await?;
        for record in store.users.iter_mut() {
            if record.id == user.id {
                *record = UserRecord::from_domain(user);
            }
        }
        self.persist(&store).await?;
        Ok(user.clone())
    }

    async fn list_projects(&self, user_id: Uuid) -> PortResult<Vec<Project>> {
        let store = self.load().await?;
        Ok(store
            .projects
            .into_iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.to_domain())
            .collect())
    }

    async fn save_project(&self, project: &Project) -> PortResult<Project> {
        let mut store = self.load().await?;
        let record = ProjectRecord::from_domain(project);
        match store.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = record,
            None => store.projects.push(record),
        }
        self.persist(&store).await?;
        Ok(project.clone())
    }
}
