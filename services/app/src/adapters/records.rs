//! services/app/src/adapters/records.rs
//!
//! The "impure" wire records shared by the remote and local store adapters.
//! Both stores speak the same camelCase JSON shapes, so the serde structs
//! live here once and are mapped to and from the pure domain types.

use serde::{Deserialize, Serialize};
use storyweaver_core::domain::{Project, SavedPage, User};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl UserRecord {
    pub fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            age: self.age,
            phone_number: self.phone_number,
        }
    }

    pub fn from_domain(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            age: user.age.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPageRecord {
    pub image: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: String,
    pub cover_image: String,
    #[serde(default)]
    pub pages: Vec<SavedPageRecord>,
}

impl ProjectRecord {
    pub fn to_domain(self) -> Project {
        Project {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            date: self.date,
            cover_image: self.cover_image,
            pages: self
                .pages
                .into_iter()
                .map(|page| SavedPage {
                    image: page.image,
                    text: page.text,
                })
                .collect(),
        }
    }

    pub fn from_domain(project: &Project) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id,
            title: project.title.clone(),
            date: project.date.clone(),
            cover_image: project.cover_image.clone(),
            pages: project
                .pages
                .iter()
                .map(|page| SavedPageRecord {
                    image: page.image.clone(),
                    text: page.text.clone(),
                })
                .collect(),
        }
    }
}
