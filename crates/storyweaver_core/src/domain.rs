//! crates/storyweaver_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use base64::Engine;
use bytes::Bytes;
use uuid::Uuid;

// Represents a user - created on first login, profile filled in by onboarding
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub age: String,
    pub phone_number: Option<String>,
}

impl User {
    /// A user with a non-empty name has completed onboarding and skips
    /// that screen on later logins.
    pub fn is_onboarded(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Represents one page-in-progress: an uploaded image plus the user's
/// optional context note, and (after synthesis) the generated text.
#[derive(Debug, Clone)]
pub struct StoryImage {
    pub id: Uuid,
    pub data: Bytes,
    pub mime_type: String,
    pub file_name: String,
    pub note: String,
    pub story_segment: Option<String>,
}

impl StoryImage {
    /// Creates a fresh item for an uploaded file with an empty note.
    pub fn new(data: Bytes, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
            note: String::new(),
            story_segment: None,
        }
    }

    /// The locally resolvable display handle for this image: a
    /// `data:{mime};base64,{payload}` URL. Derived on demand so the raw
    /// payload is held only once.
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.mime_type, encoded)
    }
}

/// One entry of a synthesis response, declared against a 0-based input index.
#[derive(Debug, Clone)]
pub struct StoryPage {
    pub image_index: u32,
    pub story_segment: String,
}

/// The full output of one synthesis call.
#[derive(Debug, Clone)]
pub struct StoryResponse {
    pub title: String,
    pub pages: Vec<StoryPage>,
}

// One page of a saved project: display handle + final text
#[derive(Debug, Clone)]
pub struct SavedPage {
    pub image: String,
    pub text: String,
}

/// A persisted, completed story. Immutable snapshot at save time - later
/// edits to the live sequence do not affect it unless re-saved by `id`.
#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: String,
    pub cover_image: String,
    pub pages: Vec<SavedPage>,
}
