//! services/app/src/flow.rs
//!
//! The application shell: owns the session state machine and the port
//! adapters, and exposes one async method per user action. Each method
//! follows the same shape - begin a transition on the session, await the
//! port call, then feed the completion back in - so every user-visible
//! rule (busy gate, stale-response guard, error banner) lives in the core
//! machine and not in this glue.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use storyweaver_core::domain::Project;
use storyweaver_core::ports::{
    BookRenderer, PersistenceService, PortError, PortResult, StorySynthesisService,
};
use storyweaver_core::reader::Reader;
use storyweaver_core::session::{Screen, Session};
use tracing::info;

/// Replaces filesystem-hostile characters so the story title can name the
/// exported document; an empty title falls back to the default name.
fn export_file_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() {
        "my-story".to_string()
    } else {
        cleaned
    }
}

/// The application shell, driven by the interactive front-end.
pub struct StoryweaverApp {
    session: Session,
    reader: Option<Reader>,
    store: Arc<dyn PersistenceService>,
    story: Arc<dyn StorySynthesisService>,
    renderer: Arc<dyn BookRenderer>,
    export_dir: PathBuf,
}

impl StoryweaverApp {
    pub fn new(
        store: Arc<dyn PersistenceService>,
        story: Arc<dyn StorySynthesisService>,
        renderer: Arc<dyn BookRenderer>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            session: Session::new(),
            reader: None,
            store,
            story,
            renderer,
            export_dir,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn reader(&self) -> Option<&Reader> {
        self.reader.as_ref()
    }

    pub fn reader_mut(&mut self) -> Option<&mut Reader> {
        self.reader.as_mut()
    }

    /// Signs the user in by email (find-or-create) and routes them to
    /// onboarding or the dashboard depending on their profile.
    pub async fn login(&mut self, email: &str) -> PortResult<()> {
        self.session.dismiss_error();
        match self.store.login_or_create_user(email).await {
            Ok(user) => {
                info!(user_id = %user.id, "signed in");
                self.session.logged_in(user);
                Ok(())
            }
            Err(err) => {
                self.session.report_error("Could not sign you in. Please try again.");
                Err(err)
            }
        }
    }

    /// Merges the entered profile into the current user and persists it.
    /// On failure the session stays on the onboarding screen with the
    /// entered values retained by the front-end.
    pub async fn complete_onboarding(
        &mut self,
        name: &str,
        age: &str,
        phone_number: Option<String>,
    ) -> PortResult<()> {
        self.session.dismiss_error();
        let mut updated = match self.session.user() {
            Some(user) => user.clone(),
            None => return Err(PortError::Unexpected("No user is signed in".to_string())),
        };
        updated.name = name.to_string();
        updated.age = age.to_string();
        updated.phone_number = phone_number;

        match self.store.update_user(&updated).await {
            Ok(saved) => {
                self.session.profile_saved(saved);
                Ok(())
            }
            Err(err) => {
                self.session
                    .report_error("Failed to save your profile. Please try again.");
                Err(err)
            }
        }
    }

    /// The saved stories for the dashboard listing. An empty library is a
    /// valid, non-error state.
    pub async fn list_projects(&mut self) -> PortResult<Vec<Project>> {
        let user_id = match self.session.user() {
            Some(user) => user.id,
            None => return Ok(Vec::new()),
        };
        self.store.list_projects(user_id).await
    }

    /// Runs one synthesis pass. A no-op while the busy gate is closed;
    /// on success the session enters Reading and the reader receives its
    /// by-value copy of the finished pages.
    pub async fn generate(&mut self) {
        let Some(token) = self.session.begin_generation() else {
            return;
        };
        let images = self.session.sequence().items().to_vec();
        let user = self.session.user().cloned();
        let result = self.story.generate_story(&images, user.as_ref()).await;
        self.session.finish_generation(token, result);

        if self.session.screen() == Screen::Reading {
            self.reader = Some(Reader::new(
                self.session.story_title().to_string(),
                self.session.sequence().items().to_vec(),
            ));
        }
    }

    /// Persists the reader's current title and pages as a project
    /// snapshot. Re-saving overwrites the stored record by id.
    pub async fn save(&mut self) -> PortResult<()> {
        let user_id = match self.session.user() {
            Some(user) => user.id,
            None => return Ok(()),
        };
        let project = match self.reader.as_mut() {
            Some(reader) => reader.build_project(user_id, Utc::now()),
            None => return Ok(()),
        };

        match self.store.save_project(&project).await {
            Ok(_) => {
                if let Some(reader) = self.reader.as_mut() {
                    reader.mark_saved(Utc::now());
                }
                Ok(())
            }
            Err(err) => {
                self.session
                    .report_error("Could not save your story to the library.");
                Err(err)
            }
        }
    }

    /// Renders the book and writes it next to the configured export
    /// directory, named from the story title. Returns `Ok(None)` when a
    /// prior export is still in flight (the gate drops, never queues).
    /// Failures leave the in-memory edits untouched and no partial file.
    pub async fn export(&mut self) -> PortResult<Option<PathBuf>> {
        let (title, pages) = match self.reader.as_mut() {
            Some(reader) => {
                if !reader.begin_export() {
                    return Ok(None);
                }
                (reader.title().to_string(), reader.pages().to_vec())
            }
            None => return Ok(None),
        };

        let result = self.renderer.render(&title, &pages).await;
        let outcome = match result {
            Ok(bytes) => {
                let path = self
                    .export_dir
                    .join(format!("{}.pdf", export_file_stem(&title)));
                let write = async {
                    tokio::fs::create_dir_all(&self.export_dir).await?;
                    tokio::fs::write(&path, bytes).await
                };
                write
                    .await
                    .map(|_| Some(path))
                    .map_err(|e| PortError::Unexpected(e.to_string()))
            }
            Err(err) => Err(err),
        };

        if let Some(reader) = self.reader.as_mut() {
            reader.finish_export();
        }
        if outcome.is_err() {
            self.session
                .report_error("Could not generate PDF. Please try again.");
        }
        outcome
    }

    /// Reading -> Dashboard, discarding the finished story.
    pub fn reset(&mut self) {
        self.reader = None;
        self.session.reset();
    }

    /// Leaves the sequencer or reader for the dashboard.
    pub fn back_to_dashboard(&mut self) {
        self.reader = None;
        self.session.back_to_dashboard();
    }

    /// Ends the session entirely.
    pub fn logout(&mut self) {
        self.reader = None;
        self.session.logout();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_stem_falls_back_for_empty_titles() {
        assert_eq!(export_file_stem(""), "my-story");
        assert_eq!(export_file_stem("   "), "my-story");
    }

    #[test]
    fn export_stem_strips_hostile_characters() {
        assert_eq!(export_file_stem("A Trip: Part 2/3"), "A Trip- Part 2-3");
        assert_eq!(export_file_stem("The Long Journey"), "The Long Journey");
    }
}
