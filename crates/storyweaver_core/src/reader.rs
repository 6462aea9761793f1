//! crates/storyweaver_core/src/reader.rs
//!
//! The paginated reader/editor shown after synthesis. Owns a by-value copy
//! of the finished pages, so edits live here for the rest of the session
//! and never touch a previously saved project unless re-saved.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{Project, SavedPage, StoryImage};

/// How long the transient "saved" indicator stays visible, in seconds.
pub const SAVED_INDICATOR_SECS: i64 = 3;

#[derive(Debug)]
pub struct Reader {
    title: String,
    pages: Vec<StoryImage>,
    cursor: usize,
    dirty: bool,
    exporting: bool,
    saved_at: Option<DateTime<Utc>>,
    // Assigned on the first save and reused afterwards, so a re-save
    // overwrites the stored project instead of duplicating it.
    project_id: Option<Uuid>,
}

impl Reader {
    /// Takes the finalized pages by value; the live sequence is carried
    /// forward as a snapshot.
    pub fn new(title: impl Into<String>, pages: Vec<StoryImage>) -> Self {
        Self {
            title: title.into(),
            pages,
            cursor: 0,
            dirty: false,
            exporting: false,
            saved_at: None,
            project_id: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[StoryImage] {
        &self.pages
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&StoryImage> {
        self.pages.get(self.cursor)
    }

    pub fn can_go_next(&self) -> bool {
        self.cursor + 1 < self.pages.len()
    }

    pub fn can_go_prev(&self) -> bool {
        self.cursor > 0
    }

    /// Cursor forward by one, stopping at the last page - no wraparound.
    pub fn go_next(&mut self) {
        if self.can_go_next() {
            self.cursor += 1;
        }
    }

    /// Cursor back by one, stopping at the first page.
    pub fn go_prev(&mut self) {
        if self.can_go_prev() {
            self.cursor -= 1;
        }
    }

    /// Overwrites the current page's text in the working copy and marks
    /// the session dirty, clearing any lingering "saved" indicator.
    pub fn edit_text(&mut self, text: &str) {
        if let Some(page) = self.pages.get_mut(self.cursor) {
            page.story_segment = Some(text.to_string());
            self.dirty = true;
            self.saved_at = None;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Records a completed save. The indicator this raises self-clears
    /// after [`SAVED_INDICATOR_SECS`].
    pub fn mark_saved(&mut self, now: DateTime<Utc>) {
        self.dirty = false;
        self.saved_at = Some(now);
    }

    pub fn saved_indicator_visible(&self, now: DateTime<Utc>) -> bool {
        self.saved_at
            .map(|at| now - at < Duration::seconds(SAVED_INDICATOR_SECS))
            .unwrap_or(false)
    }

    /// Opens the export gate. Returns false while a prior export is still
    /// outstanding - duplicate requests are dropped, not queued.
    pub fn begin_export(&mut self) -> bool {
        if self.exporting {
            return false;
        }
        self.exporting = true;
        true
    }

    pub fn finish_export(&mut self) {
        self.exporting = false;
    }

    pub fn is_exporting(&self) -> bool {
        self.exporting
    }

    /// Assembles the immutable project snapshot for persistence: a stable
    /// id (fresh on the first save), the creation date fixed at save time,
    /// the first page's display handle as the cover, and every page's
    /// image/text pair by position.
    pub fn build_project(&mut self, user_id: Uuid, now: DateTime<Utc>) -> Project {
        let id = *self.project_id.get_or_insert_with(Uuid::new_v4);
        Project {
            id,
            user_id,
            title: self.title.clone(),
            date: now.format("%b %-d, %Y").to_string(),
            cover_image: self
                .pages
                .first()
                .map(|page| page.data_url())
                .unwrap_or_default(),
            pages: self
                .pages
                .iter()
                .map(|page| SavedPage {
                    image: page.data_url(),
                    text: page.story_segment.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }
}
