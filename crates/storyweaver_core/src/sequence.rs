//! crates/storyweaver_core/src/sequence.rs
//!
//! The ordered, user-editable collection of images-with-notes that exists
//! before synthesis. Supports insertion, removal, wholesale reordering and
//! per-item annotation, and keeps the "currently inspected" selection valid
//! across every structural mutation.

use uuid::Uuid;

use crate::domain::StoryImage;

/// The editable image sequence plus the inspector selection.
///
/// Invariant: `selected`, when set, always references an id present in the
/// current item list, and is `None` iff the list is empty.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    items: Vec<StoryImage>,
    selected: Option<Uuid>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[StoryImage] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn selected_id(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn selected(&self) -> Option<&StoryImage> {
        self.selected
            .and_then(|id| self.items.iter().find(|img| img.id == id))
    }

    /// Appends one item per uploaded file. The first item of the new batch
    /// becomes the selection.
    pub fn add_images(&mut self, new_images: Vec<StoryImage>) {
        if let Some(first) = new_images.first() {
            self.selected = Some(first.id);
        }
        self.items.extend(new_images);
    }

    /// Deletes the matching item. If it was selected, selection moves to
    /// the new first item, or clears when the list becomes empty.
    pub fn remove(&mut self, id: Uuid) {
        self.items.retain(|img| img.id != id);
        if self.selected == Some(id) {
            self.selected = self.items.first().map(|img| img.id);
        }
    }

    /// Replaces the list order wholesale. Ids keep their items (notes and
    /// generated text travel with them); ids not present in the sequence
    /// are ignored, and items missing from `order` keep their relative
    /// order at the tail. Selection is unaffected.
    pub fn reorder(&mut self, order: &[Uuid]) {
        let mut remaining = std::mem::take(&mut self.items);
        let mut reordered = Vec::with_capacity(remaining.len());
        for id in order {
            if let Some(pos) = remaining.iter().position(|img| img.id == *id) {
                reordered.push(remaining.remove(pos));
            }
        }
        reordered.extend(remaining);
        self.items = reordered;
    }

    /// Updates one item's context note in place. Ordering and selection
    /// are untouched.
    pub fn set_note(&mut self, id: Uuid, note: &str) {
        if let Some(img) = self.items.iter_mut().find(|img| img.id == id) {
            img.note = note.to_string();
        }
    }

    /// Moves the inspector selection. Ignored for unknown ids so the
    /// selection invariant cannot be broken from outside.
    pub fn select(&mut self, id: Uuid) {
        if self.items.iter().any(|img| img.id == id) {
            self.selected = Some(id);
        }
    }

    /// Writes the reconciled story segments back onto the items, one per
    /// position. Extra segments are dropped, which cannot happen when the
    /// segment list came from `reconcile_segments`.
    pub fn apply_segments(&mut self, segments: Vec<String>) {
        for (img, segment) in self.items.iter_mut().zip(segments) {
            img.story_segment = Some(segment);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.selected = None;
    }
}
