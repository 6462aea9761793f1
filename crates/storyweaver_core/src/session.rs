//! crates/storyweaver_core/src/session.rs
//!
//! The top-level view-state machine. Exactly one screen is active at a
//! time; all mutations funnel through the named transition methods below.
//! The machine itself is synchronous - asynchronous work (persistence,
//! synthesis) happens outside and re-enters through the `finish_*`
//! completion methods, which validate a generation token so completions
//! that land after the user has navigated away are discarded.

use crate::domain::{StoryResponse, User};
use crate::ports::PortResult;
use crate::sequence::Sequence;
use crate::story::reconcile_segments;

/// The active screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Onboarding,
    Dashboard,
    Sequence,
    Reading,
}

/// Process-wide session state, held by the application shell.
#[derive(Debug)]
pub struct Session {
    screen: Screen,
    user: Option<User>,
    sequence: Sequence,
    story_title: String,
    error: Option<String>,
    generating: bool,
    // Bumped on every navigation away from the sequence; completions
    // carrying an older value are stale and must be ignored.
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session: login screen, everything else empty.
    pub fn new() -> Self {
        Self {
            screen: Screen::Auth,
            user: None,
            sequence: Sequence::new(),
            story_title: String::new(),
            error: None,
            generating: false,
            generation: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut Sequence {
        &mut self.sequence
    }

    pub fn story_title(&self) -> &str {
        &self.story_title
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// True iff there is something to synthesize and no call is in flight.
    pub fn can_generate(&self) -> bool {
        !self.sequence.is_empty() && !self.generating
    }

    //=====================================================================================
    // Transitions
    //=====================================================================================

    /// Auth -> Dashboard for an onboarded user, Auth -> Onboarding otherwise.
    pub fn logged_in(&mut self, user: User) {
        self.error = None;
        self.screen = if user.is_onboarded() {
            Screen::Dashboard
        } else {
            Screen::Onboarding
        };
        self.user = Some(user);
    }

    /// Onboarding -> Dashboard, entered only after the merged profile was
    /// persisted. On persistence failure the caller reports the error and
    /// the session stays on Onboarding with the entered values retained.
    pub fn profile_saved(&mut self, user: User) {
        self.error = None;
        self.user = Some(user);
        self.screen = Screen::Dashboard;
    }

    /// Dashboard -> Sequence, discarding any prior sequence and title.
    pub fn create_project(&mut self) {
        self.error = None;
        self.sequence.clear();
        self.story_title.clear();
        self.screen = Screen::Sequence;
    }

    /// Back to the dashboard from the sequencer or the reader. Invalidates
    /// any in-flight synthesis so its late completion cannot force a
    /// transition.
    pub fn back_to_dashboard(&mut self) {
        self.error = None;
        self.generation += 1;
        self.generating = false;
        self.screen = Screen::Dashboard;
    }

    /// Starts a synthesis pass. Returns the token the completion must
    /// present, or `None` while the gate is closed (empty sequence, or a
    /// prior call still outstanding - re-entrant requests are ignored, not
    /// queued).
    pub fn begin_generation(&mut self) -> Option<u64> {
        if !self.can_generate() {
            return None;
        }
        self.error = None;
        self.generating = true;
        Some(self.generation)
    }

    /// Applies a synthesis completion. Stale tokens are discarded wholesale.
    /// On success the segments are merged back into the sequence
    /// positionally and the session enters Reading; on failure the sequence
    /// and notes stay intact for an unmodified retry.
    pub fn finish_generation(&mut self, token: u64, result: PortResult<StoryResponse>) {
        if token != self.generation {
            return;
        }
        self.generating = false;
        match result {
            Ok(response) => {
                let segments = reconcile_segments(self.sequence.len(), &response.pages);
                self.sequence.apply_segments(segments);
                self.story_title = response.title;
                self.screen = Screen::Reading;
            }
            Err(err) => {
                self.error = Some(err.to_string());
            }
        }
    }

    /// Reading -> Dashboard, discarding the current sequence and title.
    pub fn reset(&mut self) {
        self.sequence.clear();
        self.story_title.clear();
        self.error = None;
        self.generation += 1;
        self.generating = false;
        self.screen = Screen::Dashboard;
    }

    /// Tears the whole session down to the initial state.
    pub fn logout(&mut self) {
        *self = Self::new();
    }

    /// Puts one message in the transient error slot; the newest message
    /// replaces any older one.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StoryImage, StoryPage};
    use crate::ports::PortError;
    use bytes::Bytes;
    use uuid::Uuid;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            name: name.to_string(),
            age: "8".to_string(),
            phone_number: None,
        }
    }

    fn image(name: &str) -> StoryImage {
        StoryImage::new(Bytes::from_static(b"img"), "image/png", name)
    }

    fn response(title: &str, pages: Vec<(u32, &str)>) -> StoryResponse {
        StoryResponse {
            title: title.to_string(),
            pages: pages
                .into_iter()
                .map(|(image_index, text)| StoryPage {
                    image_index,
                    story_segment: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn onboarded_user_skips_the_onboarding_screen() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        assert_eq!(session.screen(), Screen::Dashboard);
    }

    #[test]
    fn user_without_a_name_always_onboards() {
        let mut session = Session::new();
        session.logged_in(user(""));
        assert_eq!(session.screen(), Screen::Onboarding);

        // Failure keeps them there, with the error banner raised.
        session.report_error("Failed to save your profile. Please try again.");
        assert_eq!(session.screen(), Screen::Onboarding);
        assert!(session.error().is_some());

        session.profile_saved(user("Mira"));
        assert_eq!(session.screen(), Screen::Dashboard);
        assert!(session.error().is_none());
    }

    #[test]
    fn create_project_clears_any_prior_sequence() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session.sequence_mut().add_images(vec![image("old.png")]);
        session.back_to_dashboard();

        session.create_project();
        assert_eq!(session.screen(), Screen::Sequence);
        assert!(session.sequence().is_empty());
        assert_eq!(session.story_title(), "");
    }

    #[test]
    fn generation_gate_is_closed_for_an_empty_sequence() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        assert_eq!(session.begin_generation(), None);
    }

    #[test]
    fn reentrant_generation_requests_are_ignored_while_busy() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session.sequence_mut().add_images(vec![image("a.png")]);

        let token = session.begin_generation();
        assert!(token.is_some());
        // Second press while the first call is outstanding: no-op.
        assert_eq!(session.begin_generation(), None);

        session.finish_generation(token.unwrap(), Ok(response("T", vec![(0, "text")])));
        assert_eq!(session.screen(), Screen::Reading);
        // The gate reopens once the call resolved.
        assert!(!session.is_generating());
    }

    #[test]
    fn success_merges_segments_by_index_and_enters_reading() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session
            .sequence_mut()
            .add_images(vec![image("a.png"), image("b.png"), image("c.png")]);

        let token = session.begin_generation().unwrap();
        // Pages arrive in reverse index order; merge must follow the index.
        session.finish_generation(
            token,
            Ok(response(
                "The Long Journey",
                vec![(2, "the end"), (0, "the start"), (1, "the middle")],
            )),
        );

        assert_eq!(session.screen(), Screen::Reading);
        assert_eq!(session.story_title(), "The Long Journey");
        let segments: Vec<_> = session
            .sequence()
            .items()
            .iter()
            .map(|img| img.story_segment.clone().unwrap())
            .collect();
        assert_eq!(segments, vec!["the start", "the middle", "the end"]);
    }

    #[test]
    fn failure_keeps_the_sequence_intact_for_a_retry() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session.sequence_mut().add_images(vec![image("a.png")]);
        let first_id = session.sequence().items()[0].id;
        session.sequence_mut().set_note(first_id, "arrival");

        let token = session.begin_generation().unwrap();
        session.finish_generation(token, Err(PortError::Unexpected("model unreachable".into())));

        assert_eq!(session.screen(), Screen::Sequence);
        assert!(session.error().unwrap().contains("model unreachable"));
        assert_eq!(session.sequence().items()[0].note, "arrival");
        assert!(session.sequence().items()[0].story_segment.is_none());

        // Starting the next attempt clears the banner.
        assert!(session.begin_generation().is_some());
        assert!(session.error().is_none());
    }

    #[test]
    fn stale_completion_after_navigating_away_is_discarded() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session.sequence_mut().add_images(vec![image("a.png")]);

        let token = session.begin_generation().unwrap();
        session.back_to_dashboard();

        // The slow response resolves successfully - but too late.
        session.finish_generation(token, Ok(response("Late", vec![(0, "text")])));
        assert_eq!(session.screen(), Screen::Dashboard);
        assert_eq!(session.story_title(), "");
        assert!(!session.is_generating());
    }

    #[test]
    fn reset_discards_the_story_and_returns_to_the_dashboard() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session.sequence_mut().add_images(vec![image("a.png")]);
        let token = session.begin_generation().unwrap();
        session.finish_generation(token, Ok(response("T", vec![(0, "text")])));

        session.reset();
        assert_eq!(session.screen(), Screen::Dashboard);
        assert!(session.sequence().is_empty());
        assert_eq!(session.story_title(), "");
    }

    #[test]
    fn logout_tears_down_to_the_login_screen() {
        let mut session = Session::new();
        session.logged_in(user("Mira"));
        session.create_project();
        session.sequence_mut().add_images(vec![image("a.png")]);

        session.logout();
        assert_eq!(session.screen(), Screen::Auth);
        assert!(session.user().is_none());
        assert!(session.sequence().is_empty());
    }
}
