//! End-to-end scenarios for the application shell, with the ports mocked
//! the way the wire behaves: an in-memory store, a scripted synthesis
//! service, and a stub renderer.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use app_lib::flow::StoryweaverApp;
use async_trait::async_trait;
use bytes::Bytes;
use storyweaver_core::domain::{Project, StoryImage, StoryPage, StoryResponse, User};
use storyweaver_core::ports::{
    BookRenderer, PersistenceService, PortError, PortResult, StorySynthesisService,
};
use storyweaver_core::session::Screen;
use uuid::Uuid;

//=========================================================================================
// Mock Ports
//=========================================================================================

#[derive(Default)]
struct MemoryStore {
    users: Mutex<Vec<User>>,
    projects: Mutex<Vec<Project>>,
}

#[async_trait]
impl PersistenceService for MemoryStore {
    async fn login_or_create_user(&self, email: &str) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter().find(|u| u.email == email) {
            return Ok(user.clone());
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: String::new(),
            age: String::new(),
            phone_number: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        for record in users.iter_mut() {
            if record.id == user.id {
                *record = user.clone();
            }
        }
        Ok(user.clone())
    }

    async fn list_projects(&self, user_id: Uuid) -> PortResult<Vec<Project>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_project(&self, project: &Project) -> PortResult<Project> {
        let mut projects = self.projects.lock().unwrap();
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.push(project.clone()),
        }
        Ok(project.clone())
    }
}

/// Answers every call with pages in reverse index order, the shape a
/// loosely-mapping model is allowed to produce.
#[derive(Default)]
struct ReversedStoryService {
    calls: AtomicUsize,
    image_counts: Mutex<Vec<usize>>,
}

#[async_trait]
impl StorySynthesisService for ReversedStoryService {
    async fn generate_story(
        &self,
        images: &[StoryImage],
        _user: Option<&User>,
    ) -> PortResult<StoryResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.image_counts.lock().unwrap().push(images.len());
        let pages = (0..images.len() as u32)
            .rev()
            .map(|i| StoryPage {
                image_index: i,
                story_segment: format!("text for {}", i),
            })
            .collect();
        Ok(StoryResponse {
            title: "The Journey Home".to_string(),
            pages,
        })
    }
}

struct FailingStoryService;

#[async_trait]
impl StorySynthesisService for FailingStoryService {
    async fn generate_story(
        &self,
        _images: &[StoryImage],
        _user: Option<&User>,
    ) -> PortResult<StoryResponse> {
        Err(PortError::Unexpected("model unreachable".to_string()))
    }
}

struct StubRenderer;

#[async_trait]
impl BookRenderer for StubRenderer {
    async fn render(&self, _title: &str, _pages: &[StoryImage]) -> PortResult<Vec<u8>> {
        Ok(b"%PDF-1.4 stub".to_vec())
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn image(name: &str, note: &str) -> StoryImage {
    let mut img = StoryImage::new(Bytes::from_static(b"png-bytes"), "image/png", name);
    img.note = note.to_string();
    img
}

fn app_with(
    story: Arc<dyn StorySynthesisService>,
    export_dir: PathBuf,
) -> (StoryweaverApp, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let app = StoryweaverApp::new(store.clone(), story, Arc::new(StubRenderer), export_dir);
    (app, store)
}

async fn signed_in_at_sequencer(app: &mut StoryweaverApp) {
    app.login("mira@example.com").await.unwrap();
    assert_eq!(app.session().screen(), Screen::Onboarding);
    app.complete_onboarding("Mira", "8", None).await.unwrap();
    assert_eq!(app.session().screen(), Screen::Dashboard);
    app.session_mut().create_project();
}

//=========================================================================================
// Scenarios
//=========================================================================================

#[tokio::test]
async fn a_story_is_woven_read_saved_and_exported() {
    let story = Arc::new(ReversedStoryService::default());
    let export_dir = tempfile::tempdir().unwrap();
    let (mut app, store) = app_with(story.clone(), export_dir.path().to_path_buf());

    signed_in_at_sequencer(&mut app).await;
    app.session_mut().sequence_mut().add_images(vec![
        image("a.png", "arrival"),
        image("b.png", ""),
        image("c.png", "departure"),
    ]);

    app.generate().await;

    // One request, carrying all three image parts.
    assert_eq!(story.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*story.image_counts.lock().unwrap(), vec![3]);

    // The reversed response reconciles back to original image order.
    assert_eq!(app.session().screen(), Screen::Reading);
    let reader = app.reader().unwrap();
    assert_eq!(reader.title(), "The Journey Home");
    assert_eq!(reader.pages().len(), 3);
    let texts: Vec<_> = reader
        .pages()
        .iter()
        .map(|p| p.story_segment.clone().unwrap())
        .collect();
    assert_eq!(texts, vec!["text for 0", "text for 1", "text for 2"]);

    // Edit, save, re-save: one record, updated in place.
    app.reader_mut().unwrap().edit_text("a hand-polished opening");
    app.save().await.unwrap();
    app.save().await.unwrap();
    let user_id = app.session().user().unwrap().id;
    let listed = store.list_projects(user_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].pages[0].text, "a hand-polished opening");

    // Export writes the rendered bytes under the title's file name.
    let path = app.export().await.unwrap().unwrap();
    assert_eq!(path.file_name().unwrap().to_str().unwrap(), "The Journey Home.pdf");
    assert_eq!(tokio::fs::read(&path).await.unwrap(), b"%PDF-1.4 stub");

    // Start over: back to the dashboard with the sequence discarded.
    app.reset();
    assert_eq!(app.session().screen(), Screen::Dashboard);
    assert!(app.session().sequence().is_empty());
    assert!(app.reader().is_none());
}

#[tokio::test]
async fn a_failed_synthesis_leaves_the_sequence_ready_for_retry() {
    let export_dir = tempfile::tempdir().unwrap();
    let (mut app, _store) = app_with(Arc::new(FailingStoryService), export_dir.path().to_path_buf());

    signed_in_at_sequencer(&mut app).await;
    app.session_mut()
        .sequence_mut()
        .add_images(vec![image("a.png", "arrival")]);

    app.generate().await;

    assert_eq!(app.session().screen(), Screen::Sequence);
    assert!(app.session().error().unwrap().contains("model unreachable"));
    assert_eq!(app.session().sequence().items()[0].note, "arrival");
    assert!(app.reader().is_none());
}

#[tokio::test]
async fn generate_on_an_empty_sequence_never_reaches_the_service() {
    let story = Arc::new(ReversedStoryService::default());
    let export_dir = tempfile::tempdir().unwrap();
    let (mut app, _store) = app_with(story.clone(), export_dir.path().to_path_buf());

    signed_in_at_sequencer(&mut app).await;
    app.generate().await;

    assert_eq!(story.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.session().screen(), Screen::Sequence);
}

#[tokio::test]
async fn an_onboarded_user_lands_straight_on_the_dashboard() {
    let story = Arc::new(ReversedStoryService::default());
    let export_dir = tempfile::tempdir().unwrap();
    let (mut app, store) = app_with(story, export_dir.path().to_path_buf());

    // First visit: onboard.
    app.login("mira@example.com").await.unwrap();
    app.complete_onboarding("Mira", "8", None).await.unwrap();
    app.logout();
    assert_eq!(app.session().screen(), Screen::Auth);

    // Second visit with the same email: no onboarding.
    app.login("mira@example.com").await.unwrap();
    assert_eq!(app.session().screen(), Screen::Dashboard);
    assert_eq!(store.users.lock().unwrap().len(), 1);
}
