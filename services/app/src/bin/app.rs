//! services/app/src/bin/app.rs
//!
//! Composition root plus the interactive terminal front-end. All business
//! rules live in the core session machine and the flow layer; this loop
//! only parses commands and prints state.

use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use app_lib::{
    adapters::{
        FallbackStore, LocalStoreAdapter, OpenAiStoryAdapter, PdfBookRenderer, RemoteStoreAdapter,
    },
    config::Config,
    error::AppError,
    flow::StoryweaverApp,
};
use async_openai::{config::OpenAIConfig, Client};
use bytes::Bytes;
use storyweaver_core::domain::StoryImage;
use storyweaver_core::session::Screen;
use tokio::io::AsyncBufReadExt;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting storyweaver...");

    // --- 2. Build the Persistence Gateway ---
    let remote = Arc::new(RemoteStoreAdapter::new(config.api_base_url.clone()));
    let local = Arc::new(LocalStoreAdapter::new(config.data_dir.join("storyweaver.json")));
    let store = Arc::new(FallbackStore::new(remote, local));

    // --- 3. Initialize the Synthesis and Export Adapters ---
    let api_key = config
        .openai_api_key
        .as_ref()
        .ok_or_else(|| AppError::Internal("OPENAI_API_KEY is required".to_string()))?;
    let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
    let story = Arc::new(OpenAiStoryAdapter::new(
        openai_client,
        config.story_model.clone(),
    ));
    let renderer = Arc::new(PdfBookRenderer::new());

    // --- 4. Build the Application Shell ---
    let mut app = StoryweaverApp::new(store, story, renderer, config.export_dir.clone());

    // --- 5. Drive the Interactive Loop ---
    run(&mut app).await
}

fn prompt(screen: Screen) -> &'static str {
    match screen {
        Screen::Auth => "auth",
        Screen::Onboarding => "onboarding",
        Screen::Dashboard => "dashboard",
        Screen::Sequence => "sequence",
        Screen::Reading => "reading",
    }
}

fn print_help(screen: Screen) {
    match screen {
        Screen::Auth => println!("  login <email> | quit"),
        Screen::Onboarding => println!("  profile <name>, <age>[, <phone>] | quit"),
        Screen::Dashboard => println!("  new | projects | logout | quit"),
        Screen::Sequence => println!(
            "  add <file>... | list | note <n> <text> | remove <n> | move <from> <to> | select <n> | generate | back | quit"
        ),
        Screen::Reading => println!(
            "  show | next | prev | edit <text> | save | export | back | reset | quit"
        ),
    }
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

fn print_sequence(app: &StoryweaverApp) {
    let sequence = app.session().sequence();
    println!("Your Sequence ({})", sequence.len());
    for (i, image) in sequence.items().iter().enumerate() {
        let marker = if sequence.selected_id() == Some(image.id) { "*" } else { " " };
        let note = if image.note.is_empty() { "No context added..." } else { image.note.as_str() };
        println!("{} {:>2}. {}  - {}", marker, i + 1, image.file_name, note);
    }
}

fn print_reader(app: &StoryweaverApp) {
    if let Some(reader) = app.reader() {
        println!("\"{}\"  ({} / {})", reader.title(), reader.cursor() + 1, reader.pages().len());
        if let Some(page) = reader.current() {
            println!("[{}]", page.file_name);
            println!("{}", page.story_segment.as_deref().unwrap_or(""));
        }
    }
}

fn item_id(app: &StoryweaverApp, index_arg: &str) -> Option<uuid::Uuid> {
    let index: usize = index_arg.parse().ok()?;
    app.session()
        .sequence()
        .items()
        .get(index.checked_sub(1)?)
        .map(|image| image.id)
}

async fn add_files(app: &mut StoryweaverApp, rest: &str) {
    let mut batch = Vec::new();
    for raw in rest.split_whitespace() {
        let path = Path::new(raw);
        match tokio::fs::read(path).await {
            Ok(data) => {
                let file_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or(raw)
                    .to_string();
                batch.push(StoryImage::new(Bytes::from(data), guess_mime(path), file_name));
            }
            Err(err) => println!("Could not read {}: {}", raw, err),
        }
    }
    if !batch.is_empty() {
        app.session_mut().sequence_mut().add_images(batch);
        print_sequence(app);
    }
}

async fn run(app: &mut StoryweaverApp) -> Result<(), AppError> {
    println!("Storyweaver - turn a handful of photos into a picture book.");
    println!("Type 'help' for the commands available on each screen.");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let Some(message) = app.session().error() {
            println!("! {}", message);
        }
        print!("{}> ", prompt(app.session().screen()));
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line
            .split_once(' ')
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match (app.session().screen(), command) {
            (_, "quit") => break,
            (_, "help") => print_help(app.session().screen()),
            (_, "dismiss") => app.session_mut().dismiss_error(),

            (Screen::Auth, "login") if !rest.is_empty() => {
                let _ = app.login(rest).await;
            }

            (Screen::Onboarding, "profile") => {
                let mut fields = rest.split(',').map(str::trim);
                match (fields.next(), fields.next()) {
                    (Some(name), Some(age)) if !name.is_empty() => {
                        let phone = fields.next().map(str::to_string);
                        let _ = app.complete_onboarding(name, age, phone).await;
                    }
                    _ => println!("Usage: profile <name>, <age>[, <phone>]"),
                }
            }

            (Screen::Dashboard, "new") => app.session_mut().create_project(),
            (Screen::Dashboard, "projects") => match app.list_projects().await {
                Ok(projects) if projects.is_empty() => println!("Your library is empty."),
                Ok(projects) => {
                    for project in projects {
                        println!("  {}  ({}, {} pages)", project.title, project.date, project.pages.len());
                    }
                }
                Err(err) => println!("Could not load your library: {}", err),
            },
            (Screen::Dashboard, "logout") => app.logout(),

            (Screen::Sequence, "add") if !rest.is_empty() => add_files(app, rest).await,
            (Screen::Sequence, "list") => print_sequence(app),
            (Screen::Sequence, "note") => {
                let (index_arg, text) = rest.split_once(' ').unwrap_or((rest, ""));
                match item_id(app, index_arg) {
                    Some(id) => app.session_mut().sequence_mut().set_note(id, text.trim()),
                    None => println!("No such scene."),
                }
            }
            (Screen::Sequence, "remove") => match item_id(app, rest) {
                Some(id) => {
                    app.session_mut().sequence_mut().remove(id);
                    print_sequence(app);
                }
                None => println!("No such scene."),
            },
            (Screen::Sequence, "select") => match item_id(app, rest) {
                Some(id) => app.session_mut().sequence_mut().select(id),
                None => println!("No such scene."),
            },
            (Screen::Sequence, "move") => {
                let args: Vec<usize> = rest
                    .split_whitespace()
                    .filter_map(|a| a.parse().ok())
                    .collect();
                let mut order: Vec<uuid::Uuid> = app
                    .session()
                    .sequence()
                    .items()
                    .iter()
                    .map(|image| image.id)
                    .collect();
                match args.as_slice() {
                    [from, to] if *from >= 1 && *from <= order.len() && *to >= 1 && *to <= order.len() => {
                        let id = order.remove(from - 1);
                        order.insert(to - 1, id);
                        app.session_mut().sequence_mut().reorder(&order);
                        print_sequence(app);
                    }
                    _ => println!("Usage: move <from> <to>"),
                }
            }
            (Screen::Sequence, "generate") => {
                if !app.session().can_generate() {
                    println!("Add at least one photo first.");
                } else {
                    println!("Weaving story...");
                    app.generate().await;
                    if app.session().screen() == Screen::Reading {
                        print_reader(app);
                    }
                }
            }
            (Screen::Sequence, "back") => app.back_to_dashboard(),

            (Screen::Reading, "show") => print_reader(app),
            (Screen::Reading, "next") => {
                if let Some(reader) = app.reader_mut() {
                    reader.go_next();
                }
                print_reader(app);
            }
            (Screen::Reading, "prev") => {
                if let Some(reader) = app.reader_mut() {
                    reader.go_prev();
                }
                print_reader(app);
            }
            (Screen::Reading, "edit") => {
                if let Some(reader) = app.reader_mut() {
                    reader.edit_text(rest);
                }
            }
            (Screen::Reading, "save") => {
                if app.save().await.is_ok() {
                    println!("Saved.");
                }
            }
            (Screen::Reading, "export") => match app.export().await {
                Ok(Some(path)) => println!("Exported to {}", path.display()),
                Ok(None) => println!("An export is already in progress."),
                Err(_) => {}
            },
            (Screen::Reading, "back") => app.back_to_dashboard(),
            (Screen::Reading, "reset") => app.reset(),

            _ => println!("Unknown command here. Type 'help'."),
        }
    }

    Ok(())
}
