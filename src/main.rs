use std::sync::Arc;

use canvas::camera::{Point, Viewport, item_layout};
use canvas::doc::{ItemId, ItemKind};
use canvas::input::{Button, Modifiers};
use canvas::variant::ItemEdit;
use clap::{Parser, Subcommand};
use moodboard::config::{ApiConfig, ConfigError, SyncConfig};
use moodboard::notify::TracingNotifier;
use moodboard::remote::http::HttpBackend;
use moodboard::remote::memory::MemoryBackend;
use moodboard::remote::{AssetUpload, RemoteError};
use moodboard::{BoardSession, Collaborators, SessionError};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Parser, Debug)]
#[command(name = "moodboard", about = "Moodboard canvas engine host")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a board from the API and print every item and the fitted camera.
    Inspect {
        #[arg(long, env = "MOODBOARD_BOARD_ID")]
        board: Uuid,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    },
    /// Run a short scripted session against an in-memory backend and print
    /// the remote traffic it produced.
    Demo {
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to read .env");
        }
    }

    let cli = Cli::parse();
    match cli.command {
        Command::Inspect { board, width, height } => run_inspect(board, Viewport::new(width, height)).await,
        Command::Demo { width, height } => run_demo(Viewport::new(width, height)).await,
    }
}

async fn run_inspect(board: Uuid, viewport: Viewport) -> Result<(), CliError> {
    let api = ApiConfig::from_env()?;
    let http = Arc::new(HttpBackend::new(&api)?);
    let collaborators = Collaborators { backend: http.clone(), assets: http, notifier: Arc::new(TracingNotifier) };
    let session = BoardSession::open(board, collaborators, SyncConfig::from_env(), viewport).await?;

    for (id, view) in session.views().await {
        println!("{id} {view:?}");
    }
    session.interact(|engine, _| engine.fit_to_content()).await;
    let camera = session.camera().await;
    println!("fit: pan=({:.1}, {:.1}) zoom={:.3}", camera.pan_x, camera.pan_y, camera.zoom);

    session.close().await?;
    Ok(())
}

async fn run_demo(viewport: Viewport) -> Result<(), CliError> {
    let memory = Arc::new(MemoryBackend::new());
    let board = Uuid::new_v4();
    let collaborators =
        Collaborators { backend: memory.clone(), assets: memory.clone(), notifier: Arc::new(TracingNotifier) };
    let session = BoardSession::open(board, collaborators, SyncConfig::from_env(), viewport).await?;

    let note = session.add_item(ItemKind::Note, "<p>Moodboard</p>").await;
    let palette = session.add_item(ItemKind::Palette, "").await;
    session.edit_item(palette, ItemEdit::AddColor("#1e3a5f".into())).await;
    session.edit_item(palette, ItemEdit::AddColor("f4a261".into())).await;
    drag_by_move_bar(&session, note, 120.0, 40.0).await;
    session.edit_item(note, ItemEdit::SetMarkup("<p>Moodboard <b>v2</b></p>".into())).await;

    let upload = AssetUpload { file_name: "swatch.png".into(), content_type: "image/png".into(), bytes: vec![0x89, 0x50] };
    let image = session.upload(ItemKind::Image, upload).await;
    session.settle_uploads().await;
    session.delete_item(image).await;

    let report = session.close().await?;
    info!(?report, "demo session closed");

    for call in memory.calls() {
        println!("{call:?}");
    }
    for item in memory.items(board) {
        println!("persisted {} {} at ({:.0}, {:.0})", item.kind.as_str(), item.id, item.position.x, item.position.y);
    }
    Ok(())
}

/// Press on the item's move bar, drag by `(dx, dy)` screen pixels, release.
async fn drag_by_move_bar(session: &BoardSession, id: ItemId, dx: f64, dy: f64) {
    session
        .interact(|engine, now| {
            let Some(item) = engine.item(&id) else {
                return Vec::new();
            };
            let rect = item_layout(item, &engine.camera());
            let grab = Point::new(rect.x + rect.width * 0.5, rect.y + 4.0);
            let drop_at = Point::new(grab.x + dx, grab.y + dy);
            let mods = Modifiers::default();

            let mut actions = engine.on_pointer_down(grab, Button::Primary, mods);
            actions.extend(engine.on_pointer_move(drop_at, mods));
            actions.extend(engine.on_pointer_up(drop_at, Button::Primary, mods, now));
            actions
        })
        .await;
}
