mod app;
mod fetch;
mod models;
mod registry;
mod ui;
mod utils;

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CEvent, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use crate::app::{App, DetailSource, Focus, SpriteCache, SpriteKind};
use crate::fetch::{FetchState, PokeClient, DEFAULT_BASE_URL, TOTAL_POKEMON_COUNT};
use crate::models::SessionEntry;
use crate::registry::CatchRegistry;
use crate::ui::draw_ui;
use crate::utils::decode_thumb;

/// Pokémon per batch unless overridden via `POKEMON_COUNT`.
const DEFAULT_BATCH_SIZE: usize = 20;

const ARTWORK_THUMB: (u32, u32) = (32, 15);
const SPRITE_THUMB: (u32, u32) = (22, 10);

/// Background tasks hand results to the main loop through these slots; the
/// loop takes whatever is there on each tick, so when refreshes overlap the
/// last resolution wins.
type RefreshSlot = Arc<Mutex<Option<Result<Vec<SessionEntry>, String>>>>;
type DetailSlot = Arc<Mutex<Option<SessionEntry>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log to stderr so the alternate screen stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let batch_size: usize = std::env::var("POKEMON_COUNT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_BATCH_SIZE);
    let max_id: u32 = std::env::var("POKEDEX_MAX")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(TOTAL_POKEMON_COUNT);

    let registry = CatchRegistry::load_or_default(CatchRegistry::store_path(&data_dir()));
    let client = PokeClient::new(DEFAULT_BASE_URL);
    let mut app = App::new(registry);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, client, batch_size, max_id).await;

    // Restore terminal
    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(LeaveAlternateScreen)?;
    result
}

fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("POKECAROUSEL_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pokecarousel")
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: PokeClient,
    batch_size: usize,
    max_id: u32,
) -> anyhow::Result<()> {
    let refresh_slot: RefreshSlot = Arc::new(Mutex::new(None));
    let detail_slot: DetailSlot = Arc::new(Mutex::new(None));

    app.begin_refresh();
    spawn_refresh(
        client.clone(),
        batch_size,
        max_id,
        app.fetch_state.clone(),
        refresh_slot.clone(),
    );

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        let now = Instant::now();
        app.tick(now);
        draw_ui(terminal, app, now)?;

        // A finished refresh replaces the session cache wholesale.
        if let Some(result) = refresh_slot.lock().unwrap().take() {
            app.apply_batch(result);
            for entry in &app.entries {
                queue_sprite(
                    &client,
                    &app.sprite_cache,
                    entry.pokemon.id,
                    SpriteKind::Artwork,
                    entry.pokemon.artwork_url(),
                    ARTWORK_THUMB,
                );
            }
        }

        // An on-demand caught-list lookup resolved; open its modal.
        if let Some(entry) = detail_slot.lock().unwrap().take() {
            queue_modal_sprites(&client, &app.sprite_cache, &entry);
            app.modal = Some(entry);
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let CEvent::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') => break,
                    KeyCode::Char('r') => {
                        // No cancellation of an in-flight refresh: both
                        // complete, the later slot write wins.
                        app.begin_refresh();
                        spawn_refresh(
                            client.clone(),
                            batch_size,
                            max_id,
                            app.fetch_state.clone(),
                            refresh_slot.clone(),
                        );
                    }
                    KeyCode::Char('n') | KeyCode::Right => {
                        app.next_card(now);
                    }
                    KeyCode::Char('p') | KeyCode::Left => {
                        app.prev_card(now);
                    }
                    KeyCode::Char('c') | KeyCode::Char(' ') => {
                        if let Some(id) = app.toggle_target() {
                            if let Err(error) = app.toggle_catch(id, now) {
                                tracing::warn!(id, %error, "failed to persist catch registry");
                            }
                        }
                    }
                    KeyCode::Enter => {
                        if app.modal.is_none() {
                            open_details(app, &client, &detail_slot);
                        }
                    }
                    KeyCode::Esc => app.close_modal(),
                    KeyCode::Tab => {
                        app.focus = match app.focus {
                            Focus::Carousel => Focus::CaughtPanel,
                            Focus::CaughtPanel => Focus::Carousel,
                        };
                    }
                    KeyCode::Down => {
                        if app.focus == Focus::CaughtPanel {
                            app.caught_select_next();
                        }
                    }
                    KeyCode::Up => {
                        if app.focus == Focus::CaughtPanel {
                            app.caught_select_prev();
                        }
                    }
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }

    Ok(())
}

/// Resolve the details target from the focused widget: session cache first,
/// falling back to an on-demand fetch for caught entries whose batch is no
/// longer in memory.
fn open_details(app: &mut App, client: &PokeClient, detail_slot: &DetailSlot) {
    let id = match app.focus {
        Focus::Carousel => app.current().map(|e| e.pokemon.id),
        Focus::CaughtPanel => app.selected_caught_id(),
    };
    let Some(id) = id else {
        return;
    };
    match app.open_details(id) {
        DetailSource::SessionCache => {
            let entry = app.modal.clone();
            if let Some(entry) = entry {
                queue_modal_sprites(client, &app.sprite_cache, &entry);
            }
        }
        DetailSource::NeedsFetch => {
            let client = client.clone();
            let slot = detail_slot.clone();
            tokio::spawn(async move {
                match client.fetch_detail(id).await {
                    Some(entry) => {
                        *slot.lock().unwrap() = Some(entry);
                    }
                    None => tracing::warn!(id, "on-demand detail fetch failed"),
                }
            });
        }
    }
}

/// Fetch a fresh random batch on a background task. The batch itself
/// tolerates per-id failures; only a task-level failure (panic/abort)
/// surfaces as a batch error.
fn spawn_refresh(
    client: PokeClient,
    batch_size: usize,
    max_id: u32,
    progress: Arc<Mutex<FetchState>>,
    slot: RefreshSlot,
) {
    tokio::spawn(async move {
        let ids = fetch::random_ids(batch_size, max_id);
        let batch = {
            let client = client.clone();
            let progress = progress.clone();
            tokio::spawn(async move { client.fetch_batch(&ids, Some(progress)).await })
        };
        let result = match batch.await {
            Ok(entries) => Ok(entries),
            Err(error) => {
                progress.lock().unwrap().in_progress = false;
                tracing::error!(%error, "batch refresh failed");
                Err(error.to_string())
            }
        };
        *slot.lock().unwrap() = Some(result);
    });
}

fn queue_modal_sprites(client: &PokeClient, cache: &SpriteCache, entry: &SessionEntry) {
    let id = entry.pokemon.id;
    queue_sprite(
        client,
        cache,
        id,
        SpriteKind::Front,
        entry.pokemon.sprites.front_default.as_deref(),
        SPRITE_THUMB,
    );
    queue_sprite(
        client,
        cache,
        id,
        SpriteKind::Back,
        entry.pokemon.sprites.back_default.as_deref(),
        SPRITE_THUMB,
    );
}

/// Fetch and decode one sprite into the shared thumbnail cache, unless it
/// is already there or the record carries no URL for it.
fn queue_sprite(
    client: &PokeClient,
    cache: &SpriteCache,
    id: u32,
    kind: SpriteKind,
    url: Option<&str>,
    (w, h): (u32, u32),
) {
    let Some(url) = url else {
        return;
    };
    if cache.lock().unwrap().contains_key(&(id, kind)) {
        return;
    }
    let client = client.clone();
    let cache = cache.clone();
    let url = url.to_string();
    tokio::spawn(async move {
        match client.fetch_bytes(&url).await {
            Ok(bytes) => {
                if let Some(thumb) = decode_thumb(&bytes, w, h) {
                    cache.lock().unwrap().insert((id, kind), thumb);
                } else {
                    tracing::warn!(id, %url, "sprite bytes did not decode");
                }
            }
            Err(error) => tracing::warn!(id, %url, %error, "failed to fetch sprite"),
        }
    });
}
