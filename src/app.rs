use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::fetch::FetchState;
use crate::models::SessionEntry;
use crate::registry::{CatchRegistry, Toggle};

/// Navigation is disabled for this long after each carousel move; the
/// deadline is reset, not stacked, on each accepted trigger.
pub const NAV_COOLDOWN: Duration = Duration::from_secs(2);

/// Duration of the catch-success pulse on the affected artwork.
pub const CATCH_PULSE: Duration = Duration::from_millis(500);

/// Compact RGB thumbnail stored in the in-memory sprite cache.
pub struct SpriteThumb {
    pub w: u32,
    pub h: u32,
    /// RGB pixels in row-major order (len = w*h*3).
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpriteKind {
    Artwork,
    Front,
    Back,
}

/// Thumbnails land here from background fetch tasks; the render path only
/// ever reads.
pub type SpriteCache = Arc<Mutex<HashMap<(u32, SpriteKind), SpriteThumb>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Carousel,
    CaughtPanel,
}

/// Where a details request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSource {
    SessionCache,
    /// Not in the current batch; the caller must run the on-demand fetch.
    NeedsFetch,
}

/// Session controller: owns the session cache for the current batch, the
/// catch registry, and all view state. The session cache is replaced
/// wholesale on each refresh; the registry is mutated in place with
/// write-through persistence.
pub struct App {
    /// Current batch, in carousel rotation order. The front entry is the
    /// visible card.
    pub entries: Vec<SessionEntry>,
    pub registry: CatchRegistry,
    pub focus: Focus,
    /// Open details modal. Owned (not an index) so an on-demand-fetched
    /// entry that is absent from the batch can be shown too.
    pub modal: Option<SessionEntry>,
    pub caught_selected: usize,
    pub loading: bool,
    /// Set when a whole refresh fails; replaces the carousel until the
    /// user manually refreshes.
    pub batch_error: Option<String>,
    nav_cooldown_until: Option<Instant>,
    pulse: Option<(u32, Instant)>,
    pub fetch_state: Arc<Mutex<FetchState>>,
    pub sprite_cache: SpriteCache,
}

impl App {
    pub fn new(registry: CatchRegistry) -> Self {
        Self {
            entries: Vec::new(),
            registry,
            focus: Focus::Carousel,
            modal: None,
            caught_selected: 0,
            loading: false,
            batch_error: None,
            nav_cooldown_until: None,
            pulse: None,
            fetch_state: Arc::new(Mutex::new(FetchState::default())),
            sprite_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The card currently at the front of the carousel.
    pub fn current(&self) -> Option<&SessionEntry> {
        self.entries.first()
    }

    pub fn find(&self, id: u32) -> Option<&SessionEntry> {
        self.entries.iter().find(|e| e.pokemon.id == id)
    }

    pub fn nav_ready(&self, now: Instant) -> bool {
        match self.nav_cooldown_until {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Move the front card to the end. Ignored while the cooldown is
    /// running; an accepted move resets the deadline.
    pub fn next_card(&mut self, now: Instant) -> bool {
        if !self.nav_ready(now) || self.entries.len() < 2 {
            return false;
        }
        self.entries.rotate_left(1);
        self.nav_cooldown_until = Some(now + NAV_COOLDOWN);
        true
    }

    /// Move the last card to the front (same gating as `next_card`).
    pub fn prev_card(&mut self, now: Instant) -> bool {
        if !self.nav_ready(now) || self.entries.len() < 2 {
            return false;
        }
        self.entries.rotate_right(1);
        self.nav_cooldown_until = Some(now + NAV_COOLDOWN);
        true
    }

    /// Discard view state for the outgoing batch and show the loading
    /// placeholder until a result lands.
    pub fn begin_refresh(&mut self) {
        self.entries.clear();
        self.batch_error = None;
        self.loading = true;
    }

    /// Install a refresh result. Overlapping refreshes are not cancelled;
    /// whichever resolution is applied last wins.
    pub fn apply_batch(&mut self, result: Result<Vec<SessionEntry>, String>) {
        self.loading = false;
        match result {
            Ok(entries) => {
                self.entries = entries;
                self.batch_error = None;
            }
            Err(message) => {
                self.entries.clear();
                self.batch_error = Some(message);
            }
        }
    }

    /// The id a catch/release keypress applies to: the open modal first,
    /// then the focused widget.
    pub fn toggle_target(&self) -> Option<u32> {
        if let Some(entry) = &self.modal {
            return Some(entry.pokemon.id);
        }
        match self.focus {
            Focus::Carousel => self.current().map(|e| e.pokemon.id),
            Focus::CaughtPanel => self.selected_caught_id(),
        }
    }

    /// Catch or release `id`, persist, and start the success pulse when a
    /// catch landed. All catch labels and the caught panel are derived from
    /// the registry at render time, so no further sync is needed.
    pub fn toggle_catch(&mut self, id: u32, now: Instant) -> anyhow::Result<Toggle> {
        let outcome = self.registry.toggle(id, &self.entries)?;
        if outcome == Toggle::Caught {
            self.pulse = Some((id, now + CATCH_PULSE));
        }
        let len = self.registry.len();
        if self.caught_selected >= len {
            self.caught_selected = len.saturating_sub(1);
        }
        Ok(outcome)
    }

    /// Whether the artwork for `id` should render highlighted right now.
    pub fn pulsing(&self, id: u32, now: Instant) -> bool {
        matches!(self.pulse, Some((pid, deadline)) if pid == id && now < deadline)
    }

    /// Drop expired transient state; called once per UI tick.
    pub fn tick(&mut self, now: Instant) {
        if let Some((_, deadline)) = self.pulse {
            if now >= deadline {
                self.pulse = None;
            }
        }
    }

    /// Open the details modal for `id` from the session cache, or report
    /// that an on-demand fetch is needed.
    pub fn open_details(&mut self, id: u32) -> DetailSource {
        match self.find(id) {
            Some(entry) => {
                self.modal = Some(entry.clone());
                DetailSource::SessionCache
            }
            None => DetailSource::NeedsFetch,
        }
    }

    pub fn close_modal(&mut self) {
        self.modal = None;
    }

    pub fn selected_caught_id(&self) -> Option<u32> {
        self.registry.entries().get(self.caught_selected).map(|e| e.id)
    }

    pub fn caught_select_next(&mut self) {
        let len = self.registry.len();
        if len > 0 {
            self.caught_selected = (self.caught_selected + 1) % len;
        }
    }

    pub fn caught_select_prev(&mut self) {
        let len = self.registry.len();
        if len > 0 {
            self.caught_selected = (self.caught_selected + len - 1) % len;
        }
    }
}
