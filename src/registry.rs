use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::{CaughtEntry, SessionEntry};

/// Well-known store key; the store file is `<data dir>/caughtPokemon.json`.
pub const STORE_KEY: &str = "caughtPokemon";

/// Outcome of a catch/release toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Caught,
    Released,
    /// The id is neither caught nor in the current session cache, so there
    /// is nothing to add and nothing is persisted.
    NotInSession,
}

/// The authoritative list of caught Pokémon, written through to disk on
/// every structural change.
pub struct CatchRegistry {
    entries: Vec<CaughtEntry>,
    path: PathBuf,
}

impl CatchRegistry {
    /// Resolve the store file inside `data_dir`.
    pub fn store_path(data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{STORE_KEY}.json"))
    }

    /// Load the registry from `path`; an absent or unparsable file yields
    /// an empty registry.
    pub fn load_or_default(path: PathBuf) -> Self {
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str::<Vec<CaughtEntry>>(&raw).ok())
            .unwrap_or_default();
        Self { entries, path }
    }

    pub fn is_caught(&self, id: u32) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn entries(&self) -> &[CaughtEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Catch or release `id`.
    ///
    /// Release needs only registry membership (a caught-list entry can be
    /// released long after its batch is gone); catching builds the new
    /// entry from the session cache and is a no-op when the id is not
    /// there. Any structural change is persisted before this returns.
    pub fn toggle(&mut self, id: u32, session: &[SessionEntry]) -> anyhow::Result<Toggle> {
        if let Some(index) = self.entries.iter().position(|e| e.id == id) {
            self.entries.remove(index);
            self.persist()?;
            return Ok(Toggle::Released);
        }

        let Some(entry) = session.iter().find(|e| e.pokemon.id == id) else {
            return Ok(Toggle::NotInSession);
        };
        self.entries.push(CaughtEntry {
            id: entry.pokemon.id,
            name: entry.pokemon.name.clone(),
            image: entry.pokemon.sprites.front_default.clone(),
        });
        self.persist()?;
        Ok(Toggle::Caught)
    }

    /// Write the full registry to the store as a JSON array.
    fn persist(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating store directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing store file {}", self.path.display()))?;
        Ok(())
    }
}
