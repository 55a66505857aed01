use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use rand::Rng;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{Pokemon, SessionEntry, Species};

/// The public PokeAPI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Total species count known to the API (Gen 1-9); the id domain for the
/// random draw.
pub const TOTAL_POKEMON_COUNT: u32 = 1010;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Shared progress for an in-flight batch fetch, rendered as a gauge.
#[derive(Debug, Default)]
pub struct FetchState {
    pub in_progress: bool,
    pub fetched: usize,
    pub total: usize,
}

/// Thin PokeAPI client. The base URL is injectable so tests can point it at
/// a mock server.
#[derive(Clone)]
pub struct PokeClient {
    client: reqwest::Client,
    base_url: String,
}

impl PokeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        Ok(resp.json::<T>().await?)
    }

    /// Fetch a single Pokémon record. Never raises: any failure (network,
    /// non-2xx, malformed body) is logged and collapses to `None`, and the
    /// id is simply absent from the batch.
    pub async fn fetch_pokemon(&self, id: u32) -> Option<Pokemon> {
        match self.get_json::<Pokemon>(&format!("pokemon/{id}")).await {
            Ok(p) => Some(p),
            Err(error) => {
                tracing::warn!(id, %error, "failed to fetch Pokémon");
                None
            }
        }
    }

    /// Fetch the species record (description source) for an id. Same
    /// failure contract as [`fetch_pokemon`](Self::fetch_pokemon).
    pub async fn fetch_species(&self, id: u32) -> Option<Species> {
        match self
            .get_json::<Species>(&format!("pokemon-species/{id}"))
            .await
        {
            Ok(s) => Some(s),
            Err(error) => {
                tracing::warn!(id, %error, "failed to fetch species");
                None
            }
        }
    }

    /// Fetch the whole batch in two concurrent passes: all Pokémon fetches
    /// first, then one species fetch per survivor, paired positionally.
    /// Unavailable ids are dropped; a partial batch is an accepted outcome.
    /// Entry order is the input id order filtered by success.
    pub async fn fetch_batch(
        &self,
        ids: &[u32],
        progress: Option<Arc<Mutex<FetchState>>>,
    ) -> Vec<SessionEntry> {
        if let Some(state) = &progress {
            let mut st = state.lock().unwrap();
            st.in_progress = true;
            st.fetched = 0;
            st.total = ids.len();
        }

        let pokemon_fetches = ids.iter().map(|&id| {
            let progress = progress.clone();
            async move {
                let result = self.fetch_pokemon(id).await;
                if let Some(state) = &progress {
                    state.lock().unwrap().fetched += 1;
                }
                result
            }
        });
        let valid: Vec<Pokemon> = join_all(pokemon_fetches)
            .await
            .into_iter()
            .flatten()
            .collect();

        let species_fetches = valid.iter().map(|p| self.fetch_species(p.id));
        let species = join_all(species_fetches).await;

        let entries = valid
            .into_iter()
            .zip(species)
            .map(|(pokemon, species)| SessionEntry { pokemon, species })
            .collect();

        if let Some(state) = &progress {
            state.lock().unwrap().in_progress = false;
        }
        entries
    }

    /// On-demand lookup for a caught-list entry whose batch is no longer in
    /// memory: one Pokémon fetch plus one species fetch. The detail view
    /// needs both, so either failure yields `None`.
    pub async fn fetch_detail(&self, id: u32) -> Option<SessionEntry> {
        let pokemon = self.fetch_pokemon(id).await?;
        let species = self.fetch_species(id).await?;
        Some(SessionEntry {
            pokemon,
            species: Some(species),
        })
    }

    /// Raw bytes from an absolute URL (sprite images).
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Draw `count` distinct ids uniformly from `[1, max_id]`, redrawing on
/// collision until the uniqueness set is full.
pub fn random_ids(count: usize, max_id: u32) -> Vec<u32> {
    let count = count.min(max_id as usize);
    let mut ids = HashSet::with_capacity(count);
    let mut rng = rand::thread_rng();
    while ids.len() < count {
        ids.insert(rng.gen_range(1..=max_id));
    }
    ids.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pokemon_body(id: u32, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "height": 7,
            "weight": 69,
            "types": [{ "type": { "name": "grass" } }],
            "stats": [
                { "base_stat": 45, "stat": { "name": "hp" } },
                { "base_stat": 49, "stat": { "name": "attack" } }
            ],
            "sprites": { "front_default": format!("http://img/{id}.png") }
        })
    }

    fn species_body(text: &str) -> serde_json::Value {
        json!({
            "flavor_text_entries": [
                { "flavor_text": text, "language": { "name": "en" } }
            ]
        })
    }

    async fn mount_pokemon(server: &MockServer, id: u32, name: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/pokemon/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(pokemon_body(id, name)))
            .mount(server)
            .await;
    }

    async fn mount_species(server: &MockServer, id: u32, text: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/pokemon-species/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(species_body(text)))
            .mount(server)
            .await;
    }

    #[test]
    fn random_ids_are_distinct_and_in_range() {
        let ids = random_ids(20, 1010);
        assert_eq!(ids.len(), 20);
        let set: HashSet<u32> = ids.iter().copied().collect();
        assert_eq!(set.len(), 20);
        assert!(ids.iter().all(|&id| (1..=1010).contains(&id)));
    }

    #[test]
    fn random_ids_count_is_clamped_to_domain() {
        let ids = random_ids(10, 3);
        assert_eq!(ids.len(), 3);
    }

    #[tokio::test]
    async fn non_2xx_collapses_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let client = PokeClient::new(server.uri());
        assert!(client.fetch_pokemon(404).await.is_none());
    }

    #[tokio::test]
    async fn batch_drops_failed_ids_and_keeps_input_order() {
        let server = MockServer::start().await;
        mount_pokemon(&server, 1, "bulbasaur").await;
        // id 2 has no mock mounted: 404, dropped.
        mount_pokemon(&server, 3, "venusaur").await;
        mount_species(&server, 1, "A seed.").await;
        // species for 3 missing: entry survives with species None.

        let client = PokeClient::new(server.uri());
        let progress = Arc::new(Mutex::new(FetchState::default()));
        let entries = client
            .fetch_batch(&[1, 2, 3], Some(progress.clone()))
            .await;

        let ids: Vec<u32> = entries.iter().map(|e| e.pokemon.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(entries[0].species.is_some());
        assert!(entries[1].species.is_none());

        let st = progress.lock().unwrap();
        assert!(!st.in_progress);
        assert_eq!(st.fetched, 3);
        assert_eq!(st.total, 3);
    }

    #[tokio::test]
    async fn full_batch_of_twenty_fills_the_session_cache() {
        let server = MockServer::start().await;
        for id in 1..=20 {
            mount_pokemon(&server, id, "mon").await;
            mount_species(&server, id, "Text.").await;
        }
        let client = PokeClient::new(server.uri());
        let ids: Vec<u32> = (1..=20).collect();
        let entries = client.fetch_batch(&ids, None).await;
        assert_eq!(entries.len(), 20);
        assert!(entries.iter().all(|e| e.species.is_some()));
    }

    #[tokio::test]
    async fn detail_fetch_hits_each_endpoint_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pokemon/25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(pokemon_body(25, "pikachu")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pokemon-species/25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(species_body("Zap.")))
            .expect(1)
            .mount(&server)
            .await;

        let client = PokeClient::new(server.uri());
        let entry = client.fetch_detail(25).await.expect("detail");
        assert_eq!(entry.pokemon.id, 25);
        assert!(entry.species.is_some());
        server.verify().await;
    }

    #[tokio::test]
    async fn detail_fetch_requires_both_records() {
        let server = MockServer::start().await;
        mount_pokemon(&server, 6, "charizard").await;
        // No species mock: detail must not resolve.
        let client = PokeClient::new(server.uri());
        assert!(client.fetch_detail(6).await.is_none());
    }
}
