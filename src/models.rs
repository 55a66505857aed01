use serde::{Deserialize, Serialize};

/// A Pokémon record as returned by `GET {base}/pokemon/{id}`.
///
/// Only the fields the UI needs are typed; everything else in the (large)
/// API payload is ignored. All fields default so a sparse or partial
/// response still deserializes.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Pokemon {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    /// Decimeters, per the API.
    #[serde(default)]
    pub height: u32,
    /// Hectograms, per the API.
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub moves: Vec<MoveSlot>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl Pokemon {
    /// Preferred card artwork: official artwork, falling back to the plain
    /// front sprite.
    pub fn artwork_url(&self) -> Option<&str> {
        self.sprites
            .other
            .official_artwork
            .front_default
            .as_deref()
            .or(self.sprites.front_default.as_deref())
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.kind.name.as_str()).collect()
    }

    pub fn ability_names(&self) -> Vec<&str> {
        self.abilities
            .iter()
            .map(|a| a.ability.name.as_str())
            .collect()
    }
}

/// `{ "name": ... }` wrapper used all over the API for named sub-resources.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Named {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TypeSlot {
    #[serde(rename = "type", default)]
    pub kind: Named,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StatSlot {
    #[serde(default)]
    pub stat: Named,
    #[serde(default)]
    pub base_stat: u32,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AbilitySlot {
    #[serde(default)]
    pub ability: Named,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MoveSlot {
    #[serde(rename = "move", default)]
    pub action: Named,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    pub official_artwork: ArtworkSprites,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArtworkSprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// A species record as returned by `GET {base}/pokemon-species/{id}`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Species {
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FlavorTextEntry {
    #[serde(default)]
    pub flavor_text: String,
    #[serde(default)]
    pub language: Named,
}

/// One fetched Pokémon paired with its species data (if that fetch
/// succeeded). The session cache is an ordered list of these for the
/// current random batch only.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub pokemon: Pokemon,
    pub species: Option<Species>,
}

/// The persisted shape of a caught Pokémon. `image` is the front sprite URL
/// at catch time; the API can omit it.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct CaughtEntry {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}
