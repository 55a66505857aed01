//! Utility helpers used across the application (formatting, flavor text,
//! unit conversions, sprite decoding). Keep helpers small and
//! well-documented for readability.

use crate::app::SpriteThumb;
use crate::models::{Pokemon, Species};

/// Placeholder shown wherever an English description is unavailable.
pub const NO_DESCRIPTION: &str = "No description available for this Pokémon.";

/// Format a Pokémon `name` into a human-friendly form.
///
/// Examples: `mr-mime` -> `Mr Mime`, `ho_oh` -> `Ho Oh`.
pub fn format_name(name: &str) -> String {
    let replaced = name.replace('-', " ").replace('_', " ");
    let parts: Vec<String> = replaced
        .split_whitespace()
        .map(|w| {
            let mut chs = w.chars();
            match chs.next() {
                None => String::new(),
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chs.as_str().to_lowercase()
                }
            }
        })
        .collect();
    parts.join(" ")
}

/// Capitalize each space-delimited word, leaving everything else (commas,
/// hyphens) alone. This is what the card's joined type list goes through:
/// "grass, poison" -> "Grass, Poison".
pub fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chs = w.chars();
            match chs.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chs.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn text_to_lines(s: &str, width: usize) -> Vec<String> {
    // Wrap text into lines no longer than `width` (simple greedy algorithm).
    let mut lines = vec![];
    let mut current = String::new();
    for word in s.split_whitespace() {
        if current.len() + word.len() + 1 > width && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// The canonical description: the first flavor-text entry tagged "en", with
/// embedded newlines and form feeds replaced by spaces. `None` when the
/// species is missing or has no English entry.
pub fn english_flavor_text(species: Option<&Species>) -> Option<String> {
    let species = species?;
    species
        .flavor_text_entries
        .iter()
        .find(|e| e.language.name == "en")
        .map(|e| e.flavor_text.replace(['\n', '\u{c}'], " "))
}

/// Description for display: English flavor text or the literal placeholder.
pub fn description_or_placeholder(species: Option<&Species>) -> String {
    english_flavor_text(species).unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

/// API decimeters -> "0.7 m".
pub fn format_height(decimeters: u32) -> String {
    format!("{:.1} m", decimeters as f64 / 10.0)
}

/// API hectograms -> "6.9 kg".
pub fn format_weight(hectograms: u32) -> String {
    format!("{:.1} kg", hectograms as f64 / 10.0)
}

/// Base value of the named stat, if the record carries it.
pub fn stat_value(pokemon: &Pokemon, stat: &str) -> Option<u32> {
    pokemon
        .stats
        .iter()
        .find(|s| s.stat.name == stat)
        .map(|s| s.base_stat)
}

/// Decode fetched sprite bytes and resize to a `w` x `h` RGB thumbnail for
/// terminal cell rendering. `None` when the bytes are not a decodable image.
pub fn decode_thumb(bytes: &[u8], w: u32, h: u32) -> Option<SpriteThumb> {
    let img = image::load_from_memory(bytes).ok()?;
    let small = image::imageops::resize(
        &img.to_rgba8(),
        w,
        h,
        image::imageops::FilterType::Lanczos3,
    );
    let mut pixels = Vec::with_capacity((w * h * 3) as usize);
    for y in 0..small.height() {
        for x in 0..small.width() {
            let p = small.get_pixel(x, y);
            pixels.push(p[0]);
            pixels.push(p[1]);
            pixels.push(p[2]);
        }
    }
    Some(SpriteThumb { w, h, pixels })
}
