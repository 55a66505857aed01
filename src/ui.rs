use std::io;
use std::io::Stdout;
use std::time::Instant;

use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans};
use ratatui::widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;

use crate::app::{App, Focus, SpriteKind};
use crate::models::{CaughtEntry, Pokemon, SessionEntry};
use crate::utils::{
    capitalize_words, description_or_placeholder, format_height, format_name, format_weight,
    stat_value, text_to_lines,
};

pub const EMPTY_CAUGHT_MSG: &str = "You haven't caught any Pokémon yet!";
pub const BATCH_ERROR_MSG: &str = "Failed to load Pokémon data. Please try again.";
pub const LOADING_MSG: &str = "Loading Pokémon...";

const CARD_TEXT_WIDTH: usize = 46;
const MODAL_TEXT_WIDTH: usize = 56;
/// The modal shows at most this many moves.
const MODAL_MOVE_LIMIT: usize = 10;

/// Label for the compact card's catch button.
pub fn catch_label(is_caught: bool) -> &'static str {
    if is_caught {
        "RELEASE"
    } else {
        "CATCH"
    }
}

/// Label for the modal's catch button.
pub fn modal_catch_label(is_caught: bool) -> &'static str {
    if is_caught {
        "RELEASE POKÉMON"
    } else {
        "CATCH POKÉMON"
    }
}

/// The comma-joined type list, capitalized as a joined string. The
/// capitalizer works per space-delimited word, so every type still gets its
/// capital ("grass, poison" -> "Grass, Poison").
pub fn type_line(pokemon: &Pokemon) -> String {
    capitalize_words(&pokemon.type_names().join(", "))
}

/// Compact card text: a pure function of (record, species, membership).
pub fn card_lines(entry: &SessionEntry, is_caught: bool) -> Vec<String> {
    let p = &entry.pokemon;
    let mut lines = vec![
        format!("POKÉMON #{}", p.id),
        format_name(&p.name),
        String::new(),
    ];
    lines.extend(text_to_lines(
        &description_or_placeholder(entry.species.as_ref()),
        CARD_TEXT_WIDTH,
    ));
    lines.push(String::new());
    lines.push(format!("Type    {}", type_line(p)));
    lines.push(format!("Height  {}", format_height(p.height)));
    lines.push(format!("Weight  {}", format_weight(p.weight)));
    if let Some(hp) = stat_value(p, "hp") {
        lines.push(format!("HP      {hp}"));
    }
    if let Some(attack) = stat_value(p, "attack") {
        lines.push(format!("Attack  {attack}"));
    }
    lines.push(String::new());
    lines.push(format!(
        "[c] {}   [Enter] VIEW DETAILS",
        catch_label(is_caught)
    ));
    lines
}

/// Detailed modal text: card content plus abilities, stats, and the first
/// ten moves. Height and weight are appended as stat-like rows.
pub fn modal_lines(entry: &SessionEntry, is_caught: bool) -> Vec<String> {
    let p = &entry.pokemon;
    let mut lines = vec![
        format_name(&p.name),
        format!("Pokémon #{}", p.id),
        format!("Types: {}", type_line(p)),
        String::new(),
    ];
    lines.extend(text_to_lines(
        &description_or_placeholder(entry.species.as_ref()),
        MODAL_TEXT_WIDTH,
    ));
    lines.push(String::new());

    lines.push("Base Stats".to_string());
    for stat in &p.stats {
        lines.push(format!(
            "  {:<16} {}",
            format_name(&stat.stat.name),
            stat.base_stat
        ));
    }
    lines.push(format!("  {:<16} {}", "Height", format_height(p.height)));
    lines.push(format!("  {:<16} {}", "Weight", format_weight(p.weight)));

    lines.push(String::new());
    lines.push("Abilities".to_string());
    for ability in p.ability_names() {
        lines.push(format!("  {}", ability.replace('-', " ")));
    }

    lines.push(String::new());
    lines.push("Sample Moves".to_string());
    for slot in p.moves.iter().take(MODAL_MOVE_LIMIT) {
        lines.push(format!("  {}", slot.action.name.replace('-', " ")));
    }

    lines.push(String::new());
    lines.push(format!("[c] {}   [Esc] CLOSE", modal_catch_label(is_caught)));
    lines
}

/// One caught-panel row.
pub fn caught_line(entry: &CaughtEntry) -> String {
    format!("#{} {}", entry.id, format_name(&entry.name))
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_w = r.width.saturating_mul(percent_x) / 100;
    let popup_h = r.height.saturating_mul(percent_y) / 100;
    let popup_x = r.x + (r.width.saturating_sub(popup_w) / 2);
    let popup_y = r.y + (r.height.saturating_sub(popup_h) / 2);
    Rect::new(popup_x, popup_y, popup_w, popup_h)
}

pub fn draw_ui(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    now: Instant,
) -> io::Result<()> {
    terminal
        .draw(|f| {
            let size = f.size();
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(10), Constraint::Length(3)])
                .split(size);

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
                .split(rows[0]);

            draw_carousel(f, columns[0], app, now);
            draw_caught_panel(f, columns[1], app);
            draw_footer(f, rows[1], app);

            if app.modal.is_some() {
                draw_modal(f, size, app);
            }
        })
        .map(|_| ())
}

fn draw_carousel(
    f: &mut ratatui::Frame<CrosstermBackend<Stdout>>,
    area: Rect,
    app: &App,
    now: Instant,
) {
    if let Some(message) = &app.batch_error {
        let error = Paragraph::new(vec![
            Spans::from(Span::styled(
                BATCH_ERROR_MSG,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Spans::from(Span::raw(message.clone())),
            Spans::from(Span::raw("Press 'r' to refresh.")),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Carousel"));
        f.render_widget(error, area);
        return;
    }

    if app.loading && app.entries.is_empty() {
        let loading = Paragraph::new(LOADING_MSG)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Carousel"));
        f.render_widget(loading, area);
        return;
    }

    let Some(entry) = app.current() else {
        let empty = Paragraph::new("No Pokémon in this batch. Press 'r' to refresh.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Carousel"));
        f.render_widget(empty, area);
        return;
    };

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(20)])
        .split(area);

    let id = entry.pokemon.id;
    let sprite_block = if app.pulsing(id, now) {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title("Gotcha!")
    } else {
        Block::default().borders(Borders::ALL).title("Artwork")
    };
    f.render_widget(
        sprite_paragraph(app, id, SpriteKind::Artwork).block(sprite_block),
        halves[0],
    );

    let is_caught = app.registry.is_caught(id);
    let mut text: Vec<Spans> = Vec::new();
    for (i, line) in card_lines(entry, is_caught).into_iter().enumerate() {
        let span = if i == 1 {
            Span::styled(line, Style::default().add_modifier(Modifier::BOLD))
        } else {
            Span::raw(line)
        };
        text.push(Spans::from(span));
    }
    let title = format!("Carousel ({} in batch)", app.entries.len());
    let card = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(card, halves[1]);
}

fn draw_caught_panel(f: &mut ratatui::Frame<CrosstermBackend<Stdout>>, area: Rect, app: &App) {
    // Rebuilt in full on every draw, so any registry mutation is reflected
    // immediately.
    let focused = app.focus == Focus::CaughtPanel;
    let title = format!("Caught ({})", app.registry.len());
    let block = if focused {
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title)
    } else {
        Block::default().borders(Borders::ALL).title(title)
    };

    if app.registry.is_empty() {
        let placeholder = Paragraph::new(EMPTY_CAUGHT_MSG)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem> = app
        .registry
        .entries()
        .iter()
        .map(|e| ListItem::new(Spans::from(Span::raw(caught_line(e)))))
        .collect();
    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let mut state = ListState::default();
    if focused {
        state.select(Some(app.caught_selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(f: &mut ratatui::Frame<CrosstermBackend<Stdout>>, area: Rect, app: &App) {
    let st = app.fetch_state.lock().unwrap();
    if st.in_progress {
        let pct = if st.total == 0 {
            0.0
        } else {
            st.fetched as f64 / st.total as f64
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Fetching Pokémon"),
            )
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(pct);
        f.render_widget(gauge, area);
        return;
    }
    let help = Paragraph::new(
        "n/p carousel  c catch/release  Enter details  Tab caught list  r refresh  q quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Keys"));
    f.render_widget(help, area);
}

fn draw_modal(f: &mut ratatui::Frame<CrosstermBackend<Stdout>>, size: Rect, app: &App) {
    let Some(entry) = &app.modal else {
        return;
    };
    let id = entry.pokemon.id;
    let popup = centered_rect(72, 84, size);
    f.render_widget(Clear, popup);

    let outer = Block::default().borders(Borders::ALL).title("Details");
    f.render_widget(outer, popup);
    let inner = Rect {
        x: popup.x + 1,
        y: popup.y + 1,
        width: popup.width.saturating_sub(2),
        height: popup.height.saturating_sub(2),
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(13), Constraint::Min(6)])
        .split(inner);

    let sprite_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(26), Constraint::Length(26), Constraint::Min(0)])
        .split(rows[0]);
    f.render_widget(
        sprite_paragraph(app, id, SpriteKind::Front)
            .block(Block::default().borders(Borders::ALL).title("Front")),
        sprite_cols[0],
    );
    if entry.pokemon.sprites.back_default.is_some() {
        f.render_widget(
            sprite_paragraph(app, id, SpriteKind::Back)
                .block(Block::default().borders(Borders::ALL).title("Back")),
            sprite_cols[1],
        );
    }

    let is_caught = app.registry.is_caught(id);
    let text: Vec<Spans> = modal_lines(entry, is_caught)
        .into_iter()
        .map(|line| Spans::from(Span::raw(line)))
        .collect();
    let body = Paragraph::new(text).wrap(Wrap { trim: true });
    f.render_widget(body, rows[1]);
}

/// Render a cached sprite thumbnail as rows of background-colored cells, or
/// a placeholder while the bytes are still in flight.
fn sprite_paragraph<'a>(app: &'a App, id: u32, kind: SpriteKind) -> Paragraph<'a> {
    let cache = app.sprite_cache.lock().unwrap();
    let Some(thumb) = cache.get(&(id, kind)) else {
        return Paragraph::new("(loading sprite)");
    };
    let mut rows: Vec<Spans> = Vec::with_capacity(thumb.h as usize);
    for y in 0..thumb.h {
        let mut spans = Vec::with_capacity(thumb.w as usize);
        for x in 0..thumb.w {
            let idx = ((y * thumb.w + x) * 3) as usize;
            let (r, g, b) = (
                thumb.pixels[idx],
                thumb.pixels[idx + 1],
                thumb.pixels[idx + 2],
            );
            spans.push(Span::styled(" ", Style::default().bg(Color::Rgb(r, g, b))));
        }
        rows.push(Spans::from(spans));
    }
    drop(cache);
    Paragraph::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MoveSlot, Named, StatSlot, TypeSlot};
    use pretty_assertions::assert_eq;

    fn pokemon() -> Pokemon {
        Pokemon {
            id: 1,
            name: "bulbasaur".to_string(),
            height: 7,
            weight: 69,
            types: vec![
                TypeSlot {
                    kind: Named {
                        name: "grass".to_string(),
                    },
                },
                TypeSlot {
                    kind: Named {
                        name: "poison".to_string(),
                    },
                },
            ],
            stats: vec![
                StatSlot {
                    stat: Named {
                        name: "hp".to_string(),
                    },
                    base_stat: 45,
                },
                StatSlot {
                    stat: Named {
                        name: "attack".to_string(),
                    },
                    base_stat: 49,
                },
                StatSlot {
                    stat: Named {
                        name: "special-attack".to_string(),
                    },
                    base_stat: 65,
                },
            ],
            ..Pokemon::default()
        }
    }

    fn entry() -> SessionEntry {
        SessionEntry {
            pokemon: pokemon(),
            species: None,
        }
    }

    #[test]
    fn catch_labels_follow_membership() {
        assert_eq!(catch_label(false), "CATCH");
        assert_eq!(catch_label(true), "RELEASE");
        assert_eq!(modal_catch_label(false), "CATCH POKÉMON");
        assert_eq!(modal_catch_label(true), "RELEASE POKÉMON");
    }

    #[test]
    fn type_list_is_capitalized_as_a_joined_string() {
        assert_eq!(type_line(&pokemon()), "Grass, Poison");
    }

    #[test]
    fn card_shows_converted_units_stats_and_placeholder_description() {
        let lines = card_lines(&entry(), false);
        assert_eq!(lines[0], "POKÉMON #1");
        assert_eq!(lines[1], "Bulbasaur");
        assert!(lines.iter().any(|l| l.contains("No description available")));
        assert!(lines.contains(&"Type    Grass, Poison".to_string()));
        assert!(lines.contains(&"Height  0.7 m".to_string()));
        assert!(lines.contains(&"Weight  6.9 kg".to_string()));
        assert!(lines.contains(&"HP      45".to_string()));
        assert!(lines.contains(&"Attack  49".to_string()));
        assert!(lines.last().unwrap().contains("CATCH"));
    }

    #[test]
    fn card_label_flips_when_caught() {
        let free = card_lines(&entry(), false);
        let caught = card_lines(&entry(), true);
        assert!(free.last().unwrap().contains("[c] CATCH"));
        assert!(caught.last().unwrap().contains("[c] RELEASE"));
    }

    #[test]
    fn modal_appends_height_and_weight_as_stat_rows() {
        let lines = modal_lines(&entry(), true);
        let stats_at = lines.iter().position(|l| l == "Base Stats").unwrap();
        let section: Vec<&String> = lines[stats_at + 1..stats_at + 6].iter().collect();
        assert!(section[2].contains("Special Attack"));
        assert!(section[3].contains("Height") && section[3].contains("0.7 m"));
        assert!(section[4].contains("Weight") && section[4].contains("6.9 kg"));
        assert!(lines.last().unwrap().contains("RELEASE POKÉMON"));
    }

    #[test]
    fn modal_caps_moves_at_ten_and_spaces_hyphens() {
        let mut p = pokemon();
        p.moves = (0..15)
            .map(|i| MoveSlot {
                action: Named {
                    name: format!("move-{i}"),
                },
            })
            .collect();
        let lines = modal_lines(
            &SessionEntry {
                pokemon: p,
                species: None,
            },
            false,
        );
        let moves_at = lines.iter().position(|l| l == "Sample Moves").unwrap();
        let shown: Vec<&String> = lines[moves_at + 1..]
            .iter()
            .take_while(|l| l.starts_with("  "))
            .collect();
        assert_eq!(shown.len(), 10);
        assert_eq!(shown[0], "  move 0");
    }

    #[test]
    fn caught_rows_render_id_and_formatted_name() {
        let row = caught_line(&CaughtEntry {
            id: 122,
            name: "mr-mime".to_string(),
            image: None,
        });
        assert_eq!(row, "#122 Mr Mime");
    }
}
