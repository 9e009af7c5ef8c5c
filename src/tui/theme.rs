//! Chalkboard color theme for the tutorvox panel.
//!
//! RGB truecolor throughout. Views pull colors and styles from here
//! rather than using `Color::*` literals inline.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

// ── Palette ─────────────────────────────────────────────────────────────────

/// Board green: focused borders, headings, slider fill.
pub const PRIMARY: Color = Color::Rgb(0x3A, 0x9D, 0x6E);
/// Pale green: profile tags, the topic under the cursor.
pub const PRIMARY_LIGHT: Color = Color::Rgb(0x8F, 0xD1, 0xA8);

/// Chalk yellow: selection, cursor, brand badge.
pub const ACCENT: Color = Color::Rgb(0xF5, 0xD7, 0x6E);

/// Slate background behind badges.
pub const BG_BASE: Color = Color::Rgb(0x1C, 0x26, 0x24);

pub const TEXT: Color = Color::Rgb(0xEE, 0xEE, 0xE8);
pub const TEXT_MUTED: Color = Color::Rgb(0x9A, 0xA3, 0x9F);
pub const TEXT_DIM: Color = Color::Rgb(0x5E, 0x66, 0x63);

// ── Semantic ────────────────────────────────────────────────────────────────

pub const ERROR: Color = Color::Rgb(0xE5, 0x6B, 0x5D);
pub const SUCCESS: Color = Color::Rgb(0x7C, 0xC5, 0x76);
pub const WARNING: Color = Color::Rgb(0xF0, 0xA2, 0x4B);
pub const INFO: Color = Color::Rgb(0x6F, 0xB3, 0xE0);

// ── Style helpers ───────────────────────────────────────────────────────────

/// Section header style.
pub fn heading() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn border_default() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Row under the cursor.
pub fn highlight() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(TEXT_MUTED)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Key hint style (e.g., "q:退出").
pub fn key_hint() -> Style {
    Style::default().fg(PRIMARY_LIGHT)
}

pub fn slider_fill() -> Style {
    Style::default().fg(PRIMARY)
}

/// Voice output on/off indicator.
pub fn toggle(on: bool) -> Style {
    Style::default()
        .fg(if on { SUCCESS } else { ERROR })
        .add_modifier(Modifier::BOLD)
}

/// Status bar brand badge.
pub fn brand_badge() -> Style {
    Style::default()
        .fg(BG_BASE)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Shown while the test text box has the keyboard.
pub fn insert_badge() -> Style {
    Style::default()
        .fg(BG_BASE)
        .bg(PRIMARY_LIGHT)
        .add_modifier(Modifier::BOLD)
}

// ── Block builders ──────────────────────────────────────────────────────────

pub fn block_focused(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_focused())
}

pub fn block_default(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_default())
}
