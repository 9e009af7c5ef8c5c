/// Tutorvox - voice-guided education assistant (TUI Edition)
///
/// Core library providing voice profile resolution, speech dispatch,
/// a canned-answer tutor and local model probing.

pub mod config;
pub mod core;
pub mod tui;


pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
