//! Terminal voice-settings panel and tutor console

pub mod app;
pub mod events;
pub mod theme;
pub mod views;

pub use app::AppState;
pub use events::{AppEvent, Notification, NotificationLevel, Tab};
