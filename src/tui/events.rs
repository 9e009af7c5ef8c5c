use crate::core::education::TutorResponse;

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Periodic tick for the typewriter, notification TTLs and voice polling.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// The tutor finished thinking.
    TutorAnswer {
        subject_id: String,
        response: TutorResponse,
    },
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// Which panel tab is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Profiles,
    Custom,
    Tutor,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Profiles, Tab::Custom, Tab::Tutor];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Profiles => "Profiles",
            Tab::Custom => "Custom",
            Tab::Tutor => "Tutor",
        }
    }

    pub fn next(self) -> Tab {
        let idx = Tab::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Tab::ALL[(idx + 1) % Tab::ALL.len()]
    }

    pub fn prev(self) -> Tab {
        let idx = Tab::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Tab::ALL[(idx + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}
