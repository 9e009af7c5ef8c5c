pub mod tutor;
pub mod voice;

use crate::core::education::QuestionRequest;

use super::events::NotificationLevel;

/// What a view did with an input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputResult {
    /// Not for this view; the app may handle it.
    Ignored,
    Consumed,
    Notify(NotificationLevel, String),
    /// Hand a question to the tutor task.
    Ask(QuestionRequest),
}

/// Short, human subject name for profile cards and the tutor list.
pub fn subject_label(id: &str) -> String {
    if let Some(subject) = crate::core::education::find_subject(id) {
        return subject.name.clone();
    }
    match id {
        "programming" => "编程".to_string(),
        "history" => "历史".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{truncated}\u{2026}")
    }
}
