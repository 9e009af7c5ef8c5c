//! Panel Event Handling Tests
//!
//! Drives `AppState` with synthetic key events over an in-memory store and
//! the recording platform: tab switching, profile selection, sliders, the
//! enabled toggle, test speech and the tutor round trip.

use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

use crate::core::education::{Tutor, TutorResponse};
use crate::core::voice::resolver::PROFILE_KEY;
use crate::core::voice::{KeyValueStore, MemoryStore, VoiceSettings};
use crate::tests::common::*;
use crate::tui::{AppEvent, AppState, NotificationLevel, Tab};

type TestApp = AppState<MemoryStore, RecordingPlatform>;

fn app_with(store: MemoryStore, platform: RecordingPlatform) -> TestApp {
    let tutor = Tutor::with_seed(7).with_delay(Duration::ZERO);
    AppState::new(resolver_with(store, platform), tutor, Duration::from_millis(50))
}

fn test_app() -> TestApp {
    app_with(MemoryStore::new(), RecordingPlatform::new(mixed_voices()))
}

fn press(app: &mut TestApp, code: KeyCode) {
    app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))));
}

fn type_text(app: &mut TestApp, text: &str) {
    for c in text.chars() {
        press(app, KeyCode::Char(c));
    }
}

fn last_message(app: &TestApp) -> Option<&str> {
    app.notifications.last().map(|n| n.message.as_str())
}

// =============================================================================
// Navigation
// =============================================================================

#[test]
fn test_quit_keys() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('q'));
    assert!(!app.running);

    let mut app = test_app();
    app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(
        KeyCode::Char('c'),
        KeyModifiers::CONTROL,
    ))));
    assert!(!app.running);

    let mut app = test_app();
    app.handle_event(AppEvent::Quit);
    assert!(!app.running);
}

#[test]
fn test_tab_cycles_panels() {
    let mut app = test_app();
    assert_eq!(app.tab, Tab::Profiles);

    press(&mut app, KeyCode::Tab);
    assert_eq!(app.tab, Tab::Custom);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.tab, Tab::Tutor);
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.tab, Tab::Profiles);
}

#[test]
fn test_cursor_starts_on_saved_profile() {
    let store = MemoryStore::new();
    store.set(PROFILE_KEY, "narrator").unwrap();
    let app = app_with(store, RecordingPlatform::new(mixed_voices()));
    assert_eq!(app.voice.profile_idx, 3);

    let store = MemoryStore::new();
    store.set(PROFILE_KEY, "something-else").unwrap();
    let app = app_with(store, RecordingPlatform::new(mixed_voices()));
    assert_eq!(app.voice.profile_idx, 4, "unknown keys land on the custom row");
}

// =============================================================================
// Profiles and Sliders
// =============================================================================

#[test]
fn test_enter_selects_profile_under_cursor() {
    let store = MemoryStore::new();
    let mut app = app_with(store.clone(), RecordingPlatform::new(mixed_voices()));

    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.resolver().selected_profile(), "teacher_male");
    assert_eq!(store.get(PROFILE_KEY).unwrap().as_deref(), Some("teacher_male"));
    assert_eq!(last_message(&app), Some("已选择：沉稳男老师"));
}

#[test]
fn test_cursor_stops_at_custom_row() {
    let mut app = test_app();
    for _ in 0..10 {
        press(&mut app, KeyCode::Char('j'));
    }
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.resolver().selected_profile(), "custom");
    assert!(app.resolver().active_profile().is_none());
}

#[test]
fn test_slider_adjusts_custom_settings() {
    let mut app = test_app();
    press(&mut app, KeyCode::Tab);

    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Left);

    let custom = app.resolver().custom_settings();
    assert!((custom.rate - 1.0).abs() < 1e-5);
    assert_eq!(custom.pitch, 1.0);
    assert!((custom.volume - 0.7).abs() < 1e-5);
}

#[test]
fn test_slider_clamps_at_range_edge() {
    let mut app = test_app();
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Down);
    press(&mut app, KeyCode::Down);

    for _ in 0..5 {
        press(&mut app, KeyCode::Right);
    }

    assert_eq!(app.resolver().custom_settings().volume, 1.0);
}

#[test]
fn test_enter_on_custom_tab_activates_sliders() {
    let mut app = test_app();
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.resolver().selected_profile(), "custom");
    assert!((app.resolver().effective_settings().rate - 1.0).abs() < 1e-5);
}

#[test]
fn test_reset_key_restores_defaults() {
    let mut app = test_app();
    press(&mut app, KeyCode::Tab);
    press(&mut app, KeyCode::Right);
    press(&mut app, KeyCode::Char('r'));

    assert_eq!(app.resolver().custom_settings(), &VoiceSettings::default());
}

// =============================================================================
// Enabled Toggle and Test Speech
// =============================================================================

#[test]
fn test_toggle_disables_and_cancels() {
    let mut app = test_app();

    press(&mut app, KeyCode::Char('e'));

    assert!(!app.resolver().is_enabled());
    assert_eq!(app.resolver().platform().cancel_count(), 1);
    assert_eq!(last_message(&app), Some("语音已关闭"));

    press(&mut app, KeyCode::Char('e'));
    assert!(app.resolver().is_enabled());
    assert_eq!(app.resolver().platform().cancel_count(), 1);
}

#[test]
fn test_test_speech_uses_edited_text() {
    let mut app = test_app();

    press(&mut app, KeyCode::Char('i'));
    app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(
        KeyCode::Char('u'),
        KeyModifiers::CONTROL,
    ))));
    type_text(&mut app, "qet");
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Esc);
    assert!(app.running, "q while editing is text, not quit");
    assert!(app.resolver().is_enabled(), "e while editing is text, not toggle");

    press(&mut app, KeyCode::Char('t'));

    let spoken = app.resolver().platform().last_spoken().unwrap();
    assert_eq!(spoken.text, "qe");
}

#[test]
fn test_test_speech_warns_when_disabled() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('e'));

    press(&mut app, KeyCode::Char('t'));

    assert!(app.resolver().platform().spoken().is_empty());
    let last = app.notifications.last().unwrap();
    assert_eq!(last.level, NotificationLevel::Warning);
}

#[test]
fn test_test_speech_failure_notifies() {
    let mut app = test_app();
    app.resolver().platform().fail_next_speak("no audio device");

    press(&mut app, KeyCode::Char('t'));

    let last = app.notifications.last().unwrap();
    assert_eq!(last.level, NotificationLevel::Error);
    assert!(last.message.contains("no audio device"));
}

// =============================================================================
// Notifications and Ticks
// =============================================================================

#[test]
fn test_notifications_dedupe_and_cap() {
    let mut app = test_app();
    app.push_notification("a".to_string(), NotificationLevel::Info);
    app.push_notification("a".to_string(), NotificationLevel::Info);
    assert_eq!(app.notifications.len(), 1);

    for msg in ["b", "c", "d"] {
        app.push_notification(msg.to_string(), NotificationLevel::Info);
    }
    let messages: Vec<&str> = app.notifications.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, ["b", "c", "d"]);
}

#[test]
fn test_notifications_expire_on_tick() {
    let mut app = test_app();
    app.push_notification("short".to_string(), NotificationLevel::Info);

    for _ in 0..60 {
        app.handle_event(AppEvent::Tick);
    }

    assert!(app.notifications.is_empty());
}

#[test]
fn test_tick_reports_late_voices() {
    let mut app = app_with(MemoryStore::new(), RecordingPlatform::empty());
    app.handle_event(AppEvent::Tick);
    assert!(app.notifications.is_empty());

    app.resolver().platform().publish(mixed_voices());
    app.handle_event(AppEvent::Tick);

    assert_eq!(app.resolver().available_voices().len(), 2);
    assert_eq!(last_message(&app), Some("检测到 2 个系统语音"));
}

// =============================================================================
// Tutor
// =============================================================================

#[test]
fn test_answer_event_is_spoken_with_subject_voice() {
    let mut app = test_app();
    app.tutor.pending = true;

    app.handle_event(AppEvent::TutorAnswer {
        subject_id: "chinese".to_string(),
        response: TutorResponse {
            answer: "静夜思是李白的作品".to_string(),
            explanation: String::new(),
            related_topics: Vec::new(),
            next_steps: Vec::new(),
            confidence: 0.9,
        },
    });

    assert!(!app.tutor.pending);
    let spoken = app.resolver().platform().last_spoken().unwrap();
    assert_eq!(spoken.text, "静夜思是李白的作品");
    assert_eq!(spoken.voice.unwrap().id, "zh-f");
}

#[tokio::test]
async fn test_tutor_round_trip() {
    let mut app = test_app();
    app.tab = Tab::Tutor;

    press(&mut app, KeyCode::Enter);
    assert!(app.tutor.pending);

    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(5)).await;
        app.drain_events();
        if !app.tutor.pending {
            break;
        }
    }

    assert!(!app.tutor.pending);
    let response = app.tutor.last_response.clone().unwrap();
    let spoken = app.resolver().platform().last_spoken().unwrap();
    assert_eq!(spoken.text, response.answer);
}
