//! Voice Settings Resolver Unit Tests
//!
//! Covers:
//! - Loading persisted preferences (each key independently)
//! - Write-through persistence after every mutation
//! - Profile / custom / teaching mode precedence
//! - Subject-aware voice selection
//! - Late voice enumeration
//! - Speech dispatch (disabled gate, preemption, failures)

use std::sync::Arc;

use mockall::Sequence;

use crate::core::voice::resolver::{ENABLED_KEY, PROFILE_KEY, SETTINGS_KEY};
use crate::core::voice::{
    builtin_catalog, KeyValueStore, MemoryStore, VoiceCatalog, VoiceError, VoiceLocale,
    VoiceSettings, VoiceSettingsPatch, VoiceSettingsResolver, CUSTOM_PROFILE_KEY,
    DEFAULT_PROFILE_KEY,
};
use crate::tests::common::*;
use crate::tests::mocks::{fixed_platform, read_only_store, unavailable_store};

fn store_with(entries: &[(&str, &str)]) -> MemoryStore {
    let store = MemoryStore::new();
    for (key, value) in entries {
        store.set(key, value).unwrap();
    }
    store
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_fresh_store_uses_defaults() {
    let resolver = test_resolver();

    assert!(resolver.is_initialized());
    assert_eq!(resolver.selected_profile(), DEFAULT_PROFILE_KEY);
    assert_eq!(resolver.custom_settings(), &VoiceSettings::default());
    assert!(resolver.is_enabled());
    assert_eq!(resolver.effective_settings(), VoiceSettings::new(0.9, 1.1, 0.8));
}

#[test]
fn test_initialize_does_not_write() {
    let store = MemoryStore::new();
    let _resolver = resolver_with(store.clone(), RecordingPlatform::new(mixed_voices()));
    assert!(store.is_empty());
}

#[test]
fn test_initialize_is_idempotent() {
    let store = store_with(&[(PROFILE_KEY, "narrator"), (ENABLED_KEY, "false")]);
    let mut resolver = resolver_with(store, RecordingPlatform::new(mixed_voices()));
    let first = resolver.state().clone();

    resolver.initialize();

    assert_eq!(resolver.state(), &first);
}

#[test]
fn test_loads_persisted_values() {
    let store = store_with(&[
        (PROFILE_KEY, "custom"),
        (SETTINGS_KEY, r#"{"rate":1.5,"pitch":0.7,"volume":0.4}"#),
        (ENABLED_KEY, "false"),
    ]);
    let resolver = resolver_with(store, RecordingPlatform::new(mixed_voices()));

    assert_eq!(resolver.selected_profile(), "custom");
    assert_eq!(resolver.custom_settings(), &VoiceSettings::new(1.5, 0.7, 0.4));
    assert!(!resolver.is_enabled());
}

#[test]
fn test_blank_saved_profile_keeps_default() {
    for raw in ["", "   "] {
        let store = store_with(&[(PROFILE_KEY, raw)]);
        let resolver = resolver_with(store, RecordingPlatform::new(mixed_voices()));

        assert_eq!(resolver.selected_profile(), DEFAULT_PROFILE_KEY, "raw value {raw:?}");
        assert_eq!(resolver.effective_settings(), VoiceSettings::new(0.9, 1.1, 0.8));
    }
}

#[test]
fn test_malformed_settings_keep_other_keys() {
    let store = store_with(&[
        (PROFILE_KEY, "narrator"),
        (SETTINGS_KEY, "{rate: fast"),
        (ENABLED_KEY, "false"),
    ]);
    let resolver = resolver_with(store, RecordingPlatform::new(mixed_voices()));

    assert_eq!(resolver.selected_profile(), "narrator");
    assert_eq!(resolver.custom_settings(), &VoiceSettings::default());
    assert!(!resolver.is_enabled());
}

#[test]
fn test_enabled_only_accepts_literal_true() {
    for (raw, expected) in [("true", true), ("false", false), ("yes", false), ("TRUE", false), ("", false)] {
        let store = store_with(&[(ENABLED_KEY, raw)]);
        let resolver = resolver_with(store, RecordingPlatform::new(mixed_voices()));
        assert_eq!(resolver.is_enabled(), expected, "raw value {raw:?}");
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_every_mutation_writes_all_keys() {
    let store = MemoryStore::new();
    let mut resolver = resolver_with(store.clone(), RecordingPlatform::new(mixed_voices()));

    resolver.toggle_enabled();

    assert_eq!(store.get(PROFILE_KEY).unwrap().as_deref(), Some(DEFAULT_PROFILE_KEY));
    assert_eq!(store.get(ENABLED_KEY).unwrap().as_deref(), Some("false"));
    let json = store.get(SETTINGS_KEY).unwrap().unwrap();
    let saved: VoiceSettings = serde_json::from_str(&json).unwrap();
    assert_eq!(saved, VoiceSettings::default());
}

#[test]
fn test_custom_rate_survives_restart() {
    let store = MemoryStore::new();
    {
        let mut resolver = resolver_with(store.clone(), RecordingPlatform::new(mixed_voices()));
        resolver.select_profile(CUSTOM_PROFILE_KEY);
        resolver.update_custom_settings(&VoiceSettingsPatch::rate(1.3));
    }

    let reloaded = resolver_with(store, RecordingPlatform::new(mixed_voices()));
    assert_eq!(reloaded.selected_profile(), CUSTOM_PROFILE_KEY);
    assert_eq!(reloaded.custom_settings().rate, 1.3);
    assert_eq!(reloaded.effective_settings().rate, 1.3);
}

#[test]
fn test_toggle_twice_restores_and_persists() {
    let store = MemoryStore::new();
    let mut resolver = resolver_with(store.clone(), RecordingPlatform::new(mixed_voices()));

    resolver.toggle_enabled();
    resolver.toggle_enabled();

    assert!(resolver.is_enabled());
    assert_eq!(store.get(ENABLED_KEY).unwrap().as_deref(), Some("true"));
}

#[test]
fn test_reset_custom_settings() {
    let store = MemoryStore::new();
    let mut resolver = resolver_with(store.clone(), RecordingPlatform::new(mixed_voices()));
    resolver.update_custom_settings(&VoiceSettingsPatch::rate(1.7).with_volume(0.2));

    resolver.reset_custom_settings();

    assert_eq!(resolver.custom_settings(), &VoiceSettings::default());
    let saved: VoiceSettings =
        serde_json::from_str(&store.get(SETTINGS_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(saved, VoiceSettings::default());
}

#[test]
fn test_unreadable_store_falls_back_to_defaults() {
    let mut resolver =
        VoiceSettingsResolver::new(unavailable_store(), RecordingPlatform::new(mixed_voices()));
    resolver.initialize();

    assert_eq!(resolver.selected_profile(), DEFAULT_PROFILE_KEY);
    assert!(resolver.is_enabled());
}

#[test]
fn test_failed_writes_keep_memory_state() {
    let mut resolver =
        VoiceSettingsResolver::new(unavailable_store(), RecordingPlatform::new(mixed_voices()));
    resolver.initialize();

    resolver.select_profile("narrator");
    resolver.update_custom_settings(&VoiceSettingsPatch::pitch(1.4));
    resolver.toggle_enabled();

    assert_eq!(resolver.selected_profile(), "narrator");
    assert_eq!(resolver.custom_settings().pitch, 1.4);
    assert!(!resolver.is_enabled());
}

#[test]
fn test_read_only_store_loads_keys_independently() {
    let store = read_only_store(vec![
        (PROFILE_KEY, "young_female"),
        (SETTINGS_KEY, "not json"),
        (ENABLED_KEY, "true"),
    ]);
    let mut resolver = VoiceSettingsResolver::new(store, RecordingPlatform::new(mixed_voices()));
    resolver.initialize();

    assert_eq!(resolver.selected_profile(), "young_female");
    assert_eq!(resolver.custom_settings(), &VoiceSettings::default());
    assert!(resolver.is_enabled());

    resolver.select_profile("narrator");
    assert_eq!(resolver.selected_profile(), "narrator");
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_catalog_profile_ignores_custom_settings() {
    let mut resolver = test_resolver();
    resolver.update_custom_settings(&VoiceSettingsPatch::rate(2.0).with_pitch(0.5));

    resolver.select_profile("teacher_male");

    assert_eq!(resolver.effective_settings(), VoiceSettings::new(0.9, 0.9, 0.85));
    assert_eq!(resolver.active_profile().map(|p| p.name.as_str()), Some("沉稳男老师"));
}

#[test]
fn test_unknown_profile_uses_custom_settings() {
    let mut resolver = test_resolver();
    resolver.select_profile("ghost");
    resolver.update_custom_settings(&VoiceSettingsPatch::rate(1.3));

    assert!(resolver.active_profile().is_none());
    let effective = resolver.effective_settings();
    assert_eq!(effective.rate, 1.3);
    assert_eq!(effective.pitch, VoiceSettings::default().pitch);
    assert_eq!(effective.volume, VoiceSettings::default().volume);
}

#[test]
fn test_custom_key_is_never_a_catalog_profile() {
    let catalog = VoiceCatalog::from_toml_str(
        r#"
        [profiles.custom]
        name = "Shadow"
        description = ""
        gender = "male"
        age_group = "adult"
        settings = { rate = 2.0, pitch = 2.0, volume = 1.0 }
        "#,
    )
    .unwrap();
    let mut resolver = VoiceSettingsResolver::with_catalog(
        MemoryStore::new(),
        RecordingPlatform::new(mixed_voices()),
        Arc::new(catalog),
        VoiceLocale::chinese(),
    );
    resolver.initialize();

    resolver.select_profile(CUSTOM_PROFILE_KEY);

    assert!(resolver.active_profile().is_none());
    assert_eq!(resolver.effective_settings(), VoiceSettings::default());
}

#[test]
fn test_partial_patch_merges_fields() {
    let mut resolver = test_resolver();
    resolver.update_custom_settings(&VoiceSettingsPatch::rate(1.1));
    resolver.update_custom_settings(&VoiceSettingsPatch::volume(0.3));

    assert_eq!(resolver.custom_settings(), &VoiceSettings::new(1.1, 1.0, 0.3));
}

#[test]
fn test_mode_overrides_profile() {
    let mut resolver = test_resolver();
    resolver.select_profile("teacher_male");

    assert_eq!(resolver.settings_for_mode("fast"), VoiceSettings::new(1.2, 1.0, 0.85));
    assert_eq!(resolver.settings_for_mode("deep"), VoiceSettings::new(0.8, 0.95, 0.85));
}

#[test]
fn test_mode_keeps_fields_it_does_not_name() {
    let resolver = test_resolver();
    let practice = resolver.settings_for_mode("practice");

    assert_eq!(practice.rate, 0.9);
    assert_eq!(practice.pitch, 1.1);
    assert_eq!(practice.volume, 0.9);
}

#[test]
fn test_unknown_mode_returns_base_settings() {
    let resolver = test_resolver();
    assert_eq!(resolver.settings_for_mode("nap"), resolver.effective_settings());
}

#[test]
fn test_resolution_does_not_touch_store() {
    let store = MemoryStore::new();
    let resolver = resolver_with(store.clone(), RecordingPlatform::new(mixed_voices()));

    let _ = resolver.effective_settings();
    let _ = resolver.settings_for_mode("fast");
    let _ = resolver.select_voice(Some("math"));

    assert!(store.is_empty());
}

// =============================================================================
// Voice Selection
// =============================================================================

#[test]
fn test_capture_keeps_locale_voices() {
    let resolver = test_resolver();
    let ids: Vec<&str> = resolver.available_voices().iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["zh-f", "zh-m"]);
}

#[test]
fn test_capture_falls_back_to_first_ten() {
    let resolver = resolver_with(MemoryStore::new(), RecordingPlatform::new(english_voices(12)));

    assert_eq!(resolver.available_voices().len(), 10);
    assert_eq!(resolver.select_voice(Some("math")).unwrap().id, "en-0");
}

#[test]
fn test_covered_subject_picks_profile_gender() {
    let mut resolver = test_resolver();

    assert_eq!(resolver.select_voice(Some("chinese")).unwrap().id, "zh-f");

    resolver.select_profile("teacher_male");
    assert_eq!(resolver.select_voice(Some("math")).unwrap().id, "zh-m");
}

#[test]
fn test_uncovered_subject_ignores_gender() {
    let platform = RecordingPlatform::new(vec![
        voice("zh-m", "Chinese male", "zh-CN"),
        voice("zh-f", "Chinese female", "zh-CN"),
    ]);
    let resolver = resolver_with(MemoryStore::new(), platform);

    // teacher_female does not list math
    assert_eq!(resolver.select_voice(Some("math")).unwrap().id, "zh-m");
    assert_eq!(resolver.select_voice(None).unwrap().id, "zh-m");
}

#[test]
fn test_custom_profile_uses_locale_voice() {
    let platform = RecordingPlatform::new(vec![
        voice("en-f", "Samantha female", "en-US"),
        voice("zh-m", "Chinese male", "zh-CN"),
    ]);
    let mut resolver = resolver_with(MemoryStore::new(), platform);
    resolver.select_profile(CUSTOM_PROFILE_KEY);

    assert_eq!(resolver.select_voice(Some("chinese")).unwrap().id, "zh-m");
}

#[test]
fn test_gender_miss_falls_back_to_locale() {
    let platform = RecordingPlatform::new(vec![voice("zh", "Ting-Ting", "zh-CN")]);
    let mut resolver = resolver_with(MemoryStore::new(), platform);
    resolver.select_profile("teacher_male");

    assert_eq!(resolver.select_voice(Some("math")).unwrap().id, "zh");
}

#[test]
fn test_no_voices_means_platform_default() {
    let resolver = resolver_with(MemoryStore::new(), RecordingPlatform::empty());
    assert!(resolver.select_voice(Some("chinese")).is_none());
}

// =============================================================================
// Late Voice Enumeration
// =============================================================================

#[test]
fn test_poll_picks_up_late_voices() {
    let mut resolver = resolver_with(MemoryStore::new(), RecordingPlatform::empty());
    assert!(resolver.available_voices().is_empty());
    assert!(!resolver.poll_voices());

    resolver.platform().publish(mixed_voices());

    assert!(resolver.poll_voices());
    assert_eq!(resolver.available_voices().len(), 2);
    assert!(!resolver.poll_voices());
}

#[test]
fn test_voices_listed_during_subscription_are_captured() {
    let mut resolver = resolver_with(
        MemoryStore::new(),
        RecordingPlatform::publishing_on_subscribe(mixed_voices()),
    );

    assert_eq!(resolver.available_voices().len(), 2);
    assert!(!resolver.poll_voices());
    assert_eq!(resolver.select_voice(Some("chinese")).unwrap().id, "zh-f");
}

#[test]
fn test_no_subscription_when_voices_present() {
    let mut resolver = test_resolver();
    resolver.platform().publish(english_voices(3));

    assert!(!resolver.poll_voices());
    assert_eq!(resolver.available_voices().len(), 2);
}

#[tokio::test]
async fn test_wait_for_voices_recaptures() {
    let mut resolver = resolver_with(MemoryStore::new(), RecordingPlatform::empty());
    resolver.platform().publish(mixed_voices());

    resolver.wait_for_voices().await;

    assert_eq!(resolver.available_voices().len(), 2);
}

#[tokio::test]
async fn test_wait_without_notifier_returns() {
    let mut resolver = resolver_with(
        MemoryStore::new(),
        RecordingPlatform::without_notifications(Vec::new()),
    );

    resolver.wait_for_voices().await;

    assert!(resolver.available_voices().is_empty());
}

// =============================================================================
// Speech
// =============================================================================

#[test]
fn test_speak_uses_effective_settings() {
    let resolver = test_resolver();
    resolver.speak("床前明月光", Some("chinese")).unwrap();

    let utterance = resolver.platform().last_spoken().unwrap();
    assert_eq!(utterance.text, "床前明月光");
    assert_eq!(utterance.lang, "zh-CN");
    assert_eq!(utterance.rate, 0.9);
    assert_eq!(utterance.pitch, 1.1);
    assert_eq!(utterance.volume, 0.8);
    assert_eq!(utterance.voice.unwrap().id, "zh-f");
}

#[test]
fn test_speak_in_mode_applies_override() {
    let resolver = test_resolver();
    resolver.speak_in_mode("快速回答", None, "fast").unwrap();

    let utterance = resolver.platform().last_spoken().unwrap();
    assert_eq!(utterance.rate, 1.2);
    assert_eq!(utterance.pitch, 1.0);
}

#[test]
fn test_speak_cancels_before_each_utterance() {
    let resolver = test_resolver();
    resolver.speak("一", None).unwrap();
    resolver.speak("二", None).unwrap();

    let calls = resolver.platform().calls();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], PlatformCall::Cancel);
    assert!(matches!(&calls[1], PlatformCall::Speak(u) if u.text == "一"));
    assert_eq!(calls[2], PlatformCall::Cancel);
    assert!(matches!(&calls[3], PlatformCall::Speak(u) if u.text == "二"));
}

#[test]
fn test_utterance_ids_are_unique() {
    let resolver = test_resolver();
    resolver.speak("一", None).unwrap();
    resolver.speak("一", None).unwrap();

    let spoken = resolver.platform().spoken();
    assert_ne!(spoken[0].id, spoken[1].id);
}

#[test]
fn test_disabled_speak_is_noop() {
    let mut resolver = test_resolver();
    resolver.toggle_enabled();

    resolver.speak("安静", Some("math")).unwrap();
    resolver.speak_in_mode("安静", Some("math"), "deep").unwrap();

    assert!(resolver.platform().calls().is_empty());
}

#[test]
fn test_dispatch_failure_is_returned() {
    let resolver = test_resolver();
    resolver.platform().fail_next_speak("engine crashed");

    let err = resolver.speak("你好", None).unwrap_err();

    assert!(matches!(err, VoiceError::Dispatch(ref reason) if reason == "engine crashed"));
    assert_eq!(resolver.platform().cancel_count(), 1);
    assert!(resolver.platform().spoken().is_empty());
}

#[test]
fn test_mock_platform_sees_cancel_then_speak() {
    let mut seq = Sequence::new();
    let mut platform = fixed_platform(mixed_voices());
    platform
        .expect_cancel()
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    platform
        .expect_speak()
        .times(1)
        .in_sequence(&mut seq)
        .withf(|u| u.text == "你好" && u.lang == "zh-CN")
        .returning(|_| Ok(()));

    let mut resolver = VoiceSettingsResolver::new(MemoryStore::new(), platform);
    resolver.initialize();
    resolver.speak("你好", None).unwrap();
}

#[test]
fn test_mock_platform_untouched_when_disabled() {
    let mut platform = fixed_platform(mixed_voices());
    platform.expect_cancel().never();
    platform.expect_speak().never();

    let store = store_with(&[(ENABLED_KEY, "false")]);
    let mut resolver = VoiceSettingsResolver::new(store, platform);
    resolver.initialize();

    resolver.speak("你好", Some("math")).unwrap();
}

#[test]
fn test_builtin_catalog_is_shared() {
    let resolver = test_resolver();
    assert_eq!(
        resolver.catalog().profile_keys().count(),
        builtin_catalog().profile_keys().count()
    );
}
