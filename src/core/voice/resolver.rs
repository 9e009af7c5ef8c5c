//! Voice Settings Resolver
//!
//! Decides what the assistant sounds like: which profile is active, how the
//! user's custom sliders and the current teaching mode layer on top of it,
//! and which concrete platform voice to use for a subject.
//!
//! Precedence, lowest to highest:
//! 1. custom settings (used only when the selected key is not a catalog profile)
//! 2. catalog profile settings
//! 3. teaching mode override (`settings_for_mode` only)
//!
//! Every mutation is written through to the key-value store immediately.
//! Store failures are logged and swallowed; in-memory state stays
//! authoritative until the next successful write.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::matching::VoiceLocale;
use super::platform::SpeechPlatform;
use super::presets::{builtin_catalog, CUSTOM_PROFILE_KEY, DEFAULT_PROFILE_KEY};
use super::profiles::{VoiceCatalog, VoiceProfile};
use super::store::KeyValueStore;
use super::types::{Result, Utterance, VoiceHandle, VoiceSettings, VoiceSettingsPatch};

pub const PROFILE_KEY: &str = "voice-profile";
pub const SETTINGS_KEY: &str = "voice-settings";
pub const ENABLED_KEY: &str = "voice-enabled";

/// User-owned state. Everything except `available_voices` is persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverState {
    pub selected_profile: String,
    pub custom_settings: VoiceSettings,
    pub enabled: bool,
    pub available_voices: Vec<VoiceHandle>,
}

impl Default for ResolverState {
    fn default() -> Self {
        Self {
            selected_profile: DEFAULT_PROFILE_KEY.to_string(),
            custom_settings: VoiceSettings::default(),
            enabled: true,
            available_voices: Vec::new(),
        }
    }
}

pub struct VoiceSettingsResolver<S: KeyValueStore, P: SpeechPlatform> {
    store: S,
    platform: P,
    catalog: Arc<VoiceCatalog>,
    locale: VoiceLocale,
    state: ResolverState,
    voices_changed: Option<watch::Receiver<()>>,
    initialized: bool,
}

impl<S: KeyValueStore, P: SpeechPlatform> VoiceSettingsResolver<S, P> {
    /// Resolver over the built-in catalog speaking Chinese
    pub fn new(store: S, platform: P) -> Self {
        Self::with_catalog(store, platform, builtin_catalog(), VoiceLocale::default())
    }

    pub fn with_catalog(store: S, platform: P, catalog: Arc<VoiceCatalog>, locale: VoiceLocale) -> Self {
        Self {
            store,
            platform,
            catalog,
            locale,
            state: ResolverState::default(),
            voices_changed: None,
            initialized: false,
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Load persisted choices and capture the platform's voices.
    ///
    /// Never fails: anything unreadable keeps its default.
    pub fn initialize(&mut self) {
        let mut state = ResolverState::default();

        if let Some(profile) = self.read_key(PROFILE_KEY).filter(|p| !p.trim().is_empty()) {
            state.selected_profile = profile;
        }
        if let Some(raw) = self.read_key(SETTINGS_KEY) {
            match serde_json::from_str::<VoiceSettings>(&raw) {
                Ok(settings) => state.custom_settings = settings,
                Err(e) => warn!(key = SETTINGS_KEY, error = %e, "Malformed voice settings, using defaults"),
            }
        }
        if let Some(raw) = self.read_key(ENABLED_KEY) {
            state.enabled = raw == "true";
        }

        self.state = state;
        self.capture_voices();

        if self.state.available_voices.is_empty() {
            if self.voices_changed.is_none() {
                self.voices_changed = self.platform.subscribe_voices_changed();
            }
            // A receiver treats the value present at subscription as seen,
            // so voices published before this point would never be reported.
            self.capture_voices();
            if self.state.available_voices.is_empty() && self.voices_changed.is_some() {
                debug!("No voices yet, waiting for the platform to report changes");
            }
        }

        self.initialized = true;
        info!(
            profile = %self.state.selected_profile,
            enabled = self.state.enabled,
            voices = self.state.available_voices.len(),
            "Voice settings initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Re-capture voices if the platform reported a change since last call.
    /// Returns true when the list was refreshed. Meant for an event loop tick.
    pub fn poll_voices(&mut self) -> bool {
        let changed = match self.voices_changed.as_mut() {
            Some(rx) => rx.has_changed().unwrap_or(false),
            None => false,
        };
        if changed {
            if let Some(rx) = self.voices_changed.as_mut() {
                rx.mark_unchanged();
            }
            self.capture_voices();
        }
        changed
    }

    /// Wait for the next voices-changed notification and re-capture.
    /// Returns immediately if the platform offers no notification.
    pub async fn wait_for_voices(&mut self) {
        let Some(rx) = self.voices_changed.as_mut() else {
            return;
        };
        if rx.changed().await.is_ok() {
            self.capture_voices();
        } else {
            debug!("Voice change notifier closed");
            self.voices_changed = None;
        }
    }

    fn capture_voices(&mut self) {
        let voices = self.platform.voices();
        self.state.available_voices = self.locale.capture(voices);
        debug!(count = self.state.available_voices.len(), "Captured platform voices");
    }

    // ------------------------------------------------------------------------
    // Mutations (write-through)
    // ------------------------------------------------------------------------

    /// Select a profile by key. Unknown keys are accepted and fall back to
    /// the custom settings.
    pub fn select_profile(&mut self, key: &str) {
        self.state.selected_profile = key.to_string();
        self.persist();
    }

    pub fn update_custom_settings(&mut self, patch: &VoiceSettingsPatch) {
        self.state.custom_settings = self.state.custom_settings.merged(patch);
        self.persist();
    }

    pub fn reset_custom_settings(&mut self) {
        self.update_custom_settings(&VoiceSettingsPatch::from(&VoiceSettings::default()));
    }

    pub fn toggle_enabled(&mut self) {
        self.state.enabled = !self.state.enabled;
        self.persist();
    }

    fn persist(&self) {
        self.write_key(PROFILE_KEY, &self.state.selected_profile);
        match serde_json::to_string(&self.state.custom_settings) {
            Ok(json) => self.write_key(SETTINGS_KEY, &json),
            Err(e) => warn!(key = SETTINGS_KEY, error = %e, "Failed to serialize voice settings"),
        }
        self.write_key(ENABLED_KEY, if self.state.enabled { "true" } else { "false" });
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to load voice setting");
                None
            }
        }
    }

    fn write_key(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "Failed to save voice setting");
        }
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    /// The active catalog profile, if the selected key names one
    pub fn active_profile(&self) -> Option<&VoiceProfile> {
        if self.state.selected_profile == CUSTOM_PROFILE_KEY {
            return None;
        }
        self.catalog.profile(&self.state.selected_profile)
    }

    pub fn effective_settings(&self) -> VoiceSettings {
        match self.active_profile() {
            Some(profile) => profile.settings.clone(),
            None => self.state.custom_settings.clone(),
        }
    }

    /// Effective settings with the teaching mode's override on top
    pub fn settings_for_mode(&self, mode_key: &str) -> VoiceSettings {
        let base = self.effective_settings();
        match self.catalog.mode(mode_key) {
            Some(mode) => base.merged(&mode.voice_settings),
            None => {
                debug!(mode = mode_key, "Unknown teaching mode, using base settings");
                base
            }
        }
    }

    /// Best platform voice for a subject, or `None` for "platform default".
    pub fn select_voice(&self, subject_id: Option<&str>) -> Option<VoiceHandle> {
        let voices = &self.state.available_voices;
        let first = voices.first()?;

        if let (Some(profile), Some(subject)) = (self.active_profile(), subject_id) {
            if profile.covers_subject(subject) {
                if let Some(voice) = voices
                    .iter()
                    .find(|v| self.locale.matches_gender(v, profile.gender))
                {
                    return Some(voice.clone());
                }
            }
        }

        voices
            .iter()
            .find(|v| self.locale.matches(v))
            .or(Some(first))
            .cloned()
    }

    // ------------------------------------------------------------------------
    // Speech
    // ------------------------------------------------------------------------

    /// Speak with the effective settings. Preempts anything already playing.
    pub fn speak(&self, text: &str, subject_id: Option<&str>) -> Result<()> {
        self.dispatch(text, subject_id, self.effective_settings())
    }

    /// Speak with a teaching mode's override applied
    pub fn speak_in_mode(&self, text: &str, subject_id: Option<&str>, mode_key: &str) -> Result<()> {
        self.dispatch(text, subject_id, self.settings_for_mode(mode_key))
    }

    fn dispatch(&self, text: &str, subject_id: Option<&str>, settings: VoiceSettings) -> Result<()> {
        if !self.state.enabled {
            return Ok(());
        }

        self.platform.cancel();
        let voice = self.select_voice(subject_id);
        let utterance = Utterance::new(text, &settings, voice, &self.locale.tag);
        debug!(
            utterance = %utterance.id,
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            rate = utterance.rate,
            "Speaking"
        );
        self.platform.speak(&utterance)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn selected_profile(&self) -> &str {
        &self.state.selected_profile
    }

    pub fn custom_settings(&self) -> &VoiceSettings {
        &self.state.custom_settings
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn available_voices(&self) -> &[VoiceHandle] {
        &self.state.available_voices
    }

    pub fn catalog(&self) -> &VoiceCatalog {
        &self.catalog
    }

    pub fn locale(&self) -> &VoiceLocale {
        &self.locale
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}
