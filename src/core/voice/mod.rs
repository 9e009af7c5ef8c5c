//! Voice output: profiles, persisted preferences and speech dispatch

pub mod matching;
pub mod platform;
pub mod presets;
pub mod profiles;
pub mod resolver;
pub mod store;
pub mod types;

pub use matching::VoiceLocale;
pub use platform::{EspeakPlatform, SilentPlatform, SpeechPlatform};
pub use presets::{builtin_catalog, CUSTOM_PROFILE_KEY, DEFAULT_PROFILE_KEY};
pub use profiles::{AgeGroup, DetailLevel, Gender, ResponseTime, TeachingMode, VoiceCatalog, VoiceProfile};
pub use resolver::{ResolverState, VoiceSettingsResolver};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use types::{
    Utterance, VoiceError, VoiceHandle, VoiceSettings, VoiceSettingsPatch, PITCH_RANGE, RATE_RANGE,
    VOLUME_RANGE,
};

/// Pick the best available speech backend for this machine
pub fn detect_platform(espeak_bin: Option<&std::path::Path>) -> Box<dyn SpeechPlatform> {
    match EspeakPlatform::detect(espeak_bin) {
        Some(espeak) => Box::new(espeak),
        None => {
            tracing::warn!("No TTS engine detected (espeak-ng missing). Printing only.");
            Box::new(SilentPlatform)
        }
    }
}
