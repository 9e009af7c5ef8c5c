use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Speech dispatch failed: {0}")]
    Dispatch(String),

    #[error("Invalid voice catalog: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VoiceError>;

// ============================================================================
// Slider Ranges
// ============================================================================

/// Inclusive range for a user-adjustable speech parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl ParamRange {
    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    /// Move `value` by `steps` increments and snap to the step grid.
    pub fn nudge(&self, value: f32, steps: i32) -> f32 {
        let raw = value + self.step * steps as f32;
        let snapped = (raw / self.step).round() * self.step;
        self.clamp(snapped)
    }
}

pub const RATE_RANGE: ParamRange = ParamRange { min: 0.5, max: 2.0, step: 0.1 };
pub const PITCH_RANGE: ParamRange = ParamRange { min: 0.5, max: 2.0, step: 0.1 };
pub const VOLUME_RANGE: ParamRange = ParamRange { min: 0.1, max: 1.0, step: 0.1 };

// ============================================================================
// Domain Types
// ============================================================================

/// A concrete synthesis voice as enumerated by the speech platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceHandle {
    /// Platform identifier used when dispatching
    pub id: String,
    /// Display name (what the matching heuristics look at)
    pub name: String,
    /// Language tag, e.g. "zh-CN" or "cmn"
    pub lang: String,
}

impl VoiceHandle {
    pub fn new(id: &str, name: &str, lang: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub rate: f32,   // 0.5 - 2.0
    pub pitch: f32,  // 0.5 - 2.0
    pub volume: f32, // 0.1 - 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceHandle>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            volume: 0.8,
            voice: None,
        }
    }
}

impl VoiceSettings {
    pub const fn new(rate: f32, pitch: f32, volume: f32) -> Self {
        Self {
            rate,
            pitch,
            volume,
            voice: None,
        }
    }

    /// Shallow merge: every field present in `patch` replaces ours.
    pub fn merged(&self, patch: &VoiceSettingsPatch) -> Self {
        Self {
            rate: patch.rate.unwrap_or(self.rate),
            pitch: patch.pitch.unwrap_or(self.pitch),
            volume: patch.volume.unwrap_or(self.volume),
            voice: patch.voice.clone().or_else(|| self.voice.clone()),
        }
    }

    /// Settings forced into the slider ranges.
    pub fn clamped(&self) -> Self {
        Self {
            rate: RATE_RANGE.clamp(self.rate),
            pitch: PITCH_RANGE.clamp(self.pitch),
            volume: VOLUME_RANGE.clamp(self.volume),
            voice: self.voice.clone(),
        }
    }
}

/// Partial settings, as produced by a slider change or a teaching mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceHandle>,
}

impl VoiceSettingsPatch {
    pub fn rate(rate: f32) -> Self {
        Self { rate: Some(rate), ..Default::default() }
    }

    pub fn pitch(pitch: f32) -> Self {
        Self { pitch: Some(pitch), ..Default::default() }
    }

    pub fn volume(volume: f32) -> Self {
        Self { volume: Some(volume), ..Default::default() }
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.pitch.is_none() && self.volume.is_none() && self.voice.is_none()
    }
}

impl From<&VoiceSettings> for VoiceSettingsPatch {
    fn from(settings: &VoiceSettings) -> Self {
        Self {
            rate: Some(settings.rate),
            pitch: Some(settings.pitch),
            volume: Some(settings.volume),
            voice: settings.voice.clone(),
        }
    }
}

/// One discrete request to vocalize a text string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub id: String,
    pub text: String,
    /// `None` means the platform default voice
    pub voice: Option<VoiceHandle>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub lang: String,
}

impl Utterance {
    pub fn new(text: &str, settings: &VoiceSettings, voice: Option<VoiceHandle>, lang: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            voice,
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
            lang: lang.to_string(),
        }
    }
}
