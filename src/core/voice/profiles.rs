//! Voice Profile Catalog
//!
//! Named voice profiles (settings bundles with subject affinities) and
//! teaching modes (partial overrides layered on top of a profile).
//! A catalog is immutable once built.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{Result, VoiceError, VoiceSettings, VoiceSettingsPatch};

// ============================================================================
// Profile Types
// ============================================================================

/// Age group a profile's voice is meant to sound like
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Child,
    Young,
    #[default]
    Adult,
}

impl AgeGroup {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Child => "儿童",
            Self::Young => "年轻",
            Self::Adult => "成人",
        }
    }
}

/// Gender categories for voice profiles
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Neutral,
}

impl Gender {
    /// Get display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Male => "男声",
            Self::Female => "女声",
            Self::Neutral => "中性",
        }
    }
}

/// A named, catalog-defined bundle of voice parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceProfile {
    /// Human-readable name
    pub name: String,
    pub description: String,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub settings: VoiceSettings,
    /// Subject ids this profile is preferred for
    #[serde(default)]
    pub subjects: Vec<String>,
}

impl VoiceProfile {
    pub fn new(name: &str, gender: Gender, age_group: AgeGroup, settings: VoiceSettings) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            gender,
            age_group,
            settings,
            subjects: Vec::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Add preferred subjects
    pub fn with_subjects(mut self, subjects: &[&str]) -> Self {
        self.subjects.extend(subjects.iter().map(|s| s.to_string()));
        self
    }

    pub fn covers_subject(&self, subject_id: &str) -> bool {
        self.subjects.iter().any(|s| s == subject_id)
    }
}

// ============================================================================
// Teaching Modes
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTime {
    Instant,
    #[default]
    Normal,
    Thoughtful,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Brief,
    #[default]
    Standard,
    Detailed,
}

/// How the tutor paces its answers, with a voice override to match
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeachingMode {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub response_time: ResponseTime,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default)]
    pub voice_settings: VoiceSettingsPatch,
}

// ============================================================================
// Catalog
// ============================================================================

/// Static mapping of profile keys and mode keys, in declaration order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceCatalog {
    #[serde(default)]
    pub profiles: IndexMap<String, VoiceProfile>,
    #[serde(default)]
    pub modes: IndexMap<String, TeachingMode>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, key: &str, profile: VoiceProfile) -> Self {
        self.profiles.insert(key.to_string(), profile);
        self
    }

    pub fn with_mode(mut self, key: &str, mode: TeachingMode) -> Self {
        self.modes.insert(key.to_string(), mode);
        self
    }

    pub fn profile(&self, key: &str) -> Option<&VoiceProfile> {
        self.profiles.get(key)
    }

    pub fn mode(&self, key: &str) -> Option<&TeachingMode> {
        self.modes.get(key)
    }

    pub fn profile_keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn mode_keys(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    /// Profiles that list `subject_id` among their subjects
    pub fn profiles_for_subject<'a>(&'a self, subject_id: &'a str) -> impl Iterator<Item = (&'a str, &'a VoiceProfile)> + 'a {
        self.profiles
            .iter()
            .filter(move |(_, p)| p.covers_subject(subject_id))
            .map(|(k, p)| (k.as_str(), p))
    }

    /// Parse a catalog from TOML (`[profiles.<key>]` / `[modes.<key>]` tables)
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| VoiceError::Catalog(e.to_string()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

// ============================================================================
// Tests
// ============================================================================
