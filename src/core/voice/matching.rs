//! Voice matching heuristics
//!
//! Platforms expose voices by display name and language tag only, so
//! locale and gender are guessed from substrings. Best effort: a platform
//! that names its voices differently simply falls through to the
//! locale-or-first rule.

use serde::{Deserialize, Serialize};

use super::profiles::Gender;
use super::types::VoiceHandle;

const ENGLISH_FEMALE_TOKENS: &[&str] = &["female", "woman"];
const ENGLISH_MALE_TOKENS: &[&str] = &["male", "man"];

/// Upper bound on voices kept when none match the target locale
pub const MAX_FALLBACK_VOICES: usize = 10;

/// Target language the assistant speaks, plus the substrings that reveal it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceLocale {
    /// Tag attached to every utterance
    pub tag: String,
    /// Substrings of a voice language tag that indicate this locale
    pub lang_tokens: Vec<String>,
    /// Substrings of a voice display name that indicate this locale
    pub name_tokens: Vec<String>,
    /// Locale-specific words for "female" found in voice names
    pub female_tokens: Vec<String>,
    /// Locale-specific words for "male" found in voice names
    pub male_tokens: Vec<String>,
}

impl Default for VoiceLocale {
    fn default() -> Self {
        Self::chinese()
    }
}

impl VoiceLocale {
    pub fn chinese() -> Self {
        Self {
            tag: "zh-CN".to_string(),
            lang_tokens: vec!["zh".to_string(), "cmn".to_string()],
            name_tokens: vec!["Chinese".to_string(), "中文".to_string()],
            female_tokens: vec!["女".to_string()],
            male_tokens: vec!["男".to_string()],
        }
    }

    pub fn english() -> Self {
        Self {
            tag: "en-US".to_string(),
            lang_tokens: vec!["en".to_string()],
            name_tokens: vec!["English".to_string()],
            female_tokens: Vec::new(),
            male_tokens: Vec::new(),
        }
    }

    /// Pick a locale from a tag such as "zh-CN" or "en-GB"
    pub fn from_tag(tag: &str) -> Self {
        let lower = tag.to_lowercase();
        let mut locale = if lower.starts_with("en") {
            Self::english()
        } else if lower.starts_with("zh") || lower.starts_with("cmn") {
            Self::chinese()
        } else {
            let primary = lower.split(['-', '_']).next().unwrap_or_default().to_string();
            Self {
                tag: tag.to_string(),
                lang_tokens: vec![primary],
                name_tokens: Vec::new(),
                female_tokens: Vec::new(),
                male_tokens: Vec::new(),
            }
        };
        locale.tag = tag.to_string();
        locale
    }

    /// Whether a voice's language tag or name indicates this locale
    pub fn matches(&self, voice: &VoiceHandle) -> bool {
        let lang = voice.lang.to_lowercase();
        self.lang_tokens.iter().any(|t| lang.contains(&t.to_lowercase()))
            || self.name_tokens.iter().any(|t| voice.name.contains(t.as_str()))
    }

    /// Whether a voice name suggests the given gender
    pub fn matches_gender(&self, voice: &VoiceHandle, gender: Gender) -> bool {
        let name = voice.name.to_lowercase();
        let has_any = |english: &[&str], local: &[String]| {
            english.iter().any(|t| name.contains(t)) || local.iter().any(|t| name.contains(t.as_str()))
        };
        let female = has_any(ENGLISH_FEMALE_TOKENS, &self.female_tokens);
        match gender {
            Gender::Female => female,
            // "female" contains "male"; a female-marked name is never male
            Gender::Male => !female && has_any(ENGLISH_MALE_TOKENS, &self.male_tokens),
            Gender::Neutral => true,
        }
    }

    /// Voices worth offering: the locale's own, or the first few of anything
    pub fn capture(&self, voices: Vec<VoiceHandle>) -> Vec<VoiceHandle> {
        let local: Vec<VoiceHandle> = voices.iter().filter(|v| self.matches(v)).cloned().collect();
        if local.is_empty() {
            voices.into_iter().take(MAX_FALLBACK_VOICES).collect()
        } else {
            local
        }
    }
}
