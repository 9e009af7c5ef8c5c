use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::llm::{default_models, LocalModel};
use crate::core::voice::{
    builtin_catalog, EspeakPlatform, SilentPlatform, SpeechPlatform, VoiceCatalog, VoiceLocale,
};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tui: TuiConfig,
    pub data: DataConfig,
    pub voice: VoiceConfig,
    pub tutor: TutorConfig,
    pub local_models: LocalModelsConfig,
}

/// TUI-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Tick interval in milliseconds for the event loop.
    pub tick_rate_ms: u64,
}

/// Data directory configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceEngine {
    /// espeak-ng if installed, otherwise silent
    #[default]
    Auto,
    Espeak,
    Silent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Language tag voices are matched against, e.g. `zh-CN`
    pub locale: String,
    /// Preference file, relative to the data directory
    pub store_file: PathBuf,
    /// Replaces the built-in profiles and modes when set
    pub catalog_path: Option<PathBuf>,
    pub engine: VoiceEngine,
    pub espeak_bin: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub response_delay_ms: u64,
    /// Fixed seed for reproducible answers; random when unset
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelsConfig {
    /// Empty means the built-in list
    pub models: Vec<LocalModel>,
    pub health_timeout_secs: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_rate_ms: 50 }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            locale: "zh-CN".to_string(),
            store_file: PathBuf::from("voice-settings.json"),
            catalog_path: None,
            engine: VoiceEngine::Auto,
            espeak_bin: None,
        }
    }
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            response_delay_ms: 1500,
            seed: None,
        }
    }
}

impl Default for LocalModelsConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            health_timeout_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/tutorvox/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    log::warn!(
                        "Failed to parse config at {}: {e}, using defaults",
                        config_path.display()
                    );
                    Self::default()
                }
            },
            Err(_) => {
                log::debug!("No config file at {}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    /// Resolved data directory (override or XDG default).
    pub fn data_dir(&self) -> PathBuf {
        self.data.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join("tutorvox"))
                .unwrap_or_else(|| PathBuf::from("data"))
        })
    }

    /// Where voice preferences persist
    pub fn store_path(&self) -> PathBuf {
        if self.voice.store_file.is_absolute() {
            self.voice.store_file.clone()
        } else {
            self.data_dir().join(&self.voice.store_file)
        }
    }

    pub fn locale(&self) -> VoiceLocale {
        VoiceLocale::from_tag(&self.voice.locale)
    }

    /// Catalog file if configured and readable, else the built-in one
    pub fn catalog(&self) -> Arc<VoiceCatalog> {
        let Some(path) = self.voice.catalog_path.as_deref() else {
            return builtin_catalog();
        };
        match VoiceCatalog::load(path) {
            Ok(catalog) => {
                log::info!("Loaded voice catalog from {}", path.display());
                Arc::new(catalog)
            }
            Err(e) => {
                log::warn!("Failed to load voice catalog {}: {e}, using built-in", path.display());
                builtin_catalog()
            }
        }
    }

    pub fn speech_platform(&self) -> Box<dyn SpeechPlatform> {
        let bin = self.voice.espeak_bin.as_deref();
        match self.voice.engine {
            VoiceEngine::Auto => crate::core::voice::detect_platform(bin),
            VoiceEngine::Espeak => match EspeakPlatform::detect(bin) {
                Some(espeak) => Box::new(espeak),
                None => {
                    log::warn!("espeak requested but not found, speech disabled");
                    Box::new(SilentPlatform)
                }
            },
            VoiceEngine::Silent => Box::new(SilentPlatform),
        }
    }

    pub fn tutor_delay(&self) -> Duration {
        Duration::from_millis(self.tutor.response_delay_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.local_models.health_timeout_secs)
    }

    pub fn models(&self) -> Vec<LocalModel> {
        if self.local_models.models.is_empty() {
            default_models()
        } else {
            self.local_models.models.clone()
        }
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("tutorvox").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
