//! Speech platform capability
//!
//! Enumerates voices and plays utterances. At most one utterance plays at a
//! time: dispatching while another is in flight is the caller's job to
//! prevent (the resolver cancels first).
//!
//! Backends:
//! - `EspeakPlatform`: espeak-ng (or espeak) CLI, one child process per utterance
//! - `SilentPlatform`: no engine found, logs the text and succeeds

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::types::{Result, Utterance, VoiceError, VoiceHandle};

#[cfg_attr(test, mockall::automock)]
pub trait SpeechPlatform {
    /// Voices available right now (may be empty until the engine is ready)
    fn voices(&self) -> Vec<VoiceHandle>;

    /// Notification fired when the voice list changes. `None` if the
    /// platform's list is fixed once `voices()` has answered.
    fn subscribe_voices_changed(&self) -> Option<watch::Receiver<()>>;

    /// Start playing an utterance. Returns once dispatched, not when done.
    fn speak(&self, utterance: &Utterance) -> Result<()>;

    /// Stop whatever is playing. No-op when idle.
    fn cancel(&self);

    /// Whether an utterance is still playing
    fn is_speaking(&self) -> bool;
}

impl<P: SpeechPlatform + ?Sized> SpeechPlatform for Box<P> {
    fn voices(&self) -> Vec<VoiceHandle> {
        (**self).voices()
    }

    fn subscribe_voices_changed(&self) -> Option<watch::Receiver<()>> {
        (**self).subscribe_voices_changed()
    }

    fn speak(&self, utterance: &Utterance) -> Result<()> {
        (**self).speak(utterance)
    }

    fn cancel(&self) {
        (**self).cancel()
    }

    fn is_speaking(&self) -> bool {
        (**self).is_speaking()
    }
}

// ============================================================================
// espeak-ng
// ============================================================================

const ESPEAK_BASE_WPM: f32 = 175.0;

pub struct EspeakPlatform {
    bin: PathBuf,
    current: Mutex<Option<Child>>,
}

impl EspeakPlatform {
    pub fn new<P: AsRef<Path>>(bin: P) -> Self {
        Self {
            bin: bin.as_ref().to_path_buf(),
            current: Mutex::new(None),
        }
    }

    /// Locate espeak-ng (or legacy espeak): explicit path first, then PATH
    pub fn detect(explicit: Option<&Path>) -> Option<Self> {
        if let Some(path) = explicit {
            if path.exists() {
                return Some(Self::new(path));
            }
            warn!(bin = ?path, "Configured espeak binary not found, searching PATH");
        }
        let bin = which::which("espeak-ng").or_else(|_| which::which("espeak")).ok()?;
        info!(bin = ?bin, "Detected espeak binary");
        Some(Self::new(bin))
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Command-line arguments for an utterance (without the binary)
    pub fn args_for(utterance: &Utterance) -> Vec<String> {
        let voice = utterance
            .voice
            .as_ref()
            .map(|v| v.id.clone())
            .unwrap_or_else(|| utterance.lang.to_lowercase());
        let wpm = (ESPEAK_BASE_WPM * utterance.rate).round().max(80.0) as u32;
        let pitch = (50.0 * utterance.pitch).round().clamp(0.0, 99.0) as u32;
        let amplitude = (100.0 * utterance.volume).round().clamp(0.0, 200.0) as u32;
        vec![
            "-v".to_string(),
            voice,
            "-s".to_string(),
            wpm.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            "--".to_string(),
            utterance.text.clone(),
        ]
    }
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
/// ```
pub fn parse_espeak_voices(listing: &str) -> Vec<VoiceHandle> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let lang = fields[1];
            let gender = match fields[2].rsplit('/').next() {
                Some("F") => " female",
                Some("M") => " male",
                _ => "",
            };
            let name = format!("{}{}", fields[3].replace('_', " "), gender);
            Some(VoiceHandle::new(lang, &name, lang))
        })
        .collect()
}

impl SpeechPlatform for EspeakPlatform {
    fn voices(&self) -> Vec<VoiceHandle> {
        match Command::new(&self.bin).arg("--voices").output() {
            Ok(output) if output.status.success() => {
                parse_espeak_voices(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                warn!(status = ?output.status, "espeak --voices failed");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to run espeak --voices");
                Vec::new()
            }
        }
    }

    fn subscribe_voices_changed(&self) -> Option<watch::Receiver<()>> {
        None
    }

    fn speak(&self, utterance: &Utterance) -> Result<()> {
        let child = Command::new(&self.bin)
            .args(Self::args_for(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VoiceError::Dispatch(format!("espeak spawn failed: {e}")))?;

        debug!(utterance = %utterance.id, pid = child.id(), "Dispatched utterance to espeak");
        let mut current = self
            .current
            .lock()
            .map_err(|e| VoiceError::Dispatch(e.to_string()))?;
        if let Some(mut previous) = current.replace(child) {
            let _ = previous.kill();
            let _ = previous.wait();
        }
        Ok(())
    }

    fn cancel(&self) {
        let Ok(mut current) = self.current.lock() else {
            return;
        };
        if let Some(mut child) = current.take() {
            // Already-exited children report an error here; nothing to stop.
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    fn is_speaking(&self) -> bool {
        let Ok(mut current) = self.current.lock() else {
            return false;
        };
        let status = current.as_mut().map(|child| child.try_wait());
        match status {
            Some(Ok(None)) => true,
            Some(_) => {
                *current = None;
                false
            }
            None => false,
        }
    }
}

impl Drop for EspeakPlatform {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Silent fallback
// ============================================================================

/// Used when no speech engine is installed. Every utterance is logged only.
#[derive(Debug, Default, Clone)]
pub struct SilentPlatform;

impl SpeechPlatform for SilentPlatform {
    fn voices(&self) -> Vec<VoiceHandle> {
        Vec::new()
    }

    fn subscribe_voices_changed(&self) -> Option<watch::Receiver<()>> {
        None
    }

    fn speak(&self, utterance: &Utterance) -> Result<()> {
        info!(
            utterance = %utterance.id,
            lang = %utterance.lang,
            "No speech engine detected. Printing only: {}",
            utterance.text
        );
        Ok(())
    }

    fn cancel(&self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}
