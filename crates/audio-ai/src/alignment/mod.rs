//! Script-to-audio alignment with a three-tier fallback chain.
//!
//! 1. **Remote:** an HTTP forced-alignment service.
//! 2. **Local:** an alignment tool run as a subprocess.
//! 3. **Uniform:** words spread evenly over the audio. Never fails.
//!
//! Tiers run strictly in order and each external call carries its own
//! timeout. A failed tier is logged, recorded in [`Alignment::degraded`],
//! and the next tier is tried. The only fatal condition is an empty script,
//! which is rejected before any tier runs.

pub mod local;
pub mod preprocess;
pub mod remote;
pub mod uniform;

use std::path::Path;

use serde::{Deserialize, Serialize};
use voxreel_common::config::AlignmentSettings;
use voxreel_common::context::CancelFlag;
use voxreel_common::error::{Notice, VoxreelError};
use voxreel_project_model::word::Word;

pub use local::LocalAligner;
pub use preprocess::{preprocess_script, script_words};
pub use remote::RemoteAligner;
pub use uniform::uniform_words;

/// Which tier produced an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentTier {
    Remote,
    Local,
    Uniform,
}

impl std::fmt::Display for AlignmentTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AlignmentTier::Remote => "remote",
            AlignmentTier::Local => "local",
            AlignmentTier::Uniform => "uniform",
        };
        f.write_str(name)
    }
}

/// Why a tier did not produce words.
#[derive(Debug, thiserror::Error)]
pub enum TierError {
    #[error("tier not configured: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no words returned")]
    EmptyResult,

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("cancelled")]
    Cancelled,

    #[error("tool exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A tier that was tried and failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierFailure {
    pub tier: AlignmentTier,
    pub reason: String,
}

impl TierFailure {
    pub fn to_notice(&self) -> Notice {
        Notice::AlignmentDegraded {
            tier: self.tier.to_string(),
            reason: self.reason.clone(),
        }
    }
}

/// Word timings plus how they were obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alignment {
    /// Words in script order. Never empty.
    pub words: Vec<Word>,
    /// Tier that produced `words`.
    pub tier: AlignmentTier,
    /// Tiers tried before `tier`, in order.
    pub degraded: Vec<TierFailure>,
    /// Narration length, when it could be measured.
    pub audio_duration: Option<f64>,
}

impl Alignment {
    pub fn is_degraded(&self) -> bool {
        self.tier != AlignmentTier::Remote
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.degraded.iter().map(TierFailure::to_notice).collect()
    }
}

/// Fatal alignment errors.
#[derive(Debug, thiserror::Error)]
pub enum AlignmentError {
    #[error("script is empty")]
    EmptyScript,

    #[error("alignment cancelled")]
    Cancelled,
}

impl From<AlignmentError> for VoxreelError {
    fn from(err: AlignmentError) -> Self {
        match err {
            AlignmentError::EmptyScript => VoxreelError::EmptyScript,
            AlignmentError::Cancelled => VoxreelError::Cancelled,
        }
    }
}

/// Resolves word timings for a script against its narration.
pub struct AlignmentResolver {
    settings: AlignmentSettings,
    cancel: CancelFlag,
}

impl AlignmentResolver {
    pub fn new(settings: AlignmentSettings) -> Self {
        Self {
            settings,
            cancel: CancelFlag::new(),
        }
    }

    /// Abort in-flight tiers (and kill their subprocesses) once `cancel`
    /// is raised.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_defaults() -> Self {
        Self::new(AlignmentSettings::default())
    }

    pub fn settings(&self) -> &AlignmentSettings {
        &self.settings
    }

    /// Resolve word timings, probing the audio duration with ffprobe.
    pub async fn resolve(&self, script: &str, audio: &Path) -> Result<Alignment, AlignmentError> {
        if script.trim().is_empty() {
            return Err(AlignmentError::EmptyScript);
        }
        let duration = crate::probe::probe_duration_with_cancel(
            &self.settings.ffprobe_binary,
            audio,
            &self.cancel,
        )
        .await;
        self.resolve_with_duration(script, audio, duration).await
    }

    /// Resolve word timings with a known (or known-unknown) audio duration.
    pub async fn resolve_with_duration(
        &self,
        script: &str,
        audio: &Path,
        audio_duration: Option<f64>,
    ) -> Result<Alignment, AlignmentError> {
        let text = preprocess_script(script);
        if text.is_empty() {
            return Err(AlignmentError::EmptyScript);
        }

        tracing::info!(
            audio = %audio.display(),
            words = script_words(&text).len(),
            audio_duration = ?audio_duration,
            "Resolving alignment"
        );

        let mut degraded = Vec::new();

        self.check_cancelled()?;
        let remote = self.try_remote(&text, audio).await;
        if matches!(remote, Err(TierError::Cancelled)) {
            return Err(AlignmentError::Cancelled);
        }
        if let Some(words) = settle(AlignmentTier::Remote, remote, &mut degraded) {
            return Ok(Alignment {
                words,
                tier: AlignmentTier::Remote,
                degraded,
                audio_duration,
            });
        }

        self.check_cancelled()?;
        let local = self.try_local(&text, audio, audio_duration).await;
        if matches!(local, Err(TierError::Cancelled)) {
            return Err(AlignmentError::Cancelled);
        }
        if let Some(words) = settle(AlignmentTier::Local, local, &mut degraded) {
            return Ok(Alignment {
                words,
                tier: AlignmentTier::Local,
                degraded,
                audio_duration,
            });
        }

        let words = uniform_words(
            &script_words(&text),
            audio_duration,
            self.settings.fallback_word_secs,
        );
        tracing::info!(
            tier = %AlignmentTier::Uniform,
            words = words.len(),
            "Alignment estimated uniformly"
        );
        Ok(Alignment {
            words,
            tier: AlignmentTier::Uniform,
            degraded,
            audio_duration,
        })
    }

    fn check_cancelled(&self) -> Result<(), AlignmentError> {
        if self.cancel.is_cancelled() {
            tracing::warn!("Alignment cancelled");
            Err(AlignmentError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn try_remote(&self, text: &str, audio: &Path) -> Result<Vec<Word>, TierError> {
        let endpoint = self
            .settings
            .remote_endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| TierError::Unavailable("no remote endpoint".to_string()))?;

        let aligner = RemoteAligner::new(
            endpoint,
            self.settings.remote_api_key.clone(),
            self.settings.language.clone(),
            self.settings.remote_timeout_secs,
        )?;
        let words = tokio::select! {
            words = aligner.align(text, audio) => words?,
            _ = self.cancel.cancelled() => return Err(TierError::Cancelled),
        };
        non_empty(words)
    }

    async fn try_local(
        &self,
        text: &str,
        audio: &Path,
        audio_duration: Option<f64>,
    ) -> Result<Vec<Word>, TierError> {
        let command = self
            .settings
            .local_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| TierError::Unavailable("no local command".to_string()))?;

        let aligner = LocalAligner::new(
            command,
            self.settings.local_args.clone(),
            self.settings.language.clone(),
            self.settings.local_timeout_secs,
            self.settings.long_audio_threshold_secs,
        )
        .with_cancel_flag(self.cancel.clone());
        non_empty(aligner.align(text, audio, audio_duration).await?)
    }
}

/// Log a tier outcome; failures are appended to `degraded`.
fn settle(
    tier: AlignmentTier,
    attempt: Result<Vec<Word>, TierError>,
    degraded: &mut Vec<TierFailure>,
) -> Option<Vec<Word>> {
    match attempt {
        Ok(words) => {
            tracing::info!(tier = %tier, words = words.len(), "Alignment resolved");
            Some(words)
        }
        Err(err) => {
            let reason = err.to_string();
            if matches!(err, TierError::Unavailable(_)) {
                tracing::debug!(tier = %tier, reason = %reason, "Alignment tier skipped");
            } else {
                tracing::warn!(
                    tier = %tier,
                    reason = %reason,
                    "AlignmentDegraded: tier failed, falling back"
                );
            }
            degraded.push(TierFailure { tier, reason });
            None
        }
    }
}

fn non_empty(words: Vec<Word>) -> Result<Vec<Word>, TierError> {
    if words.is_empty() {
        Err(TierError::EmptyResult)
    } else {
        Ok(words)
    }
}

/// Resolve with default settings.
pub async fn resolve(script: &str, audio: &Path) -> Result<Alignment, AlignmentError> {
    AlignmentResolver::with_defaults().resolve(script, audio).await
}
