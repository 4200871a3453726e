//! Error types shared across VoxReel crates.

use std::path::PathBuf;

/// Top-level error type for VoxReel operations.
///
/// Only fatal conditions live here. Recoverable conditions (a degraded
/// alignment tier, a missing media file, a clamped speed factor) are
/// reported as [`Notice`]s and never abort a run.
#[derive(Debug, thiserror::Error)]
pub enum VoxreelError {
    #[error("Script is empty; nothing to align")]
    EmptyScript,

    #[error("Composition contains no clips")]
    NoClipsFound,

    #[error("Alignment error: {message}")]
    Alignment { message: String },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Compositor failed ({status}): {diagnostics}")]
    CompositorFailure { status: String, diagnostics: String },

    #[error("Composition error: {message}")]
    Composition { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using VoxreelError.
pub type VoxreelResult<T> = Result<T, VoxreelError>;

impl VoxreelError {
    pub fn alignment(msg: impl Into<String>) -> Self {
        Self::Alignment {
            message: msg.into(),
        }
    }

    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

/// A non-fatal condition absorbed locally with a best-effort substitute.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// An alignment tier failed and the next one was tried.
    AlignmentDegraded { tier: String, reason: String },

    /// A segment's source media was unavailable and became filler.
    MissingMedia {
        sequence: u32,
        media: Option<PathBuf>,
        output_start: f64,
        duration: f64,
    },

    /// A requested speed adjustment was capped.
    SpeedFactorClamped {
        sequence: u32,
        requested: f64,
        applied: f64,
    },

    /// A cutaway window collapsed to nothing after clamping.
    CutawaySkipped { sequence: u32, index: usize },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::AlignmentDegraded { tier, reason } => {
                write!(f, "alignment tier '{tier}' failed: {reason}")
            }
            Notice::MissingMedia {
                sequence,
                media,
                output_start,
                duration,
            } => match media {
                Some(path) => write!(
                    f,
                    "clip {sequence}: media {} unavailable, filler at {output_start:.3}s for {duration:.3}s",
                    path.display()
                ),
                None => write!(
                    f,
                    "clip {sequence}: no media, filler at {output_start:.3}s for {duration:.3}s"
                ),
            },
            Notice::SpeedFactorClamped {
                sequence,
                requested,
                applied,
            } => write!(
                f,
                "clip {sequence}: speed factor {requested:.3} clamped to {applied:.3}"
            ),
            Notice::CutawaySkipped { sequence, index } => {
                write!(f, "clip {sequence}: cutaway #{index} empty after clamping")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compositor_failure_carries_diagnostics_verbatim() {
        let err = VoxreelError::CompositorFailure {
            status: "exit status: 1".to_string(),
            diagnostics: "Invalid data found when processing input".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("exit status: 1"));
        assert!(text.contains("Invalid data found when processing input"));
    }

    #[test]
    fn test_notice_serializes_with_kind_tag() {
        let notice = Notice::SpeedFactorClamped {
            sequence: 2,
            requested: 0.1667,
            applied: 0.8333,
        };
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["kind"], "speed_factor_clamped");
        assert_eq!(json["sequence"], 2);
    }
}
