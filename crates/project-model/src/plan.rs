//! Render plan: the hand-off to the external compositor.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::frame::{FrameGeometry, Rect};
use crate::segment::Segment;

/// What a draw instruction paints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawKind {
    /// Filled background box.
    Box { color: String, opacity: f64 },
    /// One line of caption text, centered in its geometry.
    Text {
        text: String,
        font_size: f64,
        color: String,
    },
}

/// A time-gated overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawInstruction {
    #[serde(flatten)]
    pub kind: DrawKind,
    pub geometry: Rect,
    /// First visible instant (seconds).
    pub visible_from: f64,
    /// End of visibility (seconds, exclusive).
    pub visible_to: f64,
}

impl DrawInstruction {
    pub fn is_box(&self) -> bool {
        matches!(self.kind, DrawKind::Box { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            DrawKind::Text { text, .. } => Some(text),
            DrawKind::Box { .. } => None,
        }
    }

    pub fn is_visible_at(&self, t: f64) -> bool {
        t >= self.visible_from && t < self.visible_to
    }
}

/// Everything the compositor needs to produce the final video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPlan {
    /// Segments ordered by output start.
    pub segments: Vec<Segment>,
    /// Overlays ordered by first visible instant.
    pub draws: Vec<DrawInstruction>,
    /// Narration track.
    pub audio: PathBuf,
    pub frame: FrameGeometry,
    pub framerate: u32,
}

impl RenderPlan {
    /// Output duration: end of the last segment.
    pub fn duration(&self) -> f64 {
        self.segments.last().map(|s| s.output_end).unwrap_or(0.0)
    }

    /// Number of output frames.
    pub fn total_frames(&self) -> u64 {
        (self.duration() * self.framerate.max(1) as f64).ceil() as u64
    }

    /// Write the plan as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), PlanIoError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| PlanIoError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| PlanIoError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Read a plan previously written with [`RenderPlan::save`].
    pub fn load(path: &Path) -> Result<Self, PlanIoError> {
        let json = std::fs::read_to_string(path).map_err(|e| PlanIoError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| PlanIoError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Errors reading or writing a plan file.
#[derive(Debug, thiserror::Error)]
pub enum PlanIoError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::FillerReason;

    #[test]
    fn test_draw_instruction_serializes_flat_kind() {
        let draw = DrawInstruction {
            kind: DrawKind::Text {
                text: "Hello world".to_string(),
                font_size: 48.0,
                color: "white".to_string(),
            },
            geometry: Rect::new(10.0, 20.0, 300.0, 62.4),
            visible_from: 0.0,
            visible_to: 4.0,
        };
        let json = serde_json::to_value(&draw).unwrap();
        assert_eq!(json["kind"], "text");
        assert_eq!(json["text"], "Hello world");
        assert!(draw.is_visible_at(0.0));
        assert!(!draw.is_visible_at(4.0));
    }

    #[test]
    fn test_plan_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let plan = RenderPlan {
            segments: vec![Segment::filler(0.0, 2.5, FillerReason::TrailingPad)],
            draws: vec![],
            audio: PathBuf::from("narration.wav"),
            frame: FrameGeometry::landscape_hd(),
            framerate: 30,
        };
        plan.save(&path).unwrap();

        let loaded = RenderPlan::load(&path).unwrap();
        assert_eq!(loaded, plan);
        assert_eq!(loaded.total_frames(), 75);
    }
}
