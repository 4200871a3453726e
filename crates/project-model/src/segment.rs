//! Render-time segments: the gapless output timeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tolerance used when comparing segment boundaries.
pub const TIME_EPSILON: f64 = 1e-6;

/// What a segment shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentSource {
    /// A whole clip with no cutaways.
    Clip { sequence: u32, media: PathBuf },

    /// Part of a clip's window not covered by a cutaway.
    ClipRemainder { sequence: u32, media: PathBuf },

    /// An inserted cutaway; `index` is its position within the parent clip.
    Cutaway {
        sequence: u32,
        index: usize,
        media: PathBuf,
    },

    /// Blank frames.
    Filler { reason: FillerReason },
}

/// Why a filler segment exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillerReason {
    /// Gap between the cursor and the next clip's start.
    Gap,
    /// Padding after the last clip up to the target duration.
    TrailingPad,
    /// Stand-in for a clip, remainder, or cutaway whose media is unavailable.
    MissingMedia,
}

/// One entry of the output timeline.
///
/// Output duration is `trim_duration / speed_factor`; a speed factor below
/// 1.0 is slow motion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub source: SegmentSource,
    /// Start of the trim window in source time (seconds).
    pub trim_start: f64,
    /// Length of the trim window in source time (seconds).
    pub trim_duration: f64,
    /// Playback-rate multiplier.
    pub speed_factor: f64,
    /// Start in output time (seconds).
    pub output_start: f64,
    /// End in output time (seconds, exclusive).
    pub output_end: f64,
}

impl Segment {
    /// A filler segment covering `[output_start, output_end)`.
    pub fn filler(output_start: f64, output_end: f64, reason: FillerReason) -> Self {
        Self {
            source: SegmentSource::Filler { reason },
            trim_start: 0.0,
            trim_duration: (output_end - output_start).max(0.0),
            speed_factor: 1.0,
            output_start,
            output_end,
        }
    }

    pub fn output_duration(&self) -> f64 {
        self.output_end - self.output_start
    }

    pub fn is_filler(&self) -> bool {
        matches!(self.source, SegmentSource::Filler { .. })
    }

    /// Source media path, if the segment is not filler.
    pub fn media(&self) -> Option<&Path> {
        match &self.source {
            SegmentSource::Clip { media, .. }
            | SegmentSource::ClipRemainder { media, .. }
            | SegmentSource::Cutaway { media, .. } => Some(media),
            SegmentSource::Filler { .. } => None,
        }
    }

    /// Sequence of the clip this segment belongs to, if any.
    pub fn sequence(&self) -> Option<u32> {
        match &self.source {
            SegmentSource::Clip { sequence, .. }
            | SegmentSource::ClipRemainder { sequence, .. }
            | SegmentSource::Cutaway { sequence, .. } => Some(*sequence),
            SegmentSource::Filler { .. } => None,
        }
    }

    /// Short label for logs and debug reports.
    pub fn label(&self) -> String {
        match &self.source {
            SegmentSource::Clip { sequence, .. } => format!("clip{sequence}"),
            SegmentSource::ClipRemainder { sequence, .. } => format!("clip{sequence}-remainder"),
            SegmentSource::Cutaway { sequence, index, .. } => {
                format!("clip{sequence}-cutaway{index}")
            }
            SegmentSource::Filler { reason } => match reason {
                FillerReason::Gap => "filler-gap".to_string(),
                FillerReason::TrailingPad => "filler-pad".to_string(),
                FillerReason::MissingMedia => "filler-missing".to_string(),
            },
        }
    }

    /// Cut the segment so it ends at `new_end`, shrinking the trim window
    /// proportionally so the speed factor is preserved.
    pub fn truncate_output_end(&mut self, new_end: f64) {
        if new_end >= self.output_end {
            return;
        }
        let new_end = new_end.max(self.output_start);
        self.output_end = new_end;
        self.trim_duration = (new_end - self.output_start) * self.speed_factor;
    }
}

/// A violation of the contiguity invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoverageError {
    #[error("segment list is empty")]
    Empty,

    #[error("first segment starts at {start:.6}, expected 0")]
    NotAnchored { start: f64 },

    #[error("segment {index} has non-positive duration ({start:.6}..{end:.6})")]
    Degenerate { index: usize, start: f64, end: f64 },

    #[error("discontinuity between segments {index} and {next}: {end:.6} != {start:.6}")]
    Discontinuity {
        index: usize,
        next: usize,
        end: f64,
        start: f64,
    },

    #[error("timeline ends at {end:.6}, expected {target:.6}")]
    WrongEnd { end: f64, target: f64 },
}

/// Verify that `segments` are contiguous, non-overlapping, and span
/// `[0, target_duration)` exactly.
pub fn check_coverage(segments: &[Segment], target_duration: f64) -> Result<(), CoverageError> {
    let first = segments.first().ok_or(CoverageError::Empty)?;
    if first.output_start.abs() > TIME_EPSILON {
        return Err(CoverageError::NotAnchored {
            start: first.output_start,
        });
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.output_end - segment.output_start <= 0.0 {
            return Err(CoverageError::Degenerate {
                index,
                start: segment.output_start,
                end: segment.output_end,
            });
        }
    }

    for (index, pair) in segments.windows(2).enumerate() {
        if (pair[0].output_end - pair[1].output_start).abs() > TIME_EPSILON {
            return Err(CoverageError::Discontinuity {
                index,
                next: index + 1,
                end: pair[0].output_end,
                start: pair[1].output_start,
            });
        }
    }

    let end = segments.last().map(|s| s.output_end).unwrap_or(0.0);
    if (end - target_duration).abs() > TIME_EPSILON {
        return Err(CoverageError::WrongEnd {
            end,
            target: target_duration,
        });
    }

    Ok(())
}
