//! VoxReel Audio Intelligence
//!
//! Narration timing:
//! - **Alignment:** word timings from a remote service, a local tool, or a
//!   uniform estimate, tried in that order
//! - **Probing:** narration length via ffprobe
//! - **Subtitle Generation:** SRT/VTT output from captions or words

pub mod alignment;
pub mod probe;
pub mod subtitles;

pub use alignment::{
    resolve, Alignment, AlignmentError, AlignmentResolver, AlignmentTier, TierError, TierFailure,
};
pub use probe::{probe_duration, probe_duration_with_cancel};
pub use subtitles::*;
