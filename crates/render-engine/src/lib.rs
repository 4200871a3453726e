//! VoxReel Render Engine
//!
//! Turns a synthesized timeline into a render plan and hands it to ffmpeg.
//!
//! # Pipeline Architecture
//!
//! ```text
//! segments ──┐
//!            ├── emit ── RenderPlan ──┬── prepare (bounded pool)
//! draws ─────┘                        │     segment_0000.mp4 ...
//!                                     │            │
//!                                     │            ▼
//! narration.wav ──────────────────────┴── concat + drawbox/drawtext
//!                                                  │
//!                                                  ▼
//!                                        output.mp4 + output.mp4.plan.json
//! ```
//!
//! A composition can also be handed to a remote render service through
//! [`remote::RemoteRenderClient`].

pub mod compositor;
pub mod error;
pub mod export;
pub mod plan;
pub mod prepare;
pub mod remote;

pub use error::RenderError;
pub use export::*;
pub use plan::emit;
pub use remote::{JobPayload, JobStatus, RemoteRenderClient};
