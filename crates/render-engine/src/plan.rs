//! Render plan emission.

use std::path::PathBuf;

use voxreel_project_model::frame::FrameGeometry;
use voxreel_project_model::plan::{DrawInstruction, RenderPlan};
use voxreel_project_model::segment::Segment;

/// Package segments and overlays into a render plan.
///
/// Segments are ordered by output start and draws by first visible
/// instant; both sorts are stable, so ties keep their input order (a
/// caption box stays ahead of its text lines).
pub fn emit(
    mut segments: Vec<Segment>,
    mut draws: Vec<DrawInstruction>,
    audio: impl Into<PathBuf>,
    frame: FrameGeometry,
    framerate: u32,
) -> RenderPlan {
    segments.sort_by(|a, b| a.output_start.total_cmp(&b.output_start));
    draws.sort_by(|a, b| a.visible_from.total_cmp(&b.visible_from));

    RenderPlan {
        segments,
        draws,
        audio: audio.into(),
        frame,
        framerate,
    }
}
