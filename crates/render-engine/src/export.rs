//! Render job orchestration.
//!
//! `composition → synthesize → layout → emit → prepare → composite`.
//! The render plan is written next to the output only after the
//! compositor succeeds; a failed or cancelled run leaves neither a plan
//! nor a partial output behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use voxreel_common::config::AppConfig;
use voxreel_common::context::{CancelFlag, RunContext};
use voxreel_common::error::{Notice, VoxreelError, VoxreelResult};
use voxreel_processing_core::layout::CaptionLayout;
use voxreel_processing_core::synthesis::TimelineSynthesizer;
use voxreel_project_model::caption::CaptionEntry;
use voxreel_project_model::composition::Composition;
use voxreel_project_model::plan::RenderPlan;

use crate::compositor::{self, build_invocation, command_exists};
use crate::plan::emit;
use crate::prepare::prepare_segments;

/// Progress callback for rendering. Shared with segment workers.
pub type ProgressCallback = Arc<dyn Fn(RenderProgress) + Send + Sync>;

/// Render progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProgress {
    /// Current progress [0.0, 1.0] within `stage`.
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: RenderStage,
}

/// Stages of a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Planning,
    Preparing,
    Compositing,
    Finalizing,
    Complete,
}

impl RenderProgress {
    fn stage(stage: RenderStage, progress: f64, total_frames: u64) -> Self {
        Self {
            progress,
            frames_rendered: 0,
            total_frames,
            eta_secs: 0.0,
            stage,
        }
    }
}

/// A render job ready to run.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// Composition with media paths already resolved.
    pub composition: Composition,

    /// Output file path.
    pub output_path: PathBuf,

    /// Pipeline configuration.
    pub config: AppConfig,
}

/// A render plan together with the data it was derived from.
#[derive(Debug, Clone)]
pub struct PlannedRender {
    pub plan: RenderPlan,
    /// Overlap-free captions the draws were laid out from.
    pub captions: Vec<CaptionEntry>,
    pub notices: Vec<Notice>,
    /// Output length the timeline was fitted to.
    pub target_duration: f64,
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    pub plan_path: PathBuf,
    pub planned: PlannedRender,
}

/// Where the plan for `output` is written: `<output>.plan.json`.
pub fn plan_path_for(output: &Path) -> PathBuf {
    let mut name: OsString = output.as_os_str().to_owned();
    name.push(".plan.json");
    PathBuf::from(name)
}

/// Output length: the composition's target, else the narration length,
/// else the end of the latest clip.
pub async fn target_duration(composition: &Composition, config: &AppConfig, cancel: &CancelFlag) -> f64 {
    if let Some(target) = composition.target_duration.filter(|t| *t > 0.0) {
        return target;
    }
    if let Some(probed) =
        voxreel_audio_ai::probe_duration_with_cancel(
            &config.alignment.ffprobe_binary,
            &composition.audio,
            cancel,
        )
        .await
    {
        return probed;
    }
    let latest_end = composition
        .clips
        .iter()
        .map(|c| c.end)
        .fold(0.0f64, f64::max);
    tracing::warn!(
        audio = %composition.audio.display(),
        fallback = latest_end,
        "Narration length unknown; fitting timeline to the last clip"
    );
    latest_end
}

/// Build the render plan for a composition without rendering anything.
///
/// Clip and cutaway media that does not exist on disk degrades to filler.
/// Raising `cancel` kills the narration probe and fails with `Cancelled`.
pub async fn build_plan(
    composition: &Composition,
    config: &AppConfig,
    cancel: &CancelFlag,
) -> VoxreelResult<PlannedRender> {
    if composition.clips.is_empty() {
        return Err(VoxreelError::NoClipsFound);
    }

    let target = target_duration(composition, config, cancel).await;
    if cancel.is_cancelled() {
        return Err(VoxreelError::Cancelled);
    }
    let synthesizer = TimelineSynthesizer::new(config.timeline.clone());
    let timeline = synthesizer.synthesize_with(&composition.clips, target, |p| p.exists())?;

    for notice in &timeline.notices {
        tracing::warn!(notice = %notice, "Timeline degraded");
    }

    let font_size = composition.font_size.unwrap_or(config.captions.font_size);
    let draws = CaptionLayout::new(config.captions.clone()).layout(
        &timeline.captions,
        &composition.frame,
        font_size,
    );

    let framerate = if composition.framerate > 0 {
        composition.framerate
    } else {
        config.render.fps
    };

    let plan = emit(
        timeline.segments,
        draws,
        composition.audio.clone(),
        composition.frame,
        framerate,
    );

    tracing::info!(
        segments = plan.segments.len(),
        draws = plan.draws.len(),
        duration_secs = plan.duration(),
        "Render plan built"
    );

    Ok(PlannedRender {
        plan,
        captions: timeline.captions,
        notices: timeline.notices,
        target_duration: target,
    })
}

/// Render a composition to a video file.
///
/// This is the main entry point for rendering.
pub async fn render_composition(
    job: &RenderJob,
    ctx: &RunContext,
    progress: Option<ProgressCallback>,
) -> VoxreelResult<RenderOutcome> {
    tracing::info!(
        run_id = ctx.run_id(),
        output = %job.output_path.display(),
        clips = job.composition.clips.len(),
        "Starting render"
    );

    let ffmpeg = job.config.render.ffmpeg_binary.as_str();
    if !command_exists(ffmpeg) {
        return Err(VoxreelError::unsupported(format!(
            "Compositor not found (expected {ffmpeg} in PATH)"
        )));
    }

    if let Some(cb) = &progress {
        cb(RenderProgress::stage(RenderStage::Planning, 0.0, 0));
    }

    if let Some(parent) = job.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let planned = build_plan(&job.composition, &job.config, &ctx.cancel_flag()).await?;
    ctx.check_cancelled()?;

    if let Err(err) = composite(job, &planned.plan, ctx, progress.as_ref()).await {
        discard_partial_output(&job.output_path);
        return Err(err);
    }

    let plan_path = plan_path_for(&job.output_path);
    planned
        .plan
        .save(&plan_path)
        .map_err(|e| VoxreelError::render(e.to_string()))?;

    if let Some(cb) = &progress {
        let frames = planned.plan.total_frames();
        cb(RenderProgress {
            progress: 1.0,
            frames_rendered: frames,
            total_frames: frames,
            eta_secs: 0.0,
            stage: RenderStage::Complete,
        });
    }

    tracing::info!(
        run_id = ctx.run_id(),
        output = %job.output_path.display(),
        plan = %plan_path.display(),
        elapsed_secs = ctx.elapsed_secs(),
        "Render complete"
    );

    Ok(RenderOutcome {
        output_path: job.output_path.clone(),
        plan_path,
        planned,
    })
}

async fn composite(
    job: &RenderJob,
    plan: &RenderPlan,
    ctx: &RunContext,
    progress: Option<&ProgressCallback>,
) -> VoxreelResult<()> {
    let settings = &job.config.render;
    let prepared = prepare_segments(plan, ctx, settings, progress).await?;
    ctx.check_cancelled()?;

    let invocation = build_invocation(
        plan,
        &prepared,
        ctx,
        &job.output_path,
        settings,
        job.config.captions.font_file.as_deref(),
    )?;
    compositor::run(&invocation, &settings.ffmpeg_binary, ctx, progress).await
}

fn discard_partial_output(output: &Path) {
    if output.exists() {
        match std::fs::remove_file(output) {
            Ok(()) => tracing::debug!(output = %output.display(), "Removed partial output"),
            Err(e) => tracing::warn!(output = %output.display(), error = %e, "Failed to remove partial output"),
        }
    }
}
