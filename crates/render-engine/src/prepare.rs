//! Parallel segment preparation.
//!
//! Every segment of a plan is rendered to its own file in the run's
//! scratch directory so the final pass is a plain concatenation. Workers
//! run on a bounded pool and share nothing but read-only inputs; each
//! owns exactly one output path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use voxreel_common::config::RenderSettings;
use voxreel_common::context::RunContext;
use voxreel_common::error::{VoxreelError, VoxreelResult};
use voxreel_project_model::frame::FrameGeometry;
use voxreel_project_model::plan::RenderPlan;
use voxreel_project_model::segment::Segment;

use crate::compositor::run_ffmpeg;
use crate::export::{ProgressCallback, RenderProgress, RenderStage};

/// Scratch path of the prepared file for segment `index`.
pub fn segment_path(ctx: &RunContext, index: usize) -> PathBuf {
    ctx.scratch_path(&format!("segment_{index:04}.mp4"))
}

/// Number of concurrent workers: `min(available_parallelism, max_workers)`.
pub fn worker_count(max_workers: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    available.min(max_workers).max(1)
}

/// ffmpeg arguments that render one segment to `output`.
///
/// Media segments are trimmed, retimed with `setpts`, then scaled and
/// padded to the frame. Filler segments are drawn from a black `color`
/// source. Audio is dropped; the narration is laid under the final pass.
pub fn segment_args(
    segment: &Segment,
    frame: &FrameGeometry,
    framerate: u32,
    output: &Path,
) -> Vec<String> {
    let (w, h) = (frame.width, frame.height);
    let fps = framerate.max(1);
    let duration = format!("{:.6}", segment.output_duration());

    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    match segment.media() {
        Some(media) => {
            let speed = if segment.speed_factor > 0.0 {
                segment.speed_factor
            } else {
                1.0
            };
            args.extend([
                "-ss".to_string(),
                format!("{:.6}", segment.trim_start),
                "-t".to_string(),
                format!("{:.6}", segment.trim_duration),
                "-i".to_string(),
                media.display().to_string(),
                "-vf".to_string(),
                format!(
                    "setpts=PTS/{speed:.6},scale={w}:{h}:force_original_aspect_ratio=decrease,\
                     pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1,fps={fps}"
                ),
            ]);
        }
        None => {
            args.extend([
                "-f".to_string(),
                "lavfi".to_string(),
                "-i".to_string(),
                format!("color=c=black:s={w}x{h}:r={fps}:d={duration}"),
            ]);
        }
    }

    args.extend([
        "-t".to_string(),
        duration,
        "-an".to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        output.display().to_string(),
    ]);
    args
}

/// Render every segment of `plan` into the scratch directory.
///
/// Returns the prepared paths in segment order. The first failure (or a
/// cancellation) aborts the remaining workers, killing their ffmpeg
/// children, and is returned as-is.
pub async fn prepare_segments(
    plan: &RenderPlan,
    ctx: &RunContext,
    settings: &RenderSettings,
    progress: Option<&ProgressCallback>,
) -> VoxreelResult<Vec<PathBuf>> {
    let total = plan.segments.len();
    let workers = worker_count(settings.max_workers);
    tracing::info!(segments = total, workers, "Preparing segments");

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut set = JoinSet::new();

    for (index, segment) in plan.segments.iter().enumerate() {
        let output = segment_path(ctx, index);
        let args = segment_args(segment, &plan.frame, plan.framerate, &output);
        let label = segment.label();
        let semaphore = semaphore.clone();
        let binary = settings.ffmpeg_binary.clone();
        let cancel = ctx.cancel_flag();

        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|e| VoxreelError::render(format!("worker pool closed: {e}")))?;
            if cancel.is_cancelled() {
                return Err(VoxreelError::Cancelled);
            }
            tracing::debug!(index, segment = %label, "Preparing segment");
            run_ffmpeg(&binary, &args, 0, 0.0, &cancel, None).await?;
            Ok((index, output))
        });
    }

    let mut prepared: Vec<Option<PathBuf>> = vec![None; total];
    let mut done = 0usize;

    while let Some(joined) = set.join_next().await {
        let outcome = joined
            .map_err(|e| VoxreelError::render(format!("segment worker failed: {e}")))
            .and_then(|result| result);

        match outcome {
            Ok((index, path)) => {
                prepared[index] = Some(path);
                done += 1;
                if let Some(cb) = progress {
                    cb(RenderProgress {
                        progress: done as f64 / total as f64,
                        frames_rendered: 0,
                        total_frames: plan.total_frames(),
                        eta_secs: 0.0,
                        stage: RenderStage::Preparing,
                    });
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Segment preparation failed; aborting workers");
                set.abort_all();
                while set.join_next().await.is_some() {}
                return Err(err);
            }
        }
    }

    prepared
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| VoxreelError::render("segment worker exited without output"))
}
