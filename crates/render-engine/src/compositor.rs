//! ffmpeg compositor hand-off.
//!
//! The final pass concatenates the prepared segment files with the concat
//! demuxer, lays the narration under them, and burns in the caption
//! overlays as a chain of `drawbox`/`drawtext` filters, each gated by
//! `enable='between(t,from,to)'`.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use voxreel_common::config::RenderSettings;
use voxreel_common::context::{CancelFlag, RunContext};
use voxreel_common::error::{VoxreelError, VoxreelResult};
use voxreel_project_model::plan::{DrawInstruction, DrawKind, RenderPlan};

use crate::export::{ProgressCallback, RenderProgress, RenderStage};

/// Name of the concat list inside the scratch directory.
pub const CONCAT_LIST_NAME: &str = "segments.txt";

/// A fully built compositor run.
#[derive(Debug, Clone)]
pub struct CompositorInvocation {
    /// Where the concat list must be written before running.
    pub concat_list_path: PathBuf,
    /// Concat demuxer list content.
    pub concat_list: String,
    /// ffmpeg arguments (without the binary).
    pub args: Vec<String>,
    pub total_frames: u64,
    pub duration_secs: f64,
}

/// Build the concat list and ffmpeg arguments for the final pass.
pub fn build_invocation(
    plan: &RenderPlan,
    prepared_segments: &[PathBuf],
    ctx: &RunContext,
    output: &Path,
    settings: &RenderSettings,
    font_file: Option<&Path>,
) -> VoxreelResult<CompositorInvocation> {
    if prepared_segments.len() != plan.segments.len() {
        return Err(VoxreelError::render(format!(
            "expected {} prepared segments, got {}",
            plan.segments.len(),
            prepared_segments.len()
        )));
    }

    let concat_list_path = ctx.scratch_path(CONCAT_LIST_NAME);
    let duration_secs = plan.duration();
    let filter = overlay_filter(&plan.draws, font_file);

    let mut args = vec![
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-nostats".to_string(),
        "-progress".to_string(),
        "pipe:1".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        concat_list_path.display().to_string(),
        "-i".to_string(),
        plan.audio.display().to_string(),
        "-filter_complex".to_string(),
        filter,
        "-map".to_string(),
        "[vout]".to_string(),
        "-map".to_string(),
        "1:a?".to_string(),
        "-r".to_string(),
        plan.framerate.to_string(),
        "-t".to_string(),
        format!("{duration_secs:.6}"),
    ];
    args.append(&mut codec_args(settings));
    args.push(output.display().to_string());

    Ok(CompositorInvocation {
        concat_list_path,
        concat_list: concat_list(prepared_segments),
        args,
        total_frames: plan.total_frames(),
        duration_secs,
    })
}

/// Write the concat list and run the final pass.
pub async fn run(
    invocation: &CompositorInvocation,
    ffmpeg: &str,
    ctx: &RunContext,
    progress: Option<&ProgressCallback>,
) -> VoxreelResult<()> {
    ctx.check_cancelled()?;
    tokio::fs::write(&invocation.concat_list_path, &invocation.concat_list).await?;
    tracing::info!(
        frames = invocation.total_frames,
        duration_secs = invocation.duration_secs,
        "Compositing final output"
    );
    run_ffmpeg(
        ffmpeg,
        &invocation.args,
        invocation.total_frames,
        invocation.duration_secs,
        &ctx.cancel_flag(),
        progress,
    )
    .await
}

/// Concat demuxer list for `paths`, in order.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("file '{}'\n", p.display().to_string().replace('\'', r"'\''")))
        .collect()
}

/// Caption overlay filter graph from `[0:v]` to `[vout]`.
pub fn overlay_filter(draws: &[DrawInstruction], font_file: Option<&Path>) -> String {
    if draws.is_empty() {
        return "[0:v]null[vout]".to_string();
    }

    let filters: Vec<String> = draws.iter().map(|d| draw_filter(d, font_file)).collect();
    format!("[0:v]{}[vout]", filters.join(","))
}

fn draw_filter(draw: &DrawInstruction, font_file: Option<&Path>) -> String {
    let g = &draw.geometry;
    let enable = format!(
        "enable='between(t,{:.3},{:.3})'",
        draw.visible_from, draw.visible_to
    );

    match &draw.kind {
        DrawKind::Box { color, opacity } => format!(
            "drawbox=x={:.0}:y={:.0}:w={:.0}:h={:.0}:color={}:t=fill:{enable}",
            g.x,
            g.y,
            g.width,
            g.height,
            ffmpeg_color(color, *opacity),
        ),
        DrawKind::Text {
            text,
            font_size,
            color,
        } => {
            let font = font_file
                .map(|f| format!("fontfile='{}':", escape_filter_value(&f.display().to_string())))
                .unwrap_or_default();
            format!(
                "drawtext={font}text='{}':fontsize={:.0}:fontcolor={color}:x={:.0}+({:.0}-text_w)/2:y={:.0}+({:.0}-text_h)/2:{enable}",
                escape_drawtext_value(text),
                font_size,
                g.x,
                g.width,
                g.y,
                g.height,
            )
        }
    }
}

/// `color@opacity` in ffmpeg notation.
pub fn ffmpeg_color(color: &str, opacity: f64) -> String {
    format!("{color}@{:.3}", opacity.clamp(0.0, 1.0))
}

fn escape_filter_value(raw: &str) -> String {
    raw.replace('\\', r"\\")
        .replace(':', r"\:")
        .replace(',', r"\,")
}

fn escape_drawtext_value(raw: &str) -> String {
    // A quote cannot be escaped inside a quoted value; use the typographic one.
    escape_filter_value(&raw.replace('\'', "\u{2019}")).replace('%', r"\%")
}

/// H.264/AAC output arguments.
pub fn codec_args(settings: &RenderSettings) -> Vec<String> {
    let video_bitrate = format!("{}k", settings.video_bitrate_kbps.max(1000));
    let audio_bitrate = format!("{}k", settings.audio_bitrate_kbps.max(64));

    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "medium".to_string(),
        "-profile:v".to_string(),
        "high".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-b:v".to_string(),
        video_bitrate,
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        audio_bitrate,
        "-movflags".to_string(),
        "+faststart".to_string(),
    ]
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    std::process::Command::new("sh")
        .arg("-c")
        .arg(r#"command -v "$1" >/dev/null 2>&1"#)
        .arg("sh")
        .arg(binary)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Resolve once the flag is raised.
/// Run ffmpeg to completion.
///
/// Progress lines from `-progress pipe:1` are turned into
/// [`RenderProgress`] reports; stderr is drained concurrently and returned
/// verbatim in [`VoxreelError::CompositorFailure`] on a non-zero exit. The
/// child is killed as soon as `cancel` is raised.
pub async fn run_ffmpeg(
    binary: &str,
    args: &[String],
    total_frames: u64,
    expected_duration_secs: f64,
    cancel: &CancelFlag,
    progress: Option<&ProgressCallback>,
) -> VoxreelResult<()> {
    tracing::debug!(binary, ?args, "Running ffmpeg");
    let start = Instant::now();
    let mut child = tokio::process::Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| VoxreelError::render(format!("Failed to start {binary}: {e}")))?;

    tracing::debug!(pid = child.id(), args_len = args.len(), total_frames, "ffmpeg process started");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| VoxreelError::render("Failed to capture ffmpeg stdout"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| VoxreelError::render("Failed to capture ffmpeg stderr"))?;

    // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
    let stderr_task = tokio::spawn(async move {
        let mut output = String::new();
        match stderr.read_to_string(&mut output).await {
            Ok(_) => output,
            Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
        }
    });

    let mut lines = BufReader::new(stdout).lines();
    let mut state = ProgressState::default();
    let mut last_progress_secs = 0.0f64;
    let mut last_progress_wall = Instant::now();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = cancel.cancelled() => {
                return abort_child(&mut child, stderr_task).await;
            }
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                return Err(VoxreelError::render(format!(
                    "Failed reading ffmpeg progress: {e}"
                )))
            }
        };

        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        state.update(key, value);
        if key != "progress" {
            continue;
        }

        if state.out_time_secs > last_progress_secs + 0.001 {
            last_progress_secs = state.out_time_secs;
            last_progress_wall = Instant::now();
        }
        if let Some(cb) = progress {
            cb(progress_report(
                &state,
                total_frames,
                expected_duration_secs,
                start.elapsed().as_secs_f64(),
            ));
        }
        if last_progress_wall.elapsed().as_secs() >= 10 {
            tracing::warn!(
                out_time_secs = state.out_time_secs,
                elapsed_secs = start.elapsed().as_secs_f64(),
                "No ffmpeg progress advancement for 10s"
            );
            last_progress_wall = Instant::now();
        }
    }

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = cancel.cancelled() => {
            return abort_child(&mut child, stderr_task).await;
        }
    };

    let diagnostics = stderr_task
        .await
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

    if !status.success() {
        tracing::error!(%status, binary, "ffmpeg exited with failure");
        return Err(VoxreelError::CompositorFailure {
            status: status.to_string(),
            diagnostics,
        });
    }

    tracing::debug!(elapsed_secs = start.elapsed().as_secs_f64(), "ffmpeg finished");
    Ok(())
}

async fn abort_child(
    child: &mut tokio::process::Child,
    stderr_task: tokio::task::JoinHandle<String>,
) -> VoxreelResult<()> {
    tracing::warn!(pid = child.id(), "Cancellation requested; killing ffmpeg");
    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "Failed to kill ffmpeg");
    }
    stderr_task.abort();
    Err(VoxreelError::Cancelled)
}

#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    complete: bool,
}

impl ProgressState {
    fn update(&mut self, key: &str, value: &str) {
        match key {
            // ffmpeg reports microseconds under both names.
            "out_time_ms" | "out_time_us" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
            }
            "progress" => {
                self.complete = value == "end";
            }
            _ => {}
        }
    }
}

fn progress_report(
    state: &ProgressState,
    total_frames: u64,
    expected_duration_secs: f64,
    elapsed_secs: f64,
) -> RenderProgress {
    let progress = if expected_duration_secs <= 0.0 {
        0.0
    } else {
        (state.out_time_secs / expected_duration_secs).clamp(0.0, 1.0)
    };

    let frames_rendered = (progress * total_frames as f64).round() as u64;
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    RenderProgress {
        progress: if state.complete { 1.0 } else { progress },
        frames_rendered,
        total_frames,
        eta_secs,
        stage: if state.complete {
            RenderStage::Finalizing
        } else {
            RenderStage::Compositing
        },
    }
}
