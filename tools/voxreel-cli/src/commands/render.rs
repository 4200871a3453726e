//! Render a composition to video.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use voxreel_common::config::AppConfig;
use voxreel_common::context::{CancelFlag, RunContext};
use voxreel_render_engine::{
    render_composition, JobPayload, ProgressCallback, RemoteRenderClient, RenderJob, RenderProgress,
    RenderStage,
};

use super::load_composition;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    remote: bool,
    config: &AppConfig,
    cancel: CancelFlag,
) -> anyhow::Result<()> {
    let loaded = load_composition(&path)?;
    println!("Rendering composition: {}", loaded.composition.name);

    if remote {
        return run_remote(&loaded.composition, config, &cancel).await;
    }

    let output_path = output.unwrap_or_else(|| loaded.root.join("exports").join("output.mp4"));
    println!("  Output: {}", output_path.display());
    println!(
        "  Frame: {}x{} @ {}fps",
        loaded.composition.frame.width, loaded.composition.frame.height, loaded.composition.framerate
    );

    let job = RenderJob {
        composition: loaded.composition,
        output_path: output_path.clone(),
        config: config.clone(),
    };
    let ctx = RunContext::new()?.with_cancel_flag(cancel);

    let progress_cb: ProgressCallback = Arc::new(|p: RenderProgress| {
        let label = match p.stage {
            RenderStage::Planning => "Planning",
            RenderStage::Preparing => "Preparing segments",
            RenderStage::Compositing => "Compositing",
            RenderStage::Finalizing => "Finalizing",
            RenderStage::Complete => "Complete",
        };
        print!(
            "\r  {label}: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    let outcome = render_composition(&job, &ctx, Some(progress_cb)).await;
    println!();
    let outcome = outcome?;

    for notice in &outcome.planned.notices {
        println!("  [WARN] {notice}");
    }
    println!("Render complete: {}", outcome.output_path.display());
    println!("  Plan: {}", outcome.plan_path.display());

    Ok(())
}

async fn run_remote(
    composition: &voxreel_project_model::Composition,
    config: &AppConfig,
    cancel: &CancelFlag,
) -> anyhow::Result<()> {
    let settings = &config.render;
    let Some(url) = settings.remote_service_url.as_deref() else {
        anyhow::bail!("No remote render service configured (render.remote_service_url)");
    };

    let client = RemoteRenderClient::new(url, 60)?;
    let payload = JobPayload::from_composition(composition, settings);
    let job_id = client.submit(&payload).await?;
    println!("  Submitted job {job_id} to {}", client.base_url());

    let output = client
        .wait_for_completion(
            &job_id,
            Duration::from_secs(settings.remote_poll_interval_secs.max(1)),
            Duration::from_secs(settings.remote_timeout_secs),
            cancel,
        )
        .await?;
    println!("Remote render complete: {output}");

    Ok(())
}
