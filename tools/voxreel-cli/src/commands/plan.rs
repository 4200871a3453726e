//! Build a render plan without rendering.

use std::path::PathBuf;

use voxreel_common::config::AppConfig;
use voxreel_common::context::CancelFlag;
use voxreel_render_engine::build_plan;

use super::load_composition;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    config: &AppConfig,
    cancel: CancelFlag,
) -> anyhow::Result<()> {
    let loaded = load_composition(&path)?;
    println!("Planning composition: {}", loaded.composition.name);

    let planned = build_plan(&loaded.composition, config, &cancel).await?;
    let plan = &planned.plan;

    println!("  Duration: {:.3}s ({} frames)", plan.duration(), plan.total_frames());
    println!("  Segments: {}", plan.segments.len());
    for segment in &plan.segments {
        println!(
            "    {:<22} {:>8.3}s - {:>8.3}s  speed {:.3}",
            segment.label(),
            segment.output_start,
            segment.output_end,
            segment.speed_factor
        );
    }
    println!("  Captions: {}", planned.captions.len());
    println!("  Draw instructions: {}", plan.draws.len());

    if !planned.notices.is_empty() {
        println!("\nNotices:");
        for notice in &planned.notices {
            println!("  - {notice}");
        }
    }

    let output = output.unwrap_or_else(|| loaded.root.join("plan.json"));
    plan.save(&output)
        .map_err(|e| anyhow::anyhow!("Failed to write plan: {e}"))?;
    println!("\nPlan written: {}", output.display());

    Ok(())
}
