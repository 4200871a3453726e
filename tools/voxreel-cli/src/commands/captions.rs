//! Export caption timings as subtitles.

use std::path::PathBuf;

use voxreel_audio_ai::save_subtitles;
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
    let planned = build_plan(&loaded.composition, config, &cancel).await?;

    let output = output.unwrap_or_else(|| loaded.root.join("captions.srt"));
    save_subtitles(&planned.captions, &output)?;

    println!(
        "Wrote {} caption(s) to {}",
        planned.captions.len(),
        output.display()
    );
    Ok(())
}
