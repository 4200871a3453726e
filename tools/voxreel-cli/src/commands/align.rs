//! Align the composition script against its narration.

use std::path::PathBuf;

use voxreel_audio_ai::{save_subtitles, AlignmentResolver};
use voxreel_common::config::AppConfig;
use voxreel_common::context::CancelFlag;
use voxreel_common::error::VoxreelError;

use super::load_composition;

pub async fn run(
    path: PathBuf,
    output: Option<PathBuf>,
    subtitles: Option<PathBuf>,
    config: &AppConfig,
    cancel: CancelFlag,
) -> anyhow::Result<()> {
    let loaded = load_composition(&path)?;
    let c = &loaded.composition;
    println!("Aligning narration: {}", c.audio.display());

    let resolver = AlignmentResolver::new(config.alignment.clone()).with_cancel_flag(cancel);
    let alignment = resolver
        .resolve(&c.script, &c.audio)
        .await
        .map_err(VoxreelError::from)?;

    println!("  Tier: {}", alignment.tier);
    match alignment.audio_duration {
        Some(d) => println!("  Narration: {d:.2}s"),
        None => println!("  Narration: length unknown"),
    }
    println!("  Words: {}", alignment.words.len());
    for failure in &alignment.degraded {
        println!("  [WARN] {} tier: {}", failure.tier, failure.reason);
    }

    let output = output.unwrap_or_else(|| loaded.root.join("words.json"));
    std::fs::write(&output, serde_json::to_string_pretty(&alignment)?)?;
    println!("  Alignment written: {}", output.display());

    if let Some(subtitles) = subtitles {
        save_subtitles(&alignment.words, &subtitles)?;
        println!("  Word subtitles written: {}", subtitles.display());
    }

    Ok(())
}
