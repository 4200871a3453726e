//! Show composition information.

use std::path::PathBuf;

use super::load_composition;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let loaded = load_composition(&path)?;
    let c = &loaded.composition;

    println!("Composition: {}", c.name);
    println!("  Created: {}", c.created_at);
    println!("  Root: {}", loaded.root.display());
    println!();

    println!("Output:");
    println!(
        "  Frame: {}x{} ({:?}) @ {}fps",
        c.frame.width, c.frame.height, c.frame.aspect, c.framerate
    );
    match c.target_duration {
        Some(target) => println!("  Target duration: {target:.2}s"),
        None => println!("  Target duration: narration length"),
    }
    if let Some(font_size) = c.font_size {
        println!("  Caption font size: {font_size}");
    }
    println!();

    println!("Narration:");
    println!("  Audio: {}", c.audio.display());
    println!("  Script words: {}", c.script.split_whitespace().count());
    println!();

    let mut clips: Vec<_> = c.clips.iter().collect();
    clips.sort_by_key(|clip| clip.sequence);
    println!("Clips ({}):", clips.len());
    for clip in clips {
        println!(
            "  #{} {:>7.2}s - {:>7.2}s  {:?}",
            clip.sequence, clip.start, clip.end, clip.text
        );
        if let Some(media) = &clip.source_media {
            println!("      media: {}", media.display());
        }
        for cutaway in &clip.cutaways {
            println!(
                "      cutaway {:.2}s - {:.2}s {}",
                cutaway.start,
                cutaway.end,
                cutaway
                    .source_media
                    .as_ref()
                    .map(|m| m.display().to_string())
                    .unwrap_or_else(|| "(no media)".to_string())
            );
        }
    }

    Ok(())
}
