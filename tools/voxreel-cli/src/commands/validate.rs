//! Validate a composition file.

use std::collections::HashSet;
use std::path::PathBuf;

use super::load_composition;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating composition at: {}", path.display());

    let loaded = load_composition(&path)?;
    let c = &loaded.composition;

    println!("  Name: {}", c.name);
    println!("  Version: {}", c.version);
    println!("  Frame: {}x{} @ {}fps", c.frame.width, c.frame.height, c.framerate);
    println!("  Clips: {}", c.clips.len());

    let mut errors = loaded.validate_sources();

    if c.clips.is_empty() {
        errors.push("Composition contains no clips".to_string());
    }
    if c.script.trim().is_empty() {
        errors.push("Script is empty; alignment will fail".to_string());
    }

    let mut seen = HashSet::new();
    for clip in &c.clips {
        if !seen.insert(clip.sequence) {
            errors.push(format!("Duplicate clip sequence {}", clip.sequence));
        }
        if clip.end <= clip.start {
            errors.push(format!(
                "Clip {} has an empty window ({:.3}..{:.3})",
                clip.sequence, clip.start, clip.end
            ));
        }
    }

    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nComposition is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Missing media renders as black filler.",
            errors.len()
        );
    }

    Ok(())
}
