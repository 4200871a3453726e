//! Create a new composition file.

use std::path::PathBuf;

use voxreel_project_model::{Clip, Composition, FrameGeometry, LoadedComposition};

pub fn run(name: String, output: PathBuf, width: u32, height: u32, fps: u32) -> anyhow::Result<()> {
    let dir = output.join(&name);
    let path = dir.join("composition.json");
    if path.exists() {
        anyhow::bail!("Composition already exists: {}", path.display());
    }
    println!("Creating composition '{}' at {}", name, dir.display());

    let frame = FrameGeometry::new(width, height);
    let mut composition = Composition::new(&name, "narration.wav", frame);
    composition.framerate = fps;
    composition.script = "Replace this with the narration script.".to_string();
    composition.clips = vec![Clip::new(
        1,
        0.0,
        3.0,
        "Replace this with the narration script.",
        Some(PathBuf::from("media/clip1.mp4")),
    )];

    let loaded = LoadedComposition::create(&path, composition)
        .map_err(|e| anyhow::anyhow!("Failed to create composition: {e}"))?;
    std::fs::create_dir_all(dir.join("media"))?;

    println!("Composition created successfully:");
    println!("  File: {}", loaded.path.display());
    println!("  Frame: {}x{} ({:?})", width, height, frame.aspect);
    println!("  FPS: {fps}");
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── composition.json  (clips, script, output settings)");
    println!("  ├── narration.wav     (add your narration here)");
    println!("  └── media/            (clip and cutaway media)");

    Ok(())
}
