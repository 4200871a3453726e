//! Check external tools.

use voxreel_common::config::{config_file_path, AppConfig};
use voxreel_render_engine::compositor::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("VoxReel System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: defaults ({} not found)", config_path.display());
    }

    let ffmpeg = &config.render.ffmpeg_binary;
    let ffmpeg_ok = command_exists(ffmpeg);
    if ffmpeg_ok {
        println!("[OK] Compositor: {ffmpeg}");
    } else {
        println!("[FAIL] Compositor: {ffmpeg} not found (required for render)");
    }

    let ffprobe = &config.alignment.ffprobe_binary;
    if command_exists(ffprobe) {
        println!("[OK] Probe: {ffprobe}");
    } else {
        println!("[WARN] Probe: {ffprobe} not found (narration length falls back to clip ends)");
    }

    println!();
    println!("Alignment tiers:");
    match &config.alignment.remote_endpoint {
        Some(endpoint) => println!("  [OK] remote: {endpoint}"),
        None => println!("  [SKIP] remote: no endpoint configured"),
    }
    match &config.alignment.local_command {
        Some(command) if command_exists(command) => {
            println!("  [OK] local: {command} {}", config.alignment.local_args.join(" "))
        }
        Some(command) => println!("  [WARN] local: {command} not found"),
        None => println!("  [SKIP] local: no command configured"),
    }
    println!("  [OK] uniform: always available");

    if let Some(url) = &config.render.remote_service_url {
        println!();
        println!("Remote render service: {url}");
    }

    println!();
    if ffmpeg_ok {
        println!("VoxReel is ready.");
    } else {
        println!("Install ffmpeg to render videos. Planning and alignment still work.");
    }

    Ok(())
}
