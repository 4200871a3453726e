//! VoxReel CLI: align narration, plan and render captioned videos.
//!
//! Usage:
//!   voxreel init <NAME>            Create a new composition
//!   voxreel validate <PATH>        Validate a composition file
//!   voxreel info <PATH>            Show composition information
//!   voxreel align <PATH>           Align the script against the narration
//!   voxreel plan <PATH>            Build and save a render plan
//!   voxreel captions <PATH>        Export captions as SRT or VTT
//!   voxreel render <PATH>          Render a composition to video
//!   voxreel check                  Check external tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use voxreel_common::config::AppConfig;
use voxreel_common::context::CancelFlag;

mod commands;

#[derive(Parser)]
#[command(
    name = "voxreel",
    about = "Narration-driven video assembly with burned-in captions",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/voxreel/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new composition file
    Init {
        /// Composition name
        name: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Frame width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Frame height
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Output framerate
        #[arg(long, default_value = "30")]
        fps: u32,
    },

    /// Validate a composition file
    Validate {
        /// Path to composition.json
        path: PathBuf,
    },

    /// Show composition information
    Info {
        /// Path to composition.json
        path: PathBuf,
    },

    /// Align the composition script against its narration
    Align {
        /// Path to composition.json
        path: PathBuf,

        /// Write aligned words as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write word-level subtitles (.srt or .vtt)
        #[arg(long)]
        subtitles: Option<PathBuf>,
    },

    /// Build a render plan without rendering
    Plan {
        /// Path to composition.json
        path: PathBuf,

        /// Plan output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export caption timings as subtitles
    Captions {
        /// Path to composition.json
        path: PathBuf,

        /// Subtitle file (.srt or .vtt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a composition to video
    Render {
        /// Path to composition.json
        path: PathBuf,

        /// Output video path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Submit to the configured remote render service instead
        #[arg(long)]
        remote: bool,

        /// Maximum parallel segment workers
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Check that external tools are available
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    voxreel_common::logging::init_logging(&config.logging);

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling run");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Init {
            name,
            output,
            width,
            height,
            fps,
        } => commands::init::run(name, output, width, height, fps),
        Commands::Validate { path } => commands::validate::run(path),
        Commands::Info { path } => commands::info::run(path),
        Commands::Align {
            path,
            output,
            subtitles,
        } => commands::align::run(path, output, subtitles, &config, cancel).await,
        Commands::Plan { path, output } => commands::plan::run(path, output, &config, cancel).await,
        Commands::Captions { path, output } => {
            commands::captions::run(path, output, &config, cancel).await
        }
        Commands::Render {
            path,
            output,
            remote,
            workers,
        } => {
            if let Some(workers) = workers {
                config.render.max_workers = workers.max(1);
            }
            commands::render::run(path, output, remote, &config, cancel).await
        }
        Commands::Check => commands::check::run(&config),
    }
}
