//! Application configuration.
//!
//! Every tunable constant of the pipeline lives here with its default.
//! The caption geometry numbers in particular are starting points, not
//! load-bearing values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Alignment resolver settings.
    pub alignment: AlignmentSettings,

    /// Timeline synthesis thresholds.
    pub timeline: TimelineSettings,

    /// Caption wrapping and box geometry.
    pub captions: CaptionSettings,

    /// Output and compositor settings.
    pub render: RenderSettings,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "voxreel=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Settings for the three-tier alignment chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentSettings {
    /// Remote forced-alignment endpoint. `None` disables the remote tier.
    pub remote_endpoint: Option<String>,

    /// Optional bearer token sent to the remote endpoint.
    pub remote_api_key: Option<String>,

    /// Timeout for the remote call, in seconds.
    pub remote_timeout_secs: u64,

    /// Language code passed to both the remote service and the local tool.
    pub language: String,

    /// Executable of the local alignment tool. `None` disables the local tier.
    pub local_command: Option<String>,

    /// Arguments placed before `<audio> <text> <profile> <output>`.
    pub local_args: Vec<String>,

    /// Timeout for the local tool, in seconds.
    pub local_timeout_secs: u64,

    /// Audio longer than this uses the long-audio profile.
    pub long_audio_threshold_secs: f64,

    /// Per-word duration used when the audio duration is unknown.
    pub fallback_word_secs: f64,

    /// ffprobe binary used to measure narration length.
    pub ffprobe_binary: String,
}

/// Thresholds for timeline synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Clips shorter than this are slowed down to fill it.
    pub min_clip_duration_secs: f64,

    /// Cutaways longer than this are sped up to fit it.
    pub max_clip_duration_secs: f64,

    /// Upper bound on cutaway slowdown (1.2 = play at most 20% slower).
    pub max_cutaway_slowdown: f64,

    /// Gap left between a truncated caption and its successor.
    pub caption_epsilon_secs: f64,
}

/// Caption wrapping and box geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionSettings {
    /// Default caption font size in pixels.
    pub font_size: f64,

    /// Font size at which `base_chars_per_line` applies.
    pub reference_font_size: f64,

    /// Characters per line at the reference font size.
    pub base_chars_per_line: f64,

    /// Text shorter than this (in characters) is never wrapped.
    pub single_line_max_chars: usize,

    /// Text with fewer words than this is never wrapped.
    pub single_line_max_words: usize,

    /// Share of characters targeted for line one when forcing two lines.
    pub first_line_share: f64,

    /// Average glyph width as a fraction of the font size.
    pub glyph_width_ratio: f64,

    /// Line spacing as a multiple of the font size.
    pub line_spacing_ratio: f64,

    /// Horizontal padding on each side of the text, in pixels.
    pub padding_x: f64,

    /// Total vertical padding of the box, in pixels.
    pub padding_y: f64,

    /// Box width bounds as fractions of the frame width.
    pub min_box_width_ratio: f64,
    pub max_box_width_ratio: f64,

    /// Vertical anchors as fractions of the frame height.
    pub landscape_anchor: f64,
    pub portrait_anchor: f64,
    pub square_anchor: f64,

    /// Colors in ffmpeg notation.
    pub text_color: String,
    pub box_color: String,

    /// Box opacity in `[0.0, 1.0]`.
    pub box_opacity: f64,

    /// Font file handed to the compositor, if any.
    pub font_file: Option<PathBuf>,
}

/// Output and compositor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,

    /// Upper bound on parallel segment workers.
    pub max_workers: usize,

    /// ffmpeg binary.
    pub ffmpeg_binary: String,

    /// Video bitrate in kbps.
    pub video_bitrate_kbps: u32,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Remote render service base URL. `None` keeps rendering local.
    pub remote_service_url: Option<String>,

    /// Interval between remote job status polls, in seconds.
    pub remote_poll_interval_secs: u64,

    /// Give up waiting on a remote job after this many seconds.
    pub remote_timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            remote_endpoint: None,
            remote_api_key: None,
            remote_timeout_secs: 30,
            language: "en".to_string(),
            local_command: Some("python3".to_string()),
            local_args: vec![
                "-m".to_string(),
                "aeneas.tools.execute_task".to_string(),
            ],
            local_timeout_secs: 120,
            long_audio_threshold_secs: 30.0,
            fallback_word_secs: 0.5,
            ffprobe_binary: "ffprobe".to_string(),
        }
    }
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            min_clip_duration_secs: 3.0,
            max_clip_duration_secs: 15.0,
            max_cutaway_slowdown: 1.2,
            caption_epsilon_secs: 0.01,
        }
    }
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            font_size: 48.0,
            reference_font_size: 48.0,
            base_chars_per_line: 32.0,
            single_line_max_chars: 29,
            single_line_max_words: 4,
            first_line_share: 0.6,
            glyph_width_ratio: 0.55,
            line_spacing_ratio: 1.3,
            padding_x: 24.0,
            padding_y: 20.0,
            min_box_width_ratio: 0.15,
            max_box_width_ratio: 0.8,
            landscape_anchor: 0.85,
            portrait_anchor: 0.78,
            square_anchor: 0.82,
            text_color: "white".to_string(),
            box_color: "black".to_string(),
            box_opacity: 0.6,
            font_file: None,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
            max_workers: 4,
            ffmpeg_binary: "ffmpeg".to_string(),
            video_bitrate_kbps: 8000,
            audio_bitrate_kbps: 192,
            remote_service_url: None,
            remote_poll_interval_secs: 5,
            remote_timeout_secs: 1800,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &std::path::Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("voxreel").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{"timeline": {"min_clip_duration_secs": 2.5}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!((config.timeline.min_clip_duration_secs - 2.5).abs() < 1e-9);
        assert!((config.timeline.max_clip_duration_secs - 15.0).abs() < 1e-9);
        assert_eq!(config.render.fps, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = AppConfig::load_from(&path);
        assert_eq!(config.captions.single_line_max_chars, 29);
        assert!((config.alignment.long_audio_threshold_secs - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let config = AppConfig::load_from(std::path::Path::new("/nonexistent/voxreel.json"));
        assert_eq!(config.render.max_workers, 4);
        assert!(config.alignment.remote_endpoint.is_none());
    }
}
