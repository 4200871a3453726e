//! Subtitle generation in SRT and VTT formats.

use voxreel_common::error::VoxreelResult;
use voxreel_project_model::caption::CaptionEntry;
use voxreel_project_model::word::Word;

/// Anything with a text and a time window.
pub trait SubtitleCue {
    fn cue_start(&self) -> f64;
    fn cue_end(&self) -> f64;
    fn cue_text(&self) -> &str;
}

impl SubtitleCue for CaptionEntry {
    fn cue_start(&self) -> f64 {
        self.start
    }
    fn cue_end(&self) -> f64 {
        self.end
    }
    fn cue_text(&self) -> &str {
        &self.text
    }
}

impl SubtitleCue for Word {
    fn cue_start(&self) -> f64 {
        self.start
    }
    fn cue_end(&self) -> f64 {
        self.end
    }
    fn cue_text(&self) -> &str {
        &self.text
    }
}

/// Generate SRT subtitle content.
pub fn generate_srt<C: SubtitleCue>(cues: &[C]) -> String {
    let mut output = String::new();

    for (i, cue) in cues.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(cue.cue_start()),
            format_srt_time(cue.cue_end()),
        ));
        output.push_str(cue.cue_text());
        output.push_str("\n\n");
    }

    output
}

/// Generate WebVTT subtitle content.
pub fn generate_vtt<C: SubtitleCue>(cues: &[C]) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for cue in cues {
        output.push_str(&format!(
            "{} --> {}\n",
            format_vtt_time(cue.cue_start()),
            format_vtt_time(cue.cue_end()),
        ));
        output.push_str(cue.cue_text());
        output.push_str("\n\n");
    }

    output
}

fn split_millis(secs: f64) -> (u64, u64, u64, u64) {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    (hours, minutes, seconds, millis)
}

/// Format seconds as SRT timestamp: HH:MM:SS,mmm
fn format_srt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Format seconds as VTT timestamp: HH:MM:SS.mmm
fn format_vtt_time(secs: f64) -> String {
    let (hours, minutes, seconds, millis) = split_millis(secs);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

/// Save subtitles to a file; `.vtt` selects WebVTT, anything else SRT.
pub fn save_subtitles<C: SubtitleCue>(cues: &[C], path: &std::path::Path) -> VoxreelResult<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("vtt") => generate_vtt(cues),
        _ => generate_srt(cues),
    };
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), cues = cues.len(), "Subtitles written");
    Ok(())
}
