//! Local alignment tier: an external forced-alignment tool run as a
//! subprocess.
//!
//! The tool is invoked as `<command> <args..> <audio> <text> <profile> <output>`
//! where `<text>` holds one word per line (word granularity) and `<output>`
//! receives `{"fragments": [{"begin", "end", "lines"}]}`.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use voxreel_common::context::CancelFlag;
use voxreel_project_model::word::Word;

use super::TierError;

/// Subprocess-backed aligner.
pub struct LocalAligner {
    command: String,
    args: Vec<String>,
    language: String,
    timeout: Duration,
    long_audio_threshold_secs: f64,
    cancel: CancelFlag,
}

impl LocalAligner {
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        language: impl Into<String>,
        timeout_secs: u64,
        long_audio_threshold_secs: f64,
    ) -> Self {
        Self {
            command: command.into(),
            args,
            language: language.into(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            long_audio_threshold_secs,
            cancel: CancelFlag::new(),
        }
    }

    /// Kill the tool as soon as `cancel` is raised.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Task profile for the given audio length.
    ///
    /// Long narration uses a rate-based boundary adjustment with a wider
    /// non-speech tolerance; short narration uses percent-centered
    /// boundaries and tighter head/tail detection.
    pub fn task_profile(&self, audio_duration: Option<f64>) -> String {
        let language = tool_language(&self.language);
        let common = format!(
            "task_language={language}|is_text_type=plain|os_task_file_format=json"
        );
        match audio_duration {
            Some(d) if d > self.long_audio_threshold_secs => format!(
                "{common}|task_adjust_boundary_algorithm=rate\
                 |task_adjust_boundary_rate_value=21.000\
                 |task_adjust_boundary_nonspeech_min=0.500\
                 |task_adjust_boundary_nonspeech_string=REMOVE"
            ),
            _ => format!(
                "{common}|task_adjust_boundary_algorithm=percent\
                 |task_adjust_boundary_percent_value=50\
                 |is_audio_file_detect_head_max=0.500\
                 |is_audio_file_detect_tail_max=0.500\
                 |task_adjust_boundary_nonspeech_min=0.200"
            ),
        }
    }

    /// Full argument vector for one run.
    pub fn build_args(&self, audio: &Path, text_file: &Path, profile: &str, output: &Path) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(audio.display().to_string());
        args.push(text_file.display().to_string());
        args.push(profile.to_string());
        args.push(output.display().to_string());
        args
    }

    /// Run the tool and parse its output.
    pub async fn align(
        &self,
        script: &str,
        audio: &Path,
        audio_duration: Option<f64>,
    ) -> Result<Vec<Word>, TierError> {
        let work = tempfile::Builder::new().prefix("voxreel-align-").tempdir()?;
        let text_file = work.path().join("script.txt");
        let output_file = work.path().join("alignment.json");

        let mut lines = script.split_whitespace().collect::<Vec<_>>().join("\n");
        lines.push('\n');
        tokio::fs::write(&text_file, lines).await?;

        let profile = self.task_profile(audio_duration);
        let args = self.build_args(audio, &text_file, &profile, &output_file);
        tracing::debug!(command = %self.command, ?args, "Running local aligner");

        let child = tokio::process::Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the wait future drops the child, which kills it.
        let output = tokio::select! {
            waited = tokio::time::timeout(self.timeout, child.wait_with_output()) => {
                waited.map_err(|_| TierError::Timeout {
                    secs: self.timeout.as_secs(),
                })??
            }
            _ = self.cancel.cancelled() => {
                tracing::warn!(command = %self.command, "Cancellation requested; killing local aligner");
                return Err(TierError::Cancelled);
            }
        };

        if !output.status.success() {
            return Err(TierError::ExitStatus {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let json = read_output(&output_file).await?;
        parse_fragments(&json)
    }
}

async fn read_output(path: &Path) -> Result<String, TierError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TierError::Malformed(format!("no output at {}: {e}", path.display())))
}

/// Map common two-letter codes to the three-letter codes the tool expects.
fn tool_language(language: &str) -> &str {
    match language {
        "en" => "eng",
        "de" => "deu",
        "es" => "spa",
        "fr" => "fra",
        "it" => "ita",
        "pt" => "por",
        "nl" => "nld",
        "ja" => "jpn",
        "zh" => "cmn",
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct FragmentFile {
    fragments: Vec<Fragment>,
}

#[derive(Debug, Deserialize)]
struct Fragment {
    begin: serde_json::Value,
    end: serde_json::Value,
    #[serde(default)]
    lines: Vec<String>,
}

fn seconds(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// Parse the tool's fragment list into words. Fragments without text are
/// skipped.
pub fn parse_fragments(json: &str) -> Result<Vec<Word>, TierError> {
    let file: FragmentFile =
        serde_json::from_str(json).map_err(|e| TierError::Malformed(e.to_string()))?;

    let mut words = Vec::with_capacity(file.fragments.len());
    for (i, fragment) in file.fragments.into_iter().enumerate() {
        let text = fragment.lines.join(" ").trim().to_string();
        if text.is_empty() {
            continue;
        }
        let (Some(start), Some(end)) = (seconds(&fragment.begin), seconds(&fragment.end)) else {
            return Err(TierError::Malformed(format!(
                "fragment {i} has unreadable timing"
            )));
        };
        words.push(Word::new(text, start, end.max(start)));
    }

    if words.is_empty() {
        return Err(TierError::EmptyResult);
    }
    Ok(words)
}
