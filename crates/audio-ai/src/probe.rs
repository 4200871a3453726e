//! Media duration probing via ffprobe.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use voxreel_common::context::CancelFlag;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Duration of a media file in seconds, or `None` when it cannot be
/// measured (missing file, missing ffprobe, unreadable output).
pub async fn probe_duration(ffprobe: &str, path: &Path) -> Option<f64> {
    probe_duration_with_cancel(ffprobe, path, &CancelFlag::new()).await
}

/// [`probe_duration`], killing ffprobe and returning `None` once `cancel`
/// is raised.
pub async fn probe_duration_with_cancel(ffprobe: &str, path: &Path, cancel: &CancelFlag) -> Option<f64> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Cannot probe missing file");
        return None;
    }

    let child = tokio::process::Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!(ffprobe, error = %e, "Failed to run ffprobe");
            return None;
        }
    };

    let waited = tokio::select! {
        waited = tokio::time::timeout(PROBE_TIMEOUT, child.wait_with_output()) => waited,
        _ = cancel.cancelled() => {
            tracing::warn!(path = %path.display(), "Cancellation requested; killing ffprobe");
            return None;
        }
    };

    let output = match waited {
        Ok(Ok(output)) if output.status.success() => output,
        Ok(Ok(output)) => {
            tracing::warn!(status = %output.status, path = %path.display(), "ffprobe failed");
            return None;
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "ffprobe did not complete");
            return None;
        }
        Err(_) => {
            tracing::warn!(path = %path.display(), "ffprobe timed out");
            return None;
        }
    };

    let duration = parse_probe_duration(&String::from_utf8_lossy(&output.stdout));
    tracing::debug!(path = %path.display(), duration = ?duration, "Probed media duration");
    duration
}

/// Extract `format.duration` from ffprobe JSON output.
pub fn parse_probe_duration(json: &str) -> Option<f64> {
    let output: ProbeOutput = serde_json::from_str(json).ok()?;
    output
        .format?
        .duration?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}
