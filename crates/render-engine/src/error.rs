//! Render-engine errors.

use voxreel_common::error::VoxreelError;

/// Failures talking to a remote render service.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("render service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed render service response: {0}")]
    Malformed(String),

    #[error("render job {job_id} failed: {error}")]
    JobFailed { job_id: String, error: String },

    #[error("render job {job_id} still pending after {secs}s")]
    Timeout { job_id: String, secs: u64 },

    #[error("render job {job_id} cancelled")]
    Cancelled { job_id: String },
}

impl From<RenderError> for VoxreelError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Cancelled { .. } => VoxreelError::Cancelled,
            other => VoxreelError::render(other.to_string()),
        }
    }
}
