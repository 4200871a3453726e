//! Remote render job client.
//!
//! Hands a composition to an HTTP render service instead of running the
//! compositor locally. Jobs are submitted with `POST {base}/jobs` and
//! polled with `GET {base}/jobs/{id}` until they reach a terminal state.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use voxreel_common::config::RenderSettings;
use voxreel_common::context::CancelFlag;
use voxreel_project_model::composition::Composition;

use crate::error::RenderError;

/// One clip as the render service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipDescriptor {
    pub sequence: u32,
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub media_url: Option<String>,
    #[serde(default)]
    pub cutaways: Vec<CutawayDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutawayDescriptor {
    pub start: f64,
    pub end: f64,
    pub media_url: Option<String>,
}

/// Requested output format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    pub format: String,
    pub target_duration: Option<f64>,
}

/// Body of a job submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub clips: Vec<ClipDescriptor>,
    /// Every distinct media reference, narration first.
    pub media_urls: Vec<String>,
    pub output: OutputConfig,
}

impl JobPayload {
    pub fn from_composition(composition: &Composition, settings: &RenderSettings) -> Self {
        let url = |p: &std::path::Path| p.display().to_string();

        let clips = composition
            .clips
            .iter()
            .map(|clip| ClipDescriptor {
                sequence: clip.sequence,
                start: clip.start,
                end: clip.end,
                text: clip.text.clone(),
                media_url: clip.source_media.as_deref().map(url),
                cutaways: clip
                    .cutaways
                    .iter()
                    .map(|c| CutawayDescriptor {
                        start: c.start,
                        end: c.end,
                        media_url: c.source_media.as_deref().map(url),
                    })
                    .collect(),
            })
            .collect();

        let mut media_urls = vec![url(composition.audio.as_path())];
        for media in composition.media_references() {
            let media = url(media);
            if !media_urls.contains(&media) {
                media_urls.push(media);
            }
        }

        let framerate = if composition.framerate > 0 {
            composition.framerate
        } else {
            settings.fps
        };

        Self {
            clips,
            media_urls,
            output: OutputConfig {
                width: composition.frame.width,
                height: composition.frame.height,
                framerate,
                format: "mp4".to_string(),
                target_duration: composition.target_duration,
            },
        }
    }
}

/// State of a submitted job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Completed { output: String },
    Failed { error: String },
    /// Any non-terminal status, as reported by the service.
    Pending(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending(_))
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(alias = "job_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse a job submission response: `{"id": ...}` or `{"job_id": ...}`.
pub fn parse_submit_response(body: &str) -> Result<String, RenderError> {
    let response: SubmitResponse =
        serde_json::from_str(body).map_err(|e| RenderError::Malformed(e.to_string()))?;
    if response.id.trim().is_empty() {
        return Err(RenderError::Malformed("empty job id".to_string()));
    }
    Ok(response.id)
}

/// Parse `{"status": "COMPLETED"|"FAILED"|other, "output"?, "error"?}`.
pub fn parse_status_response(body: &str) -> Result<JobStatus, RenderError> {
    let response: StatusResponse =
        serde_json::from_str(body).map_err(|e| RenderError::Malformed(e.to_string()))?;

    Ok(match response.status.to_ascii_uppercase().as_str() {
        "COMPLETED" => JobStatus::Completed {
            output: response.output.unwrap_or_default(),
        },
        "FAILED" => JobStatus::Failed {
            error: response
                .error
                .unwrap_or_else(|| "no error reported".to_string()),
        },
        _ => JobStatus::Pending(response.status),
    })
}

/// Client for a remote render service.
pub struct RemoteRenderClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteRenderClient {
    pub fn new(base_url: impl Into<String>, request_timeout_secs: u64) -> Result<Self, RenderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a job; returns its id.
    pub async fn submit(&self, payload: &JobPayload) -> Result<String, RenderError> {
        let url = format!("{}/jobs", self.base_url);
        tracing::info!(url = %url, clips = payload.clips.len(), "Submitting remote render job");

        let response = self.client.post(&url).json(payload).send().await?;
        let body = checked_body(response).await?;
        let job_id = parse_submit_response(&body)?;
        tracing::info!(job_id = %job_id, "Remote render job accepted");
        Ok(job_id)
    }

    /// Fetch the current status of a job.
    pub async fn poll(&self, job_id: &str) -> Result<JobStatus, RenderError> {
        let url = format!("{}/jobs/{job_id}", self.base_url);
        let response = self.client.get(&url).send().await?;
        let body = checked_body(response).await?;
        parse_status_response(&body)
    }

    /// Poll every `interval` until the job is terminal.
    ///
    /// Returns the output reference of a completed job.
    pub async fn wait_for_completion(
        &self,
        job_id: &str,
        interval: Duration,
        timeout: Duration,
        cancel: &CancelFlag,
    ) -> Result<String, RenderError> {
        let started = Instant::now();

        loop {
            if cancel.is_cancelled() {
                return Err(RenderError::Cancelled {
                    job_id: job_id.to_string(),
                });
            }

            match self.poll(job_id).await? {
                JobStatus::Completed { output } => {
                    tracing::info!(job_id, output = %output, "Remote render job completed");
                    return Ok(output);
                }
                JobStatus::Failed { error } => {
                    return Err(RenderError::JobFailed {
                        job_id: job_id.to_string(),
                        error,
                    });
                }
                JobStatus::Pending(status) => {
                    tracing::debug!(job_id, status = %status, "Remote render job pending");
                }
            }

            if started.elapsed() >= timeout {
                return Err(RenderError::Timeout {
                    job_id: job_id.to_string(),
                    secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(interval).await;
        }
    }
}

async fn checked_body(response: reqwest::Response) -> Result<String, RenderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RenderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use voxreel_project_model::composition::{Clip, Cutaway};
    use voxreel_project_model::frame::FrameGeometry;

    /// Serve one canned JSON response per connection, in order.
    async fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = vec![0u8; 8192];
                let _ = socket.read(&mut buf).await;
                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });

        format!("http://{addr}")
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            parse_status_response(r#"{"status": "COMPLETED", "output": "s3://renders/final.mp4"}"#)
                .unwrap(),
            JobStatus::Completed {
                output: "s3://renders/final.mp4".to_string()
            }
        );
        assert_eq!(
            parse_status_response(r#"{"status": "FAILED", "error": "bad media"}"#).unwrap(),
            JobStatus::Failed {
                error: "bad media".to_string()
            }
        );
        let pending = parse_status_response(r#"{"status": "RENDERING"}"#).unwrap();
        assert_eq!(pending, JobStatus::Pending("RENDERING".to_string()));
        assert!(!pending.is_terminal());
        assert!(parse_status_response("[]").is_err());
    }

    #[test]
    fn test_submit_response_accepts_both_id_fields() {
        assert_eq!(parse_submit_response(r#"{"id": "job-1"}"#).unwrap(), "job-1");
        assert_eq!(parse_submit_response(r#"{"job_id": "job-2"}"#).unwrap(), "job-2");
        assert!(matches!(
            parse_submit_response(r#"{"id": " "}"#),
            Err(RenderError::Malformed(_))
        ));
    }

    #[test]
    fn test_payload_from_composition() {
        let mut composition = Composition::new(
            "Remote",
            "/media/narration.wav",
            FrameGeometry::portrait_hd(),
        );
        composition.clips = vec![
            Clip::new(1, 0.0, 4.0, "Hello world", Some(PathBuf::from("/media/a.mp4")))
                .with_cutaway(Cutaway::new(1.0, 2.0, Some(PathBuf::from("/media/a.mp4")))),
            Clip::new(2, 4.0, 6.0, "Bye", None),
        ];

        let payload = JobPayload::from_composition(&composition, &RenderSettings::default());
        assert_eq!(payload.clips.len(), 2);
        assert_eq!(payload.media_urls, vec!["/media/narration.wav", "/media/a.mp4"]);
        assert_eq!(payload.output.width, 1080);
        assert_eq!(payload.output.framerate, 30);
        assert_eq!(payload.clips[1].media_url, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["clips"][0]["cutaways"][0]["start"], 1.0);
    }

    #[tokio::test]
    async fn test_submit_and_wait() {
        let base = serve(vec![
            (200, r#"{"job_id": "job-42"}"#),
            (200, r#"{"status": "QUEUED"}"#),
            (200, r#"{"status": "COMPLETED", "output": "https://cdn/final.mp4"}"#),
        ])
        .await;

        let client = RemoteRenderClient::new(format!("{base}/"), 5).unwrap();
        assert_eq!(client.base_url(), base);

        let payload = JobPayload {
            clips: vec![],
            media_urls: vec![],
            output: OutputConfig {
                width: 1920,
                height: 1080,
                framerate: 30,
                format: "mp4".to_string(),
                target_duration: Some(10.0),
            },
        };
        let job_id = client.submit(&payload).await.unwrap();
        assert_eq!(job_id, "job-42");

        let output = client
            .wait_for_completion(
                &job_id,
                Duration::from_millis(10),
                Duration::from_secs(5),
                &CancelFlag::new(),
            )
            .await
            .unwrap();
        assert_eq!(output, "https://cdn/final.mp4");
    }

    #[tokio::test]
    async fn test_failed_job_and_error_status() {
        let base = serve(vec![
            (200, r#"{"status": "FAILED", "error": "codec missing"}"#),
            (503, r#"{"message": "overloaded"}"#),
        ])
        .await;
        let client = RemoteRenderClient::new(base, 5).unwrap();

        let err = client
            .wait_for_completion("job-7", Duration::from_millis(10), Duration::from_secs(5), &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::JobFailed { ref error, .. } if error == "codec missing"));

        let err = client.poll("job-7").await.unwrap_err();
        assert!(matches!(err, RenderError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_cancelled_wait_does_not_poll() {
        let client = RemoteRenderClient::new("http://127.0.0.1:1", 1).unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = client
            .wait_for_completion("job-1", Duration::from_millis(10), Duration::from_secs(1), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Cancelled { .. }));
    }
}
