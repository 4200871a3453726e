//! Remote forced-alignment tier.
//!
//! Posts the narration and its script to an HTTP service as a multipart
//! form and reads back word timings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use voxreel_project_model::word::Word;

use super::TierError;

/// Client for a remote alignment endpoint.
pub struct RemoteAligner {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    language: String,
}

impl RemoteAligner {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        language: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, TierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            language: language.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `audio` and the preprocessed `script`; return word timings.
    pub async fn align(&self, script: &str, audio: &Path) -> Result<Vec<Word>, TierError> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        tracing::debug!(
            endpoint = %self.endpoint,
            audio_bytes = bytes.len(),
            "Posting alignment request"
        );

        let form = reqwest::multipart::Form::new()
            .part("audio", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("text", script.to_string())
            .text("language", self.language.clone());

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AlignmentResponse {
    Wrapped { words: Vec<RemoteWord> },
    Bare(Vec<RemoteWord>),
}

#[derive(Debug, Deserialize)]
struct RemoteWord {
    #[serde(alias = "word")]
    text: String,
    start: f64,
    end: f64,
}

/// Parse `{"words": [...]}` or a bare word array.
pub fn parse_response(body: &str) -> Result<Vec<Word>, TierError> {
    let response: AlignmentResponse =
        serde_json::from_str(body).map_err(|e| TierError::Malformed(e.to_string()))?;
    let raw = match response {
        AlignmentResponse::Wrapped { words } => words,
        AlignmentResponse::Bare(words) => words,
    };

    if raw.is_empty() {
        return Err(TierError::EmptyResult);
    }

    raw.into_iter()
        .enumerate()
        .map(|(i, w)| {
            if !w.start.is_finite() || !w.end.is_finite() || w.end < w.start {
                return Err(TierError::Malformed(format!(
                    "word {i} ({:?}) has invalid timing {}..{}",
                    w.text, w.start, w.end
                )));
            }
            Ok(Word::new(w.text, w.start, w.end))
        })
        .collect()
}
