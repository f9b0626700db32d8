//! Audio-analysis service client
//!
//! Uploads an audio file to the chord recognition and beat detection endpoints
//! and returns their validated payloads. No retries: the first failure is returned.

use fakebook_core::{BeatPayload, ChartError, ChordPayload};
use std::path::Path;

use crate::config::ServiceConfig;

/// Multipart field the service reads the upload from
const UPLOAD_FIELD: &str = "file";

pub struct AnalysisClient {
    http_client: reqwest::Client,
    config: ServiceConfig,
}

impl AnalysisClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ChartError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ChartError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Run chord recognition on an audio file.
    pub async fn recognize_chords(&self, path: &Path) -> Result<ChordPayload, ChartError> {
        let body = self.post_audio(&self.config.chords_url(), path).await?;
        let payload = ChordPayload::from_json(&body)?;
        let events = payload.events()?;
        tracing::debug!(chords = events.len(), "Chord recognition complete");
        Ok(payload)
    }

    /// Run beat detection on an audio file.
    pub async fn detect_beats(&self, path: &Path) -> Result<BeatPayload, ChartError> {
        let body = self.post_audio(&self.config.beats_url(), path).await?;
        let payload = BeatPayload::from_json(&body)?;
        let beat_set = payload.beat_set()?;
        tracing::debug!(
            beats = beat_set.beats.len(),
            downbeats = beat_set.downbeats.len(),
            bpm = beat_set.bpm,
            "Beat detection complete"
        );
        Ok(payload)
    }

    /// Both analyses, issued concurrently.
    pub async fn analyze(&self, path: &Path) -> Result<(ChordPayload, BeatPayload), ChartError> {
        tokio::try_join!(self.recognize_chords(path), self.detect_beats(path))
    }

    async fn post_audio(&self, url: &str, path: &Path) -> Result<String, ChartError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        tracing::debug!(
            url = %url,
            file = %file_name,
            bytes = bytes.len(),
            "Uploading audio for analysis"
        );

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http_client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = if error_text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                error_text
            };
            return Err(ChartError::Service {
                status: Some(status.as_u16()),
                message,
            });
        }

        response.text().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, error: reqwest::Error) -> ChartError {
        if error.is_timeout() {
            ChartError::Timeout {
                seconds: self.config.timeout_secs,
            }
        } else {
            ChartError::Network(error.to_string())
        }
    }
}
