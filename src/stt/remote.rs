//! HTTP client for the remote transcription API.
//!
//! Speaks the OpenAI-style `audio/transcriptions` protocol: multipart POST
//! with the WAV file, model name, optional language, and optional context
//! prompt; JSON `{ "text": ... }` response.

use crate::config::TranscriptionConfig;
use crate::defaults;
use crate::error::{LivesubError, Result};
use crate::stt::service::{TranscriptionRequest, TranscriptionService};
use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Transcription client for an OpenAI-compatible HTTP endpoint.
pub struct RemoteTranscriber {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    text: String,
}

impl RemoteTranscriber {
    /// Build a client from config. The request timeout is enforced at the
    /// HTTP layer so one slow call can never stall the dispatcher for longer.
    pub fn new(config: &TranscriptionConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LivesubError::Transcription {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            model: config.model.clone(),
        })
    }

    /// Read an API key from a file, trimming whitespace.
    pub fn load_api_key(path: &Path) -> Result<String> {
        let key = std::fs::read_to_string(path)
            .map_err(|e| LivesubError::ApiKey {
                message: format!("Failed to read {}: {}", path.display(), e),
            })?
            .trim()
            .to_string();

        if key.is_empty() {
            return Err(LivesubError::ApiKey {
                message: format!("{} is empty", path.display()),
            });
        }
        Ok(key)
    }
}

#[async_trait]
impl TranscriptionService for RemoteTranscriber {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String> {
        let file_part = multipart::Part::bytes(request.audio_wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")
            .map_err(|e| LivesubError::Transcription {
                message: format!("Failed to build multipart body: {}", e),
            })?;

        let mut form = multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        if request.language != defaults::AUTO_LANGUAGE {
            form = form.text("language", request.language);
        }
        if !request.prompt.is_empty() {
            form = form.text("prompt", request.prompt);
        }

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LivesubError::Transcription {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LivesubError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ApiResponse =
            response
                .json()
                .await
                .map_err(|e| LivesubError::Transcription {
                    message: format!("Malformed API response: {}", e),
                })?;

        Ok(parsed.text)
    }
}
