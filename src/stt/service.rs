use crate::error::{LivesubError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One transcription request: a WAV-encoded audio chunk plus the textual
/// context that should bias recognition.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Audio as a complete WAV container (mono, 16-bit PCM).
    pub audio_wav: Vec<u8>,
    /// Language code, or "auto" to let the service detect it.
    pub language: String,
    /// Context prompt; empty when there is no context yet.
    pub prompt: String,
}

/// Trait for remote speech-to-text services.
///
/// This trait allows swapping implementations (real HTTP API vs mock).
/// Returns the transcribed text; an empty string means the service produced
/// no transcription for the chunk.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String>;
}

#[async_trait]
impl<T: TranscriptionService> TranscriptionService for Arc<T> {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String> {
        (**self).transcribe(request).await
    }
}

/// Scripted reply for the mock service.
#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(String),
    Failure(String),
}

/// Mock transcription service for testing.
///
/// Replies are consumed in order; once the script is exhausted the default
/// response is returned. Received prompts are captured for assertions.
pub struct MockTranscriptionService {
    script: Mutex<VecDeque<ScriptedReply>>,
    default_response: String,
    latency: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl MockTranscriptionService {
    /// Create a new mock with an empty script and empty default response
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_response: String::new(),
            latency: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Append a successful reply to the script
    pub fn with_response(self, text: &str) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(ScriptedReply::Text(text.to_string()));
        }
        self
    }

    /// Append a failure to the script
    pub fn with_failure(self, message: &str) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(ScriptedReply::Failure(message.to_string()));
        }
        self
    }

    /// Response returned once the script is exhausted
    pub fn with_default_response(mut self, text: &str) -> Self {
        self.default_response = text.to_string();
        self
    }

    /// Simulate per-call latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Prompts received so far, in call order
    pub fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of transcribe calls made
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl Default for MockTranscriptionService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptionService for MockTranscriptionService {
    async fn transcribe(&self, request: TranscriptionRequest) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt);
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match reply {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Failure(message)) => {
                Err(LivesubError::Transcription { message })
            }
            None => Ok(self.default_response.clone()),
        }
    }
}
