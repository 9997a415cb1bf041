//! Pipeline coordinator: session lifecycle and worker wiring.
//!
//! Owns the Idle/Recording state machine. `start` wires the capture thread,
//! the assembler worker, and the dispatcher worker together with bounded
//! queues and hands the caller the subtitle event receiver; `stop` clears
//! the shared running flag and lets the workers drain out on their own.

use crate::audio::source::AudioSource;
use crate::config::Config;
use crate::defaults;
use crate::error::{LivesubError, Result};
use crate::pipeline::assembler::{AssemblerConfig, ChunkAssembler};
use crate::pipeline::context::{ContextTracker, PromptLocale};
use crate::pipeline::dispatcher::TranscriptionDispatcher;
use crate::pipeline::frame::{PipelineState, SampleBlock, SubtitleEvent};
use crate::pipeline::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::stt::service::TranscriptionService;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Configuration for a coordinator instance.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Chunk segmentation parameters.
    pub assembler: AssemblerConfig,
    /// Language code sent with each request, or "auto".
    pub language: String,
    /// Locale of the context prompt templates.
    pub prompt_locale: PromptLocale,
    /// Past transcriptions kept as rolling context.
    pub context_history: usize,
    /// Queue bounds between the stages.
    pub raw_queue_size: usize,
    pub chunk_queue_size: usize,
    pub event_queue_size: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            assembler: AssemblerConfig::default(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            prompt_locale: PromptLocale::default(),
            context_history: defaults::CONTEXT_HISTORY,
            raw_queue_size: defaults::RAW_QUEUE_SIZE,
            chunk_queue_size: defaults::CHUNK_QUEUE_SIZE,
            event_queue_size: defaults::EVENT_QUEUE_SIZE,
        }
    }
}

impl CoordinatorConfig {
    /// Derive a coordinator configuration from the application config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            assembler: AssemblerConfig {
                chunk_duration_secs: config.chunking.chunk_duration_secs,
                overlap_duration_secs: config.chunking.overlap_duration_secs,
                sample_rate: config.audio.sample_rate,
            },
            language: config.transcription.language.clone(),
            prompt_locale: PromptLocale::from_code(&config.transcription.prompt_locale),
            context_history: config.transcription.context_history,
            ..Default::default()
        }
    }
}

/// Wires capture, assembly, and dispatch into a running session.
///
/// Must be used from within a tokio runtime; `start` spawns the assembler
/// and dispatcher as tasks on the ambient runtime.
pub struct PipelineCoordinator {
    config: CoordinatorConfig,
    state: PipelineState,
    running: Option<Arc<AtomicBool>>,
    capture_thread: Option<JoinHandle<()>>,
    events_tx: Option<mpsc::Sender<SubtitleEvent>>,
    metrics: Arc<PipelineMetrics>,
}

impl PipelineCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            state: PipelineState::Idle,
            running: None,
            capture_thread: None,
            events_tx: None,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Point-in-time copy of the pipeline metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Start a transcription session.
    ///
    /// Fails with `InvalidState` if a session is already recording, and
    /// propagates the device error if the audio source refuses to start.
    /// On success the returned receiver delivers subtitle events until the
    /// session is stopped.
    pub fn start<A, S>(
        &mut self,
        mut audio_source: A,
        service: Arc<S>,
        topic_hint: Option<&str>,
    ) -> Result<mpsc::Receiver<SubtitleEvent>>
    where
        A: AudioSource + 'static,
        S: TranscriptionService + 'static,
    {
        if self.state == PipelineState::Recording {
            return Err(LivesubError::InvalidState {
                message: "pipeline is already recording".to_string(),
            });
        }
        self.config.assembler.validate()?;

        // Device failure at startup is fatal; nothing has been spawned yet.
        audio_source.start()?;

        let running = Arc::new(AtomicBool::new(true));
        let (block_tx, block_rx) = mpsc::channel::<SampleBlock>(self.config.raw_queue_size);
        let (chunk_tx, chunk_rx) = mpsc::channel(self.config.chunk_queue_size);
        let (event_tx, event_rx) = mpsc::channel(self.config.event_queue_size);

        let assembler = ChunkAssembler::with_config(self.config.assembler.clone());
        tokio::spawn(assembler.run(
            block_rx,
            chunk_tx,
            event_tx.clone(),
            running.clone(),
            self.metrics.clone(),
        ));

        let mut context =
            ContextTracker::new(self.config.context_history, self.config.prompt_locale);
        if let Some(hint) = topic_hint {
            context.set_topic_hint(hint);
        }
        let dispatcher = TranscriptionDispatcher::new(
            service,
            context,
            self.config.language.clone(),
            self.config.assembler.sample_rate,
            self.metrics.clone(),
        );
        tokio::spawn(dispatcher.run(chunk_rx, event_tx.clone(), running.clone()));

        // Device reads are blocking, so capture lives on a plain thread
        // feeding the async side through the bounded block queue.
        let capture_running = running.clone();
        let capture_thread = thread::spawn(move || {
            let poll = Duration::from_millis(defaults::CAPTURE_POLL_MS);
            let mut sequence = 0u64;

            while capture_running.load(Ordering::SeqCst) {
                let samples = match audio_source.read_samples() {
                    Ok(samples) => samples,
                    Err(e) => {
                        error!("audio capture failed: {}", e);
                        break;
                    }
                };

                if samples.is_empty() {
                    thread::sleep(poll);
                    continue;
                }

                let block = SampleBlock::new(sequence, samples);
                sequence += 1;
                if block_tx.blocking_send(block).is_err() {
                    break;
                }
            }

            if let Err(e) = audio_source.stop() {
                error!("failed to stop audio source: {}", e);
            }
            debug!(blocks = sequence, "capture thread exited");
        });

        let _ = event_tx.try_send(SubtitleEvent::State(PipelineState::Recording));

        self.state = PipelineState::Recording;
        self.running = Some(running);
        self.capture_thread = Some(capture_thread);
        self.events_tx = Some(event_tx);
        info!(language = %self.config.language, "transcription session started");

        Ok(event_rx)
    }

    /// Stop the current session.
    ///
    /// Idempotent; calling from Idle is a no-op. Returns as soon as the
    /// capture thread has joined. An in-flight transcription request is not
    /// awaited; its late result is discarded by the dispatcher.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Idle {
            return;
        }

        if let Some(running) = self.running.take() {
            running.store(false, Ordering::SeqCst);
        }
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
        if let Some(events_tx) = self.events_tx.take() {
            let _ = events_tx.try_send(SubtitleEvent::State(PipelineState::Idle));
        }

        self.state = PipelineState::Idle;
        info!("transcription session stopped");
    }
}

impl Drop for PipelineCoordinator {
    fn drop(&mut self) {
        // Workers must not outlive the coordinator
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::SeqCst);
        }
    }
}
