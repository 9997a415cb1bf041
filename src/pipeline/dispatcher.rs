//! Transcription dispatcher stage.
//!
//! Single consumer of the chunk queue: encodes each chunk to WAV, attaches
//! the context prompt, calls the transcription service, and forwards
//! successful results as transcript events. One worker means strict FIFO
//! ordering of subtitles regardless of per-call latency.
//!
//! Failure policy is at-most-once per chunk: a failed or empty transcription
//! is logged and dropped, never retried, and never stalls the loop. Losing
//! one chunk's subtitle beats stalling the live pipeline.

use crate::audio::wav;
use crate::defaults;
use crate::pipeline::context::ContextTracker;
use crate::pipeline::frame::{SubtitleEvent, TranscriptEvent, TranscriptionChunk};
use crate::pipeline::metrics::PipelineMetrics;
use crate::stt::service::{TranscriptionRequest, TranscriptionService};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Pulls chunks, calls the service, and emits transcript events.
pub struct TranscriptionDispatcher<S: TranscriptionService> {
    service: Arc<S>,
    context: ContextTracker,
    language: String,
    sample_rate: u32,
    metrics: Arc<PipelineMetrics>,
}

impl<S: TranscriptionService + 'static> TranscriptionDispatcher<S> {
    pub fn new(
        service: Arc<S>,
        context: ContextTracker,
        language: String,
        sample_rate: u32,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            service,
            context,
            language,
            sample_rate,
            metrics,
        }
    }

    /// Worker loop. Polls the chunk queue with a bounded timeout so a stop
    /// signal is observed within one interval even when no audio arrives.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<TranscriptionChunk>,
        events: mpsc::Sender<SubtitleEvent>,
        running: Arc<AtomicBool>,
    ) {
        let poll = Duration::from_millis(defaults::POLL_INTERVAL_MS);

        while running.load(Ordering::SeqCst) {
            let chunk = match timeout(poll, input.recv()).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(_) => continue,
            };
            self.dispatch(chunk, &events, &running).await;
        }

        debug!("dispatcher stopped");
    }

    /// Transcribe one chunk end to end.
    ///
    /// Per-chunk failures are swallowed here; only the metrics and the log
    /// see them.
    async fn dispatch(
        &mut self,
        chunk: TranscriptionChunk,
        events: &mpsc::Sender<SubtitleEvent>,
        running: &AtomicBool,
    ) {
        let chunk_id = chunk.chunk_id;

        let audio_wav = match wav::encode_wav(&chunk.samples, self.sample_rate) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(chunk_id, "failed to encode chunk: {}", e);
                self.metrics.record_failure();
                return;
            }
        };

        let prompt = self.context.build_prompt();
        self.metrics.set_prompt_chars(prompt.chars().count());

        let request = TranscriptionRequest {
            audio_wav,
            language: self.language.clone(),
            prompt,
        };

        let started = Instant::now();
        let result = self.service.transcribe(request).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        self.metrics.set_latency_ms(latency_ms);

        match result {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    // Service produced nothing for this chunk; no event.
                    debug!(chunk_id, latency_ms, "empty transcription, skipped");
                    return;
                }

                self.context.record(text);
                self.metrics.record_transcribed();
                debug!(chunk_id, latency_ms, "transcribed chunk");

                // A result arriving after stop is discarded, not displayed.
                if running.load(Ordering::SeqCst) {
                    let event = SubtitleEvent::Transcript(TranscriptEvent::new(text.to_string()));
                    let _ = events.send(event).await;
                }
            }
            Err(e) => {
                self.metrics.record_failure();
                warn!(chunk_id, latency_ms, "transcription failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::PromptLocale;
    use crate::stt::service::MockTranscriptionService;

    fn make_chunk(id: u64) -> TranscriptionChunk {
        TranscriptionChunk {
            chunk_id: id,
            samples: vec![1000i16; 1600],
        }
    }

    fn make_dispatcher(
        service: Arc<MockTranscriptionService>,
        metrics: Arc<PipelineMetrics>,
    ) -> TranscriptionDispatcher<MockTranscriptionService> {
        TranscriptionDispatcher::new(
            service,
            ContextTracker::new(4, PromptLocale::En),
            "auto".to_string(),
            16000,
            metrics,
        )
    }

    #[tokio::test]
    async fn successful_chunk_emits_transcript_event() {
        let service = Arc::new(MockTranscriptionService::new().with_response("hello world"));
        let metrics = Arc::new(PipelineMetrics::new());
        let mut dispatcher = make_dispatcher(service, metrics.clone());

        let (event_tx, mut event_rx) = mpsc::channel(10);
        let running = AtomicBool::new(true);

        dispatcher.dispatch(make_chunk(0), &event_tx, &running).await;

        match event_rx.recv().await.unwrap() {
            SubtitleEvent::Transcript(event) => assert_eq!(event.text, "hello world"),
            other => panic!("expected transcript event, got {:?}", other),
        }
        assert_eq!(metrics.snapshot().chunks_transcribed, 1);
    }

    #[tokio::test]
    async fn failed_chunk_emits_nothing_and_leaves_context_unchanged() {
        let service = Arc::new(
            MockTranscriptionService::new()
                .with_failure("connection timed out")
                .with_response("after the failure"),
        );
        let metrics = Arc::new(PipelineMetrics::new());
        let mut dispatcher = make_dispatcher(service.clone(), metrics.clone());

        let (event_tx, mut event_rx) = mpsc::channel(10);
        let running = AtomicBool::new(true);

        dispatcher.dispatch(make_chunk(0), &event_tx, &running).await;
        assert_eq!(metrics.snapshot().chunks_failed, 1);
        assert!(event_rx.try_recv().is_err());

        // Pipeline keeps going: next chunk dispatched with an empty prompt
        // because the failed call recorded nothing
        dispatcher.dispatch(make_chunk(1), &event_tx, &running).await;
        match event_rx.recv().await.unwrap() {
            SubtitleEvent::Transcript(event) => assert_eq!(event.text, "after the failure"),
            other => panic!("expected transcript event, got {:?}", other),
        }
        assert_eq!(service.seen_prompts(), vec!["", ""]);
    }

    #[tokio::test]
    async fn empty_response_is_skipped_silently() {
        let service = Arc::new(MockTranscriptionService::new().with_response("   "));
        let metrics = Arc::new(PipelineMetrics::new());
        let mut dispatcher = make_dispatcher(service, metrics.clone());

        let (event_tx, mut event_rx) = mpsc::channel(10);
        let running = AtomicBool::new(true);

        dispatcher.dispatch(make_chunk(0), &event_tx, &running).await;

        assert!(event_rx.try_recv().is_err());
        let snap = metrics.snapshot();
        assert_eq!(snap.chunks_transcribed, 0);
        assert_eq!(snap.chunks_failed, 0);
    }

    #[tokio::test]
    async fn result_after_stop_is_not_delivered() {
        let service = Arc::new(MockTranscriptionService::new().with_response("too late"));
        let metrics = Arc::new(PipelineMetrics::new());
        let mut dispatcher = make_dispatcher(service, metrics);

        let (event_tx, mut event_rx) = mpsc::channel(10);
        let running = AtomicBool::new(false); // session already stopped

        dispatcher.dispatch(make_chunk(0), &event_tx, &running).await;
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn successive_chunks_carry_rolling_context() {
        let service = Arc::new(
            MockTranscriptionService::new()
                .with_response("first sentence")
                .with_response("second sentence"),
        );
        let metrics = Arc::new(PipelineMetrics::new());
        let mut dispatcher = make_dispatcher(service.clone(), metrics);

        let (event_tx, _event_rx) = mpsc::channel(10);
        let running = AtomicBool::new(true);

        dispatcher.dispatch(make_chunk(0), &event_tx, &running).await;
        dispatcher.dispatch(make_chunk(1), &event_tx, &running).await;

        let prompts = service.seen_prompts();
        assert_eq!(prompts[0], "");
        assert!(prompts[1].contains("first sentence"));
    }

    #[tokio::test]
    async fn run_loop_preserves_fifo_order() {
        let service = Arc::new(
            MockTranscriptionService::new()
                .with_response("one")
                .with_response("two")
                .with_response("three")
                .with_latency(Duration::from_millis(5)),
        );
        let metrics = Arc::new(PipelineMetrics::new());
        let dispatcher = make_dispatcher(service, metrics);

        let (chunk_tx, chunk_rx) = mpsc::channel(10);
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let running = Arc::new(AtomicBool::new(true));

        let worker = tokio::spawn(dispatcher.run(chunk_rx, event_tx, running.clone()));

        for id in 0..3 {
            chunk_tx.send(make_chunk(id)).await.unwrap();
        }

        let mut texts = Vec::new();
        for _ in 0..3 {
            if let Some(SubtitleEvent::Transcript(event)) = event_rx.recv().await {
                texts.push(event.text);
            }
        }
        assert_eq!(texts, vec!["one", "two", "three"]);

        running.store(false, Ordering::SeqCst);
        worker.await.unwrap();
    }
}
