//! End-to-end pipeline tests with mock audio and transcription.

use livesub::audio::source::MockAudioSource;
use livesub::pipeline::{
    AssemblerConfig, CoordinatorConfig, PipelineCoordinator, PipelineState, SubtitleEvent,
};
use livesub::stt::{MockTranscriptionService, TranscriptionRequest, TranscriptionService};
use livesub::{LivesubError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// 0.1s chunks keep the tests fast while exercising the same drain logic
/// as the production 4s configuration.
fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig {
        assembler: AssemblerConfig {
            chunk_duration_secs: 0.1,
            overlap_duration_secs: 0.025,
            sample_rate: 16000,
        },
        ..Default::default()
    }
}

async fn collect_transcripts(
    events: &mut tokio::sync::mpsc::Receiver<SubtitleEvent>,
    count: usize,
) -> Vec<String> {
    let mut texts = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while texts.len() < count {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(SubtitleEvent::Transcript(t))) => texts.push(t.text),
            Ok(Some(_)) => {}
            _ => break,
        }
    }
    texts
}

#[tokio::test(flavor = "multi_thread")]
async fn transcripts_arrive_in_chunk_order_despite_latency() {
    let service = Arc::new(
        MockTranscriptionService::new()
            .with_response("first")
            .with_response("second")
            .with_response("third")
            .with_latency(Duration::from_millis(20)),
    );
    // 1600 samples per read = one chunk per read at the fast config
    let source = MockAudioSource::new()
        .with_samples(vec![400i16; 1600])
        .with_read_limit(3);

    let mut coordinator = PipelineCoordinator::new(fast_config());
    let mut events = coordinator.start(source, service, None).unwrap();

    let texts = collect_transcripts(&mut events, 3).await;
    assert_eq!(texts, vec!["first", "second", "third"]);

    coordinator.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn one_failed_request_does_not_break_the_session() {
    let service = Arc::new(
        MockTranscriptionService::new()
            .with_response("before")
            .with_failure("503 from upstream")
            .with_response("after"),
    );
    let source = MockAudioSource::new()
        .with_samples(vec![400i16; 1600])
        .with_read_limit(3);

    let mut coordinator = PipelineCoordinator::new(fast_config());
    let mut events = coordinator.start(source, service, None).unwrap();

    let texts = collect_transcripts(&mut events, 2).await;
    assert_eq!(texts, vec!["before", "after"]);

    coordinator.stop();
    let stats = coordinator.metrics();
    assert_eq!(stats.chunks_transcribed, 2);
    assert_eq!(stats.chunks_failed, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn rolling_context_feeds_later_requests() {
    let service = Arc::new(
        MockTranscriptionService::new()
            .with_response("the quick brown fox")
            .with_response("jumps over the lazy dog"),
    );
    let source = MockAudioSource::new()
        .with_samples(vec![400i16; 1600])
        .with_read_limit(2);

    let mut coordinator = PipelineCoordinator::new(fast_config());
    let mut events = coordinator.start(source, service.clone(), None).unwrap();

    let texts = collect_transcripts(&mut events, 2).await;
    assert_eq!(texts.len(), 2);
    coordinator.stop();

    let prompts = service.seen_prompts();
    assert_eq!(prompts[0], "");
    assert!(prompts[1].contains("the quick brown fox"));
}

#[tokio::test(flavor = "multi_thread")]
async fn state_events_bracket_the_session() {
    let service = Arc::new(MockTranscriptionService::new());
    let source = MockAudioSource::new().with_read_limit(0);

    let mut coordinator = PipelineCoordinator::new(fast_config());
    let mut events = coordinator.start(source, service, None).unwrap();

    match timeout(Duration::from_secs(1), events.recv()).await {
        Ok(Some(SubtitleEvent::State(state))) => assert_eq!(state, PipelineState::Recording),
        other => panic!("expected recording state event, got {:?}", other),
    }

    coordinator.stop();

    // Drain until the Idle state event arrives
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(SubtitleEvent::State(PipelineState::Idle))) => break,
            Ok(Some(_)) => {}
            other => panic!("expected idle state event, got {:?}", other),
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_does_not_wait_for_an_inflight_request() {
    let service = Arc::new(
        MockTranscriptionService::new()
            .with_default_response("slow answer")
            .with_latency(Duration::from_secs(5)),
    );
    let source = MockAudioSource::new()
        .with_samples(vec![400i16; 1600])
        .with_read_limit(1);

    let mut coordinator = PipelineCoordinator::new(fast_config());
    let _events = coordinator.start(source, service, None).unwrap();

    // Give the chunk time to reach the dispatcher and start its call
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stopped = tokio::time::Instant::now();
    coordinator.stop();
    assert!(stopped.elapsed() < Duration::from_secs(1));
    assert_eq!(coordinator.state(), PipelineState::Idle);
}

/// A transcription service that always times out, standing in for a dead
/// network. The session must stay up and report failures via metrics.
struct AlwaysFailing;

#[async_trait::async_trait]
impl TranscriptionService for AlwaysFailing {
    async fn transcribe(&self, _request: TranscriptionRequest) -> Result<String> {
        Err(LivesubError::Transcription {
            message: "connection refused".to_string(),
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn session_survives_total_service_outage() {
    let source = MockAudioSource::new()
        .with_samples(vec![400i16; 1600])
        .with_read_limit(4);

    let mut coordinator = PipelineCoordinator::new(fast_config());
    let mut events = coordinator
        .start(source, Arc::new(AlwaysFailing), None)
        .unwrap();

    // Wait until every chunk has been attempted
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while coordinator.metrics().chunks_failed < 4 {
        assert!(tokio::time::Instant::now() < deadline, "chunks never failed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // No transcripts arrived, only levels and state changes
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SubtitleEvent::Transcript(_)));
    }

    coordinator.stop();
    assert_eq!(coordinator.metrics().chunks_transcribed, 0);
}
