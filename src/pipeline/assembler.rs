//! Chunk assembler stage.
//!
//! Accumulates raw sample blocks into a rolling buffer and emits
//! fixed-duration chunks, each prefixed with the tail of its predecessor so
//! words spoken across a chunk boundary reach the model intact.

use crate::defaults;
use crate::error::{LivesubError, Result};
use crate::pipeline::frame::{SampleBlock, SubtitleEvent, TranscriptionChunk};
use crate::pipeline::metrics::PipelineMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// Configuration for the chunk assembler.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Duration of newly drained audio per chunk, in seconds.
    pub chunk_duration_secs: f32,
    /// Duration of the overlap prefix carried between chunks, in seconds.
    pub overlap_duration_secs: f32,
    /// Sample rate for sample-count calculations.
    pub sample_rate: u32,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            chunk_duration_secs: defaults::CHUNK_DURATION_SECS,
            overlap_duration_secs: defaults::OVERLAP_DURATION_SECS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl AssemblerConfig {
    /// Reject configurations the drain arithmetic cannot handle.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_duration_secs <= 0.0 || self.sample_rate == 0 {
            return Err(LivesubError::ConfigInvalidValue {
                key: "chunk_duration_secs".to_string(),
                message: "chunk duration and sample rate must be positive".to_string(),
            });
        }
        if self.overlap_duration_secs < 0.0 || self.overlap_duration_secs >= self.chunk_duration_secs
        {
            return Err(LivesubError::ConfigInvalidValue {
                key: "overlap_duration_secs".to_string(),
                message: "overlap must be non-negative and shorter than the chunk".to_string(),
            });
        }
        Ok(())
    }
}

/// Accumulates samples and emits overlap-prefixed chunks.
pub struct ChunkAssembler {
    config: AssemblerConfig,
    /// Unconsumed samples; holds less than one chunk between drains.
    buffer: Vec<i16>,
    /// Last `overlap_samples` of the previously drained span. Empty only
    /// before the first emission of a session.
    overlap_tail: Vec<i16>,
    next_chunk_id: u64,
}

impl ChunkAssembler {
    /// Creates an assembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(AssemblerConfig::default())
    }

    /// Creates an assembler with custom configuration.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self {
            config,
            buffer: Vec::new(),
            overlap_tail: Vec::new(),
            next_chunk_id: 0,
        }
    }

    /// Samples of new audio drained per chunk.
    pub fn chunk_samples(&self) -> usize {
        (self.config.sample_rate as f32 * self.config.chunk_duration_secs) as usize
    }

    /// Samples carried forward as the overlap prefix.
    pub fn overlap_samples(&self) -> usize {
        (self.config.sample_rate as f32 * self.config.overlap_duration_secs) as usize
    }

    /// Unconsumed backlog in samples.
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Append samples and drain every complete chunk.
    ///
    /// Emits chunks of exactly `chunk_samples` (first of a session) or
    /// `overlap_samples + chunk_samples` (all later ones). Usually zero or
    /// one chunk per call since capture blocks are much smaller than a
    /// chunk, but a large block can produce several.
    pub fn ingest(&mut self, samples: &[i16]) -> Vec<TranscriptionChunk> {
        self.buffer.extend_from_slice(samples);

        let chunk_samples = self.chunk_samples();
        let overlap_samples = self.overlap_samples();
        let mut chunks = Vec::new();

        while self.buffer.len() >= chunk_samples {
            let drained: Vec<i16> = self.buffer.drain(..chunk_samples).collect();

            let mut full = Vec::with_capacity(self.overlap_tail.len() + chunk_samples);
            full.extend_from_slice(&self.overlap_tail);
            full.extend_from_slice(&drained);

            self.overlap_tail = drained[chunk_samples - overlap_samples..].to_vec();

            chunks.push(TranscriptionChunk {
                chunk_id: self.next_chunk_id,
                samples: full,
            });
            self.next_chunk_id += 1;
        }

        chunks
    }

    /// Drop all buffered audio and the overlap tail.
    ///
    /// Called on session stop; a partial trailing chunk is discarded rather
    /// than submitted short.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overlap_tail.clear();
        self.next_chunk_id = 0;
    }

    /// Worker loop: drain the raw-block queue into the chunk queue.
    ///
    /// Blocks on the inbound queue with a bounded timeout so the stop flag
    /// is observed within one poll interval. Emits a level reading per block
    /// for the presentation layer; level events are lossy by design.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<SampleBlock>,
        output: mpsc::Sender<TranscriptionChunk>,
        events: mpsc::Sender<SubtitleEvent>,
        running: Arc<AtomicBool>,
        metrics: Arc<PipelineMetrics>,
    ) {
        let poll = Duration::from_millis(defaults::POLL_INTERVAL_MS);

        while running.load(Ordering::SeqCst) {
            let block = match timeout(poll, input.recv()).await {
                Ok(Some(block)) => block,
                Ok(None) => break,
                Err(_) => continue,
            };

            let _ = events.try_send(SubtitleEvent::Level(block.level()));

            for chunk in self.ingest(&block.samples) {
                debug!(
                    chunk_id = chunk.chunk_id,
                    samples = chunk.samples.len(),
                    "assembled chunk"
                );
                if output.send(chunk).await.is_err() {
                    return;
                }
            }
            metrics.set_buffered_samples(self.buffered_samples());
        }

        // Stop discards the partial buffer and overlap tail with self.
        debug!(
            dropped_samples = self.buffered_samples(),
            "assembler stopped"
        );
    }
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new()
    }
}
