//! Observable pipeline metrics.
//!
//! Updated by the workers, read by the presentation layer (the original UI
//! shows response time, prompt length, and assembler backlog in a debug
//! line). Plain atomics; no locks on the hot path.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters and gauges shared between the pipeline and its observers.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    last_latency_ms: AtomicU64,
    last_prompt_chars: AtomicU64,
    buffered_samples: AtomicU64,
    chunks_transcribed: AtomicU64,
    chunks_failed: AtomicU64,
}

/// Point-in-time copy of the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub last_latency_ms: u64,
    pub last_prompt_chars: u64,
    pub buffered_samples: u64,
    pub chunks_transcribed: u64,
    pub chunks_failed: u64,
}

impl MetricsSnapshot {
    /// Assembler backlog in seconds at the given sample rate.
    pub fn buffered_secs(&self, sample_rate: u32) -> f32 {
        self.buffered_samples as f32 / sample_rate as f32
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_latency_ms(&self, ms: u64) {
        self.last_latency_ms.store(ms, Ordering::Relaxed);
    }

    pub fn set_prompt_chars(&self, chars: usize) {
        self.last_prompt_chars.store(chars as u64, Ordering::Relaxed);
    }

    pub fn set_buffered_samples(&self, samples: usize) {
        self.buffered_samples.store(samples as u64, Ordering::Relaxed);
    }

    pub fn record_transcribed(&self) {
        self.chunks_transcribed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.chunks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            last_latency_ms: self.last_latency_ms.load(Ordering::Relaxed),
            last_prompt_chars: self.last_prompt_chars.load(Ordering::Relaxed),
            buffered_samples: self.buffered_samples.load(Ordering::Relaxed),
            chunks_transcribed: self.chunks_transcribed.load(Ordering::Relaxed),
            chunks_failed: self.chunks_failed.load(Ordering::Relaxed),
        }
    }
}
