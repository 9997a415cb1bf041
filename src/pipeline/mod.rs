//! Live subtitle pipeline.
//!
//! Three stages connected by bounded queues:
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌─────────────┐
//! │  Capture  │───▶│ Assembler │───▶│ Dispatcher  │───▶ Subtitle events
//! │ (thread)  │    │  (task)   │    │   (task)    │
//! └───────────┘    └───────────┘    └─────────────┘
//!   raw blocks      overlapping       remote API +
//!                     chunks        rolling context
//! ```
//!
//! The capture thread polls the audio device and pushes raw sample blocks;
//! the assembler drains them into overlap-prefixed chunks; the single
//! dispatcher transcribes each chunk in order and emits subtitle events. A
//! shared atomic flag stops all three cooperatively.

pub mod assembler;
pub mod context;
pub mod coordinator;
pub mod dispatcher;
pub mod frame;
pub mod metrics;

pub use assembler::{AssemblerConfig, ChunkAssembler};
pub use context::{ContextTracker, PromptLocale};
pub use coordinator::{CoordinatorConfig, PipelineCoordinator};
pub use dispatcher::TranscriptionDispatcher;
pub use frame::{PipelineState, SampleBlock, SubtitleEvent, TranscriptEvent, TranscriptionChunk};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
