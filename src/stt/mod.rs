//! Speech-to-text service interface and implementations.

pub mod remote;
pub mod service;

pub use remote::RemoteTranscriber;
pub use service::{MockTranscriptionService, TranscriptionRequest, TranscriptionService};
