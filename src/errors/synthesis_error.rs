use std::fmt;
use thiserror::Error;

use crate::core::audio::AudioError;
use crate::core::tts::{ProviderError, ProviderKind};

/// Result type for orchestrated synthesis
pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Why one provider in the chain did not produce the artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub error: ProviderError,
    /// Adapter calls made; 0 when the provider was skipped
    pub attempts: u32,
}

impl ProviderFailure {
    pub fn skipped(provider: ProviderKind, error: ProviderError) -> Self {
        Self {
            provider,
            error,
            attempts: 0,
        }
    }

    pub fn was_skipped(&self) -> bool {
        self.attempts == 0
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.was_skipped() {
            write!(f, "{} skipped ({})", self.provider, self.error)
        } else {
            write!(f, "{} after {} attempt(s): {}", self.provider, self.attempts, self.error)
        }
    }
}

fn summarize(failures: &[ProviderFailure]) -> String {
    if failures.is_empty() {
        return "no providers in chain".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal errors surfaced by the orchestrator.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    /// Every provider in the chain failed or was skipped
    #[error("All providers failed: {}", summarize(.failures))]
    SynthesisFailed { failures: Vec<ProviderFailure> },

    /// Segment clips disagree on sample rate or channel count
    #[error("Cannot stitch clips: {0}")]
    MixedFormat(AudioError),

    /// Empty text and no segments
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Synthesis cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SynthesisError {
    /// Per-provider reasons, when the chain was exhausted.
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            Self::SynthesisFailed { failures } => failures,
            _ => &[],
        }
    }
}
