use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::tts::ProviderKind;
use crate::core::voice::{SpeakerSegment, SpeakerVoiceMapping};
use crate::errors::SynthesisError;

pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Which providers a request may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPreference {
    /// The orchestrator's configured fallback chain
    #[default]
    DefaultChain,
    /// Exactly this provider, no fallback
    Pinned(ProviderKind),
}

/// How segment clips are dispatched on per-segment providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentDispatch {
    /// One segment at a time, in script order
    #[default]
    Sequential,
    /// All segments in flight at once; output order and rate limits still hold
    Concurrent,
}

/// One synthesis call: plain text or dialogue segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    pub segments: Vec<SpeakerSegment>,
    pub voices: SpeakerVoiceMapping,
    pub provider: ProviderPreference,
}

impl SpeechRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn dialogue(segments: Vec<SpeakerSegment>) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    pub fn with_voices(mut self, voices: SpeakerVoiceMapping) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_voice(mut self, speaker: impl Into<String>, voice_id: impl Into<String>) -> Self {
        self.voices.insert(speaker, voice_id);
        self
    }

    pub fn pinned(mut self, provider: ProviderKind) -> Self {
        self.provider = ProviderPreference::Pinned(provider);
        self
    }
}

/// A request after blank segments are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Script {
    Text(String),
    Dialogue(Vec<SpeakerSegment>),
}

impl Script {
    pub(crate) fn from_request(request: &SpeechRequest) -> Result<Self, SynthesisError> {
        let segments: Vec<SpeakerSegment> = request
            .segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .cloned()
            .collect();

        if !segments.is_empty() {
            return Ok(Self::Dialogue(segments));
        }
        if !request.text.trim().is_empty() {
            return Ok(Self::Text(request.text.clone()));
        }
        Err(SynthesisError::InvalidRequest(
            "request has neither text nor non-empty segments".into(),
        ))
    }

    pub(crate) fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Dialogue(_) => "",
        }
    }

    pub(crate) fn segments(&self) -> &[SpeakerSegment] {
        match self {
            Self::Text(_) => &[],
            Self::Dialogue(segments) => segments,
        }
    }

    pub(crate) fn char_count(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Dialogue(segments) => segments.iter().map(|s| s.text.chars().count()).sum(),
        }
    }
}

/// Finished audio handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Complete WAV file
    pub bytes: Bytes,
    pub mime_type: &'static str,
    pub provider_used: ProviderKind,
}

impl AudioArtifact {
    pub fn wav(bytes: Bytes, provider_used: ProviderKind) -> Self {
        Self {
            bytes,
            mime_type: WAV_MIME_TYPE,
            provider_used,
        }
    }
}
