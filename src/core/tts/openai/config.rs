//! Configuration types for the OpenAI speech endpoint.

use serde::{Deserialize, Serialize};

use crate::core::tts::base::AudioEncoding;

/// OpenAI speech output is always 24 kHz.
pub const OPENAI_SAMPLE_RATE: u32 = 24_000;

// =============================================================================
// Models
// =============================================================================

/// Supported OpenAI speech models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenAIModel {
    /// Standard quality, lowest latency
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    /// Higher fidelity, higher latency
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
    /// Steerable model accepting delivery instructions
    #[serde(rename = "gpt-4o-mini-tts")]
    Gpt4oMiniTts,
}

impl OpenAIModel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
            Self::Gpt4oMiniTts => "gpt-4o-mini-tts",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tts-1-hd" | "tts1-hd" | "tts1hd" => Self::Tts1Hd,
            "gpt-4o-mini-tts" | "gpt4o-mini-tts" => Self::Gpt4oMiniTts,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for OpenAIModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Built-in OpenAI voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIVoice {
    #[default]
    Alloy,
    Ash,
    Ballad,
    Coral,
    Echo,
    Fable,
    Onyx,
    Nova,
    Sage,
    Shimmer,
    Verse,
}

impl OpenAIVoice {
    const ALL: [OpenAIVoice; 11] = [
        Self::Alloy,
        Self::Ash,
        Self::Ballad,
        Self::Coral,
        Self::Echo,
        Self::Fable,
        Self::Onyx,
        Self::Nova,
        Self::Sage,
        Self::Shimmer,
        Self::Verse,
    ];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Strict parse; `None` for voices OpenAI does not offer.
    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|v| v.as_str() == wanted)
    }

    pub fn all() -> &'static [OpenAIVoice] {
        &Self::ALL
    }
}

impl std::fmt::Display for OpenAIVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Voice lookup handed to the resolver.
pub(crate) fn resolve_voice(s: &str) -> Option<String> {
    OpenAIVoice::parse(s).map(|v| v.as_str().to_string())
}

// =============================================================================
// Response format
// =============================================================================

/// Response formats this adapter can request.
///
/// Defaults to raw PCM so clips can be stitched without a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIResponseFormat {
    #[default]
    Pcm,
    Wav,
    Mp3,
    Opus,
    Aac,
    Flac,
}

impl OpenAIResponseFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm => "pcm",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
        }
    }

    /// Encoding tag attached to returned clips.
    pub fn encoding(&self) -> AudioEncoding {
        match self {
            Self::Pcm => AudioEncoding::Pcm16Le,
            Self::Wav => AudioEncoding::Wav,
            Self::Mp3 => AudioEncoding::Mp3,
            Self::Opus => AudioEncoding::Opus,
            Self::Aac => AudioEncoding::Aac,
            Self::Flac => AudioEncoding::Flac,
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "wav" => Self::Wav,
            "mp3" | "mpeg" => Self::Mp3,
            "opus" => Self::Opus,
            "aac" => Self::Aac,
            "flac" => Self::Flac,
            _ => Self::Pcm,
        }
    }
}
