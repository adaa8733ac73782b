//! Shared types for speech synthesis adapters.
//!
//! Every backend (Gemini, ElevenLabs, OpenAI, browser-local speech) implements
//! [`SpeechAdapter`]. An adapter turns one piece of text plus a [`VoiceConfig`]
//! into a [`RawAudioClip`], or fails with a classified [`ProviderError`] that the
//! fallback orchestrator uses to decide between retrying, skipping and giving up.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::voice::SpeakerSegment;

// =============================================================================
// Provider identity
// =============================================================================

/// Identifies a speech synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Host-local speech engine (plays audio, cannot hand back bytes)
    Browser,
    /// Google Gemini native audio generation
    Gemini,
    /// ElevenLabs text-to-speech
    ElevenLabs,
    /// OpenAI audio speech
    OpenAI,
}

impl ProviderKind {
    /// Providers able to return capturable audio, in default fallback order.
    pub const DEFAULT_CHAIN: [ProviderKind; 3] =
        [ProviderKind::Gemini, ProviderKind::ElevenLabs, ProviderKind::OpenAI];

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Gemini => "gemini",
            Self::ElevenLabs => "elevenlabs",
            Self::OpenAI => "openai",
        }
    }

    /// Parse a provider name, accepting the usual aliases (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "browser" | "local" | "web-speech" | "webspeech" => Some(Self::Browser),
            "gemini" | "google-gemini" | "google_gemini" => Some(Self::Gemini),
            "elevenlabs" | "eleven-labs" | "eleven_labs" | "11labs" => Some(Self::ElevenLabs),
            "openai" | "open-ai" | "open_ai" => Some(Self::OpenAI),
            _ => None,
        }
    }

    /// Environment-variable friendly name (`GEMINI`, `ELEVENLABS`, ...).
    pub fn env_suffix(&self) -> &'static str {
        match self {
            Self::Browser => "BROWSER",
            Self::Gemini => "GEMINI",
            Self::ElevenLabs => "ELEVENLABS",
            Self::OpenAI => "OPENAI",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Classified failure of a single provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Missing credential or otherwise unusable local configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Short-window throttling; the same provider may succeed shortly
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Usage allowance depleted for a longer window
    #[error("Quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Credential rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request shape, voice or capability rejected
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Network fault, server error or timeout
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Successful response that carried no audio
    #[error("Provider returned no audio")]
    NoAudioReturned,
}

impl ProviderError {
    /// Errors that earn one more attempt against the same provider.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transient(_) | Self::NoAudioReturned | Self::RateLimited(_)
        )
    }

    /// Errors that move the chain straight to the next provider.
    #[inline]
    pub fn falls_through(&self) -> bool {
        !self.is_transient()
    }

    /// Short machine-friendly label for logs and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "config_error",
            Self::RateLimited(_) => "rate_limited",
            Self::QuotaExhausted(_) => "quota_exhausted",
            Self::Unauthorized(_) => "unauthorized",
            Self::Unsupported(_) => "unsupported",
            Self::Transient(_) => "transient",
            Self::NoAudioReturned => "no_audio_returned",
        }
    }
}

/// Result type for adapter operations
pub type ProviderResult<T> = Result<T, ProviderError>;

// =============================================================================
// Audio payloads
// =============================================================================

/// Declared encoding of a provider payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// Headerless signed 16-bit little-endian PCM
    Pcm16Le,
    /// RIFF/WAVE container
    Wav,
    Mp3,
    Opus,
    Aac,
    Flac,
}

impl AudioEncoding {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm16Le => "pcm_s16le",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
        }
    }

    /// True when decoding needs an external codec.
    #[inline]
    pub fn is_compressed(&self) -> bool {
        !matches!(self, Self::Pcm16Le | Self::Wav)
    }
}

impl fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio returned by one provider call. Consumed immediately, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAudioClip {
    pub encoding: AudioEncoding,
    pub sample_rate: u32,
    pub channels: u16,
    pub data: Bytes,
}

impl RawAudioClip {
    /// Headerless 16-bit PCM clip.
    pub fn pcm16(data: impl Into<Bytes>, sample_rate: u32, channels: u16) -> Self {
        Self {
            encoding: AudioEncoding::Pcm16Le,
            sample_rate,
            channels,
            data: data.into(),
        }
    }
}

// =============================================================================
// Voice configuration
// =============================================================================

/// One speaker bound to a provider voice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpeakerVoice {
    pub speaker: String,
    pub voice_id: String,
}

/// Provider-ready voice selection, produced by the voice resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum VoiceConfig {
    /// Let the provider use its default voice
    #[default]
    Default,
    /// One voice for the whole text
    Single { voice_id: String },
    /// Per-speaker voices, rendered in one call by multi-voice providers
    Multi { speakers: Vec<SpeakerVoice> },
}

impl VoiceConfig {
    pub fn single(voice_id: impl Into<String>) -> Self {
        Self::Single {
            voice_id: voice_id.into(),
        }
    }

    /// The voice a single-voice provider should use for this configuration.
    pub fn primary_voice(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Single { voice_id } => Some(voice_id),
            Self::Multi { speakers } => speakers.first().map(|s| s.voice_id.as_str()),
        }
    }
}

/// Voice constraints an adapter advertises to the resolver.
#[derive(Debug, Clone, Copy)]
pub struct VoiceCapabilities {
    /// Maximum distinct voices in one call (1 = single-voice provider)
    pub max_voices: usize,
    /// Voice used when none is configured or the requested one is unknown
    pub default_voice: &'static str,
    /// Maps a caller-supplied voice (name or id) to the provider's voice id
    pub resolve: fn(&str) -> Option<String>,
}

impl VoiceCapabilities {
    #[inline]
    pub fn supports_multi_voice(&self) -> bool {
        self.max_voices >= 2
    }
}

// =============================================================================
// Adapter configuration
// =============================================================================

/// Per-provider settings handed to an adapter at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TTSConfig {
    /// Provider name (informational)
    pub provider: String,
    /// API credential; an empty key fails every call with `ConfigError`
    pub api_key: String,
    /// Model identifier (empty = provider default)
    pub model: String,
    /// Default voice when the request does not choose one
    pub voice_id: Option<String>,
    /// Requested output format (provider-specific name)
    pub audio_format: Option<String>,
    /// Speaking rate multiplier
    pub speaking_rate: Option<f32>,
    /// API root override, e.g. for a proxy or a local mock server
    pub base_url: Option<String>,
}

impl TTSConfig {
    pub(crate) fn require_api_key(&self, kind: ProviderKind) -> ProviderResult<&str> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::ConfigError(format!(
                "missing API key for {kind}"
            )));
        }
        Ok(&self.api_key)
    }

    pub(crate) fn api_root<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(default)
    }
}

// =============================================================================
// Adapter trait
// =============================================================================

/// Capability contract shared by every speech backend.
#[async_trait]
pub trait SpeechAdapter: Send + Sync {
    /// Which backend this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Voice constraints for the resolver.
    fn voice_capabilities(&self) -> VoiceCapabilities;

    /// Synthesize one piece of text.
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> ProviderResult<RawAudioClip>;

    /// Render a dialogue as a single prompt for multi-voice providers.
    fn render_dialogue(&self, segments: &[SpeakerSegment]) -> String {
        segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Static provider metadata.
    fn get_provider_info(&self) -> serde_json::Value;
}

/// Shared adapter handle
pub type BoxedAdapter = Arc<dyn SpeechAdapter>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse_aliases() {
        assert_eq!(ProviderKind::parse("Gemini"), Some(ProviderKind::Gemini));
        assert_eq!(ProviderKind::parse("11labs"), Some(ProviderKind::ElevenLabs));
        assert_eq!(ProviderKind::parse(" OPEN_AI "), Some(ProviderKind::OpenAI));
        assert_eq!(ProviderKind::parse("web-speech"), Some(ProviderKind::Browser));
        assert_eq!(ProviderKind::parse("polly"), None);
    }

    #[test]
    fn test_provider_kind_round_trips_through_as_str() {
        for kind in [
            ProviderKind::Browser,
            ProviderKind::Gemini,
            ProviderKind::ElevenLabs,
            ProviderKind::OpenAI,
        ] {
            assert_eq!(ProviderKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Transient("x".into()).is_transient());
        assert!(ProviderError::NoAudioReturned.is_transient());
        assert!(ProviderError::RateLimited("x".into()).is_transient());
        assert!(ProviderError::QuotaExhausted("x".into()).falls_through());
        assert!(ProviderError::Unauthorized("x".into()).falls_through());
        assert!(ProviderError::Unsupported("x".into()).falls_through());
        assert!(ProviderError::ConfigError("x".into()).falls_through());
    }

    #[test]
    fn test_primary_voice() {
        assert_eq!(VoiceConfig::Default.primary_voice(), None);
        assert_eq!(VoiceConfig::single("nova").primary_voice(), Some("nova"));
        let multi = VoiceConfig::Multi {
            speakers: vec![
                SpeakerVoice {
                    speaker: "A".into(),
                    voice_id: "Kore".into(),
                },
                SpeakerVoice {
                    speaker: "B".into(),
                    voice_id: "Puck".into(),
                },
            ],
        };
        assert_eq!(multi.primary_voice(), Some("Kore"));
    }

    #[test]
    fn test_require_api_key() {
        let config = TTSConfig::default();
        assert!(matches!(
            config.require_api_key(ProviderKind::OpenAI),
            Err(ProviderError::ConfigError(_))
        ));

        let config = TTSConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        };
        assert_eq!(config.require_api_key(ProviderKind::OpenAI).unwrap(), "sk-test");
    }

    #[test]
    fn test_api_root_override_trims_slash() {
        let config = TTSConfig {
            base_url: Some("http://127.0.0.1:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_root("https://api.openai.com"), "http://127.0.0.1:9000");
        assert_eq!(
            TTSConfig::default().api_root("https://api.openai.com"),
            "https://api.openai.com"
        );
    }
}
