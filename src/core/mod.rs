pub mod audio;
pub mod cache;
pub mod orchestrator;
pub mod tts;
pub mod voice;

// Re-export commonly used types for convenience
pub use audio::{AudioError, AudioStitcher, ClipDecoder, DecodedAudio};

pub use cache::{SessionCache, cache_key};

pub use orchestrator::{
    AudioArtifact, FallbackOrchestrator, FallbackOrchestratorBuilder, ProviderPreference,
    QuotaTracker, RateLimiter, SegmentDispatch, SpeechRequest,
};

pub use tts::{
    AudioEncoding, BoxedAdapter, BrowserSpeech, ElevenLabsTTS, GeminiTTS, OpenAITTS,
    ProviderError, ProviderKind, ProviderResult, RawAudioClip, SpeechAdapter, TTSConfig,
    VoiceCapabilities, VoiceConfig, create_adapter, create_tts_provider, get_tts_provider_urls,
};

pub use voice::{SpeakerSegment, SpeakerVoiceMapping, VoiceResolver};
