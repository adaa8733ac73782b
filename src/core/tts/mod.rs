mod base;
pub mod browser;
pub mod elevenlabs;
pub mod gemini;
pub mod openai;
pub mod provider;

pub use base::{
    AudioEncoding, BoxedAdapter, ProviderError, ProviderKind, ProviderResult, RawAudioClip,
    SpeakerVoice, SpeechAdapter, TTSConfig, VoiceCapabilities, VoiceConfig,
};
pub use browser::{BrowserSpeech, LocalSpeechEngine};
pub use elevenlabs::{ELEVENLABS_TTS_URL, ElevenLabsTTS};
pub use gemini::{GEMINI_API_BASE, GeminiTTS};
pub use openai::{OPENAI_TTS_URL, OpenAITTS};
pub use provider::{HttpTransport, TTSRequestBuilder, classify_status};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory function to create a speech adapter.
///
/// # Supported Providers
///
/// - `"gemini"` or `"google-gemini"` - Gemini native audio (two voices per call)
/// - `"elevenlabs"` or `"eleven-labs"` or `"11labs"` - ElevenLabs TTS API
/// - `"openai"` or `"open-ai"` - OpenAI Audio Speech API
/// - `"browser"` or `"local"` or `"web-speech"` - host-local playback (no capture)
///
/// # Example
///
/// ```rust,ignore
/// use voicecast::core::tts::{create_tts_provider, TTSConfig};
///
/// let config = TTSConfig {
///     api_key: "your-api-key".to_string(),
///     voice_id: Some("Puck".to_string()),
///     ..Default::default()
/// };
///
/// let adapter = create_tts_provider("gemini", config)?;
/// ```
pub fn create_tts_provider(provider_type: &str, config: TTSConfig) -> ProviderResult<BoxedAdapter> {
    match ProviderKind::parse(provider_type) {
        Some(kind) => create_adapter(kind, config),
        None => Err(ProviderError::ConfigError(format!(
            "Unsupported TTS provider: {provider_type}. Supported providers: gemini, elevenlabs, openai, browser"
        ))),
    }
}

/// Build the adapter for a known provider kind.
pub fn create_adapter(kind: ProviderKind, config: TTSConfig) -> ProviderResult<BoxedAdapter> {
    let adapter: BoxedAdapter = match kind {
        ProviderKind::Gemini => Arc::new(GeminiTTS::new(config)?),
        ProviderKind::ElevenLabs => Arc::new(ElevenLabsTTS::new(config)?),
        ProviderKind::OpenAI => Arc::new(OpenAITTS::new(config)?),
        ProviderKind::Browser => Arc::new(BrowserSpeech::new()),
    };
    Ok(adapter)
}

/// Returns a map of provider names to their default API endpoint URLs.
///
/// Gemini's URL is the models collection; the model name and
/// `:generateContent` are appended per request.
pub fn get_tts_provider_urls() -> HashMap<String, String> {
    let mut urls = HashMap::new();
    urls.insert(
        "gemini".to_string(),
        format!("{GEMINI_API_BASE}/v1beta/models"),
    );
    urls.insert("elevenlabs".to_string(), ELEVENLABS_TTS_URL.to_string());
    urls.insert("openai".to_string(), OPENAI_TTS_URL.to_string());
    urls
}
