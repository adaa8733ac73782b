//! Host-local speech playback.
//!
//! A local speech engine speaks text straight to the audio device and never
//! hands bytes back, so [`BrowserSpeech`] cannot take part in a fallback chain:
//! `synthesize` always fails with `Unsupported`. Playback goes through the
//! separate, fire-and-forget [`BrowserSpeech::play`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use super::base::{
    ProviderError, ProviderKind, ProviderResult, RawAudioClip, SpeechAdapter, VoiceCapabilities,
    VoiceConfig,
};

/// Speech engine provided by the host (OS speech service, embedded webview, ...).
///
/// `speak` may block until playback finishes; it runs on the blocking pool.
pub trait LocalSpeechEngine: Send + Sync {
    fn speak(&self, text: &str, voice: Option<&str>) -> Result<(), String>;
}

fn accept_any_voice(voice: &str) -> Option<String> {
    let voice = voice.trim();
    (!voice.is_empty()).then(|| voice.to_string())
}

/// Playback-only adapter around an optional [`LocalSpeechEngine`].
#[derive(Clone, Default)]
pub struct BrowserSpeech {
    engine: Option<Arc<dyn LocalSpeechEngine>>,
}

impl BrowserSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(engine: Arc<dyn LocalSpeechEngine>) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Start speaking `text` and return immediately.
    ///
    /// Fails with `ConfigError` when no engine is attached or no Tokio runtime
    /// is running. Playback errors are logged, never reported to the caller.
    pub fn play(&self, text: &str, voice: &VoiceConfig) -> ProviderResult<()> {
        let engine = self
            .engine
            .clone()
            .ok_or_else(|| ProviderError::ConfigError("no local speech engine attached".into()))?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ProviderError::ConfigError(format!("local playback needs a Tokio runtime: {e}"))
        })?;

        let text = text.to_string();
        let voice = voice.primary_voice().map(str::to_string);
        debug!(text_len = text.len(), voice = ?voice, "Dispatching local playback");

        runtime.spawn_blocking(move || {
            if let Err(e) = engine.speak(&text, voice.as_deref()) {
                warn!(error = %e, "Local speech playback failed");
            }
        });
        Ok(())
    }
}

#[async_trait]
impl SpeechAdapter for BrowserSpeech {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Browser
    }

    fn voice_capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            max_voices: 1,
            default_voice: "default",
            resolve: accept_any_voice,
        }
    }

    async fn synthesize(&self, _text: &str, _voice: &VoiceConfig) -> ProviderResult<RawAudioClip> {
        Err(ProviderError::Unsupported(
            "local speech cannot capture audio; use play()".into(),
        ))
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "browser",
            "api_type": "local",
            "captures_audio": false,
            "engine_attached": self.has_engine(),
        })
    }
}
