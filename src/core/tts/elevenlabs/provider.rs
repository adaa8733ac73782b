//! ElevenLabs text-to-speech adapter.
//!
//! - Endpoint: `POST https://api.elevenlabs.io/v1/text-to-speech/{voice_id}`
//! - Auth: `xi-api-key` header
//! - Output: `pcm_24000` by default (headerless 16-bit mono)
//!
//! ElevenLabs reports exhausted character quota as `401` with a
//! `quota_exceeded` detail; the shared status classifier handles that.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::config::{DEFAULT_VOICE_ID, ElevenLabsModel, ElevenLabsOutputFormat, PREMADE_VOICES, resolve_voice};
use crate::core::tts::base::{
    ProviderKind, ProviderResult, RawAudioClip, SpeechAdapter, TTSConfig, VoiceCapabilities,
    VoiceConfig,
};
use crate::core::tts::provider::{HttpTransport, TTSRequestBuilder};

/// ElevenLabs API root
pub const ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";

/// ElevenLabs synthesis endpoint (voice id appended)
pub const ELEVENLABS_TTS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

#[derive(Clone)]
struct ElevenLabsRequestBuilder {
    config: TTSConfig,
    model: ElevenLabsModel,
    output_format: ElevenLabsOutputFormat,
    default_voice: String,
}

impl ElevenLabsRequestBuilder {
    fn voice_for(&self, voice: &VoiceConfig) -> String {
        voice
            .primary_voice()
            .and_then(resolve_voice)
            .unwrap_or_else(|| self.default_voice.clone())
    }
}

impl TTSRequestBuilder for ElevenLabsRequestBuilder {
    fn build_http_request(
        &self,
        client: &Client,
        text: &str,
        voice: &VoiceConfig,
    ) -> ProviderResult<reqwest::RequestBuilder> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.config.api_root(ELEVENLABS_API_BASE),
            self.voice_for(voice),
            self.output_format.as_str()
        );

        let mut body = json!({
            "text": text,
            "model_id": self.model.as_str(),
        });
        if let Some(rate) = self.config.speaking_rate {
            body["voice_settings"] = json!({ "speed": rate.clamp(0.7, 1.2) });
        }

        Ok(client
            .post(url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body))
    }

    fn get_config(&self) -> &TTSConfig {
        &self.config
    }
}

/// ElevenLabs adapter. Single voice per call.
pub struct ElevenLabsTTS {
    transport: HttpTransport,
    request_builder: ElevenLabsRequestBuilder,
}

impl ElevenLabsTTS {
    pub fn new(config: TTSConfig) -> ProviderResult<Self> {
        let model = ElevenLabsModel::from_str_or_default(&config.model);
        let output_format = config
            .audio_format
            .as_deref()
            .map(ElevenLabsOutputFormat::from_str_or_default)
            .unwrap_or_default();
        let default_voice = config
            .voice_id
            .as_deref()
            .and_then(resolve_voice)
            .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string());

        Ok(Self {
            transport: HttpTransport::new(ProviderKind::ElevenLabs)?,
            request_builder: ElevenLabsRequestBuilder {
                config,
                model,
                output_format,
                default_voice,
            },
        })
    }

    pub fn model(&self) -> ElevenLabsModel {
        self.request_builder.model
    }

    pub fn output_format(&self) -> ElevenLabsOutputFormat {
        self.request_builder.output_format
    }
}

#[async_trait]
impl SpeechAdapter for ElevenLabsTTS {
    fn kind(&self) -> ProviderKind {
        ProviderKind::ElevenLabs
    }

    fn voice_capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            max_voices: 1,
            default_voice: DEFAULT_VOICE_ID,
            resolve: resolve_voice,
        }
    }

    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> ProviderResult<RawAudioClip> {
        let data = self
            .transport
            .execute(&self.request_builder, text, voice)
            .await?;
        let format = self.request_builder.output_format;

        Ok(RawAudioClip {
            encoding: format.encoding(),
            sample_rate: format.sample_rate(),
            channels: 1,
            data,
        })
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "elevenlabs",
            "api_type": "HTTP REST",
            "model": self.request_builder.model.as_str(),
            "output_format": self.request_builder.output_format.as_str(),
            "max_voices_per_call": 1,
            "premade_voices": PREMADE_VOICES.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            "endpoint": ELEVENLABS_TTS_URL,
        })
    }
}
