//! OpenAI speech adapter.
//!
//! - Endpoint: `POST https://api.openai.com/v1/audio/speech`
//! - Output: raw 24 kHz mono PCM unless another format is configured
//! - Speed: 0.25 to 4.0

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::config::{OPENAI_SAMPLE_RATE, OpenAIModel, OpenAIResponseFormat, OpenAIVoice, resolve_voice};
use crate::core::tts::base::{
    ProviderKind, ProviderResult, RawAudioClip, SpeechAdapter, TTSConfig, VoiceCapabilities,
    VoiceConfig,
};
use crate::core::tts::provider::{HttpTransport, TTSRequestBuilder};

/// OpenAI API root
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// OpenAI speech endpoint
pub const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

const SPEECH_PATH: &str = "/v1/audio/speech";

#[derive(Clone)]
struct OpenAIRequestBuilder {
    config: TTSConfig,
    model: OpenAIModel,
    default_voice: OpenAIVoice,
    response_format: OpenAIResponseFormat,
    speed: f32,
}

impl OpenAIRequestBuilder {
    fn voice_for(&self, voice: &VoiceConfig) -> OpenAIVoice {
        voice
            .primary_voice()
            .and_then(OpenAIVoice::parse)
            .unwrap_or(self.default_voice)
    }
}

impl TTSRequestBuilder for OpenAIRequestBuilder {
    fn build_http_request(
        &self,
        client: &Client,
        text: &str,
        voice: &VoiceConfig,
    ) -> ProviderResult<reqwest::RequestBuilder> {
        let mut body = json!({
            "model": self.model.as_str(),
            "input": text,
            "voice": self.voice_for(voice).as_str(),
            "response_format": self.response_format.as_str(),
        });

        if (self.speed - 1.0).abs() > 0.001 {
            body["speed"] = json!(self.speed);
        }

        let url = format!("{}{SPEECH_PATH}", self.config.api_root(OPENAI_API_BASE));
        Ok(client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body))
    }

    fn get_config(&self) -> &TTSConfig {
        &self.config
    }
}

/// OpenAI speech adapter. Single voice per call.
pub struct OpenAITTS {
    transport: HttpTransport,
    request_builder: OpenAIRequestBuilder,
}

impl OpenAITTS {
    pub fn new(config: TTSConfig) -> ProviderResult<Self> {
        let model = OpenAIModel::from_str_or_default(&config.model);
        let default_voice = config
            .voice_id
            .as_deref()
            .and_then(OpenAIVoice::parse)
            .unwrap_or_default();
        let response_format = config
            .audio_format
            .as_deref()
            .map(OpenAIResponseFormat::from_str_or_default)
            .unwrap_or_default();
        let speed = config.speaking_rate.unwrap_or(1.0).clamp(0.25, 4.0);

        Ok(Self {
            transport: HttpTransport::new(ProviderKind::OpenAI)?,
            request_builder: OpenAIRequestBuilder {
                config,
                model,
                default_voice,
                response_format,
                speed,
            },
        })
    }

    pub fn model(&self) -> OpenAIModel {
        self.request_builder.model
    }

    pub fn voice(&self) -> OpenAIVoice {
        self.request_builder.default_voice
    }

    pub fn output_format(&self) -> OpenAIResponseFormat {
        self.request_builder.response_format
    }
}

#[async_trait]
impl SpeechAdapter for OpenAITTS {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn voice_capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            max_voices: 1,
            default_voice: self.request_builder.default_voice.as_str(),
            resolve: resolve_voice,
        }
    }

    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> ProviderResult<RawAudioClip> {
        let data = self
            .transport
            .execute(&self.request_builder, text, voice)
            .await?;

        Ok(RawAudioClip {
            encoding: self.request_builder.response_format.encoding(),
            sample_rate: OPENAI_SAMPLE_RATE,
            channels: 1,
            data,
        })
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "openai",
            "api_type": "HTTP REST",
            "model": self.request_builder.model.as_str(),
            "response_format": self.request_builder.response_format.as_str(),
            "sample_rate": OPENAI_SAMPLE_RATE,
            "max_voices_per_call": 1,
            "supported_voices": OpenAIVoice::all().iter().map(|v| v.as_str()).collect::<Vec<_>>(),
            "endpoint": OPENAI_TTS_URL,
        })
    }
}
