//! Gemini native audio adapter.
//!
//! - Endpoint: `POST https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent`
//! - Auth: `x-goog-api-key` header
//! - Output: base64 PCM (`audio/L16;codec=pcm;rate=24000`) inside the JSON response
//!
//! Gemini is the only backend that renders two speakers in one call. A
//! `VoiceConfig::Multi` with two or more speakers becomes a
//! `multiSpeakerVoiceConfig`; the text must then carry `Speaker: line` turns.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use super::config::{
    Content, DEFAULT_VOICE, GEMINI_MAX_SPEAKER_VOICES, GEMINI_SAMPLE_RATE, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, GeminiModel, MultiSpeakerVoiceConfig,
    PREBUILT_VOICES, PrebuiltVoice, SpeakerVoiceConfig, SpeechConfig, TextPart, resolve_voice,
    sample_rate_from_mime,
};
use crate::core::audio::decode_base64_pcm;
use crate::core::tts::base::{
    ProviderError, ProviderKind, ProviderResult, RawAudioClip, SpeechAdapter, TTSConfig,
    VoiceCapabilities, VoiceConfig,
};
use crate::core::tts::provider::{HttpTransport, TTSRequestBuilder};
use crate::core::voice::SpeakerSegment;

/// Gemini API root
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
struct GeminiRequestBuilder {
    config: TTSConfig,
    model: GeminiModel,
    default_voice: String,
}

impl GeminiRequestBuilder {
    fn voice_name(&self, requested: Option<&str>) -> String {
        requested
            .and_then(resolve_voice)
            .unwrap_or_else(|| self.default_voice.clone())
    }

    fn speech_config(&self, voice: &VoiceConfig) -> SpeechConfig {
        match voice {
            VoiceConfig::Multi { speakers } if speakers.len() >= 2 => {
                SpeechConfig::MultiSpeakerVoiceConfig(MultiSpeakerVoiceConfig {
                    speaker_voice_configs: speakers
                        .iter()
                        .take(GEMINI_MAX_SPEAKER_VOICES)
                        .map(|s| SpeakerVoiceConfig {
                            speaker: s.speaker.clone(),
                            voice_config: PrebuiltVoice::named(self.voice_name(Some(&s.voice_id))),
                        })
                        .collect(),
                })
            }
            other => SpeechConfig::VoiceConfig(PrebuiltVoice::named(
                self.voice_name(other.primary_voice()),
            )),
        }
    }
}

impl TTSRequestBuilder for GeminiRequestBuilder {
    fn build_http_request(
        &self,
        client: &Client,
        text: &str,
        voice: &VoiceConfig,
    ) -> ProviderResult<reqwest::RequestBuilder> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_root(GEMINI_API_BASE),
            self.model.as_str()
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![TextPart { text }],
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO"],
                speech_config: self.speech_config(voice),
            },
        };

        Ok(client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&body))
    }

    fn get_config(&self) -> &TTSConfig {
        &self.config
    }
}

/// Pull the first inline audio part out of a `generateContent` response.
fn extract_audio(body: &[u8]) -> ProviderResult<RawAudioClip> {
    let response: GenerateContentResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::Transient(format!("malformed Gemini response: {e}")))?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(ProviderError::Unsupported(format!("prompt blocked: {reason}")));
    }

    let inline = response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.inline_data.as_ref())
        .find(|d| !d.data.is_empty());

    let Some(inline) = inline else {
        let finish_reason = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("none");
        debug!(finish_reason, "Gemini response carried no inline audio");
        return Err(ProviderError::NoAudioReturned);
    };

    let pcm = decode_base64_pcm(&inline.data).map_err(|e| {
        warn!(error = %e, "Gemini returned undecodable audio");
        ProviderError::Transient(format!("undecodable Gemini audio: {e}"))
    })?;
    if pcm.is_empty() {
        return Err(ProviderError::NoAudioReturned);
    }

    let sample_rate = sample_rate_from_mime(&inline.mime_type).unwrap_or(GEMINI_SAMPLE_RATE);
    Ok(RawAudioClip::pcm16(pcm, sample_rate, 1))
}

/// Gemini adapter. Up to two voices per call.
pub struct GeminiTTS {
    transport: HttpTransport,
    request_builder: GeminiRequestBuilder,
}

impl GeminiTTS {
    pub fn new(config: TTSConfig) -> ProviderResult<Self> {
        let model = GeminiModel::from_str_or_default(&config.model);
        let default_voice = config
            .voice_id
            .as_deref()
            .and_then(resolve_voice)
            .unwrap_or_else(|| DEFAULT_VOICE.to_string());

        Ok(Self {
            transport: HttpTransport::new(ProviderKind::Gemini)?,
            request_builder: GeminiRequestBuilder {
                config,
                model,
                default_voice,
            },
        })
    }

    pub fn model(&self) -> GeminiModel {
        self.request_builder.model
    }
}

#[async_trait]
impl SpeechAdapter for GeminiTTS {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn voice_capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            max_voices: GEMINI_MAX_SPEAKER_VOICES,
            default_voice: DEFAULT_VOICE,
            resolve: resolve_voice,
        }
    }

    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> ProviderResult<RawAudioClip> {
        let body = self
            .transport
            .execute(&self.request_builder, text, voice)
            .await?;
        extract_audio(&body)
    }

    fn render_dialogue(&self, segments: &[SpeakerSegment]) -> String {
        let turns = segments
            .iter()
            .map(|s| format!("{}: {}", s.speaker, s.text))
            .collect::<Vec<_>>()
            .join("\n");
        format!("TTS the following conversation:\n{turns}")
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": "gemini",
            "api_type": "HTTP REST",
            "model": self.request_builder.model.as_str(),
            "sample_rate": GEMINI_SAMPLE_RATE,
            "max_voices_per_call": GEMINI_MAX_SPEAKER_VOICES,
            "voices": PREBUILT_VOICES,
            "endpoint": format!("{GEMINI_API_BASE}/v1beta/models"),
        })
    }
}
