//! Configuration and wire types for Gemini native audio generation.

use serde::{Deserialize, Serialize};

/// Gemini speech output: 16-bit mono PCM at 24 kHz.
pub const GEMINI_SAMPLE_RATE: u32 = 24_000;

/// Gemini renders at most two dedicated voices per request.
pub const GEMINI_MAX_SPEAKER_VOICES: usize = 2;

pub const DEFAULT_VOICE: &str = "Kore";

/// Prebuilt voices.
pub const PREBUILT_VOICES: &[&str] = &[
    "Zephyr",
    "Puck",
    "Charon",
    "Kore",
    "Fenrir",
    "Leda",
    "Orus",
    "Aoede",
    "Callirrhoe",
    "Autonoe",
    "Enceladus",
    "Iapetus",
    "Umbriel",
    "Algieba",
    "Despina",
    "Erinome",
    "Algenib",
    "Rasalgethi",
    "Laomedeia",
    "Achernar",
    "Alnilam",
    "Schedar",
    "Gacrux",
    "Pulcherrima",
    "Achird",
    "Zubenelgenubi",
    "Vindemiatrix",
    "Sadachbia",
    "Sadaltager",
    "Sulafat",
];

/// Case-insensitive lookup returning the canonical voice name.
pub(crate) fn resolve_voice(s: &str) -> Option<String> {
    let s = s.trim();
    PREBUILT_VOICES
        .iter()
        .find(|v| v.eq_ignore_ascii_case(s))
        .map(|v| (*v).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeminiModel {
    #[default]
    FlashPreviewTts,
    ProPreviewTts,
}

impl GeminiModel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FlashPreviewTts => "gemini-2.5-flash-preview-tts",
            Self::ProPreviewTts => "gemini-2.5-pro-preview-tts",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "gemini-2.5-pro-preview-tts" | "pro" => Self::ProPreviewTts,
            _ => Self::default(),
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum SpeechConfig {
    VoiceConfig(PrebuiltVoice),
    MultiSpeakerVoiceConfig(MultiSpeakerVoiceConfig),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrebuiltVoice {
    pub prebuilt_voice_config: VoiceName,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoiceName {
    pub voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MultiSpeakerVoiceConfig {
    pub speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SpeakerVoiceConfig {
    pub speaker: String,
    pub voice_config: PrebuiltVoice,
}

impl PrebuiltVoice {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            prebuilt_voice_config: VoiceName {
                voice_name: name.into(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResponsePart {
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

/// Extract `rate=NNNN` from an `audio/L16;codec=pcm;rate=24000` mime type.
pub(crate) fn sample_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}
