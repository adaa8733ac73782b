//! Configuration types for ElevenLabs text-to-speech.

use crate::core::tts::base::AudioEncoding;

/// Premade voices, by display name and voice id.
pub const PREMADE_VOICES: &[(&str, &str)] = &[
    ("Rachel", "21m00Tcm4TlvDq8ikWAM"),
    ("Domi", "AZnzlk1XvdvUeBnXmlld"),
    ("Bella", "EXAVITQu4vr4xnSDxMaL"),
    ("Antoni", "ErXwobaYiN019PkySvjV"),
    ("Elli", "MF3mGyEYCl7XYWbV9V6O"),
    ("Josh", "TxGEqnHWrfWFTfGW9XjX"),
    ("Arnold", "VR6AewLTigWG4xSOukaG"),
    ("Adam", "pNInz6obpgDQGcFmaJgB"),
    ("Sam", "yoZ06aMxZJJ28mfd3POQ"),
];

/// Rachel
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

const VOICE_ID_LEN: usize = 20;

/// Map a voice name or id to an ElevenLabs voice id.
///
/// Premade names resolve case-insensitively. Anything shaped like a voice id
/// (20 ASCII alphanumerics) is accepted as-is so cloned and library voices work.
pub(crate) fn resolve_voice(s: &str) -> Option<String> {
    let s = s.trim();
    if let Some((_, id)) = PREMADE_VOICES
        .iter()
        .find(|(name, id)| name.eq_ignore_ascii_case(s) || *id == s)
    {
        return Some((*id).to_string());
    }
    if s.len() == VOICE_ID_LEN && s.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(s.to_string());
    }
    None
}

// =============================================================================
// Models
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElevenLabsModel {
    #[default]
    MultilingualV2,
    TurboV2_5,
    FlashV2_5,
    V3,
}

impl ElevenLabsModel {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MultilingualV2 => "eleven_multilingual_v2",
            Self::TurboV2_5 => "eleven_turbo_v2_5",
            Self::FlashV2_5 => "eleven_flash_v2_5",
            Self::V3 => "eleven_v3",
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "eleven_turbo_v2_5" | "turbo" => Self::TurboV2_5,
            "eleven_flash_v2_5" | "flash" => Self::FlashV2_5,
            "eleven_v3" | "v3" => Self::V3,
            _ => Self::default(),
        }
    }
}

// =============================================================================
// Output format
// =============================================================================

/// `output_format` query values this adapter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElevenLabsOutputFormat {
    Pcm16000,
    Pcm22050,
    #[default]
    Pcm24000,
    Pcm44100,
    Mp3_44100_128,
}

impl ElevenLabsOutputFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm16000 => "pcm_16000",
            Self::Pcm22050 => "pcm_22050",
            Self::Pcm24000 => "pcm_24000",
            Self::Pcm44100 => "pcm_44100",
            Self::Mp3_44100_128 => "mp3_44100_128",
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Pcm16000 => 16_000,
            Self::Pcm22050 => 22_050,
            Self::Pcm24000 => 24_000,
            Self::Pcm44100 | Self::Mp3_44100_128 => 44_100,
        }
    }

    pub fn encoding(&self) -> AudioEncoding {
        match self {
            Self::Mp3_44100_128 => AudioEncoding::Mp3,
            _ => AudioEncoding::Pcm16Le,
        }
    }

    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pcm_16000" => Self::Pcm16000,
            "pcm_22050" => Self::Pcm22050,
            "pcm_44100" => Self::Pcm44100,
            "mp3" | "mp3_44100_128" => Self::Mp3_44100_128,
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_premade_names() {
        assert_eq!(resolve_voice("rachel"), Some(DEFAULT_VOICE_ID.to_string()));
        assert_eq!(resolve_voice("Adam"), Some("pNInz6obpgDQGcFmaJgB".to_string()));
    }

    #[test]
    fn test_resolve_custom_ids() {
        assert_eq!(
            resolve_voice("abcdefghij0123456789"),
            Some("abcdefghij0123456789".to_string())
        );
        assert_eq!(resolve_voice("nova"), None);
        assert_eq!(resolve_voice("abc-defghij012345678"), None);
    }

    #[test]
    fn test_output_format() {
        let format = ElevenLabsOutputFormat::default();
        assert_eq!(format.as_str(), "pcm_24000");
        assert_eq!(format.sample_rate(), 24_000);
        assert_eq!(format.encoding(), AudioEncoding::Pcm16Le);
        assert_eq!(
            ElevenLabsOutputFormat::from_str_or_default("mp3").encoding(),
            AudioEncoding::Mp3
        );
    }

    #[test]
    fn test_model_from_str() {
        assert_eq!(ElevenLabsModel::from_str_or_default("flash"), ElevenLabsModel::FlashV2_5);
        assert_eq!(ElevenLabsModel::from_str_or_default(""), ElevenLabsModel::MultilingualV2);
    }
}
