use tracing::debug;

use super::SpeakerVoiceMapping;
use crate::core::tts::{SpeakerVoice, VoiceCapabilities, VoiceConfig};

/// Maps script speakers to voices a particular adapter can render.
///
/// Never fails: unknown voices fall back to the provider default, and speakers
/// beyond a provider's voice cap are left unassigned.
pub struct VoiceResolver;

impl VoiceResolver {
    /// Build the voice configuration for one adapter.
    ///
    /// `speakers` are the distinct labels present in the script. Only speakers
    /// that also appear in `mapping` count, taken in mapping insertion order.
    pub fn resolve(
        speakers: &[&str],
        mapping: &SpeakerVoiceMapping,
        capabilities: &VoiceCapabilities,
    ) -> VoiceConfig {
        let mapped: Vec<(&str, &str)> = mapping
            .iter()
            .filter(|(speaker, _)| speakers.contains(speaker))
            .collect();

        let resolve = |voice: &str| -> String {
            (capabilities.resolve)(voice).unwrap_or_else(|| {
                debug!(
                    voice,
                    fallback = capabilities.default_voice,
                    "Unknown voice, using provider default"
                );
                capabilities.default_voice.to_string()
            })
        };

        match mapped.as_slice() {
            [] => VoiceConfig::Default,
            [(_, voice)] => VoiceConfig::single(resolve(*voice)),
            [(_, first), ..] if !capabilities.supports_multi_voice() => {
                VoiceConfig::single(resolve(*first))
            }
            entries => {
                if entries.len() > capabilities.max_voices {
                    debug!(
                        mapped = entries.len(),
                        cap = capabilities.max_voices,
                        "More speakers than voice slots; extra speakers unassigned"
                    );
                }
                VoiceConfig::Multi {
                    speakers: entries
                        .iter()
                        .take(capabilities.max_voices)
                        .map(|(speaker, voice)| SpeakerVoice {
                            speaker: (*speaker).to_string(),
                            voice_id: resolve(*voice),
                        })
                        .collect(),
                }
            }
        }
    }
}
