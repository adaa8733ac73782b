use std::time::Duration;

use super::SynthesisConfig;
use super::env::{load_from_env, parse_provider_chain, parse_segment_dispatch};
use super::yaml::{ProviderYaml, YamlConfig};
use crate::core::tts::ProviderKind;

/// Environment configuration with YAML values layered on top.
pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<SynthesisConfig, Box<dyn std::error::Error>> {
    let mut config = load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(providers) = yaml.providers {
        if let Some(chain) = providers.chain {
            config.provider_chain = parse_provider_chain(&chain.join(","))?;
        }
        for (kind, settings) in [
            (ProviderKind::Gemini, providers.gemini),
            (ProviderKind::ElevenLabs, providers.elevenlabs),
            (ProviderKind::OpenAI, providers.openai),
        ] {
            if let Some(settings) = settings {
                apply_provider(&mut config, kind, settings);
            }
        }
    }

    if let Some(synthesis) = yaml.synthesis {
        if let Some(ms) = synthesis.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = synthesis.quota_reset_seconds {
            config.quota_reset = Duration::from_secs(secs);
        }
        if let Some(dispatch) = synthesis.segment_dispatch {
            config.segment_dispatch = parse_segment_dispatch(&dispatch)?;
        }
    }

    if let Some(cache) = yaml.cache {
        if let Some(entries) = cache.max_entries {
            config.cache_max_entries = entries;
        }
        if let Some(secs) = cache.ttl_seconds {
            config.cache_ttl = Some(Duration::from_secs(secs));
        }
    }

    Ok(config)
}

fn apply_provider(config: &mut SynthesisConfig, kind: ProviderKind, settings: ProviderYaml) {
    if let Some(key) = settings.api_key {
        match kind {
            ProviderKind::Gemini => config.gemini_api_key = Some(key),
            ProviderKind::ElevenLabs => config.elevenlabs_api_key = Some(key),
            ProviderKind::OpenAI => config.openai_api_key = Some(key),
            ProviderKind::Browser => {}
        }
    }
    if let Some(model) = settings.model {
        match kind {
            ProviderKind::Gemini => config.gemini_model = Some(model),
            ProviderKind::ElevenLabs => config.elevenlabs_model = Some(model),
            ProviderKind::OpenAI => config.openai_model = Some(model),
            ProviderKind::Browser => {}
        }
    }
    if let Some(voice) = settings.voice {
        config.default_voices.insert(kind, voice);
    }
    if let Some(url) = settings.base_url {
        config.base_urls.insert(kind, url);
    }
    if let Some(format) = settings.audio_format {
        config.audio_formats.insert(kind, format);
    }
    if let Some(ms) = settings.min_interval_ms {
        config.min_intervals.insert(kind, Duration::from_millis(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn yaml(text: &str) -> YamlConfig {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    #[serial]
    fn test_yaml_overrides_env() {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "env-key");
            std::env::set_var("TTS_QUOTA_RESET_SECONDS", "30");
        }

        let config = merge_config(Some(yaml(
            r#"
providers:
  chain: ["elevenlabs"]
  openai:
    api_key: "yaml-key"
  elevenlabs:
    voice: "Adam"
    min_interval_ms: 500
synthesis:
  request_timeout_ms: 1500
"#,
        )))
        .unwrap();

        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("TTS_QUOTA_RESET_SECONDS");
        }

        assert_eq!(config.openai_api_key.as_deref(), Some("yaml-key"));
        assert_eq!(config.provider_chain, vec![ProviderKind::ElevenLabs]);
        assert_eq!(
            config.default_voices.get(&ProviderKind::ElevenLabs).map(String::as_str),
            Some("Adam")
        );
        assert_eq!(
            config.min_intervals.get(&ProviderKind::ElevenLabs),
            Some(&Duration::from_millis(500))
        );
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        // env value survives where YAML is silent
        assert_eq!(config.quota_reset, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_unknown_provider_in_yaml_chain() {
        let result = merge_config(Some(yaml("providers:\n  chain: [\"polly\"]\n")));
        assert!(result.is_err());
    }
}
