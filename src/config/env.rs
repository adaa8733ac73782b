use std::env;
use std::str::FromStr;
use std::time::Duration;

use super::SynthesisConfig;
use crate::core::orchestrator::SegmentDispatch;
use crate::core::tts::ProviderKind;

const CONFIGURABLE_PROVIDERS: [ProviderKind; 3] = ProviderKind::DEFAULT_CHAIN;

/// Read a variable, treating empty values as unset.
fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| format!("Invalid value for {name}: '{raw}' ({e})"))
        })
        .transpose()
}

/// Parse a comma-separated provider list such as `gemini,openai`.
pub(super) fn parse_provider_chain(raw: &str) -> Result<Vec<ProviderKind>, String> {
    let mut chain = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        let kind = ProviderKind::parse(name).ok_or_else(|| format!("Unknown provider '{name}'"))?;
        if !chain.contains(&kind) {
            chain.push(kind);
        }
    }
    Ok(chain)
}

pub(super) fn parse_segment_dispatch(raw: &str) -> Result<SegmentDispatch, String> {
    match raw.trim().to_lowercase().as_str() {
        "sequential" => Ok(SegmentDispatch::Sequential),
        "concurrent" => Ok(SegmentDispatch::Concurrent),
        other => Err(format!(
            "Unknown segment dispatch '{other}' (expected sequential or concurrent)"
        )),
    }
}

/// Build a configuration from environment variables over defaults.
///
/// | Variable | Meaning |
/// |---|---|
/// | `GEMINI_API_KEY`, `ELEVENLABS_API_KEY`, `OPENAI_API_KEY` | credentials |
/// | `GEMINI_TTS_MODEL`, `ELEVENLABS_TTS_MODEL`, `OPENAI_TTS_MODEL` | model overrides |
/// | `<PROVIDER>_TTS_VOICE`, `<PROVIDER>_BASE_URL`, `<PROVIDER>_AUDIO_FORMAT` | per-provider defaults |
/// | `TTS_PROVIDER_CHAIN` | comma-separated fallback order |
/// | `TTS_REQUEST_TIMEOUT_MS` | per-call timeout |
/// | `TTS_QUOTA_RESET_SECONDS` | quota window |
/// | `TTS_MIN_INTERVAL_MS_<PROVIDER>` | call spacing |
/// | `TTS_CACHE_MAX_ENTRIES`, `TTS_CACHE_TTL_SECONDS` | session cache |
/// | `TTS_SEGMENT_DISPATCH` | `sequential` or `concurrent` |
pub(super) fn load_from_env() -> Result<SynthesisConfig, Box<dyn std::error::Error>> {
    let mut config = SynthesisConfig::default();

    config.gemini_api_key = env_var("GEMINI_API_KEY");
    config.elevenlabs_api_key = env_var("ELEVENLABS_API_KEY");
    config.openai_api_key = env_var("OPENAI_API_KEY");

    config.gemini_model = env_var("GEMINI_TTS_MODEL");
    config.elevenlabs_model = env_var("ELEVENLABS_TTS_MODEL");
    config.openai_model = env_var("OPENAI_TTS_MODEL");

    for kind in CONFIGURABLE_PROVIDERS {
        let suffix = kind.env_suffix();
        if let Some(voice) = env_var(&format!("{suffix}_TTS_VOICE")) {
            config.default_voices.insert(kind, voice);
        }
        if let Some(url) = env_var(&format!("{suffix}_BASE_URL")) {
            config.base_urls.insert(kind, url);
        }
        if let Some(format) = env_var(&format!("{suffix}_AUDIO_FORMAT")) {
            config.audio_formats.insert(kind, format);
        }
        if let Some(ms) = parse_env::<u64>(&format!("TTS_MIN_INTERVAL_MS_{suffix}"))? {
            config.min_intervals.insert(kind, Duration::from_millis(ms));
        }
    }

    if let Some(raw) = env_var("TTS_PROVIDER_CHAIN") {
        config.provider_chain = parse_provider_chain(&raw)?;
    }
    if let Some(ms) = parse_env::<u64>("TTS_REQUEST_TIMEOUT_MS")? {
        config.request_timeout = Duration::from_millis(ms);
    }
    if let Some(secs) = parse_env::<u64>("TTS_QUOTA_RESET_SECONDS")? {
        config.quota_reset = Duration::from_secs(secs);
    }
    if let Some(entries) = parse_env::<u64>("TTS_CACHE_MAX_ENTRIES")? {
        config.cache_max_entries = entries;
    }
    if let Some(secs) = parse_env::<u64>("TTS_CACHE_TTL_SECONDS")? {
        config.cache_ttl = Some(Duration::from_secs(secs));
    }
    if let Some(raw) = env_var("TTS_SEGMENT_DISPATCH") {
        config.segment_dispatch = parse_segment_dispatch(&raw)?;
    }

    Ok(config)
}
