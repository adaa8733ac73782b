use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// providers:
///   chain: ["gemini", "elevenlabs", "openai"]
///   gemini:
///     api_key: "your-gemini-key"
///     model: "gemini-2.5-flash-preview-tts"
///     voice: "Kore"
///     min_interval_ms: 1000
///   elevenlabs:
///     api_key: "your-elevenlabs-key"
///     audio_format: "pcm_24000"
///   openai:
///     api_key: "your-openai-key"
///     base_url: "https://api.openai.com"
///
/// synthesis:
///   request_timeout_ms: 30000
///   quota_reset_seconds: 60
///   segment_dispatch: "sequential"
///
/// cache:
///   max_entries: 256
///   ttl_seconds: 3600
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct YamlConfig {
    pub providers: Option<ProvidersYaml>,
    pub synthesis: Option<SynthesisYaml>,
    pub cache: Option<CacheYaml>,
}

/// Provider chain and per-provider settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvidersYaml {
    /// Fallback order by provider name
    pub chain: Option<Vec<String>>,
    pub gemini: Option<ProviderYaml>,
    pub elevenlabs: Option<ProviderYaml>,
    pub openai: Option<ProviderYaml>,
}

/// Settings for one provider
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProviderYaml {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub base_url: Option<String>,
    pub audio_format: Option<String>,
    pub min_interval_ms: Option<u64>,
}

/// Orchestration settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SynthesisYaml {
    pub request_timeout_ms: Option<u64>,
    pub quota_reset_seconds: Option<u64>,
    /// `sequential` or `concurrent`
    pub segment_dispatch: Option<String>,
}

/// Session cache settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CacheYaml {
    pub max_entries: Option<u64>,
    pub ttl_seconds: Option<u64>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
