//! Configuration for the synthesis pipeline
//!
//! Settings come from environment variables and, optionally, a YAML file.
//! Priority: YAML > ENV vars > defaults. Loading `.env` files is left to the
//! embedding binary.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voicecast::config::SynthesisConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = SynthesisConfig::from_env()?;
//!
//! // Load from YAML file with environment variable base
//! let config = SynthesisConfig::from_file(&PathBuf::from("voicecast.yaml"))?;
//! println!("Provider chain: {:?}", config.provider_chain);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::{CacheYaml, ProviderYaml, ProvidersYaml, SynthesisYaml, YamlConfig};

use crate::core::orchestrator::SegmentDispatch;
use crate::core::tts::{ProviderKind, TTSConfig};

/// Default bound on one provider call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default quota window
pub const DEFAULT_QUOTA_RESET: Duration = Duration::from_secs(60);

/// Default artifact cache capacity
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 256;

/// Default minimum spacing between calls, per provider.
pub fn default_min_interval(kind: ProviderKind) -> Duration {
    match kind {
        ProviderKind::Gemini => Duration::from_millis(1000),
        ProviderKind::ElevenLabs | ProviderKind::OpenAI => Duration::from_millis(250),
        ProviderKind::Browser => Duration::ZERO,
    }
}

/// Synthesis pipeline configuration
///
/// Contains the credentials, models and endpoints for each provider plus the
/// orchestration knobs (chain order, timeouts, quota window, rate limits, cache).
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    // Provider credentials
    pub gemini_api_key: Option<String>,
    pub elevenlabs_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    // Model overrides (None = provider default)
    pub gemini_model: Option<String>,
    pub elevenlabs_model: Option<String>,
    pub openai_model: Option<String>,

    /// Default voice per provider
    pub default_voices: HashMap<ProviderKind, String>,
    /// API root overrides per provider
    pub base_urls: HashMap<ProviderKind, String>,
    /// Output format per provider (provider-specific names)
    pub audio_formats: HashMap<ProviderKind, String>,

    /// Ordered fallback chain
    pub provider_chain: Vec<ProviderKind>,
    /// Bound on one provider call
    pub request_timeout: Duration,
    /// How long a quota-exhausted provider is skipped
    pub quota_reset: Duration,
    /// Minimum spacing between calls, per provider
    pub min_intervals: HashMap<ProviderKind, Duration>,

    // Session cache
    pub cache_max_entries: u64,
    pub cache_ttl: Option<Duration>,

    /// Per-segment dispatch mode for single-voice providers
    pub segment_dispatch: SegmentDispatch,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            elevenlabs_api_key: None,
            openai_api_key: None,
            gemini_model: None,
            elevenlabs_model: None,
            openai_model: None,
            default_voices: HashMap::new(),
            base_urls: HashMap::new(),
            audio_formats: HashMap::new(),
            provider_chain: ProviderKind::DEFAULT_CHAIN.to_vec(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            quota_reset: DEFAULT_QUOTA_RESET,
            min_intervals: ProviderKind::DEFAULT_CHAIN
                .iter()
                .map(|&kind| (kind, default_min_interval(kind)))
                .collect(),
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_ttl: None,
            segment_dispatch: SegmentDispatch::Sequential,
        }
    }
}

/// Zeroize API keys when the configuration is dropped.
impl Drop for SynthesisConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.gemini_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.elevenlabs_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl SynthesisConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults. Fails when a variable has an
    /// invalid format or the result does not validate.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file on top of the environment
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Check invariants: non-empty chain, non-zero timeout.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate(self)
    }

    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.gemini_api_key.as_deref(),
            ProviderKind::ElevenLabs => self.elevenlabs_api_key.as_deref(),
            ProviderKind::OpenAI => self.openai_api_key.as_deref(),
            ProviderKind::Browser => None,
        }
    }

    pub fn model(&self, kind: ProviderKind) -> Option<&str> {
        match kind {
            ProviderKind::Gemini => self.gemini_model.as_deref(),
            ProviderKind::ElevenLabs => self.elevenlabs_model.as_deref(),
            ProviderKind::OpenAI => self.openai_model.as_deref(),
            ProviderKind::Browser => None,
        }
    }

    /// Adapter settings for one provider.
    pub fn tts_config_for(&self, kind: ProviderKind) -> TTSConfig {
        TTSConfig {
            provider: kind.as_str().to_string(),
            api_key: self.api_key(kind).unwrap_or_default().to_string(),
            model: self.model(kind).unwrap_or_default().to_string(),
            voice_id: self.default_voices.get(&kind).cloned(),
            audio_format: self.audio_formats.get(&kind).cloned(),
            speaking_rate: None,
            base_url: self.base_urls.get(&kind).cloned(),
        }
    }
}
