//! OpenAI speech adapter.
//!
//! Uses the Audio Speech API (`tts-1`, `tts-1-hd`, `gpt-4o-mini-tts`). Clips are
//! requested as raw PCM (24 kHz, 16-bit, mono) so they stitch without a codec.
//!
//! # Example
//!
//! ```rust,ignore
//! use voicecast::core::tts::{OpenAITTS, SpeechAdapter, TTSConfig, VoiceConfig};
//!
//! let tts = OpenAITTS::new(TTSConfig {
//!     api_key: "sk-...".to_string(),
//!     model: "tts-1-hd".to_string(),
//!     ..Default::default()
//! })?;
//! let clip = tts.synthesize("Hello, world!", &VoiceConfig::single("nova")).await?;
//! ```

mod config;
mod provider;

pub use config::{OPENAI_SAMPLE_RATE, OpenAIModel, OpenAIResponseFormat, OpenAIVoice};
pub use provider::{OPENAI_API_BASE, OPENAI_TTS_URL, OpenAITTS};
