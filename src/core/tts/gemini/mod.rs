//! Gemini native audio generation.
//!
//! The `*-preview-tts` models return base64 PCM and support two-speaker
//! dialogue in a single request.

mod config;
mod provider;

pub use config::{
    DEFAULT_VOICE, GEMINI_MAX_SPEAKER_VOICES, GEMINI_SAMPLE_RATE, GeminiModel, PREBUILT_VOICES,
};
pub use provider::{GEMINI_API_BASE, GeminiTTS};
