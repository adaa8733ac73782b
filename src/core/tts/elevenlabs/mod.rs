//! ElevenLabs text-to-speech adapter.
//!
//! Accepts premade voice names (`Rachel`, `Adam`, ...) or raw voice ids, and
//! requests headerless PCM so segment clips stitch losslessly.

mod config;
mod provider;

pub use config::{DEFAULT_VOICE_ID, ElevenLabsModel, ElevenLabsOutputFormat, PREMADE_VOICES};
pub use provider::{ELEVENLABS_API_BASE, ELEVENLABS_TTS_URL, ElevenLabsTTS};
