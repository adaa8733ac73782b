//! Audio Test Fixtures
//!
//! Programmatically generated 16-bit PCM so the tests need no audio files.

#![allow(dead_code)]

use voicecast::core::audio::samples_to_pcm_bytes;
use voicecast::core::tts::RawAudioClip;

/// Native output rate of the HTTP providers
pub const SAMPLE_RATE: u32 = 24_000;

/// A ramp that never repeats within `len` samples, so misplaced bytes show up.
pub fn ramp(len: usize, offset: i16) -> Vec<i16> {
    (0..len)
        .map(|i| offset.wrapping_add((i % 30_000) as i16))
        .collect()
}

/// `len` copies of `value`
pub fn constant(len: usize, value: i16) -> Vec<i16> {
    vec![value; len]
}

/// Headerless mono PCM clip
pub fn pcm_clip(samples: &[i16], sample_rate: u32) -> RawAudioClip {
    RawAudioClip::pcm16(samples_to_pcm_bytes(samples), sample_rate, 1)
}

/// Route library logs to the test output; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
