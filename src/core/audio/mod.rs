//! Audio decoding, WAV encoding and clip stitching.
//!
//! Everything downstream of the adapters works on 16-bit signed PCM. Clips are
//! decoded to [`DecodedAudio`], concatenated without resampling, and written
//! out as a canonical 44-byte-header WAV container.

mod decoder;
mod stitcher;
pub mod wav;

pub use decoder::{AudioDecoder, ClipDecoder};
pub use stitcher::{AudioStitcher, DEFAULT_BLOCKING_THRESHOLD, stitch_decoded};
pub use wav::{
    WAV_HEADER_SIZE, WavHeader, decode_base64_pcm, encode_wav, encode_wav_pcm_bytes,
    parse_wav_header, pcm_bytes_to_samples, samples_to_pcm_bytes,
};

use thiserror::Error;

/// Audio decoding and encoding failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AudioError {
    /// A clip's format differs from the first clip's; nothing was written.
    #[error(
        "clip {index} is {found_rate} Hz/{found_channels} ch, expected {expected_rate} Hz/{expected_channels} ch"
    )]
    MixedFormat {
        index: usize,
        expected_rate: u32,
        expected_channels: u16,
        found_rate: u32,
        found_channels: u16,
    },

    #[error("invalid WAV data: {0}")]
    InvalidWav(String),

    #[error("invalid PCM data: {0}")]
    InvalidPcm(String),

    /// Compressed encoding with no decoder attached
    #[error("no decoder available for {0}")]
    UnsupportedEncoding(String),

    #[error("decode failed: {0}")]
    Decode(String),

    /// Format or size the WAV header fields cannot express
    #[error("cannot encode WAV: {0}")]
    Encode(String),

    #[error("no clips to stitch")]
    Empty,

    #[error("stitching worker failed: {0}")]
    Worker(String),
}

/// Interleaved 16-bit samples plus their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl DecodedAudio {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Encode as a canonical WAV container.
    pub fn to_wav(&self) -> Result<bytes::Bytes, AudioError> {
        encode_wav(&self.samples, self.sample_rate, self.channels)
    }
}
