use bytes::Bytes;
use tracing::debug;

use super::decoder::ClipDecoder;
use super::wav::encode_wav;
use super::{AudioError, DecodedAudio};
use crate::core::tts::RawAudioClip;

/// Payload size above which stitching moves to the blocking pool (1 MiB).
pub const DEFAULT_BLOCKING_THRESHOLD: usize = 1024 * 1024;

/// Concatenates segment clips into one WAV.
///
/// No resampling, cross-fade or inserted silence: every clip must share the
/// first clip's sample rate and channel count.
#[derive(Clone)]
pub struct AudioStitcher {
    decoder: ClipDecoder,
    blocking_threshold: usize,
}

impl Default for AudioStitcher {
    fn default() -> Self {
        Self::new(ClipDecoder::default())
    }
}

impl AudioStitcher {
    pub fn new(decoder: ClipDecoder) -> Self {
        Self {
            decoder,
            blocking_threshold: DEFAULT_BLOCKING_THRESHOLD,
        }
    }

    pub fn with_blocking_threshold(mut self, bytes: usize) -> Self {
        self.blocking_threshold = bytes;
        self
    }

    /// Decode one clip and wrap it as WAV.
    pub fn encode_single(&self, clip: &RawAudioClip) -> Result<Bytes, AudioError> {
        self.decoder.decode(clip)?.to_wav()
    }

    /// Decode and concatenate `clips` in order.
    ///
    /// Fails with [`AudioError::MixedFormat`] on the first clip whose format
    /// differs, before the output buffer is allocated.
    pub fn stitch(&self, clips: &[RawAudioClip]) -> Result<Bytes, AudioError> {
        let mut decoded = Vec::with_capacity(clips.len());
        for (index, clip) in clips.iter().enumerate() {
            let audio = self.decoder.decode(clip)?;
            if let Some(first) = decoded.first() {
                check_format(first, &audio, index)?;
            }
            decoded.push(audio);
        }
        stitch_decoded(&decoded)
    }

    /// [`stitch`](Self::stitch), moved to the blocking pool for large payloads.
    pub async fn stitch_async(&self, clips: Vec<RawAudioClip>) -> Result<Bytes, AudioError> {
        let total: usize = clips.iter().map(|c| c.data.len()).sum();
        if total < self.blocking_threshold {
            return self.stitch(&clips);
        }

        debug!(clips = clips.len(), bytes = total, "Stitching on blocking pool");
        let stitcher = self.clone();
        tokio::task::spawn_blocking(move || stitcher.stitch(&clips))
            .await
            .map_err(|e| AudioError::Worker(e.to_string()))?
    }
}

fn check_format(first: &DecodedAudio, clip: &DecodedAudio, index: usize) -> Result<(), AudioError> {
    if first.sample_rate != clip.sample_rate || first.channels != clip.channels {
        return Err(AudioError::MixedFormat {
            index,
            expected_rate: first.sample_rate,
            expected_channels: first.channels,
            found_rate: clip.sample_rate,
            found_channels: clip.channels,
        });
    }
    Ok(())
}

/// Concatenate already decoded clips into one WAV.
///
/// Every clip must hold whole frames so channel interleaving survives the
/// concatenation.
pub fn stitch_decoded(clips: &[DecodedAudio]) -> Result<Bytes, AudioError> {
    let Some(first) = clips.first() else {
        return Err(AudioError::Empty);
    };
    for (index, clip) in clips.iter().enumerate() {
        check_format(first, clip, index)?;
        if clip.channels == 0 || clip.samples.len() % usize::from(clip.channels) != 0 {
            return Err(AudioError::InvalidPcm(format!(
                "clip {index}: {} samples do not fill whole {}-channel frames",
                clip.samples.len(),
                clip.channels
            )));
        }
    }

    let total: usize = clips.iter().map(|c| c.samples.len()).sum();
    let mut samples = Vec::with_capacity(total);
    for clip in clips {
        samples.extend_from_slice(&clip.samples);
    }

    debug!(
        clips = clips.len(),
        samples = total,
        sample_rate = first.sample_rate,
        "Stitched clips"
    );
    encode_wav(&samples, first.sample_rate, first.channels)
}
