use std::io::Cursor;
use std::sync::Arc;

use tracing::debug;

use super::wav::{check_format, parse_wav_header, pcm_bytes_to_samples};
use super::{AudioError, DecodedAudio};
use crate::core::tts::{AudioEncoding, RawAudioClip};

/// Decoder for compressed payloads (MP3, Opus, AAC, FLAC).
///
/// Supplied by the embedding application; the built-in [`ClipDecoder`] only
/// understands raw PCM and WAV.
pub trait AudioDecoder: Send + Sync {
    fn decode(&self, encoding: AudioEncoding, data: &[u8]) -> Result<DecodedAudio, AudioError>;
}

/// Turns any [`RawAudioClip`] into 16-bit samples.
#[derive(Clone, Default)]
pub struct ClipDecoder {
    compressed: Option<Arc<dyn AudioDecoder>>,
}

impl ClipDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compressed_decoder(decoder: Arc<dyn AudioDecoder>) -> Self {
        Self {
            compressed: Some(decoder),
        }
    }

    /// Decode a clip into whole interleaved frames.
    ///
    /// # Errors
    /// PCM payloads must hold a whole number of frames. Every decoded format
    /// must fit a 16-bit WAV header.
    pub fn decode(&self, clip: &RawAudioClip) -> Result<DecodedAudio, AudioError> {
        let decoded = match clip.encoding {
            AudioEncoding::Pcm16Le => {
                if clip.channels == 0 || clip.sample_rate == 0 {
                    return Err(AudioError::InvalidPcm(format!(
                        "invalid format: {} Hz, {} channels",
                        clip.sample_rate, clip.channels
                    )));
                }
                let samples = pcm_bytes_to_samples(&clip.data)?;
                DecodedAudio::new(clip.sample_rate, clip.channels, samples)
            }
            AudioEncoding::Wav => decode_wav(&clip.data)?,
            other => match &self.compressed {
                Some(decoder) => decoder.decode(other, &clip.data)?,
                None => return Err(AudioError::UnsupportedEncoding(other.to_string())),
            },
        };

        check_format(decoded.sample_rate, decoded.channels)?;
        let channels = usize::from(decoded.channels);
        if decoded.samples.len() % channels != 0 {
            return Err(AudioError::InvalidPcm(format!(
                "{} samples do not fill whole {channels}-channel frames",
                decoded.samples.len()
            )));
        }
        Ok(decoded)
    }
}

/// 16-bit PCM WAVs are read directly; other sample formats go through hound.
///
/// A trailing partial frame (common in truncated streams) is dropped.
fn decode_wav(data: &[u8]) -> Result<DecodedAudio, AudioError> {
    let header = parse_wav_header(data)?;
    let channels = usize::from(header.channels);
    if header.is_pcm16() {
        let samples = pcm_bytes_to_samples(trim_partial_frame(header.data(data), channels * 2))?;
        return Ok(DecodedAudio::new(header.sample_rate, header.channels, samples));
    }

    debug!(
        audio_format = header.audio_format,
        bits = header.bits_per_sample,
        "Converting non-16-bit WAV"
    );
    let reader = hound::WavReader::new(Cursor::new(data))
        .map_err(|e| AudioError::InvalidWav(e.to_string()))?;
    let spec = reader.spec();

    let mut samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16))
            .collect::<Result<Vec<_>, _>>(),
        hound::SampleFormat::Int => {
            let shift = u32::from(spec.bits_per_sample.saturating_sub(16));
            let widen = u32::from(16u16.saturating_sub(spec.bits_per_sample));
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| ((v >> shift) << widen) as i16))
                .collect::<Result<Vec<_>, _>>()
        }
    }
    .map_err(|e| AudioError::Decode(e.to_string()))?;
    samples.truncate(samples.len() - samples.len() % usize::from(spec.channels.max(1)));

    Ok(DecodedAudio::new(spec.sample_rate, spec.channels, samples))
}

fn trim_partial_frame(data: &[u8], frame_width: usize) -> &[u8] {
    &data[..data.len() - data.len() % frame_width]
}
