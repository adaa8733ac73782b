//! RIFF/WAVE container writing and header parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{BufMut, Bytes, BytesMut};

use super::AudioError;

/// Canonical header size: RIFF descriptor (12) + `fmt ` (24) + `data` header (8).
pub const WAV_HEADER_SIZE: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const FORMAT_PCM: u16 = 1;
const FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Most channels a 16-bit frame can carry before `block_align` overflows.
pub const MAX_CHANNELS: u16 = u16::MAX / (BITS_PER_SAMPLE / 8);

/// Largest sample payload the 32-bit RIFF size field can describe.
pub const MAX_DATA_LEN: usize = (u32::MAX - 36) as usize;

/// Encode 16-bit samples as a WAV file.
///
/// # Errors
/// [`AudioError::Encode`] when the format or payload size cannot be expressed
/// in the canonical header.
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Bytes, AudioError> {
    let data_len = samples
        .len()
        .checked_mul(2)
        .ok_or_else(|| AudioError::Encode("sample count overflows".into()))?;
    let fields = HeaderFields::new(sample_rate, channels, data_len)?;
    let mut out = BytesMut::with_capacity(WAV_HEADER_SIZE + data_len);
    fields.put(&mut out);
    for sample in samples {
        out.put_i16_le(*sample);
    }
    Ok(out.freeze())
}

/// Wrap already little-endian 16-bit PCM bytes in a WAV header.
pub fn encode_wav_pcm_bytes(pcm: &[u8], sample_rate: u32, channels: u16) -> Result<Bytes, AudioError> {
    let fields = HeaderFields::new(sample_rate, channels, pcm.len())?;
    let mut out = BytesMut::with_capacity(WAV_HEADER_SIZE + pcm.len());
    fields.put(&mut out);
    out.put_slice(pcm);
    Ok(out.freeze())
}

/// Validate a format against the header field widths.
pub(crate) fn check_format(sample_rate: u32, channels: u16) -> Result<(u16, u32), AudioError> {
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(AudioError::Encode(format!(
            "{channels} channels (supported: 1..={MAX_CHANNELS})"
        )));
    }
    let block_align = channels * (BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| {
            AudioError::Encode(format!(
                "byte rate overflows at {sample_rate} Hz, {channels} channels"
            ))
        })?;
    Ok((block_align, byte_rate))
}

struct HeaderFields {
    sample_rate: u32,
    channels: u16,
    block_align: u16,
    byte_rate: u32,
    data_len: u32,
}

impl HeaderFields {
    fn new(sample_rate: u32, channels: u16, data_len: usize) -> Result<Self, AudioError> {
        let (block_align, byte_rate) = check_format(sample_rate, channels)?;
        if data_len > MAX_DATA_LEN {
            return Err(AudioError::Encode(format!(
                "{data_len} data bytes exceed the RIFF size limit"
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            block_align,
            byte_rate,
            data_len: data_len as u32,
        })
    }

    fn put(&self, out: &mut BytesMut) {
        // RIFF descriptor
        out.put_slice(b"RIFF");
        out.put_u32_le(36 + self.data_len);
        out.put_slice(b"WAVE");

        // fmt subchunk
        out.put_slice(b"fmt ");
        out.put_u32_le(16);
        out.put_u16_le(FORMAT_PCM);
        out.put_u16_le(self.channels);
        out.put_u32_le(self.sample_rate);
        out.put_u32_le(self.byte_rate);
        out.put_u16_le(self.block_align);
        out.put_u16_le(BITS_PER_SAMPLE);

        // data subchunk
        out.put_slice(b"data");
        out.put_u32_le(self.data_len);
    }
}

/// Parsed `fmt ` fields plus the location of the sample data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Offset of the first sample byte
    pub data_offset: usize,
    /// Sample bytes actually present (a streamed header may over-declare)
    pub data_len: usize,
}

impl WavHeader {
    /// Integer PCM (plain or extensible) at 16 bits.
    pub fn is_pcm16(&self) -> bool {
        matches!(self.audio_format, FORMAT_PCM | FORMAT_EXTENSIBLE)
            && self.bits_per_sample == BITS_PER_SAMPLE
    }

    pub fn data<'a>(&self, wav: &'a [u8]) -> &'a [u8] {
        &wav[self.data_offset..self.data_offset + self.data_len]
    }
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Walk the RIFF chunks and return the format and data location.
///
/// Unknown chunks (`LIST`, `fact`, ...) are skipped. A `data` size larger than
/// the remaining bytes is clamped, which covers streamed WAVs that write
/// `0xFFFFFFFF` as the size.
pub fn parse_wav_header(wav: &[u8]) -> Result<WavHeader, AudioError> {
    if wav.len() < 12 || &wav[0..4] != b"RIFF" || &wav[8..12] != b"WAVE" {
        return Err(AudioError::InvalidWav("missing RIFF/WAVE signature".into()));
    }

    let mut offset = 12;
    let mut format: Option<(u16, u16, u32, u32, u16, u16)> = None;

    while offset + 8 <= wav.len() {
        let id = &wav[offset..offset + 4];
        let size = read_u32(wav, offset + 4) as usize;
        let body = offset + 8;

        match id {
            b"fmt " => {
                if size < 16 || body + 16 > wav.len() {
                    return Err(AudioError::InvalidWav("truncated fmt chunk".into()));
                }
                format = Some((
                    read_u16(wav, body),
                    read_u16(wav, body + 2),
                    read_u32(wav, body + 4),
                    read_u32(wav, body + 8),
                    read_u16(wav, body + 12),
                    read_u16(wav, body + 14),
                ));
            }
            b"data" => {
                let Some((audio_format, channels, sample_rate, byte_rate, block_align, bits)) =
                    format
                else {
                    return Err(AudioError::InvalidWav("data chunk before fmt chunk".into()));
                };
                if channels == 0 || sample_rate == 0 {
                    return Err(AudioError::InvalidWav(format!(
                        "invalid format: {sample_rate} Hz, {channels} channels"
                    )));
                }
                return Ok(WavHeader {
                    audio_format,
                    channels,
                    sample_rate,
                    byte_rate,
                    block_align,
                    bits_per_sample: bits,
                    data_offset: body,
                    data_len: size.min(wav.len() - body),
                });
            }
            _ => {}
        }

        // chunks are word aligned
        offset = body.saturating_add(size).saturating_add(size & 1);
    }

    Err(AudioError::InvalidWav("no data chunk".into()))
}

/// Little-endian 16-bit PCM bytes to samples.
pub fn pcm_bytes_to_samples(pcm: &[u8]) -> Result<Vec<i16>, AudioError> {
    if pcm.len() % 2 != 0 {
        return Err(AudioError::InvalidPcm(format!(
            "odd byte count {} for 16-bit samples",
            pcm.len()
        )));
    }
    Ok(pcm
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

pub fn samples_to_pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Decode a base64 PCM payload as returned inline by JSON APIs.
pub fn decode_base64_pcm(encoded: &str) -> Result<Vec<u8>, AudioError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| AudioError::Decode(format!("invalid base64 audio: {e}")))
}
