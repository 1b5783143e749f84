//! Codec adapters
//!
//! The engine never parses or produces encoded audio itself. It depends on
//! the [`AudioCodec`] capability to turn bytes into a [`PcmBuffer`] and back.
//!
//! Two adapters are provided:
//! - [`WavCodec`]: WAV in and out via `hound`
//! - [`SymphoniaCodec`]: MP3/FLAC/OGG/WAV in via `symphonia`, WAV out
//!
//! All decoded audio is 32-bit float in [-1.0, 1.0].

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use symphonia::core::audio::{SampleBuffer, SignalSpec};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::engine::buffer::PcmBuffer;
use crate::error::{PodmixError, Result};

// ============================================================================
// Audio Format
// ============================================================================

/// Container/codec hint for decode and encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioFormat {
    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// MIME type used when uploading encoded output
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
        }
    }

    /// Guess the format from a file's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| PodmixError::UnsupportedFormat {
                format: format!("no file extension on {}", path.display()),
            })?
            .parse()
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = PodmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "flac" => Ok(AudioFormat::Flac),
            "ogg" | "oga" => Ok(AudioFormat::Ogg),
            other => Err(PodmixError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

// ============================================================================
// Codec capability
// ============================================================================

/// Decode encoded bytes to PCM and encode PCM back to bytes
pub trait AudioCodec: Send + Sync {
    /// Decode a complete encoded file held in memory
    fn decode(&self, bytes: &[u8], format: AudioFormat) -> Result<PcmBuffer>;

    /// Encode a buffer to a complete file
    ///
    /// `bitrate_kbps` is a hint for lossy formats; PCM containers ignore it.
    fn encode(
        &self,
        buffer: &PcmBuffer,
        format: AudioFormat,
        bitrate_kbps: Option<u32>,
    ) -> Result<Vec<u8>>;
}

// ============================================================================
// WAV (hound)
// ============================================================================

/// WAV codec backed by `hound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavCodec {
    /// Output bit depth: 16, 24, or 32 (float)
    bit_depth: u16,
}

impl Default for WavCodec {
    fn default() -> Self {
        Self::cd_quality()
    }
}

impl WavCodec {
    /// Create a WAV codec writing the given bit depth
    ///
    /// # Errors
    /// `UnsupportedFormat` unless `bit_depth` is 16, 24, or 32.
    pub fn new(bit_depth: u16) -> Result<Self> {
        match bit_depth {
            16 | 24 | 32 => Ok(Self { bit_depth }),
            _ => Err(PodmixError::UnsupportedFormat {
                format: format!("{}-bit audio (only 16, 24, 32 supported)", bit_depth),
            }),
        }
    }

    /// 16-bit output
    pub fn cd_quality() -> Self {
        Self { bit_depth: 16 }
    }

    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }
}

impl AudioCodec for WavCodec {
    fn decode(&self, bytes: &[u8], format: AudioFormat) -> Result<PcmBuffer> {
        if format != AudioFormat::Wav {
            return Err(PodmixError::UnsupportedFormat {
                format: format!("{} decoding (WAV codec)", format),
            });
        }

        let reader = WavReader::new(Cursor::new(bytes))
            .map_err(|e| PodmixError::decode("Failed to open WAV data", e))?;

        let spec = reader.spec();
        let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;

        debug!(
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            frames = samples.len() / spec.channels.max(1) as usize,
            "Decoded WAV"
        );

        PcmBuffer::from_interleaved(&samples, spec.channels as usize, spec.sample_rate)
    }

    fn encode(
        &self,
        buffer: &PcmBuffer,
        format: AudioFormat,
        _bitrate_kbps: Option<u32>,
    ) -> Result<Vec<u8>> {
        if format != AudioFormat::Wav {
            return Err(PodmixError::UnsupportedFormat {
                format: format!("{} encoding (only WAV output is available)", format),
            });
        }

        let spec = WavSpec {
            channels: buffer.channel_count() as u16,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: self.bit_depth,
            sample_format: if self.bit_depth == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec)
                .map_err(|e| PodmixError::encode("Failed to start WAV stream", e))?;

            let interleaved = buffer.to_interleaved();
            let written = match self.bit_depth {
                16 => interleaved.iter().try_for_each(|&sample| {
                    writer.write_sample((sample * 32767.0).clamp(-32768.0, 32767.0) as i16)
                }),
                // 24-bit stored as i32 in hound
                24 => interleaved.iter().try_for_each(|&sample| {
                    writer.write_sample((sample * 8388607.0).clamp(-8388608.0, 8388607.0) as i32)
                }),
                _ => interleaved
                    .iter()
                    .try_for_each(|&sample| writer.write_sample(sample)),
            };
            written.map_err(|e| PodmixError::encode("Failed to write WAV samples", e))?;

            writer
                .finalize()
                .map_err(|e| PodmixError::encode("Failed to finalize WAV stream", e))?;
        }

        Ok(cursor.into_inner())
    }
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let samples: std::result::Result<Vec<f32>, hound::Error> = match (sample_format, bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().collect(),
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect(),
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect(),
        // 24-bit stored as i32 in hound
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8388608.0))
            .collect(),
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2147483648.0))
            .collect(),
        (SampleFormat::Int, bits) => {
            return Err(PodmixError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits),
            })
        }
    };

    samples.map_err(|e| {
        PodmixError::decode(format!("Failed to read {}-bit samples", bits_per_sample), e)
    })
}

// ============================================================================
// Compressed formats (symphonia)
// ============================================================================

/// Decoder for MP3, FLAC, OGG/Vorbis and WAV backed by `symphonia`
///
/// Encoding is delegated to an inner [`WavCodec`]; there is no compressed
/// encoder, so only WAV output is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaCodec {
    wav: WavCodec,
}

impl SymphoniaCodec {
    /// Create a codec that writes WAV output with `wav`
    pub fn new(wav: WavCodec) -> Self {
        Self { wav }
    }
}

impl AudioCodec for SymphoniaCodec {
    fn decode(&self, bytes: &[u8], format: AudioFormat) -> Result<PcmBuffer> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let mut hint = Hint::new();
        hint.with_extension(format.extension());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| PodmixError::decode(format!("Failed to probe {} data", format), e))?;
        let mut reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| PodmixError::Decode {
                reason: "No audio track found".to_string(),
                source: None,
            })?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| PodmixError::decode("Failed to create decoder", e))?;

        let mut sample_rate = codec_params.sample_rate;
        let mut channels = codec_params.channels.map(|c| c.count());
        let mut interleaved = Vec::new();
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(PodmixError::decode("Failed to read packet", e)),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt frame: skip it and keep going
                Err(SymphoniaError::DecodeError(reason)) => {
                    warn!(reason, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(PodmixError::decode("Failed to decode packet", e)),
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count());

            let capacity = decoded.capacity();
            if sample_buf.as_ref().is_some_and(|buf| !holds_frames(buf, capacity, spec)) {
                sample_buf = None;
            }
            let buf = sample_buf.get_or_insert_with(|| SampleBuffer::new(capacity as u64, spec));
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }

        let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
            return Err(PodmixError::Decode {
                reason: "Stream does not declare a sample rate or channel layout".to_string(),
                source: None,
            });
        };

        debug!(
            %format,
            sample_rate,
            channels,
            frames = interleaved.len() / channels.max(1),
            "Decoded audio"
        );

        PcmBuffer::from_interleaved(&interleaved, channels, sample_rate)
    }

    fn encode(
        &self,
        buffer: &PcmBuffer,
        format: AudioFormat,
        bitrate_kbps: Option<u32>,
    ) -> Result<Vec<u8>> {
        self.wav.encode(buffer, format, bitrate_kbps)
    }
}

/// Whether `buf` has room for `frames` frames of `spec`
///
/// `SampleBuffer::capacity` counts samples, decoded buffers count frames.
fn holds_frames(buf: &SampleBuffer<f32>, frames: usize, spec: SignalSpec) -> bool {
    buf.capacity() >= frames * spec.channels.count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn test_tone(frames: usize, sample_rate: u32) -> PcmBuffer {
        let angular = 2.0 * std::f32::consts::PI * 440.0 / sample_rate as f32;
        let left: Vec<f32> = (0..frames).map(|i| 0.5 * (angular * i as f32).sin()).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        PcmBuffer::new(vec![left, right], sample_rate).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("MP3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!(
            AudioFormat::from_path(Path::new("/tmp/episode.wav")).unwrap(),
            AudioFormat::Wav
        );
        assert!(AudioFormat::from_path(Path::new("/tmp/episode")).is_err());
        assert!(matches!(
            "aiff".parse::<AudioFormat>(),
            Err(PodmixError::UnsupportedFormat { .. })
        ));
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
    }

    #[test]
    fn test_wav_16_bit_roundtrip() {
        let codec = WavCodec::cd_quality();
        let original = test_tone(4_410, 44_100);

        let bytes = codec.encode(&original, AudioFormat::Wav, None).unwrap();
        let decoded = codec.decode(&bytes, AudioFormat::Wav).unwrap();

        assert_eq!(decoded.sample_rate(), 44_100);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), original.frame_count());
        for (a, b) in original.channel(1).iter().zip(decoded.channel(1)) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_wav_24_bit_roundtrip() {
        let codec = WavCodec::new(24).unwrap();
        let original = test_tone(1_000, 48_000);

        let bytes = codec.encode(&original, AudioFormat::Wav, Some(128)).unwrap();
        let decoded = codec.decode(&bytes, AudioFormat::Wav).unwrap();

        for (a, b) in original.channel(0).iter().zip(decoded.channel(0)) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_wav_float_roundtrip_is_exact() {
        let codec = WavCodec::new(32).unwrap();
        let original = test_tone(500, 22_050);

        let bytes = codec.encode(&original, AudioFormat::Wav, None).unwrap();
        assert_eq!(codec.decode(&bytes, AudioFormat::Wav).unwrap(), original);
    }

    #[test]
    fn test_wav_rejects_bad_bit_depth() {
        assert!(WavCodec::new(12).is_err());
    }

    #[test]
    fn test_wav_rejects_other_formats() {
        let codec = WavCodec::default();
        let buffer = test_tone(10, 44_100);
        assert!(matches!(
            codec.encode(&buffer, AudioFormat::Mp3, Some(128)),
            Err(PodmixError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            codec.decode(&[0u8; 16], AudioFormat::Flac),
            Err(PodmixError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_wav_garbage_is_decode_error() {
        let result = WavCodec::default().decode(b"definitely not a wav file", AudioFormat::Wav);
        assert!(matches!(result, Err(PodmixError::Decode { .. })));
    }

    #[test]
    fn test_symphonia_decodes_wav() {
        let original = test_tone(2_205, 44_100);
        let bytes = WavCodec::cd_quality()
            .encode(&original, AudioFormat::Wav, None)
            .unwrap();

        let decoded = SymphoniaCodec::default()
            .decode(&bytes, AudioFormat::Wav)
            .unwrap();

        assert_eq!(decoded.sample_rate(), 44_100);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), original.frame_count());
        for (a, b) in original.channel(0).iter().zip(decoded.channel(0)) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_sample_buffer_capacity_counts_all_channels() {
        use symphonia::core::audio::Channels;

        let stereo = SignalSpec::new(44_100, Channels::FRONT_LEFT | Channels::FRONT_RIGHT);
        let buf = SampleBuffer::<f32>::new(1_024, stereo);

        assert!(holds_frames(&buf, 1_024, stereo));
        // 1500 stereo frames need 3000 samples, more than the 2048 available
        assert!(!holds_frames(&buf, 1_500, stereo));
    }

    #[test]
    fn test_symphonia_garbage_is_decode_error() {
        let result = SymphoniaCodec::default().decode(&[0x42; 256], AudioFormat::Mp3);
        assert!(matches!(result, Err(PodmixError::Decode { .. })));
    }
}
