//! PCM Buffer
//!
//! Provides the in-memory audio type for Podmix and its primitive
//! operations (slice, concatenate, gain, mix).
//!
//! A [`PcmBuffer`] is an immutable value: every operation returns a new
//! buffer and leaves its inputs untouched. Samples are 32-bit floats in the
//! representable range [-1.0, 1.0], stored per channel.

use crate::error::{PodmixError, Result};

// ============================================================================
// Constants
// ============================================================================

/// Lowest representable sample value
pub const SAMPLE_MIN: f32 = -1.0;

/// Highest representable sample value
pub const SAMPLE_MAX: f32 = 1.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude (0.0 to 1.0+ range)
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Number of whole frames covered by `ms` milliseconds at `sample_rate`
#[inline]
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    let frames = ms as u128 * sample_rate as u128 / 1000;
    usize::try_from(frames).unwrap_or(usize::MAX)
}

/// Whole milliseconds spanned by `frames` frames at `sample_rate`
#[inline]
pub fn frames_to_ms(frames: usize, sample_rate: u32) -> u64 {
    if sample_rate == 0 {
        return 0;
    }
    (frames as u128 * 1000 / sample_rate as u128) as u64
}

#[inline]
fn clip(sample: f32) -> f32 {
    if sample.is_nan() {
        return 0.0;
    }
    sample.clamp(SAMPLE_MIN, SAMPLE_MAX)
}

// ============================================================================
// PCM Buffer
// ============================================================================

/// Fully buffered PCM audio at a fixed sample rate and channel count
///
/// Stores audio as non-interleaved 32-bit floating point samples.
/// Each channel is a separate `Vec<f32>` and all channels have the same
/// number of frames.
///
/// # Example
/// ```
/// use podmix::engine::PcmBuffer;
///
/// // One second of stereo silence at 44.1kHz
/// let buffer = PcmBuffer::silence(44_100, 2, 44_100).unwrap();
/// assert_eq!(buffer.channel_count(), 2);
/// assert_eq!(buffer.duration_ms(), 1000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    /// Sample data: outer Vec is channels, inner Vec is frames
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl PcmBuffer {
    /// Create a buffer from per-channel sample data
    ///
    /// # Errors
    /// `InvalidBuffer` if there are no channels, the sample rate is zero,
    /// or the channels differ in length.
    pub fn new(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(PodmixError::InvalidBuffer {
                reason: "sample rate must be positive".to_string(),
            });
        }
        let Some(first) = samples.first() else {
            return Err(PodmixError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        };
        let frames = first.len();
        if let Some((ch, data)) = samples.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(PodmixError::InvalidBuffer {
                reason: format!(
                    "channel {} has {} frames, channel 0 has {}",
                    ch,
                    data.len(),
                    frames
                ),
            });
        }

        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Create a silent buffer with the given number of frames
    pub fn silence(num_frames: usize, channel_count: usize, sample_rate: u32) -> Result<Self> {
        Self::new(vec![vec![0.0_f32; num_frames]; channel_count], sample_rate)
    }

    /// Create a silent buffer lasting `duration_ms` milliseconds
    pub fn silence_ms(duration_ms: u64, channel_count: usize, sample_rate: u32) -> Result<Self> {
        Self::silence(
            ms_to_frames(duration_ms, sample_rate),
            channel_count,
            sample_rate,
        )
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ... for stereo)
    ///
    /// # Errors
    /// `InvalidBuffer` if the data length is not a multiple of the channel count.
    pub fn from_interleaved(
        interleaved: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(PodmixError::InvalidBuffer {
                reason: "buffer must have at least one channel".to_string(),
            });
        }

        if interleaved.len() % channel_count != 0 {
            return Err(PodmixError::InvalidBuffer {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channel_count
                ),
            });
        }

        let num_frames = interleaved.len() / channel_count;
        let mut samples = vec![Vec::with_capacity(num_frames); channel_count];

        for frame in interleaved.chunks_exact(channel_count) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::new(samples, sample_rate)
    }

    /// Convert the buffer to interleaved format
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channel_count() * self.frame_count());

        for frame_idx in 0..self.frame_count() {
            for channel in &self.samples {
                interleaved.push(channel[frame_idx]);
            }
        }

        interleaved
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no frames
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Duration in whole milliseconds
    #[inline]
    pub fn duration_ms(&self) -> u64 {
        frames_to_ms(self.frame_count(), self.sample_rate)
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Frames covered by `ms` milliseconds at this buffer's sample rate
    #[inline]
    pub fn frames_for_ms(&self, ms: u64) -> usize {
        ms_to_frames(ms, self.sample_rate)
    }

    /// Immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Iterate over all channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(Vec::as_slice)
    }

    /// Peak level in dBFS. Returns -f32::INFINITY for empty or silent buffers.
    pub fn peak_db(&self) -> f32 {
        let peak = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max);

        linear_to_db(peak)
    }

    /// RMS level in dBFS. Returns -f32::INFINITY for empty or silent buffers.
    pub fn rms_db(&self) -> f32 {
        let total_samples = self.channel_count() * self.frame_count();
        if total_samples == 0 {
            return f32::NEG_INFINITY;
        }

        let sum_squares: f64 = self
            .samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| (s as f64) * (s as f64))
            .sum();

        linear_to_db((sum_squares / total_samples as f64).sqrt() as f32)
    }

    /// Build a new buffer with the same format by mapping every sample
    ///
    /// `f` receives the frame index and the sample value.
    pub(crate) fn map_frames<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, f32) -> f32,
    {
        let samples: Vec<Vec<f32>> = self
            .samples
            .iter()
            .map(|channel| {
                channel
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| f(i, s))
                    .collect()
            })
            .collect();

        Self {
            samples,
            sample_rate: self.sample_rate,
        }
    }

    // ------------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------------

    /// Fail with `FormatMismatch` unless `other` has this buffer's rate and channel count
    pub fn ensure_same_format(&self, other: &PcmBuffer) -> Result<()> {
        if self.sample_rate != other.sample_rate || self.channel_count() != other.channel_count() {
            return Err(PodmixError::FormatMismatch {
                expected_rate: self.sample_rate,
                expected_channels: self.channel_count(),
                found_rate: other.sample_rate,
                found_channels: other.channel_count(),
            });
        }
        Ok(())
    }

    /// Extract the frames covering `[start_ms, end_ms)`
    ///
    /// `start_ms` is clamped to 0 and `end_ms` to the buffer's duration; an end
    /// at or past the duration reaches the last frame.
    ///
    /// # Errors
    /// `InvalidRange` if the clamped range is empty.
    pub fn slice(&self, start_ms: i64, end_ms: i64) -> Result<PcmBuffer> {
        let frame_count = self.frame_count();
        let start = self
            .frames_for_ms(start_ms.max(0) as u64)
            .min(frame_count);
        let end = if end_ms < 0 {
            0
        } else if end_ms as u64 >= self.duration_ms() {
            frame_count
        } else {
            self.frames_for_ms(end_ms as u64)
        };

        if start >= end {
            return Err(PodmixError::InvalidRange {
                reason: format!(
                    "slice [{} ms, {} ms) is empty in a {} ms buffer",
                    start_ms,
                    end_ms,
                    self.duration_ms()
                ),
            });
        }

        Ok(self.slice_frames(start, end))
    }

    /// Extract frames `[start, end)`; both bounds must already be valid
    pub(crate) fn slice_frames(&self, start: usize, end: usize) -> PcmBuffer {
        Self {
            samples: self
                .samples
                .iter()
                .map(|channel| channel[start..end].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// Append `other`'s frames after this buffer's frames
    ///
    /// # Errors
    /// `FormatMismatch` if sample rates or channel counts differ.
    pub fn concat(&self, other: &PcmBuffer) -> Result<PcmBuffer> {
        self.ensure_same_format(other)?;

        let samples: Vec<Vec<f32>> = self
            .samples
            .iter()
            .zip(&other.samples)
            .map(|(a, b)| {
                let mut joined = Vec::with_capacity(a.len() + b.len());
                joined.extend_from_slice(a);
                joined.extend_from_slice(b);
                joined
            })
            .collect();

        Ok(Self {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    /// Multiply every sample by `10^(db/20)`, clipping to the representable range
    pub fn apply_gain_db(&self, gain_db: f32) -> PcmBuffer {
        // Saturate so huge gains cannot turn silence into 0 * inf
        let gain_linear = db_to_linear(gain_db).min(f32::MAX);

        // Unity gain
        if gain_linear == 1.0 {
            return self.clone();
        }

        self.map_frames(|_, s| clip(s * gain_linear))
    }

    /// Add `other` on top of this buffer starting `offset_ms` in
    ///
    /// See [`PcmBuffer::mix_at`].
    pub fn mix(&self, other: &PcmBuffer, offset_ms: u64) -> Result<PcmBuffer> {
        self.mix_at(other, self.frames_for_ms(offset_ms))
    }

    /// Add `other` on top of this buffer starting at frame `offset`
    ///
    /// The result is `max(len(self), offset + len(other))` frames long.
    /// Overlapping samples are summed and clipped; regions outside the
    /// overlap are copied unchanged, and the gap between this buffer's end
    /// and a late `offset` is filled with silence.
    ///
    /// # Errors
    /// `FormatMismatch` if sample rates or channel counts differ, `InvalidRange`
    /// if `offset + len(other)` overflows.
    pub fn mix_at(&self, other: &PcmBuffer, offset: usize) -> Result<PcmBuffer> {
        self.ensure_same_format(other)?;

        let end = offset
            .checked_add(other.frame_count())
            .ok_or_else(|| PodmixError::InvalidRange {
                reason: format!("mix offset {} frames is out of range", offset),
            })?;
        let out_len = self.frame_count().max(end);
        let samples: Vec<Vec<f32>> = self
            .samples
            .iter()
            .zip(&other.samples)
            .map(|(base, over)| {
                let mut mixed = Vec::with_capacity(out_len);
                mixed.extend_from_slice(base);
                mixed.resize(out_len, 0.0);
                for (dst, &src) in mixed[offset..].iter_mut().zip(over) {
                    *dst = clip(*dst + src);
                }
                mixed
            })
            .collect();

        Ok(Self {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
