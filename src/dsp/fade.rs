//! Fade Envelope
//!
//! Linear gain ramps applied at one end of a buffer.

use serde::{Deserialize, Serialize};

use crate::engine::PcmBuffer;

/// Which end of the buffer the ramp is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeDirection {
    /// Ramp 0 -> 1 over the first frames
    In,
    /// Ramp 1 -> 0 over the last frames
    Out,
}

/// A linear fade of a given length
///
/// Durations longer than the buffer are clamped so the ramp spans the whole
/// buffer; short clips still fade instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fade {
    pub direction: FadeDirection,
    pub duration_ms: u64,
}

impl Fade {
    pub fn fade_in(duration_ms: u64) -> Self {
        Self {
            direction: FadeDirection::In,
            duration_ms,
        }
    }

    pub fn fade_out(duration_ms: u64) -> Self {
        Self {
            direction: FadeDirection::Out,
            duration_ms,
        }
    }

    /// Gain at position `index` within an `n`-frame ramp
    ///
    /// Fade-in starts at 0 and fade-out ends at 0; the two curves mirror each other.
    #[inline]
    pub fn gain_at(&self, index: usize, n: usize) -> f32 {
        let t = index as f32 / n as f32;
        match self.direction {
            FadeDirection::In => t,
            FadeDirection::Out => 1.0 - (index + 1) as f32 / n as f32,
        }
    }

    /// Return a copy of `buffer` with the ramp applied
    pub fn apply(&self, buffer: &PcmBuffer) -> PcmBuffer {
        let total = buffer.frame_count();
        let ramp = buffer.frames_for_ms(self.duration_ms).min(total);
        if ramp == 0 {
            return buffer.clone();
        }

        match self.direction {
            FadeDirection::In => buffer.map_frames(|i, s| {
                if i < ramp {
                    s * self.gain_at(i, ramp)
                } else {
                    s
                }
            }),
            FadeDirection::Out => {
                let start = total - ramp;
                buffer.map_frames(|i, s| {
                    if i >= start {
                        s * self.gain_at(i - start, ramp)
                    } else {
                        s
                    }
                })
            }
        }
    }
}

/// Ramp the first `duration_ms` of `buffer` from silence to full level
pub fn fade_in(buffer: &PcmBuffer, duration_ms: u64) -> PcmBuffer {
    Fade::fade_in(duration_ms).apply(buffer)
}

/// Ramp the last `duration_ms` of `buffer` from full level to silence
pub fn fade_out(buffer: &PcmBuffer, duration_ms: u64) -> PcmBuffer {
    Fade::fade_out(duration_ms).apply(buffer)
}
