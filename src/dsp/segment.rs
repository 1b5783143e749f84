//! Segment Extractor
//!
//! Intro/outro windows cut out of a music buffer. Unlike a raw
//! [`PcmBuffer::slice`], a window that does not fit inside the buffer is an
//! error rather than being clamped; run the loop extender first when the
//! source might be too short.

use crate::engine::PcmBuffer;
use crate::error::{PodmixError, Result};

fn check_fits(buffer: &PcmBuffer, end_ms: u64, what: &str) -> Result<()> {
    let available = buffer.duration_ms();
    if end_ms > available {
        return Err(PodmixError::InvalidRange {
            reason: format!(
                "{} window ends at {} ms but buffer is only {} ms",
                what, end_ms, available
            ),
        });
    }
    Ok(())
}

fn window_frames(buffer: &PcmBuffer, ms: u64, what: &str) -> Result<usize> {
    let frames = buffer.frames_for_ms(ms);
    if frames == 0 {
        return Err(PodmixError::InvalidRange {
            reason: format!("{} window of {} ms holds no frames", what, ms),
        });
    }
    Ok(frames)
}

// Every window is exactly `frames_for_ms(ms)` frames long, so windows cut
// from buffers with fractional durations still line up frame for frame.

/// The first `ms` milliseconds of `buffer`
pub fn intro_window(buffer: &PcmBuffer, ms: u64) -> Result<PcmBuffer> {
    check_fits(buffer, ms, "intro")?;
    let frames = window_frames(buffer, ms, "intro")?;
    Ok(buffer.slice_frames(0, frames))
}

/// The last `ms` milliseconds of `buffer`
pub fn outro_window_from_end(buffer: &PcmBuffer, ms: u64) -> Result<PcmBuffer> {
    check_fits(buffer, ms, "outro")?;
    let frames = window_frames(buffer, ms, "outro")?;
    let total = buffer.frame_count();
    Ok(buffer.slice_frames(total - frames, total))
}

/// `ms` milliseconds starting `offset_ms` into `buffer`
pub fn window_at(buffer: &PcmBuffer, offset_ms: u64, ms: u64) -> Result<PcmBuffer> {
    check_fits(buffer, offset_ms.saturating_add(ms), "offset")?;
    let frames = window_frames(buffer, ms, "offset")?;
    let start = buffer.frames_for_ms(offset_ms);
    Ok(buffer.slice_frames(start, start + frames))
}
