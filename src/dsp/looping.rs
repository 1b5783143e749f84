//! Loop Extender
//!
//! Lengthens a buffer to at least a target duration by repeatedly
//! concatenating it with itself.

use tracing::debug;

use crate::engine::PcmBuffer;
use crate::error::{PodmixError, Result};

/// Extend `buffer` until it lasts at least `target_ms` milliseconds
///
/// The buffer is doubled (`buffer ++ buffer`) rather than tiled by an exact
/// repeat count, and the result is not trimmed back to `target_ms`: callers
/// needing an exact length slice afterwards. A buffer that is already long
/// enough is returned as-is.
///
/// # Errors
/// `InvalidRange` if the buffer has no frames and `target_ms` is non-zero,
/// since doubling would never terminate.
pub fn extend_to_at_least(buffer: &PcmBuffer, target_ms: u64) -> Result<PcmBuffer> {
    if buffer.duration_ms() >= target_ms {
        return Ok(buffer.clone());
    }

    if buffer.is_empty() {
        return Err(PodmixError::InvalidRange {
            reason: format!("cannot loop an empty buffer up to {} ms", target_ms),
        });
    }

    let mut extended = buffer.concat(buffer)?;
    let mut doublings = 1;
    while extended.duration_ms() < target_ms {
        extended = extended.concat(&extended)?;
        doublings += 1;
    }

    debug!(
        source_ms = buffer.duration_ms(),
        target_ms,
        result_ms = extended.duration_ms(),
        doublings,
        "Extended buffer by doubling"
    );

    Ok(extended)
}
