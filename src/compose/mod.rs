//! Composer
//!
//! Combines a narration track and a music track into one buffer using one of
//! two strategies:
//! - OVERLAY: music under the first and last portion of the narration,
//!   output as long as the narration
//! - CONCATENATE: music alone before and after the narration
//!
//! Composition is a pure function of its inputs. Both buffers must share a
//! sample rate and channel count; this is checked before any slicing.

mod concatenate;
mod overlay;
pub mod request;

pub use request::{CompositionRequest, OutroPlacement, Strategy};

use tracing::{info, info_span};

use crate::engine::PcmBuffer;
use crate::error::Result;

use concatenate::compose_concatenate;
use overlay::compose_overlay;

/// Compose `narration` and `music` according to `request`
///
/// # Errors
/// - `InvalidRequest` if the request breaks its own invariants
/// - `FormatMismatch` if the two buffers differ in sample rate or channel count
/// - `InvalidRange` if a window or loop cannot be satisfied (e.g. empty music)
/// - `InsufficientSource` if CONCATENATE needs a longer intro than the music has
pub fn compose(
    narration: &PcmBuffer,
    music: &PcmBuffer,
    request: &CompositionRequest,
) -> Result<PcmBuffer> {
    request.validate()?;
    narration.ensure_same_format(music)?;

    let span = info_span!("compose", strategy = %request.strategy);
    let _guard = span.enter();

    let result = match request.strategy {
        Strategy::Overlay => compose_overlay(narration, music, request)?,
        Strategy::Concatenate => compose_concatenate(narration, music, request)?,
    };

    info!(
        narration_ms = narration.duration_ms(),
        music_ms = music.duration_ms(),
        result_ms = result.duration_ms(),
        "Composition complete"
    );

    Ok(result)
}

/// A validated request bound to a reusable composer
///
/// Convenient when the same settings are applied to many episodes.
#[derive(Debug, Clone)]
pub struct Composer {
    request: CompositionRequest,
}

impl Composer {
    /// Create a composer, validating the request up front
    pub fn new(request: CompositionRequest) -> Result<Self> {
        request.validate()?;
        Ok(Self { request })
    }

    pub fn request(&self) -> &CompositionRequest {
        &self.request
    }

    /// Compose one narration/music pair
    pub fn compose(&self, narration: &PcmBuffer, music: &PcmBuffer) -> Result<PcmBuffer> {
        compose(narration, music, &self.request)
    }
}
