//! Podmix - Podcast Audio Composition Engine
//!
//! Podmix combines a spoken-word narration track with a background music
//! track into one finished episode.
//!
//! # Strategies
//!
//! - OVERLAY: music is mixed quietly under the opening and closing portion
//!   of the narration; the output is exactly as long as the narration
//! - CONCATENATE: music plays alone before and after the narration
//!
//! # Architecture
//!
//! - `engine`: the PCM buffer and codec adapters
//! - `dsp`: fades, windows and loop extension
//! - `compose`: the two strategies behind one entry point
//! - `render`: decode, compose, encode as a single unit with fallback
//!
//! ```no_run
//! use podmix::{compose, CompositionRequest, PcmBuffer};
//!
//! let narration = PcmBuffer::silence_ms(60_000, 2, 44_100)?;
//! let music = PcmBuffer::silence_ms(5_000, 2, 44_100)?;
//! let episode = compose(&narration, &music, &CompositionRequest::overlay_preset())?;
//! assert_eq!(episode.duration_ms(), 60_000);
//! # Ok::<(), podmix::PodmixError>(())
//! ```

pub mod cli;
pub mod compose;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod render;

pub use compose::{compose, Composer, CompositionRequest, OutroPlacement, Strategy};
pub use engine::{AudioCodec, AudioFormat, PcmBuffer, SymphoniaCodec, WavCodec};
pub use error::{PodmixError, Result};
pub use render::{render, FallbackPolicy, RenderInput, RenderOptions, RenderOutcome, RenderReport};
