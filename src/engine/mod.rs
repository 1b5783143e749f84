//! Audio Engine Module
//!
//! Core audio types shared by the composer:
//! - PCM buffer and its primitives
//! - Codec adapters for encoded files

pub mod buffer;
pub mod codec;

pub use buffer::{db_to_linear, frames_to_ms, linear_to_db, ms_to_frames, PcmBuffer};
pub use codec::{AudioCodec, AudioFormat, SymphoniaCodec, WavCodec};
