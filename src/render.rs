//! Render Unit
//!
//! Decode narration and music, compose, encode: one synchronous unit per
//! episode. When the music side fails the caller may choose to ship the
//! narration on its own; the report then says so instead of claiming a mix.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::compose::{compose, CompositionRequest, Strategy};
use crate::engine::{AudioCodec, AudioFormat, PcmBuffer};
use crate::error::{PodmixError, Result};

/// Default output bitrate hint for lossy formats (kbps)
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Default prefix for rendered artifact names
pub const ARTIFACT_PREFIX: &str = "processed_";

// ============================================================================
// Options
// ============================================================================

/// What to do when the music cannot be used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Propagate the error
    #[default]
    Fail,
    /// Re-encode the narration unchanged and report the substitution
    NarrationOnly,
}

impl FromStr for FallbackPolicy {
    type Err = PodmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "fail" => Ok(FallbackPolicy::Fail),
            "narration-only" | "narration" => Ok(FallbackPolicy::NarrationOnly),
            other => Err(PodmixError::InvalidRequest {
                reason: format!("unknown fallback policy '{}'", other),
            }),
        }
    }
}

/// Encoded inputs for one render
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub narration: &'a [u8],
    pub narration_format: AudioFormat,
    /// `None` when no music track was supplied
    pub music: Option<&'a [u8]>,
    pub music_format: AudioFormat,
}

/// Output settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub output_format: AudioFormat,
    pub bitrate_kbps: Option<u32>,
    pub fallback: FallbackPolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            output_format: AudioFormat::Wav,
            bitrate_kbps: Some(DEFAULT_BITRATE_KBPS),
            fallback: FallbackPolicy::Fail,
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// How the output was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenderOutcome {
    /// Narration and music were composed
    Mixed { strategy: Strategy },
    /// Music could not be used; output is the narration alone
    NarrationOnly { reason: String, error_code: String },
}

impl RenderOutcome {
    pub fn is_mixed(&self) -> bool {
        matches!(self, RenderOutcome::Mixed { .. })
    }
}

impl fmt::Display for RenderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderOutcome::Mixed { strategy } => write!(f, "mixed ({})", strategy),
            RenderOutcome::NarrationOnly { error_code, .. } => {
                write!(f, "narration only ({})", error_code)
            }
        }
    }
}

/// Result of a render
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    pub outcome: RenderOutcome,
    pub duration_ms: u64,
    pub sample_rate: u32,
    pub channels: usize,
    /// Lowercase hex SHA-256 of `bytes`
    pub sha256: String,
}

// ============================================================================
// Render
// ============================================================================

/// Decode, compose and encode one episode
///
/// # Arguments
/// * `codec` - Codec used for every decode and the final encode
/// * `input` - Encoded narration and (optional) music
/// * `request` - Composition settings
/// * `options` - Output format and fallback policy
///
/// # Errors
/// Narration decode failures, invalid requests and encode failures are
/// always returned. Music failures are returned under
/// [`FallbackPolicy::Fail`] and absorbed under
/// [`FallbackPolicy::NarrationOnly`].
pub fn render(
    codec: &dyn AudioCodec,
    input: &RenderInput<'_>,
    request: &CompositionRequest,
    options: &RenderOptions,
) -> Result<RenderReport> {
    request.validate()?;

    let narration = codec.decode(input.narration, input.narration_format)?;

    let (output, outcome) = match mix_with_music(codec, &narration, input, request)? {
        Ok(mixed) => (
            mixed,
            RenderOutcome::Mixed {
                strategy: request.strategy,
            },
        ),
        Err(err) if options.fallback == FallbackPolicy::NarrationOnly => {
            warn!(
                error_code = err.error_code(),
                error = %err,
                "Music unusable, rendering narration only"
            );
            let outcome = RenderOutcome::NarrationOnly {
                reason: err.to_string(),
                error_code: err.error_code().to_string(),
            };
            (narration, outcome)
        }
        Err(err) => return Err(err),
    };

    let bytes = codec.encode(&output, options.output_format, options.bitrate_kbps)?;
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    info!(
        outcome = %outcome,
        format = %options.output_format,
        duration_ms = output.duration_ms(),
        bytes = bytes.len(),
        "Render complete"
    );

    Ok(RenderReport {
        bytes,
        format: options.output_format,
        outcome,
        duration_ms: output.duration_ms(),
        sample_rate: output.sample_rate(),
        channels: output.channel_count(),
        sha256,
    })
}

/// Everything that depends on the music track
///
/// The inner error is a music failure the fallback policy may absorb: music
/// missing, undecodable, or rejected by the composer. The outer error is
/// always fatal.
fn mix_with_music(
    codec: &dyn AudioCodec,
    narration: &PcmBuffer,
    input: &RenderInput<'_>,
    request: &CompositionRequest,
) -> Result<std::result::Result<PcmBuffer, PodmixError>> {
    let Some(music_bytes) = input.music else {
        return Ok(Err(PodmixError::InvalidRequest {
            reason: "no music track supplied".to_string(),
        }));
    };

    let music = match codec.decode(music_bytes, input.music_format) {
        Ok(music) => music,
        Err(err) => return Ok(Err(err)),
    };

    match compose(narration, &music, request) {
        Ok(mixed) => Ok(Ok(mixed)),
        Err(err) if err.is_composition_error() => Ok(Err(err)),
        Err(err) => Err(err),
    }
}

/// File name for a rendered artifact
///
/// `processed_<yyyymmddThhmmss>[_<episode>].<ext>`
pub fn artifact_name(
    prefix: &str,
    timestamp: DateTime<Utc>,
    episode_id: Option<&str>,
    format: AudioFormat,
) -> String {
    let episode_part = episode_id
        .filter(|id| !id.is_empty())
        .map(|id| format!("_{}", id))
        .unwrap_or_default();
    format!(
        "{}{}{}.{}",
        prefix,
        timestamp.format("%Y%m%dT%H%M%S"),
        episode_part,
        format.extension()
    )
}

/// [`artifact_name`] with the default prefix and the current time
pub fn artifact_name_now(episode_id: Option<&str>, format: AudioFormat) -> String {
    artifact_name(ARTIFACT_PREFIX, Utc::now(), episode_id, format)
}
