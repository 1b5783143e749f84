//! Composition request
//!
//! The configuration for one composition run, its presets, and JSON loading.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PodmixError, Result};

/// How music and narration are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    /// Music is layered under the start and end of the narration; the
    /// output is exactly as long as the narration.
    #[default]
    Overlay,
    /// Music plays alone before and after the narration.
    Concatenate,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Overlay => write!(f, "overlay"),
            Strategy::Concatenate => write!(f, "concatenate"),
        }
    }
}

impl FromStr for Strategy {
    type Err = PodmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "overlay" => Ok(Strategy::Overlay),
            "concatenate" | "concat" => Ok(Strategy::Concatenate),
            other => Err(PodmixError::InvalidRequest {
                reason: format!("unknown strategy '{}'", other),
            }),
        }
    }
}

/// Where the OVERLAY strategy draws its outro music from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutroPlacement {
    /// The window directly after the intro window of the (extended) music
    #[default]
    FollowingIntro,
    /// The last `outro_duration_ms` of the (extended) music
    TailOfMusic,
}

impl FromStr for OutroPlacement {
    type Err = PodmixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "following-intro" => Ok(OutroPlacement::FollowingIntro),
            "tail" | "tail-of-music" => Ok(OutroPlacement::TailOfMusic),
            other => Err(PodmixError::InvalidRequest {
                reason: format!("unknown outro placement '{}'", other),
            }),
        }
    }
}

/// Configuration for one composition
///
/// Field names serialize in camelCase so request bodies can be loaded as-is.
/// Missing fields take their values from [`CompositionRequest::overlay_preset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompositionRequest {
    pub intro_duration_ms: u64,
    pub outro_duration_ms: u64,
    /// Fade-out applied to the end of the intro music
    pub intro_fade_ms: u64,
    /// Fade-in applied to the start of the outro music
    pub outro_fade_ms: u64,
    /// Applied to the music before any slicing
    pub music_gain_db: f32,
    pub strategy: Strategy,
    /// Only consulted by [`Strategy::Overlay`]
    pub outro_placement: OutroPlacement,
}

impl Default for CompositionRequest {
    fn default() -> Self {
        Self::overlay_preset()
    }
}

impl CompositionRequest {
    /// 10 s intro and outro under the narration, faded across each whole window
    pub fn overlay_preset() -> Self {
        Self {
            intro_duration_ms: 10_000,
            outro_duration_ms: 10_000,
            intro_fade_ms: 10_000,
            outro_fade_ms: 10_000,
            music_gain_db: -10.0,
            strategy: Strategy::Overlay,
            outro_placement: OutroPlacement::FollowingIntro,
        }
    }

    /// 50 s music-only intro and 30 s music-only outro around the narration
    pub fn concatenate_preset() -> Self {
        Self {
            intro_duration_ms: 50_000,
            outro_duration_ms: 30_000,
            intro_fade_ms: 3_000,
            outro_fade_ms: 1_000,
            music_gain_db: -10.0,
            strategy: Strategy::Concatenate,
            outro_placement: OutroPlacement::FollowingIntro,
        }
    }

    /// Preset for the given strategy
    pub fn preset(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Overlay => Self::overlay_preset(),
            Strategy::Concatenate => Self::concatenate_preset(),
        }
    }

    /// Parse a request from JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let request: Self = serde_json::from_str(json)?;
        request.validate()?;
        Ok(request)
    }

    /// Load a request from a JSON file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check the request's own invariants
    ///
    /// # Errors
    /// `InvalidRequest` if a fade is longer than its window or the gain is
    /// not a finite number.
    pub fn validate(&self) -> Result<()> {
        if self.intro_fade_ms > self.intro_duration_ms {
            return Err(PodmixError::InvalidRequest {
                reason: format!(
                    "intro fade ({} ms) is longer than the intro ({} ms)",
                    self.intro_fade_ms, self.intro_duration_ms
                ),
            });
        }
        if self.outro_fade_ms > self.outro_duration_ms {
            return Err(PodmixError::InvalidRequest {
                reason: format!(
                    "outro fade ({} ms) is longer than the outro ({} ms)",
                    self.outro_fade_ms, self.outro_duration_ms
                ),
            });
        }
        if !self.music_gain_db.is_finite() {
            return Err(PodmixError::InvalidRequest {
                reason: format!("music gain {} dB is not finite", self.music_gain_db),
            });
        }
        Ok(())
    }
}
