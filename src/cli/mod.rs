//! CLI Module
//!
//! Command-line interface for the podmix composition engine.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::compose::{OutroPlacement, Strategy};

/// Podmix - combine podcast narration with background music
#[derive(Parser, Debug)]
#[command(name = "podmix")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mix narration and music into one episode
    #[command(name = "mix")]
    Mix(MixArgs),

    /// Print a preset composition request as JSON
    #[command(name = "preset")]
    Preset {
        /// overlay or concatenate
        strategy: Strategy,
    },

    /// Decode an audio file and print its format
    #[command(name = "probe")]
    Probe {
        /// Path to the audio file
        path: PathBuf,
    },
}

/// Arguments for `mix`
///
/// Settings are resolved in order: preset (or `--config` file), then
/// individual flags.
#[derive(Args, Debug, Clone, Default)]
pub struct MixArgs {
    /// Narration audio file
    #[arg(short, long)]
    pub narration: PathBuf,

    /// Background music file
    #[arg(short, long)]
    pub music: Option<PathBuf>,

    /// Output WAV file (defaults to a timestamped name next to the narration)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON composition request
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// overlay or concatenate
    #[arg(short, long)]
    pub strategy: Option<Strategy>,

    /// Intro window length in milliseconds
    #[arg(long)]
    pub intro_ms: Option<u64>,

    /// Outro window length in milliseconds
    #[arg(long)]
    pub outro_ms: Option<u64>,

    /// Intro fade-out length in milliseconds
    #[arg(long)]
    pub intro_fade_ms: Option<u64>,

    /// Outro fade-in length in milliseconds
    #[arg(long)]
    pub outro_fade_ms: Option<u64>,

    /// Music gain in dB (e.g. -10)
    #[arg(long, allow_hyphen_values = true)]
    pub music_gain_db: Option<f32>,

    /// Where the overlay outro is read from: following-intro or tail
    #[arg(long)]
    pub outro_placement: Option<OutroPlacement>,

    /// Output bit depth: 16, 24, or 32 (float)
    #[arg(long, default_value_t = 16)]
    pub bit_depth: u16,

    /// Ship the narration alone if the music cannot be used
    #[arg(long)]
    pub fallback: bool,

    /// Episode identifier used in the default output name
    #[arg(long)]
    pub episode_id: Option<String>,
}
