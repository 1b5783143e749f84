//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info;

use super::MixArgs;
use crate::compose::{CompositionRequest, Strategy};
use crate::engine::{AudioCodec, AudioFormat, SymphoniaCodec, WavCodec};
use crate::error::Result;
use crate::render::{artifact_name_now, render, FallbackPolicy, RenderInput, RenderOptions};

/// Resolve the composition request for `mix`
///
/// Starts from the `--config` file if given, otherwise the preset for
/// `--strategy` (overlay when absent), then applies individual flags.
pub fn build_request(args: &MixArgs) -> Result<CompositionRequest> {
    let mut request = match &args.config {
        Some(path) => {
            let mut request = CompositionRequest::from_json_file(path)?;
            if let Some(strategy) = args.strategy {
                request.strategy = strategy;
            }
            request
        }
        None => CompositionRequest::preset(args.strategy.unwrap_or_default()),
    };

    if let Some(ms) = args.intro_ms {
        request.intro_duration_ms = ms;
    }
    if let Some(ms) = args.outro_ms {
        request.outro_duration_ms = ms;
    }
    if let Some(ms) = args.intro_fade_ms {
        request.intro_fade_ms = ms;
    }
    if let Some(ms) = args.outro_fade_ms {
        request.outro_fade_ms = ms;
    }
    if let Some(db) = args.music_gain_db {
        request.music_gain_db = db;
    }
    if let Some(placement) = args.outro_placement {
        request.outro_placement = placement;
    }

    request.validate()?;
    Ok(request)
}

/// Mix narration and music and write the result.
///
/// Returns the path written.
pub fn mix(args: &MixArgs) -> Result<PathBuf> {
    let request = build_request(args)?;
    let codec = SymphoniaCodec::new(WavCodec::new(args.bit_depth)?);

    info!(
        narration = %args.narration.display(),
        strategy = %request.strategy,
        "Mixing episode"
    );

    let narration = fs::read(&args.narration)?;
    let narration_format = AudioFormat::from_path(&args.narration)?;

    let music = args.music.as_deref().map(fs::read).transpose()?;
    let music_format = match &args.music {
        Some(path) => AudioFormat::from_path(path)?,
        None => AudioFormat::Wav,
    };

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&args.narration, args.episode_id.as_deref()),
    };
    let output_format = match output_path.extension() {
        Some(_) => AudioFormat::from_path(&output_path)?,
        None => AudioFormat::Wav,
    };

    let input = RenderInput {
        narration: &narration,
        narration_format,
        music: music.as_deref(),
        music_format,
    };
    let options = RenderOptions {
        output_format,
        fallback: if args.fallback {
            FallbackPolicy::NarrationOnly
        } else {
            FallbackPolicy::Fail
        },
        ..RenderOptions::default()
    };

    let report = render(&codec, &input, &request, &options)?;
    fs::write(&output_path, &report.bytes)?;

    let summary = json!({
        "output": output_path.display().to_string(),
        "request": request,
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(output_path)
}

fn default_output_path(narration: &Path, episode_id: Option<&str>) -> PathBuf {
    let name = artifact_name_now(episode_id, AudioFormat::Wav);
    match narration.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Print a preset request as JSON.
pub fn preset(strategy: Strategy) -> Result<()> {
    let request = CompositionRequest::preset(strategy);
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

/// Decode a file and print its format.
pub fn probe(path: &Path) -> Result<()> {
    info!("Probing: {}", path.display());

    let bytes = fs::read(path)?;
    let format = AudioFormat::from_path(path)?;
    let buffer = SymphoniaCodec::default().decode(&bytes, format)?;

    println!("File: {}", path.display());
    println!("Format: {}", format);
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Channels: {}", buffer.channel_count());
    println!("Frames: {}", buffer.frame_count());
    println!("Duration: {:.3} s ({} ms)", buffer.duration_secs(), buffer.duration_ms());
    println!("Peak: {:.1} dBFS", buffer.peak_db());
    println!("RMS: {:.1} dBFS", buffer.rms_db());

    Ok(())
}
