//! Integration Tests
//!
//! End-to-end tests for the podmix composition pipeline.

use approx::assert_abs_diff_eq;
use test_case::test_case;

use podmix::dsp::{extend_to_at_least, fade_in, fade_out};
use podmix::{
    compose, render, AudioCodec, AudioFormat, CompositionRequest, FallbackPolicy, OutroPlacement,
    PcmBuffer, PodmixError, RenderInput, RenderOptions, RenderOutcome, Strategy, WavCodec,
};

const CD_RATE: u32 = 44_100;

/// Helper to create a stereo sine buffer
fn create_sine_buffer(frequency: f32, sample_rate: u32, duration_ms: u64, amplitude: f32) -> PcmBuffer {
    let frames = (duration_ms * sample_rate as u64 / 1000) as usize;
    let angular = 2.0 * std::f32::consts::PI * frequency / sample_rate as f32;
    let channel: Vec<f32> = (0..frames)
        .map(|i| amplitude * (angular * i as f32).sin())
        .collect();
    PcmBuffer::new(vec![channel.clone(), channel], sample_rate).unwrap()
}

fn overlay_request(intro_ms: u64, outro_ms: u64) -> CompositionRequest {
    CompositionRequest {
        intro_duration_ms: intro_ms,
        outro_duration_ms: outro_ms,
        intro_fade_ms: intro_ms,
        outro_fade_ms: outro_ms,
        ..CompositionRequest::overlay_preset()
    }
}

fn concatenate_request(intro_ms: u64, outro_ms: u64) -> CompositionRequest {
    CompositionRequest {
        intro_duration_ms: intro_ms,
        outro_duration_ms: outro_ms,
        intro_fade_ms: intro_ms.min(3_000),
        outro_fade_ms: outro_ms.min(1_000),
        ..CompositionRequest::concatenate_preset()
    }
}

// === Scenario Tests ===

#[test]
fn test_overlay_scenario_short_music_long_narration() {
    let narration = PcmBuffer::silence_ms(60_000, 2, CD_RATE).unwrap();
    let music = PcmBuffer::silence_ms(5_000, 2, CD_RATE).unwrap();

    let result = compose(&narration, &music, &overlay_request(10_000, 10_000)).unwrap();

    assert_eq!(result.duration_ms(), 60_000);
    assert_eq!(result.frame_count(), narration.frame_count());
    assert_eq!(result.sample_rate(), CD_RATE);
    assert_eq!(result.channel_count(), 2);
}

#[test]
fn test_concatenate_scenario_outro_loops_short_music() {
    let narration = PcmBuffer::silence_ms(10_000, 2, CD_RATE).unwrap();
    let music = PcmBuffer::silence_ms(2_000, 2, CD_RATE).unwrap();

    // 2000 -> 4000 -> 8000 -> 16000 -> 32000
    assert_eq!(extend_to_at_least(&music, 30_000).unwrap().duration_ms(), 32_000);

    let result = compose(&narration, &music, &concatenate_request(0, 30_000)).unwrap();
    assert_eq!(result.duration_ms(), 10_000 + 30_000);
}

#[test]
fn test_concatenate_scenario_intro_never_loops() {
    let narration = PcmBuffer::silence_ms(10_000, 2, CD_RATE).unwrap();
    let music = PcmBuffer::silence_ms(2_000, 2, CD_RATE).unwrap();

    let result = compose(&narration, &music, &concatenate_request(5_000, 1_000));
    match result {
        Err(PodmixError::InsufficientSource {
            required_ms,
            available_ms,
            ..
        }) => {
            assert_eq!(required_ms, 5_000);
            assert_eq!(available_ms, 2_000);
        }
        other => panic!("expected InsufficientSource, got {:?}", other),
    }
}

#[test_case(Strategy::Overlay ; "overlay")]
#[test_case(Strategy::Concatenate ; "concatenate")]
fn test_sample_rate_mismatch_rejected(strategy: Strategy) {
    let narration = PcmBuffer::silence_ms(1_000, 2, CD_RATE).unwrap();
    let music = PcmBuffer::silence_ms(1_000, 2, 48_000).unwrap();

    let result = compose(&narration, &music, &CompositionRequest::preset(strategy));
    match result {
        Err(PodmixError::FormatMismatch {
            expected_rate,
            found_rate,
            ..
        }) => {
            assert_eq!(expected_rate, CD_RATE);
            assert_eq!(found_rate, 48_000);
        }
        other => panic!("expected FormatMismatch, got {:?}", other),
    }
}

// === Length Properties ===

#[test_case(30_000, 3_000, 10_000, 10_000 ; "long narration short music")]
#[test_case(4_000, 60_000, 10_000, 10_000 ; "narration shorter than windows")]
#[test_case(12_345, 777, 2_500, 1_500 ; "odd lengths")]
#[test_case(5_000, 5_000, 0, 2_000 ; "outro only")]
fn test_overlay_preserves_narration_length(narration_ms: u64, music_ms: u64, intro: u64, outro: u64) {
    let narration = create_sine_buffer(220.0, CD_RATE, narration_ms, 0.5);
    let music = create_sine_buffer(440.0, CD_RATE, music_ms, 0.5);

    for placement in [OutroPlacement::FollowingIntro, OutroPlacement::TailOfMusic] {
        let request = CompositionRequest {
            outro_placement: placement,
            ..overlay_request(intro, outro)
        };
        let result = compose(&narration, &music, &request).unwrap();
        assert_eq!(result.frame_count(), narration.frame_count());
    }
}

#[test_case(10_000, 60_000, 50_000, 30_000 ; "preset windows")]
#[test_case(3_000, 2_000, 2_000, 30_000 ; "looped outro")]
#[test_case(3_000, 500, 0, 0 ; "no music windows")]
fn test_concatenate_length(narration_ms: u64, music_ms: u64, intro: u64, outro: u64) {
    let narration = PcmBuffer::silence_ms(narration_ms, 2, 22_050).unwrap();
    let music = PcmBuffer::silence_ms(music_ms, 2, 22_050).unwrap();

    let result = compose(&narration, &music, &concatenate_request(intro, outro)).unwrap();
    assert_eq!(
        result.frame_count(),
        narration.frame_count() + narration.frames_for_ms(intro) + narration.frames_for_ms(outro)
    );
}

// === Buffer Properties ===

#[test_case(0 ; "empty buffer")]
#[test_case(1 ; "single frame")]
#[test_case(4_410 ; "whole milliseconds")]
#[test_case(4_417 ; "fractional duration")]
fn test_full_slice_is_identity(frames: usize) {
    let data: Vec<f32> = (0..frames).map(|i| (i % 100) as f32 / 100.0).collect();
    let buffer = PcmBuffer::new(vec![data.clone(), data], CD_RATE).unwrap();

    let full = buffer.slice(0, buffer.duration_ms() as i64);
    if frames == 0 {
        assert!(matches!(full, Err(PodmixError::InvalidRange { .. })));
    } else {
        // Holds even under a millisecond: an end at the duration reaches the last frame
        assert_eq!(full.unwrap(), buffer);
    }
}

#[test]
fn test_adjacent_slices_concatenate() {
    let buffer = create_sine_buffer(330.0, 8_000, 1_000, 0.7);

    for (d1, d2) in [(100, 250), (1, 999), (500, 500), (333, 333)] {
        let joined = buffer
            .slice(0, d1)
            .unwrap()
            .concat(&buffer.slice(d1, d1 + d2).unwrap())
            .unwrap();
        assert_eq!(joined, buffer.slice(0, d1 + d2).unwrap());
    }
}

#[test]
fn test_zero_gain_is_identity() {
    let buffer = create_sine_buffer(1_000.0, CD_RATE, 50, 0.9);
    assert_eq!(buffer.apply_gain_db(0.0), buffer);
}

#[test]
fn test_fade_in_then_out_keeps_interior() {
    let buffer = PcmBuffer::new(vec![vec![0.8; 1_000]; 2], 1_000).unwrap();
    let faded = fade_out(&fade_in(&buffer, 200), 200);
    let left = faded.channel(0);

    // Interior untouched, envelope lowest at the edges
    for &sample in &left[200..800] {
        assert_eq!(sample, 0.8);
    }
    assert_eq!(left[0], 0.0);
    assert_eq!(left[999], 0.0);
    assert!(left[100] < 0.8 && left[100] > 0.0);
    assert!(left[900] < 0.8 && left[900] > 0.0);
    assert_abs_diff_eq!(left[199], 0.8 * 199.0 / 200.0, epsilon = 1e-6);
}

#[test]
fn test_composition_does_not_touch_inputs() {
    let narration = create_sine_buffer(200.0, 8_000, 2_000, 0.4);
    let music = create_sine_buffer(500.0, 8_000, 700, 0.4);
    let narration_before = narration.clone();
    let music_before = music.clone();

    compose(&narration, &music, &overlay_request(500, 500)).unwrap();
    compose(&narration, &music, &concatenate_request(500, 1_500)).unwrap();

    assert_eq!(narration, narration_before);
    assert_eq!(music, music_before);
}

#[test]
fn test_huge_music_gain_never_produces_nan() {
    let narration = PcmBuffer::silence_ms(500, 2, 1_000).unwrap();
    let music = PcmBuffer::silence_ms(500, 2, 1_000).unwrap();
    let request = CompositionRequest {
        music_gain_db: 800.0,
        ..overlay_request(100, 100)
    };

    let result = compose(&narration, &music, &request).unwrap();
    for channel in result.channels() {
        assert!(channel.iter().all(|s| *s == 0.0));
    }
}

#[test]
fn test_loud_overlay_is_clipped() {
    let narration = PcmBuffer::new(vec![vec![0.9; 8_000]; 2], 8_000).unwrap();
    let music = PcmBuffer::new(vec![vec![0.9; 8_000]; 2], 8_000).unwrap();
    let request = CompositionRequest {
        music_gain_db: 6.0,
        intro_fade_ms: 0,
        outro_fade_ms: 0,
        ..overlay_request(500, 500)
    };

    let result = compose(&narration, &music, &request).unwrap();
    for channel in result.channels() {
        assert!(channel.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
    assert_eq!(result.channel(0)[0], 1.0);
}

// === Render Pipeline Tests ===

#[test]
fn test_render_round_trip_through_wav() {
    let codec = WavCodec::cd_quality();
    let narration = codec
        .encode(
            &create_sine_buffer(220.0, CD_RATE, 4_000, 0.5),
            AudioFormat::Wav,
            None,
        )
        .unwrap();
    let music = codec
        .encode(
            &create_sine_buffer(440.0, CD_RATE, 1_500, 0.5),
            AudioFormat::Wav,
            None,
        )
        .unwrap();

    let input = RenderInput {
        narration: &narration,
        narration_format: AudioFormat::Wav,
        music: Some(&music),
        music_format: AudioFormat::Wav,
    };
    let report = render(
        &codec,
        &input,
        &overlay_request(1_000, 1_000),
        &RenderOptions::default(),
    )
    .unwrap();

    assert!(report.outcome.is_mixed());
    assert_eq!(report.duration_ms, 4_000);
    assert_eq!(report.sample_rate, CD_RATE);
    assert_eq!(report.channels, 2);

    let decoded = codec.decode(&report.bytes, AudioFormat::Wav).unwrap();
    assert_eq!(decoded.duration_ms(), 4_000);
}

#[test]
fn test_render_fallback_records_substitution() {
    let codec = WavCodec::new(32).unwrap();
    let narration_pcm = create_sine_buffer(220.0, 16_000, 1_000, 0.5);
    let narration = codec
        .encode(&narration_pcm, AudioFormat::Wav, None)
        .unwrap();
    let music = codec
        .encode(
            &create_sine_buffer(440.0, 16_000, 100, 0.5),
            AudioFormat::Wav,
            None,
        )
        .unwrap();

    // CONCATENATE intro longer than the music
    let input = RenderInput {
        narration: &narration,
        narration_format: AudioFormat::Wav,
        music: Some(&music),
        music_format: AudioFormat::Wav,
    };
    let options = RenderOptions {
        fallback: FallbackPolicy::NarrationOnly,
        ..RenderOptions::default()
    };
    let report = render(&codec, &input, &concatenate_request(500, 500), &options).unwrap();

    match &report.outcome {
        RenderOutcome::NarrationOnly { error_code, .. } => {
            assert_eq!(error_code, "INSUFFICIENT_SOURCE")
        }
        other => panic!("expected narration-only fallback, got {:?}", other),
    }
    assert_eq!(
        codec.decode(&report.bytes, AudioFormat::Wav).unwrap(),
        narration_pcm
    );

    // Same input without fallback surfaces the engine error
    let result = render(
        &codec,
        &input,
        &concatenate_request(500, 500),
        &RenderOptions::default(),
    );
    assert!(matches!(
        result,
        Err(PodmixError::InsufficientSource { .. })
    ));
}

#[test]
fn test_request_json_round_trip_matches_service_shape() {
    let json = r#"{
        "introDurationMs": 50000,
        "outroDurationMs": 30000,
        "introFadeMs": 3000,
        "outroFadeMs": 1000,
        "musicGainDb": -10.0,
        "strategy": "CONCATENATE"
    }"#;

    let request = CompositionRequest::from_json_str(json).unwrap();
    assert_eq!(request, CompositionRequest::concatenate_preset());
}
