//! Integration tests for the training pipeline
//!
//! These tests run source audio through extraction, every effect, the
//! deconvolution round trip and the WAV adapters.

use earworks_core::domain::dsp::convolve;
use earworks_core::domain::{
    BandBoost, ClipExtractor, ConvolutionReverb, Effect, EarworksConfig, Exercise, FrequencyBand,
    GroundTruth, ImpulseResponse, ImpulseResponseExtractor, IrLibrary, PanPosition, Panner,
    ProcessedAudio, SampleBuffer, SessionState, TrainingSession, TrainingSettings, TrialOracle,
};
use earworks_infra::{ir_loader, wav};
use earworks_tests::{calc_peak, correlation, generate_sine_wave, generate_white_noise};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 44100;

fn ten_second_source() -> SampleBuffer {
    SampleBuffer::new(generate_white_noise(SAMPLE_RATE as usize * 10, 0.5, 7), SAMPLE_RATE)
}

fn decaying_ir(name: &str, len: usize) -> ImpulseResponse {
    let samples = (0..len).map(|i| 0.7 * 0.995_f32.powi(i as i32)).collect();
    ImpulseResponse::new(name, SampleBuffer::new(samples, SAMPLE_RATE)).unwrap()
}

// ============================================================================
// CLIP EXTRACTION
// ============================================================================

#[test]
fn test_ten_second_source_five_second_clip() {
    let source = ten_second_source();
    let extractor = ClipExtractor::new(5.0).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);

    for _ in 0..20 {
        let clip = extractor.extract(&source, &mut rng).unwrap();
        assert_eq!(clip.buffer.len(), 220_500);
        assert!(clip.start < 220_500);
        assert_eq!(clip.buffer.samples(), &source.samples()[clip.start..clip.start + 220_500]);
    }
}

#[test]
fn test_short_source_is_padded() {
    let source = SampleBuffer::new(generate_sine_wave(440.0, SAMPLE_RATE, 1000.0), SAMPLE_RATE);
    let clip = ClipExtractor::default()
        .extract(&source, &mut StdRng::seed_from_u64(0))
        .unwrap();

    assert_eq!(clip.start, 0);
    assert_eq!(clip.buffer.len(), 220_500);
    assert!(clip.buffer.samples()[SAMPLE_RATE as usize..].iter().all(|&s| s == 0.0));
}

// ============================================================================
// EFFECTS
// ============================================================================

#[test]
fn test_band_boost_on_noise_stays_bounded() {
    let clip = SampleBuffer::new(generate_white_noise(SAMPLE_RATE as usize, 0.9, 1), SAMPLE_RATE);
    let effect = BandBoost::default();

    for band in FrequencyBand::standard_set(SAMPLE_RATE) {
        let boosted = effect.apply(&clip, &band).unwrap();
        assert!(boosted.processed.peak() <= 1.0 + 1e-6, "{band}");
    }
}

#[test]
fn test_pan_extremes() {
    let clip = SampleBuffer::new(generate_sine_wave(220.0, SAMPLE_RATE, 100.0), SAMPLE_RATE);

    let right = Panner.apply(&clip, &PanPosition::new(100).unwrap()).unwrap();
    assert!(right.left().all(|s| s == 0.0));

    let left = Panner.apply(&clip, &PanPosition::new(-100).unwrap()).unwrap();
    assert!(left.right().all(|s| s == 0.0));

    assert_eq!(PanPosition::CENTER.gains(), (1.0, 1.0));
}

#[test]
fn test_reverb_keeps_tail_until_playback() {
    let clip = SampleBuffer::new(generate_white_noise(22050, 0.3, 4), SAMPLE_RATE);
    let ir = decaying_ir("Large Hall", 8820);

    let wet = ConvolutionReverb.apply(&clip, &ir).unwrap();
    assert_eq!(wet.len(), 22050 + 8820 - 1);
    assert!(wet.peak() <= 1.0 + 1e-6);

    let playback = ProcessedAudio::Mono(wet).for_playback(clip.len());
    assert_eq!(playback.len(), clip.len());
}

#[test]
fn test_fft_convolution_matches_direct_sum() {
    let signal = generate_white_noise(500, 1.0, 8);
    let kernel = generate_white_noise(200, 1.0, 9);

    let fast = convolve(&signal, &kernel);
    for n in [0, 1, 150, 499, 600, 698] {
        let expected: f64 = (0..kernel.len())
            .filter(|&k| n >= k && n - k < signal.len())
            .map(|k| f64::from(signal[n - k]) * f64::from(kernel[k]))
            .sum();
        assert!((f64::from(fast[n]) - expected).abs() < 1e-3, "sample {n}");
    }
}

// ============================================================================
// DECONVOLUTION
// ============================================================================

#[test]
fn test_extracted_ir_reverbs_like_the_original() {
    let dry = generate_white_noise(16384, 0.5, 21);
    let known: Vec<f32> = (0..256)
        .map(|i| if i % 16 == 0 { 0.9_f32.powi(i / 16) } else { 0.0 })
        .collect();
    let wet = convolve(&dry, &known)[..dry.len()].to_vec();

    let extracted = ImpulseResponseExtractor::default()
        .extract(&SampleBuffer::new(dry, SAMPLE_RATE), &SampleBuffer::new(wet, SAMPLE_RATE))
        .unwrap();

    assert!(correlation(&extracted.response.samples()[..known.len()], &known) > 0.9);
    assert!((calc_peak(extracted.response.samples()) - 1.0).abs() < 1e-6);
}

#[test]
fn test_extract_ir_through_wav_files() {
    let dir = TempDir::new().unwrap();
    let dry = SampleBuffer::new(generate_white_noise(4096, 0.5, 30), 48000);
    let known = [1.0_f32, 0.0, 0.0, 0.5, 0.0, 0.25];
    let wet = SampleBuffer::new(convolve(dry.samples(), &known)[..dry.len()].to_vec(), 48000);

    wav::write_mono(dir.path().join("dry.wav"), &dry).unwrap();
    wav::write_mono(dir.path().join("wet.wav"), &wet).unwrap();

    let extracted = ImpulseResponseExtractor::default()
        .extract(
            &wav::read_mono(dir.path().join("dry.wav")).unwrap(),
            &wav::read_mono(dir.path().join("wet.wav")).unwrap(),
        )
        .unwrap();

    let out = dir.path().join("extracted_ir.wav");
    wav::write_mono(&out, &extracted.response).unwrap();

    let reloaded = wav::read_mono(&out).unwrap();
    assert_eq!(reloaded.sample_rate(), 48000);
    assert_eq!(reloaded.len(), 4096);
    assert!(correlation(&reloaded.samples()[..known.len()], &known) > 0.9);
}

// ============================================================================
// ORACLE AND SESSION
// ============================================================================

#[test]
fn test_oracle_tolerance_scenarios() {
    let oracle = TrialOracle::new(10).unwrap();
    let pan = |p| GroundTruth::Pan(PanPosition::new(p).unwrap());

    assert!(oracle.judge(&pan(50), &pan(55)).unwrap().correct);
    assert!(!oracle.judge(&pan(50), &pan(65)).unwrap().correct);
}

#[test]
fn test_session_over_loaded_library() {
    let dir = TempDir::new().unwrap();
    let config = EarworksConfig::factory_default();
    wav::write_mono(
        dir.path().join("small_room_ir.wav"),
        decaying_ir("Small Room", 2205).buffer(),
    )
    .unwrap();

    let report = ir_loader::load_library(&config.impulse_responses, Some(dir.path()));
    assert_eq!(report.loaded_names(), vec!["Small Room"]);
    assert_eq!(report.failures.len(), 2);

    let settings = TrainingSettings {
        clip_duration_secs: 1.0,
        ..TrainingSettings::default()
    };
    let mut session = TrainingSession::new(
        ten_second_source(),
        &settings,
        report.library,
        StdRng::seed_from_u64(11),
    )
    .unwrap();

    let trial = session.next_trial(Exercise::Reverb).unwrap();
    assert_eq!(trial.ground_truth(), &GroundTruth::Reverb("Small Room".into()));
    assert_eq!(trial.processed().len(), SAMPLE_RATE as usize + 2205 - 1);

    let result = session
        .submit(&trial, &Exercise::Reverb.parse_guess("Small Room").unwrap())
        .unwrap();
    assert!(result.correct);
    assert!(matches!(session.state(), SessionState::Judged { correct: true, .. }));
}

#[test]
fn test_seeded_band_sessions_agree() {
    let settings = TrainingSettings {
        clip_duration_secs: 0.5,
        ..TrainingSettings::default()
    };
    let run = |seed| {
        let mut session =
            TrainingSession::new(ten_second_source(), &settings, IrLibrary::new(), StdRng::seed_from_u64(seed))
                .unwrap();
        (0..5)
            .map(|_| session.next_trial(Exercise::BandBoost).unwrap())
            .map(|trial| (trial.clip().start, trial.ground_truth().clone()))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(99), run(99));
}
