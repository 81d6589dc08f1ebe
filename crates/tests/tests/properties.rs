//! Property-based tests for the DSP core
//!
//! These tests use proptest to check the pipeline invariants across many
//! random inputs.

use earworks_core::domain::{
    BandBoost, ClipExtractor, ConvolutionReverb, Effect, FrequencyBand, GroundTruth, ImpulseResponse,
    PanPosition, Panner, SampleBuffer, TrialOracle,
};
use earworks_tests::calc_peak;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

proptest! {
    /// Property: clips are exactly duration * rate samples, whatever the source length
    #[test]
    fn clip_length_is_exact(
        source_len in 0usize..40_000,
        sample_rate in 1000u32..16_000,
        duration in 0.05f32..2.0,
        seed in any::<u64>(),
    ) {
        let extractor = ClipExtractor::new(duration).unwrap();
        let source = SampleBuffer::new(vec![0.25; source_len], sample_rate);

        let clip = extractor.extract(&source, &mut StdRng::seed_from_u64(seed)).unwrap();
        let expected = (f64::from(duration) * f64::from(sample_rate)).round() as usize;

        prop_assert_eq!(clip.buffer.len(), expected);
        prop_assert!(clip.start == 0 || clip.start < source_len - expected);
    }

    /// Property: band boost never clips and never produces NaN or Inf
    #[test]
    fn band_boost_peak_is_bounded(
        band_index in 0usize..10,
        boost_db in 0.0f32..24.0,
        samples in prop::collection::vec(-1.0f32..1.0, 256..2048),
    ) {
        let band = FrequencyBand::standard_set(44100)[band_index];
        let clip = SampleBuffer::new(samples, 44100);

        let boosted = BandBoost::new(boost_db, 4).unwrap().apply(&clip, &band).unwrap();

        prop_assert!(boosted.processed.samples().iter().all(|s| s.is_finite()));
        prop_assert!(calc_peak(boosted.processed.samples()) <= 1.0 + 1e-6);
    }

    /// Property: hard pans silence the opposite channel
    #[test]
    fn hard_pan_silences_opposite_channel(
        samples in prop::collection::vec(-1.0f32..1.0, 1..512),
    ) {
        let clip = SampleBuffer::new(samples, 48000);

        let right = Panner.apply(&clip, &PanPosition::new(100).unwrap()).unwrap();
        prop_assert!(right.left().all(|s| s == 0.0));

        let left = Panner.apply(&clip, &PanPosition::new(-100).unwrap()).unwrap();
        prop_assert!(left.right().all(|s| s == 0.0));
    }

    /// Property: panning never clips
    #[test]
    fn panning_peak_is_bounded(
        percent in -100i32..=100,
        samples in prop::collection::vec(-1.0f32..1.0, 1..512),
    ) {
        let clip = SampleBuffer::new(samples, 48000);
        let stereo = Panner.apply(&clip, &PanPosition::new(percent).unwrap()).unwrap();
        prop_assert!(stereo.peak() <= 1.0 + 1e-6);
        prop_assert_eq!(stereo.len(), clip.len());
    }

    /// Property: reverb output is len(clip) + len(ir) - 1
    #[test]
    fn reverb_length_includes_tail(
        clip in prop::collection::vec(-1.0f32..1.0, 1..2000),
        ir in prop::collection::vec(-1.0f32..1.0, 1..300),
    ) {
        let (clip_len, ir_len) = (clip.len(), ir.len());
        let response = ImpulseResponse::new("Random", SampleBuffer::new(ir, 44100)).unwrap();

        let wet = ConvolutionReverb.apply(&SampleBuffer::new(clip, 44100), &response).unwrap();

        prop_assert_eq!(wet.len(), clip_len + ir_len - 1);
        prop_assert!(wet.peak() <= 1.0 + 1e-6);
    }

    /// Property: discrete guesses are correct exactly when equal
    #[test]
    fn discrete_judging_is_equality(truth in 0usize..10, guess in 0usize..10) {
        let result = TrialOracle::default()
            .judge(&GroundTruth::Band(truth), &GroundTruth::Band(guess))
            .unwrap();
        prop_assert_eq!(result.correct, truth == guess);
    }

    /// Property: pan guesses are correct exactly within the tolerance
    #[test]
    fn pan_judging_respects_tolerance(
        truth in -100i32..=100,
        guess in -100i32..=100,
        tolerance in 1u32..=50,
    ) {
        let oracle = TrialOracle::new(tolerance).unwrap();
        let result = oracle
            .judge(
                &GroundTruth::Pan(PanPosition::new(truth).unwrap()),
                &GroundTruth::Pan(PanPosition::new(guess).unwrap()),
            )
            .unwrap();
        prop_assert_eq!(result.correct, truth.abs_diff(guess) <= tolerance);
    }
}
