//! Example walking through one round of every exercise
//!
//! Run with: cargo run --package earworks-core --example session_demo

use earworks_core::domain::{
    Exercise, ImpulseResponse, IrLibrary, ProcessedAudio, SampleBuffer, TrainingSession,
    TrainingSettings,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const SAMPLE_RATE: u32 = 44100;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("earworks_core=debug,info")
        .init();

    println!("=== Earworks Session Demo ===\n");

    // A ten second chord stands in for a decoded recording
    let source: Vec<f32> = (0..SAMPLE_RATE as usize * 10)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            [220.0_f32, 277.2, 329.6]
                .iter()
                .map(|f| 0.2 * (2.0 * std::f32::consts::PI * f * t).sin())
                .sum()
        })
        .collect();

    let mut library = IrLibrary::new();
    for (name, seconds) in [("Small Room", 0.3_f32), ("Church", 2.5)] {
        let len = (seconds * SAMPLE_RATE as f32) as usize;
        let decay = (-6.908 / len as f32).exp();
        let tail = (0..len).map(|i| 0.5 * decay.powi(i as i32)).collect();
        library.insert(ImpulseResponse::new(name, SampleBuffer::new(tail, SAMPLE_RATE))?);
    }

    let settings = TrainingSettings {
        seed: Some(7),
        ..TrainingSettings::default()
    };
    let rng = StdRng::seed_from_u64(settings.seed.unwrap_or_default());
    let mut session = TrainingSession::new(SampleBuffer::new(source, SAMPLE_RATE), &settings, library, rng)?;

    for exercise in Exercise::ALL {
        let trial = session.next_trial(exercise)?;
        let layout = match trial.processed() {
            ProcessedAudio::Mono(_) => "mono",
            ProcessedAudio::Stereo(_) => "stereo",
        };

        println!("{exercise}:");
        println!("   clip starts at sample {}", trial.clip().start);
        println!("   processed: {} {layout} frames", trial.processed().len());
        println!("   playback:  {} frames", trial.playback().len());

        // Answer with the ground truth to show a correct judgement
        let result = session.submit(&trial, trial.ground_truth())?;
        println!("   answer {} -> correct: {}\n", result.ground_truth, result.correct);
    }

    Ok(())
}
