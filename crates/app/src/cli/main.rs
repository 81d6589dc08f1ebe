//! Earworks CLI Application

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use earworks_core::domain::{
    ConfigManager, EarworksConfig, Exercise, FrequencyBand, ImpulseResponseExtractor, IrLibrary,
    ProcessedAudio, TrainingSession,
};
use earworks_infra::{ir_loader, wav};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "earworks")]
#[command(about = "Ear-training stimulus generator", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the frequency bands available at a sample rate
    Bands {
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,
    },
    /// Generate one trial and optionally judge a guess
    Trial {
        #[arg(short, long, value_enum)]
        exercise: ExerciseArg,
        /// Source recording (WAV)
        #[arg(short, long)]
        input: PathBuf,
        /// Directory for original.wav and processed.wav
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Seed for a reproducible trial
        #[arg(long)]
        seed: Option<u64>,
        /// Band index, pan percentage or reverb name
        ///
        /// Judged against the trial the same seed regenerates, so a seed
        /// from `--seed` or the config is required.
        #[arg(short, long)]
        guess: Option<String>,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Derive an impulse response from a dry/wet recording pair
    ExtractIr {
        #[arg(long)]
        dry: PathBuf,
        #[arg(long)]
        wet: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the factory default configuration
    InitConfig {
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExerciseArg {
    Band,
    Pan,
    Reverb,
}

impl From<ExerciseArg> for Exercise {
    fn from(arg: ExerciseArg) -> Self {
        match arg {
            ExerciseArg::Band => Exercise::BandBoost,
            ExerciseArg::Pan => Exercise::Panning,
            ExerciseArg::Reverb => Exercise::Reverb,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Bands { sample_rate } => list_bands(sample_rate),
        Commands::Trial {
            exercise,
            input,
            output_dir,
            seed,
            guess,
            config,
        } => run_trial(exercise.into(), &input, &output_dir, seed, guess.as_deref(), config.as_deref()),
        Commands::ExtractIr { dry, wet, output } => extract_ir(&dry, &wet, &output),
        Commands::InitConfig { path, force } => init_config(path, force),
    }
}

fn list_bands(sample_rate: u32) -> anyhow::Result<()> {
    let bands = FrequencyBand::standard_set(sample_rate);
    if bands.is_empty() {
        bail!("no standard band fits below the Nyquist limit at {sample_rate} Hz");
    }

    for (index, band) in bands.iter().enumerate() {
        println!("{index:>2}  {band}");
    }
    Ok(())
}

/// Load the configuration and the directory relative IR paths resolve against
fn load_config(path: Option<&Path>) -> anyhow::Result<(EarworksConfig, PathBuf)> {
    match path {
        Some(path) => {
            let config = EarworksConfig::load_from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            Ok((config, base_dir))
        }
        None => {
            let manager = ConfigManager::new(ConfigManager::default_config_dir()?);
            Ok((manager.load(), manager.config_dir().to_path_buf()))
        }
    }
}

fn run_trial(
    exercise: Exercise,
    input: &Path,
    output_dir: &Path,
    seed: Option<u64>,
    guess: Option<&str>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let (config, base_dir) = load_config(config_path)?;
    let settings = config.training;
    let seed = trial_seed(seed, settings.seed, guess.is_some())?;

    let library = if exercise == Exercise::Reverb {
        let report = ir_loader::load_library(&config.impulse_responses, Some(&base_dir));
        for failure in &report.failures {
            warn!(name = %failure.name, reason = %failure.reason, "Reverb unavailable");
        }
        report.library
    } else {
        IrLibrary::new()
    };

    let source = wav::read_mono(input).with_context(|| format!("failed to read {}", input.display()))?;

    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut session = TrainingSession::new(source, &settings, library, rng)?;
    let trial = session.next_trial(exercise)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    wav::write_mono(output_dir.join("original.wav"), &trial.clip().buffer)?;
    match trial.playback() {
        ProcessedAudio::Mono(buffer) => wav::write_mono(output_dir.join("processed.wav"), &buffer)?,
        ProcessedAudio::Stereo(buffer) => wav::write_stereo(output_dir.join("processed.wav"), &buffer)?,
    }

    info!(
        exercise = %exercise,
        clip_start = trial.clip().start,
        output_dir = %output_dir.display(),
        "Trial written"
    );

    match exercise {
        Exercise::BandBoost => {
            for (index, band) in session.bands().iter().enumerate() {
                eprintln!("{index:>2}  {band}");
            }
        }
        Exercise::Panning => eprintln!("Guess a pan position between -100 (left) and 100 (right)"),
        Exercise::Reverb => eprintln!("Reverbs: {}", session.reverb_names().join(", ")),
    }

    if let Some(guess) = guess {
        let guess = exercise.parse_guess(guess)?;
        let result = session.submit(&trial, &guess)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

/// Resolve the trial seed; a guess needs one so it answers the clip already heard
fn trial_seed(cli_seed: Option<u64>, config_seed: Option<u64>, has_guess: bool) -> anyhow::Result<Option<u64>> {
    let seed = cli_seed.or(config_seed);
    if has_guess && seed.is_none() {
        bail!("--guess needs --seed (or a seed in the config) so the judged trial is the one that was played");
    }
    Ok(seed)
}

fn extract_ir(dry: &Path, wet: &Path, output: &Path) -> anyhow::Result<()> {
    let dry = wav::read_mono(dry).with_context(|| format!("failed to read {}", dry.display()))?;
    let wet = wav::read_mono(wet).with_context(|| format!("failed to read {}", wet.display()))?;

    let extracted = ImpulseResponseExtractor::default().extract(&dry, &wet)?;
    wav::write_mono(output, &extracted.response)?;

    info!(
        samples = extracted.response.len(),
        raw_peak = extracted.raw_peak,
        truncated = extracted.truncated_samples,
        output = %output.display(),
        "Impulse response saved"
    );
    Ok(())
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = match path {
        Some(path) => path,
        None => ConfigManager::default_config_dir()?.join("config.toml"),
    };

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    EarworksConfig::factory_default().save_to_file(&path)?;
    println!("{}", path.display());
    Ok(())
}
