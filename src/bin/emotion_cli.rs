use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use emotion_pipeline::analysis::{FeatureExtractor, FeatureLayout};
use emotion_pipeline::audio::load_waveform;
use emotion_pipeline::config::{ArtifactPaths, PipelineConfig};
use emotion_pipeline::fixtures::{run_fixture, FixtureCatalog, FixtureOutcome};
use emotion_pipeline::pipeline::{EmotionPipeline, PredictionResult};
use emotion_pipeline::testing::artifacts::{synthetic_artifacts, write_artifacts};
use emotion_pipeline::testing::signals::{write_wav, SignalPattern};
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "emotion_cli",
    about = "Speech emotion prediction from WAV clips"
)]
struct Cli {
    /// Pipeline configuration JSON (defaults to assets/pipeline_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding model.onnx, scaler.json and labels.json; overrides config paths
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,
    /// Override directory containing fixture assets (defaults to the crate's fixtures/)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Predict the emotion of a WAV file
    Predict {
        #[arg(long)]
        file: PathBuf,
        /// Include every class probability in the report
        #[arg(long)]
        detailed: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the extracted feature vector of a WAV file
    Features {
        #[arg(long)]
        file: PathBuf,
    },
    /// Summarize the loaded artifacts and check them against the extractor
    Inspect,
    /// Run regression fixtures and compare against expectations
    CheckFixtures {
        /// Run a single fixture by name or path
        #[arg(long)]
        fixture: Option<String>,
        #[arg(long)]
        expect: Option<PathBuf>,
    },
    /// Write a synthetic scaler/model/labels set for the configured layout
    SynthArtifacts {
        #[arg(long)]
        out: PathBuf,
    },
    /// Write a deterministic test clip
    SynthWav {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = PatternArg::Sine)]
        pattern: PatternArg,
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
        #[arg(long, default_value_t = 1.0)]
        seconds: f32,
        #[arg(long, default_value_t = 0.5)]
        amplitude: f32,
        #[arg(long)]
        sample_rate: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Sine,
    Square,
    WhiteNoise,
    Silence,
}

impl From<PatternArg> for SignalPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Sine => SignalPattern::Sine,
            PatternArg::Square => SignalPattern::Square,
            PatternArg::WhiteNoise => SignalPattern::WhiteNoise,
            PatternArg::Silence => SignalPattern::Silence,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load_from_file(path),
        None => PipelineConfig::load(),
    };
    if let Some(dir) = &cli.artifacts_dir {
        config.artifacts = ArtifactPaths {
            model: dir.join("model.onnx"),
            scaler: dir.join("scaler.json"),
            labels: dir.join("labels.json"),
        };
    }
    let catalog = cli
        .fixtures_dir
        .clone()
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Predict {
            file,
            detailed,
            output,
        } => run_predict(&config, &file, detailed, output),
        Commands::Features { file } => run_features(&config, &file),
        Commands::Inspect => run_inspect(&config),
        Commands::CheckFixtures { fixture, expect } => {
            run_check_fixtures(&config, &catalog, fixture, expect)
        }
        Commands::SynthArtifacts { out } => run_synth_artifacts(&config, &out),
        Commands::SynthWav {
            out,
            pattern,
            frequency,
            seconds,
            amplitude,
            sample_rate,
        } => {
            let rate = sample_rate.unwrap_or(config.audio.sample_rate);
            run_synth_wav(&out, pattern.into(), frequency, seconds, amplitude, rate)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn build_pipeline(config: &PipelineConfig) -> Result<EmotionPipeline> {
    let base = std::env::current_dir().context("resolving working directory")?;
    EmotionPipeline::from_config(config, &base).context("loading pipeline artifacts")
}

fn run_predict(
    config: &PipelineConfig,
    file: &Path,
    detailed: bool,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let pipeline = build_pipeline(config)?;
    let result = if detailed {
        pipeline.predict_detailed(file)
    } else {
        pipeline.predict(file)
    };

    let report = PredictReport {
        file: file.display().to_string(),
        result: &result,
    };
    let json = serde_json::to_string_pretty(&report)?;
    if let Some(path) = output {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    if result.is_success() {
        Ok(ExitCode::from(0))
    } else {
        let (message, _) = result.display_pair();
        eprintln!("{message}");
        Ok(ExitCode::from(2))
    }
}

fn run_features(config: &PipelineConfig, file: &Path) -> Result<ExitCode> {
    let extractor = FeatureExtractor::new(config.audio.sample_rate, &config.features)
        .context("building feature extractor")?;
    let waveform = load_waveform(file, extractor.sample_rate())
        .with_context(|| format!("decoding {}", file.display()))?;
    let features = extractor
        .extract(&waveform)
        .with_context(|| format!("extracting features from {}", file.display()))?;

    let report = FeatureReport {
        file: file.display().to_string(),
        sample_rate: waveform.sample_rate(),
        duration_secs: waveform.duration_secs(),
        length: features.len(),
        zcr: features.zcr(),
        chroma: features.chroma(),
        mfcc: features.mfcc(),
        rms: features.rms(),
        mel: features.mel(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_inspect(config: &PipelineConfig) -> Result<ExitCode> {
    let pipeline = build_pipeline(config)?;
    let artifacts = pipeline.artifacts();
    let report = InspectReport {
        sample_rate: pipeline.extractor().sample_rate(),
        feature_len: pipeline.extractor().output_len(),
        layout: pipeline.extractor().layout(),
        scaler_dimension: artifacts.normalizer.dimension(),
        model_input_len: artifacts.classifier.input_len(),
        model_input: artifacts.classifier.input_name(),
        model_input_shape: artifacts.classifier.input_shape(),
        model_output: artifacts.classifier.output_name(),
        model_output_len: artifacts.classifier.output_len(),
        labels: artifacts.labels.classes(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_check_fixtures(
    config: &PipelineConfig,
    catalog: &FixtureCatalog,
    fixture: Option<String>,
    override_expect: Option<PathBuf>,
) -> Result<ExitCode> {
    let pipeline = build_pipeline(config)?;
    let outcomes: Vec<FixtureOutcome> = match fixture {
        Some(name) => {
            let case = catalog.load(&name, override_expect)?;
            vec![run_fixture(&pipeline, &case)]
        }
        None => catalog.run_all(&pipeline)?,
    };

    if outcomes.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    let mut failed = 0;
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(&outcome.to_json())?);
        if let Some(diff) = &outcome.diff {
            eprintln!("{}", serde_json::to_string_pretty(&diff.to_json())?);
            failed += 1;
        }
    }

    if failed == 0 {
        Ok(ExitCode::from(0))
    } else {
        eprintln!("{failed} of {} fixtures failed", outcomes.len());
        Ok(ExitCode::from(2))
    }
}

fn run_synth_artifacts(config: &PipelineConfig, out: &Path) -> Result<ExitCode> {
    let layout = FeatureLayout::from_config(&config.features);
    let set = synthetic_artifacts(layout).context("building synthetic artifacts")?;
    let paths = write_artifacts(out, &set)?;
    println!(
        "Wrote {}, {}, {}",
        paths.scaler.display(),
        paths.model.display(),
        paths.labels.display()
    );
    Ok(ExitCode::from(0))
}

fn run_synth_wav(
    out: &Path,
    pattern: SignalPattern,
    frequency: f32,
    seconds: f32,
    amplitude: f32,
    sample_rate: u32,
) -> Result<ExitCode> {
    let n_samples = (seconds.max(0.0) * sample_rate as f32).round() as usize;
    let samples = pattern.render(sample_rate, frequency, n_samples, amplitude);
    write_wav(out, &samples, sample_rate).with_context(|| format!("writing {}", out.display()))?;
    println!("Wrote {} ({} samples at {} Hz)", out.display(), n_samples, sample_rate);
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct PredictReport<'a> {
    file: String,
    result: &'a PredictionResult,
}

#[derive(Serialize)]
struct FeatureReport<'a> {
    file: String,
    sample_rate: u32,
    duration_secs: f32,
    length: usize,
    zcr: f32,
    chroma: &'a [f32],
    mfcc: &'a [f32],
    rms: f32,
    mel: &'a [f32],
}

#[derive(Serialize)]
struct InspectReport<'a> {
    sample_rate: u32,
    feature_len: usize,
    layout: FeatureLayout,
    scaler_dimension: usize,
    model_input_len: usize,
    model_input: &'a str,
    model_input_shape: &'a [usize],
    model_output: &'a str,
    model_output_len: usize,
    labels: &'a [String],
}
