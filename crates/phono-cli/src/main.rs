use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use phono_lib::{
    backend::{BackendMode, BackendSelector, ReferenceBackend},
    config::{read_config, PhonoConfig},
    detectors::pcg::min_peak_distance,
    io::{text as text_io, wav as wav_io},
    metrics::rhythm::classify_rr,
    signal::{PeakSet, RRIntervals, Waveform},
};
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "phono",
    version,
    about = "Heart-sound recording analysis: heart rate and rhythm alerts"
)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum BackendArg {
    Auto,
    Native,
    Reference,
}

impl From<BackendArg> for BackendMode {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => BackendMode::Auto,
            BackendArg::Native => BackendMode::Native,
            BackendArg::Reference => BackendMode::Reference,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a mono 16-bit WAV recording and print the result record
    Analyze {
        #[arg(long)]
        input: PathBuf,
        /// Overrides `[backend] mode` from the config file
        #[arg(long)]
        backend: Option<BackendArg>,
    },
    /// Print the beat positions detected in a WAV recording
    Peaks {
        #[arg(long)]
        input: PathBuf,
    },
    /// Classify newline-delimited RR intervals (seconds) from stdin or --input file
    Classify {
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct PeaksOutput {
    sample_rate: u32,
    min_distance: usize,
    #[serde(flatten)]
    peaks: PeakSet,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => PhonoConfig::default(),
    };
    if cli.pretty {
        config.output.pretty = true;
    }
    match cli.command {
        Commands::Analyze { input, backend } => {
            if let Some(mode) = backend {
                config.backend.mode = mode.into();
            }
            cmd_analyze(&input, &config)?
        }
        Commands::Peaks { input } => cmd_peaks(&input, &config)?,
        Commands::Classify { input } => cmd_classify(input.as_deref(), &config)?,
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, config: &PhonoConfig) -> Result<()> {
    let js = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", js);
    Ok(())
}

fn load_waveform(input: &Path) -> Result<Waveform> {
    let recording =
        wav_io::read_wav(input).with_context(|| format!("loading {}", input.display()))?;
    let waveform = recording
        .normalize()
        .with_context(|| format!("normalizing {}", input.display()))?;
    info!(
        "loaded {} samples at {} Hz ({:.2} s)",
        waveform.len(),
        waveform.sample_rate(),
        waveform.duration()
    );
    Ok(waveform)
}

fn read_rr(input: Option<&Path>) -> Result<RRIntervals> {
    match input {
        Some(path) => text_io::read_rr_intervals(path),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            text_io::parse_rr_intervals(&buf)
        }
    }
}

fn cmd_analyze(input: &Path, config: &PhonoConfig) -> Result<()> {
    let waveform = load_waveform(input)?;
    let selector = BackendSelector::new(config.native_availability());
    let (result, backend) = selector
        .run(&waveform)
        .with_context(|| format!("analyzing {}", input.display()))?;
    info!(
        "{} backend: {:.1} bpm from {} beats",
        backend, result.bpm, result.peak_count
    );
    print_json(&result, config)
}

fn cmd_peaks(input: &Path, config: &PhonoConfig) -> Result<()> {
    let waveform = load_waveform(input)?;
    let trace = ReferenceBackend
        .trace(&waveform)
        .with_context(|| format!("detecting beats in {}", input.display()))?;
    let out = PeaksOutput {
        sample_rate: waveform.sample_rate(),
        min_distance: min_peak_distance(waveform.fs()),
        peaks: trace.peaks,
    };
    print_json(&out, config)
}

fn cmd_classify(input: Option<&Path>, config: &PhonoConfig) -> Result<()> {
    let rr = read_rr(input)?;
    let result = classify_rr(rr);
    print_json(&result, config)
}
