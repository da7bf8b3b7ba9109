use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use acoustic_danger::analysis::envelope::{
    amplitude_danger, extract_amplitudes, AmplitudeDanger, DEFAULT_LIMIT, DEFAULT_TARGET_POINTS,
};
use acoustic_danger::fixtures::{self, SyntheticPattern, SyntheticSpec, DEFAULT_SEED};
use acoustic_danger::model::{FilePredictor, HeuristicPredictor, PredictionReport};
use acoustic_danger::{AppConfig, AudioAnalyzer, AudioSignal, DirectoryEntry, FileSummary};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "danger_cli",
    about = "Acoustic danger analysis for recorded WAV files"
)]
struct Cli {
    /// JSON configuration file (assets/danger_config.json when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one WAV file and print its windows and summary
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print only the file summary
        #[arg(long)]
        summary_only: bool,
    },
    /// Analyze every WAV file of a directory
    AnalyzeDir {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a danger report for one WAV file
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the decimated amplitude envelope and its loudness danger
    Envelope {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_TARGET_POINTS)]
        points: usize,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Write a deterministic synthetic WAV file
    Synth {
        #[arg(long, value_enum)]
        pattern: PatternArg,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 5.0)]
        duration: f32,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        #[arg(long, default_value_t = 3000.0)]
        frequency: f32,
        /// Burst start in seconds (tone-burst only)
        #[arg(long, default_value_t = 1.0)]
        start: f32,
        /// Burst end in seconds (tone-burst only)
        #[arg(long, default_value_t = 2.0)]
        end: f32,
        #[arg(long, default_value_t = 0.8)]
        amplitude: f32,
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Silence,
    Sine,
    ToneBurst,
    Noise,
}

fn main() -> ExitCode {
    acoustic_danger::init_logging();
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
    let config = cli
        .config
        .as_deref()
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);

    match cli.command {
        Commands::Analyze {
            input,
            output,
            summary_only,
        } => run_analyze(config, &input, output, summary_only),
        Commands::AnalyzeDir { dir, output } => run_analyze_dir(config, &dir, output),
        Commands::Report { input, output } => run_report(config, &input, output),
        Commands::Envelope {
            input,
            points,
            limit,
        } => run_envelope(&input, points, limit),
        Commands::Synth {
            pattern,
            output,
            duration,
            sample_rate,
            frequency,
            start,
            end,
            amplitude,
            seed,
        } => {
            let pattern = match pattern {
                PatternArg::Silence => SyntheticPattern::Silence,
                PatternArg::Sine => SyntheticPattern::Sine {
                    frequency_hz: frequency,
                },
                PatternArg::ToneBurst => SyntheticPattern::ToneBurst {
                    frequency_hz: frequency,
                    start_s: start,
                    end_s: end,
                },
                PatternArg::Noise => SyntheticPattern::WhiteNoise { seed },
            };
            let spec = SyntheticSpec {
                pattern,
                sample_rate,
                duration_s: duration,
                amplitude,
            };
            run_synth(&spec, &output)
        }
    }
}

fn run_analyze(
    config: AppConfig,
    input: &Path,
    output: Option<PathBuf>,
    summary_only: bool,
) -> Result<ExitCode> {
    let mut analyzer = AudioAnalyzer::new(config);
    let analysis = analyzer
        .analyze_file(input)
        .with_context(|| format!("analyzing {}", input.display()))?;

    if summary_only {
        emit_json(&analysis.summary, output)?;
    } else {
        emit_json(&analysis, output)?;
    }
    Ok(ExitCode::from(0))
}

fn run_analyze_dir(config: AppConfig, dir: &Path, output: Option<PathBuf>) -> Result<ExitCode> {
    let mut analyzer = AudioAnalyzer::new(config);
    let entries = analyzer
        .analyze_directory(dir)
        .with_context(|| format!("analyzing directory {}", dir.display()))?;

    let failed = entries.iter().filter(|e| e.analysis.is_none()).count();
    let payload = DirectoryPayload {
        directory: dir.display().to_string(),
        file_count: entries.len(),
        failed_count: failed,
        files: entries.iter().map(DirectoryFile::from).collect(),
    };
    emit_json(&payload, output)?;

    // Partial failures are reported but do not abort the run
    Ok(if failed > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::from(0)
    })
}

fn run_report(config: AppConfig, input: &Path, output: Option<PathBuf>) -> Result<ExitCode> {
    let mut analyzer = AudioAnalyzer::new(config);
    let analysis = analyzer
        .analyze_file(input)
        .with_context(|| format!("analyzing {}", input.display()))?;

    let predictor = HeuristicPredictor;
    let report = PredictionReport::build(
        &analysis,
        &predictor,
        Some(&predictor as &dyn FilePredictor),
    )
    .with_context(|| format!("building report for {}", input.display()))?;

    emit_json(&report, output)?;
    Ok(ExitCode::from(0))
}

fn run_envelope(input: &Path, points: usize, limit: usize) -> Result<ExitCode> {
    let signal =
        AudioSignal::load_wav(input).with_context(|| format!("reading {}", input.display()))?;
    let amplitudes = extract_amplitudes(signal.samples(), points, limit);
    let danger = amplitude_danger(&amplitudes);

    emit_json(
        &EnvelopePayload {
            file: input.display().to_string(),
            sample_rate: signal.sample_rate(),
            amplitudes: &amplitudes,
            danger,
        },
        None,
    )?;
    Ok(ExitCode::from(0))
}

fn run_synth(spec: &SyntheticSpec, output: &Path) -> Result<ExitCode> {
    let signal = fixtures::generate(spec).context("generating synthetic signal")?;
    fixtures::write_wav(output, &signal)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("{}", output.display());
    Ok(ExitCode::from(0))
}

fn emit_json<T: Serialize>(value: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

#[derive(Serialize)]
struct DirectoryPayload<'a> {
    directory: String,
    file_count: usize,
    failed_count: usize,
    files: Vec<DirectoryFile<'a>>,
}

#[derive(Serialize)]
struct DirectoryFile<'a> {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a FileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a DirectoryEntry> for DirectoryFile<'a> {
    fn from(entry: &'a DirectoryEntry) -> Self {
        Self {
            path: entry.path.display().to_string(),
            summary: entry.analysis.as_ref().map(|a| &a.summary),
            error: entry.error.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct EnvelopePayload<'a> {
    file: String,
    sample_rate: u32,
    amplitudes: &'a [f32],
    danger: AmplitudeDanger,
}
