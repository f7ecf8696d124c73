use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};
use wavefeat_lib::{
    detectors::{
        extrema::ExtremaConfig,
        waveform::{
            find_peaks_with_config, find_troughs_with_config, segment_cycles, CYCLES, PEAKS,
            TROUGHS,
        },
    },
    io::{csv as csv_io, text as text_io},
    signal::WaveformSeries,
    synthetic::{GeneratorParams, NoiseParams, PRESSURE_COLUMN},
    waveforms::Waveforms,
};

/// Column name given to newline-delimited input.
const TEXT_COLUMN: &str = "signal";

#[derive(Parser)]
#[command(
    name = "wavefeat",
    version,
    about = "Cycle landmark extraction for physiological waveforms"
)]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FeatureKind {
    Troughs,
    Peaks,
    Cycles,
}

impl FeatureKind {
    fn as_str(&self) -> &'static str {
        match self {
            FeatureKind::Troughs => TROUGHS,
            FeatureKind::Peaks => PEAKS,
            FeatureKind::Cycles => CYCLES,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic arterial pressure waveform
    Simulate {
        /// TOML file with generator parameters; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        systolic: Option<f64>,
        #[arg(long)]
        diastolic: Option<f64>,
        #[arg(long)]
        heart_rate: Option<f64>,
        #[arg(long)]
        beats: Option<f64>,
        #[arg(long)]
        fs: Option<f64>,
        /// Uniform noise amplitude
        #[arg(long)]
        noise: Option<f64>,
        /// Noise seed
        #[arg(long, requires = "noise")]
        seed: Option<u64>,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Extract cycle landmarks from a CSV table or newline-delimited samples
    Extract {
        /// Input file; `.csv` is read as a table, anything else as one sample per line
        #[arg(long)]
        input: Option<PathBuf>,
        /// Restrict extraction to these columns (default: every numeric column)
        #[arg(long)]
        column: Vec<String>,
        #[arg(long, value_enum, default_value = "troughs")]
        kind: Vec<FeatureKind>,
        /// Expected cycle length in samples
        #[arg(long, conflicts_with_all = ["fs", "heart_rate"])]
        cycle_samples: Option<f64>,
        #[arg(long, requires = "heart_rate")]
        fs: Option<f64>,
        #[arg(long, requires = "fs")]
        heart_rate: Option<f64>,
        /// Minimum prominence as a fraction of the waveform range
        #[arg(long)]
        min_prominence: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();
    match cli.command {
        Commands::Simulate {
            config,
            systolic,
            diastolic,
            heart_rate,
            beats,
            fs,
            noise,
            seed,
            format,
        } => {
            let mut params = match config {
                Some(path) => load_params(&path)?,
                None => GeneratorParams::default(),
            };
            if let Some(v) = systolic {
                params.systolic_pressure = v;
            }
            if let Some(v) = diastolic {
                params.diastolic_pressure = v;
            }
            if let Some(v) = heart_rate {
                params.heart_rate = v;
            }
            if let Some(v) = beats {
                params.n_beats_target = v;
            }
            if let Some(v) = fs {
                params.hertz = v;
            }
            if let Some(amplitude) = noise {
                params.noise = Some(NoiseParams {
                    amplitude,
                    seed: seed.unwrap_or_default(),
                });
            }
            cmd_simulate(&params, format)?
        }
        Commands::Extract {
            input,
            column,
            kind,
            cycle_samples,
            fs,
            heart_rate,
            min_prominence,
        } => {
            let mut cfg = match (fs, heart_rate) {
                (Some(fs), Some(hr)) => ExtremaConfig::for_rate(fs, hr),
                _ => ExtremaConfig::default(),
            };
            if cycle_samples.is_some() {
                cfg.cycle_samples = cycle_samples;
            }
            cfg.min_prominence_fraction = min_prominence;
            cmd_extract(input.as_deref(), &column, &kind, &cfg)?
        }
    }
    Ok(())
}

fn load_params(path: &Path) -> Result<GeneratorParams> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid generator config {}", path.display()))
}

fn cmd_simulate(params: &GeneratorParams, format: OutputFormat) -> Result<()> {
    let series = params.generate()?;
    info!(
        "generated {} samples ({:.1} samples per cycle)",
        series.len(),
        params.expected_cycle_samples()
    );
    match format {
        OutputFormat::Text => print!("{}", text_io::format_f64_series(&series)),
        OutputFormat::Csv => {
            println!("{}", PRESSURE_COLUMN);
            print!("{}", text_io::format_f64_series(&series));
        }
    }
    Ok(())
}

fn load_waveforms(input: Option<&Path>) -> Result<Waveforms> {
    match input {
        Some(path) if is_csv(path) => {
            let table = csv_io::read_csv_table(path)?;
            Ok(Waveforms::from_table(&table)?)
        }
        Some(path) => {
            let series = text_io::read_f64_series(path)?;
            Ok(Waveforms::from_series([(TEXT_COLUMN, series)]))
        }
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            let series = WaveformSeries::new(text_io::parse_f64_series(&buf)?);
            Ok(Waveforms::from_series([(TEXT_COLUMN, series)]))
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn cmd_extract(
    input: Option<&Path>,
    columns: &[String],
    kinds: &[FeatureKind],
    cfg: &ExtremaConfig,
) -> Result<()> {
    let mut waveforms = load_waveforms(input)?;
    let names: Vec<String> = if columns.is_empty() {
        waveforms.names().map(str::to_string).collect()
    } else {
        columns.to_vec()
    };
    for name in &names {
        for kind in kinds {
            match kind {
                FeatureKind::Troughs => {
                    find_troughs_with_config(&mut waveforms, name, cfg)?;
                }
                FeatureKind::Peaks => {
                    find_peaks_with_config(&mut waveforms, name, cfg)?;
                }
                FeatureKind::Cycles => {
                    find_troughs_with_config(&mut waveforms, name, cfg)?;
                    segment_cycles(&mut waveforms, name)?;
                }
            }
        }
        info!(
            "{}: computed {:?}",
            name,
            waveforms
                .features_of(name)?
                .map(|f| f.keys().cloned().collect::<Vec<_>>())
                .unwrap_or_default()
        );
    }
    let selected: serde_json::Map<String, serde_json::Value> = names
        .iter()
        .map(|name| -> Result<(String, serde_json::Value)> {
            let features = waveforms.features_of(name)?;
            let mut entry = serde_json::Map::new();
            if let Some(features) = features {
                for (kind, value) in features {
                    if kinds.iter().any(|k| k.as_str() == kind) {
                        entry.insert(kind.clone(), serde_json::to_value(value)?);
                    }
                }
            }
            Ok((name.clone(), serde_json::Value::Object(entry)))
        })
        .collect::<Result<_>>()?;
    println!("{}", serde_json::to_string(&selected)?);
    Ok(())
}
