//! sonid - Bioacoustic WAV decoding and feature-extraction CLI.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use sonid_dsp::WindowKind;
use sonid_features::{
    Correlation, ExtractParams, FeatureKind, FeatureMatrix, KeyedSample, extract, pearson,
};
use sonid_wav::{TargetFormat, WavDecoder, WavError, WavHeader, clock};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Bioacoustic feature extraction from WAV recordings.
///
/// Decodes 48 kHz / 16-bit PCM recordings and runs the selected
/// extraction engines over them. Recordings in any other format must be
/// transcoded before analysis.
#[derive(Parser)]
#[command(name = "sonid")]
#[command(about = "Bioacoustic WAV feature extraction")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header and duration information as JSON
    Info(InfoArgs),
    /// Extract features into a JSON report
    Extract(ExtractArgs),
    /// Correlate the power spectra of two recordings
    Compare(CompareArgs),
}

#[derive(clap::Args)]
struct InfoArgs {
    /// Input WAV file
    input: PathBuf,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Input WAV file
    input: PathBuf,

    /// Comma-separated feature kinds (power_spectrum, lpc, lpcc, mfcc, plp, all)
    #[arg(short = 'f', long, default_value = "mfcc")]
    features: String,

    /// Channel to decode (1-based)
    #[arg(long, default_value_t = 1)]
    channel: u16,

    /// Start of the analyzed segment in milliseconds
    #[arg(long, default_value_t = 0)]
    from_ms: u64,

    /// End of the analyzed segment in milliseconds (default: whole file)
    #[arg(long)]
    to_ms: Option<u64>,

    /// Window function override (rectangular, bartlett, blackman, hamming, hanning)
    #[arg(long)]
    window: Option<String>,

    /// Power spectrum band start in Hz
    #[arg(long)]
    ps_initial: Option<u32>,

    /// Power spectrum band end in Hz
    #[arg(long)]
    ps_final: Option<u32>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CompareArgs {
    /// First WAV file
    first: PathBuf,

    /// Second WAV file
    second: PathBuf,

    /// Minimum number of shared frequencies, 0 disables the gate
    #[arg(long, default_value_t = 0)]
    min_records: usize,

    /// Power spectrum band start in Hz
    #[arg(long)]
    ps_initial: Option<u32>,

    /// Power spectrum band end in Hz
    #[arg(long)]
    ps_final: Option<u32>,
}

#[derive(Serialize)]
struct InfoReport<'a> {
    file: String,
    header: &'a WavHeader,
    data_size: usize,
    samples_per_channel: usize,
    duration_ms: u64,
    duration: String,
}

#[derive(Serialize)]
struct ExtractReport {
    file: String,
    duration_ms: u64,
    duration: String,
    segment_ms: [u64; 2],
    features: BTreeMap<String, FeatureMatrix>,
}

#[derive(Serialize)]
struct CompareReport {
    first: String,
    second: String,
    #[serde(flatten)]
    correlation: Correlation,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Info(args) => info(args),
        Commands::Extract(args) => run_extract(args),
        Commands::Compare(args) => compare(args),
    }
}

fn open_decoder(path: &Path) -> Result<WavDecoder> {
    WavDecoder::open(path, TargetFormat::default()).map_err(|e| match e {
        WavError::TargetMismatch { .. } => anyhow!(e).context(format!(
            "{} does not match the analysis target; transcode it to 48 kHz / 16-bit PCM first",
            path.display()
        )),
        e => anyhow!(e).context(format!("cannot read {}", path.display())),
    })
}

fn info(args: &InfoArgs) -> Result<()> {
    let decoder = open_decoder(&args.input)?;
    let duration_ms = decoder.total_time_ms();

    let report = InfoReport {
        file: args.input.display().to_string(),
        header: decoder.header(),
        data_size: decoder.data_size(),
        samples_per_channel: decoder.num_samples_per_channel(),
        duration_ms,
        duration: clock::digital_format(duration_ms),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn run_extract(args: &ExtractArgs) -> Result<()> {
    let kinds = parse_kinds(&args.features)?;
    let params = build_params(args.window.as_deref(), args.ps_initial, args.ps_final)?;

    let mut decoder = open_decoder(&args.input)?;
    let channels = decoder.header().channels;
    if args.channel == 0 || args.channel > channels {
        bail!(
            "channel {} out of range, the recording has {} channel(s)",
            args.channel,
            channels
        );
    }

    let duration_ms = decoder.total_time_ms();
    let (initial, last) = segment(&decoder, args.from_ms, args.to_ms)?;
    let samples = decoder.amplitudes_chunk(args.channel, initial..=last)?;
    let sample_rate = f64::from(decoder.header().sample_rate);
    debug!(
        "Decoded {} samples from channel {} of {}",
        samples.len(),
        args.channel,
        args.input.display()
    );

    let mut features = BTreeMap::new();
    for kind in kinds {
        let feature = extract(kind, &samples, sample_rate, &params)?;
        features.insert(kind.to_string(), feature);
    }

    let report = ExtractReport {
        file: args.input.display().to_string(),
        duration_ms,
        duration: clock::digital_format(duration_ms),
        segment_ms: [args.from_ms, args.to_ms.unwrap_or(duration_ms)],
        features,
    };
    let rendered = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => println!("{rendered}"),
    }

    Ok(())
}

fn compare(args: &CompareArgs) -> Result<()> {
    let params = build_params(None, args.ps_initial, args.ps_final)?;

    let first = keyed_spectrum(&args.first, &params)?;
    let second = keyed_spectrum(&args.second, &params)?;
    let correlation = pearson(&first, &second, args.min_records);

    let report = CompareReport {
        first: args.first.display().to_string(),
        second: args.second.display().to_string(),
        correlation,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Power spectrum of a whole recording as a frequency-keyed sample.
fn keyed_spectrum(path: &Path, params: &ExtractParams) -> Result<KeyedSample> {
    let mut decoder = open_decoder(path)?;
    let (initial, last) = segment(&decoder, 0, None)?;
    let samples = decoder.amplitudes_chunk(1, initial..=last)?;
    let sample_rate = f64::from(decoder.header().sample_rate);

    let feature = extract(FeatureKind::PowerSpectrum, &samples, sample_rate, params)?;
    Ok(feature.rows[0]
        .iter()
        .zip(&feature.rows[1])
        .map(|(&frequency, &decibel)| (frequency as i64, decibel))
        .collect())
}

/// Maps a millisecond segment onto an inclusive sample range.
fn segment(decoder: &WavDecoder, from_ms: u64, to_ms: Option<u64>) -> Result<(usize, usize)> {
    let per_channel = decoder.num_samples_per_channel();
    if per_channel == 0 {
        bail!("the recording has no samples");
    }

    let initial = decoder.sample_from_time(from_ms);
    let last = match to_ms {
        Some(ms) => decoder.sample_from_time(ms).min(per_channel - 1),
        None => per_channel - 1,
    };
    if initial > last {
        bail!("segment start {from_ms} ms lies past its end");
    }

    Ok((initial, last))
}

fn parse_kinds(list: &str) -> Result<Vec<FeatureKind>> {
    if list.trim().eq_ignore_ascii_case("all") {
        return Ok(FeatureKind::ALL.to_vec());
    }

    let mut kinds = Vec::new();
    for name in list.split(',') {
        if name.trim().is_empty() {
            continue;
        }
        let kind = name.parse::<FeatureKind>().map_err(|e| anyhow!(e))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    if kinds.is_empty() {
        bail!("no feature kinds requested");
    }

    Ok(kinds)
}

fn build_params(
    window: Option<&str>,
    ps_initial: Option<u32>,
    ps_final: Option<u32>,
) -> Result<ExtractParams> {
    let mut params = ExtractParams::default();

    if let Some(name) = window {
        let kind = parse_window(name)?;
        params.lpc.window = kind;
        params.lpcc.window = kind;
        params.mfcc.window = kind;
        params.plp.window = kind;
        params.power_spectrum.window = kind;
    }
    if let Some(initial) = ps_initial {
        params.power_spectrum.initial_frequency = initial;
    }
    if ps_final.is_some() {
        params.power_spectrum.final_frequency = ps_final;
    }

    Ok(params)
}

fn parse_window(name: &str) -> Result<WindowKind> {
    match name.to_ascii_lowercase().as_str() {
        "rectangular" => Ok(WindowKind::Rectangular),
        "bartlett" => Ok(WindowKind::Bartlett),
        "blackman" => Ok(WindowKind::Blackman),
        "hamming" => Ok(WindowKind::Hamming),
        "hanning" => Ok(WindowKind::Hanning),
        other => bail!(
            "unknown window '{other}', expected one of: rectangular, bartlett, blackman, hamming, hanning"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_lists() {
        let kinds = parse_kinds("mfcc, lpc,mfcc").unwrap();
        assert_eq!(kinds, [FeatureKind::Mfcc, FeatureKind::Lpc]);

        assert_eq!(parse_kinds("all").unwrap().len(), 5);
        assert!(parse_kinds("spectrogram").is_err());
        assert!(parse_kinds("").is_err());
    }

    #[test]
    fn window_override_reaches_every_engine() {
        let params = build_params(Some("hanning"), Some(100), Some(8000)).unwrap();

        assert_eq!(params.mfcc.window, WindowKind::Hanning);
        assert_eq!(params.plp.window, WindowKind::Hanning);
        assert_eq!(params.power_spectrum.initial_frequency, 100);
        assert_eq!(params.power_spectrum.final_frequency, Some(8000));
    }

    #[test]
    fn rejects_unknown_window() {
        assert!(parse_window("kaiser").is_err());
    }
}
