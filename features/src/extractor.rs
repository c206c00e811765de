//! Shared extraction interface and the engine dispatcher.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeatureError;
use crate::lpc::{Lpc, LpcConfig};
use crate::lpcc::{Lpcc, LpccConfig};
use crate::matrix::FeatureMatrix;
use crate::mfcc::{Mfcc, MfccConfig};
use crate::plp::{Plp, PlpConfig};
use crate::power_spectrum::{PowerSpectrum, PowerSpectrumConfig};

/// Interface every extraction engine implements.
///
/// Engines validate their configuration when constructed; processing
/// itself cannot fail. Degenerate input (silence, too few frames)
/// yields zeroed rows or absent statistics rather than errors.
pub trait FeatureExtractor {
    /// Processes a raw signal, framing it first.
    fn process(&mut self, samples: &[f64]);

    /// Processes frames prepared by the caller.
    fn process_frames(&mut self, frames: &mut [Vec<f64>]);

    /// Extracted rows, one per frame unless the engine documents otherwise.
    fn feature(&self) -> &[Vec<f64>];

    /// Column means, present when more than one row was extracted.
    fn mean(&self) -> Option<&[f64]>;

    /// Column standard deviations, present alongside the means.
    fn stddev(&self) -> Option<&[f64]>;
}

/// The extraction engines by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    PowerSpectrum,
    Lpc,
    Lpcc,
    Mfcc,
    Plp,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 5] = [
        FeatureKind::PowerSpectrum,
        FeatureKind::Lpc,
        FeatureKind::Lpcc,
        FeatureKind::Mfcc,
        FeatureKind::Plp,
    ];

    fn name(self) -> &'static str {
        match self {
            FeatureKind::PowerSpectrum => "power_spectrum",
            FeatureKind::Lpc => "lpc",
            FeatureKind::Lpcc => "lpcc",
            FeatureKind::Mfcc => "mfcc",
            FeatureKind::Plp => "plp",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "power_spectrum" | "ps" => Ok(FeatureKind::PowerSpectrum),
            "lpc" => Ok(FeatureKind::Lpc),
            "lpcc" => Ok(FeatureKind::Lpcc),
            "mfcc" => Ok(FeatureKind::Mfcc),
            "plp" => Ok(FeatureKind::Plp),
            other => Err(format!(
                "unknown feature '{other}', expected one of: power_spectrum, lpc, lpcc, mfcc, plp"
            )),
        }
    }
}

/// Per-engine configuration for [`extract`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractParams {
    pub power_spectrum: PowerSpectrumConfig,
    pub lpc: LpcConfig,
    pub lpcc: LpccConfig,
    pub mfcc: MfccConfig,
    pub plp: PlpConfig,
}

/// Runs one engine over a signal and returns its output.
pub fn extract(
    kind: FeatureKind,
    samples: &[f64],
    sample_rate: f64,
    params: &ExtractParams,
) -> Result<FeatureMatrix, FeatureError> {
    debug!(
        "Extracting {} from {} samples at {} Hz",
        kind,
        samples.len(),
        sample_rate
    );

    match kind {
        FeatureKind::PowerSpectrum => {
            let mut engine = PowerSpectrum::new(sample_rate, params.power_spectrum.clone())?;
            engine.process(samples);
            Ok(engine.into_feature())
        }
        FeatureKind::Lpc => {
            let mut engine = Lpc::new(params.lpc.clone())?;
            engine.process(samples);
            Ok(engine.into_feature())
        }
        FeatureKind::Lpcc => {
            let mut engine = Lpcc::new(params.lpcc.clone())?;
            engine.process(samples);
            Ok(engine.into_feature())
        }
        FeatureKind::Mfcc => {
            let mut engine = Mfcc::new(sample_rate, params.mfcc.clone())?;
            engine.process(samples);
            Ok(engine.into_feature())
        }
        FeatureKind::Plp => {
            let mut engine = Plp::new(sample_rate, params.plp.clone())?;
            engine.process(samples);
            Ok(engine.into_feature())
        }
    }
}
