//! Acoustic feature extraction for species identification.
//!
//! Five engines share the [`FeatureExtractor`] interface:
//!
//! - [`PowerSpectrum`], peak-held dBFS intensity per frequency
//! - [`Lpc`], linear prediction coefficients
//! - [`Lpcc`], cepstral coefficients derived from linear prediction
//! - [`Mfcc`], mel-frequency cepstral coefficients with delta terms
//! - [`Plp`], perceptual linear prediction over a Bark filter bank
//!
//! [`extract`] dispatches by [`FeatureKind`] and returns a
//! [`FeatureMatrix`] of rounded coefficients with per-column statistics.
//! [`pearson`] compares two keyed spectra.
//!
//! ```
//! use sonid_features::{ExtractParams, FeatureKind, extract};
//!
//! let samples: Vec<f64> = (0..4096)
//!     .map(|t| 16_000.0 * (2.0 * std::f64::consts::PI * 440.0 * t as f64 / 48_000.0).sin())
//!     .collect();
//!
//! let mfcc = extract(FeatureKind::Mfcc, &samples, 48_000.0, &ExtractParams::default())?;
//! assert_eq!(mfcc.rows.len(), 8);
//! # Ok::<(), sonid_features::FeatureError>(())
//! ```

pub mod correlation;
pub mod error;
pub mod extractor;
pub mod lpc;
pub mod lpcc;
pub mod matrix;
pub mod mfcc;
pub mod plp;
pub mod power_spectrum;

pub use correlation::{Correlation, KeyedSample, pearson};
pub use error::FeatureError;
pub use extractor::{ExtractParams, FeatureExtractor, FeatureKind, extract};
pub use lpc::{Lpc, LpcConfig};
pub use lpcc::{Lpcc, LpccConfig};
pub use matrix::FeatureMatrix;
pub use mfcc::{Mfcc, MfccConfig};
pub use plp::{Plp, PlpConfig};
pub use power_spectrum::{PowerSpectrum, PowerSpectrumConfig};
