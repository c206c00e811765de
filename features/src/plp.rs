//! Perceptual linear prediction over a Bark-scale filter bank.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sonid_dsp::{Fft, WindowKind, frame};

use crate::error::FeatureError;
use crate::extractor::FeatureExtractor;
use crate::lpcc::{Lpcc, LpccConfig};
use crate::matrix::{FeatureMatrix, column_stats};

/// PLP engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlpConfig {
    /// Bark filters in the bank.
    pub filters: usize,
    pub lpc_order: usize,
    pub lpcc_order: usize,
    pub frame_length: usize,
    pub overlap: usize,
    /// Low edge of the filter bank in Hz.
    pub lower_frequency: f64,
    pub window: WindowKind,
}

impl Default for PlpConfig {
    fn default() -> Self {
        Self {
            filters: 21,
            lpc_order: 24,
            lpcc_order: 24,
            frame_length: frame::DEFAULT_FRAME_LENGTH,
            overlap: frame::DEFAULT_OVERLAP,
            lower_frequency: 45.0,
            window: WindowKind::Hamming,
        }
    }
}

/// Hz to Bark.
pub fn frequency_to_bark(frequency: f64) -> f64 {
    let x = frequency / 600.0;
    6.0 * (x + (x * x + 1.0).sqrt()).ln()
}

/// Bark to Hz.
pub fn bark_to_frequency(bark: f64) -> f64 {
    300.0 * ((bark / 6.0).exp() - (-bark / 6.0).exp())
}

/// PLP engine.
///
/// Frames are not pre-emphasized; the equal-loudness curve inside the
/// filter bank takes that role. Each output row comes from the cepstral
/// recursion over a perceptual autocorrelation, `lpcc_order` wide.
pub struct Plp {
    config: PlpConfig,
    fft: Fft,
    centers: Vec<f64>,
    filter_coefficients: Vec<Vec<f64>>,
    equal_loudness: Vec<f64>,
    cosine: Vec<Vec<f64>>,
    lpcc: Lpcc,
    feature: Vec<Vec<f64>>,
    mean: Option<Vec<f64>>,
    stddev: Option<Vec<f64>>,
}

impl Plp {
    pub fn new(sample_rate: f64, config: PlpConfig) -> Result<Self, FeatureError> {
        if config.filters == 0 {
            return Err(FeatureError::InvalidFilterCount);
        }
        if config.overlap >= config.frame_length {
            return Err(FeatureError::InvalidFraming {
                frame_length: config.frame_length,
                overlap: config.overlap,
            });
        }
        let fft = Fft::new(config.frame_length)?;
        let lpcc = Lpcc::new(LpccConfig {
            lpc_order: config.lpc_order,
            lpcc_order: config.lpcc_order,
            ..LpccConfig::default()
        })?;

        let nyquist = sample_rate / 2.0;
        let min_bark = frequency_to_bark(config.lower_frequency);
        let max_bark = frequency_to_bark(nyquist);
        let step = (max_bark - min_bark) / (config.filters as f64 + 1.0);

        let frequency_bins: Vec<f64> = (0..config.frame_length)
            .map(|i| i as f64 * nyquist / (config.frame_length as f64 - 1.0))
            .collect();
        let centers: Vec<f64> = (0..config.filters)
            .map(|f| bark_to_frequency(min_bark + f as f64 * step))
            .collect();
        let filter_coefficients = centers
            .iter()
            .map(|&center| bark_filter(&frequency_bins, center))
            .collect();
        let equal_loudness = centers.iter().map(|&center| loudness(center)).collect();

        let period = 2.0 * config.filters as f64;
        let cosine = (0..=config.lpc_order)
            .map(|i| {
                (0..config.filters)
                    .map(|j| (2.0 * PI * i as f64 / period * (j as f64 + 0.5)).cos())
                    .collect()
            })
            .collect();

        Ok(Self {
            config,
            fft,
            centers,
            filter_coefficients,
            equal_loudness,
            cosine,
            lpcc,
            feature: Vec::new(),
            mean: None,
            stddev: None,
        })
    }

    /// Consumes the engine and returns its output.
    pub fn into_feature(self) -> FeatureMatrix {
        FeatureMatrix {
            rows: self.feature,
            mean: self.mean,
            stddev: self.stddev,
        }
    }

    /// Loudness-equalized Bark spectrum of one magnitude spectrum.
    fn bark_spectrum(&self, magnitude: &[f64]) -> Vec<f64> {
        (0..self.config.filters)
            .map(|f| {
                let weighted: f64 = self.filter_coefficients[f]
                    .iter()
                    .zip(magnitude)
                    .map(|(c, m)| c * m)
                    .sum();
                weighted * self.equal_loudness[f]
            })
            .collect()
    }

    /// Inverse cosine transform of the compressed Bark spectrum into
    /// autocorrelation lags.
    fn autocorrelation(&self, compressed: &[f64]) -> Vec<f64> {
        let period = self.config.filters as f64;
        (0..=self.config.lpc_order)
            .map(|i| {
                let mut lag = 0.5 * compressed[0] * self.cosine[i][0];
                for j in 1..self.config.filters {
                    lag += compressed[j] * self.cosine[i][j];
                }
                lag / period
            })
            .collect()
    }
}

impl FeatureExtractor for Plp {
    fn process(&mut self, samples: &[f64]) {
        let mut frames = frame::framing(samples, self.config.frame_length, self.config.overlap);
        self.process_frames(&mut frames);
    }

    fn process_frames(&mut self, frames: &mut [Vec<f64>]) {
        let mut rows = Vec::with_capacity(frames.len());
        for windowed in frames.iter_mut() {
            self.config.window.apply(windowed);
            self.fft.execute(windowed);
            let real = self.fft.real();
            let imag = self.fft.imag();
            let magnitude: Vec<f64> = (0..self.fft.size())
                .map(|k| (real[k] * real[k] + imag[k] * imag[k]).sqrt())
                .collect();

            let spectral = self.bark_spectrum(&magnitude);
            let compressed: Vec<f64> = spectral.iter().map(|&v| v.cbrt()).collect();
            let lags = self.autocorrelation(&compressed);
            self.lpcc.process_autocorrelated_frame(&lags);
            rows.push(self.lpcc.feature()[0].clone());
        }
        self.feature = rows;
        if self.feature.len() > 1 {
            let (mean, stddev) = column_stats(&self.feature);
            self.mean = Some(mean);
            self.stddev = Some(stddev);
        } else {
            self.mean = None;
            self.stddev = None;
        }
    }

    fn feature(&self) -> &[Vec<f64>] {
        &self.feature
    }

    fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    fn stddev(&self) -> Option<&[f64]> {
        self.stddev.as_deref()
    }
}

/// Bark filter gains over the frequency bins, a flat top with a steep
/// low skirt and a shallower high skirt.
fn bark_filter(frequency_bins: &[f64], center: f64) -> Vec<f64> {
    let center_bark = frequency_to_bark(center);
    frequency_bins
        .iter()
        .map(|&frequency| {
            let b = frequency_to_bark(frequency) - center_bark;
            if b < -2.5 {
                0.0
            } else if b <= -0.5 {
                10f64.powf(b + 0.5)
            } else if b <= 0.5 {
                1.0
            } else if b <= 1.3 {
                10f64.powf(-2.5 * (b - 0.5))
            } else {
                0.0
            }
        })
        .collect()
}

/// Equal-loudness weight at `frequency`.
fn loudness(frequency: f64) -> f64 {
    let f_sq = frequency * frequency;
    let f_sub = f_sq / (f_sq + 1.6e5);
    f_sub * f_sub * (f_sq + 1.44e6) / (f_sq + 9.61e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f64, sample_rate: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|t| 16_000.0 * (2.0 * PI * frequency * t as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn bark_scale_round_trips() {
        assert_eq!(frequency_to_bark(0.0), 0.0);
        for frequency in [45.0, 440.0, 8000.0, 24_000.0] {
            let bark = frequency_to_bark(frequency);
            assert!((bark_to_frequency(bark) - frequency).abs() < 1e-6);
        }
    }

    #[test]
    fn loudness_rises_through_the_midrange() {
        assert!(loudness(100.0) < loudness(1000.0));
        assert!(loudness(1000.0) < loudness(5000.0));
    }

    #[test]
    fn filters_peak_at_their_center() {
        let plp = Plp::new(48_000.0, PlpConfig::default()).unwrap();
        let center = plp.centers[10];
        let bin = (center / 24_000.0 * 1023.0).round() as usize;

        assert_eq!(plp.filter_coefficients[10][bin], 1.0);
        // the low edge of the spectrum is far outside this filter
        assert_eq!(plp.filter_coefficients[10][0], 0.0);
    }

    #[test]
    fn processes_a_sine_into_cepstral_rows() {
        let mut plp = Plp::new(48_000.0, PlpConfig::default()).unwrap();
        plp.process(&sine(440.0, 48_000.0, 48_000));

        assert_eq!(plp.feature().len(), 94);
        assert!(plp.feature().iter().all(|row| row.len() == 24));
        assert!(
            plp.feature()
                .iter()
                .all(|row| row.iter().all(|c| c.is_finite()))
        );
        assert_eq!(plp.mean().unwrap().len(), 24);
    }

    #[test]
    fn silence_yields_zero_rows() {
        let mut plp = Plp::new(48_000.0, PlpConfig::default()).unwrap();
        plp.process(&vec![0.0; 2048]);

        assert_eq!(plp.feature().len(), 4);
        assert!(
            plp.feature()
                .iter()
                .all(|row| row.iter().all(|&c| c == 0.0))
        );
    }
}
