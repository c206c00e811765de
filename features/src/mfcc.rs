//! Mel-frequency cepstral coefficients with delta and delta-delta tails.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use sonid_dsp::{Fft, WindowKind, frame, matrix, round_to};

use crate::error::FeatureError;
use crate::extractor::FeatureExtractor;
use crate::matrix::{FeatureMatrix, column_stats};

/// Floor applied to log filter-bank energies, so silent bands do not
/// drag the cepstrum to negative infinity.
const LOG_FLOOR: f64 = -50.0;

/// MFCC engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MfccConfig {
    /// Cepstral coefficients computed per frame; the zeroth is dropped
    /// from the output.
    pub coefficients: usize,
    /// Mel filters in the bank.
    pub filters: usize,
    pub frame_length: usize,
    pub overlap: usize,
    /// Low edge of the filter bank in Hz.
    pub lower_frequency: f64,
    pub pre_emphasis: f64,
    /// Regression half-width for the delta coefficients.
    pub delta_n: usize,
    pub window: WindowKind,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            coefficients: 13,
            filters: 23,
            frame_length: frame::DEFAULT_FRAME_LENGTH,
            overlap: frame::DEFAULT_OVERLAP,
            lower_frequency: 45.0,
            pre_emphasis: frame::DEFAULT_PRE_EMPHASIS,
            delta_n: 2,
            window: WindowKind::Hamming,
        }
    }
}

/// Hz to mel.
pub fn frequency_to_mel(frequency: f64) -> f64 {
    2595.0 * (1.0 + frequency / 700.0).log10()
}

/// Mel to Hz.
pub fn inverse_mel(mel: f64) -> f64 {
    700.0 * (10f64.powf(mel / 2595.0) - 1.0)
}

/// MFCC engine.
///
/// Each output row is the static cepstrum with the zeroth coefficient
/// dropped, followed by its delta and delta-delta regressions, all
/// rounded to four decimals. Deltas regress over the unrounded statics.
pub struct Mfcc {
    config: MfccConfig,
    fft: Fft,
    bin_indices: Vec<usize>,
    delta_progression: Vec<Vec<f64>>,
    delta_denominator: f64,
    feature: Vec<Vec<f64>>,
    mean: Option<Vec<f64>>,
    stddev: Option<Vec<f64>>,
}

impl Mfcc {
    pub fn new(sample_rate: f64, config: MfccConfig) -> Result<Self, FeatureError> {
        if config.coefficients == 0 {
            return Err(FeatureError::InvalidCoefficientCount);
        }
        if config.filters == 0 {
            return Err(FeatureError::InvalidFilterCount);
        }
        if config.delta_n == 0 {
            return Err(FeatureError::InvalidDeltaWidth);
        }
        if config.overlap >= config.frame_length {
            return Err(FeatureError::InvalidFraming {
                frame_length: config.frame_length,
                overlap: config.overlap,
            });
        }
        let fft = Fft::new(config.frame_length)?;

        let bin_indices = Self::bin_indices(sample_rate, &config);
        let span = config.delta_n as i64;
        let delta_progression = vec![(-span..=span).map(|i| i as f64).collect()];
        let delta_denominator =
            2.0 * (1..=config.delta_n).map(|i| (i * i) as f64).sum::<f64>();

        Ok(Self {
            config,
            fft,
            bin_indices,
            delta_progression,
            delta_denominator,
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

    /// FFT bin index of each filter edge: the low edge, every filter
    /// center and the Nyquist bin.
    fn bin_indices(sample_rate: f64, config: &MfccConfig) -> Vec<usize> {
        let mut bins = vec![0usize; config.filters + 2];
        let length = config.frame_length as f64;
        bins[0] = (config.lower_frequency / sample_rate * length).round() as usize;
        bins[config.filters + 1] = config.frame_length / 2;
        for f in 1..=config.filters {
            let center = Self::center_frequency(f, sample_rate, config);
            bins[f] = (center / sample_rate * length).round() as usize;
        }
        bins
    }

    /// Center frequency of filter `index`, spaced evenly on the mel scale
    /// between the low edge and Nyquist.
    fn center_frequency(index: usize, sample_rate: f64, config: &MfccConfig) -> f64 {
        let low = frequency_to_mel(config.lower_frequency);
        let high = frequency_to_mel(sample_rate / 2.0);
        inverse_mel(low + (high - low) / (config.filters as f64 + 1.0) * index as f64)
    }

    fn magnitude_spectrum(&mut self, windowed: &[f64]) -> Vec<f64> {
        self.fft.execute(windowed);
        let real = self.fft.real();
        let imag = self.fft.imag();
        (0..self.fft.size())
            .map(|k| (real[k] * real[k] + imag[k] * imag[k]).sqrt())
            .collect()
    }

    /// Triangular mel filter bank over the magnitude spectrum.
    fn mel_filter_bank(&self, magnitude: &[f64]) -> Vec<f64> {
        let bins = &self.bin_indices;
        let mut bank = vec![0.0; self.config.filters];
        for k in 1..=self.config.filters {
            let mut sum = 0.0;
            let rising = (bins[k] - bins[k - 1] + 1) as f64;
            for i in bins[k - 1]..=bins[k] {
                sum += (i - bins[k - 1] + 1) as f64 / rising * magnitude[i];
            }
            let falling = (bins[k + 1] - bins[k] + 1) as f64;
            for i in bins[k] + 1..=bins[k + 1] {
                sum += (1.0 - (i - bins[k]) as f64 / falling) * magnitude[i];
            }
            bank[k - 1] = sum;
        }
        bank
    }

    /// Discrete cosine transform of the log energies.
    fn cepstral_coefficients(&self, log_energies: &[f64]) -> Vec<f64> {
        let filters = self.config.filters as f64;
        (0..self.config.coefficients)
            .map(|i| {
                (1..=self.config.filters)
                    .map(|j| {
                        log_energies[j - 1] * (PI * i as f64 / filters * (j as f64 - 0.5)).cos()
                    })
                    .sum()
            })
            .collect()
    }

    /// Regression of each coefficient over neighboring frames, with the
    /// first and last frame replicated as edge padding.
    fn delta(&self, data: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let n = self.config.delta_n;
        let columns = data[0].len();
        let mut padded = Vec::with_capacity(data.len() + 2 * n);
        for _ in 0..n {
            padded.push(data[0].clone());
        }
        padded.extend_from_slice(data);
        for _ in 0..n {
            padded.push(data[data.len() - 1].clone());
        }

        (0..data.len())
            .map(|f| {
                let window = &padded[f..f + 2 * n + 1];
                let product = matrix::multiply(&self.delta_progression, window)
                    .and_then(|mut rows| {
                        if rows.is_empty() {
                            None
                        } else {
                            Some(rows.swap_remove(0))
                        }
                    })
                    .unwrap_or_else(|| vec![0.0; columns]);
                product
                    .into_iter()
                    .map(|v| v / self.delta_denominator)
                    .collect()
            })
            .collect()
    }
}

impl FeatureExtractor for Mfcc {
    fn process(&mut self, samples: &[f64]) {
        let emphasized = frame::pre_emphasis(samples, self.config.pre_emphasis);
        let mut frames =
            frame::framing(&emphasized, self.config.frame_length, self.config.overlap);
        self.process_frames(&mut frames);
    }

    fn process_frames(&mut self, frames: &mut [Vec<f64>]) {
        if frames.is_empty() {
            self.feature = Vec::new();
            self.mean = None;
            self.stddev = None;
            return;
        }
        let statics = self.config.coefficients - 1;
        let mut cepstra = vec![vec![0.0; statics]; frames.len()];
        for (f, windowed) in frames.iter_mut().enumerate() {
            self.config.window.apply(windowed);
            let magnitude = self.magnitude_spectrum(windowed);
            let energies = self.mel_filter_bank(&magnitude);
            let log_energies = natural_logarithm(&energies);
            let coefficients = self.cepstral_coefficients(&log_energies);
            cepstra[f].copy_from_slice(&coefficients[1..self.config.coefficients]);
        }
        let delta = self.delta(&cepstra);
        let delta_delta = self.delta(&delta);

        self.feature = (0..frames.len())
            .map(|f| {
                let mut row = Vec::with_capacity(statics * 3);
                row.extend(cepstra[f].iter().map(|&c| round_to(c, 4)));
                row.extend(delta[f].iter().map(|&c| round_to(c, 4)));
                row.extend(delta_delta[f].iter().map(|&c| round_to(c, 4)));
                row
            })
            .collect();
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

fn natural_logarithm(energies: &[f64]) -> Vec<f64> {
    energies
        .iter()
        .map(|&e| {
            let ln = e.ln();
            if ln < LOG_FLOOR { LOG_FLOOR } else { ln }
        })
        .collect()
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
    fn mel_scale_round_trips() {
        assert!((frequency_to_mel(0.0)).abs() < 1e-12);
        let mel = frequency_to_mel(700.0);
        assert!((mel - 2595.0 * 2.0f64.log10()).abs() < 1e-9);
        assert!((inverse_mel(frequency_to_mel(4321.0)) - 4321.0).abs() < 1e-6);
    }

    #[test]
    fn default_bin_indices_cover_the_spectrum() {
        let mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        let bins = &mfcc.bin_indices;

        assert_eq!(bins.len(), 25);
        assert_eq!(bins[0], 1);
        assert_eq!(bins[24], 512);
        assert!(bins.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn log_energies_are_floored() {
        let logs = natural_logarithm(&[0.0, 1.0, f64::MIN_POSITIVE]);
        assert_eq!(logs[0], -50.0);
        assert_eq!(logs[1], 0.0);
        assert_eq!(logs[2], -50.0);
    }

    #[test]
    fn uniform_energies_collapse_to_the_zeroth_coefficient() {
        let mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        let coefficients = mfcc.cepstral_coefficients(&[1.0; 23]);

        assert!((coefficients[0] - 23.0).abs() < 1e-9);
        for &c in &coefficients[1..] {
            assert!(c.abs() < 1e-9);
        }
    }

    #[test]
    fn delta_of_constant_frames_is_zero() {
        let mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        let data = vec![vec![3.5; 4]; 6];
        let delta = mfcc.delta(&data);
        assert!(delta.iter().all(|row| row.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn delta_of_a_ramp_is_its_slope() {
        let mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        let data: Vec<Vec<f64>> = (0..5).map(|f| vec![f as f64]).collect();
        let delta = mfcc.delta(&data);
        // interior frames see the full regression window
        assert!((delta[2][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn processes_a_sine_into_full_rows() {
        let mut mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        mfcc.process(&sine(440.0, 48_000.0, 48_000));

        assert_eq!(mfcc.feature().len(), 94);
        assert!(mfcc.feature().iter().all(|row| row.len() == 36));
        assert_eq!(mfcc.mean().unwrap().len(), 36);
        assert_eq!(mfcc.stddev().unwrap().len(), 36);
        // the statics carry signal
        assert!(mfcc.feature()[1][..12].iter().any(|&c| c != 0.0));
    }

    #[test]
    fn single_frame_has_zero_deltas_and_no_statistics() {
        let mut mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        mfcc.process(&sine(440.0, 48_000.0, 512));

        assert_eq!(mfcc.feature().len(), 1);
        assert!(mfcc.feature()[0][12..].iter().all(|&c| c == 0.0));
        assert!(mfcc.mean().is_none());
    }

    #[test]
    fn empty_signal_yields_no_rows() {
        let mut mfcc = Mfcc::new(48_000.0, MfccConfig::default()).unwrap();
        mfcc.process(&[]);
        assert!(mfcc.feature().is_empty());
        assert!(mfcc.mean().is_none());
    }

    #[test]
    fn rejects_non_power_of_two_frames() {
        let config = MfccConfig {
            frame_length: 1000,
            overlap: 500,
            ..MfccConfig::default()
        };
        assert!(matches!(
            Mfcc::new(48_000.0, config),
            Err(FeatureError::Dsp(_))
        ));
    }
}
