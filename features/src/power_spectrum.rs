//! Peak-held power spectrum in dBFS over a frequency band.

use serde::{Deserialize, Serialize};
use sonid_dsp::{Fft, WindowKind, frame, round_to};

use crate::error::FeatureError;
use crate::extractor::FeatureExtractor;
use crate::matrix::FeatureMatrix;

/// Decibel value a coefficient holds until a frame raises it.
const SILENCE_FLOOR_DB: f64 = -1000.0;

/// Power spectrum configuration.
///
/// `final_frequency` defaults to the Nyquist frequency of the signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerSpectrumConfig {
    pub frame_length: usize,
    pub overlap: usize,
    /// Low edge of the requested band in Hz.
    pub initial_frequency: u32,
    /// High edge of the requested band in Hz.
    pub final_frequency: Option<u32>,
    pub window: WindowKind,
}

impl Default for PowerSpectrumConfig {
    fn default() -> Self {
        Self {
            frame_length: frame::DEFAULT_FRAME_LENGTH,
            overlap: frame::DEFAULT_OVERLAP,
            initial_frequency: 0,
            final_frequency: None,
            window: WindowKind::Hamming,
        }
    }
}

/// Power spectrum engine.
///
/// The output has exactly two rows: row 0 holds the frequency axis in Hz,
/// row 1 the loudest decibel seen at that frequency across all frames.
/// Repeated processing folds further frames into the same peaks.
pub struct PowerSpectrum {
    config: PowerSpectrumConfig,
    fft: Fft,
    maximum_frequency: f64,
    frequency_samples: f64,
    frequency_axis: Vec<f64>,
    decibels: Vec<f64>,
    feature: Vec<Vec<f64>>,
}

impl PowerSpectrum {
    pub fn new(sample_rate: f64, config: PowerSpectrumConfig) -> Result<Self, FeatureError> {
        if config.overlap >= config.frame_length {
            return Err(FeatureError::InvalidFraming {
                frame_length: config.frame_length,
                overlap: config.overlap,
            });
        }
        let fft = Fft::new(config.frame_length)?;

        let maximum_frequency = sample_rate / 2.0;
        let frequency_samples = (config.frame_length / 2) as f64;
        let initial_frequency = i64::from(config.initial_frequency);
        let final_frequency =
            i64::from(config.final_frequency.unwrap_or(sample_rate as u32 / 2));

        // One bin of margin on each side of the requested band.
        let margin = (maximum_frequency / frequency_samples) as i64;

        let mut coefficients: Vec<i64> = Vec::new();
        for index in 0..config.frame_length / 2 {
            let frequency =
                maximum_frequency - maximum_frequency / frequency_samples * index as f64;
            if frequency >= (initial_frequency - margin) as f64
                && frequency <= (final_frequency + margin) as f64
            {
                coefficients.push(frequency as i64);
            }
        }
        coefficients.sort_unstable();

        let frequency_axis: Vec<f64> = coefficients.into_iter().map(|f| f as f64).collect();
        let decibels = vec![SILENCE_FLOOR_DB; frequency_axis.len()];
        let feature = vec![frequency_axis.clone(), decibels.clone()];

        Ok(Self {
            config,
            fft,
            maximum_frequency,
            frequency_samples,
            frequency_axis,
            decibels,
            feature,
        })
    }

    /// Consumes the engine and returns its output.
    pub fn into_feature(self) -> FeatureMatrix {
        FeatureMatrix {
            rows: self.feature,
            mean: None,
            stddev: None,
        }
    }
}

impl FeatureExtractor for PowerSpectrum {
    fn process(&mut self, samples: &[f64]) {
        let mut frames = frame::framing(samples, self.config.frame_length, self.config.overlap);
        self.process_frames(&mut frames);
    }

    fn process_frames(&mut self, frames: &mut [Vec<f64>]) {
        self.config.window.apply_frames(frames);

        for windowed in frames.iter() {
            self.fft.execute(windowed);
            let amplitudes = self.fft.amplitudes();

            // Frequency labels sit one bin above the bin index, matching
            // the descending axis construction.
            let mut cursor = 0;
            for (bin, &decibel) in amplitudes.iter().enumerate() {
                let frequency = self.maximum_frequency / self.frequency_samples * bin as f64
                    + self.maximum_frequency / self.frequency_samples;

                for index in cursor..self.frequency_axis.len() {
                    if frequency as i64 == self.frequency_axis[index] as i64
                        && decibel > self.decibels[index]
                    {
                        self.decibels[index] = round_to(decibel, 4);
                        cursor = index;
                        break;
                    }
                }
            }
        }

        // dBFS holds only negative values; positive peaks shift the whole
        // spectrum down so the loudest coefficient lands at zero.
        let mut higher = SILENCE_FLOOR_DB;
        for &decibel in &self.decibels {
            if decibel > higher {
                higher = decibel;
            }
        }
        if higher >= 0.0 {
            for decibel in &mut self.decibels {
                *decibel = round_to(*decibel - higher, 4);
            }
        }

        self.feature = vec![self.frequency_axis.clone(), self.decibels.clone()];
    }

    fn feature(&self) -> &[Vec<f64>] {
        &self.feature
    }

    fn mean(&self) -> Option<&[f64]> {
        None
    }

    fn stddev(&self) -> Option<&[f64]> {
        None
    }
}
