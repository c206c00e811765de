//! Linear predictive coding over windowed frames.

use serde::{Deserialize, Serialize};
use sonid_dsp::{WindowKind, frame, round_to};

use crate::error::FeatureError;
use crate::extractor::FeatureExtractor;
use crate::matrix::{FeatureMatrix, column_stats};

/// Warped autocorrelation and Levinson-Durbin recursion, shared by the
/// LPC, LPCC and PLP engines.
#[derive(Debug, Clone)]
pub struct LinearPredictiveCore {
    order: usize,
    lambda: f64,
}

impl LinearPredictiveCore {
    /// Builds a predictor of the given order. `lambda` warps the
    /// autocorrelation delay line; zero keeps it a plain autocorrelation.
    pub fn new(order: usize, lambda: f64) -> Result<Self, FeatureError> {
        if order == 0 {
            return Err(FeatureError::InvalidOrder { order });
        }
        Ok(Self { order, lambda })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Warped autocorrelation of `samples` over `order + 1` lags.
    pub fn autocorrelation(&self, samples: &[f64]) -> Vec<f64> {
        let mut lags = vec![0.0; self.order + 1];
        let mut delay = vec![0.0; samples.len()];
        let mut previous = 0.0;
        let mut warped = 0.0;
        for (k, &sample) in samples.iter().enumerate() {
            lags[0] += sample * sample;
            delay[k] = previous - self.lambda * (sample - warped);
            previous = sample;
            warped = delay[k];
        }
        for lag in lags.iter_mut().skip(1) {
            let mut previous = 0.0;
            let mut warped = 0.0;
            for (k, &sample) in samples.iter().enumerate() {
                *lag += delay[k] * sample;
                let delayed = delay[k];
                delay[k] = previous - self.lambda * (delayed - warped);
                previous = delayed;
                warped = delay[k];
            }
        }
        lags
    }

    /// Levinson-Durbin recursion over the autocorrelation `lags`.
    ///
    /// Fills the zeroed `reflection` and `predictor` buffers of
    /// `order + 1` entries and returns the final prediction error power.
    /// A frame with zero energy short-circuits to a zero error and leaves
    /// every coefficient at zero.
    pub fn levinson_durbin(
        &self,
        lags: &[f64],
        reflection: &mut [f64],
        predictor: &mut [f64],
    ) -> f64 {
        if lags[0] == 0.0 {
            return 0.0;
        }
        let mut backward = vec![0.0; self.order + 1];
        let mut error = lags[0];
        reflection[1] = -lags[1] / lags[0];
        predictor[0] = 1.0;
        predictor[1] = reflection[1];
        error *= 1.0 - reflection[1] * reflection[1];
        for i in 2..=self.order {
            for j in 1..i {
                backward[j] = predictor[i - j];
            }
            let mut k = 0.0;
            for j in 0..i {
                k -= predictor[j] * lags[i - j];
            }
            k /= error;
            reflection[i] = k;
            for j in 1..i {
                predictor[j] += k * backward[j];
            }
            predictor[i] = k;
            error *= 1.0 - k * k;
        }
        error
    }
}

/// LPC engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LpcConfig {
    pub order: usize,
    pub lambda: f64,
    pub frame_length: usize,
    pub overlap: usize,
    pub pre_emphasis: f64,
    pub window: WindowKind,
}

impl Default for LpcConfig {
    fn default() -> Self {
        Self {
            order: 24,
            lambda: 0.0,
            frame_length: frame::DEFAULT_FRAME_LENGTH,
            overlap: frame::DEFAULT_OVERLAP,
            pre_emphasis: frame::DEFAULT_PRE_EMPHASIS,
            window: WindowKind::Hamming,
        }
    }
}

/// Linear prediction engine, `order` coefficients per frame.
pub struct Lpc {
    config: LpcConfig,
    core: LinearPredictiveCore,
    feature: Vec<Vec<f64>>,
    mean: Option<Vec<f64>>,
    stddev: Option<Vec<f64>>,
}

impl Lpc {
    pub fn new(config: LpcConfig) -> Result<Self, FeatureError> {
        if config.overlap >= config.frame_length {
            return Err(FeatureError::InvalidFraming {
                frame_length: config.frame_length,
                overlap: config.overlap,
            });
        }
        let core = LinearPredictiveCore::new(config.order, config.lambda)?;
        Ok(Self {
            config,
            core,
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
}

impl FeatureExtractor for Lpc {
    fn process(&mut self, samples: &[f64]) {
        let emphasized = frame::pre_emphasis(samples, self.config.pre_emphasis);
        let mut frames =
            frame::framing(&emphasized, self.config.frame_length, self.config.overlap);
        self.process_frames(&mut frames);
    }

    fn process_frames(&mut self, frames: &mut [Vec<f64>]) {
        let order = self.core.order();
        let mut rows = Vec::with_capacity(frames.len());
        for windowed in frames.iter_mut() {
            self.config.window.apply(windowed);
            let lags = self.core.autocorrelation(windowed);
            let mut reflection = vec![0.0; order + 1];
            let mut predictor = vec![0.0; order + 1];
            self.core
                .levinson_durbin(&lags, &mut reflection, &mut predictor);
            rows.push(
                (0..order)
                    .map(|j| round_to(predictor[j + 1], 4))
                    .collect(),
            );
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(frequency: f64, sample_rate: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|t| 16_000.0 * (2.0 * PI * frequency * t as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn rejects_zero_order() {
        assert!(LinearPredictiveCore::new(0, 0.0).is_err());
        assert!(
            Lpc::new(LpcConfig {
                order: 0,
                ..LpcConfig::default()
            })
            .is_err()
        );
    }

    #[test]
    fn rejects_overlap_not_below_frame_length() {
        let config = LpcConfig {
            frame_length: 512,
            overlap: 512,
            ..LpcConfig::default()
        };
        assert!(matches!(
            Lpc::new(config),
            Err(FeatureError::InvalidFraming { .. })
        ));
    }

    #[test]
    fn plain_autocorrelation_lags() {
        let core = LinearPredictiveCore::new(2, 0.0).unwrap();
        let lags = core.autocorrelation(&[1.0, 2.0, 3.0]);
        assert_eq!(lags, vec![14.0, 8.0, 3.0]);
    }

    #[test]
    fn levinson_durbin_known_recursion() {
        let core = LinearPredictiveCore::new(2, 0.0).unwrap();
        let mut reflection = vec![0.0; 3];
        let mut predictor = vec![0.0; 3];
        let error = core.levinson_durbin(&[1.0, 0.5, 0.25], &mut reflection, &mut predictor);

        assert_eq!(reflection[1], -0.5);
        assert_eq!(predictor, vec![1.0, -0.5, 0.0]);
        assert_eq!(error, 0.75);
    }

    #[test]
    fn zero_energy_frame_short_circuits() {
        let core = LinearPredictiveCore::new(4, 0.0).unwrap();
        let mut reflection = vec![0.0; 5];
        let mut predictor = vec![0.0; 5];
        let error = core.levinson_durbin(&[0.0; 5], &mut reflection, &mut predictor);

        assert_eq!(error, 0.0);
        assert!(predictor.iter().all(|&c| c == 0.0));
    }

    #[test]
    fn prediction_error_shrinks_with_order() {
        let signal = sine(440.0, 48_000.0, 1024);
        let mut previous = f64::INFINITY;
        for order in 1..=8 {
            let core = LinearPredictiveCore::new(order, 0.0).unwrap();
            let lags = core.autocorrelation(&signal);
            let mut reflection = vec![0.0; order + 1];
            let mut predictor = vec![0.0; order + 1];
            let error = core.levinson_durbin(&lags, &mut reflection, &mut predictor);
            assert!(error >= 0.0);
            assert!(error <= previous + 1e-6);
            previous = error;
        }
    }

    #[test]
    fn processes_a_sine_into_coefficient_rows() {
        let mut lpc = Lpc::new(LpcConfig::default()).unwrap();
        lpc.process(&sine(440.0, 48_000.0, 48_000));

        assert_eq!(lpc.feature().len(), 94);
        assert!(lpc.feature().iter().all(|row| row.len() == 24));
        assert_eq!(lpc.mean().unwrap().len(), 24);
        assert_eq!(lpc.stddev().unwrap().len(), 24);
    }

    #[test]
    fn silence_yields_zero_rows() {
        let mut lpc = Lpc::new(LpcConfig::default()).unwrap();
        lpc.process(&vec![0.0; 4096]);

        assert_eq!(lpc.feature().len(), 8);
        assert!(
            lpc.feature()
                .iter()
                .all(|row| row.iter().all(|&c| c == 0.0))
        );
    }

    #[test]
    fn single_frame_has_no_statistics() {
        let mut lpc = Lpc::new(LpcConfig::default()).unwrap();
        lpc.process(&sine(440.0, 48_000.0, 512));

        assert_eq!(lpc.feature().len(), 1);
        assert!(lpc.mean().is_none());
        assert!(lpc.stddev().is_none());
    }
}
