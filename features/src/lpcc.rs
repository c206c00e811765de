//! Cepstral coefficients derived from linear prediction.

use serde::{Deserialize, Serialize};
use sonid_dsp::{WindowKind, frame, round_to};

use crate::error::FeatureError;
use crate::extractor::FeatureExtractor;
use crate::lpc::LinearPredictiveCore;
use crate::matrix::{FeatureMatrix, column_stats};

/// LPCC engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LpccConfig {
    pub lpc_order: usize,
    pub lpcc_order: usize,
    pub frame_length: usize,
    pub overlap: usize,
    pub pre_emphasis: f64,
    pub window: WindowKind,
}

impl Default for LpccConfig {
    fn default() -> Self {
        Self {
            lpc_order: 24,
            lpcc_order: 24,
            frame_length: frame::DEFAULT_FRAME_LENGTH,
            overlap: frame::DEFAULT_OVERLAP,
            pre_emphasis: frame::DEFAULT_PRE_EMPHASIS,
            window: WindowKind::Hamming,
        }
    }
}

/// Cepstral engine over a linear predictor, `lpcc_order` coefficients
/// per frame.
///
/// The first coefficient is the log prediction error, the rest follow
/// the cepstral recursion over the predictor; the recursion consumes the
/// already rounded cepstra it produced, so rounding feeds forward.
pub struct Lpcc {
    config: LpccConfig,
    core: LinearPredictiveCore,
    predictor: Vec<Vec<f64>>,
    error: Vec<f64>,
    feature: Vec<Vec<f64>>,
    mean: Option<Vec<f64>>,
    stddev: Option<Vec<f64>>,
}

impl Lpcc {
    pub fn new(config: LpccConfig) -> Result<Self, FeatureError> {
        if config.overlap >= config.frame_length {
            return Err(FeatureError::InvalidFraming {
                frame_length: config.frame_length,
                overlap: config.overlap,
            });
        }
        if config.lpcc_order < 2 {
            return Err(FeatureError::InvalidCepstrumOrder {
                order: config.lpcc_order,
            });
        }
        let core = LinearPredictiveCore::new(config.lpc_order, 0.0)?;
        Ok(Self {
            config,
            core,
            predictor: Vec::new(),
            error: Vec::new(),
            feature: Vec::new(),
            mean: None,
            stddev: None,
        })
    }

    /// Runs the cepstral recursion over an externally computed
    /// autocorrelation, producing a single feature row.
    pub fn process_autocorrelated_frame(&mut self, lags: &[f64]) {
        let order = self.core.order();
        self.predictor = vec![vec![0.0; order + 1]];
        self.error = vec![0.0];
        let mut reflection = vec![0.0; order + 1];
        self.error[0] = self
            .core
            .levinson_durbin(lags, &mut reflection, &mut self.predictor[0]);
        self.compute_final(1);
    }

    /// Consumes the engine and returns its output.
    pub fn into_feature(self) -> FeatureMatrix {
        FeatureMatrix {
            rows: self.feature,
            mean: self.mean,
            stddev: self.stddev,
        }
    }

    fn compute_final(&mut self, total_frames: usize) {
        let q = self.config.lpcc_order;
        let p = self.config.lpc_order;
        self.feature = vec![vec![0.0; q]; total_frames];
        for f in 0..total_frames {
            // zero prediction error marks a degenerate frame; its row stays zero
            if self.error[f] == 0.0 {
                continue;
            }
            let predictor = &self.predictor[f];
            let row = &mut self.feature[f];
            row[0] = round_to(self.error[f].ln(), 4);
            row[1] = round_to(-predictor[1], 4);
            let mut i = 2;
            while i < q.min(p + 1) {
                let mut sum = i as f64 * predictor[i];
                for j in 1..i {
                    sum += predictor[j] * row[i - j] * (i - j) as f64;
                }
                row[i] = round_to(-sum / i as f64, 4);
                i += 1;
            }
            while i < q {
                let mut sum = 0.0;
                for j in 1..=p {
                    sum += predictor[j] * row[i - j] * (i - j) as f64;
                }
                row[i] = round_to(-sum / i as f64, 4);
                i += 1;
            }
        }
        if total_frames > 1 {
            let (mean, stddev) = column_stats(&self.feature);
            self.mean = Some(mean);
            self.stddev = Some(stddev);
        } else {
            self.mean = None;
            self.stddev = None;
        }
    }
}

impl FeatureExtractor for Lpcc {
    fn process(&mut self, samples: &[f64]) {
        let emphasized = frame::pre_emphasis(samples, self.config.pre_emphasis);
        let mut frames =
            frame::framing(&emphasized, self.config.frame_length, self.config.overlap);
        self.process_frames(&mut frames);
    }

    fn process_frames(&mut self, frames: &mut [Vec<f64>]) {
        let order = self.core.order();
        self.predictor = vec![vec![0.0; order + 1]; frames.len()];
        self.error = vec![0.0; frames.len()];
        for (f, windowed) in frames.iter_mut().enumerate() {
            self.config.window.apply(windowed);
            let lags = self.core.autocorrelation(windowed);
            let mut reflection = vec![0.0; order + 1];
            self.error[f] =
                self.core
                    .levinson_durbin(&lags, &mut reflection, &mut self.predictor[f]);
        }
        self.compute_final(frames.len());
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
