use sonid_dsp::DspError;
use thiserror::Error;

/// Errors raised while configuring a feature engine.
///
/// Configuration is validated once at construction; processing itself
/// never fails. Degenerate input such as an all-zero frame produces
/// zeroed coefficients instead of an error.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("features: predictor order must be at least 1, got {order}")]
    InvalidOrder { order: usize },

    #[error("features: cepstrum order must be at least 2, got {order}")]
    InvalidCepstrumOrder { order: usize },

    #[error("features: at least one filter is required")]
    InvalidFilterCount,

    #[error("features: at least one cepstral coefficient is required")]
    InvalidCoefficientCount,

    #[error("features: delta regression width must be at least 1")]
    InvalidDeltaWidth,

    #[error("features: overlap {overlap} must be smaller than frame length {frame_length}")]
    InvalidFraming { frame_length: usize, overlap: usize },

    #[error("features: {0}")]
    Dsp(#[from] DspError),
}
