//! Signal-processing primitives for bioacoustic feature extraction.
//!
//! This crate provides the numeric building blocks shared by the feature
//! engines:
//!
//! - `fft`: radix-2 decimation-in-time FFT with dBFS amplitudes
//! - `window`: Bartlett, Blackman, Hamming, Hanning and rectangular windows
//! - `frame`: pre-emphasis and overlapping frame assembly
//! - `stats`: mean, sample variance and standard deviation
//! - `matrix`: dense matrix multiply for delta regression
//! - `round`: decimal half-up rounding used on published coefficients
//!
//! # Example
//!
//! ```rust
//! use sonid_dsp::{Fft, WindowKind, frame};
//!
//! let signal = vec![0.5; 4096];
//! let mut frames = frame::framing(&signal, 1024, 512);
//! WindowKind::Hanning.apply_frames(&mut frames);
//!
//! let mut fft = Fft::new(1024).unwrap();
//! fft.execute(&frames[0]);
//! assert_eq!(fft.amplitudes().len(), 512);
//! ```

pub mod error;
pub mod fft;
pub mod frame;
pub mod matrix;
pub mod round;
pub mod stats;
pub mod window;

pub use error::DspError;
pub use fft::Fft;
pub use round::round_to;
pub use window::WindowKind;
