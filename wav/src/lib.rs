//! RIFF/WAVE parsing and bounded PCM amplitude decoding.
//!
//! This crate reads field recordings for the feature-extraction pipeline:
//!
//! - `header`: WAVE header parsing with chunk skipping and a format gate
//! - `decoder`: windowed amplitude decoding with end-of-stream sentinels
//! - `clock`: millisecond durations as digital clock strings
//!
//! # Example
//!
//! ```no_run
//! use sonid_wav::{TargetFormat, WavDecoder};
//!
//! # fn main() -> Result<(), sonid_wav::WavError> {
//! let mut wav = WavDecoder::open("call.wav", TargetFormat::default())?;
//! let last = wav.num_samples_per_channel() - 1;
//! let amplitudes = wav.amplitudes(0..=last)?;
//! println!("{} samples over {}", amplitudes.len(), sonid_wav::clock::digital_format(wav.total_time_ms()));
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod decoder;
pub mod error;
pub mod header;

pub use decoder::{SENTINEL_AMPLITUDE, WavDecoder};
pub use error::WavError;
pub use header::{TargetFormat, WavHeader};
