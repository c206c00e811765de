//! Window functions applied to analysis frames before a transform.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Supported window shapes.
///
/// Coefficients follow the symmetric cosine formulation around the frame
/// midpoint `m = len / 2`; for an odd frame length the final sample falls
/// outside the cosine span and is zeroed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    Rectangular,
    Bartlett,
    Blackman,
    Hamming,
    #[default]
    Hanning,
}

impl WindowKind {
    /// Window coefficients for a frame of `len` samples.
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        let mut window = vec![0.0; len];
        let m = (len / 2) as i64;
        match self {
            WindowKind::Rectangular => window.fill(1.0),
            WindowKind::Bartlett => {
                for (n, w) in window.iter_mut().enumerate() {
                    *w = 1.0 - (n as f64 - m as f64).abs() / m as f64;
                }
            }
            WindowKind::Blackman => {
                let r = PI / m as f64;
                for n in -m..m {
                    window[(m + n) as usize] =
                        0.42 + 0.5 * (n as f64 * r).cos() + 0.08 * (2.0 * n as f64 * r).cos();
                }
            }
            WindowKind::Hamming => {
                let r = PI / m as f64;
                for n in -m..m {
                    window[(m + n) as usize] = 0.54 + 0.46 * (n as f64 * r).cos();
                }
            }
            WindowKind::Hanning => {
                let r = PI / (m as f64 + 1.0);
                for n in -m..m {
                    window[(m + n) as usize] = 0.5 + 0.5 * (n as f64 * r).cos();
                }
            }
        }
        window
    }

    /// Multiplies `frame` by the window in place.
    pub fn apply(&self, frame: &mut [f64]) {
        let window = self.coefficients(frame.len());
        for (sample, w) in frame.iter_mut().zip(&window) {
            *sample *= w;
        }
    }

    /// Windows every frame in place.
    pub fn apply_frames(&self, frames: &mut [Vec<f64>]) {
        for frame in frames {
            self.apply(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_hanning() {
        assert_eq!(WindowKind::default(), WindowKind::Hanning);
    }

    #[test]
    fn rectangular_is_all_ones() {
        assert_eq!(WindowKind::Rectangular.coefficients(6), vec![1.0; 6]);
    }

    #[test]
    fn bartlett_is_a_triangle() {
        let w = WindowKind::Bartlett.coefficients(8);
        assert_eq!(w, vec![0.0, 0.25, 0.5, 0.75, 1.0, 0.75, 0.5, 0.25]);
    }

    #[test]
    fn hanning_tapers_to_the_edges() {
        let w = WindowKind::Hanning.coefficients(1024);
        assert!(w[0] < 1e-4);
        assert_eq!(w[512], 1.0);
        assert!(w[1023] < 1e-2);
    }

    #[test]
    fn hamming_floor_at_the_edges() {
        let w = WindowKind::Hamming.coefficients(1024);
        assert!((w[0] - 0.08).abs() < 1e-9);
        assert!((w[512] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn blackman_vanishes_at_the_edges() {
        let w = WindowKind::Blackman.coefficients(1024);
        assert!(w[0].abs() < 1e-9);
        assert!((w[512] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn odd_length_zeroes_the_final_sample() {
        let w = WindowKind::Hanning.coefficients(5);
        assert_eq!(w[4], 0.0);
        assert_eq!(w[2], 1.0);
    }

    #[test]
    fn apply_scales_samples_in_place() {
        let mut frame = vec![2.0, 2.0, 2.0, 2.0];
        WindowKind::Bartlett.apply(&mut frame);
        assert_eq!(frame, vec![0.0, 1.0, 2.0, 1.0]);
    }
}
