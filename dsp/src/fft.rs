//! Radix-2 decimation-in-time FFT with precomputed twiddle tables.

use std::f64::consts::PI;

use crate::error::DspError;

/// Full-scale reference subtracted from the power spectrum, in dB.
const DBFS_REFERENCE: f64 = 96.0;

/// Fixed-size FFT engine.
///
/// Twiddle tables are built once for a given transform length and reused
/// across frames. After [`execute`](Fft::execute) the real part, imaginary
/// part and dBFS amplitudes of the latest transform stay available until
/// the next call.
#[derive(Debug, Clone)]
pub struct Fft {
    n: usize,
    levels: u32,
    cos: Vec<f64>,
    sin: Vec<f64>,
    real: Vec<f64>,
    imag: Vec<f64>,
    amplitudes: Vec<f64>,
}

impl Fft {
    /// Builds an engine for transforms of `n` points.
    pub fn new(n: usize) -> Result<Self, DspError> {
        if n == 0 || !n.is_power_of_two() {
            return Err(DspError::FftSizeNotPowerOfTwo { size: n });
        }
        let levels = n.trailing_zeros();
        let mut cos = vec![0.0; n / 2];
        let mut sin = vec![0.0; n / 2];
        for (i, (c, s)) in cos.iter_mut().zip(sin.iter_mut()).enumerate() {
            let angle = -2.0 * PI * i as f64 / n as f64;
            *c = angle.cos();
            *s = angle.sin();
        }
        Ok(Self {
            n,
            levels,
            cos,
            sin,
            real: Vec::new(),
            imag: Vec::new(),
            amplitudes: Vec::new(),
        })
    }

    /// Transform length.
    pub fn size(&self) -> usize {
        self.n
    }

    /// Runs the transform over `input`.
    ///
    /// Input shorter than the transform length is zero-padded. Input longer
    /// than the transform length is aliased back onto the first period:
    /// sample `i` overwrites slot `i % n` with `input[i % n] + input[i]`,
    /// so of several wraps onto one slot the last one wins.
    pub fn execute(&mut self, input: &[f64]) {
        let n = self.n;
        let mut x = vec![0.0; n];
        let mut y = vec![0.0; n];
        if n < input.len() {
            x.copy_from_slice(&input[..n]);
            for i in n..input.len() {
                x[i % n] = input[i % n] + input[i];
            }
        } else {
            x[..input.len()].copy_from_slice(input);
        }

        // Bit-reversal permutation
        let mut j = 0usize;
        let half = n / 2;
        for i in 1..n.saturating_sub(1) {
            let mut n1 = half;
            while j >= n1 {
                j -= n1;
                n1 /= 2;
            }
            j += n1;
            if i < j {
                x.swap(i, j);
                y.swap(i, j);
            }
        }

        // Butterfly stages
        let mut n2 = 1usize;
        for stage in 0..self.levels {
            let n1 = n2;
            n2 += n2;
            let mut a = 0usize;
            for j in 0..n1 {
                let c = self.cos[a];
                let s = self.sin[a];
                a += 1 << (self.levels - stage - 1);
                let mut k = j;
                while k < n {
                    let t1 = c * x[k + n1] - s * y[k + n1];
                    let t2 = s * x[k + n1] + c * y[k + n1];
                    x[k + n1] = x[k] - t1;
                    y[k + n1] = y[k] - t2;
                    x[k] += t1;
                    y[k] += t2;
                    k += n2;
                }
            }
        }

        self.amplitudes = (0..n / 2)
            .map(|i| {
                let power = (x[i] * x[i] + y[i] * y[i]) / n as f64;
                10.0 * power.log10() - DBFS_REFERENCE
            })
            .collect();
        self.real = x;
        self.imag = y;
    }

    /// Real part of the latest transform.
    pub fn real(&self) -> &[f64] {
        &self.real
    }

    /// Imaginary part of the latest transform.
    pub fn imag(&self) -> &[f64] {
        &self.imag
    }

    /// dBFS amplitude per bin, `n / 2` bins.
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }
}
