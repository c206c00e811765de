//! Pre-emphasis and overlapping frame assembly.

/// Default analysis frame length in samples.
pub const DEFAULT_FRAME_LENGTH: usize = 1024;

/// Default overlap between consecutive frames, half a frame.
pub const DEFAULT_OVERLAP: usize = DEFAULT_FRAME_LENGTH / 2;

/// Default pre-emphasis coefficient.
pub const DEFAULT_PRE_EMPHASIS: f64 = 0.95;

/// First-order high-pass emphasis: `out[i] = x[i] - alpha * x[i - 1]`.
///
/// The first output sample has no predecessor and is set to zero.
pub fn pre_emphasis(signal: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = vec![0.0; signal.len()];
    for i in 1..signal.len() {
        out[i] = signal[i] - alpha * signal[i - 1];
    }
    out
}

/// Splits `signal` into overlapping frames of `frame_length` samples.
///
/// Consecutive frames start `frame_length - overlap` samples apart and the
/// tail is zero-padded to a whole frame. An empty signal yields no frames.
/// `overlap` must be smaller than `frame_length`; callers validate their
/// configuration before framing.
pub fn framing(signal: &[f64], frame_length: usize, overlap: usize) -> Vec<Vec<f64>> {
    assert!(
        overlap < frame_length,
        "overlap {overlap} must be smaller than frame length {frame_length}"
    );
    let step = frame_length - overlap;
    let num_frames = signal.len().div_ceil(step);

    let mut padded = vec![0.0; num_frames * frame_length];
    padded[..signal.len()].copy_from_slice(signal);

    (0..num_frames)
        .map(|f| padded[f * step..f * step + frame_length].to_vec())
        .collect()
}
