//! First-order signal filters applied before framing.

/// Pole of the offset-compensation filter.
pub const OFFSET_COMPENSATION_POLE: f64 = 0.999;

/// Remove the DC offset: `y[n] = x[n] - x[n-1] + 0.999 * y[n-1]`.
///
/// # Example
/// ```
/// use nb_audio::filter::offset_compensation;
/// let y = offset_compensation(&[1.0; 4]);
/// assert!((y[0] - 1.0).abs() < 1e-12);
/// assert!((y[1] - 0.999).abs() < 1e-12);
/// ```
#[must_use]
pub fn offset_compensation(signal: &[f64]) -> Vec<f64> {
    let mut prev_x = 0.0;
    let mut prev_y = 0.0;
    signal
        .iter()
        .map(|&x| {
            let y = x - prev_x + OFFSET_COMPENSATION_POLE * prev_y;
            prev_x = x;
            prev_y = y;
            y
        })
        .collect()
}

/// Pre-emphasis high-pass: `y[t] = x[t] - factor * x[t-1]`, `y[0] = x[0]`.
///
/// A factor of 0 returns the signal unchanged.
#[must_use]
pub fn preemphasis(signal: &[f64], factor: f64) -> Vec<f64> {
    let mut prev = 0.0;
    signal
        .iter()
        .map(|&x| {
            let y = x - factor * prev;
            prev = x;
            y
        })
        .collect()
}

/// Offset compensation followed by pre-emphasis.
#[must_use]
pub fn preemphasis_with_offset_compensation(signal: &[f64], factor: f64) -> Vec<f64> {
    preemphasis(&offset_compensation(signal), factor)
}
