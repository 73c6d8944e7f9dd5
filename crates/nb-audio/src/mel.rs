//! Mel-scale conversions (HTK formula).

/// Hz to Mel scale conversion.
///
/// # Example
/// ```
/// use nb_audio::mel::hz_to_mel;
/// assert!(hz_to_mel(0.0).abs() < 1e-12);
/// assert!((hz_to_mel(700.0) - 2595.0 * 2.0_f64.log10()).abs() < 1e-9);
/// ```
#[inline]
#[must_use]
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Mel to Hz conversion.
#[inline]
#[must_use]
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// `count` frequencies in Hz, evenly spaced on the Mel scale from `low` to
/// `high` inclusive.
#[must_use]
pub fn mel_points(low: f64, high: f64, count: usize) -> Vec<f64> {
    let mel_low = hz_to_mel(low);
    let mel_high = hz_to_mel(high);
    match count {
        0 => Vec::new(),
        1 => vec![low],
        _ => (0..count)
            .map(|i| {
                let t = i as f64 / (count - 1) as f64;
                mel_to_hz(mel_low + (mel_high - mel_low) * t)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_are_inverse() {
        for hz in (0..=4000).step_by(50) {
            let hz = f64::from(hz);
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() < 1e-6, "{hz}");
        }
        for mel in (0..=4000).step_by(50) {
            let mel = f64::from(mel);
            assert!((hz_to_mel(mel_to_hz(mel)) - mel).abs() < 1e-6, "{mel}");
        }
    }

    #[test]
    fn points_hit_both_edges() {
        let points = mel_points(0.0, 8000.0, 25);
        assert_eq!(points.len(), 25);
        assert!(points[0].abs() < 1e-9);
        assert!((points[24] - 8000.0).abs() < 1e-6);
        assert!(points.windows(2).all(|w| w[0] < w[1]));
    }
}
