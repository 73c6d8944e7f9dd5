use std::f64::consts::PI;

use nb_core::config::WindowKind;

/// Periodic window coefficients of length `len`.
///
/// Periodic form: the symmetric window of length `len + 1` without its last
/// sample, as used for spectral analysis.
///
/// # Example
/// ```
/// use nb_audio::window::coefficients;
/// use nb_core::config::WindowKind;
/// let w = coefficients(WindowKind::Hann, 4);
/// assert!(w[0].abs() < 1e-12);
/// assert!((w[2] - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn coefficients(kind: WindowKind, len: usize) -> Vec<f64> {
    let n = len as f64;
    (0..len)
        .map(|i| {
            let phase = 2.0 * PI * i as f64 / n;
            match kind {
                WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
                WindowKind::Hann => 0.5 - 0.5 * phase.cos(),
                WindowKind::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
                WindowKind::Rectangular => 1.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hamming_endpoints() {
        let w = coefficients(WindowKind::Hamming, 400);
        assert_eq!(w.len(), 400);
        assert!((w[0] - 0.08).abs() < 1e-12);
        assert!((w[200] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn periodic_windows_are_shift_symmetric() {
        for kind in [WindowKind::Hamming, WindowKind::Hann, WindowKind::Blackman] {
            let w = coefficients(kind, 16);
            for i in 1..16 {
                assert!((w[i] - w[16 - i]).abs() < 1e-12, "{kind:?} at {i}");
            }
        }
    }

    #[test]
    fn rectangular_is_flat() {
        assert!(coefficients(WindowKind::Rectangular, 8).iter().all(|&c| (c - 1.0).abs() < f64::EPSILON));
        assert!(coefficients(WindowKind::Hann, 0).is_empty());
    }
}
