//! Mel filterbanks. Filters are stored in rows, columns are FFT bins
//! (`nfft/2 + 1` of them).

use nalgebra::DMatrix;
use nb_core::config::MAX_FILTERS;
use ndarray::{Array1, Array2, Axis};

use crate::error::{AudioError, check_band};
use crate::mel::mel_points;

fn check_layout(number_of_filters: usize, nfft: usize) -> Result<(), AudioError> {
    if !(1..=MAX_FILTERS).contains(&number_of_filters) {
        return Err(AudioError::InvalidParameter(format!(
            "number of filters must be in 1..={MAX_FILTERS}, got {number_of_filters}"
        )));
    }
    if nfft == 0 || nfft % 2 != 0 {
        return Err(AudioError::InvalidParameter(format!(
            "FFT size must be even and > 0, got {nfft}"
        )));
    }
    Ok(())
}

/// Triangular filterbank on integer FFT bins.
///
/// Band edges are `number_of_filters + 2` points evenly spaced in Mel between
/// `low` and `high`, mapped to bins with `floor((nfft + 1) * hz / sample_rate)`.
/// Each filter rises linearly from 0 to 1 and falls back to 0 in bin space.
///
/// # Errors
/// [`AudioError::Domain`] if `high` exceeds `sample_rate / 2`;
/// [`AudioError::InvalidParameter`] for an empty band, an odd or zero `nfft`,
/// or a filter count outside `1..=MAX_FILTERS`.
///
/// # Example
/// ```
/// use nb_audio::filterbank::triangular_filterbank;
/// let bank = triangular_filterbank(23, 512, 16000, 0.0, 8000.0).unwrap();
/// assert_eq!(bank.dim(), (23, 257));
/// assert!(triangular_filterbank(23, 512, 16000, 0.0, 9000.0).is_err());
/// ```
pub fn triangular_filterbank(
    number_of_filters: usize,
    nfft: usize,
    sample_rate: u32,
    low: f64,
    high: f64,
) -> Result<Array2<f64>, AudioError> {
    check_band(low, high, sample_rate)?;
    check_layout(number_of_filters, nfft)?;

    let sr = f64::from(sample_rate);
    let bins: Vec<f64> = mel_points(low, high, number_of_filters + 2)
        .into_iter()
        .map(|hz| ((nfft + 1) as f64 * hz / sr).floor())
        .collect();

    let columns = nfft / 2 + 1;
    let mut bank = Array2::zeros((number_of_filters, columns));
    for (j, mut row) in bank.axis_iter_mut(Axis(0)).enumerate() {
        let (left, center, right) = (bins[j], bins[j + 1], bins[j + 2]);
        for i in (left as usize..center as usize).filter(|&i| i < columns) {
            row[i] = (i as f64 - left) / (center - left);
        }
        for i in (center as usize..right as usize).filter(|&i| i < columns) {
            row[i] = (right - i as f64) / (right - center);
        }
    }

    log::debug!("triangular filterbank: {number_of_filters} filters, nfft {nfft}, [{low}, {high}] Hz");
    Ok(bank)
}

/// HTK-scale Mel filterbank on exact FFT bin frequencies, each row scaled to
/// sum to 1.
///
/// Filters too narrow to cover any bin remain all-zero rows.
///
/// # Errors
/// Same conditions as [`triangular_filterbank`].
///
/// # Example
/// ```
/// use nb_audio::filterbank::mel_filterbank;
/// let bank = mel_filterbank(40, 512, 16000, 50.0, 8000.0).unwrap();
/// let sum: f64 = bank.row(10).sum();
/// assert!((sum - 1.0).abs() < 1e-9);
/// ```
pub fn mel_filterbank(
    number_of_filters: usize,
    nfft: usize,
    sample_rate: u32,
    fmin: f64,
    fmax: f64,
) -> Result<Array2<f64>, AudioError> {
    check_band(fmin, fmax, sample_rate)?;
    check_layout(number_of_filters, nfft)?;

    let columns = nfft / 2 + 1;
    let fft_freqs = Array1::linspace(0.0, f64::from(sample_rate) / 2.0, columns);
    let edges = mel_points(fmin, fmax, number_of_filters + 2);

    let mut bank = Array2::zeros((number_of_filters, columns));
    for (j, mut row) in bank.axis_iter_mut(Axis(0)).enumerate() {
        let (left, center, right) = (edges[j], edges[j + 1], edges[j + 2]);
        for (weight, &freq) in row.iter_mut().zip(fft_freqs.iter()) {
            let lower = (freq - left) / (center - left);
            let upper = (right - freq) / (right - center);
            *weight = lower.min(upper).max(0.0);
        }
        let total = row.sum();
        if total > 0.0 {
            row /= total;
        }
    }

    log::debug!("normalized mel filterbank: {number_of_filters} filters, nfft {nfft}, [{fmin}, {fmax}] Hz");
    Ok(bank)
}

/// Singular values below this are treated as zero by the pseudo-inverse.
const PINV_EPSILON: f64 = 1e-12;

/// Moore-Penrose pseudo-inverse of `matrix`, via SVD.
fn pseudo_inverse(matrix: &Array2<f64>) -> Result<Array2<f64>, AudioError> {
    let (rows, cols) = matrix.dim();
    let pinv = DMatrix::from_fn(rows, cols, |r, c| matrix[[r, c]])
        .pseudo_inverse(PINV_EPSILON)
        .map_err(|e| AudioError::InvalidParameter(format!("pseudo-inverse failed: {e}")))?;
    Ok(Array2::from_shape_fn((cols, rows), |(r, c)| pinv[(r, c)]))
}

/// Linear to (log) Mel spectrogram projection with a normalized filterbank.
///
/// # Example
/// ```
/// use nb_audio::filterbank::MelTransform;
/// use ndarray::Array2;
/// let mel = MelTransform::with_defaults(16000, 512).unwrap();
/// let spec = Array2::<f64>::zeros((100, 257));
/// let bands = mel.apply(&spec).unwrap();
/// assert_eq!(bands.dim(), (100, 40));
/// assert_eq!(mel.inverse(&bands).unwrap().dim(), (100, 257));
/// ```
#[derive(Clone, Debug)]
pub struct MelTransform {
    sample_rate: u32,
    fft_length: usize,
    log: bool,
    /// `n_mels x (fft_length/2 + 1)`
    bank: Array2<f64>,
    /// `(fft_length/2 + 1) x n_mels`
    pinv: Array2<f64>,
}

impl MelTransform {
    /// Build a transform. `fmax = None` means the Nyquist frequency.
    ///
    /// # Errors
    /// See [`mel_filterbank`].
    pub fn new(
        sample_rate: u32,
        fft_length: usize,
        n_mels: usize,
        fmin: f64,
        fmax: Option<f64>,
        log: bool,
    ) -> Result<Self, AudioError> {
        let fmax = fmax.unwrap_or(f64::from(sample_rate) / 2.0);
        let bank = mel_filterbank(n_mels, fft_length, sample_rate, fmin, fmax)?;
        let pinv = pseudo_inverse(&bank)?;
        Ok(Self {
            sample_rate,
            fft_length,
            log,
            bank,
            pinv,
        })
    }

    /// 40 log-Mel bands from 50 Hz to Nyquist.
    ///
    /// # Errors
    /// See [`mel_filterbank`].
    pub fn with_defaults(sample_rate: u32, fft_length: usize) -> Result<Self, AudioError> {
        Self::new(sample_rate, fft_length, 40, 50.0, None, true)
    }

    /// Project a `frames x (fft_length/2 + 1)` spectrogram onto the Mel bands,
    /// then take `ln(x + 1e-18)` if the transform is logarithmic.
    ///
    /// # Errors
    /// [`AudioError::InvalidParameter`] if the column count does not match.
    pub fn apply(&self, spectrogram: &Array2<f64>) -> Result<Array2<f64>, AudioError> {
        if spectrogram.ncols() != self.bank.ncols() {
            return Err(AudioError::InvalidParameter(format!(
                "spectrogram has {} bins, expected {}",
                spectrogram.ncols(),
                self.bank.ncols()
            )));
        }
        let mel = spectrogram.dot(&self.bank.t());
        Ok(if self.log { mel.mapv(|x| (x + 1e-18).ln()) } else { mel })
    }

    /// Approximate linear spectrogram from `frames x n_mels` Mel features.
    ///
    /// Undoes the log if the transform is logarithmic, projects through the
    /// pseudo-inverse of the filterbank and clips negative values to 0.
    ///
    /// # Errors
    /// [`AudioError::InvalidParameter`] if the column count is not `n_mels`.
    pub fn inverse(&self, mel: &Array2<f64>) -> Result<Array2<f64>, AudioError> {
        if mel.ncols() != self.bank.nrows() {
            return Err(AudioError::InvalidParameter(format!(
                "mel features have {} bands, expected {}",
                mel.ncols(),
                self.bank.nrows()
            )));
        }
        let linear = if self.log { mel.mapv(f64::exp) } else { mel.clone() };
        Ok(linear.dot(&self.pinv.t()).mapv(|x| x.max(0.0)))
    }

    /// Filter matrix, one filter per row.
    #[must_use]
    pub fn filterbank(&self) -> &Array2<f64> {
        &self.bank
    }

    /// Number of Mel bands.
    #[must_use]
    pub fn n_mels(&self) -> usize {
        self.bank.nrows()
    }

    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[must_use]
    pub fn fft_length(&self) -> usize {
        self.fft_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangular_peaks_at_one() {
        let bank = triangular_filterbank(23, 512, 16000, 0.0, 8000.0).unwrap();
        for row in bank.rows() {
            let peak = row.iter().copied().fold(0.0, f64::max);
            assert!((peak - 1.0).abs() < 1e-12);
            assert!(row.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn domain_error_above_nyquist() {
        let err = triangular_filterbank(23, 512, 16000, 0.0, 8000.5).unwrap_err();
        assert!(matches!(err, AudioError::Domain { nyquist, .. } if (nyquist - 8000.0).abs() < 1e-9));
        assert!(matches!(
            mel_filterbank(23, 512, 16000, 0.0, 9000.0),
            Err(AudioError::Domain { .. })
        ));
    }

    #[test]
    fn invalid_layouts() {
        assert!(matches!(
            triangular_filterbank(23, 511, 16000, 0.0, 8000.0),
            Err(AudioError::InvalidParameter(_))
        ));
        assert!(triangular_filterbank(0, 512, 16000, 0.0, 8000.0).is_err());
        for n in [MAX_FILTERS + 1, usize::MAX] {
            assert!(matches!(
                triangular_filterbank(n, 512, 16000, 0.0, 8000.0),
                Err(AudioError::InvalidParameter(_))
            ));
            assert!(matches!(
                mel_filterbank(n, 512, 16000, 0.0, 8000.0),
                Err(AudioError::InvalidParameter(_))
            ));
        }
        assert_eq!(
            triangular_filterbank(MAX_FILTERS, 512, 16000, 0.0, 8000.0).unwrap().nrows(),
            MAX_FILTERS
        );
        assert!(mel_filterbank(10, 512, 16000, 4000.0, 4000.0).is_err());
    }

    #[test]
    fn normalized_rows_sum_to_one_or_zero() {
        // Narrow low bands on a coarse FFT leave some filters empty.
        let bank = mel_filterbank(64, 64, 16000, 0.0, 8000.0).unwrap();
        let mut empty = 0;
        for row in bank.rows() {
            let sum = row.sum();
            if sum == 0.0 {
                empty += 1;
            } else {
                assert!((sum - 1.0).abs() < 1e-9);
            }
        }
        assert!(empty > 0);
    }

    #[test]
    fn mel_transform_log_of_zero_is_finite() {
        let mel = MelTransform::new(16000, 512, 23, 0.0, None, true).unwrap();
        let out = mel.apply(&Array2::zeros((3, 257))).unwrap();
        assert_eq!(out.dim(), (3, 23));
        assert!(out.iter().all(|&x| (x - 1e-18_f64.ln()).abs() < 1e-9));
        assert!(mel.apply(&Array2::zeros((3, 256))).is_err());
    }

    #[test]
    fn inverse_restores_spectrogram_shape() {
        let mel = MelTransform::with_defaults(16000, 512).unwrap();
        let spectrogram =
            Array2::from_shape_fn((7, 257), |(t, f)| ((t * 31 + f * 17) % 23) as f64 / 23.0);
        let bands = mel.apply(&spectrogram).unwrap();
        let restored = mel.inverse(&bands).unwrap();
        assert_eq!(restored.dim(), (7, 257));
        assert!(restored.iter().all(|&x| x >= 0.0 && x.is_finite()));
        assert!(mel.inverse(&Array2::zeros((7, 41))).is_err());
    }

    #[test]
    fn inverse_of_silence_is_silence() {
        let mel = MelTransform::new(16000, 512, 23, 0.0, None, false).unwrap();
        let restored = mel.inverse(&Array2::zeros((2, 23))).unwrap();
        assert!(restored.iter().all(|&x| x == 0.0));
        assert_eq!(mel.pinv.dim(), (257, 23));
    }
}
