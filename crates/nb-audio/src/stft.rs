//! Short-time Fourier transform over independent frames.

use nb_core::config::WindowKind;
use ndarray::Array2;
use rayon::prelude::*;

use crate::error::AudioError;
use crate::fft::{Complex64, FftPipeline};
use crate::window::coefficients;

/// Reusable STFT: frame layout plus a prepared FFT pipeline.
///
/// Frames start every `shift` samples and span `window_length` samples; the
/// signal end is zero-padded so that the last frame is complete. With
/// `fading`, `window_length - shift` zeros are added on both ends first.
#[derive(Clone, Debug)]
pub struct Stft {
    shift: usize,
    window_length: usize,
    fading: bool,
    pipeline: FftPipeline,
}

impl Stft {
    /// Prepare an STFT.
    ///
    /// # Errors
    /// [`AudioError::InvalidParameter`] for a zero size, shift or window
    /// length, or a window longer than `size`.
    pub fn new(
        size: usize,
        shift: usize,
        window: WindowKind,
        window_length: usize,
        fading: bool,
    ) -> Result<Self, AudioError> {
        if shift == 0 || window_length == 0 {
            return Err(AudioError::InvalidParameter(format!(
                "shift ({shift}) and window length ({window_length}) must be > 0"
            )));
        }
        let pipeline = FftPipeline::new(size, coefficients(window, window_length))?;
        Ok(Self {
            shift,
            window_length,
            fading,
            pipeline,
        })
    }

    /// Number of one-sided frequency bins per frame.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.pipeline.bins()
    }

    /// FFT size.
    #[must_use]
    pub fn size(&self) -> usize {
        self.pipeline.fft_size()
    }

    /// Number of frames produced for a signal of `len` samples.
    #[must_use]
    pub fn frame_count(&self, len: usize) -> usize {
        let len = len + self.fade_padding() * 2;
        if len == 0 {
            0
        } else if len <= self.window_length {
            1
        } else {
            (len - self.window_length).div_ceil(self.shift) + 1
        }
    }

    fn fade_padding(&self) -> usize {
        if self.fading {
            self.window_length.saturating_sub(self.shift)
        } else {
            0
        }
    }

    /// Transform `signal` into a `frames x (size/2 + 1)` complex matrix.
    ///
    /// Frames are transformed in parallel; the output is identical to a
    /// sequential run.
    ///
    /// # Errors
    /// [`AudioError::Fft`] if a transform fails.
    pub fn process(&self, signal: &[f64]) -> Result<Array2<Complex64>, AudioError> {
        let frames = self.frame_count(signal.len());
        let bins = self.bins();
        let fade = self.fade_padding();

        let padded_len = if frames == 0 {
            0
        } else {
            (frames - 1) * self.shift + self.window_length
        };
        let mut padded = vec![0.0; padded_len];
        if let Some(dst) = padded.get_mut(fade..fade + signal.len()) {
            dst.copy_from_slice(signal);
        }

        let rows: Vec<Vec<Complex64>> = (0..frames)
            .into_par_iter()
            .map_with(self.pipeline.clone(), |pipeline, index| {
                let start = index * self.shift;
                let end = start + self.window_length;
                pipeline.process(&padded[start..end]).map(<[Complex64]>::to_vec)
            })
            .collect::<Result<_, _>>()?;

        log::trace!("stft: {} samples -> {frames} frames x {bins} bins", signal.len());

        let flat: Vec<Complex64> = rows.into_iter().flatten().collect();
        Array2::from_shape_vec((frames, bins), flat)
            .map_err(|e| AudioError::InvalidParameter(e.to_string()))
    }
}

/// One-shot STFT; see [`Stft`].
///
/// # Errors
/// See [`Stft::new`] and [`Stft::process`].
///
/// # Example
/// ```
/// use nb_audio::stft::stft;
/// use nb_core::config::WindowKind;
/// let signal = vec![0.5; 1000];
/// let spec = stft(&signal, 512, 160, WindowKind::Hamming, 400, false).unwrap();
/// assert_eq!(spec.dim(), (5, 257));
/// ```
pub fn stft(
    signal: &[f64],
    size: usize,
    shift: usize,
    window: WindowKind,
    window_length: usize,
    fading: bool,
) -> Result<Array2<Complex64>, AudioError> {
    Stft::new(size, shift, window, window_length, fading)?.process(signal)
}

/// Power spectrogram `|X|^2` of an STFT matrix.
#[must_use]
pub fn stft_to_spectrogram(stft: &Array2<Complex64>) -> Array2<f64> {
    stft.mapv(|c| c.norm_sqr())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(fading: bool) -> Stft {
        Stft::new(512, 160, WindowKind::Hamming, 400, fading).unwrap()
    }

    #[test]
    fn frame_count_rounds_up() {
        let stft = plain(false);
        assert_eq!(stft.frame_count(0), 0);
        assert_eq!(stft.frame_count(10), 1);
        assert_eq!(stft.frame_count(400), 1);
        assert_eq!(stft.frame_count(401), 2);
        assert_eq!(stft.frame_count(560), 2);
        assert_eq!(stft.frame_count(16_000), 99);
    }

    #[test]
    fn fading_adds_frames() {
        // 240 zeros on both sides
        assert_eq!(plain(true).frame_count(400), 4);
    }

    #[test]
    fn output_has_one_sided_bins() {
        let signal: Vec<f64> = (0..2000).map(|i| (f64::from(i) * 0.1).sin()).collect();
        let spec = plain(false).process(&signal).unwrap();
        assert_eq!(spec.dim(), (11, 257));
        assert!(plain(false).process(&[]).unwrap().is_empty());
    }

    #[test]
    fn spectrogram_is_power() {
        let spec = stft(&[1.0; 4], 4, 4, WindowKind::Rectangular, 4, false).unwrap();
        let power = stft_to_spectrogram(&spec);
        assert!((power[[0, 0]] - 16.0).abs() < 1e-9);
        assert!(power[[0, 1]].abs() < 1e-9);
    }

    #[test]
    fn invalid_layout_is_rejected() {
        assert!(Stft::new(256, 160, WindowKind::Hann, 400, false).is_err());
        assert!(Stft::new(512, 0, WindowKind::Hann, 400, false).is_err());
    }
}
