use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::AudioError;

/// Complex spectrum sample.
pub type Complex64 = Complex<f64>;

/// FFT pipeline: windowed, zero-padded real FFT using realfft.
///
/// Pre-allocates the FFT plan and scratch buffers. Cloning shares the plan
/// and duplicates the buffers, so each worker thread gets its own clone.
///
/// # Example
/// ```
/// use nb_audio::fft::FftPipeline;
/// let fft = FftPipeline::new(512, vec![1.0; 400]).unwrap();
/// assert_eq!(fft.bins(), 257);
/// ```
#[derive(Clone)]
pub struct FftPipeline {
    fft_size: usize,
    input_buf: Vec<f64>,
    spectrum_buf: Vec<Complex64>,
    scratch: Vec<Complex64>,
    plan: Arc<dyn RealToComplex<f64>>,
    /// Analysis window, at most `fft_size` long.
    window: Vec<f64>,
}

impl FftPipeline {
    /// Create a pipeline of `size` points applying `window` to each frame.
    ///
    /// # Errors
    /// [`AudioError::InvalidParameter`] if `size` is 0 or the window is
    /// longer than `size`.
    pub fn new(size: usize, window: Vec<f64>) -> Result<Self, AudioError> {
        if size == 0 {
            return Err(AudioError::InvalidParameter("FFT size must be > 0".into()));
        }
        if window.len() > size {
            return Err(AudioError::InvalidParameter(format!(
                "window length {} exceeds FFT size {size}",
                window.len()
            )));
        }

        let mut planner = RealFftPlanner::<f64>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        Ok(Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
        })
    }

    /// Window `frame`, zero-pad it to the FFT size and transform it.
    ///
    /// Samples beyond the window length are ignored. Returns the one-sided
    /// spectrum (N/2+1 bins).
    ///
    /// # Errors
    /// [`AudioError::Fft`] if realfft rejects the buffers.
    ///
    /// # Example
    /// ```
    /// use nb_audio::fft::FftPipeline;
    /// let mut fft = FftPipeline::new(8, vec![1.0; 8]).unwrap();
    /// let spectrum = fft.process(&[1.0; 8]).unwrap();
    /// assert!((spectrum[0].re - 8.0).abs() < 1e-9);
    /// assert!(spectrum[1].norm() < 1e-9);
    /// ```
    pub fn process(&mut self, frame: &[f64]) -> Result<&[Complex64], AudioError> {
        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = match (frame.get(i), self.window.get(i)) {
                (Some(&sample), Some(&w)) => sample * w,
                _ => 0.0,
            };
        }

        self.plan
            .process_with_scratch(&mut self.input_buf, &mut self.spectrum_buf, &mut self.scratch)
            .map_err(|e| AudioError::Fft(e.to_string()))?;

        Ok(&self.spectrum_buf)
    }

    /// FFT size.
    #[must_use]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of one-sided frequency bins.
    #[must_use]
    pub fn bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

impl std::fmt::Debug for FftPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftPipeline")
            .field("fft_size", &self.fft_size)
            .field("window_length", &self.window.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_sizes() {
        assert!(FftPipeline::new(0, Vec::new()).is_err());
        assert!(FftPipeline::new(4, vec![1.0; 5]).is_err());
    }

    #[test]
    fn short_frames_are_zero_padded() {
        let mut fft = FftPipeline::new(16, vec![1.0; 4]).unwrap();
        let spectrum = fft.process(&[1.0; 2]).unwrap().to_vec();
        assert_eq!(spectrum.len(), 9);
        assert!((spectrum[0].re - 2.0).abs() < 1e-9);
    }
}
