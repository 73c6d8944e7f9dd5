use std::path::Path;

use nb_core::config::{FeatureConfig, FilterbankKind};
use ndarray::{Array2, Axis};

use crate::error::{AudioError, check_band};
use crate::filter::preemphasis_with_offset_compensation;
use crate::filterbank::{mel_filterbank, triangular_filterbank};
use crate::stft::{Stft, stft_to_spectrogram};

/// Floor applied to exact-zero energies so that their log is finite.
pub const EPSILON: f64 = f64::EPSILON;

/// Mel-filterbank feature extractor for whole signals.
///
/// Holds the prepared STFT and filter matrix for one [`FeatureConfig`], so
/// repeated extraction does not re-plan the FFT.
///
/// # Example
/// ```
/// use nb_audio::fbank::FbankExtractor;
/// use nb_core::config::FeatureConfig;
/// let extractor = FbankExtractor::new(&FeatureConfig::default()).unwrap();
/// let features = extractor.extract(&vec![0.0; 16000]).unwrap();
/// assert_eq!(features.dim(), (99, 23));
/// ```
#[derive(Clone, Debug)]
pub struct FbankExtractor {
    config: FeatureConfig,
    stft: Stft,
    bank: Array2<f64>,
}

impl FbankExtractor {
    /// Validate `config` and prepare the STFT and filterbank.
    ///
    /// # Errors
    /// [`AudioError::Domain`] if the highest frequency exceeds Nyquist,
    /// [`AudioError::InvalidParameter`] for inconsistent sizes.
    pub fn new(config: &FeatureConfig) -> Result<Self, AudioError> {
        let high = config.high_frequency();
        check_band(config.lowest_frequency, high, config.sample_rate)?;

        let stft = Stft::new(
            config.stft_size,
            config.stft_shift,
            config.window,
            config.window_length,
            config.fading,
        )?;

        let bank = match config.filterbank {
            FilterbankKind::Triangular => triangular_filterbank(
                config.number_of_filters,
                config.stft_size,
                config.sample_rate,
                config.lowest_frequency,
                high,
            )?,
            FilterbankKind::Normalized => mel_filterbank(
                config.number_of_filters,
                config.stft_size,
                config.sample_rate,
                config.lowest_frequency,
                high,
            )?,
        };

        log::debug!(
            "fbank extractor: {} Hz, {:?} window {}/{}, {} {:?} filters",
            config.sample_rate,
            config.window,
            config.window_length,
            config.stft_shift,
            config.number_of_filters,
            config.filterbank
        );

        Ok(Self {
            config: config.clone(),
            stft,
            bank,
        })
    }

    /// Configuration this extractor was built for.
    #[must_use]
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Filterbank energies, `frames x number_of_filters`.
    ///
    /// Exact zeros are replaced by [`EPSILON`].
    ///
    /// # Errors
    /// [`AudioError::Fft`] if a transform fails.
    pub fn extract(&self, signal: &[f64]) -> Result<Array2<f64>, AudioError> {
        let filtered = preemphasis_with_offset_compensation(signal, self.config.preemphasis_factor);
        let spectrum = self.stft.process(&filtered)?;
        let spectrogram = stft_to_spectrogram(&spectrum) / self.stft.size() as f64;

        let mut feature = spectrogram.dot(&self.bank.t());

        if self.config.denoise {
            for mut column in feature.axis_iter_mut(Axis(1)) {
                let floor = column.iter().copied().fold(f64::INFINITY, f64::min);
                column -= floor;
            }
        }

        feature.mapv_inplace(|x| if x == 0.0 { EPSILON } else { x });
        Ok(feature)
    }

    /// Natural log of [`extract`](Self::extract).
    ///
    /// # Errors
    /// See [`extract`](Self::extract).
    pub fn extract_log(&self, signal: &[f64]) -> Result<Array2<f64>, AudioError> {
        Ok(self.extract(signal)?.mapv(f64::ln))
    }

    /// Decode an audio file and extract its filterbank energies.
    ///
    /// If the file's sample rate differs from the configured one, the
    /// extractor is rebuilt for the file's rate.
    ///
    /// # Errors
    /// Returns an error if the file cannot be decoded or the configuration
    /// is invalid at the file's sample rate.
    pub fn extract_file(&mut self, path: &Path, log: bool) -> anyhow::Result<Array2<f64>> {
        let (samples, actual_sr) = crate::decode::decode_file(path)?;
        if actual_sr != self.config.sample_rate {
            log::warn!(
                "{} is sampled at {actual_sr} Hz, configured {} Hz; rebuilding filterbank",
                path.display(),
                self.config.sample_rate
            );
            let mut config = self.config.clone();
            config.sample_rate = actual_sr;
            *self = Self::new(&config)?;
        }
        let features = if log {
            self.extract_log(&samples)?
        } else {
            self.extract(&samples)?
        };
        log::info!("{}: {} frames", path.display(), features.nrows());
        Ok(features)
    }
}

/// Mel-filterbank energies of `signal`.
///
/// # Errors
/// See [`FbankExtractor::new`].
pub fn fbank(signal: &[f64], config: &FeatureConfig) -> Result<Array2<f64>, AudioError> {
    FbankExtractor::new(config)?.extract(signal)
}

/// Log Mel-filterbank energies of `signal`.
///
/// # Errors
/// See [`FbankExtractor::new`].
pub fn logfbank(signal: &[f64], config: &FeatureConfig) -> Result<Array2<f64>, AudioError> {
    FbankExtractor::new(config)?.extract_log(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nb_core::config::WindowKind;

    fn tone(freq: f64, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * freq * i as f64 / 16000.0).sin())
            .collect()
    }

    #[test]
    fn zero_signal_is_floored() {
        let features = fbank(&vec![0.0; 4000], &FeatureConfig::default()).unwrap();
        assert_eq!(features.ncols(), 23);
        assert!(features.iter().all(|&x| x == EPSILON));
        let log = logfbank(&vec![0.0; 4000], &FeatureConfig::default()).unwrap();
        assert!(log.iter().all(|&x| (x - EPSILON.ln()).abs() < 1e-12));
    }

    #[test]
    fn highest_frequency_above_nyquist() {
        let config = FeatureConfig {
            highest_frequency: Some(8001.0),
            ..FeatureConfig::default()
        };
        assert!(matches!(fbank(&[0.0; 400], &config), Err(AudioError::Domain { .. })));
    }

    #[test]
    fn tone_energy_lands_in_matching_band() {
        let config = FeatureConfig::default();
        let extractor = FbankExtractor::new(&config).unwrap();
        let low = extractor.extract(&tone(300.0, 8000)).unwrap();
        let high = extractor.extract(&tone(5000.0, 8000)).unwrap();
        let peak = |m: &Array2<f64>| {
            let mean = m.mean_axis(Axis(0)).unwrap();
            mean.iter()
                .enumerate()
                .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                .0
        };
        assert!(peak(&low) < peak(&high));
    }

    #[test]
    fn denoise_zeroes_the_per_filter_minimum() {
        let config = FeatureConfig {
            denoise: true,
            window: WindowKind::Hann,
            ..FeatureConfig::default()
        };
        let mut signal = tone(1000.0, 8000);
        signal.extend(std::iter::repeat_n(0.0, 8000));
        let features = fbank(&signal, &config).unwrap();
        for column in features.columns() {
            let min = column.iter().copied().fold(f64::INFINITY, f64::min);
            assert!(min == EPSILON || min.abs() < 1e-12);
        }
    }

    #[test]
    fn normalized_bank_is_selectable() {
        let config = FeatureConfig {
            filterbank: FilterbankKind::Normalized,
            number_of_filters: 40,
            ..FeatureConfig::default()
        };
        let features = fbank(&tone(440.0, 3200), &config).unwrap();
        assert_eq!(features.dim(), (19, 40));
    }
}
