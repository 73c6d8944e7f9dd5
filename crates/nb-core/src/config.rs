use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::path::DEFAULT_SEPARATOR;

/// Upper bound on the number of Mel filters.
pub const MAX_FILTERS: usize = 512;

/// Complete application configuration.
///
/// Serializable to TOML. Every field has a sane default.
///
/// # Example
/// ```
/// use nb_core::config::AppConfig;
/// let config = AppConfig::default();
/// assert_eq!(config.features.sample_rate, 16000);
/// assert_eq!(config.nested.separator, ".");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Filterbank feature extraction.
    pub features: FeatureConfig,
    /// Nested-structure tooling.
    pub nested: NestedConfig,
}

/// Parameters of the Mel-filterbank feature pipeline.
///
/// # Example
/// ```
/// use nb_core::config::FeatureConfig;
/// let config = FeatureConfig::default();
/// assert_eq!(config.window_length, 400);
/// assert!((config.high_frequency() - 8000.0).abs() < f64::EPSILON);
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FeatureConfig {
    /// Sample rate of the signal in Hz.
    pub sample_rate: u32,
    /// Analysis window length in samples (400 = 25 ms @ 16 kHz).
    pub window_length: usize,
    /// Hop between successive windows in samples (160 = 10 ms @ 16 kHz).
    pub stft_shift: usize,
    /// FFT size. Must be even and at least `window_length`.
    pub stft_size: usize,
    /// Number of Mel filters.
    pub number_of_filters: usize,
    /// Lowest band edge of the filters in Hz.
    pub lowest_frequency: f64,
    /// Highest band edge in Hz. `None` = Nyquist.
    pub highest_frequency: Option<f64>,
    /// Pre-emphasis coefficient. 0 disables the filter.
    pub preemphasis_factor: f64,
    /// Analysis window.
    pub window: WindowKind,
    /// Filter shape used for the projection.
    pub filterbank: FilterbankKind,
    /// Subtract the per-filter minimum over time.
    pub denoise: bool,
    /// Pad `window_length - stft_shift` zeros on both ends before framing.
    pub fading: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            window_length: 400,
            stft_shift: 160,
            stft_size: 512,
            number_of_filters: 23,
            lowest_frequency: 0.0,
            highest_frequency: None,
            preemphasis_factor: 0.97,
            window: WindowKind::Hamming,
            filterbank: FilterbankKind::Triangular,
            denoise: false,
            fading: false,
        }
    }
}

impl FeatureConfig {
    /// Half the sample rate.
    #[must_use]
    pub fn nyquist(&self) -> f64 {
        f64::from(self.sample_rate) / 2.0
    }

    /// Effective highest band edge.
    #[must_use]
    pub fn high_frequency(&self) -> f64 {
        self.highest_frequency.unwrap_or_else(|| self.nyquist())
    }

    /// Clamp numeric fields to their valid ranges.
    ///
    /// The Nyquist bound on `highest_frequency` is left to the feature
    /// extractor, which reports it as a domain error.
    pub fn clamp_all(&mut self) {
        self.sample_rate = self.sample_rate.max(1);
        self.window_length = self.window_length.max(1);
        self.stft_shift = self.stft_shift.max(1);
        self.stft_size = self.stft_size.max(self.window_length).max(2);
        self.number_of_filters = self.number_of_filters.clamp(1, MAX_FILTERS);
        self.lowest_frequency = self.lowest_frequency.max(0.0);
        self.preemphasis_factor = self.preemphasis_factor.clamp(0.0, 1.0);
    }
}

/// Window function applied to each analysis frame.
///
/// # Example
/// ```
/// use nb_core::config::WindowKind;
/// assert!(matches!(WindowKind::default(), WindowKind::Hamming));
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum WindowKind {
    /// 0.54 − 0.46·cos.
    #[default]
    Hamming,
    /// Raised cosine.
    Hann,
    /// Three-term Blackman.
    Blackman,
    /// No tapering.
    Rectangular,
}

/// Shape of the Mel filters.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum FilterbankKind {
    /// Triangles on integer FFT bins, peak weight 1.
    #[default]
    Triangular,
    /// HTK triangles on exact bin frequencies, each row normalized to sum 1.
    Normalized,
}

/// Settings for the nested-structure commands.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NestedConfig {
    /// Separator for string-encoded paths and flattened keys.
    pub separator: String,
}

impl Default for NestedConfig {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

/// Intermediate TOML structure, every value optional.
#[derive(Deserialize)]
struct ConfigFile {
    features: Option<FeaturesSection>,
    nested: Option<NestedSection>,
}

/// Features section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct FeaturesSection {
    sample_rate: Option<u32>,
    window_length: Option<usize>,
    stft_shift: Option<usize>,
    stft_size: Option<usize>,
    number_of_filters: Option<usize>,
    lowest_frequency: Option<f64>,
    highest_frequency: Option<f64>,
    preemphasis_factor: Option<f64>,
    window: Option<WindowKind>,
    filterbank: Option<FilterbankKind>,
    denoise: Option<bool>,
    fading: Option<bool>,
}

/// Nested section of the TOML config.
#[derive(Deserialize)]
struct NestedSection {
    separator: Option<String>,
}

/// Load a TOML file and merge it over the defaults.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the
/// separator is empty.
///
/// # Example
/// ```no_run
/// use nb_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config in {}", path.display()))
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error on invalid TOML or an empty separator.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let file: ConfigFile = toml::from_str(content).context("TOML parse error")?;
    let mut config = AppConfig::default();

    if let Some(f) = file.features {
        let c = &mut config.features;
        if let Some(v) = f.sample_rate {
            c.sample_rate = v;
        }
        if let Some(v) = f.window_length {
            c.window_length = v;
        }
        if let Some(v) = f.stft_shift {
            c.stft_shift = v;
        }
        if let Some(v) = f.stft_size {
            c.stft_size = v;
        }
        if let Some(v) = f.number_of_filters {
            c.number_of_filters = v;
        }
        if let Some(v) = f.lowest_frequency {
            c.lowest_frequency = v;
        }
        if f.highest_frequency.is_some() {
            c.highest_frequency = f.highest_frequency;
        }
        if let Some(v) = f.preemphasis_factor {
            c.preemphasis_factor = v;
        }
        if let Some(v) = f.window {
            c.window = v;
        }
        if let Some(v) = f.filterbank {
            c.filterbank = v;
        }
        if let Some(v) = f.denoise {
            c.denoise = v;
        }
        if let Some(v) = f.fading {
            c.fading = v;
        }
    }

    if let Some(n) = file.nested {
        if let Some(v) = n.separator {
            if v.is_empty() {
                return Err(crate::error::CoreError::Config("separator must not be empty".into()).into());
            }
            config.nested.separator = v;
        }
    }

    config.features.clamp_all();
    log::debug!("config loaded: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_override_keeps_defaults() {
        let config = parse_config(
            "[features]\nnumber_of_filters = 40\nwindow = \"Hann\"\nfilterbank = \"Normalized\"\n",
        )
        .unwrap();
        assert_eq!(config.features.number_of_filters, 40);
        assert_eq!(config.features.window, WindowKind::Hann);
        assert_eq!(config.features.filterbank, FilterbankKind::Normalized);
        assert_eq!(config.features.stft_size, 512);
        assert_eq!(config.nested, NestedConfig::default());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config =
            parse_config("[features]\npreemphasis_factor = 3.0\nstft_size = 128\n").unwrap();
        assert!((config.features.preemphasis_factor - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.features.stft_size, 400);
    }

    #[test]
    fn empty_separator_is_rejected() {
        assert!(parse_config("[nested]\nseparator = \"\"\n").is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[nested]\nseparator = \"/\"").unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.nested.separator, "/");
        assert!(load_config(Path::new("/definitely/missing.toml")).is_err());
    }

    #[test]
    fn shipped_default_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        assert_eq!(load_config(&path).unwrap(), AppConfig::default());
    }
}
