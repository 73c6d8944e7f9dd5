use thiserror::Error;

/// Errors originating from the feature-extraction pipeline.
#[derive(Error, Debug)]
pub enum AudioError {
    /// Highest filter frequency above the Nyquist frequency.
    #[error("highest frequency {high} Hz is greater than samplerate/2 ({nyquist} Hz)")]
    Domain {
        /// Requested upper band edge.
        high: f64,
        /// Half the sample rate.
        nyquist: f64,
    },

    /// A size, count or frequency outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// FFT planning or execution failure.
    #[error("FFT error: {0}")]
    Fft(String),

    /// Audio decode error.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Check the upper band edge against the Nyquist frequency.
pub(crate) fn check_band(low: f64, high: f64, sample_rate: u32) -> Result<(), AudioError> {
    let nyquist = f64::from(sample_rate) / 2.0;
    if high > nyquist {
        return Err(AudioError::Domain { high, nyquist });
    }
    if low < 0.0 || low >= high {
        return Err(AudioError::InvalidParameter(format!(
            "band [{low}, {high}] Hz is empty or negative"
        )));
    }
    Ok(())
}
