//! Mel-filterbank feature extraction: Mel scale, filters, STFT, filterbanks
//! and audio decoding.

pub mod decode;
pub mod error;
pub mod fbank;
pub mod fft;
pub mod filter;
pub mod filterbank;
pub mod mel;
pub mod stft;
pub mod window;

pub use error::AudioError;
pub use fbank::{FbankExtractor, fbank, logfbank};
pub use filterbank::{MelTransform, mel_filterbank, triangular_filterbank};
