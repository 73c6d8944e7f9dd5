use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::AudioError;

/// Decode an audio file into mono f64 samples at its native sample rate.
///
/// Supports WAV, MP3, FLAC, OGG, AAC via symphonia. Multi-channel audio is
/// averaged down to one channel.
///
/// # Errors
/// Returns an error if the file cannot be opened or probed, or has no
/// sample rate.
///
/// # Example
/// ```no_run
/// use nb_audio::decode::decode_file;
/// let (samples, sample_rate) = decode_file("speech.wav").unwrap();
/// ```
pub fn decode_file(path: impl AsRef<Path>) -> Result<(Vec<f64>, u32)> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Cannot open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(
        Box::new(file),
        symphonia::core::io::MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(e.to_string()))
        .with_context(|| format!("Failed to probe {}", path.display()))?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .context("No default audio track found")?;

    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Audio track has no sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(e.to_string()))
        .context("Failed to create audio decoder")?;

    let track_id = track.id;
    let mut all_samples: Vec<f64> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f64>> = None;
    let mut max_sample_frames: usize = 0;
    let mut channels: usize = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Audio decode packet error: {e}");
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Audio decode frame error: {e}");
                continue;
            }
        };

        let spec = *decoded.spec();
        channels = spec.channels.count();
        let num_frames = decoded.capacity();
        if sample_buf.is_none() || num_frames > max_sample_frames {
            sample_buf = Some(SampleBuffer::<f64>::new(num_frames as u64, spec));
            max_sample_frames = num_frames;
        }
        let Some(buf) = sample_buf.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);
        downmix_into(&mut all_samples, buf.samples(), channels);
    }

    log::info!(
        "Decoded {} samples @ {}Hz ({} channels) from {}",
        all_samples.len(),
        sample_rate,
        channels,
        path.display()
    );

    Ok((all_samples, sample_rate))
}

/// Average interleaved frames of `channels` samples into `out`.
fn downmix_into(out: &mut Vec<f64>, interleaved: &[f64], channels: usize) {
    let channels = channels.max(1);
    out.extend(
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f64>() / channels as f64),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_each_frame() {
        let mut out = Vec::new();
        downmix_into(&mut out, &[1.0, 3.0, -2.0, 0.0], 2);
        assert_eq!(out, [2.0, -1.0]);

        out.clear();
        downmix_into(&mut out, &[0.5, 0.25], 1);
        assert_eq!(out, [0.5, 0.25]);

        out.clear();
        downmix_into(&mut out, &[0.5, 0.25], 0);
        assert_eq!(out, [0.5, 0.25]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = decode_file("/definitely/missing.wav").unwrap_err();
        assert!(err.to_string().contains("Cannot open audio file"));
    }

    #[test]
    fn garbage_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"not audio at all").unwrap();
        assert!(decode_file(file.path()).is_err());
    }
}
