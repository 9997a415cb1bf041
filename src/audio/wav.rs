//! In-memory WAV encoding for API submission.
//!
//! The transcription service expects a standard uncompressed WAV container
//! (mono, 16-bit PCM), so each chunk is wrapped before upload.

use crate::defaults;
use crate::error::{LivesubError, Result};
use std::io::Cursor;

/// Encode 16-bit mono PCM samples into an in-memory WAV container.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: defaults::CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).map_err(|e| LivesubError::Transcription {
            message: format!("Failed to create WAV writer: {}", e),
        })?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| LivesubError::Transcription {
                message: format!("Failed to write WAV sample: {}", e),
            })?;
    }

    writer.finalize().map_err(|e| LivesubError::Transcription {
        message: format!("Failed to finalize WAV data: {}", e),
    })?;

    Ok(cursor.into_inner())
}

/// Linear-interpolation resampling between sample rates.
///
/// Used by the capture fallback path when a device only exposes its native
/// rate. Quality is sufficient for speech; the transcription model is robust
/// to it.
#[cfg(feature = "cpal-audio")]
pub(crate) fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx.min(samples.len().saturating_sub(1))]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_wav_produces_riff_header() {
        let samples = vec![0i16; 160];
        let bytes = encode_wav(&samples, 16000).unwrap();

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        // 44-byte header + 2 bytes per sample
        assert_eq!(bytes.len(), 44 + samples.len() * 2);
    }

    #[test]
    fn encode_wav_roundtrips_through_hound() {
        let samples: Vec<i16> = (0..1600).map(|i| (i % 100) as i16 * 300).collect();
        let bytes = encode_wav(&samples, 16000).unwrap();

        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn encode_wav_handles_empty_input() {
        let bytes = encode_wav(&[], 16000).unwrap();
        assert_eq!(bytes.len(), 44);
    }

    #[cfg(feature = "cpal-audio")]
    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![1i16, 2, 3, 4];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[cfg(feature = "cpal-audio")]
    #[test]
    fn resample_halves_length_when_downsampling() {
        let samples = vec![100i16; 32000];
        let out = resample(&samples, 32000, 16000);
        assert_eq!(out.len(), 16000);
        assert!(out.iter().all(|&s| s == 100));
    }
}
