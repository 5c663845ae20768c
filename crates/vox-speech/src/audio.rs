//! PCM assembly and WAV output.

use std::io::Write;
use std::path::Path;

use crate::error::SpeechResult;

/// Fixed output sample rate of the inference engine, Hz.
pub const SAMPLE_RATE: u32 = 24_000;

/// Concatenate PCM chunks in playback order.
pub fn concat_chunks(chunks: Vec<Vec<f32>>) -> Vec<f32> {
    match chunks.len() {
        0 => Vec::new(),
        1 => chunks.into_iter().next().unwrap_or_default(),
        _ => {
            let total = chunks.iter().map(Vec::len).sum();
            let mut samples = Vec::with_capacity(total);
            for chunk in chunks {
                samples.extend_from_slice(&chunk);
            }
            samples
        }
    }
}

/// Duration of a mono sample buffer at [`SAMPLE_RATE`], seconds.
pub fn duration_seconds(samples: &[f32]) -> f64 {
    samples.len() as f64 / SAMPLE_RATE as f64
}

/// Write samples as a 16-bit mono PCM WAV file.
pub fn write_wav(samples: &[f32], path: &Path) -> SpeechResult<()> {
    let data_len = (samples.len() * 2) as u32;
    let byte_rate = SAMPLE_RATE * 2;

    let mut out = Vec::with_capacity(44 + samples.len() * 2);
    out.write_all(b"RIFF")?;
    out.write_all(&(36 + data_len).to_le_bytes())?;
    out.write_all(b"WAVE")?;
    out.write_all(b"fmt ")?;
    out.write_all(&16u32.to_le_bytes())?;
    out.write_all(&1u16.to_le_bytes())?; // PCM
    out.write_all(&1u16.to_le_bytes())?; // mono
    out.write_all(&SAMPLE_RATE.to_le_bytes())?;
    out.write_all(&byte_rate.to_le_bytes())?;
    out.write_all(&2u16.to_le_bytes())?; // block align
    out.write_all(&16u16.to_le_bytes())?; // bits per sample
    out.write_all(b"data")?;
    out.write_all(&data_len.to_le_bytes())?;

    for sample in samples {
        let clamped = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        out.write_all(&clamped.to_le_bytes())?;
    }

    std::fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_preserves_order() {
        let samples = concat_chunks(vec![vec![0.1, 0.2], vec![0.3], vec![0.4, 0.5]]);
        assert_eq!(samples, vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        assert!(concat_chunks(vec![]).is_empty());
    }

    #[test]
    fn duration_from_sample_count() {
        let one_second = vec![0.0f32; SAMPLE_RATE as usize];
        assert_eq!(duration_seconds(&one_second), 1.0);
        assert_eq!(duration_seconds(&[]), 0.0);
    }

    #[test]
    fn wav_has_header_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tts.wav");
        let samples = vec![0.0f32; 100];

        write_wav(&samples, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 44 + 200);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
    }
}
