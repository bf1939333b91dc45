//! Minimal RIFF/WAVE reader and writer: 8- or 16-bit PCM, mono or
//! multi-channel (channels beyond the first are averaged down on read).
//! No compressed formats; that remains the external decoder's job per
//! spec.md's out-of-scope boundary.

use crate::errors::IoError;

const PCM_FORMAT: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate_hz: u32,
    pub bits_per_sample: u16,
}

fn find_chunk<'a>(data: &'a [u8], id: &[u8; 4]) -> Result<(&'a [u8], usize), IoError> {
    let mut pos = 12; // past "RIFF"<size>"WAVE"
    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let body_start = pos + 8;
        if body_start + chunk_size > data.len() {
            break;
        }
        if chunk_id == id {
            return Ok((&data[body_start..body_start + chunk_size], body_start));
        }
        pos = body_start + chunk_size + (chunk_size % 2); // chunks are word-aligned
    }
    Err(IoError::UnsupportedWav {
        reason: format!("missing required chunk {:?}", String::from_utf8_lossy(id)),
    })
}

/// Parse a WAV file, downmixing to mono `f64` samples in `[-1.0, 1.0]`.
pub fn read_wav(data: &[u8]) -> Result<(WavFormat, Vec<f64>), IoError> {
    if data.len() < 44 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(IoError::UnsupportedWav {
            reason: "not a RIFF/WAVE file".to_string(),
        });
    }
    let (fmt_chunk, _) = find_chunk(data, b"fmt ")?;
    if fmt_chunk.len() < 16 {
        return Err(IoError::UnsupportedWav {
            reason: "fmt chunk shorter than 16 bytes".to_string(),
        });
    }
    let audio_format = u16::from_le_bytes(fmt_chunk[0..2].try_into().unwrap());
    if audio_format != PCM_FORMAT {
        return Err(IoError::UnsupportedWav {
            reason: format!("audio format {} is not PCM", audio_format),
        });
    }
    let channels = u16::from_le_bytes(fmt_chunk[2..4].try_into().unwrap());
    let sample_rate_hz = u32::from_le_bytes(fmt_chunk[4..8].try_into().unwrap());
    let bits_per_sample = u16::from_le_bytes(fmt_chunk[14..16].try_into().unwrap());
    if bits_per_sample != 8 && bits_per_sample != 16 {
        return Err(IoError::UnsupportedWav {
            reason: format!("{}-bit PCM is not supported, only 8 or 16", bits_per_sample),
        });
    }
    if channels == 0 {
        return Err(IoError::UnsupportedWav {
            reason: "zero channels".to_string(),
        });
    }

    let (data_chunk, _) = find_chunk(data, b"data")?;
    let bytes_per_sample = (bits_per_sample / 8) as usize;
    let frame_bytes = bytes_per_sample * channels as usize;
    if frame_bytes == 0 {
        return Err(IoError::UnsupportedWav {
            reason: "zero-width frame".to_string(),
        });
    }

    let mut samples = Vec::with_capacity(data_chunk.len() / frame_bytes);
    for frame in data_chunk.chunks_exact(frame_bytes) {
        let mut sum = 0.0;
        for ch in 0..channels as usize {
            let s = &frame[ch * bytes_per_sample..(ch + 1) * bytes_per_sample];
            let normalized = if bits_per_sample == 8 {
                (s[0] as f64 - 128.0) / 128.0
            } else {
                i16::from_le_bytes([s[0], s[1]]) as f64 / 32768.0
            };
            sum += normalized;
        }
        samples.push(sum / channels as f64);
    }

    Ok((
        WavFormat {
            channels,
            sample_rate_hz,
            bits_per_sample,
        },
        samples,
    ))
}

/// Write mono `f64` samples (clamped to `[-1.0, 1.0]`) as 16-bit PCM WAV.
pub fn write_wav_mono_i16(samples: &[f64], sample_rate_hz: u32) -> Vec<u8> {
    let data_bytes = samples.len() * 2;
    let mut out = Vec::with_capacity(44 + data_bytes);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&((36 + data_bytes) as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate_hz.to_le_bytes());
    let byte_rate = sample_rate_hz * 2;
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // block align
    out.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    out.extend_from_slice(b"data");
    out.extend_from_slice(&(data_bytes as u32).to_le_bytes());
    for &s in samples {
        let clamped = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        out.extend_from_slice(&clamped.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_16bit_roundtrips() {
        let samples: Vec<f64> = (0..1000).map(|i| ((i as f64 * 0.05).sin()) * 0.8).collect();
        let wav = write_wav_mono_i16(&samples, 48_000);
        let (format, decoded) = read_wav(&wav).unwrap();
        assert_eq!(format.channels, 1);
        assert_eq!(format.sample_rate_hz, 48_000);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn rejects_non_riff_input() {
        assert!(read_wav(b"not a wav file at all").is_err());
    }

    #[test]
    fn stereo_downmixes_to_mono_average() {
        // Two channels, 16-bit: left = +1.0, right = -1.0 -> average 0.0.
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&40u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes()); // stereo
        wav.extend_from_slice(&48_000u32.to_le_bytes());
        wav.extend_from_slice(&(48_000u32 * 4).to_le_bytes());
        wav.extend_from_slice(&4u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&4u32.to_le_bytes());
        wav.extend_from_slice(&32767i16.to_le_bytes());
        wav.extend_from_slice(&(-32768i16).to_le_bytes());

        let (format, decoded) = read_wav(&wav).unwrap();
        assert_eq!(format.channels, 2);
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].abs() < 1e-3);
    }
}
