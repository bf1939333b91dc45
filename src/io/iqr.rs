//! `.iqr` file format: a fixed 64-byte header followed by interleaved
//! little-endian int16 I/Q samples normalized by 32768.

use crate::errors::IoError;
use crate::utils::{complex_from_interleaved_i16, interleaved_i16_from_complex};
use num_complex::Complex64;

const MAGIC: [u8; 4] = *b"IQR1";
const HEADER_LEN: usize = 64;
const RESERVED_LEN: usize = 8;

/// The fixed 64-byte `.iqr` header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrHeader {
    pub version: u32,
    pub sample_rate_hz: f64,
    pub center_freq_hz: f64,
    pub bandwidth_khz: u32,
    pub gain_reduction_db: i32,
    pub lna_state: u32,
    pub start_time_unix_us: i64,
    pub sample_count: u64,
    pub flags: u32,
}

impl IqrHeader {
    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        let mut pos = 0;
        macro_rules! put {
            ($bytes:expr) => {{
                let b = $bytes;
                buf[pos..pos + b.len()].copy_from_slice(&b);
                pos += b.len();
            }};
        }
        put!(MAGIC);
        put!(self.version.to_le_bytes());
        put!(self.sample_rate_hz.to_le_bytes());
        put!(self.center_freq_hz.to_le_bytes());
        put!(self.bandwidth_khz.to_le_bytes());
        put!(self.gain_reduction_db.to_le_bytes());
        put!(self.lna_state.to_le_bytes());
        put!(self.start_time_unix_us.to_le_bytes());
        put!(self.sample_count.to_le_bytes());
        put!(self.flags.to_le_bytes());
        // `pos` now sits at 56; the remaining 8 bytes are reserved zeros.
        debug_assert_eq!(pos, HEADER_LEN - RESERVED_LEN);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        if bytes.len() < HEADER_LEN {
            return Err(IoError::MalformedIqrHeader {
                reason: format!("header is {} bytes, need {}", bytes.len(), HEADER_LEN),
            });
        }
        if bytes[0..4] != MAGIC {
            return Err(IoError::MalformedIqrHeader {
                reason: "bad magic, expected \"IQR1\"".to_string(),
            });
        }
        let mut pos = 4;
        macro_rules! take {
            ($ty:ty) => {{
                const N: usize = std::mem::size_of::<$ty>();
                let value = <$ty>::from_le_bytes(bytes[pos..pos + N].try_into().unwrap());
                pos += N;
                value
            }};
        }
        let version: u32 = take!(u32);
        let sample_rate_hz: f64 = take!(f64);
        let center_freq_hz: f64 = take!(f64);
        let bandwidth_khz: u32 = take!(u32);
        let gain_reduction_db: i32 = take!(i32);
        let lna_state: u32 = take!(u32);
        let start_time_unix_us: i64 = take!(i64);
        let sample_count: u64 = take!(u64);
        let flags: u32 = take!(u32);

        if sample_rate_hz <= 0.0 || !sample_rate_hz.is_finite() {
            return Err(IoError::MalformedIqrHeader {
                reason: format!("sample rate {} Hz is not a positive finite value", sample_rate_hz),
            });
        }

        Ok(Self {
            version,
            sample_rate_hz,
            center_freq_hz,
            bandwidth_khz,
            gain_reduction_db,
            lna_state,
            start_time_unix_us,
            sample_count,
            flags,
        })
    }
}

/// Serialize a header and its I/Q payload into a complete `.iqr` byte
/// stream.
pub fn write_iqr(header: IqrHeader, samples: &[Complex64]) -> Vec<u8> {
    let mut out = header.to_bytes().to_vec();
    for &sample in interleaved_i16_from_complex(samples).iter() {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Parse a complete `.iqr` byte stream into its header and I/Q samples.
pub fn read_iqr(bytes: &[u8]) -> Result<(IqrHeader, Vec<Complex64>), IoError> {
    let header = IqrHeader::from_bytes(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() % 4 != 0 {
        return Err(IoError::MalformedIqrHeader {
            reason: format!("payload length {} is not a whole number of I/Q int16 pairs", payload.len()),
        });
    }
    let i16s: Vec<i16> = payload
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let samples = complex_from_interleaved_i16(&i16s);
    Ok((header, samples))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(sample_count: u64) -> IqrHeader {
        IqrHeader {
            version: 1,
            sample_rate_hz: 2_000_000.0,
            center_freq_hz: 14_070_000.0,
            bandwidth_khz: 200,
            gain_reduction_db: 20,
            lna_state: 1,
            start_time_unix_us: 1_700_000_000_000_000,
            sample_count,
            flags: 0,
        }
    }

    #[test]
    fn header_roundtrips_through_bytes() {
        let header = sample_header(480_000);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_LEN);
        let parsed = IqrHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = sample_header(1).to_bytes();
        bytes[0] = b'X';
        assert!(IqrHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(IqrHeader::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn iqr_file_roundtrips_a_tone() {
        let sample_rate = 2_000_000.0;
        let tone_hz = 1000.0;
        let n = 4800;
        let samples: Vec<Complex64> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * tone_hz * i as f64 / sample_rate;
                Complex64::from_polar(0.5, phase)
            })
            .collect();
        let header = sample_header(n as u64);
        let bytes = write_iqr(header, &samples);

        let (parsed_header, parsed_samples) = read_iqr(&bytes).unwrap();
        assert_eq!(parsed_header, header);
        assert_eq!(parsed_samples.len(), samples.len());
        for (a, b) in samples.iter().zip(parsed_samples.iter()) {
            assert!((a - b).norm() < 1e-3);
        }
    }
}
