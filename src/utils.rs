//! Bit-packing helpers shared by the FEC chain, preamble codec, and I/O
//! readers.

use num_complex::Complex64;

/// Unpack bytes into MSB-first bits.
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for i in (0..8).rev() {
            bits.push((byte >> i) & 1);
        }
    }
    bits
}

/// Pack MSB-first bits into bytes, padding the final byte with zeros.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((bits.len() + 7) / 8);
    for chunk in bits.chunks(8) {
        let mut byte = 0u8;
        for (i, &bit) in chunk.iter().enumerate() {
            byte |= (bit & 1) << (7 - i);
        }
        bytes.push(byte);
    }
    bytes
}

/// Split interleaved little-endian int16 I/Q samples into normalized
/// `Complex64` values (divide by 32768, per the `.iqr` format).
pub fn complex_from_interleaved_i16(data: &[i16]) -> Vec<Complex64> {
    data.chunks_exact(2)
        .map(|pair| Complex64::new(pair[0] as f64 / 32768.0, pair[1] as f64 / 32768.0))
        .collect()
}

/// Inverse of [`complex_from_interleaved_i16`], clamping to the int16 range.
pub fn interleaved_i16_from_complex(data: &[Complex64]) -> Vec<i16> {
    let mut out = Vec::with_capacity(data.len() * 2);
    for c in data {
        out.push((c.re * 32768.0).clamp(i16::MIN as f64, i16::MAX as f64) as i16);
        out.push((c.im * 32768.0).clamp(i16::MIN as f64, i16::MAX as f64) as i16);
    }
    out
}

/// Majority vote across repeated bit observations, as used both to combine
/// repetition-coded bits and to score preamble D1/D2 confidence.
pub fn majority_vote(votes: &[bool]) -> (bool, usize) {
    let yes = votes.iter().filter(|&&v| v).count();
    (yes * 2 >= votes.len(), yes.max(votes.len() - yes))
}
