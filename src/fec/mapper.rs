//! Absolute-phase PSK mapper. Tribit `i` maps to the 8-PSK constellation
//! point at angle `i * pi/4`; BPSK and QPSK data restrict the tribit to a
//! subset of those eight points. Probe symbols are always mapped/demapped
//! as full 8-PSK regardless of the data modulation in force.

use crate::errors::FecError;
use crate::modes::Modulation;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Map a tribit (0..8) to its absolute 8-PSK constellation point.
pub fn tribit_to_symbol(tribit: u8) -> Complex64 {
    Complex64::from_polar(1.0, tribit as f64 * PI / 4.0)
}

/// Nearest-point hard demap, restricted to the labels the modulation uses.
pub fn symbol_to_tribit(received: Complex64, modulation: Modulation) -> u8 {
    *modulation
        .tribit_labels()
        .iter()
        .min_by(|&&a, &&b| {
            let da = (received - tribit_to_symbol(a)).norm();
            let db = (received - tribit_to_symbol(b)).norm();
            da.partial_cmp(&db).unwrap()
        })
        .expect("tribit_labels is never empty")
}

/// Pack a group of data bits (MSB-first, `modulation.bits_per_symbol()`
/// wide) into a tribit. Unused low-order tribit bits are zero.
pub fn bits_to_tribit(bits: &[u8], modulation: Modulation) -> Result<u8, FecError> {
    let n = modulation.bits_per_symbol();
    if bits.len() != n {
        return Err(FecError::InvalidTribit { value: bits.len() as u8 });
    }
    let mut tribit = 0u8;
    for (k, &b) in bits.iter().enumerate() {
        tribit |= (b & 1) << (2 - k);
    }
    Ok(tribit)
}

/// Inverse of [`bits_to_tribit`]: the `bits_per_symbol` meaningful bits,
/// MSB-first.
pub fn tribit_to_bits(tribit: u8, modulation: Modulation) -> Vec<u8> {
    let n = modulation.bits_per_symbol();
    (0..n).map(|k| (tribit >> (2 - k)) & 1).collect()
}

/// Soft-demap a received (equalized, descrambled) symbol into
/// `bits_per_symbol` signed LLRs, sign convention positive = bit 1 more
/// likely. Computed from the distance margin between the nearest
/// bit-0-consistent and bit-1-consistent constellation points, which
/// degrades gracefully to a hard decision as noise goes to zero.
pub fn soft_demap(received: Complex64, modulation: Modulation, scale: f64) -> Vec<i8> {
    let n = modulation.bits_per_symbol();
    let labels = modulation.tribit_labels();
    (0..n)
        .map(|k| {
            let bit_pos = 2 - k;
            let (mut d0, mut d1) = (f64::INFINITY, f64::INFINITY);
            for &label in labels {
                let dist = (received - tribit_to_symbol(label)).norm();
                if (label >> bit_pos) & 1 == 1 {
                    d1 = d1.min(dist);
                } else {
                    d0 = d0.min(dist);
                }
            }
            let llr = (d0 - d1) * scale;
            llr.clamp(-127.0, 127.0).round() as i8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tribit_angles_match_45_degree_steps() {
        for i in 0..8u8 {
            let s = tribit_to_symbol(i);
            assert!((s.norm() - 1.0).abs() < 1e-12);
            let expected = i as f64 * PI / 4.0;
            let expected = if expected > PI { expected - 2.0 * PI } else { expected };
            assert!((s.arg() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn hard_demap_roundtrips_noiselessly_for_every_modulation() {
        for &modulation in &[Modulation::Bpsk, Modulation::Qpsk, Modulation::Psk8] {
            for &label in modulation.tribit_labels() {
                let sym = tribit_to_symbol(label);
                assert_eq!(symbol_to_tribit(sym, modulation), label);
            }
        }
    }

    #[test]
    fn bits_tribit_roundtrip() {
        for &modulation in &[Modulation::Bpsk, Modulation::Qpsk, Modulation::Psk8] {
            for &label in modulation.tribit_labels() {
                let bits = tribit_to_bits(label, modulation);
                assert_eq!(bits_to_tribit(&bits, modulation).unwrap(), label);
            }
        }
    }

    #[test]
    fn soft_demap_sign_matches_hard_decision_noiselessly() {
        for &modulation in &[Modulation::Bpsk, Modulation::Qpsk, Modulation::Psk8] {
            for &label in modulation.tribit_labels() {
                let sym = tribit_to_symbol(label);
                let soft = soft_demap(sym, modulation, 40.0);
                let bits = tribit_to_bits(label, modulation);
                for (s, b) in soft.iter().zip(bits.iter()) {
                    if *b == 1 {
                        assert!(*s > 0, "expected positive LLR for bit=1");
                    } else {
                        assert!(*s < 0, "expected negative LLR for bit=0");
                    }
                }
            }
        }
    }
}
