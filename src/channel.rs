//! HF channel simulator used only by this crate's own test suite. Per the
//! purpose-and-scope boundary, channel simulators are external collaborators
//! to a deployed modem; this module exists purely so the test scenarios in
//! §8 (AWGN, frequency offset, two-ray multipath) can be exercised without a
//! hardware-in-the-loop test rig.

use num_complex::Complex64;
use rand::Rng;
use rand_distr::StandardNormal;

/// Add AWGN to a real passband sample stream at the given noise standard
/// deviation.
pub fn apply_awgn<R: Rng>(samples: &[f64], noise_std: f64, rng: &mut R) -> Vec<f64> {
    samples
        .iter()
        .map(|&s| s + rng.sample::<f64, _>(StandardNormal) * noise_std)
        .collect()
}

/// Rotate a baseband complex stream by a constant frequency offset, as if
/// transmitted with a carrier error of `freq_hz` at `sample_rate_hz`.
pub fn apply_frequency_offset(samples: &[Complex64], freq_hz: f64, sample_rate_hz: f64) -> Vec<Complex64> {
    let dphi = 2.0 * std::f64::consts::PI * freq_hz / sample_rate_hz;
    samples
        .iter()
        .enumerate()
        .map(|(n, &s)| s * Complex64::from_polar(1.0, dphi * n as f64))
        .collect()
}

/// A static two-ray multipath channel: a direct path plus one delayed,
/// attenuated, phase-rotated echo. Models §8 scenario 5.
#[derive(Debug, Clone)]
pub struct TwoRayMultipath {
    pub echo_amplitude: f64,
    pub echo_delay_samples: usize,
    pub echo_phase_rad: f64,
}

impl TwoRayMultipath {
    pub fn new(echo_amplitude: f64, echo_delay_samples: usize, echo_phase_rad: f64) -> Self {
        Self {
            echo_amplitude,
            echo_delay_samples,
            echo_phase_rad,
        }
    }

    pub fn apply(&self, samples: &[Complex64]) -> Vec<Complex64> {
        let echo = Complex64::from_polar(self.echo_amplitude, self.echo_phase_rad);
        let mut out = samples.to_vec();
        for n in self.echo_delay_samples..out.len() {
            out[n] += samples[n - self.echo_delay_samples] * echo;
        }
        out
    }
}

/// Apply attenuation and complex AWGN, as used for the Es/N0-specified
/// scenarios.
pub fn apply_awgn_complex<R: Rng>(
    symbols: &[Complex64],
    attenuation: f64,
    noise_std: f64,
    rng: &mut R,
) -> Vec<Complex64> {
    symbols
        .iter()
        .map(|symbol| {
            let attenuated = symbol * attenuation;
            let noise = Complex64::new(
                rng.sample::<f64, _>(StandardNormal) * noise_std,
                rng.sample::<f64, _>(StandardNormal) * noise_std,
            );
            attenuated + noise
        })
        .collect()
}

/// Convert a target Es/N0 in dB to the per-sample AWGN standard deviation
/// for unit-energy symbols.
pub fn noise_std_from_es_n0_db(es_n0_db: f64) -> f64 {
    let es_n0_linear = 10f64.powf(es_n0_db / 10.0);
    (1.0 / (2.0 * es_n0_linear)).sqrt()
}
