//! Numerically controlled oscillator: carrier generator for up/down
//! conversion. Phase is kept wrapped to `(-pi, pi]` every sample.

use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy)]
pub struct Nco {
    phase: f64,
    phase_increment: f64,
    sample_rate_hz: f64,
}

impl Nco {
    pub fn new(freq_hz: f64, sample_rate_hz: f64) -> Self {
        let mut nco = Self {
            phase: 0.0,
            phase_increment: 0.0,
            sample_rate_hz,
        };
        nco.set_frequency(freq_hz);
        nco
    }

    pub fn set_frequency(&mut self, freq_hz: f64) {
        self.phase_increment = 2.0 * PI * freq_hz / self.sample_rate_hz;
    }

    pub fn frequency_hz(&self) -> f64 {
        self.phase_increment * self.sample_rate_hz / (2.0 * PI)
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    fn wrap(phase: f64) -> f64 {
        let mut p = phase % (2.0 * PI);
        if p > PI {
            p -= 2.0 * PI;
        } else if p <= -PI {
            p += 2.0 * PI;
        }
        p
    }

    /// Advance one sample and return `(cos, sin)` of the new phase.
    pub fn step(&mut self) -> (f64, f64) {
        self.phase = Self::wrap(self.phase + self.phase_increment);
        (self.phase.cos(), self.phase.sin())
    }

    /// Multiply `sample` by `e^{+j*phase}` (upconvert), advancing one step.
    pub fn mix(&mut self, sample: Complex64) -> Complex64 {
        let (c, s) = self.step();
        sample * Complex64::new(c, s)
    }

    /// Multiply `sample` by `e^{-j*phase}` (downconvert), advancing one step.
    pub fn mix_down(&mut self, sample: Complex64) -> Complex64 {
        let (c, s) = self.step();
        sample * Complex64::new(c, -s)
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_stays_bounded() {
        let mut nco = Nco::new(1800.0, 48_000.0);
        for _ in 0..100_000 {
            let (_, _) = nco.step();
            assert!(nco.phase() > -PI && nco.phase() <= PI);
        }
    }

    #[test]
    fn mix_then_mix_down_is_identity() {
        let mut up = Nco::new(400.0, 48_000.0);
        let mut down = Nco::new(400.0, 48_000.0);
        let input = Complex64::new(0.5, -0.25);
        for _ in 0..1000 {
            let upconverted = up.mix(input);
            let recovered = down.mix_down(upconverted);
            assert!((recovered - input).norm() < 1e-9);
        }
    }

    #[test]
    fn frequency_readback_matches_set_value() {
        let nco = Nco::new(1800.0, 48_000.0);
        assert!((nco.frequency_hz() - 1800.0).abs() < 1e-9);
    }
}
