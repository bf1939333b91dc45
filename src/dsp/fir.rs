//! Real- and complex-input FIR filters with a circular sample-history
//! buffer, the shape used by every downstream stage that needs a running
//! filter rather than a one-shot convolution (decimators, interpolators,
//! the channel-estimate residual filter).

use num_complex::Complex64;

#[derive(Debug, Clone)]
pub struct FirFilterReal {
    coeffs: Vec<f64>,
    history: Vec<f64>,
    pos: usize,
}

impl FirFilterReal {
    pub fn new(coeffs: Vec<f64>) -> Self {
        let n = coeffs.len();
        Self {
            coeffs,
            history: vec![0.0; n],
            pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Push one sample, returning the filtered output.
    pub fn process(&mut self, sample: f64) -> f64 {
        let n = self.coeffs.len();
        self.history[self.pos] = sample;
        let mut acc = 0.0;
        for (k, &c) in self.coeffs.iter().enumerate() {
            let idx = (self.pos + n - k) % n;
            acc += c * self.history[idx];
        }
        self.pos = (self.pos + 1) % n;
        acc
    }

    pub fn process_block(&mut self, samples: &[f64]) -> Vec<f64> {
        samples.iter().map(|&s| self.process(s)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct FirFilterComplex {
    coeffs: Vec<f64>,
    history: Vec<Complex64>,
    pos: usize,
}

impl FirFilterComplex {
    pub fn new(coeffs: Vec<f64>) -> Self {
        let n = coeffs.len();
        Self {
            coeffs,
            history: vec![Complex64::new(0.0, 0.0); n],
            pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.coeffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn process(&mut self, sample: Complex64) -> Complex64 {
        let n = self.coeffs.len();
        self.history[self.pos] = sample;
        let mut acc = Complex64::new(0.0, 0.0);
        for (k, &c) in self.coeffs.iter().enumerate() {
            let idx = (self.pos + n - k) % n;
            acc += self.history[idx] * c;
        }
        self.pos = (self.pos + 1) % n;
        acc
    }

    pub fn process_block(&mut self, samples: &[Complex64]) -> Vec<Complex64> {
        samples.iter().map(|&s| self.process(s)).collect()
    }
}

/// Hamming-windowed sinc lowpass design, used by the decimator/interpolator
/// and as the anti-alias stage of the rational resampler.
pub fn hamming_sinc_lowpass(cutoff_normalized: f64, num_taps: usize) -> Vec<f64> {
    let num_taps = num_taps | 1; // force odd length for a symmetric center tap
    let m = (num_taps - 1) as f64;
    let mut taps = vec![0.0; num_taps];
    for (n, slot) in taps.iter_mut().enumerate() {
        let x = n as f64 - m / 2.0;
        let sinc = if x.abs() < 1e-12 {
            2.0 * cutoff_normalized
        } else {
            (2.0 * std::f64::consts::PI * cutoff_normalized * x).sin() / (std::f64::consts::PI * x)
        };
        let window = 0.54 - 0.46 * (2.0 * std::f64::consts::PI * n as f64 / m).cos();
        *slot = sinc * window;
    }
    let sum: f64 = taps.iter().sum();
    if sum.abs() > 1e-12 {
        for t in &mut taps {
            *t /= sum;
        }
    }
    taps
}
