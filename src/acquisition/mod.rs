//! Acquisition (component D): locate the preamble in a stream of baseband
//! samples and estimate residual carrier frequency offset before handing
//! off to tracking, using hierarchical delay-multiply autocorrelation
//! (coarse/medium/fine) plus a timing correlator.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Segment length (in symbols) the timing correlator searches against: the
/// common-segment period is 32 symbols (one Walsh-pattern repetition).
const SEGMENT_SYMBOLS: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct AcquisitionResult {
    pub sample_offset: usize,
    pub freq_offset_hz: f64,
    pub timing_confidence: f64,
}

/// Estimate frequency offset from the phase of a delay-multiply
/// autocorrelation: `R = sum(x[n+delay] * conj(x[n]))`, `freq = arg(R) / (2*pi*delay_time)`.
/// Delay must be short enough that the true offset doesn't alias past +/-
/// half the delay's unambiguous range.
fn delay_multiply_freq_estimate(samples: &[Complex64], start: usize, delay: usize, window: usize, sample_rate_hz: f64) -> Option<f64> {
    if start + delay + window > samples.len() {
        return None;
    }
    let mut r = Complex64::new(0.0, 0.0);
    for i in 0..window {
        r += samples[start + i + delay] * samples[start + i].conj();
    }
    let phase = r.im.atan2(r.re);
    let delay_time = delay as f64 / sample_rate_hz;
    Some(phase / (2.0 * PI * delay_time))
}

pub struct Acquisition {
    samples_per_symbol: usize,
    sample_rate_hz: f64,
}

impl Acquisition {
    pub fn new(samples_per_symbol: usize, sample_rate_hz: f64) -> Self {
        Self { samples_per_symbol, sample_rate_hz }
    }

    /// Stage 1: coarse timing via 3-segment-delay autocorrelation, searched
    /// over the start of the stream at half-sample-per-symbol resolution.
    fn find_timing(&self, baseband: &[Complex64], search_limit_samples: usize) -> (usize, f64) {
        let segment_samples = SEGMENT_SYMBOLS * self.samples_per_symbol;
        let delay = 3 * segment_samples;
        let window = 3 * segment_samples;
        let step = (self.samples_per_symbol / 2).max(1);

        let search_range = (baseband.len().saturating_sub(delay + window)).min(search_limit_samples);
        let mut best_start = 0;
        let mut best_corr = 0.0f64;

        let mut start = 0;
        while start < search_range {
            let mut corr = Complex64::new(0.0, 0.0);
            let mut power1 = 0.0;
            let mut power2 = 0.0;
            for i in 0..window {
                let a = baseband[start + i];
                let b = baseband[start + i + delay];
                corr += a * b.conj();
                power1 += a.norm_sqr();
                power2 += b.norm_sqr();
            }
            let norm_corr = corr.norm() / (power1 * power2 + 1e-10).sqrt();
            if norm_corr > best_corr {
                best_corr = norm_corr;
                best_start = start;
            }
            start += step;
        }
        (best_start, best_corr)
    }

    /// Stages 2-3: hierarchical frequency estimation. A 1-symbol delay
    /// gives a wide unambiguous range but coarse precision; a longer delay
    /// (here `8*SEGMENT_SYMBOLS` symbols) gives fine precision but wraps
    /// faster, so the coarse estimate disambiguates which wrap the fine
    /// estimate landed in.
    fn estimate_frequency(&self, baseband: &[Complex64], start: usize) -> Option<f64> {
        let sps = self.samples_per_symbol;
        let window = 3 * SEGMENT_SYMBOLS * sps;

        let coarse = delay_multiply_freq_estimate(baseband, start, sps, window, self.sample_rate_hz)?;
        let fine_delay = 8 * SEGMENT_SYMBOLS * sps;
        let fine = delay_multiply_freq_estimate(baseband, start, fine_delay, window, self.sample_rate_hz)?;

        let fine_range = self.sample_rate_hz / (2.0 * fine_delay as f64);
        let diff = coarse - fine;
        let n = (diff / (2.0 * fine_range)).round();
        Some(fine + n * 2.0 * fine_range)
    }

    /// Run the full acquisition chain: find the preamble start, estimate
    /// residual carrier offset. Returns `None` if timing confidence is too
    /// low or insufficient samples are available.
    pub fn acquire(&self, baseband: &[Complex64], timing_threshold: f64, search_limit_samples: usize) -> Option<AcquisitionResult> {
        let (start, confidence) = self.find_timing(baseband, search_limit_samples);
        if confidence < timing_threshold {
            return None;
        }
        let freq_offset_hz = self.estimate_frequency(baseband, start)?;
        Some(AcquisitionResult { sample_offset: start, freq_offset_hz, timing_confidence: confidence })
    }
}
