//! Integer decimation/interpolation and a rational (P/Q) resampler built by
//! chaining them, each with a Hamming-windowed sinc anti-alias filter.

use super::fir::{hamming_sinc_lowpass, FirFilterReal};
use crate::errors::DspError;

fn anti_alias_taps(cutoff_fraction_of_nyquist: f64) -> Vec<f64> {
    hamming_sinc_lowpass(cutoff_fraction_of_nyquist / 2.0, 63)
}

/// Integer decimator: lowpass then keep every `factor`-th sample.
pub struct Decimator {
    factor: usize,
    filter: FirFilterReal,
}

impl Decimator {
    pub fn new(factor: usize) -> Result<Self, DspError> {
        if factor == 0 {
            return Err(DspError::InvalidResampleRatio { p: 1, q: factor });
        }
        let taps = anti_alias_taps(1.0 / factor as f64);
        Ok(Self {
            factor,
            filter: FirFilterReal::new(taps),
        })
    }

    pub fn process(&mut self, samples: &[f64]) -> Vec<f64> {
        let filtered = self.filter.process_block(samples);
        filtered.into_iter().step_by(self.factor).collect()
    }
}

/// Integer interpolator: zero-stuff then lowpass, with the filter gain
/// scaled by the interpolation factor to preserve amplitude.
pub struct Interpolator {
    factor: usize,
    filter: FirFilterReal,
}

impl Interpolator {
    pub fn new(factor: usize) -> Result<Self, DspError> {
        if factor == 0 {
            return Err(DspError::InvalidResampleRatio { p: factor, q: 1 });
        }
        let mut taps = anti_alias_taps(1.0 / factor as f64);
        for t in &mut taps {
            *t *= factor as f64;
        }
        Ok(Self {
            factor,
            filter: FirFilterReal::new(taps),
        })
    }

    pub fn process(&mut self, samples: &[f64]) -> Vec<f64> {
        let mut zero_stuffed = Vec::with_capacity(samples.len() * self.factor);
        for &s in samples {
            zero_stuffed.push(s);
            zero_stuffed.extend(std::iter::repeat(0.0).take(self.factor - 1));
        }
        self.filter.process_block(&zero_stuffed)
    }
}

/// Rational P/Q resampler: interpolate by P, lowpass, decimate by Q — the
/// polyphase-equivalent two-stage chain.
pub struct RationalResampler {
    interpolator: Interpolator,
    decimator: Decimator,
}

impl RationalResampler {
    pub fn new(p: usize, q: usize) -> Result<Self, DspError> {
        if p == 0 || q == 0 {
            return Err(DspError::InvalidResampleRatio { p, q });
        }
        Ok(Self {
            interpolator: Interpolator::new(p)?,
            decimator: Decimator::new(q)?,
        })
    }

    pub fn process(&mut self, samples: &[f64]) -> Vec<f64> {
        let up = self.interpolator.process(samples);
        self.decimator.process(&up)
    }
}

/// Fractional-delay linear interpolation trim, used as the final stage
/// after staged integer decimation to land on an exact target rate.
pub fn linear_interpolate(samples: &[f64], fractional_index: f64) -> f64 {
    let i0 = fractional_index.floor() as isize;
    let frac = fractional_index - i0 as f64;
    let at = |idx: isize| -> f64 {
        if idx < 0 || idx as usize >= samples.len() {
            0.0
        } else {
            samples[idx as usize]
        }
    };
    at(i0) * (1.0 - frac) + at(i0 + 1) * frac
}
