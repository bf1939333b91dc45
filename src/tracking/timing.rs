//! Symbol timing recovery: a 4-tap cubic Farrow interpolator driven by a
//! Gardner timing-error detector and a second-order PI loop.

use num_complex::Complex64;

#[derive(Debug, Clone, Copy)]
struct FarrowInterpolator {
    buffer: [Complex64; 4],
    write_idx: usize,
}

impl FarrowInterpolator {
    fn new() -> Self {
        Self { buffer: [Complex64::new(0.0, 0.0); 4], write_idx: 0 }
    }

    fn push(&mut self, sample: Complex64) {
        self.buffer[self.write_idx] = sample;
        self.write_idx = (self.write_idx + 1) & 3;
    }

    /// Interpolate at fractional delay `mu` in `[0, 1)` between the two
    /// middle samples of the 4-sample window.
    fn interpolate(&self, mu: f64) -> Complex64 {
        let idx = self.write_idx;
        let x0 = self.buffer[idx];
        let x1 = self.buffer[(idx + 1) & 3];
        let x2 = self.buffer[(idx + 2) & 3];
        let x3 = self.buffer[(idx + 3) & 3];

        let mu2 = mu * mu;
        let mu3 = mu2 * mu;
        let c0 = -1.0 / 6.0 * mu3 + 0.5 * mu2 - 1.0 / 3.0 * mu;
        let c1 = 0.5 * mu3 - mu2 - 0.5 * mu + 1.0;
        let c2 = -0.5 * mu3 + 0.5 * mu2 + mu;
        let c3 = 1.0 / 6.0 * mu3 - 1.0 / 6.0 * mu;

        x0 * c0 + x1 * c1 + x2 * c2 + x3 * c3
    }
}

#[derive(Debug, Clone, Copy)]
struct GardnerTed {
    prev_symbol: Complex64,
    has_prev: bool,
}

impl GardnerTed {
    fn new() -> Self {
        Self { prev_symbol: Complex64::new(0.0, 0.0), has_prev: false }
    }

    /// `e[n] = Re{ (x[n] - x[n-1]) * conj(x[n-0.5]) }`
    fn compute(&mut self, symbol: Complex64, midpoint: Complex64) -> f64 {
        if !self.has_prev {
            self.prev_symbol = symbol;
            self.has_prev = true;
            return 0.0;
        }
        let diff = symbol - self.prev_symbol;
        let error = (diff * midpoint.conj()).re;
        self.prev_symbol = symbol;
        error
    }
}

/// Mueller-Muller TED: decision-directed, needs only one sample per symbol.
#[derive(Debug, Clone, Copy)]
struct MuellerMullerTed {
    prev_symbol: Complex64,
    prev_decision: Complex64,
    has_prev: bool,
}

impl MuellerMullerTed {
    fn new() -> Self {
        Self {
            prev_symbol: Complex64::new(0.0, 0.0),
            prev_decision: Complex64::new(0.0, 0.0),
            has_prev: false,
        }
    }

    fn hard_decision(symbol: Complex64) -> Complex64 {
        if symbol.norm() < 1e-9 {
            return Complex64::new(1.0, 0.0);
        }
        let step = std::f64::consts::PI / 4.0;
        let sector = (symbol.arg() / step).round() as i64 & 0x7;
        Complex64::from_polar(1.0, sector as f64 * step)
    }

    fn compute(&mut self, symbol: Complex64) -> f64 {
        let decision = Self::hard_decision(symbol);
        if !self.has_prev {
            self.prev_symbol = symbol;
            self.prev_decision = decision;
            self.has_prev = true;
            return 0.0;
        }
        let error = (self.prev_decision.conj() * symbol - decision.conj() * self.prev_symbol).re;
        self.prev_symbol = symbol;
        self.prev_decision = decision;
        error
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TedKind {
    Gardner,
    MuellerMuller,
}

enum Ted {
    Gardner(GardnerTed),
    MuellerMuller(MuellerMullerTed),
}

struct TimingLoopFilter {
    kp: f64,
    ki: f64,
    integrator: f64,
}

impl TimingLoopFilter {
    fn new(bandwidth: f64, damping: f64) -> Self {
        let denom = 1.0 + 2.0 * damping * bandwidth + bandwidth * bandwidth;
        Self {
            kp: 4.0 * damping * bandwidth / denom,
            ki: 4.0 * bandwidth * bandwidth / denom,
            integrator: 0.0,
        }
    }

    fn filter(&mut self, error: f64) -> f64 {
        let prop = self.kp * error;
        self.integrator = (self.integrator + self.ki * error).clamp(-0.5, 0.5);
        prop + self.integrator
    }
}

/// Full timing-recovery chain: Farrow interpolation, TED, loop filter.
/// Input is oversampled baseband; output strobes one symbol per
/// `samples_per_symbol` input samples, nudged by the recovered timing error.
pub struct TimingRecovery {
    samples_per_symbol: f64,
    interpolator: FarrowInterpolator,
    ted: Ted,
    loop_filter: TimingLoopFilter,
    mu: f64,
    history: [Complex64; 32],
    history_idx: usize,
    last_symbol: Complex64,
}

impl TimingRecovery {
    pub fn new(samples_per_symbol: f64, bandwidth: f64, damping: f64, kind: TedKind) -> Self {
        Self {
            samples_per_symbol,
            interpolator: FarrowInterpolator::new(),
            ted: match kind {
                TedKind::Gardner => Ted::Gardner(GardnerTed::new()),
                TedKind::MuellerMuller => Ted::MuellerMuller(MuellerMullerTed::new()),
            },
            loop_filter: TimingLoopFilter::new(bandwidth, damping),
            mu: 0.0,
            history: [Complex64::new(0.0, 0.0); 32],
            history_idx: 0,
            last_symbol: Complex64::new(0.0, 0.0),
        }
    }

    pub fn set_bandwidth(&mut self, bandwidth: f64, damping: f64) {
        let integrator = self.loop_filter.integrator;
        self.loop_filter = TimingLoopFilter::new(bandwidth, damping);
        self.loop_filter.integrator = integrator;
    }

    /// Push one oversampled input sample; returns `Some(symbol)` on a
    /// timing strobe.
    pub fn process(&mut self, sample: Complex64) -> Option<Complex64> {
        self.interpolator.push(sample);
        self.history[self.history_idx] = sample;
        self.history_idx = (self.history_idx + 1) % self.history.len();

        self.mu += 1.0 / self.samples_per_symbol;
        if self.mu < 1.0 {
            return None;
        }
        self.mu -= 1.0;

        let symbol = self.interpolator.interpolate(self.mu);
        self.last_symbol = symbol;

        let error = match &mut self.ted {
            Ted::Gardner(ted) => {
                let midpoint_age = (self.samples_per_symbol / 2.0 + 0.5) as usize;
                let mid_idx = (self.history_idx + self.history.len() - midpoint_age) % self.history.len();
                ted.compute(symbol, self.history[mid_idx])
            }
            Ted::MuellerMuller(ted) => ted.compute(symbol),
        };

        let adjustment = self.loop_filter.filter(error);
        self.mu += adjustment;
        while self.mu < 0.0 {
            self.mu += 1.0;
        }
        while self.mu >= 1.0 {
            self.mu -= 1.0;
        }

        Some(symbol)
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn frequency_offset_estimate(&self, symbol_rate_hz: f64) -> f64 {
        self.loop_filter.integrator * symbol_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn oversample_constant_symbols(sps: usize, n: usize) -> Vec<Complex64> {
        let mut out = Vec::with_capacity(sps * n);
        for i in 0..n {
            let sym = Complex64::from_polar(1.0, (i % 8) as f64 * PI / 4.0);
            for _ in 0..sps {
                out.push(sym);
            }
        }
        out
    }

    #[test]
    fn recovers_one_symbol_per_sps_samples_on_clean_input() {
        let sps = 8;
        let mut tr = TimingRecovery::new(sps as f64, 0.01, 1.0 / 2f64.sqrt(), TedKind::Gardner);
        let samples = oversample_constant_symbols(sps, 100);
        let mut count = 0;
        for s in samples {
            if tr.process(s).is_some() {
                count += 1;
            }
        }
        assert!((count as i64 - 100).abs() <= 2);
    }

    #[test]
    fn mueller_muller_also_tracks_clean_input() {
        let sps = 8;
        let mut tr = TimingRecovery::new(sps as f64, 0.01, 1.0 / 2f64.sqrt(), TedKind::MuellerMuller);
        let samples = oversample_constant_symbols(sps, 100);
        let mut count = 0;
        for s in samples {
            if tr.process(s).is_some() {
                count += 1;
            }
        }
        assert!((count as i64 - 100).abs() <= 2);
    }

    #[test]
    fn mu_stays_in_unit_interval() {
        let sps = 10;
        let mut tr = TimingRecovery::new(sps as f64, 0.02, 1.0 / 2f64.sqrt(), TedKind::Gardner);
        for s in oversample_constant_symbols(sps, 500) {
            tr.process(s);
            assert!(tr.mu() >= 0.0 && tr.mu() < 1.0);
        }
    }
}
