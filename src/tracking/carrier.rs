//! Carrier phase/frequency tracking: a decision-directed second-order PLL
//! for acquisition-time tracking, and an Extended Kalman Filter tracker
//! (state `[phase, frequency]`) for probe-aided tracking during data.

use crate::fec::mapper::symbol_to_tribit;
use crate::modes::Modulation;
use num_complex::Complex64;
use std::f64::consts::PI;

fn wrap_phase(phase: f64) -> f64 {
    let mut p = phase;
    while p > PI {
        p -= 2.0 * PI;
    }
    while p < -PI {
        p += 2.0 * PI;
    }
    p
}

struct CarrierLoopFilter {
    kp: f64,
    ki: f64,
    integrator: f64,
}

impl CarrierLoopFilter {
    fn new(bandwidth: f64, damping: f64) -> Self {
        let wn = 2.0 * bandwidth / (damping + 1.0 / (4.0 * damping));
        Self { kp: 2.0 * damping * wn, ki: wn * wn, integrator: 0.0 }
    }

    fn filter(&mut self, error: f64) -> f64 {
        let prop = self.kp * error;
        self.integrator = (self.integrator + self.ki * error).clamp(-0.1, 0.1);
        prop + self.integrator
    }
}

/// Decision-directed PLL, used during acquisition/settling before probe
/// blocks are available to drive the EKF tracker.
pub struct CarrierPll {
    phase: f64,
    loop_filter: CarrierLoopFilter,
    symbol_count: u64,
}

impl CarrierPll {
    pub fn new(bandwidth: f64, damping: f64) -> Self {
        Self { phase: 0.0, loop_filter: CarrierLoopFilter::new(bandwidth, damping), symbol_count: 0 }
    }

    /// Derotate `symbol` by the current phase estimate, update the loop from
    /// the nearest constellation point, and return the corrected symbol.
    pub fn process(&mut self, symbol: Complex64, modulation: Modulation) -> Complex64 {
        let corrected = symbol * Complex64::from_polar(1.0, -self.phase);
        if corrected.norm() >= 0.1 {
            let tribit = symbol_to_tribit(corrected, modulation);
            let expected = Complex64::from_polar(1.0, tribit as f64 * PI / 4.0);
            let error_phasor = corrected * expected.conj();
            let error = error_phasor.im.atan2(error_phasor.re);
            let adjustment = self.loop_filter.filter(error);
            self.phase = wrap_phase(self.phase + adjustment);
        }
        self.symbol_count += 1;
        corrected
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn set_phase(&mut self, phase: f64) {
        self.phase = wrap_phase(phase);
    }

    pub fn frequency_estimate_hz(&self, symbol_rate_hz: f64) -> f64 {
        self.loop_filter.integrator * symbol_rate_hz / (2.0 * PI)
    }

    pub fn is_locked(&self) -> bool {
        self.loop_filter.integrator.abs() < 0.05 && self.symbol_count > 100
    }
}

/// Extended Kalman Filter carrier tracker: state `[phase, frequency]`,
/// random-walk frequency model, updated from probe symbols (full weight)
/// and optionally from decision-directed hard decisions (reduced weight).
pub struct EkfCarrierTracker {
    symbol_rate_hz: f64,
    q_phase: f64,
    q_freq: f64,
    r_phase: f64,
    max_freq_rad: f64,
    dd_confidence_threshold: f64,
    dd_weight: f64,
    phase: f64,
    freq: f64,
    p: [[f64; 2]; 2],
}

impl EkfCarrierTracker {
    pub fn new(symbol_rate_hz: f64, max_freq_hz: f64) -> Self {
        Self {
            symbol_rate_hz,
            q_phase: 0.001,
            q_freq: 0.0001,
            r_phase: 0.1,
            max_freq_rad: 2.0 * PI * max_freq_hz / symbol_rate_hz,
            dd_confidence_threshold: 0.7,
            dd_weight: 0.3,
            phase: 0.0,
            freq: 0.0,
            p: [[1.0, 0.0], [0.0, 0.01]],
        }
    }

    pub fn initialize(&mut self, freq_hz: f64, uncertainty_hz: f64) {
        self.phase = 0.0;
        self.freq = 2.0 * PI * freq_hz / self.symbol_rate_hz;
        let uncertainty_rad = 2.0 * PI * uncertainty_hz / self.symbol_rate_hz;
        self.p = [[1.0, 0.0], [0.0, uncertainty_rad * uncertainty_rad]];
    }

    pub fn set_snr_db(&mut self, snr_db: f64) {
        let snr_linear = 10f64.powf(snr_db / 10.0);
        self.r_phase = (1.0 / (2.0 * snr_linear)).clamp(0.001, 1.0);
    }

    fn predict(&mut self) {
        self.phase = wrap_phase(self.phase + self.freq);
        let p00 = self.p[0][0] + self.p[0][1] + self.p[1][0] + self.p[1][1] + self.q_phase;
        let p01 = self.p[0][1] + self.p[1][1];
        let p10 = self.p[1][0] + self.p[1][1];
        let p11 = self.p[1][1] + self.q_freq;
        self.p = [[p00, p01], [p10, p11]];
    }

    fn kalman_update(&mut self, phase_error: f64, r: f64) {
        let s = self.p[0][0] + r;
        let k0 = self.p[0][0] / s;
        let k1 = self.p[1][0] / s;

        self.phase = wrap_phase(self.phase + k0 * phase_error);
        self.freq = (self.freq + k1 * phase_error).clamp(-self.max_freq_rad, self.max_freq_rad);

        let p00 = (1.0 - k0) * self.p[0][0];
        let p01 = (1.0 - k0) * self.p[0][1];
        let p10 = -k1 * self.p[0][0] + self.p[1][0];
        let p11 = -k1 * self.p[0][1] + self.p[1][1];
        self.p = [[p00, p01], [p10, p11]];
    }

    /// Advance the state by one symbol and derotate `received` by the
    /// predicted phase. Call `update_probe`/`update_decision_directed`
    /// afterward to correct the estimate.
    pub fn process(&mut self, received: Complex64) -> Complex64 {
        self.predict();
        received * Complex64::from_polar(1.0, -self.phase)
    }

    pub fn update_probe(&mut self, corrected: Complex64, expected: Complex64) {
        let error_phasor = corrected * expected.conj();
        let phase_error = error_phasor.im.atan2(error_phasor.re);
        self.kalman_update(phase_error, self.r_phase);
    }

    pub fn update_decision_directed(&mut self, corrected: Complex64, modulation: Modulation) {
        let tribit = symbol_to_tribit(corrected, modulation);
        let expected = Complex64::from_polar(1.0, tribit as f64 * PI / 4.0);
        let mag = corrected.norm();
        if mag < 1e-9 {
            return;
        }
        let dist = (corrected - expected).norm();
        let normalized_dist = dist / mag;
        let confidence = (1.0 - normalized_dist / 0.4).clamp(0.0, 1.0);
        if confidence < self.dd_confidence_threshold {
            return;
        }
        let error_phasor = corrected * expected.conj();
        let phase_error = error_phasor.im.atan2(error_phasor.re);
        let dd_r = self.r_phase / (self.dd_weight * confidence);
        self.kalman_update(phase_error, dd_r);
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn frequency_hz(&self) -> f64 {
        self.freq * self.symbol_rate_hz / (2.0 * PI)
    }

    pub fn phase_uncertainty(&self) -> f64 {
        self.p[0][0].sqrt()
    }
}
