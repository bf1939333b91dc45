//! Channel equalization: an LMS or RLS-adapted decision-feedback equalizer,
//! an MLSE (Viterbi-over-channel-memory) equalizer, and a probe-only mode
//! that applies no per-symbol equalization beyond channel-estimate
//! compensation.

use crate::fec::mapper::symbol_to_tribit;
use crate::modes::Modulation;
use num_complex::Complex64;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqualizerKind {
    LmsDfe,
    RlsDfe,
    Mlse,
    ProbeOnly,
}

fn hard_decision(symbol: Complex64, modulation: Modulation) -> Complex64 {
    if symbol.norm() < 0.01 {
        return Complex64::new(1.0, 0.0);
    }
    let tribit = symbol_to_tribit(symbol, modulation);
    Complex64::from_polar(1.0, tribit as f64 * PI / 4.0)
}

/// LMS-adapted decision-feedback equalizer: feedforward taps over received
/// samples, feedback taps over past symbol decisions.
pub struct LmsDfe {
    ff_taps: Vec<Complex64>,
    fb_taps: Vec<Complex64>,
    ff_delay: Vec<Complex64>,
    fb_delay: Vec<Complex64>,
    ff_idx: usize,
    fb_idx: usize,
    mu_ff: f64,
    mu_fb: f64,
    leak: f64,
    center: usize,
}

impl LmsDfe {
    pub fn new(ff_taps: usize, fb_taps: usize, mu_ff: f64, mu_fb: f64, leak: f64) -> Self {
        let center = ff_taps / 2;
        let mut ff = vec![Complex64::new(0.0, 0.0); ff_taps];
        ff[center] = Complex64::new(1.0, 0.0);
        Self {
            ff_taps: ff,
            fb_taps: vec![Complex64::new(0.0, 0.0); fb_taps],
            ff_delay: vec![Complex64::new(0.0, 0.0); ff_taps],
            fb_delay: vec![Complex64::new(0.0, 0.0); fb_taps],
            ff_idx: 0,
            fb_idx: 0,
            mu_ff,
            mu_fb,
            leak,
            center,
        }
    }

    fn ff_output(&self) -> Complex64 {
        let n = self.ff_taps.len();
        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..n {
            let delay = self.center as isize - i as isize;
            let idx = ((self.ff_idx as isize - delay).rem_euclid(n as isize)) as usize;
            acc += self.ff_taps[i] * self.ff_delay[idx];
        }
        acc
    }

    fn fb_output(&self) -> Complex64 {
        let n = self.fb_taps.len();
        if n == 0 {
            return Complex64::new(0.0, 0.0);
        }
        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..n {
            let idx = ((self.fb_idx as isize - i as isize - 1).rem_euclid(n as isize)) as usize;
            acc += self.fb_taps[i] * self.fb_delay[idx];
        }
        acc
    }

    fn adapt(&mut self, error: Complex64) {
        let n_ff = self.ff_taps.len();
        for i in 0..n_ff {
            let delay = self.center as isize - i as isize;
            let idx = ((self.ff_idx as isize - delay).rem_euclid(n_ff as isize)) as usize;
            self.ff_taps[i] += self.mu_ff * error * self.ff_delay[idx].conj();
            self.ff_taps[i] *= 1.0 - self.leak;
        }
        let n_fb = self.fb_taps.len();
        for i in 0..n_fb {
            let idx = ((self.fb_idx as isize - i as isize - 1).rem_euclid(n_fb as isize)) as usize;
            self.fb_taps[i] += self.mu_fb * error * self.fb_delay[idx].conj();
            self.fb_taps[i] *= 1.0 - self.leak;
        }
    }

    /// Process one symbol; if `training` is `Some`, the known symbol drives
    /// adaptation directly rather than a hard decision.
    pub fn process(&mut self, input: Complex64, training: Option<Complex64>, modulation: Modulation) -> Complex64 {
        let n_ff = self.ff_taps.len();
        self.ff_delay[self.ff_idx] = input;

        let output = self.ff_output() + self.fb_output();
        let decision = training.unwrap_or_else(|| hard_decision(output, modulation));
        let error = decision - output;
        self.adapt(error);

        let n_fb = self.fb_taps.len();
        if n_fb > 0 {
            self.fb_delay[self.fb_idx] = decision;
            self.fb_idx = (self.fb_idx + 1) % n_fb;
        }
        self.ff_idx = (self.ff_idx + 1) % n_ff;

        output
    }

    pub fn is_converged(&self) -> bool {
        let center_mag = self.ff_taps[self.center].norm();
        let sum_others: f64 = self
            .ff_taps
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != self.center)
            .map(|(_, t)| t.norm())
            .sum();
        center_mag > 0.5 && sum_others < center_mag
    }
}

/// RLS-adapted DFE: same structure as the LMS variant, but feedforward taps
/// are updated with a recursive-least-squares rule for faster convergence.
pub struct RlsDfe {
    ff_taps: Vec<Complex64>,
    fb_taps: Vec<Complex64>,
    ff_delay: Vec<Complex64>,
    fb_delay: Vec<Complex64>,
    p: Vec<Vec<Complex64>>,
    ff_idx: usize,
    fb_idx: usize,
    mu_fb: f64,
    forgetting: f64,
    center: usize,
}

impl RlsDfe {
    pub fn new(ff_taps: usize, fb_taps: usize, forgetting: f64, mu_fb: f64, delta: f64) -> Self {
        let center = ff_taps / 2;
        let mut ff = vec![Complex64::new(0.0, 0.0); ff_taps];
        ff[center] = Complex64::new(1.0, 0.0);
        let mut p = vec![vec![Complex64::new(0.0, 0.0); ff_taps]; ff_taps];
        for (i, row) in p.iter_mut().enumerate() {
            row[i] = Complex64::new(1.0 / delta, 0.0);
        }
        Self {
            ff_taps: ff,
            fb_taps: vec![Complex64::new(0.0, 0.0); fb_taps],
            ff_delay: vec![Complex64::new(0.0, 0.0); ff_taps],
            fb_delay: vec![Complex64::new(0.0, 0.0); fb_taps],
            p,
            ff_idx: 0,
            fb_idx: 0,
            mu_fb,
            forgetting,
            center,
        }
    }

    fn delay_vector(&self) -> Vec<Complex64> {
        let n = self.ff_taps.len();
        (0..n)
            .map(|i| {
                let delay = self.center as isize - i as isize;
                let idx = ((self.ff_idx as isize - delay).rem_euclid(n as isize)) as usize;
                self.ff_delay[idx]
            })
            .collect()
    }

    fn fb_output(&self) -> Complex64 {
        let n = self.fb_taps.len();
        if n == 0 {
            return Complex64::new(0.0, 0.0);
        }
        let mut acc = Complex64::new(0.0, 0.0);
        for i in 0..n {
            let idx = ((self.fb_idx as isize - i as isize - 1).rem_euclid(n as isize)) as usize;
            acc += self.fb_taps[i] * self.fb_delay[idx];
        }
        acc
    }

    pub fn process(&mut self, input: Complex64, training: Option<Complex64>, modulation: Modulation) -> Complex64 {
        let n = self.ff_taps.len();
        self.ff_delay[self.ff_idx] = input;
        let u = self.delay_vector();

        let ff_out: Complex64 = self.ff_taps.iter().zip(u.iter()).map(|(w, x)| w * x).sum();
        let output = ff_out + self.fb_output();
        let decision = training.unwrap_or_else(|| hard_decision(output, modulation));
        let error = decision - output;

        // pi_vec = P * u
        let pi_vec: Vec<Complex64> = self
            .p
            .iter()
            .map(|row| row.iter().zip(u.iter()).map(|(p, x)| p * x.conj()).sum())
            .collect();
        let denom = self.forgetting
            + u.iter().zip(pi_vec.iter()).map(|(x, pi)| x * pi).sum::<Complex64>().re;
        let k: Vec<Complex64> = pi_vec.iter().map(|pi| pi / denom).collect();

        for i in 0..n {
            self.ff_taps[i] += k[i] * error;
        }

        // P = (P - k * u^H * P) / forgetting
        let u_h_p: Vec<Complex64> = (0..n)
            .map(|j| (0..n).map(|i| u[i].conj() * self.p[i][j]).sum())
            .collect();
        for i in 0..n {
            for j in 0..n {
                self.p[i][j] = (self.p[i][j] - k[i] * u_h_p[j]) / self.forgetting;
            }
        }

        let n_fb = self.fb_taps.len();
        for i in 0..n_fb {
            let idx = ((self.fb_idx as isize - i as isize - 1).rem_euclid(n_fb as isize)) as usize;
            self.fb_taps[i] += self.mu_fb * error * self.fb_delay[idx].conj();
        }
        if n_fb > 0 {
            self.fb_delay[self.fb_idx] = decision;
            self.fb_idx = (self.fb_idx + 1) % n_fb;
        }
        self.ff_idx = (self.ff_idx + 1) % n;

        output
    }
}

/// MLSE equalizer over an assumed channel memory of `L` symbols, via a
/// Viterbi search over `constellation_order^L` states. Channel taps are
/// refreshed from the channel estimator between probe blocks.
pub struct MlseEqualizer {
    memory: usize,
    order: usize,
    taps: Vec<Complex64>,
}

impl MlseEqualizer {
    pub fn new(memory: usize, modulation: Modulation) -> Self {
        Self {
            memory,
            order: modulation.order(),
            taps: {
                let mut t = vec![Complex64::new(0.0, 0.0); memory + 1];
                t[0] = Complex64::new(1.0, 0.0);
                t
            },
        }
    }

    pub fn set_channel_taps(&mut self, taps: &[Complex64]) {
        self.taps = taps.to_vec();
    }

    fn num_states(&self) -> usize {
        self.order.pow(self.memory as u32)
    }

    fn expected_sample(&self, state: usize, symbol_value: Complex64) -> Complex64 {
        let mut acc = self.taps.first().copied().unwrap_or(Complex64::new(1.0, 0.0)) * symbol_value;
        let mut s = state;
        for k in 1..=self.memory {
            let sym_idx = s % self.order;
            s /= self.order;
            let angle = sym_idx as f64 * 2.0 * PI / self.order as f64;
            let past = Complex64::from_polar(1.0, angle);
            if let Some(&tap) = self.taps.get(k) {
                acc += tap * past;
            }
        }
        acc
    }

    /// Run full-block Viterbi-over-channel-memory on a received block,
    /// returning the sequence of decided constellation symbols.
    pub fn equalize(&self, received: &[Complex64]) -> Vec<Complex64> {
        let num_states = self.num_states();
        if self.memory == 0 || num_states == 0 {
            return received
                .iter()
                .map(|&r| {
                    let angle = (r.arg() / (2.0 * PI / self.order as f64)).round()
                        * (2.0 * PI / self.order as f64);
                    Complex64::from_polar(1.0, angle)
                })
                .collect();
        }

        let mut path_metrics = vec![f64::INFINITY; num_states];
        path_metrics[0] = 0.0;
        let mut predecessors: Vec<Vec<Option<(usize, usize)>>> = Vec::with_capacity(received.len());

        for &sample in received {
            let mut new_metrics = vec![f64::INFINITY; num_states];
            let mut step_predecessors = vec![None; num_states];

            for state in 0..num_states {
                if !path_metrics[state].is_finite() {
                    continue;
                }
                for sym_idx in 0..self.order {
                    let angle = sym_idx as f64 * 2.0 * PI / self.order as f64;
                    let symbol_value = Complex64::from_polar(1.0, angle);
                    let expected = self.expected_sample(state, symbol_value);
                    let branch_cost = (sample - expected).norm_sqr();
                    let next_state = (state / self.order) + sym_idx * (num_states / self.order);
                    let total = path_metrics[state] + branch_cost;
                    if total < new_metrics[next_state] {
                        new_metrics[next_state] = total;
                        step_predecessors[next_state] = Some((state, sym_idx));
                    }
                }
            }

            path_metrics = new_metrics;
            predecessors.push(step_predecessors);
        }

        let best_final = path_metrics
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0);

        let mut decided_syms = vec![0usize; predecessors.len()];
        let mut state = best_final;
        for t in (0..predecessors.len()).rev() {
            if let Some((prev_state, sym_idx)) = predecessors[t][state] {
                decided_syms[t] = sym_idx;
                state = prev_state;
            }
        }

        decided_syms
            .into_iter()
            .map(|sym_idx| Complex64::from_polar(1.0, sym_idx as f64 * 2.0 * PI / self.order as f64))
            .collect()
    }
}
