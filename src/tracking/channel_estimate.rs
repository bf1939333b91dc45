//! Probe-aided channel estimation: complex gain via correlation against the
//! known probe reference, SNR estimation from the residual, and an
//! exponential moving average across probe blocks.

use num_complex::Complex64;

#[derive(Debug, Clone, Copy)]
pub struct ChannelEstimate {
    pub gain: Complex64,
    pub snr_db: f64,
    pub noise_variance: f64,
    pub valid: bool,
}

impl Default for ChannelEstimate {
    fn default() -> Self {
        Self { gain: Complex64::new(1.0, 0.0), snr_db: 30.0, noise_variance: 0.001, valid: false }
    }
}

impl ChannelEstimate {
    pub fn amplitude(&self) -> f64 {
        self.gain.norm()
    }

    pub fn phase(&self) -> f64 {
        self.gain.arg()
    }
}

/// Estimates channel gain and SNR from a block of received probe symbols
/// against the known reference, smoothing estimates across blocks with an
/// exponential moving average.
pub struct ChannelEstimator {
    alpha: f64,
    min_snr_db: f64,
    current: ChannelEstimate,
    probe_blocks_seen: u64,
}

impl ChannelEstimator {
    pub fn new(alpha: f64, min_snr_db: f64) -> Self {
        Self { alpha, min_snr_db, current: ChannelEstimate::default(), probe_blocks_seen: 0 }
    }

    /// `H = sum(rx * conj(ref)) / sum(|ref|^2)`; SNR from the residual error
    /// after compensating by `H`.
    pub fn process_probes(&mut self, received: &[Complex64], reference: &[Complex64]) -> ChannelEstimate {
        assert_eq!(received.len(), reference.len());
        let n = received.len().max(1) as f64;

        let mut correlation = Complex64::new(0.0, 0.0);
        let mut ref_power = 0.0;
        for (rx, rf) in received.iter().zip(reference.iter()) {
            correlation += rx * rf.conj();
            ref_power += rf.norm_sqr();
        }
        let gain = if ref_power > 1e-12 { correlation / ref_power } else { Complex64::new(1.0, 0.0) };

        let mut signal_power = 0.0;
        let mut error_power = 0.0;
        for (rx, rf) in received.iter().zip(reference.iter()) {
            let compensated = if gain.norm() > 1e-9 { rx / gain } else { *rx };
            let error = compensated - rf;
            signal_power += rf.norm_sqr();
            error_power += error.norm_sqr();
        }
        let noise_variance = error_power / n;
        let snr_linear = (signal_power / n) / noise_variance.max(1e-10);
        let snr_db = 10.0 * snr_linear.log10();

        let estimate = ChannelEstimate {
            gain,
            snr_db,
            noise_variance,
            valid: snr_db >= self.min_snr_db,
        };

        if self.probe_blocks_seen == 0 {
            self.current = estimate;
        } else {
            let a = self.alpha;
            self.current = ChannelEstimate {
                gain: a * estimate.gain + (1.0 - a) * self.current.gain,
                snr_db: a * estimate.snr_db + (1.0 - a) * self.current.snr_db,
                noise_variance: a * estimate.noise_variance + (1.0 - a) * self.current.noise_variance,
                valid: estimate.valid,
            };
        }
        self.probe_blocks_seen += 1;

        estimate
    }

    pub fn compensate(&self, symbol: Complex64) -> Complex64 {
        if self.current.gain.norm() < 0.01 {
            symbol
        } else {
            symbol / self.current.gain
        }
    }

    pub fn estimate(&self) -> ChannelEstimate {
        self.current
    }

    /// Soft-demap scale factor: higher SNR means more confident LLRs.
    pub fn soft_scale(&self) -> f64 {
        10f64.powf(self.current.snr_db / 10.0).sqrt()
    }
}
