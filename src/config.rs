//! Flat configuration records for the receiver and transmitter. Per the
//! design notes, each pipeline takes one record with every option enumerated
//! and defaulted rather than a builder with mutable setters.

use crate::errors::ConfigError;
use crate::modes::ModeId;
use crate::tracking::{EqualizerKind, TedKind};
use serde::{Deserialize, Serialize};

/// Loop-bandwidth/damping pair shared by the timing and carrier loops.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoopGains {
    pub bandwidth_acquire: f64,
    pub bandwidth_track: f64,
    pub damping: f64,
}

impl Default for LoopGains {
    fn default() -> Self {
        Self {
            bandwidth_acquire: 0.01,
            bandwidth_track: 0.005,
            damping: std::f64::consts::FRAC_1_SQRT_2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Input sample rate in Hz; must reduce to an integer samples-per-symbol
    /// at `symbol_rate_hz`.
    pub sample_rate_hz: f64,
    pub symbol_rate_hz: f64,
    pub carrier_freq_hz: f64,
    /// Fixed mode, or `None` to auto-detect from the preamble's D1/D2.
    pub mode: Option<ModeId>,
    pub timing: LoopGains,
    pub carrier: LoopGains,
    pub ted: TedKind,
    pub equalizer: EqualizerKind,
    /// Number of symbols the ACQUIRING state holds before declaring
    /// SYNCHRONIZED (settling interval).
    pub settling_symbols: usize,
    /// Consecutive invalid channel estimates tolerated before LOST.
    pub loss_of_sync_frames: u32,
    /// SNR floor in dB below which the receiver declares LOST.
    pub snr_floor_db: f64,
    /// EMA smoothing coefficient for the channel estimate.
    pub channel_estimate_alpha: f64,
    /// Preamble correlation early-termination threshold (§9 open question).
    pub preamble_peak_threshold: f64,
    /// Minimum D1/D2 majority-vote confidence (votes / total) to accept.
    pub preamble_min_confidence: f64,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000.0,
            symbol_rate_hz: 2400.0,
            carrier_freq_hz: 1800.0,
            mode: None,
            timing: LoopGains::default(),
            carrier: LoopGains::default(),
            ted: TedKind::Gardner,
            equalizer: EqualizerKind::ProbeOnly,
            settling_symbols: 50,
            loss_of_sync_frames: 8,
            snr_floor_db: 3.0,
            channel_estimate_alpha: 0.3,
            preamble_peak_threshold: 0.80,
            preamble_min_confidence: 50.0 / 96.0,
        }
    }
}

impl ReceiverConfig {
    pub fn samples_per_symbol(&self) -> Result<usize, ConfigError> {
        samples_per_symbol(self.sample_rate_hz, self.symbol_rate_hz)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.samples_per_symbol()?;
        if !(0.0..=1.0).contains(&self.preamble_peak_threshold) {
            return Err(ConfigError::Contradictory {
                reason: format!(
                    "preamble_peak_threshold {} out of [0,1]",
                    self.preamble_peak_threshold
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransmitterConfig {
    pub sample_rate_hz: f64,
    pub symbol_rate_hz: f64,
    pub carrier_freq_hz: f64,
    pub mode: ModeId,
    /// Peak output amplitude as a fraction of full scale.
    pub output_amplitude: f64,
    pub srrc_alpha: f64,
    pub srrc_span_symbols: usize,
    /// Use the long preamble regardless of the mode's nominal interleave
    /// class (callers normally leave this `None` and defer to the mode).
    pub force_long_preamble: Option<bool>,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000.0,
            symbol_rate_hz: 2400.0,
            carrier_freq_hz: 1800.0,
            mode: ModeId::M2400S,
            output_amplitude: 0.7,
            srrc_alpha: 0.35,
            srrc_span_symbols: 6,
            force_long_preamble: None,
        }
    }
}

impl TransmitterConfig {
    pub fn samples_per_symbol(&self) -> Result<usize, ConfigError> {
        samples_per_symbol(self.sample_rate_hz, self.symbol_rate_hz)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.samples_per_symbol()?;
        if !(0.0..=1.0).contains(&self.output_amplitude) {
            return Err(ConfigError::Contradictory {
                reason: format!("output_amplitude {} out of [0,1]", self.output_amplitude),
            });
        }
        Ok(())
    }
}

fn samples_per_symbol(sample_rate_hz: f64, symbol_rate_hz: f64) -> Result<usize, ConfigError> {
    let sps = sample_rate_hz / symbol_rate_hz;
    if sps.fract().abs() > 1e-9 || sps < 1.0 {
        return Err(ConfigError::NonIntegerSamplesPerSymbol {
            sample_rate: sample_rate_hz,
            symbol_rate: symbol_rate_hz,
        });
    }
    Ok(sps.round() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_receiver_config_has_integer_sps() {
        let cfg = ReceiverConfig::default();
        assert_eq!(cfg.samples_per_symbol().unwrap(), 20);
    }

    #[test]
    fn rejects_non_integer_sps() {
        let mut cfg = ReceiverConfig::default();
        cfg.sample_rate_hz = 8000.0;
        assert!(cfg.samples_per_symbol().is_err());
    }

    #[test]
    fn transmitter_config_validates() {
        let cfg = TransmitterConfig::default();
        assert!(cfg.validate().is_ok());
    }
}
