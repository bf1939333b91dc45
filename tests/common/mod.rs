//! Shared helpers for the integration test scenarios in §8: building a
//! clean or impaired passband, pushing it through `Transmitter`/`Receiver`
//! the way a real front-end would (via `AudioSampleSource`, same as
//! production code), and a couple of small signal-analysis utilities.

use num_complex::Complex64;
use serial_tone_modem::config::{ReceiverConfig, TransmitterConfig};
use serial_tone_modem::io::{AudioSampleSource, SampleSource};
use serial_tone_modem::modes::ModeId;
use serial_tone_modem::receiver::Receiver;
use serial_tone_modem::transmitter::Transmitter;
use serial_tone_modem::tracking::EqualizerKind;

/// Transmit `data` in `mode` at the crate's nominal rates, returning the
/// real passband waveform.
pub fn transmit(mode: ModeId, data: &[u8]) -> Vec<f64> {
    let cfg = TransmitterConfig {
        mode,
        ..TransmitterConfig::default()
    };
    let mut tx = Transmitter::new(cfg).unwrap();
    tx.transmit(data)
}

/// Downconvert a real passband waveform to complex baseband the way a live
/// audio front-end would (the exact ingress path production code uses for
/// an audio-only source).
pub fn to_baseband(passband: &[f64], rcfg: &ReceiverConfig) -> Vec<Complex64> {
    let mut source = AudioSampleSource::new(passband.to_vec(), rcfg.sample_rate_hz, rcfg.carrier_freq_hz);
    let mut baseband = vec![Complex64::new(0.0, 0.0); passband.len()];
    let n = source.read(&mut baseband);
    baseband.truncate(n);
    baseband
}

/// Run a complex baseband stream through a fresh `Receiver` (mode
/// auto-detected from the preamble) to completion.
pub fn receive_baseband(baseband: &[Complex64], rcfg: ReceiverConfig) -> (Vec<u8>, Option<ModeId>) {
    let mut rx = Receiver::new(rcfg).unwrap();
    let mut decoded = rx.process_samples(baseband);
    decoded.extend(rx.finish());
    (decoded, rx.mode())
}

/// Downconvert a real passband waveform and run it through a fresh
/// receiver with the default sample/carrier rates, end to end.
pub fn receive(passband: &[f64], equalizer: EqualizerKind) -> (Vec<u8>, Option<ModeId>) {
    let rcfg = ReceiverConfig {
        equalizer,
        ..ReceiverConfig::default()
    };
    let baseband = to_baseband(passband, &rcfg);
    receive_baseband(&baseband, rcfg)
}

/// Bit error rate between two equal-length byte slices, counted over the
/// shorter of the two lengths (a short decode is itself a failure the
/// caller should check for separately).
pub fn bit_error_rate(expected: &[u8], actual: &[u8]) -> f64 {
    let len = expected.len().min(actual.len());
    if len == 0 {
        return 1.0;
    }
    let mut errors = 0usize;
    for i in 0..len {
        errors += (expected[i] ^ actual[i]).count_ones() as usize;
    }
    errors as f64 / (len * 8) as f64
}
