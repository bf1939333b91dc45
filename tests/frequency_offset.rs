//! Frequency-offset round-trip scenario (§8 scenario 4): a clean channel
//! with a static +15 Hz carrier error must still decode.

mod common;

use serial_tone_modem::channel::apply_frequency_offset;
use serial_tone_modem::config::ReceiverConfig;
use serial_tone_modem::modes::ModeId;

#[test]
fn scenario_4_plus_15hz_offset_decodes() {
    let message = b"FREQUENCY TEST";
    assert_eq!(message.len(), 14);

    let rcfg = ReceiverConfig::default();
    let passband = common::transmit(ModeId::M2400S, message);
    let baseband = common::to_baseband(&passband, &rcfg);
    let offset_baseband = apply_frequency_offset(&baseband, 15.0, rcfg.sample_rate_hz);

    let (decoded, mode) = common::receive_baseband(&offset_baseband, rcfg);
    assert_eq!(mode, Some(ModeId::M2400S));
    assert_eq!(decoded.as_slice(), message.as_slice());
}
