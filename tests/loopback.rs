//! Clean-channel round-trip scenarios (§8, scenarios 1 and 2): transmit a
//! literal message, demodulate it back through a fresh, mode-auto-detecting
//! receiver, and check the bytes come back unchanged.

mod common;

use serial_tone_modem::modes::ModeId;
use serial_tone_modem::tracking::EqualizerKind;

#[test]
fn scenario_1_2400s_loopback_recovers_the_message() {
    let message = b"THE QUICK BROWN FOX JUMPS OVER THE LAZY DOG 1234567890";
    assert_eq!(message.len(), 54);

    let passband = common::transmit(ModeId::M2400S, message);
    let (decoded, mode) = common::receive(&passband, EqualizerKind::ProbeOnly);

    assert_eq!(mode, Some(ModeId::M2400S));
    assert_eq!(decoded.as_slice(), message.as_slice());
}

#[test]
fn scenario_2_600l_loopback_recovers_hello() {
    let message = b"Hello";
    assert_eq!(message.len(), 5);

    let descriptor = ModeId::M600L.descriptor();
    assert_eq!(descriptor.interleaver.block_size(), 40 * 144);
    assert_eq!(descriptor.preamble_symbols(), 24 * 480);

    let passband = common::transmit(ModeId::M600L, message);
    let (decoded, mode) = common::receive(&passband, EqualizerKind::ProbeOnly);

    assert_eq!(mode, Some(ModeId::M600L));
    assert_eq!(decoded.as_slice(), message.as_slice());
}
