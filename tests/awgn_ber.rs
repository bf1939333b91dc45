//! AWGN round-trip scenario (§8 scenario 3): 2400 S at 12 dB Es/N0 must
//! decode with zero post-Viterbi bit errors in at least 95% of 20 seeded
//! trials. Seeds run in parallel, mirroring the teacher's use of `rayon`
//! for its own multi-trial benchmarks.

mod common;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serial_tone_modem::channel::{apply_awgn, noise_std_from_es_n0_db};
use serial_tone_modem::modes::ModeId;
use serial_tone_modem::tracking::EqualizerKind;

#[test]
fn scenario_3_awgn_12db_es_n0_decodes_cleanly_in_at_least_95_percent_of_trials() {
    let message = b"AWGN Test Message 12345";
    assert_eq!(message.len(), 23);

    let clean_passband = common::transmit(ModeId::M2400S, message);
    let noise_std = noise_std_from_es_n0_db(12.0);

    let successes: usize = (1..=20u64)
        .into_par_iter()
        .filter(|&seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let noisy = apply_awgn(&clean_passband, noise_std, &mut rng);
            let (decoded, _mode) = common::receive(&noisy, EqualizerKind::ProbeOnly);
            decoded.len() >= message.len() && common::bit_error_rate(message, &decoded[..message.len()]) == 0.0
        })
        .count();

    assert!(
        successes as f64 / 20.0 >= 0.95,
        "only {successes}/20 trials decoded with zero bit errors"
    );
}
