//! Transmitter (component G): the inverse of the receive pipeline — pack,
//! scramble, encode, repeat, interleave, map to symbols, insert probes,
//! prepend the preamble, pulse-shape, and upconvert to real passband.

use crate::config::TransmitterConfig;
use crate::dsp::{FirFilterComplex, Nco, SrrcFilter};
use crate::errors::ModemError;
use crate::fec::conv::ConvEncoder;
use crate::fec::interleave::BlockInterleaver;
use crate::fec::mapper::{bits_to_tribit, tribit_to_symbol};
use crate::fec::scrambler::{BitScrambler, ProbeScrambler};
use crate::modes::{ModeDescriptor, Modulation};
use crate::preamble::PreambleEncoder;
use crate::utils::bytes_to_bits;
use num_complex::Complex64;

/// Expand rate-1/2 `(o1, o2)` pairs into `repetition` back-to-back copies of
/// each pair, preserving the o1/o2 alternation (the inverse of the
/// receiver's `combine_repetition_pairs`).
fn repeat_pairs(bits: &[u8], repetition: u32) -> Vec<u8> {
    if repetition <= 1 {
        return bits.to_vec();
    }
    let mut out = Vec::with_capacity(bits.len() * repetition as usize);
    for pair in bits.chunks_exact(2) {
        for _ in 0..repetition {
            out.push(pair[0]);
            out.push(pair[1]);
        }
    }
    out
}

pub struct Transmitter {
    config: TransmitterConfig,
    descriptor: &'static ModeDescriptor,
    interleaver: BlockInterleaver,
    block_size: usize,
    repetition: u32,
    is_uncoded: bool,
    modulation: Modulation,
    unknown_len: usize,
    known_len: usize,
    pattern_len: usize,
    sps: usize,
    probe_scrambler: ProbeScrambler,
    symbol_offset: u64,
}

impl Transmitter {
    pub fn new(config: TransmitterConfig) -> Result<Self, ModemError> {
        config.validate()?;
        let sps = config.samples_per_symbol()?;
        let descriptor = config.mode.descriptor();
        Ok(Self {
            interleaver: BlockInterleaver::new(&descriptor.interleaver),
            block_size: descriptor.interleaver.block_size(),
            repetition: descriptor.repetition,
            is_uncoded: descriptor.is_uncoded(),
            modulation: descriptor.modulation,
            unknown_len: descriptor.unknown_len,
            known_len: descriptor.known_len,
            pattern_len: descriptor.unknown_len + descriptor.known_len,
            sps,
            probe_scrambler: ProbeScrambler::new(),
            symbol_offset: 0,
            descriptor,
            config,
        })
    }

    /// Pack, scramble, (convolutionally encode and) repeat, zero-pad to the
    /// interleaver block boundary, interleave per block, and group into
    /// tribits. A single bit scrambler and (when coded) a single
    /// convolutional encoder run continuously across the whole message;
    /// the 6-bit zero flush is appended once, at the very end.
    fn build_data_tribits(&mut self, data: &[u8]) -> Vec<u8> {
        let bits = bytes_to_bits(data);
        let mut scrambler = BitScrambler::new();
        let scrambled_bits = scrambler.apply_all(&bits);

        let coded_bits = if self.is_uncoded {
            scrambled_bits
        } else {
            let mut encoder = ConvEncoder::new();
            encoder.encode_with_flush(&scrambled_bits)
        };

        let repeated = if self.is_uncoded {
            coded_bits
        } else {
            repeat_pairs(&coded_bits, self.repetition)
        };

        let padded_len = repeated.len().div_ceil(self.block_size) * self.block_size;
        let mut padded = repeated;
        padded.resize(padded_len, 0);

        let mut interleaved_all = Vec::with_capacity(padded_len);
        for block in padded.chunks_exact(self.block_size) {
            let interleaved = self
                .interleaver
                .interleave(block)
                .expect("block is exactly one interleaver rectangle");
            interleaved_all.extend(interleaved);
        }

        let bps = self.modulation.bits_per_symbol();
        interleaved_all
            .chunks_exact(bps)
            .map(|group| bits_to_tribit(group, self.modulation).unwrap_or(0))
            .collect()
    }

    /// Interleave `data_tribits` with probe symbols at the mode's
    /// `unknown_len`/`known_len` cadence, scrambling every output position
    /// (data and probe alike) with the same continuously-advancing
    /// `ProbeScrambler` offset the receiver uses to undo it.
    fn assemble_symbols(&mut self, data_tribits: Vec<u8>) -> Vec<Complex64> {
        self.symbol_offset = 0;
        let mut out = Vec::with_capacity(data_tribits.len() * 2);
        let mut data_iter = data_tribits.into_iter();
        let mut pos = 0usize;
        loop {
            let is_data = self.pattern_len == 0 || pos < self.unknown_len;
            let offset = (self.symbol_offset % 32) as usize;
            if is_data {
                let tribit = match data_iter.next() {
                    Some(t) => t,
                    None => break,
                };
                let scrambled = self.probe_scrambler.scramble(tribit, offset);
                out.push(tribit_to_symbol(scrambled));
            } else {
                out.push(tribit_to_symbol(self.probe_scrambler.at(offset)));
            }
            self.symbol_offset += 1;
            pos = if self.pattern_len == 0 { 0 } else { (pos + 1) % self.pattern_len };
        }
        out
    }

    /// Zero-stuff by `sps`, SRRC-shape (taps scaled by `sps` to preserve
    /// amplitude through the zero-stuffing, mirroring
    /// [`crate::dsp::resample::Interpolator`]), and append a `span*sps`
    /// zero tail to drain the filter.
    fn pulse_shape(&self, symbols: &[Complex64]) -> Vec<Complex64> {
        let mut taps = SrrcFilter::design(self.config.srrc_alpha, self.config.srrc_span_symbols, self.sps)
            .taps()
            .to_vec();
        for t in &mut taps {
            *t *= self.sps as f64;
        }
        let mut filter = FirFilterComplex::new(taps);

        let mut zero_stuffed = Vec::with_capacity(symbols.len() * self.sps);
        for &s in symbols {
            zero_stuffed.push(s);
            zero_stuffed.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(self.sps - 1));
        }
        let tail = self.config.srrc_span_symbols * self.sps;
        zero_stuffed.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(tail));

        zero_stuffed.iter().map(|&s| filter.process(s)).collect()
    }

    fn upconvert(&self, baseband: &[Complex64]) -> Vec<f64> {
        let mut nco = Nco::new(self.config.carrier_freq_hz, self.config.sample_rate_hz);
        baseband.iter().map(|&s| nco.mix(s).re).collect()
    }

    fn normalize(&self, samples: &mut [f64]) {
        let peak = samples.iter().fold(0.0f64, |m, &v| m.max(v.abs()));
        if peak > 1e-9 {
            let scale = self.config.output_amplitude / peak;
            for s in samples.iter_mut() {
                *s *= scale;
            }
        }
    }

    /// Run the full transmit pipeline over one message, returning real
    /// passband samples at `config.sample_rate_hz`.
    pub fn transmit(&mut self, data: &[u8]) -> Vec<f64> {
        let num_frames = match self.config.force_long_preamble {
            Some(true) => 24,
            Some(false) => 3,
            None => self.descriptor.preamble_frames,
        };
        let preamble_symbols: Vec<Complex64> = {
            let encoder = PreambleEncoder::new(&self.probe_scrambler);
            encoder
                .encode(self.descriptor.d1, self.descriptor.d2, num_frames)
                .into_iter()
                .map(tribit_to_symbol)
                .collect()
        };

        let data_tribits = self.build_data_tribits(data);
        let data_symbols = self.assemble_symbols(data_tribits);

        let mut symbols = preamble_symbols;
        symbols.extend(data_symbols);

        let baseband = self.pulse_shape(&symbols);
        let mut passband = self.upconvert(&baseband);
        self.normalize(&mut passband);
        passband
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::ModeId;

    #[test]
    fn repeat_pairs_preserves_alternation() {
        let bits = vec![1u8, 0];
        assert_eq!(repeat_pairs(&bits, 3), vec![1, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn repeat_pairs_is_identity_at_rate_one() {
        let bits = vec![1u8, 0, 1, 1];
        assert_eq!(repeat_pairs(&bits, 1), bits);
    }

    #[test]
    fn transmit_produces_nonempty_normalized_passband() {
        let mut cfg = TransmitterConfig::default();
        cfg.mode = ModeId::M2400S;
        let mut tx = Transmitter::new(cfg.clone()).unwrap();
        let samples = tx.transmit(b"HI");
        assert!(!samples.is_empty());
        let peak = samples.iter().fold(0.0f64, |m, &v| m.max(v.abs()));
        assert!((peak - cfg.output_amplitude).abs() < 1e-6);
    }

    #[test]
    fn transmit_prepends_preamble_longer_than_srrc_tail() {
        let mut cfg = TransmitterConfig::default();
        cfg.mode = ModeId::M600S;
        let mut tx = Transmitter::new(cfg).unwrap();
        let samples = tx.transmit(b"X");
        // 3 frames * 480 symbols at 20 sps plus data and the filter tail.
        assert!(samples.len() > 3 * 480 * 20);
    }

    #[test]
    fn uncoded_mode_round_trips_through_build_data_tribits() {
        let cfg = TransmitterConfig {
            mode: ModeId::M4800S,
            ..TransmitterConfig::default()
        };
        let mut tx = Transmitter::new(cfg).unwrap();
        let tribits = tx.build_data_tribits(b"Z");
        assert!(!tribits.is_empty());
        assert!(tribits.iter().all(|&t| t < 8));
    }
}
