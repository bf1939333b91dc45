//! Frame engine & receiver (component F): the SEARCHING → ACQUIRING →
//! SYNCHRONIZED → LOST state machine, frame-synchronous demux of data/probe
//! symbols, and the soft-bit-to-byte decode pipeline.

use crate::acquisition::{Acquisition, AcquisitionResult};
use crate::config::ReceiverConfig;
use crate::dsp::{FirFilterComplex, Nco, SrrcFilter};
use crate::errors::ModemError;
use crate::fec::mapper::{soft_demap, symbol_to_tribit, tribit_to_symbol};
use crate::fec::scrambler::{BitScrambler, ProbeScrambler};
use crate::fec::{BlockInterleaver, ViterbiDecoder};
use crate::logging::ModemLogger;
use crate::modes::{InterleaveKind, ModeDescriptor, ModeId, Modulation};
use crate::preamble::{PreambleDecoder, FRAME_SYMBOLS};
use crate::tracking::{
    CarrierPll, ChannelEstimator, EkfCarrierTracker, EqualizerKind, LmsDfe, MlseEqualizer, RlsDfe, TimingRecovery,
};
use crate::utils::bits_to_bytes;
use num_complex::Complex64;
use std::collections::VecDeque;

/// Minimum trellis depth (5*K) the margin-based continuous decoder keeps
/// unemitted at the tail of the running soft-bit buffer, matching the
/// convolutional decoder's own full-block-traceback assumption.
const DECODE_MARGIN_BITS: usize = 35;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Searching,
    Acquiring,
    Synchronized,
    Lost,
}

enum EqualizerUnit {
    Lms(LmsDfe),
    Rls(RlsDfe),
    Mlse(MlseEqualizer),
    ProbeOnly,
}

/// Combine `repetition`-fold repeated rate-1/2 pairs by summing each pair's
/// o1 and o2 positions across the repeated copies. `repetition == 1` is a
/// pass-through. Any bits trailing an incomplete final group are dropped.
fn combine_repetition_pairs(bits: &[i8], repetition: u32) -> Vec<i8> {
    let group = 2 * repetition as usize;
    if group <= 2 {
        return bits.to_vec();
    }
    let mut out = Vec::with_capacity(bits.len() / repetition as usize);
    for chunk in bits.chunks_exact(group) {
        let mut o1 = 0i32;
        let mut o2 = 0i32;
        for (i, &b) in chunk.iter().enumerate() {
            if i % 2 == 0 {
                o1 += b as i32;
            } else {
                o2 += b as i32;
            }
        }
        out.push(o1.clamp(-127, 127) as i8);
        out.push(o2.clamp(-127, 127) as i8);
    }
    out
}

/// Receive-side frame engine: owns every per-symbol tracking/equalization
/// stage and the state machine that sequences them.
pub struct Receiver {
    config: ReceiverConfig,
    state: ReceiverState,
    sps: usize,

    acquisition: Acquisition,
    search_buffer: VecDeque<Complex64>,
    search_limit_samples: usize,

    carrier_nco: Nco,
    matched_filter: FirFilterComplex,
    timing: TimingRecovery,
    carrier_pll: CarrierPll,
    carrier_ekf: EkfCarrierTracker,
    channel_estimator: ChannelEstimator,
    equalizer: EqualizerUnit,

    probe_scrambler: ProbeScrambler,
    preamble_frame_buf: Vec<u8>,
    symbol_count: u64,
    mode: Option<ModeId>,
    preamble_total_symbols: Option<usize>,

    pattern_len: usize,
    unknown_len: usize,
    known_len: usize,
    pos_in_pattern: usize,
    symbol_offset: u64,
    probe_ref_buf: Vec<Complex64>,
    probe_rx_buf: Vec<Complex64>,
    mlse_run: Vec<Complex64>,

    block_interleaver: Option<BlockInterleaver>,
    block_size: usize,
    deinterleave_buf: Vec<i8>,
    combined_soft_bits: Vec<i8>,
    decoder_continuing: bool,
    bit_scrambler: BitScrambler,
    repetition: u32,
    is_uncoded: bool,
    modulation: Modulation,
    invalid_probe_frames: u32,

    logger: ModemLogger,
}

impl Receiver {
    pub fn new(config: ReceiverConfig) -> Result<Self, ModemError> {
        config.validate()?;
        let sps = config.samples_per_symbol()?;
        let max_preamble_symbols = 24 * FRAME_SYMBOLS;
        Ok(Self {
            acquisition: Acquisition::new(sps, config.sample_rate_hz),
            search_buffer: VecDeque::new(),
            search_limit_samples: max_preamble_symbols * sps,
            carrier_nco: Nco::new(0.0, config.sample_rate_hz),
            matched_filter: FirFilterComplex::new(
                SrrcFilter::design(0.35, 6, sps).taps().to_vec(),
            ),
            timing: TimingRecovery::new(sps as f64, config.timing.bandwidth_acquire, config.timing.damping, config.ted),
            carrier_pll: CarrierPll::new(config.carrier.bandwidth_acquire, config.carrier.damping),
            carrier_ekf: EkfCarrierTracker::new(config.symbol_rate_hz, 100.0),
            channel_estimator: ChannelEstimator::new(config.channel_estimate_alpha, config.snr_floor_db),
            equalizer: EqualizerUnit::ProbeOnly,
            probe_scrambler: ProbeScrambler::new(),
            preamble_frame_buf: Vec::with_capacity(FRAME_SYMBOLS),
            symbol_count: 0,
            mode: config.mode,
            preamble_total_symbols: config.mode.map(|m| m.descriptor().preamble_symbols()),
            pattern_len: 0,
            unknown_len: 0,
            known_len: 0,
            pos_in_pattern: 0,
            symbol_offset: 0,
            probe_ref_buf: Vec::new(),
            probe_rx_buf: Vec::new(),
            mlse_run: Vec::new(),
            block_interleaver: None,
            block_size: 0,
            deinterleave_buf: Vec::new(),
            combined_soft_bits: Vec::new(),
            decoder_continuing: false,
            bit_scrambler: BitScrambler::new(),
            repetition: 1,
            is_uncoded: false,
            modulation: Modulation::Psk8,
            invalid_probe_frames: 0,
            sps,
            state: ReceiverState::Searching,
            logger: ModemLogger::default(),
            config,
        })
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn mode(&self) -> Option<ModeId> {
        self.mode
    }

    pub fn logger(&self) -> &ModemLogger {
        &self.logger
    }

    /// Reset all pipeline state to initial, as if no samples had been seen.
    pub fn reset(&mut self) {
        self.state = ReceiverState::Searching;
        self.search_buffer.clear();
        self.symbol_count = 0;
        self.mode = self.config.mode;
        self.preamble_total_symbols = self.config.mode.map(|m| m.descriptor().preamble_symbols());
        self.preamble_frame_buf.clear();
        self.carrier_nco.set_frequency(0.0);
    }

    /// Feed newly arrived oversampled baseband samples; returns any bytes
    /// decoded during this call.
    pub fn process_samples(&mut self, samples: &[Complex64]) -> Vec<u8> {
        let mut out = Vec::new();
        for &sample in samples {
            match self.state {
                ReceiverState::Searching => {
                    self.search_buffer.push_back(sample);
                    if self.search_buffer.len() > self.search_limit_samples {
                        self.search_buffer.pop_front();
                    }
                }
                ReceiverState::Acquiring => self.feed_acquiring(sample),
                ReceiverState::Synchronized => self.feed_synchronized(sample, &mut out),
                ReceiverState::Lost => {
                    self.logger.info("FRAME", "LOST -> SEARCHING, resetting detector state");
                    self.reset();
                    self.search_buffer.push_back(sample);
                }
            }
        }
        if self.state == ReceiverState::Searching {
            self.try_acquire();
        }
        out
    }

    fn try_acquire(&mut self) {
        if self.search_buffer.len() < self.sps * FRAME_SYMBOLS {
            return;
        }
        let contiguous = self.search_buffer.make_contiguous().to_vec();
        if let Some(result) = self
            .acquisition
            .acquire(&contiguous, self.config.preamble_peak_threshold, contiguous.len())
        {
            self.logger.info(
                "ACQ",
                format!(
                    "preamble detected at sample {}, freq offset {:.1} Hz",
                    result.sample_offset, result.freq_offset_hz
                ),
            );
            let remainder: Vec<Complex64> = contiguous[result.sample_offset..].to_vec();
            self.enter_acquiring(&result);
            for &sample in &remainder {
                self.feed_acquiring(sample);
            }
        }
    }

    fn enter_acquiring(&mut self, result: &AcquisitionResult) {
        self.search_buffer.clear();
        self.carrier_nco = Nco::new(-result.freq_offset_hz, self.config.sample_rate_hz);
        self.timing = TimingRecovery::new(
            self.sps as f64,
            self.config.timing.bandwidth_acquire,
            self.config.timing.damping,
            self.config.ted,
        );
        self.carrier_pll = CarrierPll::new(self.config.carrier.bandwidth_acquire, self.config.carrier.damping);
        self.symbol_count = 0;
        self.preamble_frame_buf.clear();
        self.mode = self.config.mode;
        self.preamble_total_symbols = self.config.mode.map(|m| m.descriptor().preamble_symbols());
        self.state = ReceiverState::Acquiring;
    }

    fn feed_acquiring(&mut self, sample: Complex64) {
        let corrected = self.carrier_nco.mix_down(sample);
        let filtered = self.matched_filter.process(corrected);
        if let Some(symbol) = self.timing.process(filtered) {
            self.handle_acquiring_symbol(symbol);
        }
    }

    fn handle_acquiring_symbol(&mut self, symbol: Complex64) {
        let derotated = self.carrier_pll.process(symbol, Modulation::Psk8);
        let tribit = symbol_to_tribit(derotated, Modulation::Psk8);
        self.preamble_frame_buf.push(tribit);
        self.symbol_count += 1;

        if self.preamble_frame_buf.len() == FRAME_SYMBOLS {
            let frame_offset = self.symbol_count as usize - FRAME_SYMBOLS;
            let decoder = PreambleDecoder::new(&self.probe_scrambler);
            if let Some(info) = decoder.decode_frame(&self.preamble_frame_buf, frame_offset) {
                if self.mode.is_none() {
                    let min_conf = self.config.preamble_min_confidence;
                    if info.d1.confidence() >= min_conf && info.d2.confidence() >= min_conf {
                        if let Some(id) = ModeId::from_d1d2(info.d1.value, info.d2.value, InterleaveKind::Short) {
                            self.logger.info("PREAMBLE", format!("mode identified: {}", id.name()));
                            self.mode = Some(id);
                            self.preamble_total_symbols = Some(id.descriptor().preamble_symbols());
                        }
                    }
                }
            }
            self.preamble_frame_buf.clear();
        }

        let settle = self.config.settling_symbols as u64;
        match self.preamble_total_symbols {
            Some(total) if self.symbol_count >= (total as u64).max(settle) => self.enter_synchronized(),
            None if self.symbol_count as usize >= 24 * FRAME_SYMBOLS => {
                self.logger.warn("PREAMBLE", "mode never resolved from D1/D2, giving up");
                self.state = ReceiverState::Lost;
            }
            _ => {}
        }
    }

    fn enter_synchronized(&mut self) {
        let descriptor: &'static ModeDescriptor = self.mode.expect("mode known before sync").descriptor();
        self.modulation = descriptor.modulation;
        self.repetition = descriptor.repetition;
        self.is_uncoded = descriptor.is_uncoded();
        self.unknown_len = descriptor.unknown_len;
        self.known_len = descriptor.known_len;
        self.pattern_len = self.unknown_len + self.known_len;
        self.pos_in_pattern = 0;
        self.symbol_offset = 0;
        self.block_interleaver = Some(BlockInterleaver::new(&descriptor.interleaver));
        self.block_size = descriptor.interleaver.block_size();
        self.deinterleave_buf.clear();
        self.combined_soft_bits.clear();
        self.decoder_continuing = false;
        self.bit_scrambler = BitScrambler::new();
        self.probe_ref_buf.clear();
        self.probe_rx_buf.clear();
        self.mlse_run.clear();
        self.invalid_probe_frames = 0;

        let carrier_freq_estimate = self.carrier_pll.frequency_estimate_hz(self.config.symbol_rate_hz);
        self.carrier_ekf = EkfCarrierTracker::new(self.config.symbol_rate_hz, 100.0);
        self.carrier_ekf.initialize(carrier_freq_estimate, 20.0);

        self.equalizer = match self.config.equalizer {
            EqualizerKind::LmsDfe => EqualizerUnit::Lms(LmsDfe::new(11, 5, 0.01, 0.005, 1e-4)),
            EqualizerKind::RlsDfe => EqualizerUnit::Rls(RlsDfe::new(11, 5, 0.99, 0.01, 0.01)),
            EqualizerKind::Mlse => EqualizerUnit::Mlse(MlseEqualizer::new(3, self.modulation)),
            EqualizerKind::ProbeOnly => EqualizerUnit::ProbeOnly,
        };

        self.logger.info("FRAME", "ACQUIRING -> SYNCHRONIZED");
        self.state = ReceiverState::Synchronized;
    }

    fn feed_synchronized(&mut self, sample: Complex64, out: &mut Vec<u8>) {
        let corrected = self.carrier_nco.mix_down(sample);
        let filtered = self.matched_filter.process(corrected);
        if let Some(symbol) = self.timing.process(filtered) {
            self.handle_sync_symbol(symbol, out);
        }
    }

    fn handle_sync_symbol(&mut self, symbol: Complex64, out: &mut Vec<u8>) {
        let carrier_corrected = self.carrier_ekf.process(symbol);
        let is_data = self.pattern_len == 0 || self.pos_in_pattern < self.unknown_len;
        let offset = (self.symbol_offset % 32) as usize;

        if is_data {
            let equalized = self.equalize(carrier_corrected);
            self.carrier_ekf.update_decision_directed(equalized, self.modulation);
            let expected_rotation = tribit_to_symbol(self.probe_scrambler.at(offset));
            let unscrambled = equalized * expected_rotation.conj();
            let soft = soft_demap(unscrambled, self.modulation, self.channel_estimator.soft_scale());
            self.deinterleave_buf.extend(soft);
        } else {
            let reference = tribit_to_symbol(self.probe_scrambler.at(offset));
            self.carrier_ekf.update_probe(carrier_corrected, reference);
            self.probe_ref_buf.push(reference);
            self.probe_rx_buf.push(carrier_corrected);
            if self.probe_ref_buf.len() == self.known_len {
                let estimate = self.channel_estimator.process_probes(&self.probe_rx_buf, &self.probe_ref_buf);
                self.invalid_probe_frames = if estimate.valid { 0 } else { self.invalid_probe_frames + 1 };
                if let EqualizerUnit::Mlse(ref mut mlse) = self.equalizer {
                    mlse.set_channel_taps(&[estimate.gain]);
                }
                self.probe_ref_buf.clear();
                self.probe_rx_buf.clear();
            }
        }

        self.symbol_offset += 1;
        self.pos_in_pattern = if self.pattern_len == 0 { 0 } else { (self.pos_in_pattern + 1) % self.pattern_len };

        if self.deinterleave_buf.len() >= self.block_size {
            self.drain_block();
            self.try_emit_bytes(out);
        }

        let snr_ok = self.channel_estimator.estimate().snr_db >= self.config.snr_floor_db;
        if self.invalid_probe_frames >= self.config.loss_of_sync_frames || !snr_ok {
            self.logger.warn("FRAME", "SYNCHRONIZED -> LOST");
            self.state = ReceiverState::Lost;
        }
    }

    fn equalize(&mut self, symbol: Complex64) -> Complex64 {
        match &mut self.equalizer {
            EqualizerUnit::Lms(dfe) => dfe.process(symbol, None, self.modulation),
            EqualizerUnit::Rls(dfe) => dfe.process(symbol, None, self.modulation),
            EqualizerUnit::ProbeOnly => self.channel_estimator.compensate(symbol),
            EqualizerUnit::Mlse(mlse) => {
                self.mlse_run.push(symbol);
                if self.mlse_run.len() >= self.unknown_len.max(1) {
                    let run = std::mem::take(&mut self.mlse_run);
                    let decided = mlse.equalize(&run);
                    *decided.last().unwrap_or(&symbol)
                } else {
                    symbol
                }
            }
        }
    }

    fn drain_block(&mut self) {
        let block: Vec<i8> = self.deinterleave_buf.drain(0..self.block_size).collect();
        let interleaver = match &self.block_interleaver {
            Some(il) => il,
            None => return,
        };
        let deinterleaved = match interleaver.deinterleave_soft(&block) {
            Ok(bits) => bits,
            Err(_) => return,
        };
        if self.is_uncoded {
            self.combined_soft_bits.extend(deinterleaved);
        } else {
            self.combined_soft_bits.extend(combine_repetition_pairs(&deinterleaved, self.repetition));
        }
    }

    /// Decode the currently-buffered soft bits, emit the stable prefix (more
    /// than `DECODE_MARGIN_BITS` from the trellis tail, where surviving paths
    /// have merged onto the true history), then drop that prefix from
    /// `combined_soft_bits` so the buffer never grows past a couple of
    /// interleaver blocks' worth. Every decode after the first one in a
    /// synchronized run starts from an unknown trellis state rather than the
    /// true history's state 0 — harmless, since the margin already
    /// guarantees convergence by the time a bit is emitted.
    fn try_emit_bytes(&mut self, out: &mut Vec<u8>) {
        if self.is_uncoded {
            while self.combined_soft_bits.len() >= 8 {
                let byte_bits: Vec<u8> = self.combined_soft_bits.drain(0..8).map(|s| (s >= 0) as u8).collect();
                let descrambled = self.bit_scrambler.apply_all(&byte_bits);
                out.extend(bits_to_bytes(&descrambled));
            }
            return;
        }
        if self.combined_soft_bits.is_empty() {
            return;
        }
        let decoder = if self.decoder_continuing { ViterbiDecoder::new_continuing(false) } else { ViterbiDecoder::new(false) };
        let decoded = decoder.decode(&self.combined_soft_bits);
        let stable_len = decoded.len().saturating_sub(DECODE_MARGIN_BITS);
        let emit_upto = (stable_len / 8) * 8;
        if emit_upto == 0 {
            return;
        }
        let descrambled = self.bit_scrambler.apply_all(&decoded[..emit_upto]);
        out.extend(bits_to_bytes(&descrambled));
        self.combined_soft_bits.drain(0..emit_upto * 2);
        self.decoder_continuing = true;
    }

    /// Force-decode everything buffered, assuming no more symbols are
    /// coming (the TX's end-of-message flush has already been received).
    /// Call once after the caller knows the transmission has ended.
    pub fn finish(&mut self) -> Vec<u8> {
        if self.is_uncoded || self.combined_soft_bits.is_empty() {
            return Vec::new();
        }
        let decoder = if self.decoder_continuing { ViterbiDecoder::new_continuing(true) } else { ViterbiDecoder::new(true) };
        let decoded = decoder.decode(&self.combined_soft_bits);
        self.combined_soft_bits.clear();
        let descrambled = self.bit_scrambler.apply_all(&decoded);
        bits_to_bytes(&descrambled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_repetition_pairs_passes_through_at_rate_one() {
        let bits = vec![10i8, -20, 30, -40];
        assert_eq!(combine_repetition_pairs(&bits, 1), bits);
    }

    #[test]
    fn combine_repetition_pairs_sums_repeated_groups() {
        let bits = vec![10i8, -5, 10, -5, 10, -5];
        let combined = combine_repetition_pairs(&bits, 3);
        assert_eq!(combined, vec![30, -15]);
    }

    #[test]
    fn new_receiver_starts_searching() {
        let cfg = ReceiverConfig::default();
        let rx = Receiver::new(cfg).unwrap();
        assert_eq!(rx.state(), ReceiverState::Searching);
        assert!(rx.mode().is_none());
    }

    #[test]
    fn reset_returns_to_searching() {
        let cfg = ReceiverConfig::default();
        let mut rx = Receiver::new(cfg).unwrap();
        rx.state = ReceiverState::Lost;
        rx.reset();
        assert_eq!(rx.state(), ReceiverState::Searching);
    }
}
