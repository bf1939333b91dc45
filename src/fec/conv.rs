//! Convolutional encoder (K=7, rate 1/2, generators 133₈/171₈) and its
//! matching 64-state Viterbi decoder.

const NUM_STATES: usize = 64;
const G1: u8 = 0x5B; // octal 133
const G2: u8 = 0x79; // octal 171

fn transition(state: u8, bit: u8) -> (u8, u8, u8) {
    let reg = ((bit & 1) << 6) | state;
    let o1 = (reg & G1).count_ones() as u8 & 1;
    let o2 = (reg & G2).count_ones() as u8 & 1;
    let next = (state >> 1) | ((bit & 1) << 5);
    (next, o1, o2)
}

/// Rate-1/2 K=7 convolutional encoder. Always starts at the all-zero state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvEncoder {
    state: u8,
}

impl ConvEncoder {
    pub fn new() -> Self {
        Self { state: 0 }
    }

    /// Encode one input bit, returning the two coded output bits.
    pub fn encode_bit(&mut self, bit: u8) -> (u8, u8) {
        let (next, o1, o2) = transition(self.state, bit);
        self.state = next;
        (o1, o2)
    }

    /// Encode a bit sequence, interleaving `o1, o2` per input bit.
    pub fn encode(&mut self, bits: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(bits.len() * 2);
        for &b in bits {
            let (o1, o2) = self.encode_bit(b);
            out.push(o1);
            out.push(o2);
        }
        out
    }

    /// Encode with a 6-bit all-zero flush so the trellis returns to state 0.
    pub fn encode_with_flush(&mut self, bits: &[u8]) -> Vec<u8> {
        let mut all = Vec::with_capacity(bits.len() + 6);
        all.extend_from_slice(bits);
        all.extend(std::iter::repeat(0u8).take(6));
        self.encode(&all)
    }
}

/// Soft-input, hard-output Viterbi decoder matching [`ConvEncoder`]. Runs a
/// traceback over whatever window of soft bits it's given; the frame engine
/// keeps that window bounded to a few interleaver blocks (see
/// `receiver.rs::DECODE_MARGIN_BITS`) rather than the whole transmission.
pub struct ViterbiDecoder {
    flushed: bool,
    known_start_state: Option<u8>,
}

impl ViterbiDecoder {
    /// `flushed`: whether the encoder appended the 6-bit zero flush, forcing
    /// the final state to 0. When `false` the globally best final state wins.
    /// Assumes the window starts at the encoder's true reset state (state 0).
    pub fn new(flushed: bool) -> Self {
        Self { flushed, known_start_state: Some(0) }
    }

    /// Like [`Self::new`], but for a window whose start doesn't align with
    /// the encoder's reset point — a continuously-running code truncated to
    /// a sliding window. All 64 states start at equal metric; by
    /// `DECODE_MARGIN_BITS` branches in, the surviving paths have merged onto
    /// the true history regardless of which state they started from, so the
    /// stable prefix decodes the same as a full-history traceback would.
    pub fn new_continuing(flushed: bool) -> Self {
        Self { flushed, known_start_state: None }
    }

    /// Decode soft bits (sign: positive means bit=1 more likely) into hard
    /// bits. `soft_bits.len()` must be even; returns `coded_bits/2` decoded
    /// bits (minus the 6 flush bits when `flushed`).
    pub fn decode(&self, soft_bits: &[i8]) -> Vec<u8> {
        assert_eq!(soft_bits.len() % 2, 0, "soft bit stream must pair up into branches");
        let branches = soft_bits.len() / 2;
        if branches == 0 {
            return Vec::new();
        }

        let mut metric = match self.known_start_state {
            Some(s) => {
                let mut m = [f64::INFINITY; NUM_STATES];
                m[s as usize] = 0.0;
                m
            }
            None => [0.0; NUM_STATES],
        };
        let mut predecessors: Vec<[Option<(u8, u8)>; NUM_STATES]> = Vec::with_capacity(branches);

        for b in 0..branches {
            let s1 = soft_bits[2 * b] as f64;
            let s2 = soft_bits[2 * b + 1] as f64;
            let mut next_metric = [f64::INFINITY; NUM_STATES];
            let mut step_pred: [Option<(u8, u8)>; NUM_STATES] = [None; NUM_STATES];

            for state in 0..NUM_STATES {
                if !metric[state].is_finite() {
                    continue;
                }
                for bit in 0..2u8 {
                    let (next, o1, o2) = transition(state as u8, bit);
                    let expected1 = if o1 == 1 { 1.0 } else { -1.0 };
                    let expected2 = if o2 == 1 { 1.0 } else { -1.0 };
                    let branch_cost = -(expected1 * s1 + expected2 * s2);
                    let candidate = metric[state] + branch_cost;
                    let next = next as usize;
                    if candidate < next_metric[next] {
                        next_metric[next] = candidate;
                        step_pred[next] = Some((state as u8, bit));
                    }
                }
            }
            metric = next_metric;
            predecessors.push(step_pred);
        }

        let mut state = if self.flushed {
            0u8
        } else {
            metric
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(s, _)| s as u8)
                .unwrap_or(0)
        };

        let mut bits = vec![0u8; branches];
        for b in (0..branches).rev() {
            let (prev, bit) = predecessors[b][state as usize].unwrap_or((0, 0));
            bits[b] = bit;
            state = prev;
        }

        if self.flushed {
            bits.truncate(bits.len().saturating_sub(6));
        }
        bits
    }
}

/// Convert hard bits (0/1) to maximum-confidence soft bits, useful for
/// noiseless round-trip tests.
pub fn hard_to_soft(bits: &[u8]) -> Vec<i8> {
    bits.iter().map(|&b| if b == 1 { 127 } else { -127 }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noiseless_roundtrip_recovers_input_exactly() {
        let input: Vec<u8> = (0..200).map(|i| ((i * 7 + 3) % 5 == 0) as u8).collect();
        let mut enc = ConvEncoder::new();
        let coded = enc.encode_with_flush(&input);
        let soft = hard_to_soft(&coded);
        let decoded = ViterbiDecoder::new(true).decode(&soft);
        assert_eq!(decoded, input);
    }

    #[test]
    fn flush_returns_trellis_to_zero_state() {
        let mut enc = ConvEncoder::new();
        let input = vec![1u8, 0, 1, 1, 0, 0, 1];
        enc.encode_with_flush(&input);
        assert_eq!(enc.state, 0);
    }

    #[test]
    fn tolerates_moderate_soft_bit_errors() {
        let input: Vec<u8> = (0..500).map(|i| (i % 3 == 0) as u8).collect();
        let mut enc = ConvEncoder::new();
        let coded = enc.encode_with_flush(&input);
        let mut soft = hard_to_soft(&coded);
        // Flip the confidence (not the sign) of a few bits to emulate mild noise.
        for i in (0..soft.len()).step_by(37) {
            soft[i] = soft[i].saturating_div(4);
        }
        let decoded = ViterbiDecoder::new(true).decode(&soft);
        assert_eq!(decoded, input);
    }
}
