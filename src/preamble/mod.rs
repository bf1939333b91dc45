//! Preamble codec (component C): build and parse the per-frame 480-symbol
//! preamble (common/mode/count/zero segments) and the 3- or 24-frame
//! preamble sequence.

use crate::fec::scrambler::ProbeScrambler;

pub const COMMON_SYMBOLS: usize = 288;
pub const MODE_SYMBOLS: usize = 64;
pub const COUNT_SYMBOLS: usize = 96;
pub const ZERO_SYMBOLS: usize = 32;
pub const FRAME_SYMBOLS: usize = COMMON_SYMBOLS + MODE_SYMBOLS + COUNT_SYMBOLS + ZERO_SYMBOLS;

/// The fixed 9-element D-sequence selecting among the eight Walsh-like base
/// patterns for the common segment.
pub const D_SEQUENCE: [u8; 9] = [0, 1, 3, 0, 1, 3, 1, 2, 0];

/// Eight 8-element Walsh-like base patterns (a Hadamard matrix of order 8,
/// `true` = 0 degrees, `false` = 180 degrees), the building blocks for the
/// common, mode, and count segments.
const WALSH: [[bool; 8]; 8] = [
    [true, true, true, true, true, true, true, true],
    [true, false, true, false, true, false, true, false],
    [true, true, false, false, true, true, false, false],
    [true, false, false, true, true, false, false, true],
    [true, true, true, true, false, false, false, false],
    [true, false, true, false, false, true, false, true],
    [true, true, false, false, false, false, true, true],
    [true, false, false, true, false, true, true, false],
];

fn walsh_tribit(pattern_index: u8, position: usize) -> u8 {
    if WALSH[pattern_index as usize % 8][position % 8] {
        0
    } else {
        4
    }
}

/// Builds the tribit stream for one or more preamble frames, scrambled with
/// a continuously advancing offset (the scrambler never resets mid-preamble,
/// and the data phase that follows continues the same counter).
pub struct PreambleEncoder<'a> {
    scrambler: &'a ProbeScrambler,
}

impl<'a> PreambleEncoder<'a> {
    pub fn new(scrambler: &'a ProbeScrambler) -> Self {
        Self { scrambler }
    }

    fn build_segment(&self, pattern_indices: &[u8], offset: &mut usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(pattern_indices.len() * 32);
        for &d in pattern_indices {
            for rep in 0..32 {
                let tribit = walsh_tribit(d, rep);
                out.push(self.scrambler.scramble(tribit, *offset));
                *offset += 1;
            }
        }
        out
    }

    /// Encode one 480-symbol preamble frame; `countdown` is the number of
    /// remaining frames, taken modulo 8 since the count segment can only
    /// address one of the eight base patterns.
    pub fn encode_frame(&self, d1: u8, d2: u8, countdown: u8, offset: &mut usize) -> Vec<u8> {
        let countdown = countdown % 8;
        let mut frame = Vec::with_capacity(FRAME_SYMBOLS);
        frame.extend(self.build_segment(&D_SEQUENCE, offset));
        frame.extend(self.build_segment(&[d1, d2], offset));
        frame.extend(self.build_segment(&[countdown, countdown, countdown], offset));
        frame.extend(self.build_segment(&[0], offset));
        frame
    }

    /// Encode the full short (3-frame) or long (24-frame) preamble.
    pub fn encode(&self, d1: u8, d2: u8, num_frames: u32) -> Vec<u8> {
        let mut offset = 0usize;
        let mut out = Vec::with_capacity(num_frames as usize * FRAME_SYMBOLS);
        for frame_idx in 0..num_frames {
            let countdown = (num_frames - 1 - frame_idx) as u8;
            out.extend(self.encode_frame(d1, d2, countdown, &mut offset));
        }
        out
    }
}

/// Result of decoding a base-pattern-coded segment: best-matching pattern
/// index plus a vote tally out of the total symbols compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternVote {
    pub value: u8,
    pub votes: usize,
    pub total: usize,
}

impl PatternVote {
    pub fn confidence(&self) -> f64 {
        self.votes as f64 / self.total.max(1) as f64
    }
}

fn best_pattern_match(descrambled: &[u8]) -> PatternVote {
    let mut best = PatternVote { value: 0, votes: 0, total: descrambled.len() };
    for d in 0..8u8 {
        let votes = descrambled
            .iter()
            .enumerate()
            .filter(|&(i, &sym)| sym == walsh_tribit(d, i))
            .count();
        if votes > best.votes {
            best = PatternVote { value: d, votes, total: descrambled.len() };
        }
    }
    best
}

/// Decoded content of one 480-symbol preamble frame.
#[derive(Debug, Clone, Copy)]
pub struct PreambleFrameInfo {
    pub common: PatternVote,
    pub d1: PatternVote,
    pub d2: PatternVote,
    pub countdown: PatternVote,
}

pub struct PreambleDecoder<'a> {
    scrambler: &'a ProbeScrambler,
}

impl<'a> PreambleDecoder<'a> {
    pub fn new(scrambler: &'a ProbeScrambler) -> Self {
        Self { scrambler }
    }

    fn descramble(&self, tribits: &[u8], offset: usize) -> Vec<u8> {
        tribits
            .iter()
            .enumerate()
            .map(|(i, &t)| self.scrambler.descramble(t, offset + i))
            .collect()
    }

    /// Decode one 480-tribit frame, given the running scrambler offset at
    /// the start of the frame.
    pub fn decode_frame(&self, frame: &[u8], frame_offset: usize) -> Option<PreambleFrameInfo> {
        if frame.len() != FRAME_SYMBOLS {
            return None;
        }
        let common = &frame[0..COMMON_SYMBOLS];
        let mode = &frame[COMMON_SYMBOLS..COMMON_SYMBOLS + MODE_SYMBOLS];
        let count = &frame[COMMON_SYMBOLS + MODE_SYMBOLS..COMMON_SYMBOLS + MODE_SYMBOLS + COUNT_SYMBOLS];

        let common_descrambled = self.descramble(common, frame_offset);
        let common_vote = common_d_sequence_vote(&common_descrambled);

        let d1_descrambled = self.descramble(&mode[0..32], frame_offset + COMMON_SYMBOLS);
        let d2_descrambled = self.descramble(&mode[32..64], frame_offset + COMMON_SYMBOLS + 32);
        let d1 = best_pattern_match(&d1_descrambled);
        let d2 = best_pattern_match(&d2_descrambled);

        let count_offset = frame_offset + COMMON_SYMBOLS + MODE_SYMBOLS;
        let votes: Vec<PatternVote> = (0..3)
            .map(|i| {
                let chunk = self.descramble(&count[i * 32..(i + 1) * 32], count_offset + i * 32);
                best_pattern_match(&chunk)
            })
            .collect();
        let countdown = majority_countdown(&votes);

        Some(PreambleFrameInfo { common: common_vote, d1, d2, countdown })
    }
}

/// Score the common segment against the expected D-sequence pattern, used
/// by acquisition to localize the frame boundary.
fn common_d_sequence_vote(descrambled: &[u8]) -> PatternVote {
    let mut votes = 0;
    for (rep, &d) in D_SEQUENCE.iter().enumerate() {
        for pos in 0..32 {
            let expected = walsh_tribit(d, pos);
            if descrambled[rep * 32 + pos] == expected {
                votes += 1;
            }
        }
    }
    PatternVote { value: 0, votes, total: descrambled.len() }
}

fn majority_countdown(votes: &[PatternVote]) -> PatternVote {
    let total_votes: usize = votes.iter().map(|v| v.votes).sum();
    let total: usize = votes.iter().map(|v| v.total).sum();
    // Majority value across the three repetitions; ties resolve to the
    // first-seen (lowest index) repetition's value.
    let mut counts = [0usize; 8];
    for v in votes {
        counts[v.value as usize] += 1;
    }
    let value = counts
        .iter()
        .enumerate()
        .max_by_key(|&(_, &c)| c)
        .map(|(v, _)| v as u8)
        .unwrap_or(0);
    PatternVote { value, votes: total_votes, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_normative_segment_lengths() {
        let scr = ProbeScrambler::new();
        let enc = PreambleEncoder::new(&scr);
        let mut offset = 0;
        let frame = enc.encode_frame(6, 4, 2, &mut offset);
        assert_eq!(frame.len(), FRAME_SYMBOLS);
        assert_eq!(offset, FRAME_SYMBOLS);
    }

    #[test]
    fn short_preamble_is_three_frames() {
        let scr = ProbeScrambler::new();
        let enc = PreambleEncoder::new(&scr);
        let symbols = enc.encode(6, 4, 3);
        assert_eq!(symbols.len(), 3 * 480);
    }

    #[test]
    fn long_preamble_is_24_frames() {
        let scr = ProbeScrambler::new();
        let enc = PreambleEncoder::new(&scr);
        let symbols = enc.encode(4, 4, 24);
        assert_eq!(symbols.len(), 24 * 480);
    }

    #[test]
    fn decode_recovers_d1_d2_and_countdown_noiselessly() {
        let scr = ProbeScrambler::new();
        let enc = PreambleEncoder::new(&scr);
        let dec = PreambleDecoder::new(&scr);
        let symbols = enc.encode(6, 4, 3);

        for (frame_idx, frame) in symbols.chunks(FRAME_SYMBOLS).enumerate() {
            let info = dec.decode_frame(frame, frame_idx * FRAME_SYMBOLS).unwrap();
            assert_eq!(info.d1.value, 6);
            assert_eq!(info.d2.value, 4);
            assert_eq!(info.d1.confidence(), 1.0);
            assert_eq!(info.d2.confidence(), 1.0);
            let expected_countdown = (2 - frame_idx) as u8 % 8;
            assert_eq!(info.countdown.value, expected_countdown);
        }
    }

    #[test]
    fn common_segment_scores_full_confidence_noiselessly() {
        let scr = ProbeScrambler::new();
        let enc = PreambleEncoder::new(&scr);
        let dec = PreambleDecoder::new(&scr);
        let symbols = enc.encode(7, 6, 1);
        let info = dec.decode_frame(&symbols, 0).unwrap();
        assert_eq!(info.common.votes, info.common.total);
    }
}
