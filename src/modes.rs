//! The closed set of sixteen MIL-STD-188-110A Appendix C modes and their
//! immutable descriptors: data rate, modulation, interleaver rectangle,
//! frame pattern, and D1/D2 mode-identification tribits.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Modulation alphabet used for data symbols. Probe symbols are always 8-PSK
/// regardless of this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    Bpsk,
    Qpsk,
    Psk8,
}

impl Modulation {
    /// Constellation order (number of points).
    pub const fn order(self) -> usize {
        match self {
            Modulation::Bpsk => 2,
            Modulation::Qpsk => 4,
            Modulation::Psk8 => 8,
        }
    }

    /// Bits carried per symbol.
    pub const fn bits_per_symbol(self) -> usize {
        match self {
            Modulation::Bpsk => 1,
            Modulation::Qpsk => 2,
            Modulation::Psk8 => 3,
        }
    }

    /// Tribit label subset a symbol of this modulation may take.
    pub const fn tribit_labels(self) -> &'static [u8] {
        match self {
            Modulation::Bpsk => &[0, 4],
            Modulation::Qpsk => &[0, 2, 4, 6],
            Modulation::Psk8 => &[0, 1, 2, 3, 4, 5, 6, 7],
        }
    }
}

/// Interleave depth class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterleaveKind {
    None,
    Short,
    Long,
    Voice,
}

/// The block-interleaver rectangle for one mode. `rows` and `cols` are
/// coprime in every specified mode so the row-major-write /
/// column-major-with-increment-read mapping is a bijection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterleaverParams {
    pub rows: usize,
    pub cols: usize,
    pub row_inc: usize,
    pub col_inc: usize,
    pub block_count_mod: usize,
}

impl InterleaverParams {
    pub const fn block_size(&self) -> usize {
        self.rows * self.cols
    }
}

/// Closed enumeration of the sixteen modes, named `M{rate}{suffix}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeId {
    M75NS,
    M75NL,
    M150S,
    M150L,
    M300S,
    M300L,
    M600S,
    M600L,
    M600V,
    M1200S,
    M1200L,
    M1200V,
    M2400S,
    M2400L,
    M2400V,
    M4800S,
}

impl ModeId {
    pub const ALL: [ModeId; 16] = [
        ModeId::M75NS,
        ModeId::M75NL,
        ModeId::M150S,
        ModeId::M150L,
        ModeId::M300S,
        ModeId::M300L,
        ModeId::M600S,
        ModeId::M600L,
        ModeId::M600V,
        ModeId::M1200S,
        ModeId::M1200L,
        ModeId::M1200V,
        ModeId::M2400S,
        ModeId::M2400L,
        ModeId::M2400V,
        ModeId::M4800S,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModeId::M75NS => "M75NS",
            ModeId::M75NL => "M75NL",
            ModeId::M150S => "M150S",
            ModeId::M150L => "M150L",
            ModeId::M300S => "M300S",
            ModeId::M300L => "M300L",
            ModeId::M600S => "M600S",
            ModeId::M600L => "M600L",
            ModeId::M600V => "M600V",
            ModeId::M1200S => "M1200S",
            ModeId::M1200L => "M1200L",
            ModeId::M1200V => "M1200V",
            ModeId::M2400S => "M2400S",
            ModeId::M2400L => "M2400L",
            ModeId::M2400V => "M2400V",
            ModeId::M4800S => "M4800S",
        }
    }

    pub fn from_name(name: &str) -> Result<ModeId, ConfigError> {
        ModeId::ALL
            .into_iter()
            .find(|m| m.name() == name)
            .ok_or_else(|| ConfigError::UnknownMode(name.to_string()))
    }

    /// Look up by the D1/D2 tribit pair reported in a decoded preamble.
    /// Several modes share a (D1, D2) pair (e.g. M600S/M600V); the caller
    /// supplies which interleave class it expects (from data-phase framing
    /// or explicit configuration) to disambiguate.
    pub fn from_d1d2(d1: u8, d2: u8, prefer: InterleaveKind) -> Option<ModeId> {
        ModeId::ALL
            .into_iter()
            .filter(|m| {
                let d = m.descriptor();
                d.d1 == d1 && d.d2 == d2
            })
            .min_by_key(|m| if m.descriptor().interleave == prefer { 0 } else { 1 })
    }

    pub fn descriptor(self) -> &'static ModeDescriptor {
        &MODE_TABLE[self as usize]
    }
}

/// Immutable configuration for one mode. Constructed once in [`MODE_TABLE`].
#[derive(Debug, Clone, Copy)]
pub struct ModeDescriptor {
    pub id: ModeId,
    pub bps: u32,
    pub modulation: Modulation,
    /// Bit-repetition factor: each coded bit is transmitted this many times.
    pub repetition: u32,
    pub interleave: InterleaveKind,
    pub interleaver: InterleaverParams,
    pub preamble_frames: u32,
    /// Unknown (data) symbols per data/probe pattern; 0 for the 75 bps
    /// modes, which carry no probe symbols at all.
    pub unknown_len: usize,
    /// Known (probe) symbols per pattern.
    pub known_len: usize,
    pub d1: u8,
    pub d2: u8,
    /// Symbol rate in baud; always 2400 for Appendix C.
    pub symbol_rate: u32,
}

impl ModeDescriptor {
    pub const fn symbols_per_frame(&self) -> usize {
        480
    }

    /// Data symbols delivered per 480-symbol frame.
    pub const fn data_symbols_per_frame(&self) -> usize {
        if self.unknown_len == 0 {
            return self.symbols_per_frame();
        }
        let pattern_len = self.unknown_len + self.known_len;
        let patterns_per_frame = self.symbols_per_frame() / pattern_len;
        patterns_per_frame * self.unknown_len
    }

    pub const fn probe_symbols_per_frame(&self) -> usize {
        self.symbols_per_frame() - self.data_symbols_per_frame()
    }

    pub fn preamble_symbols(&self) -> usize {
        self.preamble_frames as usize * 480
    }

    /// `true` for the single uncoded mode (4800 bps): no convolutional
    /// encoder, symbols map straight from scrambled tribits.
    pub const fn is_uncoded(&self) -> bool {
        self.bps == 4800
    }
}

macro_rules! mode {
    ($id:expr, $bps:expr, $modulation:expr, $repetition:expr, $interleave:expr,
     $rows:expr, $cols:expr, $row_inc:expr, $col_inc:expr, $block_count_mod:expr,
     $preamble_frames:expr, $unknown_len:expr, $known_len:expr, $d1:expr, $d2:expr) => {
        ModeDescriptor {
            id: $id,
            bps: $bps,
            modulation: $modulation,
            repetition: $repetition,
            interleave: $interleave,
            interleaver: InterleaverParams {
                rows: $rows,
                cols: $cols,
                row_inc: $row_inc,
                col_inc: $col_inc,
                block_count_mod: $block_count_mod,
            },
            preamble_frames: $preamble_frames,
            unknown_len: $unknown_len,
            known_len: $known_len,
            d1: $d1,
            d2: $d2,
            symbol_rate: 2400,
        }
    };
}

/// The sixteen normative mode descriptors, indexed identically to
/// [`ModeId::ALL`]. Values transcribed from the MIL-STD-188-110A Appendix C
/// mode table; row/column/increment values are exactly those of a working
/// reference implementation of this waveform.
pub static MODE_TABLE: [ModeDescriptor; 16] = [
    mode!(ModeId::M75NS, 75, Modulation::Bpsk, 32, InterleaveKind::Short, 10, 9, 7, 2, 45, 3, 0, 0, 0, 0),
    mode!(ModeId::M75NL, 75, Modulation::Bpsk, 32, InterleaveKind::Long, 20, 36, 7, 29, 360, 24, 0, 0, 0, 0),
    mode!(ModeId::M150S, 150, Modulation::Bpsk, 4, InterleaveKind::Short, 40, 18, 9, 1, 36, 3, 20, 20, 7, 4),
    mode!(ModeId::M150L, 150, Modulation::Bpsk, 4, InterleaveKind::Long, 40, 144, 9, 127, 288, 24, 20, 20, 5, 4),
    mode!(ModeId::M300S, 300, Modulation::Bpsk, 2, InterleaveKind::Short, 40, 18, 9, 1, 36, 3, 20, 20, 6, 7),
    mode!(ModeId::M300L, 300, Modulation::Bpsk, 2, InterleaveKind::Long, 40, 144, 9, 127, 288, 24, 20, 20, 4, 7),
    mode!(ModeId::M600S, 600, Modulation::Bpsk, 1, InterleaveKind::Short, 40, 18, 9, 1, 36, 3, 20, 20, 6, 6),
    mode!(ModeId::M600L, 600, Modulation::Bpsk, 1, InterleaveKind::Long, 40, 144, 9, 127, 288, 24, 20, 20, 4, 6),
    mode!(ModeId::M600V, 600, Modulation::Bpsk, 1, InterleaveKind::Voice, 40, 18, 9, 1, 36, 3, 20, 20, 6, 6),
    mode!(ModeId::M1200S, 1200, Modulation::Qpsk, 1, InterleaveKind::Short, 40, 36, 9, 19, 36, 3, 20, 20, 6, 5),
    mode!(ModeId::M1200L, 1200, Modulation::Qpsk, 1, InterleaveKind::Long, 40, 288, 9, 271, 288, 24, 20, 20, 4, 5),
    mode!(ModeId::M1200V, 1200, Modulation::Qpsk, 1, InterleaveKind::Voice, 40, 36, 9, 19, 36, 3, 20, 20, 6, 5),
    mode!(ModeId::M2400S, 2400, Modulation::Psk8, 1, InterleaveKind::Short, 40, 72, 9, 55, 30, 3, 32, 16, 6, 4),
    mode!(ModeId::M2400L, 2400, Modulation::Psk8, 1, InterleaveKind::Long, 40, 576, 9, 559, 240, 24, 32, 16, 4, 4),
    mode!(ModeId::M2400V, 2400, Modulation::Psk8, 1, InterleaveKind::Voice, 40, 72, 0, 0, 30, 3, 32, 16, 6, 4),
    mode!(ModeId::M4800S, 4800, Modulation::Psk8, 1, InterleaveKind::Short, 40, 72, 0, 0, 30, 3, 32, 16, 7, 6),
];
