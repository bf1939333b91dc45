//! Symbol/FEC/interleave/scramble chain (component A): convolutional
//! encode/Viterbi decode, the block interleaver, both scrambler forms, and
//! the absolute-phase PSK mapper.

pub mod conv;
pub mod interleave;
pub mod mapper;
pub mod scrambler;

pub use conv::{ConvEncoder, ViterbiDecoder};
pub use interleave::BlockInterleaver;
pub use mapper::{bits_to_tribit, soft_demap, symbol_to_tribit, tribit_to_bits, tribit_to_symbol};
pub use scrambler::{BitScrambler, ProbeScrambler};
