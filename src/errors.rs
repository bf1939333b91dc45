//! Error types for the modem core, grouped by subsystem.

use thiserror::Error;

/// Top-level error type for all modem operations.
#[derive(Debug, Error)]
pub enum ModemError {
    #[error("FEC error: {0}")]
    Fec(#[from] FecError),

    #[error("DSP error: {0}")]
    Dsp(#[from] DspError),

    #[error("preamble error: {0}")]
    Preamble(#[from] PreambleError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

/// Errors from the convolutional encoder / Viterbi decoder / interleaver / scrambler chain.
#[derive(Debug, Error)]
pub enum FecError {
    #[error("block size mismatch: expected {expected} bits, got {actual}")]
    BlockSizeMismatch { expected: usize, actual: usize },

    #[error("interleaver rectangle ({rows}x{cols}) is not coprime, mapping is not a bijection")]
    NonCoprimeRectangle { rows: usize, cols: usize },

    #[error("soft-bit buffer too short for deinterleave: need {required}, have {available}")]
    InsufficientSoftBits { required: usize, available: usize },

    #[error("invalid tribit value {value}, must be in 0..8")]
    InvalidTribit { value: u8 },
}

/// Errors from the baseband DSP primitives (filters, NCO, resamplers).
#[derive(Debug, Error)]
pub enum DspError {
    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },

    #[error("resampler ratio {p}/{q} is degenerate")]
    InvalidResampleRatio { p: usize, q: usize },

    #[error("buffer underrun: requested {requested}, available {available}")]
    BufferUnderrun { requested: usize, available: usize },

    #[error("buffer overflow: capacity {capacity}, attempted write of {size}")]
    BufferOverflow { capacity: usize, size: usize },
}

/// Errors from preamble construction/parsing.
#[derive(Debug, Error)]
pub enum PreambleError {
    #[error("segment length mismatch: expected {expected}, got {actual}")]
    SegmentLengthMismatch { expected: usize, actual: usize },

    #[error("D1/D2 confidence below threshold: {votes}/{total} votes")]
    LowConfidence { votes: usize, total: usize },
}

/// Configuration errors, fatal at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown mode name: {0}")]
    UnknownMode(String),

    #[error("sample rate {sample_rate} Hz does not reduce to an integer samples-per-symbol at {symbol_rate} baud")]
    NonIntegerSamplesPerSymbol { sample_rate: f64, symbol_rate: f64 },

    #[error("invalid channel bandwidth: {khz} kHz (only 3 kHz voice channels are supported)")]
    UnsupportedBandwidth { khz: u32 },

    #[error("contradictory configuration: {reason}")]
    Contradictory { reason: String },
}

/// Errors from the external-interface layer (.iqr/WAV parsing, sample sources).
#[derive(Debug, Error)]
pub enum IoError {
    #[error("malformed .iqr header: {reason}")]
    MalformedIqrHeader { reason: String },

    #[error("unsupported WAV format: {reason}")]
    UnsupportedWav { reason: String },

    #[error("insufficient samples: need {required}, have {available}")]
    Insufficient { required: usize, available: usize },
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ModemError>;
