//! MIL-STD-188-110A Appendix C serial-tone HF modem core.
//!
//! The modules mirror the system's component letters: FEC/interleave/
//! scramble/map (`fec`), baseband DSP primitives (`dsp`), the preamble
//! codec (`preamble`), acquisition (`acquisition`), tracking and
//! equalization (`tracking`), the frame-synchronous receiver
//! (`receiver`), and its transmit counterpart (`transmitter`). `io`
//! implements the external interface contracts (`.iqr`, WAV, the sample
//! source trait); `channel` is a test-only HF channel simulator.

pub mod acquisition;
pub mod channel;
pub mod config;
pub mod dsp;
pub mod errors;
pub mod fec;
pub mod io;
pub mod logging;
pub mod modes;
pub mod preamble;
pub mod receiver;
pub mod tracking;
pub mod transmitter;
pub mod utils;

pub use config::{LoopGains, ReceiverConfig, TransmitterConfig};
pub use errors::{ModemError, Result};
pub use modes::{ModeDescriptor, ModeId, Modulation};
pub use receiver::{Receiver, ReceiverState};
pub use transmitter::Transmitter;
