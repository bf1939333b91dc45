//! Baseband DSP primitives (component B): SRRC pulse shaping, FIR filters,
//! the NCO, and integer/rational resampling.

pub mod fir;
pub mod nco;
pub mod resample;
pub mod srrc;

pub use fir::{FirFilterComplex, FirFilterReal};
pub use nco::Nco;
pub use resample::{Decimator, Interpolator, RationalResampler};
pub use srrc::SrrcFilter;
