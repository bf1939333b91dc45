//! External interfaces (component IO): the `.iqr`/WAV file formats, the
//! pull-based `SampleSource` contract, and the bounded ring that decouples
//! a sample-producing thread from the pipeline. Everything here is a
//! stable interface contract per spec; the hardware/device back-ends
//! behind it are out of scope.

pub mod iqr;
pub mod ring;
pub mod sample_source;
pub mod wav;

pub use iqr::{read_iqr, write_iqr, IqrHeader};
pub use ring::SampleRing;
pub use sample_source::{AudioSampleSource, IqrFileSource, RingSource, SampleSource, SourceType};
pub use wav::{read_wav, write_wav_mono_i16, WavFormat};
