//! Tracking & equalization (component E): timing recovery, carrier
//! tracking, channel estimation, and equalization, run continuously once
//! the receiver has synchronized to a frame.

pub mod carrier;
pub mod channel_estimate;
pub mod equalizer;
pub mod timing;

pub use carrier::{CarrierPll, EkfCarrierTracker};
pub use channel_estimate::{ChannelEstimate, ChannelEstimator};
pub use equalizer::{EqualizerKind, LmsDfe, MlseEqualizer, RlsDfe};
pub use timing::{TedKind, TimingRecovery};
