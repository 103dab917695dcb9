pub mod link;
pub mod mode;
pub mod processor;
pub mod queue;
pub mod rate_bridge;

pub use link::{LinkState, TxText};
pub use mode::Mode;
pub use processor::FrameProcessor;
pub use queue::SampleQueue;
pub use rate_bridge::{ChannelLayout, Direction, SampleRateBridge};
