pub mod batcher;
pub mod event;

pub use batcher::Batcher;
pub use event::{AlertEvent, BatchKey};
