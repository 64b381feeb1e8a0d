pub mod engine;
pub mod outcome;

pub use engine::{aggregate_device, classify, summarize};
pub use outcome::{Classification, ColorHint, DeviceStatus, Status};
