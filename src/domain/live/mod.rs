//! Live session domain module

mod frame;
mod scenario;
mod status;

pub use frame::{RealtimeFrame, ServerEvent};
pub use scenario::{InputSource, Scenario, SCENARIOS};
pub use status::LiveStatus;
