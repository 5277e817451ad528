//! Chat domain module

mod message;
mod model_tier;

pub use message::{ChatMessage, Role, Transcript};
pub use model_tier::{ModelTier, ALL_TIERS};
