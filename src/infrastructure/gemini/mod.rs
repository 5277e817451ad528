//! Gemini API adapters

mod generate;
mod live;

pub use generate::GeminiChatModel;
pub use live::GeminiLiveConnector;
