//! Vivavoce - real-time AI voice conversation CLI
//!
//! This crate provides live bidirectional voice/video sessions against
//! Google Gemini Live, a turn-based chat mode, local recording with
//! cloud export, and a small identity layer with a guest fallback.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core value objects, entities, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (Gemini, cpal, rodio, Drive, etc.)
//! - **CLI**: Command-line interface, argument parsing, and signal handling

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
