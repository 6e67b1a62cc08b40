//! Text-generation provider
//!
//! The pipeline talks to a [`TextGenerator`]; [`ChatClient`] implements it
//! over an OpenAI-compatible chat-completions endpoint.

mod client;
mod models;

pub use client::{ChatClient, TextGenerator};
pub use models::Usage;
