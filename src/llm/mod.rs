pub mod generator;
pub mod orchestrator;
pub mod prompts;

#[cfg(feature = "gemini")]
pub mod client;
#[cfg(feature = "gemini")]
pub mod types;

pub use generator::*;
pub use orchestrator::*;

#[cfg(feature = "gemini")]
pub use client::*;
