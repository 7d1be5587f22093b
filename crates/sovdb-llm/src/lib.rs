//! Client for the generative-AI completion API.
//!
//! Onboarding uses it to analyze a brand's website, draft tracked prompts,
//! and refine them; the dashboard uses it for narrative visibility
//! summaries. All calls go through one [`CompletionClient`] with
//! transient-only retry.

mod client;
mod error;
mod parse;
mod retry;

pub use client::{CompletionClient, WebsiteAnalysis};
pub use error::LlmError;
pub use parse::parse_prompt_list;
