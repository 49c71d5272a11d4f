//! Client for the externally hosted language-model classifier.
//!
//! The classifier is a black-box collaborator: post text in, structured
//! judgment out. This crate owns the wire contract (chat-completions
//! payload, fenced-JSON unwrapping, token accounting) and the in-call retry
//! policy; the at-least-once retry across runs belongs to the pipeline.

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

mod retry;

pub use client::{strip_code_fence, ClassifierClient};
pub use error::ClassifierError;
pub use prompt::build_system_prompt;
pub use types::{ClassifierConfig, ClassifierOutcome, ClassifyInput, Judgment, TokenUsage};
