//! Optional routine summarization
//!
//! A summarizer maps routine source text to a short description. It is a
//! replaceable collaborator: extraction never depends on it succeeding.

mod summarizer;
mod providers;

pub use summarizer::{RoutineSummarizer, describe_routine};
pub use providers::create_summarizer;
