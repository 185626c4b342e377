//! Output artifacts: JSON catalogs and Markdown pages

mod markdown;
mod writer;

pub use markdown::MarkdownRenderer;
pub use writer::OutputWriter;
