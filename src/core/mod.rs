// src/core/mod.rs
mod engine;
mod model;
mod dictionary;
mod source_slicer;
mod dependency;
mod catalog_builder;
mod table_analyzer;
mod graph;
mod render;
mod llm;

/// Distinct values are sampled only for columns with fewer distinct values than this
pub const SAMPLE_LIMIT: usize = 20;

pub use engine::Engine;
