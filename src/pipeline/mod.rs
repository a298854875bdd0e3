//! Batched map-reduce pipeline: classify reviews into themes, summarize
//! per theme, and assemble a bounded weekly pulse document.

pub mod assembler;
pub mod batch;
pub mod classifier;
pub mod executor;
pub mod generator;
pub mod parser;
pub mod processor;
pub mod prompts;
pub mod summarizer;
