// src/output/mod.rs
// =============================================================================
// This module decides where crawled pages land on disk.
//
// Submodules:
// - path: turns a page URL into a relative markdown file path
// - writer: owns the output directory and writes each path at most once
// =============================================================================

mod path;
mod writer;

pub use path::PathNormalizer;
pub use writer::OutputTree;
