//! Core parsing components

pub mod key_pattern;
pub mod tree_builder;
pub mod value_parser;

pub use key_pattern::{KeyPatternExtractor, PlannerPhase, ProfileKey};
pub use tree_builder::TreeBuilder;
pub use value_parser::ValueParser;
