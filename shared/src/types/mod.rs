//! Type definitions shared across crates

pub mod language;

pub use language::Language;
