//! High-level operations.

pub mod describe;
pub mod evaluate;

pub use describe::{format_descriptor, format_targets};
pub use evaluate::Evaluation;
