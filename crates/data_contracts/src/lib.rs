//! Shared data contracts for class maps and checkpoint metadata.

pub mod checkpoint;
pub mod classes;

pub use checkpoint::{CheckpointMetadata, NormalizeStats};
pub use classes::{ClassMap, ValidationError};
