//! Dataset loading, transforms, and Burn-compatible batching for chest
//! X-ray classification.
//!
//! This crate provides utilities for:
//! - Indexing class-folder datasets (`datadir/<split>/<class>/*`)
//! - The resize/crop/normalize transform stack with optional augmentation
//! - Burn-compatible batch iteration
//! - Per-split summaries for exploratory data analysis

// Module declarations
pub mod aug;
pub mod batch;
pub mod folder;
pub mod summary;
pub mod types;

// Re-export public API
pub use aug::{TransformPipeline, TransformPipelineBuilder};
pub use batch::{build_train_val_iters, BatchIter, BurnBatch, LoaderConfig};
pub use folder::{discover_classes, index_split, list_classes};
pub use summary::{summarize_dataset, summarize_split};
pub use types::*;
