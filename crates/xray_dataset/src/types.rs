//! Core types, error definitions, and data structures for xray_dataset.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, XrayDatasetError>;

#[derive(Debug, Error)]
pub enum XrayDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("split directory missing: {path}")]
    MissingSplit { path: PathBuf },
    #[error("no class directories under {path}")]
    NoClasses { path: PathBuf },
    #[error("{0}")]
    Other(String),
}

/// Named dataset partition. Directory names are the lowercase variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    /// Split name with the leading letter uppercased, for report headings.
    pub fn capitalized(&self) -> &'static str {
        match self {
            Split::Train => "Train",
            Split::Val => "Val",
            Split::Test => "Test",
        }
    }

    pub fn all() -> [Split; 3] {
        [Split::Train, Split::Val, Split::Test]
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SampleIndex {
    pub image_path: PathBuf,
    pub class_idx: usize,
}

#[derive(Debug, Clone)]
pub struct DatasetSample {
    /// Image in CHW layout, normalized with the pipeline's channel stats.
    pub image_chw: Vec<f32>,
    pub width: u32,
    pub height: u32,
    pub class_idx: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassCount {
    pub class: String,
    pub count: usize,
}

/// Decoded-dimension statistics over a bounded sample of a split's files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimStats {
    pub sampled: usize,
    pub min: (u32, u32),
    pub max: (u32, u32),
    pub mean: (f32, f32),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SplitSummary {
    pub split: String,
    pub counts: Vec<ClassCount>,
    pub total: usize,
    pub dims: Option<DimStats>,
}
