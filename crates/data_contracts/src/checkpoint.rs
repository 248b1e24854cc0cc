use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classes::{self, ClassMap};

/// Per-channel normalization constants applied after scaling pixels to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for NormalizeStats {
    fn default() -> Self {
        // ImageNet statistics; the transform stack the classifier was trained with.
        Self {
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
        }
    }
}

/// Sidecar metadata stored next to a weights file. A checkpoint is only
/// loadable together with this: it carries the class-index mapping and the
/// preprocessing constants inference must replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// Model kind identifier ("conv" or "linear").
    pub model: String,
    pub classes: ClassMap,
    /// Square input edge length fed to the model.
    pub image_size: u32,
    /// Shorter-side resize applied before the center crop.
    pub resize_shorter: u32,
    pub normalize: NormalizeStats,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("invalid class map: {0}")]
    Classes(#[from] classes::ValidationError),
    #[error("image_size must be non-zero")]
    ZeroImageSize,
    #[error("resize_shorter {resize} is smaller than image_size {crop}")]
    ResizeSmallerThanCrop { resize: u32, crop: u32 },
    #[error("normalize std contains a non-positive or non-finite value: {0:?}")]
    InvalidStd([f32; 3]),
    #[error("unknown model kind: {0}")]
    UnknownModel(String),
}

impl CheckpointMetadata {
    pub fn validate(&self) -> Result<(), CheckpointError> {
        self.classes.validate()?;
        if self.image_size == 0 {
            return Err(CheckpointError::ZeroImageSize);
        }
        if self.resize_shorter < self.image_size {
            return Err(CheckpointError::ResizeSmallerThanCrop {
                resize: self.resize_shorter,
                crop: self.image_size,
            });
        }
        if self.normalize.std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(CheckpointError::InvalidStd(self.normalize.std));
        }
        if self.model != "conv" && self.model != "linear" {
            return Err(CheckpointError::UnknownModel(self.model.clone()));
        }
        Ok(())
    }
}
