//! Checkpoint persistence: Burn weights file plus a JSON sidecar carrying
//! the class-index mapping and preprocessing constants.

use anyhow::Context;
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::Tensor;
use data_contracts::CheckpointMetadata;
use models::{ConvClassifier, ConvClassifierConfig, LinearProbe, LinearProbeConfig};
use std::fs;
use std::path::{Path, PathBuf};

use crate::TrainBackend;

/// Sidecar path for a weights file: `<stem>.classes.json` next to it.
pub fn sidecar_path(weights: &Path) -> PathBuf {
    let stem = weights
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("checkpoint");
    weights.with_file_name(format!("{stem}.classes.json"))
}

pub fn write_sidecar(weights: &Path, metadata: &CheckpointMetadata) -> anyhow::Result<()> {
    metadata
        .validate()
        .map_err(|e| anyhow::anyhow!("refusing to write invalid checkpoint metadata: {e}"))?;
    let path = sidecar_path(weights);
    let json = serde_json::to_vec_pretty(metadata)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write class sidecar {}", path.display()))?;
    Ok(())
}

pub fn read_sidecar(weights: &Path) -> anyhow::Result<CheckpointMetadata> {
    let path = sidecar_path(weights);
    let raw = fs::read(&path)
        .with_context(|| format!("failed to read class sidecar {}", path.display()))?;
    let metadata: CheckpointMetadata = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse class sidecar {}", path.display()))?;
    metadata
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid class sidecar {}: {e}", path.display()))?;
    Ok(metadata)
}

/// A classifier of either architecture, behind one forward signature.
pub enum ClassifierModel<B: burn::tensor::backend::Backend> {
    Conv(ConvClassifier<B>),
    Linear(LinearProbe<B>),
}

impl<B: burn::tensor::backend::Backend> ClassifierModel<B> {
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        match self {
            ClassifierModel::Conv(model) => model.forward(images),
            ClassifierModel::Linear(model) => model.forward(images),
        }
    }
}

pub struct LoadedClassifier {
    pub model: ClassifierModel<TrainBackend>,
    pub metadata: CheckpointMetadata,
}

/// Load weights plus sidecar. The architecture is rebuilt from the sidecar's
/// model kind and class count; the remaining hyperparameters are the
/// defaults the trainer uses.
pub fn load_checkpoint(
    weights: &Path,
    device: &<TrainBackend as burn::tensor::backend::Backend>::Device,
) -> anyhow::Result<LoadedClassifier> {
    let metadata = read_sidecar(weights)?;
    let num_classes = metadata.classes.len();
    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();

    let model = match metadata.model.as_str() {
        "conv" => {
            let model = ConvClassifier::<TrainBackend>::new(
                ConvClassifierConfig {
                    num_classes,
                    ..Default::default()
                },
                device,
            )
            .load_file(weights, &recorder, device)
            .map_err(|e| anyhow::anyhow!("failed to load checkpoint {}: {e}", weights.display()))?;
            ClassifierModel::Conv(model)
        }
        "linear" => {
            let model = LinearProbe::<TrainBackend>::new(
                LinearProbeConfig {
                    image_size: metadata.image_size as usize,
                    num_classes,
                    ..Default::default()
                },
                device,
            )
            .load_file(weights, &recorder, device)
            .map_err(|e| anyhow::anyhow!("failed to load checkpoint {}: {e}", weights.display()))?;
            ClassifierModel::Linear(model)
        }
        other => anyhow::bail!("unknown model kind in sidecar: {other}"),
    };

    Ok(LoadedClassifier { model, metadata })
}
