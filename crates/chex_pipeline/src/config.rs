use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use training::ModelKind;
use xray_dataset::Split;

/// Top-level pipeline configuration, read from a YAML file. Task sections
/// are optional; each carries the defaults the original run used.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Device id hint; informational on CPU backends.
    #[serde(default)]
    pub gpus: Option<String>,
    pub run_name: String,
    pub datadir: PathBuf,
    /// Task names executed in order; validated before anything runs.
    pub tasks: Vec<String>,
    /// Root for generated artifacts (`<output_root>/<task>/<run_name>/`).
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_model")]
    pub model: ModelKind,
    #[serde(default)]
    pub train: TrainSection,
    #[serde(default)]
    pub evaluate: EvaluateSection,
    #[serde(default)]
    pub predict: PredictSection,
    #[serde(default)]
    pub eda: EdaSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrainSection {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_train_batch")]
    pub batch_size: usize,
    #[serde(default = "default_lr")]
    pub lr: f32,
    #[serde(default)]
    pub checkpoint_out: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_flip_prob")]
    pub flip_horizontal_prob: f32,
    #[serde(default)]
    pub color_jitter_prob: f32,
    #[serde(default = "default_jitter_strength")]
    pub color_jitter_strength: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateSection {
    #[serde(default = "default_eval_batch")]
    pub batch_size: usize,
    /// Splits to evaluate; None means `[test]`.
    #[serde(default)]
    pub data_split: Option<Vec<Split>>,
    #[serde(default)]
    pub checkpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictSection {
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    #[serde(default)]
    pub checkpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdaSection {
    /// Number of files per split to probe for image dimensions (0 disables).
    #[serde(default = "default_dims_sample")]
    pub dims_sample: usize,
}

fn default_model() -> ModelKind {
    ModelKind::Conv
}
fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}
fn default_epochs() -> usize {
    10
}
fn default_train_batch() -> usize {
    16
}
fn default_lr() -> f32 {
    1e-3
}
fn default_flip_prob() -> f32 {
    0.5
}
fn default_jitter_strength() -> f32 {
    0.1
}
fn default_eval_batch() -> usize {
    8
}
fn default_dims_sample() -> usize {
    64
}

impl Default for TrainSection {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_train_batch(),
            lr: default_lr(),
            checkpoint_out: None,
            seed: None,
            flip_horizontal_prob: default_flip_prob(),
            color_jitter_prob: 0.0,
            color_jitter_strength: default_jitter_strength(),
        }
    }
}

impl Default for EvaluateSection {
    fn default() -> Self {
        Self {
            batch_size: default_eval_batch(),
            data_split: None,
            checkpoint: None,
        }
    }
}

impl Default for EdaSection {
    fn default() -> Self {
        Self {
            dims_sample: default_dims_sample(),
        }
    }
}

impl PipelineConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: PipelineConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(cfg)
    }

    /// Checkpoint path for evaluate/predict: the task's explicit setting,
    /// else the trained checkpoint, else the model's default location.
    pub fn checkpoint_for(&self, explicit: &Option<String>) -> String {
        explicit
            .clone()
            .or_else(|| self.train.checkpoint_out.clone())
            .unwrap_or_else(|| self.model.default_checkpoint().to_string())
    }

    /// `<output_root>/<task>/<run_name>/`
    pub fn output_dir(&self, task: &str) -> PathBuf {
        self.output_root.join(task).join(&self.run_name)
    }
}
