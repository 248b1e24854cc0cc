#![recursion_limit = "256"]

pub mod checkpoint;
pub mod metrics;
pub mod util;

pub use checkpoint::{load_checkpoint, sidecar_path, ClassifierModel, LoadedClassifier};
pub use metrics::{argmax_rows, precision_recall_f1, ClassMetrics, ConfusionMatrix};
pub use models::{ConvClassifier, ConvClassifierConfig, LinearProbe, LinearProbeConfig};
pub use util::{nll_loss, run_train, ModelKind, TrainConfig};
/// Backend alias for training/eval (NdArray by default; WGPU if enabled).
#[cfg(feature = "backend-wgpu")]
pub type TrainBackend = burn_wgpu::Wgpu<f32>;
#[cfg(not(feature = "backend-wgpu"))]
pub type TrainBackend = burn_ndarray::NdArray<f32>;
