use burn::backend::Autodiff;
use burn::module::{AutodiffModule, Module};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::activation::log_softmax;
use burn::tensor::Tensor;
use data_contracts::{CheckpointMetadata, ClassMap, NormalizeStats};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use xray_dataset::{build_train_val_iters, BatchIter, LoaderConfig, TransformPipelineBuilder};

use crate::checkpoint::write_sidecar;
use crate::metrics::argmax_rows;
use crate::{ConvClassifier, ConvClassifierConfig, LinearProbe, LinearProbeConfig, TrainBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Conv,
    Linear,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Conv => "conv",
            ModelKind::Linear => "linear",
        }
    }

    pub fn default_checkpoint(&self) -> &'static str {
        match self {
            ModelKind::Conv => "checkpoints/conv_classifier.bin",
            ModelKind::Linear => "checkpoints/linear_probe.bin",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Model to train.
    pub model: ModelKind,
    /// Dataset root containing train/ val/ test/ class folders.
    pub datadir: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    pub lr: f32,
    /// Checkpoint output path (defaults by model if not provided).
    pub checkpoint_out: Option<String>,
    /// Seed for shuffling and augmentation; None draws from the OS.
    pub seed: Option<u64>,
    pub flip_horizontal_prob: f32,
    pub color_jitter_prob: f32,
    pub color_jitter_strength: f32,
    /// Square model input edge length.
    pub image_size: u32,
    /// Shorter-side resize applied before the center crop.
    pub resize_shorter: u32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Conv,
            datadir: PathBuf::from("assets/chest_xray"),
            epochs: 10,
            batch_size: 16,
            lr: 1e-3,
            checkpoint_out: None,
            seed: None,
            flip_horizontal_prob: 0.5,
            color_jitter_prob: 0.0,
            color_jitter_strength: 0.1,
            image_size: 224,
            resize_shorter: 256,
        }
    }
}

/// Mean negative log-likelihood of `log_softmax` logits against one-hot
/// targets. Assembled from tensor ops; returns a rank-1 scalar.
pub fn nll_loss<B: burn::tensor::backend::Backend>(
    logits: Tensor<B, 2>,
    targets_one_hot: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let batch = logits.dims()[0];
    let log_probs = log_softmax(logits, 1);
    -(log_probs * targets_one_hot).sum().div_scalar(batch as f32)
}

pub fn run_train(cfg: &TrainConfig) -> anyhow::Result<()> {
    let classes = xray_dataset::discover_classes(&cfg.datadir)
        .map_err(|e| anyhow::anyhow!("failed to scan dataset at {}: {e}", cfg.datadir.display()))?;
    classes
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid class layout at {}: {e}", cfg.datadir.display()))?;
    println!("classes: {:?}", classes.classes);

    let ckpt_path = cfg
        .checkpoint_out
        .clone()
        .unwrap_or_else(|| cfg.model.default_checkpoint().to_string());
    if let Some(parent) = Path::new(&ckpt_path).parent() {
        fs::create_dir_all(parent)?;
    }

    let transform = TransformPipelineBuilder::new()
        .resize_shorter(cfg.resize_shorter)
        .crop_size(cfg.image_size)
        .flip_horizontal_prob(cfg.flip_horizontal_prob)
        .color_jitter(cfg.color_jitter_prob, cfg.color_jitter_strength)
        .seed(cfg.seed)
        .build();
    println!("train transform: {}", transform.describe());

    let train_cfg = LoaderConfig {
        transform,
        shuffle: true,
        drop_last: true,
        seed: cfg.seed,
        ..LoaderConfig::default()
    };
    let (mut train_iter, mut val_iter) =
        build_train_val_iters(&cfg.datadir, &classes, train_cfg, None)
            .map_err(|e| anyhow::anyhow!("failed to build data loaders: {e}"))?;
    if train_iter.is_empty() {
        anyhow::bail!("no training images under {}", cfg.datadir.display());
    }

    match cfg.model {
        ModelKind::Conv => {
            train_conv_classifier(cfg, &classes, &mut train_iter, &mut val_iter, &ckpt_path)?
        }
        ModelKind::Linear => {
            train_linear_probe(cfg, &classes, &mut train_iter, &mut val_iter, &ckpt_path)?
        }
    }

    println!("Saved checkpoint to {}", ckpt_path);
    Ok(())
}

type ADBackend = Autodiff<TrainBackend>;

fn scalar_f32<B: burn::tensor::backend::Backend>(t: Tensor<B, 1>) -> f32 {
    t.into_data()
        .to_vec::<f32>()
        .unwrap_or_default()
        .into_iter()
        .next()
        .unwrap_or(0.0)
}

fn train_conv_classifier(
    cfg: &TrainConfig,
    classes: &ClassMap,
    train_iter: &mut BatchIter,
    val_iter: &mut BatchIter,
    ckpt_path: &str,
) -> anyhow::Result<()> {
    let device = <ADBackend as burn::tensor::backend::Backend>::Device::default();
    let mut model = ConvClassifier::<ADBackend>::new(
        ConvClassifierConfig {
            num_classes: classes.len(),
            ..Default::default()
        },
        &device,
    );
    let mut optim = AdamConfig::new().init();

    let batch_size = cfg.batch_size.max(1);
    for epoch in 0..cfg.epochs {
        if epoch > 0 {
            train_iter.reset();
        }
        let mut losses = Vec::new();
        loop {
            let batch = match train_iter
                .next_batch::<ADBackend>(batch_size, &device)
                .map_err(|e| anyhow::anyhow!("failed to load training batch: {e}"))?
            {
                Some(batch) => batch,
                None => break,
            };
            let logits = model.forward(batch.images);
            let loss = nll_loss(logits, batch.targets_one_hot);
            let loss_detached = loss.clone().detach();
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr as f64, model, grads);
            losses.push(scalar_f32(loss_detached));
        }
        let avg_loss: f32 = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f32>() / losses.len() as f32
        };
        let valid_model = model.valid();
        let val_acc = validation_accuracy(val_iter, batch_size, |images| {
            valid_model.forward(images)
        })?;
        println!("epoch {epoch}: avg loss {avg_loss:.4}, val accuracy {val_acc:.4}");
    }

    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(Path::new(ckpt_path), &recorder)
        .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {e}"))?;
    write_sidecar(Path::new(ckpt_path), &checkpoint_metadata(cfg, classes))?;

    Ok(())
}

fn train_linear_probe(
    cfg: &TrainConfig,
    classes: &ClassMap,
    train_iter: &mut BatchIter,
    val_iter: &mut BatchIter,
    ckpt_path: &str,
) -> anyhow::Result<()> {
    let device = <ADBackend as burn::tensor::backend::Backend>::Device::default();
    let mut model = LinearProbe::<ADBackend>::new(
        LinearProbeConfig {
            image_size: cfg.image_size as usize,
            num_classes: classes.len(),
            ..Default::default()
        },
        &device,
    );
    let mut optim = AdamConfig::new().init();

    let batch_size = cfg.batch_size.max(1);
    for epoch in 0..cfg.epochs {
        if epoch > 0 {
            train_iter.reset();
        }
        let mut losses = Vec::new();
        loop {
            let batch = match train_iter
                .next_batch::<ADBackend>(batch_size, &device)
                .map_err(|e| anyhow::anyhow!("failed to load training batch: {e}"))?
            {
                Some(batch) => batch,
                None => break,
            };
            let logits = model.forward(batch.images);
            let loss = nll_loss(logits, batch.targets_one_hot);
            let loss_detached = loss.clone().detach();
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(cfg.lr as f64, model, grads);
            losses.push(scalar_f32(loss_detached));
        }
        let avg_loss: f32 = if losses.is_empty() {
            0.0
        } else {
            losses.iter().sum::<f32>() / losses.len() as f32
        };
        let valid_model = model.valid();
        let val_acc = validation_accuracy(val_iter, batch_size, |images| {
            valid_model.forward(images)
        })?;
        println!("epoch {epoch}: avg loss {avg_loss:.4}, val accuracy {val_acc:.4}");
    }

    let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(Path::new(ckpt_path), &recorder)
        .map_err(|e| anyhow::anyhow!("failed to save checkpoint: {e}"))?;
    write_sidecar(Path::new(ckpt_path), &checkpoint_metadata(cfg, classes))?;

    Ok(())
}

fn checkpoint_metadata(cfg: &TrainConfig, classes: &ClassMap) -> CheckpointMetadata {
    CheckpointMetadata {
        model: cfg.model.as_str().to_string(),
        classes: classes.clone(),
        image_size: cfg.image_size,
        resize_shorter: cfg.resize_shorter,
        normalize: NormalizeStats::default(),
    }
}

/// Accuracy of `forward` over one full pass of the validation iterator.
fn validation_accuracy<F>(
    val_iter: &mut BatchIter,
    batch_size: usize,
    mut forward: F,
) -> anyhow::Result<f32>
where
    F: FnMut(Tensor<TrainBackend, 4>) -> Tensor<TrainBackend, 2>,
{
    let device = <TrainBackend as burn::tensor::backend::Backend>::Device::default();
    val_iter.reset();
    let mut correct = 0usize;
    let mut total = 0usize;
    loop {
        let batch = match val_iter
            .next_batch::<TrainBackend>(batch_size, &device)
            .map_err(|e| anyhow::anyhow!("failed to load validation batch: {e}"))?
        {
            Some(batch) => batch,
            None => break,
        };
        let num_classes = batch.targets_one_hot.dims()[1];
        let logits = forward(batch.images);
        let host = logits.into_data().to_vec::<f32>().unwrap_or_default();
        let preds = argmax_rows(&host, num_classes);
        for (pred, target) in preds.iter().zip(batch.class_indices.iter()) {
            if pred == target {
                correct += 1;
            }
            total += 1;
        }
    }
    Ok(if total == 0 {
        0.0
    } else {
        correct as f32 / total as f32
    })
}
