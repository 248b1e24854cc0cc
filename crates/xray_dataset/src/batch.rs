//! Batch iteration for training and evaluation.

use crate::aug::TransformPipeline;
use crate::folder::index_split;
use crate::types::{DatasetResult, SampleIndex, Split, XrayDatasetError};
use data_contracts::ClassMap;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};

pub(crate) const DEFAULT_LOG_EVERY_SAMPLES: usize = 1000;

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub transform: TransformPipeline,
    /// Shuffle samples before iteration (and on every reset).
    pub shuffle: bool,
    /// Drop trailing batches smaller than the requested batch size.
    pub drop_last: bool,
    /// Seed for reproducible shuffling.
    pub seed: Option<u64>,
    /// Skip unreadable images with a warning instead of failing the run.
    pub permissive_errors: bool,
    /// Emit a progress line roughly every N samples; None disables it.
    pub log_every_samples: Option<usize>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            transform: TransformPipeline::default(),
            shuffle: false,
            drop_last: false,
            seed: None,
            permissive_errors: true,
            log_every_samples: Some(DEFAULT_LOG_EVERY_SAMPLES),
        }
    }
}

pub struct BurnBatch<B: burn::tensor::backend::Backend> {
    pub images: burn::tensor::Tensor<B, 4>,
    /// One-hot targets (shape: [batch, num_classes]).
    pub targets_one_hot: burn::tensor::Tensor<B, 2>,
    /// Host copy of the class indices, in batch order.
    pub class_indices: Vec<usize>,
}

pub struct BatchIter {
    indices: Vec<SampleIndex>,
    cursor: usize,
    cfg: LoaderConfig,
    num_classes: usize,
    epoch: u64,
    processed_samples: usize,
    processed_batches: usize,
    skipped_errors: usize,
    started: Instant,
    last_log: Instant,
    last_logged_samples: usize,
    images_buf: Vec<f32>,
    targets_buf: Vec<f32>,
    class_buf: Vec<usize>,
}

impl BatchIter {
    pub fn from_indices(
        mut indices: Vec<SampleIndex>,
        num_classes: usize,
        cfg: LoaderConfig,
    ) -> Self {
        if cfg.shuffle {
            let mut rng = match cfg.seed {
                Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
                None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
            };
            indices.shuffle(&mut rng);
        }
        let now = Instant::now();
        Self {
            indices,
            cursor: 0,
            cfg,
            num_classes,
            epoch: 0,
            processed_samples: 0,
            processed_batches: 0,
            skipped_errors: 0,
            started: now,
            last_log: now,
            last_logged_samples: 0,
            images_buf: Vec::new(),
            targets_buf: Vec::new(),
            class_buf: Vec::new(),
        }
    }

    pub fn from_split(
        datadir: &Path,
        split: Split,
        classes: &ClassMap,
        cfg: LoaderConfig,
    ) -> DatasetResult<Self> {
        let indices = index_split(datadir, split, classes)?;
        Ok(Self::from_indices(indices, classes.len(), cfg))
    }

    /// Number of indexed samples (not batches).
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Rewind for another epoch, reshuffling with an epoch-mixed seed so
    /// seeded runs see a different deterministic order each pass.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.epoch += 1;
        if self.cfg.shuffle {
            let mut rng = match self.cfg.seed {
                Some(seed) => rand::rngs::StdRng::seed_from_u64(seed.wrapping_add(self.epoch)),
                None => rand::rngs::StdRng::from_rng(&mut rand::rng()),
            };
            self.indices.shuffle(&mut rng);
        }
    }

    pub fn next_batch<B: burn::tensor::backend::Backend>(
        &mut self,
        batch_size: usize,
        device: &B::Device,
    ) -> DatasetResult<Option<BurnBatch<B>>> {
        let batch_size = batch_size.max(1);
        loop {
            if self.cursor >= self.indices.len() {
                return Ok(None);
            }
            let end = (self.cursor + batch_size).min(self.indices.len());
            let start = self.cursor;
            let slice = &self.indices[start..end];
            self.cursor = end;

            self.images_buf.clear();
            self.targets_buf.clear();
            self.class_buf.clear();

            let pipeline = &self.cfg.transform;
            let mut loaded: Vec<_> = slice
                .par_iter()
                .enumerate()
                .map(|(i, idx)| {
                    let sample = image::open(&idx.image_path)
                        .map(|img| {
                            pipeline.apply(img.to_rgb8(), idx.class_idx, (start + i) as u64)
                        })
                        .map_err(|e| XrayDatasetError::Image {
                            path: idx.image_path.clone(),
                            source: e,
                        });
                    (i, idx, sample)
                })
                .collect();
            loaded.sort_by_key(|(i, _, _)| *i);

            for (_i, idx, res) in loaded {
                let sample = match res {
                    Ok(s) => s,
                    Err(e) => {
                        if self.cfg.permissive_errors {
                            eprintln!(
                                "Warning: skipping image {}: {e}",
                                idx.image_path.display()
                            );
                            self.skipped_errors += 1;
                            continue;
                        } else {
                            return Err(e);
                        }
                    }
                };
                self.class_buf.push(sample.class_idx);
                self.images_buf.extend_from_slice(&sample.image_chw);
                let mut one_hot = vec![0.0f32; self.num_classes];
                if let Some(slot) = one_hot.get_mut(sample.class_idx) {
                    *slot = 1.0;
                }
                self.targets_buf.extend_from_slice(&one_hot);
            }

            let batch_len = self.class_buf.len();
            if batch_len == 0 {
                continue;
            }
            if self.cfg.drop_last && batch_len < batch_size {
                if self.cursor >= self.indices.len() {
                    return Ok(None);
                } else {
                    continue;
                }
            }

            let side = self.cfg.transform.crop_size as usize;
            let images =
                burn::tensor::Tensor::<B, 1>::from_floats(self.images_buf.as_slice(), device)
                    .reshape([batch_len, 3, side, side]);
            let targets_one_hot =
                burn::tensor::Tensor::<B, 1>::from_floats(self.targets_buf.as_slice(), device)
                    .reshape([batch_len, self.num_classes]);

            self.processed_samples += batch_len;
            self.processed_batches += 1;
            self.maybe_log_progress();

            return Ok(Some(BurnBatch {
                images,
                targets_one_hot,
                class_indices: std::mem::take(&mut self.class_buf),
            }));
        }
    }

    fn maybe_log_progress(&mut self) {
        let Some(threshold) = self.cfg.log_every_samples else {
            return;
        };
        let processed_since = self
            .processed_samples
            .saturating_sub(self.last_logged_samples);
        let since_last = self.last_log.elapsed();
        if processed_since < threshold && since_last < Duration::from_secs(30) {
            return;
        }
        let secs = self.started.elapsed().as_secs_f32().max(0.001);
        let rate = self.processed_samples as f32 / secs;
        eprintln!(
            "[dataset] batches={} samples={} skipped_errors={} elapsed={:.1}s rate={:.1} img/s",
            self.processed_batches, self.processed_samples, self.skipped_errors, secs, rate
        );
        self.last_logged_samples = self.processed_samples;
        self.last_log = Instant::now();
    }
}

/// Build train and val iterators over the standard split directories.
/// Val defaults to the train configuration with shuffling and every
/// stochastic transform stage disabled.
pub fn build_train_val_iters(
    datadir: &Path,
    classes: &ClassMap,
    train_cfg: LoaderConfig,
    val_cfg: Option<LoaderConfig>,
) -> DatasetResult<(BatchIter, BatchIter)> {
    let val_cfg = val_cfg.unwrap_or_else(|| LoaderConfig {
        transform: train_cfg.transform.without_augmentation(),
        shuffle: false,
        drop_last: false,
        ..train_cfg.clone()
    });
    let train_iter = BatchIter::from_split(datadir, Split::Train, classes, train_cfg)?;
    let val_iter = BatchIter::from_split(datadir, Split::Val, classes, val_cfg)?;
    Ok((train_iter, val_iter))
}
