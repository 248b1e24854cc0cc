//! Burn ML models for chest X-ray classification.
//!
//! This crate defines the neural network architectures used by the pipeline:
//! - `LinearProbe`: Flatten-and-feedforward baseline classifier.
//! - `ConvClassifier`: Small convolutional network with a global-pool head.
//!
//! These are pure Burn Modules with no awareness of datasets or checkpoints.
//! The `training` crate wraps them for training and inference use.
//!
//! Both models return raw logits of shape `[batch, num_classes]`; loss and
//! probability computation happen at the call site.

use burn::module::Module;
use burn::nn;
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::PaddingConfig2d;
use burn::tensor::activation::relu;
use burn::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct LinearProbeConfig {
    /// Square input edge length; the probe flattens `3 * size * size` values.
    pub image_size: usize,
    pub hidden: usize,
    pub num_classes: usize,
}

impl Default for LinearProbeConfig {
    fn default() -> Self {
        Self {
            image_size: 224,
            hidden: 64,
            num_classes: 2,
        }
    }
}

#[derive(Debug, Module)]
pub struct LinearProbe<B: burn::tensor::backend::Backend> {
    linear1: nn::Linear<B>,
    linear2: nn::Linear<B>,
    image_size: usize,
}

impl<B: burn::tensor::backend::Backend> LinearProbe<B> {
    pub fn new(cfg: LinearProbeConfig, device: &B::Device) -> Self {
        let input_dim = 3 * cfg.image_size * cfg.image_size;
        let linear1 = nn::LinearConfig::new(input_dim, cfg.hidden).init(device);
        let linear2 = nn::LinearConfig::new(cfg.hidden, cfg.num_classes).init(device);
        Self {
            linear1,
            linear2,
            image_size: cfg.image_size,
        }
    }

    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let batch = images.dims()[0];
        let x = images.reshape([batch, 3 * self.image_size * self.image_size]);
        let x = relu(self.linear1.forward(x));
        self.linear2.forward(x)
    }
}

#[derive(Debug, Clone)]
pub struct ConvClassifierConfig {
    /// Channels out of the stem convolution; doubled by each block.
    pub stem_channels: usize,
    /// Number of conv + pool blocks after the stem.
    pub depth: usize,
    pub hidden: usize,
    pub num_classes: usize,
    pub dropout: f64,
}

impl Default for ConvClassifierConfig {
    fn default() -> Self {
        Self {
            stem_channels: 16,
            depth: 3,
            hidden: 128,
            num_classes: 2,
            dropout: 0.3,
        }
    }
}

#[derive(Debug, Module)]
pub struct ConvClassifier<B: burn::tensor::backend::Backend> {
    stem: nn::conv::Conv2d<B>,
    blocks: Vec<nn::conv::Conv2d<B>>,
    pool: MaxPool2d,
    global_pool: AdaptiveAvgPool2d,
    head1: nn::Linear<B>,
    dropout: nn::Dropout,
    head2: nn::Linear<B>,
}

impl<B: burn::tensor::backend::Backend> ConvClassifier<B> {
    pub fn new(cfg: ConvClassifierConfig, device: &B::Device) -> Self {
        let stem_channels = cfg.stem_channels.max(1);
        let stem = nn::conv::Conv2dConfig::new([3, stem_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let mut blocks = Vec::new();
        let mut channels = stem_channels;
        for _ in 0..cfg.depth {
            blocks.push(
                nn::conv::Conv2dConfig::new([channels, channels * 2], [3, 3])
                    .with_padding(PaddingConfig2d::Explicit(1, 1))
                    .init(device),
            );
            channels *= 2;
        }
        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();
        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();
        let head1 = nn::LinearConfig::new(channels, cfg.hidden).init(device);
        let dropout = nn::DropoutConfig::new(cfg.dropout).init();
        let head2 = nn::LinearConfig::new(cfg.hidden, cfg.num_classes).init(device);
        Self {
            stem,
            blocks,
            pool,
            global_pool,
            head1,
            dropout,
            head2,
        }
    }

    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.pool.forward(relu(self.stem.forward(images)));
        for block in &self.blocks {
            x = self.pool.forward(relu(block.forward(x)));
        }
        let x = self.global_pool.forward(x);
        let [batch, channels, _, _] = x.dims();
        let x = x.reshape([batch, channels]);
        let x = self.dropout.forward(relu(self.head1.forward(x)));
        self.head2.forward(x)
    }
}

pub mod prelude {
    pub use super::{ConvClassifier, ConvClassifierConfig, LinearProbe, LinearProbeConfig};
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestBackend = burn_ndarray::NdArray<f32>;

    #[test]
    fn linear_probe_outputs_logits_per_class() {
        let device = Default::default();
        let model = LinearProbe::<TestBackend>::new(
            LinearProbeConfig {
                image_size: 16,
                hidden: 8,
                num_classes: 2,
            },
            &device,
        );
        let input = Tensor::<TestBackend, 4>::zeros([3, 3, 16, 16], &device);
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [3, 2]);
    }

    #[test]
    fn conv_classifier_outputs_logits_per_class() {
        let device = Default::default();
        let model = ConvClassifier::<TestBackend>::new(
            ConvClassifierConfig {
                stem_channels: 4,
                depth: 2,
                hidden: 8,
                num_classes: 2,
                dropout: 0.0,
            },
            &device,
        );
        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 32, 32], &device);
        let logits = model.forward(input);
        assert_eq!(logits.dims(), [2, 2]);
    }
}
