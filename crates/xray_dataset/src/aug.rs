//! Image transform and augmentation pipeline.

use crate::types::DatasetSample;
use data_contracts::NormalizeStats;
use image::imageops::FilterType;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct TransformPipeline {
    /// Resize the shorter image side to this before cropping.
    pub resize_shorter: u32,
    /// Square center-crop edge length; the model's input size.
    pub crop_size: u32,
    /// Per-channel normalization applied after scaling to [0, 1].
    pub normalize: NormalizeStats,
    /// Probability of applying a horizontal flip augmentation.
    pub flip_horizontal_prob: f32,
    /// Probability of applying a light color jitter (brightness/contrast).
    pub color_jitter_prob: f32,
    /// Max jitter scale for brightness/contrast.
    pub color_jitter_strength: f32,
    /// Probability of adding uniform noise per channel.
    pub noise_prob: f32,
    /// Max absolute noise added (0-1 range).
    pub noise_strength: f32,
    /// Probability of applying a blur.
    pub blur_prob: f32,
    /// Blur sigma (passed to image::imageops::blur).
    pub blur_sigma: f32,
    /// Seed for reproducible per-sample augmentation.
    pub seed: Option<u64>,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        // Deterministic evaluation stack: resize 256, crop 224, normalize.
        Self {
            resize_shorter: 256,
            crop_size: 224,
            normalize: NormalizeStats::default(),
            flip_horizontal_prob: 0.0,
            color_jitter_prob: 0.0,
            color_jitter_strength: 0.1,
            noise_prob: 0.0,
            noise_strength: 0.02,
            blur_prob: 0.0,
            blur_sigma: 1.0,
            seed: None,
        }
    }
}

impl TransformPipeline {
    /// Copy of this pipeline with every stochastic stage disabled.
    pub fn without_augmentation(&self) -> Self {
        Self {
            flip_horizontal_prob: 0.0,
            color_jitter_prob: 0.0,
            noise_prob: 0.0,
            blur_prob: 0.0,
            ..self.clone()
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "resize_shorter={} crop={} flip_p={:.2} color_jitter_p={:.2} strength={:.2} noise_p={:.2} strength={:.3} blur_p={:.2} sigma={:.2} seed={}",
            self.resize_shorter,
            self.crop_size,
            self.flip_horizontal_prob,
            self.color_jitter_prob,
            self.color_jitter_strength,
            self.noise_prob,
            self.noise_strength,
            self.blur_prob,
            self.blur_sigma,
            self.seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "none".to_string())
        )
    }

    /// Apply the full stack to one decoded image. `sample_id` is mixed into
    /// the seed so seeded runs are deterministic per sample.
    pub fn apply(&self, img: image::RgbImage, class_idx: usize, sample_id: u64) -> DatasetSample {
        // Choose RNG: seeded if provided (per-sample deterministic), else thread-local.
        let mut rng_local;
        let mut seeded_rng;
        let rng: &mut dyn rand::RngCore = if let Some(seed) = self.seed {
            let mixed = seed ^ sample_id;
            seeded_rng = rand::rngs::StdRng::seed_from_u64(mixed);
            &mut seeded_rng
        } else {
            rng_local = rand::rng();
            &mut rng_local
        };

        let resized = resize_shorter_side(&img, self.resize_shorter);
        let mut cropped = center_crop(&resized, self.crop_size);

        maybe_hflip(&mut cropped, self.flip_horizontal_prob, rng);
        maybe_jitter(
            &mut cropped,
            self.color_jitter_prob,
            self.color_jitter_strength,
            rng,
        );
        maybe_noise(&mut cropped, self.noise_prob, self.noise_strength, rng);
        maybe_blur(&mut cropped, self.blur_prob, self.blur_sigma, rng);

        let (width, height) = cropped.dimensions();
        let image_chw = to_normalized_chw(&cropped, &self.normalize);
        DatasetSample {
            image_chw,
            width,
            height,
            class_idx,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransformPipelineBuilder {
    inner: TransformPipeline,
}

impl Default for TransformPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPipelineBuilder {
    pub fn new() -> Self {
        Self {
            inner: TransformPipeline::default(),
        }
    }
    pub fn resize_shorter(mut self, target: u32) -> Self {
        self.inner.resize_shorter = target;
        self
    }
    pub fn crop_size(mut self, size: u32) -> Self {
        self.inner.crop_size = size;
        self
    }
    pub fn normalize(mut self, stats: NormalizeStats) -> Self {
        self.inner.normalize = stats;
        self
    }
    pub fn flip_horizontal_prob(mut self, p: f32) -> Self {
        self.inner.flip_horizontal_prob = p;
        self
    }
    pub fn color_jitter(mut self, prob: f32, strength: f32) -> Self {
        self.inner.color_jitter_prob = prob;
        self.inner.color_jitter_strength = strength;
        self
    }
    pub fn noise(mut self, prob: f32, strength: f32) -> Self {
        self.inner.noise_prob = prob;
        self.inner.noise_strength = strength;
        self
    }
    pub fn blur(mut self, prob: f32, sigma: f32) -> Self {
        self.inner.blur_prob = prob;
        self.inner.blur_sigma = sigma;
        self
    }
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.inner.seed = seed;
        self
    }
    pub fn build(self) -> TransformPipeline {
        self.inner
    }
}

/// Resize so the shorter side equals `target`, preserving aspect ratio.
pub(crate) fn resize_shorter_side(img: &image::RgbImage, target: u32) -> image::RgbImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 || target == 0 {
        return img.clone();
    }
    let scale = target as f32 / w.min(h) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    image::imageops::resize(img, new_w, new_h, FilterType::Triangle)
}

/// Centered square crop. Images smaller than the crop (possible only with a
/// resize_shorter below the crop size) are stretched to the crop instead.
pub(crate) fn center_crop(img: &image::RgbImage, size: u32) -> image::RgbImage {
    let (w, h) = img.dimensions();
    if w < size || h < size {
        return image::imageops::resize(img, size, size, FilterType::Triangle);
    }
    let x0 = (w - size) / 2;
    let y0 = (h - size) / 2;
    image::imageops::crop_imm(img, x0, y0, size, size).to_image()
}

pub(crate) fn to_normalized_chw(img: &image::RgbImage, stats: &NormalizeStats) -> Vec<f32> {
    let (width, height) = img.dimensions();
    let plane = (width * height) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for (y, x, pixel) in img.enumerate_pixels() {
        let base = (y * width + x) as usize;
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            chw[c * plane + base] = (v - stats.mean[c]) / stats.std[c];
        }
    }
    chw
}

pub(crate) fn maybe_hflip(img: &mut image::RgbImage, prob: f32, rng: &mut dyn rand::RngCore) {
    if prob <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) < prob {
        image::imageops::flip_horizontal_in_place(img);
    }
}

pub(crate) fn maybe_jitter(
    img: &mut image::RgbImage,
    prob: f32,
    strength: f32,
    rng: &mut dyn rand::RngCore,
) {
    if prob <= 0.0 || strength <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) >= prob {
        return;
    }
    let bright = 1.0 + rng.random_range(-strength..strength);
    let contrast = 1.0 + rng.random_range(-strength..strength);
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let v = pixel[c] as f32 / 255.0;
            let mut v = (v - 0.5) * contrast + 0.5;
            v *= bright;
            pixel[c] = (v.clamp(0.0, 1.0) * 255.0) as u8;
        }
    }
}

pub(crate) fn maybe_noise(
    img: &mut image::RgbImage,
    prob: f32,
    strength: f32,
    rng: &mut dyn rand::RngCore,
) {
    if prob <= 0.0 || strength <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) >= prob {
        return;
    }
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            let noise = rng.random_range(-strength..strength);
            let v = (pixel[c] as f32 / 255.0 + noise).clamp(0.0, 1.0);
            pixel[c] = (v * 255.0) as u8;
        }
    }
}

pub(crate) fn maybe_blur(
    img: &mut image::RgbImage,
    prob: f32,
    sigma: f32,
    rng: &mut dyn rand::RngCore,
) {
    if prob <= 0.0 || sigma <= 0.0 {
        return;
    }
    if rng.random_range(0.0..1.0) >= prob {
        return;
    }
    let blurred = image::imageops::blur(img, sigma);
    *img = blurred;
}
