use std::path::Path;

use anyhow::Context;
use burn::tensor::Tensor;
use training::{argmax_rows, load_checkpoint, TrainBackend};
use xray_dataset::TransformPipelineBuilder;

use crate::config::PipelineConfig;

pub fn run(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let Some(image_path) = &cfg.predict.image_path else {
        anyhow::bail!("predict.image_path is not set in the config");
    };

    let device = <TrainBackend as burn::tensor::backend::Backend>::Device::default();
    let ckpt = cfg.checkpoint_for(&cfg.predict.checkpoint);
    let loaded = load_checkpoint(Path::new(&ckpt), &device)?;
    let meta = &loaded.metadata;

    // Replay the transform stack the checkpoint was trained with.
    let pipeline = TransformPipelineBuilder::new()
        .resize_shorter(meta.resize_shorter)
        .crop_size(meta.image_size)
        .normalize(meta.normalize)
        .build();

    let img = image::open(image_path)
        .with_context(|| format!("failed to open image {}", image_path.display()))?
        .to_rgb8();
    let sample = pipeline.apply(img, 0, 0);

    let side = meta.image_size as usize;
    let input = Tensor::<TrainBackend, 1>::from_floats(sample.image_chw.as_slice(), &device)
        .reshape([1, 3, side, side]);
    let logits = loaded.model.forward(input);
    let host = logits.into_data().to_vec::<f32>().unwrap_or_default();
    let pred = argmax_rows(&host, meta.classes.len())
        .first()
        .copied()
        .unwrap_or(0);
    let label = meta.classes.idx_to_class(pred).unwrap_or("unknown");
    println!("Prediction: {label}");
    Ok(())
}
