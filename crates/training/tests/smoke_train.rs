use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use training::{load_checkpoint, sidecar_path, ModelKind, TrainConfig};

/// Lay out `root/<split>/<class>/img_*.png` with `count` images per class.
/// NORMAL images are dark, PNEUMONIA images bright, so even a single epoch
/// has signal to fit.
fn create_synthetic_dataset(root: &Path, per_class: usize) -> anyhow::Result<()> {
    for split in ["train", "val", "test"] {
        for (class, level) in [("NORMAL", 40u8), ("PNEUMONIA", 210u8)] {
            let class_dir = root.join(split).join(class);
            fs::create_dir_all(&class_dir)?;
            for i in 0..per_class {
                let mut img = RgbImage::new(24, 24);
                for pixel in img.pixels_mut() {
                    *pixel = Rgb([level, level.saturating_add(i as u8), level]);
                }
                img.save(class_dir.join(format!("img_{i:03}.png")))?;
            }
        }
    }
    Ok(())
}

fn tiny_config(model: ModelKind, root: &Path, ckpt: &Path) -> TrainConfig {
    TrainConfig {
        model,
        datadir: root.to_path_buf(),
        epochs: 1,
        batch_size: 2,
        lr: 1e-3,
        checkpoint_out: Some(ckpt.to_string_lossy().into_owned()),
        seed: Some(42),
        flip_horizontal_prob: 0.0,
        color_jitter_prob: 0.0,
        color_jitter_strength: 0.0,
        image_size: 16,
        resize_shorter: 16,
    }
}

#[test]
fn linear_probe_trains_and_checkpoints() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_dataset(tmp.path(), 4)?;
    let ckpt = tmp.path().join("checkpoints/linear_probe.bin");

    training::run_train(&tiny_config(ModelKind::Linear, tmp.path(), &ckpt))?;

    assert!(ckpt.exists(), "weights file missing");
    assert!(sidecar_path(&ckpt).exists(), "class sidecar missing");
    Ok(())
}

#[test]
fn checkpoint_roundtrips_class_map_and_predicts() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_dataset(tmp.path(), 4)?;
    let ckpt = tmp.path().join("checkpoints/linear_probe.bin");
    training::run_train(&tiny_config(ModelKind::Linear, tmp.path(), &ckpt))?;

    let device = Default::default();
    let loaded = load_checkpoint(&ckpt, &device)?;
    assert_eq!(loaded.metadata.classes.classes, vec!["NORMAL", "PNEUMONIA"]);
    assert_eq!(loaded.metadata.image_size, 16);

    // Fixed input, fixed weights: two forwards agree.
    let input = burn::tensor::Tensor::<training::TrainBackend, 4>::ones([1, 3, 16, 16], &device);
    let a = loaded
        .model
        .forward(input.clone())
        .into_data()
        .to_vec::<f32>()
        .unwrap();
    let b = loaded
        .model
        .forward(input)
        .into_data()
        .to_vec::<f32>()
        .unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn conv_classifier_trains_and_reloads() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_dataset(tmp.path(), 2)?;
    let ckpt = tmp.path().join("checkpoints/conv_classifier.bin");
    training::run_train(&tiny_config(ModelKind::Conv, tmp.path(), &ckpt))?;

    let device = Default::default();
    let loaded = load_checkpoint(&ckpt, &device)?;
    assert_eq!(loaded.metadata.model, "conv");
    let input =
        burn::tensor::Tensor::<training::TrainBackend, 4>::zeros([2, 3, 16, 16], &device);
    let logits = loaded.model.forward(input);
    assert_eq!(logits.dims(), [2, 2]);
    Ok(())
}

#[test]
fn missing_sidecar_fails_to_load() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let ckpt = tmp.path().join("no_such_model.bin");
    fs::write(&ckpt, b"not a checkpoint")?;
    let device = Default::default();
    assert!(load_checkpoint(&ckpt, &device).is_err());
    Ok(())
}
