//! Integration tests for end-to-end xray_dataset workflows.
//!
//! These tests build a synthetic class-folder dataset on disk and verify
//! that indexing, batching, and summaries work together:
//! 1. Folder scan → class discovery → split index
//! 2. Split index → Burn batch iteration
//! 3. Split index → EDA summaries

use image::{Rgb, RgbImage};
use std::fs;
use std::path::Path;
use xray_dataset::{
    build_train_val_iters, BatchIter, LoaderConfig, Split, TransformPipelineBuilder,
};

type TestBackend = burn_ndarray::NdArray<f32>;

/// Lay out `root/<split>/<class>/img_*.png` with `count` images per class.
fn create_synthetic_split(
    root: &Path,
    split: &str,
    classes: &[(&str, usize)],
) -> anyhow::Result<()> {
    for (class, count) in classes {
        let class_dir = root.join(split).join(class);
        fs::create_dir_all(&class_dir)?;
        for i in 0..*count {
            let mut img = RgbImage::new(40, 32);
            for pixel in img.pixels_mut() {
                *pixel = Rgb([(i * 37) as u8, 90, 180]);
            }
            img.save(class_dir.join(format!("img_{i:03}.png")))?;
        }
    }
    Ok(())
}

fn small_transform(seed: Option<u64>) -> xray_dataset::TransformPipeline {
    TransformPipelineBuilder::new()
        .resize_shorter(16)
        .crop_size(16)
        .seed(seed)
        .build()
}

#[test]
fn discovery_and_index_are_sorted_and_complete() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "train", &[("PNEUMONIA", 4), ("NORMAL", 3)])?;

    let classes = xray_dataset::discover_classes(tmp.path())?;
    assert_eq!(classes.classes, vec!["NORMAL", "PNEUMONIA"]);

    let indices = xray_dataset::index_split(tmp.path(), Split::Train, &classes)?;
    assert_eq!(indices.len(), 7);
    // NORMAL (class 0) files come first, sorted.
    assert_eq!(indices[0].class_idx, 0);
    assert_eq!(indices[3].class_idx, 1);
    Ok(())
}

#[test]
fn missing_split_is_an_error() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "train", &[("NORMAL", 1), ("PNEUMONIA", 1)])?;
    let classes = xray_dataset::discover_classes(tmp.path())?;
    assert!(xray_dataset::index_split(tmp.path(), Split::Val, &classes).is_err());
    Ok(())
}

#[test]
fn batch_iteration_yields_expected_shapes() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "test", &[("NORMAL", 3), ("PNEUMONIA", 2)])?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let cfg = LoaderConfig {
        transform: small_transform(None),
        log_every_samples: None,
        ..LoaderConfig::default()
    };
    let mut iter = BatchIter::from_split(tmp.path(), Split::Test, &classes, cfg)?;
    assert_eq!(iter.len(), 5);

    let device = Default::default();
    let batch = iter
        .next_batch::<TestBackend>(4, &device)?
        .expect("first batch");
    assert_eq!(batch.images.dims(), [4, 3, 16, 16]);
    assert_eq!(batch.targets_one_hot.dims(), [4, 2]);
    assert_eq!(batch.class_indices, vec![0, 0, 0, 1]);

    let batch = iter
        .next_batch::<TestBackend>(4, &device)?
        .expect("trailing partial batch");
    assert_eq!(batch.images.dims(), [1, 3, 16, 16]);
    assert!(iter.next_batch::<TestBackend>(4, &device)?.is_none());
    Ok(())
}

#[test]
fn drop_last_skips_partial_batches() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "test", &[("NORMAL", 3), ("PNEUMONIA", 2)])?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let cfg = LoaderConfig {
        transform: small_transform(None),
        drop_last: true,
        log_every_samples: None,
        ..LoaderConfig::default()
    };
    let mut iter = BatchIter::from_split(tmp.path(), Split::Test, &classes, cfg)?;
    let device = Default::default();

    let mut seen = 0usize;
    while let Some(batch) = iter.next_batch::<TestBackend>(4, &device)? {
        assert_eq!(batch.class_indices.len(), 4);
        seen += batch.class_indices.len();
    }
    assert_eq!(seen, 4);
    Ok(())
}

#[test]
fn seeded_shuffle_is_reproducible() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "train", &[("NORMAL", 6), ("PNEUMONIA", 6)])?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let cfg = LoaderConfig {
        transform: small_transform(Some(11)),
        shuffle: true,
        seed: Some(11),
        log_every_samples: None,
        ..LoaderConfig::default()
    };
    let device = Default::default();

    let mut order_a = Vec::new();
    let mut iter = BatchIter::from_split(tmp.path(), Split::Train, &classes, cfg.clone())?;
    while let Some(batch) = iter.next_batch::<TestBackend>(5, &device)? {
        order_a.extend(batch.class_indices);
    }

    let mut order_b = Vec::new();
    let mut iter = BatchIter::from_split(tmp.path(), Split::Train, &classes, cfg)?;
    while let Some(batch) = iter.next_batch::<TestBackend>(5, &device)? {
        order_b.extend(batch.class_indices);
    }
    assert_eq!(order_a, order_b);
    Ok(())
}

#[test]
fn unreadable_image_is_skipped_in_permissive_mode() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "test", &[("NORMAL", 2), ("PNEUMONIA", 2)])?;
    fs::write(tmp.path().join("test/NORMAL/img_999.png"), b"not a png")?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let cfg = LoaderConfig {
        transform: small_transform(None),
        log_every_samples: None,
        ..LoaderConfig::default()
    };
    let mut iter = BatchIter::from_split(tmp.path(), Split::Test, &classes, cfg)?;
    let device = Default::default();
    let mut seen = 0usize;
    while let Some(batch) = iter.next_batch::<TestBackend>(8, &device)? {
        seen += batch.class_indices.len();
    }
    assert_eq!(seen, 4);
    Ok(())
}

#[test]
fn strict_mode_propagates_decode_errors() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "test", &[("NORMAL", 1), ("PNEUMONIA", 1)])?;
    fs::write(tmp.path().join("test/NORMAL/img_999.png"), b"not a png")?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let cfg = LoaderConfig {
        transform: small_transform(None),
        permissive_errors: false,
        log_every_samples: None,
        ..LoaderConfig::default()
    };
    let mut iter = BatchIter::from_split(tmp.path(), Split::Test, &classes, cfg)?;
    let device = Default::default();
    assert!(iter.next_batch::<TestBackend>(8, &device).is_err());
    Ok(())
}

#[test]
fn train_val_iters_disable_val_augmentation() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "train", &[("NORMAL", 2), ("PNEUMONIA", 2)])?;
    create_synthetic_split(tmp.path(), "val", &[("NORMAL", 2), ("PNEUMONIA", 2)])?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let train_cfg = LoaderConfig {
        transform: TransformPipelineBuilder::new()
            .resize_shorter(16)
            .crop_size(16)
            .flip_horizontal_prob(0.5)
            .color_jitter(0.5, 0.2)
            .seed(Some(3))
            .build(),
        shuffle: true,
        drop_last: true,
        seed: Some(3),
        log_every_samples: None,
        ..LoaderConfig::default()
    };
    let (train_iter, mut val_iter) =
        build_train_val_iters(tmp.path(), &classes, train_cfg, None)?;
    assert_eq!(train_iter.len(), 4);
    assert_eq!(val_iter.len(), 4);

    // Val runs deterministically: two passes over the same data agree.
    let device = Default::default();
    let a = val_iter
        .next_batch::<TestBackend>(4, &device)?
        .expect("val batch");
    val_iter.reset();
    let b = val_iter
        .next_batch::<TestBackend>(4, &device)?
        .expect("val batch");
    assert_eq!(a.class_indices, b.class_indices);
    let va = a.images.into_data().to_vec::<f32>().unwrap();
    let vb = b.images.into_data().to_vec::<f32>().unwrap();
    assert_eq!(va, vb);
    Ok(())
}

#[test]
fn summaries_count_every_class() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    create_synthetic_split(tmp.path(), "train", &[("NORMAL", 5), ("PNEUMONIA", 8)])?;
    create_synthetic_split(tmp.path(), "test", &[("NORMAL", 2), ("PNEUMONIA", 1)])?;
    let classes = xray_dataset::discover_classes(tmp.path())?;

    let summaries = xray_dataset::summarize_dataset(tmp.path(), &classes, 8)?;
    assert_eq!(summaries.len(), 2); // val is absent and skipped
    let train = &summaries[0];
    assert_eq!(train.split, "train");
    assert_eq!(train.total, 13);
    assert_eq!(train.counts[0].count, 5);
    assert_eq!(train.counts[1].count, 8);
    let dims = train.dims.expect("sampled dims");
    assert_eq!(dims.min, (40, 32));
    assert_eq!(dims.max, (40, 32));
    Ok(())
}
