use std::fs;
use std::path::Path;

use anyhow::Context;
use training::{
    argmax_rows, load_checkpoint, nll_loss, precision_recall_f1, ConfusionMatrix, TrainBackend,
};
use xray_dataset::{BatchIter, LoaderConfig, Split, TransformPipelineBuilder};

use crate::config::PipelineConfig;
use crate::plot;
use crate::report::{write_results_csv, SplitResult};

pub fn run(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let device = <TrainBackend as burn::tensor::backend::Backend>::Device::default();
    let ckpt = cfg.checkpoint_for(&cfg.evaluate.checkpoint);
    let loaded = load_checkpoint(Path::new(&ckpt), &device)?;
    let meta = &loaded.metadata;
    let classes = &meta.classes;

    let splits = cfg
        .evaluate
        .data_split
        .clone()
        .unwrap_or_else(|| vec![Split::Test]);

    let save_path = cfg.output_dir("evaluate");
    fs::create_dir_all(&save_path)
        .with_context(|| format!("failed to create {}", save_path.display()))?;

    let batch_size = cfg.evaluate.batch_size.max(1);
    let mut results = Vec::new();

    for split in splits {
        // Evaluation runs on fixed-size batches; the trailing partial batch
        // is dropped, so averages are over the samples actually seen.
        let transform = TransformPipelineBuilder::new()
            .resize_shorter(meta.resize_shorter)
            .crop_size(meta.image_size)
            .normalize(meta.normalize)
            .build();
        let loader_cfg = LoaderConfig {
            transform,
            drop_last: true,
            ..LoaderConfig::default()
        };
        let mut iter = BatchIter::from_split(&cfg.datadir, split, classes, loader_cfg)
            .map_err(|e| anyhow::anyhow!("failed to index {split} split: {e}"))?;

        let mut loss_sum = 0f64;
        let mut evaluated = 0usize;
        let mut cm = ConfusionMatrix::new(classes.len());

        loop {
            let batch = match iter
                .next_batch::<TrainBackend>(batch_size, &device)
                .map_err(|e| anyhow::anyhow!("failed to load {split} batch: {e}"))?
            {
                Some(batch) => batch,
                None => break,
            };
            let batch_len = batch.class_indices.len();
            let logits = loaded.model.forward(batch.images);
            let loss = nll_loss(logits.clone(), batch.targets_one_hot);
            let loss_val = loss
                .into_data()
                .to_vec::<f32>()
                .unwrap_or_default()
                .into_iter()
                .next()
                .unwrap_or(0.0);

            let host = logits.into_data().to_vec::<f32>().unwrap_or_default();
            let preds = argmax_rows(&host, classes.len());
            for (target, pred) in batch.class_indices.iter().zip(preds.iter()) {
                cm.record(*target, *pred);
            }
            loss_sum += loss_val as f64 * batch_len as f64;
            evaluated += batch_len;
        }

        if evaluated == 0 {
            anyhow::bail!(
                "no complete batches of size {batch_size} in the {split} split under {}",
                cfg.datadir.display()
            );
        }

        let loss = (loss_sum / evaluated as f64) as f32;
        let heading = split.capitalized();
        println!("{heading} Loss: {loss:.6}\n");

        for (idx, class) in classes.classes.iter().enumerate() {
            let total = cm.target_total(idx);
            if total > 0 {
                println!(
                    "{heading} Accuracy of {class}: {:2.0}% ({}/{})",
                    100.0 * cm.correct(idx) as f32 / total as f32,
                    cm.correct(idx),
                    total
                );
            } else {
                println!("{heading} Accuracy of {class}: N/A (no examples)");
            }
        }
        println!(
            "\n{heading} Accuracy (Overall): {:2.0}% ({}/{})",
            cm.accuracy() * 100.0,
            cm.correct_total(),
            cm.total()
        );

        let metrics = precision_recall_f1(&cm);
        let png_path = save_path.join(format!("confusion_matrix_{split}.png"));
        plot::render_confusion_matrix(&cm, classes, &png_path)
            .with_context(|| format!("failed to render {}", png_path.display()))?;
        println!("saved {}", png_path.display());

        results.push(SplitResult {
            split: split.as_str().to_string(),
            loss,
            accuracy: cm.accuracy(),
            metrics,
        });
    }

    let csv_path = save_path.join("results.csv");
    write_results_csv(&csv_path, &results)?;
    println!("saved {}", csv_path.display());
    Ok(())
}
