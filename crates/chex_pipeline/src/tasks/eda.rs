use std::fs;

use anyhow::Context;
use xray_dataset::{discover_classes, summarize_dataset};

use crate::config::PipelineConfig;
use crate::plot;

pub fn run(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let classes = discover_classes(&cfg.datadir)
        .map_err(|e| anyhow::anyhow!("failed to scan dataset at {}: {e}", cfg.datadir.display()))?;
    println!("classes: {:?}", classes.classes);

    let summaries = summarize_dataset(&cfg.datadir, &classes, cfg.eda.dims_sample)
        .map_err(|e| anyhow::anyhow!("failed to summarize dataset: {e}"))?;
    if summaries.is_empty() {
        anyhow::bail!("no split directories under {}", cfg.datadir.display());
    }

    for summary in &summaries {
        let counts: Vec<String> = summary
            .counts
            .iter()
            .map(|c| format!("{}={}", c.class, c.count))
            .collect();
        println!(
            "{}: {} images ({})",
            summary.split,
            summary.total,
            counts.join(", ")
        );
        if let Some(dims) = &summary.dims {
            println!(
                "  dims over {} sampled: min {}x{}, max {}x{}, mean {:.0}x{:.0}",
                dims.sampled,
                dims.min.0,
                dims.min.1,
                dims.max.0,
                dims.max.1,
                dims.mean.0,
                dims.mean.1
            );
        }
    }

    let out_dir = cfg.output_dir("eda");
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let png_path = out_dir.join("class_distribution.png");
    plot::render_class_distribution(&summaries, &classes, &png_path)
        .with_context(|| format!("failed to render {}", png_path.display()))?;
    println!("saved {}", png_path.display());
    Ok(())
}
