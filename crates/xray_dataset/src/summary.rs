//! Per-split dataset summaries for exploratory data analysis.

use crate::folder::index_split;
use crate::types::{ClassCount, DatasetResult, DimStats, Split, SplitSummary};
use data_contracts::ClassMap;
use std::path::Path;

/// Summarize one split: per-class counts plus dimension statistics over a
/// bounded sample of files (`dims_sample` = 0 skips the decode entirely).
pub fn summarize_split(
    datadir: &Path,
    split: Split,
    classes: &ClassMap,
    dims_sample: usize,
) -> DatasetResult<SplitSummary> {
    let indices = index_split(datadir, split, classes)?;

    let mut counts: Vec<ClassCount> = classes
        .classes
        .iter()
        .map(|class| ClassCount {
            class: class.clone(),
            count: 0,
        })
        .collect();
    for idx in &indices {
        if let Some(entry) = counts.get_mut(idx.class_idx) {
            entry.count += 1;
        }
    }

    let mut dims = None;
    if dims_sample > 0 && !indices.is_empty() {
        // Spread the sample across the index instead of reading a prefix,
        // so both classes contribute.
        let stride = (indices.len() / dims_sample.min(indices.len())).max(1);
        let mut sampled = 0usize;
        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut sum = (0f64, 0f64);
        for idx in indices.iter().step_by(stride).take(dims_sample) {
            let (w, h) = match image::image_dimensions(&idx.image_path) {
                Ok(dims) => dims,
                Err(e) => {
                    eprintln!(
                        "Warning: could not read dimensions of {}: {e}",
                        idx.image_path.display()
                    );
                    continue;
                }
            };
            sampled += 1;
            min = (min.0.min(w), min.1.min(h));
            max = (max.0.max(w), max.1.max(h));
            sum = (sum.0 + w as f64, sum.1 + h as f64);
        }
        if sampled > 0 {
            dims = Some(DimStats {
                sampled,
                min,
                max,
                mean: (
                    (sum.0 / sampled as f64) as f32,
                    (sum.1 / sampled as f64) as f32,
                ),
            });
        }
    }

    Ok(SplitSummary {
        split: split.as_str().to_string(),
        total: indices.len(),
        counts,
        dims,
    })
}

/// Summarize every split that exists under `datadir`; missing splits are
/// warned about and omitted.
pub fn summarize_dataset(
    datadir: &Path,
    classes: &ClassMap,
    dims_sample: usize,
) -> DatasetResult<Vec<SplitSummary>> {
    let mut summaries = Vec::new();
    for split in Split::all() {
        if !datadir.join(split.as_str()).is_dir() {
            eprintln!("Warning: split directory missing, skipping: {split}");
            continue;
        }
        summaries.push(summarize_split(datadir, split, classes, dims_sample)?);
    }
    Ok(summaries)
}
