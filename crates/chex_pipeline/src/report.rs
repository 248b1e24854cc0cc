//! results.csv assembly for the evaluate task.

use std::fs;
use std::path::Path;

use anyhow::Context;
use training::ClassMetrics;

pub struct SplitResult {
    pub split: String,
    pub loss: f32,
    pub accuracy: f32,
    pub metrics: ClassMetrics,
}

/// Per-class vector cell, rounded to two decimals: `[0.97 0.88]`.
fn vector_cell(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.2}")).collect();
    format!("[{}]", parts.join(" "))
}

/// One column per split; always exactly the five metric rows.
pub fn render_results_csv(results: &[SplitResult]) -> String {
    let mut out = String::new();
    let header: Vec<&str> = results.iter().map(|r| r.split.as_str()).collect();
    out.push_str(&format!(",{}\n", header.join(",")));

    let row = |name: &str, cells: Vec<String>| format!("{name},{}\n", cells.join(","));
    out.push_str(&row(
        "Loss",
        results.iter().map(|r| format!("{:.6}", r.loss)).collect(),
    ));
    out.push_str(&row(
        "Accuracy",
        results
            .iter()
            .map(|r| format!("{:.6}", r.accuracy))
            .collect(),
    ));
    out.push_str(&row(
        "Precision",
        results
            .iter()
            .map(|r| vector_cell(&r.metrics.precision))
            .collect(),
    ));
    out.push_str(&row(
        "Recall",
        results
            .iter()
            .map(|r| vector_cell(&r.metrics.recall))
            .collect(),
    ));
    out.push_str(&row(
        "F1_Score",
        results.iter().map(|r| vector_cell(&r.metrics.f1)).collect(),
    ));
    out
}

pub fn write_results_csv(path: &Path, results: &[SplitResult]) -> anyhow::Result<()> {
    fs::write(path, render_results_csv(results))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
