//! Host-side classification metric bookkeeping.
//!
//! All metrics run over plain `usize` prediction/target vectors pulled off
//! the backend; nothing here touches tensors.

/// Square count matrix indexed `[target][prediction]`.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    counts: Vec<usize>,
    num_classes: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ClassMetrics {
    pub precision: Vec<f32>,
    pub recall: Vec<f32>,
    pub f1: Vec<f32>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        let num_classes = num_classes.max(1);
        Self {
            counts: vec![0; num_classes * num_classes],
            num_classes,
        }
    }

    pub fn from_pairs(targets: &[usize], preds: &[usize], num_classes: usize) -> Self {
        let mut cm = Self::new(num_classes);
        for (t, p) in targets.iter().zip(preds.iter()) {
            cm.record(*t, *p);
        }
        cm
    }

    /// Out-of-range indices are ignored rather than panicking; the loader
    /// guarantees in-range classes, predictions come from argmax.
    pub fn record(&mut self, target: usize, pred: usize) {
        if target < self.num_classes && pred < self.num_classes {
            self.counts[target * self.num_classes + pred] += 1;
        }
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn count(&self, target: usize, pred: usize) -> usize {
        self.counts[target * self.num_classes + pred]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Samples whose target is `class`.
    pub fn target_total(&self, class: usize) -> usize {
        (0..self.num_classes).map(|p| self.count(class, p)).sum()
    }

    /// Samples predicted as `class`.
    pub fn predicted_total(&self, class: usize) -> usize {
        (0..self.num_classes).map(|t| self.count(t, class)).sum()
    }

    pub fn correct(&self, class: usize) -> usize {
        self.count(class, class)
    }

    /// Diagonal sum: correctly classified samples across all classes.
    pub fn correct_total(&self) -> usize {
        (0..self.num_classes).map(|c| self.correct(c)).sum()
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.correct_total() as f32 / total as f32
    }

    /// Largest single cell count; used to scale heatmap rendering.
    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

fn ratio(num: usize, denom: usize) -> f32 {
    if denom == 0 {
        0.0
    } else {
        num as f32 / denom as f32
    }
}

/// Row-wise argmax over host-copied logits laid out `[rows, width]`.
/// Trailing values that do not fill a row are ignored.
pub fn argmax_rows(values: &[f32], width: usize) -> Vec<usize> {
    let width = width.max(1);
    values
        .chunks_exact(width)
        .map(|row| {
            let mut best = 0usize;
            for (i, v) in row.iter().enumerate() {
                if *v > row[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// Per-class precision/recall/F1. Classes with no predictions (or no
/// targets) score 0.0 for the undefined ratio.
pub fn precision_recall_f1(cm: &ConfusionMatrix) -> ClassMetrics {
    let mut out = ClassMetrics::default();
    for class in 0..cm.num_classes() {
        let tp = cm.correct(class);
        let precision = ratio(tp, cm.predicted_total(class));
        let recall = ratio(tp, cm.target_total(class));
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        out.precision.push(precision);
        out.recall.push(recall);
        out.f1.push(f1);
    }
    out
}
