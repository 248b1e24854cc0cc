//! Pixel-level rendering of the pipeline's output PNGs: confusion-matrix
//! heatmaps and class-distribution bar charts. Everything is drawn directly
//! with `put_pixel`; counts are printed with a small built-in digit font.

use std::path::Path;

use data_contracts::ClassMap;
use image::{Rgb, RgbImage};
use training::ConfusionMatrix;
use xray_dataset::SplitSummary;

const CELL: u32 = 96;
const MARGIN: u32 = 20;
const GRID: Rgb<u8> = Rgb([64, 64, 64]);
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Bar colors by class index; wraps for more classes than entries.
const CLASS_COLORS: &[Rgb<u8>] = &[
    Rgb([70, 130, 180]),
    Rgb([178, 34, 34]),
    Rgb([218, 165, 32]),
    Rgb([46, 139, 87]),
];

/// 3x5 digit glyphs, one row per byte, low three bits used.
const DIGIT_GLYPHS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
    let (iw, ih) = img.dimensions();
    for y in y0..y0.saturating_add(h).min(ih) {
        for x in x0..x0.saturating_add(w).min(iw) {
            img.put_pixel(x, y, color);
        }
    }
}

fn draw_digit(img: &mut RgbImage, digit: usize, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let glyph = DIGIT_GLYPHS[digit.min(9)];
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..3u32 {
            if bits & (0b100 >> col) != 0 {
                fill_rect(
                    img,
                    x + col * scale,
                    y + row as u32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }
}

/// Pixel width of a rendered number at the given scale.
fn number_width(value: usize, scale: u32) -> u32 {
    let digits = value.to_string().len() as u32;
    digits * 4 * scale - scale
}

fn draw_number(img: &mut RgbImage, value: usize, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let mut cursor = x;
    for ch in value.to_string().bytes() {
        draw_digit(img, (ch - b'0') as usize, cursor, y, scale, color);
        cursor += 4 * scale;
    }
}

/// White-to-dark-blue ramp over `t` in [0, 1].
fn heat_color(t: f32) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t).round() as u8 };
    Rgb([lerp(255, 8), lerp(255, 48), lerp(255, 107)])
}

/// Render the confusion matrix as a heatmap grid with the raw counts drawn
/// into the cells. Rows are actual classes, columns predicted, in class-map
/// order; the caller's stdout report carries the labels.
pub fn render_confusion_matrix(
    cm: &ConfusionMatrix,
    classes: &ClassMap,
    path: &Path,
) -> anyhow::Result<()> {
    let n = cm.num_classes() as u32;
    let side = MARGIN * 2 + n * CELL;
    let mut img = RgbImage::from_pixel(side, side, BACKGROUND);

    let max = cm.max_count().max(1) as f32;
    for target in 0..cm.num_classes() {
        for pred in 0..cm.num_classes() {
            let x0 = MARGIN + pred as u32 * CELL;
            let y0 = MARGIN + target as u32 * CELL;
            let count = cm.count(target, pred);
            let t = count as f32 / max;
            fill_rect(&mut img, x0, y0, CELL, CELL, heat_color(t));

            let scale = 4;
            let w = number_width(count, scale);
            let text_color = if t > 0.5 {
                Rgb([255, 255, 255])
            } else {
                Rgb([16, 16, 16])
            };
            let tx = x0 + (CELL.saturating_sub(w)) / 2;
            let ty = y0 + (CELL - 5 * scale) / 2;
            draw_number(&mut img, count, tx, ty, scale, text_color);
        }
    }

    // Grid lines around the cells.
    for line in 0..=n {
        let offset = MARGIN + line * CELL;
        fill_rect(&mut img, MARGIN, offset, n * CELL + 1, 1, GRID);
        fill_rect(&mut img, offset, MARGIN, 1, n * CELL + 1, GRID);
    }

    println!(
        "confusion matrix rows=actual cols=predicted, class order: {}",
        classes.classes.join(", ")
    );
    img.save(path)?;
    Ok(())
}

/// Grouped bar chart of per-class image counts, one group per split.
pub fn render_class_distribution(
    summaries: &[SplitSummary],
    classes: &ClassMap,
    path: &Path,
) -> anyhow::Result<()> {
    let bar_w: u32 = 40;
    let bar_gap: u32 = 8;
    let group_gap: u32 = 32;
    let chart_h: u32 = 220;
    let label_h: u32 = 14;

    let classes_per_group = classes.len() as u32;
    let group_w = classes_per_group * bar_w + (classes_per_group.saturating_sub(1)) * bar_gap;
    let groups = summaries.len().max(1) as u32;
    let width = MARGIN * 2 + groups * group_w + (groups - 1) * group_gap;
    let height = MARGIN * 2 + label_h + chart_h;
    let mut img = RgbImage::from_pixel(width, height, BACKGROUND);

    let max_count = summaries
        .iter()
        .flat_map(|s| s.counts.iter().map(|c| c.count))
        .max()
        .unwrap_or(0)
        .max(1) as f32;

    let baseline = MARGIN + label_h + chart_h;
    for (g, summary) in summaries.iter().enumerate() {
        let group_x = MARGIN + g as u32 * (group_w + group_gap);
        for (c, entry) in summary.counts.iter().enumerate() {
            let x0 = group_x + c as u32 * (bar_w + bar_gap);
            let h = ((entry.count as f32 / max_count) * chart_h as f32).round() as u32;
            let color = CLASS_COLORS[c % CLASS_COLORS.len()];
            fill_rect(&mut img, x0, baseline - h, bar_w, h, color);

            let scale = 2;
            let w = number_width(entry.count, scale);
            let tx = x0 + bar_w.saturating_sub(w) / 2;
            let ty = (baseline - h).saturating_sub(5 * scale + 2);
            draw_number(&mut img, entry.count, tx, ty, scale, Rgb([16, 16, 16]));
        }
    }

    // Baseline axis under the bars.
    fill_rect(&mut img, MARGIN / 2, baseline, width - MARGIN, 2, GRID);

    img.save(path)?;
    Ok(())
}
