//! Indexing class-folder datasets: `datadir/<split>/<class>/*.jpeg`.

use crate::types::{DatasetResult, SampleIndex, Split, XrayDatasetError};
use data_contracts::ClassMap;
use std::fs;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["bmp", "jpeg", "jpg", "png"];

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// List class subdirectory names of a split directory, sorted so class
/// indices are stable across scans.
pub fn list_classes(split_dir: &Path) -> DatasetResult<Vec<String>> {
    let entries = fs::read_dir(split_dir).map_err(|e| XrayDatasetError::Io {
        path: split_dir.to_path_buf(),
        source: e,
    })?;
    let mut names = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        return Err(XrayDatasetError::NoClasses {
            path: split_dir.to_path_buf(),
        });
    }
    names.sort();
    Ok(names)
}

/// Discover the class map from the train split, falling back to val/test
/// when train is absent.
pub fn discover_classes(datadir: &Path) -> DatasetResult<ClassMap> {
    for split in Split::all() {
        let dir = datadir.join(split.as_str());
        if dir.is_dir() {
            return Ok(ClassMap::from_names(list_classes(&dir)?));
        }
    }
    Err(XrayDatasetError::MissingSplit {
        path: datadir.to_path_buf(),
    })
}

/// Index all image files of one split, sorted per class for determinism.
/// A class directory missing from this split is warned about and counted
/// as empty rather than failing the scan.
pub fn index_split(
    datadir: &Path,
    split: Split,
    classes: &ClassMap,
) -> DatasetResult<Vec<SampleIndex>> {
    let split_dir = datadir.join(split.as_str());
    if !split_dir.is_dir() {
        return Err(XrayDatasetError::MissingSplit { path: split_dir });
    }

    let mut indices = Vec::new();
    for (class_idx, class) in classes.classes.iter().enumerate() {
        let class_dir = split_dir.join(class);
        if !class_dir.is_dir() {
            eprintln!(
                "Warning: class directory missing in {split}: {}",
                class_dir.display()
            );
            continue;
        }
        let entries = fs::read_dir(&class_dir).map_err(|e| XrayDatasetError::Io {
            path: class_dir.clone(),
            source: e,
        })?;
        let mut files: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        files.sort();
        indices.extend(files.into_iter().map(|image_path| SampleIndex {
            image_path,
            class_idx,
        }));
    }
    Ok(indices)
}
