use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered class-name list; the position of a name is its class index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMap {
    pub classes: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("class map is empty")]
    EmptyClasses,
    #[error("class name is empty at index {0}")]
    EmptyName(usize),
    #[error("duplicate class name: {0}")]
    DuplicateName(String),
}

impl ClassMap {
    /// Build a map from names, sorted so indices are stable across scans.
    pub fn from_names(mut names: Vec<String>) -> Self {
        names.sort();
        Self { classes: names }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class_to_idx(&self, name: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == name)
    }

    pub fn idx_to_class(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.classes.is_empty() {
            return Err(ValidationError::EmptyClasses);
        }
        for (i, name) in self.classes.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName(i));
            }
        }
        for (i, name) in self.classes.iter().enumerate() {
            if self.classes[i + 1..].contains(name) {
                return Err(ValidationError::DuplicateName(name.clone()));
            }
        }
        Ok(())
    }
}
