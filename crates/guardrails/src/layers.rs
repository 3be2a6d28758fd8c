//! Layer classification
//!
//! Maps paths and module specifiers onto the ordered layer table by path
//! segment. The first layer found when scanning the table in ascending
//! level order wins, so no path resolves to two layers.

use crate::config::LayerSpec;
use crate::{GuardrailsError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Component, Path};

/// A file's (or module path's) position in the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerAssignment {
    pub layer: String,
    pub level: u32,
}

/// Ordered layer table, fixed for a run
#[derive(Debug, Clone)]
pub struct LayerTable {
    layers: Vec<LayerSpec>,
}

impl LayerTable {
    /// Build the table, sorted ascending by level.
    ///
    /// Duplicate names or levels break the strict chain and are rejected.
    pub fn new(specs: &[LayerSpec]) -> Result<Self> {
        let mut names = HashSet::new();
        let mut levels = HashSet::new();
        for spec in specs {
            if !names.insert(spec.name.as_str()) || !levels.insert(spec.level) {
                return Err(GuardrailsError::Config(format!(
                    "layer table is not a strict chain at `{}` (level {})",
                    spec.name, spec.level
                )));
            }
        }

        let mut layers = specs.to_vec();
        layers.sort_by_key(|l| l.level);
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Classify a file path (relative to the scan root)
    pub fn classify_path(&self, path: &Path) -> Option<LayerAssignment> {
        let segments: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect();
        self.first_match(&segments)
    }

    /// Classify a literal module specifier such as `../composed/Card`
    pub fn classify_module(&self, module_path: &str) -> Option<LayerAssignment> {
        let segments: Vec<&str> = module_path.split('/').collect();
        self.first_match(&segments)
    }

    fn first_match(&self, segments: &[&str]) -> Option<LayerAssignment> {
        self.layers
            .iter()
            .find(|layer| segments.iter().any(|s| *s == layer.name))
            .map(|layer| LayerAssignment {
                layer: layer.name.clone(),
                level: layer.level,
            })
    }
}
