//! Read-only listing of the on-disk template catalog

use crate::error::ScanError;
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const TEMPLATE_EXTENSION: &str = "yaml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub path: String,
    pub categories: Vec<Category>,
}

/// List visible top-level categories with their template counts, largest first.
pub fn read_catalog(root: &Path) -> Result<Catalog, ScanError> {
    let catalog_err = |source: std::io::Error| ScanError::Catalog {
        path: root.display().to_string(),
        source,
    };

    let mut categories = Vec::new();
    for entry in fs::read_dir(root).map_err(catalog_err)? {
        let entry = entry.map_err(catalog_err)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if name.starts_with('.') || !path.is_dir() {
            continue;
        }
        let count = count_templates(&path).map_err(catalog_err)?;
        categories.push(Category { name, count });
    }

    categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    Ok(Catalog {
        path: root.display().to_string(),
        categories,
    })
}

fn count_templates(dir: &Path) -> std::io::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_template = path
            .extension()
            .map_or(false, |ext| ext == TEMPLATE_EXTENSION);
        if is_template && path.is_file() {
            count += 1;
        }
    }
    Ok(count)
}
