// crates/platerec-cli/src/io/inputs.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use platerec_core::{FeatureCollection, RotationModel};

/// Build one rotation model from every rotation file.
pub fn load_rotation_model(paths: &[PathBuf]) -> Result<RotationModel> {
    let model = RotationModel::from_files(paths).with_context(|| {
        let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        format!("load rotation model from {}", names.join(", "))
    })?;
    Ok(model)
}

/// Load one feature collection per file, in argument order.
pub fn load_feature_collections(paths: &[PathBuf]) -> Result<Vec<FeatureCollection>> {
    paths
        .iter()
        .map(|p| FeatureCollection::from_file(p).with_context(|| format!("load features {}", p.display())))
        .collect()
}
