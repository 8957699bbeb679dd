// crates/platerec-core/src/reconstruct.rs

use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::feature::{FeatureCollection, ValidTime};
use crate::format::{ExportFormat, ExportHeader};
use crate::geometry::Geometry;
use crate::rotation::model::RotationModel;
use crate::rotation::PlateId;

/// One geometry of one feature, moved to its position at the reconstruction time.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedFeature {
    pub name: String,
    pub plate_id: PlateId,
    pub valid_time: ValidTime,
    pub geometry: Geometry,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReconstructSummary {
    pub features: usize,
    pub geometries: usize,
    pub files: Vec<PathBuf>,
}

/// Reconstruct every feature that exists at `time`, relative to `anchor`.
/// Output preserves collection order, then feature order, then geometry order.
pub fn reconstruct_features(
    collections: &[FeatureCollection],
    model: &RotationModel,
    time: f64,
    anchor: PlateId,
) -> Result<Vec<ReconstructedFeature>> {
    let tree = model.tree(time, anchor)?;

    let mut out = Vec::new();
    for feature in collections.iter().flat_map(|c| c.features.iter()) {
        if !feature.exists_at(time) {
            continue;
        }
        let r = tree.equivalent_rotation(feature.plate_id)?;
        for g in &feature.geometries {
            out.push(ReconstructedFeature {
                name: feature.name.clone(),
                plate_id: feature.plate_id,
                valid_time: feature.valid_time,
                geometry: g.rotated(r),
            });
        }
    }
    Ok(out)
}

/// Reconstruct to `time` and export to `export_path`, picking the format
/// from its extension. The export is written even when nothing exists at `time`.
pub fn reconstruct(
    collections: &[FeatureCollection],
    model: &RotationModel,
    export_path: impl AsRef<Path>,
    time: f64,
    anchor: PlateId,
) -> Result<ReconstructSummary> {
    let export_path = export_path.as_ref();
    let format = ExportFormat::from_path(export_path)?;

    let items = reconstruct_features(collections, model, time, anchor)?;
    let features = collections
        .iter()
        .flat_map(|c| c.features.iter())
        .filter(|f| f.exists_at(time) && !f.geometries.is_empty())
        .count();

    let header = ExportHeader {
        reconstruction_time: time,
        anchor_plate_id: anchor,
    };
    let files = format.write(export_path, &items, &header)?;

    info!(
        "reconstructed {} features ({} geometries) to {} Ma, anchor {}",
        features,
        items.len(),
        time,
        anchor
    );

    Ok(ReconstructSummary {
        features,
        geometries: items.len(),
        files,
    })
}
