// crates/platerec-core/src/format/mod.rs

//! Feature file readers and reconstructed-geometry writers, chosen by file extension.

pub mod geojson;
pub mod gmt;
pub mod gpml;
pub mod plates4;
pub mod shapefile;

use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};
use crate::feature::Feature;
use crate::reconstruct::ReconstructedFeature;
use crate::rotation::PlateId;

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Plate id stored as a number in attribute tables: must be a non-negative integer that fits `PlateId`.
pub(crate) fn plate_id_from_f64(v: f64) -> std::result::Result<PlateId, String> {
    if !v.is_finite() || v.fract() != 0.0 || v < 0.0 {
        return Err(format!("not a plate id: {v}"));
    }
    if v > PlateId::MAX as f64 {
        return Err(format!("plate id {v} out of range"));
    }
    PlateId::try_from(v as u64).map_err(|_| format!("plate id {v} out of range"))
}

/// Readable feature file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureFormat {
    Plates4,
    Gmt,
    GeoJson,
    Gpml,
    Shapefile,
}

impl FeatureFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = extension_of(path).unwrap_or_default();
        match ext.as_str() {
            "dat" | "pla" | "platesline" => Ok(FeatureFormat::Plates4),
            "gmt" | "xy" => Ok(FeatureFormat::Gmt),
            "geojson" | "json" => Ok(FeatureFormat::GeoJson),
            "gpml" => Ok(FeatureFormat::Gpml),
            "shp" => Ok(FeatureFormat::Shapefile),
            _ => Err(EngineError::UnsupportedFormat(format!(
                "cannot read features from {} (extension {ext:?})",
                path.display()
            ))),
        }
    }

    pub fn read(self, path: &Path) -> Result<Vec<Feature>> {
        let text = || std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e));
        match self {
            FeatureFormat::Plates4 => plates4::parse(&text()?, path),
            FeatureFormat::Gmt => gmt::parse(&text()?, path),
            FeatureFormat::GeoJson => geojson::parse(&text()?, path),
            FeatureFormat::Gpml => gpml::parse(&text()?, path),
            FeatureFormat::Shapefile => shapefile::read(path),
        }
    }
}

/// Writable export formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Gmt,
    Xy,
    Shapefile,
    GeoJson,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gmt" => Some(ExportFormat::Gmt),
            "xy" => Some(ExportFormat::Xy),
            "shp" => Some(ExportFormat::Shapefile),
            "geojson" | "json" => Some(ExportFormat::GeoJson),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = extension_of(path).unwrap_or_default();
        Self::from_extension(&ext).ok_or_else(|| {
            EngineError::UnsupportedFormat(format!(
                "cannot export to {} (supported extensions: gmt, xy, shp, geojson)",
                path.display()
            ))
        })
    }

    /// Write `items` to `path`. Returns every file created.
    pub fn write(self, path: &Path, items: &[ReconstructedFeature], header: &ExportHeader) -> Result<Vec<PathBuf>> {
        match self {
            ExportFormat::Gmt => gmt::write(path, items, header, true),
            ExportFormat::Xy => gmt::write(path, items, header, false),
            ExportFormat::GeoJson => geojson::write(path, items),
            ExportFormat::Shapefile => shapefile::write(path, items),
        }
    }
}

/// Context stamped into exports that carry a header.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportHeader {
    pub reconstruction_time: f64,
    pub anchor_plate_id: PlateId,
}
