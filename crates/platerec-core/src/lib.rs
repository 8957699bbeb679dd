//! Plate reconstruction engine: rotation models, feature collections and
//! reconstructed-geometry export.

pub mod error;
pub mod version;

pub mod feature;
pub mod format;
pub mod geometry;
pub mod reconstruct;
pub mod rotation;

pub use crate::error::{EngineError, Result};
pub use crate::feature::{Feature, FeatureCollection, ValidTime};
pub use crate::format::{ExportFormat, FeatureFormat};
pub use crate::geometry::{FiniteRotation, Geometry, GeometryKind, LatLon};
pub use crate::reconstruct::{reconstruct, reconstruct_features, ReconstructSummary, ReconstructedFeature};
pub use crate::rotation::model::RotationModel;
pub use crate::rotation::tree::RotationTree;
pub use crate::rotation::PlateId;
pub use crate::version::{Capabilities, Version};
