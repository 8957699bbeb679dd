pub mod point;
pub mod rotation;
pub mod shape;

pub use point::{LatLon, UnitVector3};
pub use rotation::FiniteRotation;
pub use shape::{Geometry, GeometryKind};
