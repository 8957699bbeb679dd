// crates/platerec-core/src/feature.rs

use std::path::{Path, PathBuf};

use log::info;

use crate::error::Result;
use crate::format::FeatureFormat;
use crate::geometry::Geometry;
use crate::rotation::PlateId;

/// Ages at or beyond these sentinels mean distant past / distant future.
pub const DISTANT_PAST_SENTINEL: f64 = 999.0;
pub const DISTANT_FUTURE_SENTINEL: f64 = -999.0;

/// Time span over which a feature exists. `begin` is the oldest time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidTime {
    pub begin: f64,
    pub end: f64,
}

impl Default for ValidTime {
    fn default() -> Self {
        Self::ALL_TIME
    }
}

impl ValidTime {
    pub const ALL_TIME: ValidTime = ValidTime {
        begin: f64::INFINITY,
        end: f64::NEG_INFINITY,
    };

    pub fn new(begin: f64, end: f64) -> Self {
        Self { begin, end }
    }

    /// Build from file ages, mapping the 999 / -999 sentinels to infinities.
    pub fn from_ages(begin: f64, end: f64) -> Self {
        let begin = if begin >= DISTANT_PAST_SENTINEL { f64::INFINITY } else { begin };
        let end = if end <= DISTANT_FUTURE_SENTINEL { f64::NEG_INFINITY } else { end };
        Self { begin, end }
    }

    /// Ages with infinities replaced by the 999 / -999 sentinels.
    pub fn to_ages(self) -> (f64, f64) {
        let begin = if self.begin.is_infinite() { DISTANT_PAST_SENTINEL } else { self.begin };
        let end = if self.end.is_infinite() { DISTANT_FUTURE_SENTINEL } else { self.end };
        (begin, end)
    }

    pub fn contains(&self, time: f64) -> bool {
        self.end <= time && time <= self.begin
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub name: String,
    pub plate_id: PlateId,
    pub valid_time: ValidTime,
    pub geometries: Vec<Geometry>,
}

impl Feature {
    pub fn exists_at(&self, time: f64) -> bool {
        self.valid_time.contains(time)
    }
}

/// Features loaded from one file, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCollection {
    pub source: PathBuf,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(source: impl Into<PathBuf>, features: Vec<Feature>) -> Self {
        Self {
            source: source.into(),
            features,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FeatureFormat::from_path(path)?;
        let features = format.read(path)?;
        info!(
            "loaded feature file {} ({:?}): {} features",
            path.display(),
            format,
            features.len()
        );
        Ok(Self::new(path, features))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_ages_map_to_infinity() {
        let vt = ValidTime::from_ages(999.0, -999.0);
        assert_eq!(vt, ValidTime::ALL_TIME);
        assert_eq!(vt.to_ages(), (999.0, -999.0));
        assert!(vt.contains(4000.0));

        let vt = ValidTime::from_ages(200.0, 50.0);
        assert!(vt.contains(50.0));
        assert!(vt.contains(200.0));
        assert!(!vt.contains(49.9));
        assert!(!vt.contains(200.1));
    }
}
