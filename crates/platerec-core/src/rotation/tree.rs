// crates/platerec-core/src/rotation/tree.rs

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use log::debug;

use crate::error::{EngineError, Result};
use crate::geometry::FiniteRotation;
use crate::rotation::model::RotationModel;
use crate::rotation::PlateId;

/// Plate hierarchy frozen at one reconstruction time, relative to one anchor plate.
#[derive(Debug)]
pub struct RotationTree {
    time: f64,
    anchor: PlateId,
    edges: HashMap<PlateId, (PlateId, FiniteRotation)>,
    anchor_total: FiniteRotation,
    reported_missing: RefCell<HashSet<PlateId>>,
}

impl RotationTree {
    pub fn new(model: &RotationModel, time: f64, anchor: PlateId) -> Result<Self> {
        let mut edges = HashMap::new();
        for moving in model.moving_plate_ids() {
            if let Some(edge) = model.relative_rotation(moving, time) {
                edges.insert(moving, edge);
            }
        }

        let mut tree = Self {
            time,
            anchor,
            edges,
            anchor_total: FiniteRotation::IDENTITY,
            reported_missing: RefCell::new(HashSet::new()),
        };
        tree.anchor_total = tree.total_rotation(anchor)?;
        Ok(tree)
    }

    /// Rotation of `plate` relative to the root of its hierarchy.
    /// A plate without rotation data at this time is its own root.
    pub fn total_rotation(&self, plate: PlateId) -> Result<FiniteRotation> {
        if !self.edges.contains_key(&plate) && self.reported_missing.borrow_mut().insert(plate) {
            debug!("no rotation for plate {plate} at {} Ma, using identity", self.time);
        }

        let mut total = FiniteRotation::IDENTITY;
        let mut seen = HashSet::new();
        let mut cur = plate;
        while let Some(&(fixed, rel)) = self.edges.get(&cur) {
            if !seen.insert(cur) {
                return Err(EngineError::RotationCycle { plate: cur, time: self.time });
            }
            total = rel.compose(total);
            cur = fixed;
        }
        Ok(total)
    }

    /// Rotation of `plate` relative to the anchor plate.
    pub fn equivalent_rotation(&self, plate: PlateId) -> Result<FiniteRotation> {
        if plate == self.anchor {
            return Ok(FiniteRotation::IDENTITY);
        }
        let total = self.total_rotation(plate)?;
        Ok(self.anchor_total.inverse().compose(total))
    }
}
