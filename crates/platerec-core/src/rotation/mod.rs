pub mod file;
pub mod model;
pub mod tree;

use crate::geometry::{FiniteRotation, LatLon};

pub type PlateId = u32;

/// Moving plate id reserved for comment sequences in rotation files.
pub const COMMENT_PLATE_ID: PlateId = 999;

/// Tolerance used when matching a time against pole times.
pub const TIME_EPSILON: f64 = 1e-9;

/// One total reconstruction pole: rotation of `moving` relative to `fixed` at `time` Ma.
#[derive(Clone, Debug, PartialEq)]
pub struct TotalReconstructionPole {
    pub moving: PlateId,
    pub fixed: PlateId,
    pub time: f64,
    pub pole: LatLon,
    pub angle: f64,
    pub comment: String,
}

impl TotalReconstructionPole {
    pub fn rotation(&self) -> FiniteRotation {
        FiniteRotation::from_pole(self.pole, self.angle)
    }
}

/// Consecutive poles sharing one (moving, fixed) pair, sorted by time.
#[derive(Clone, Debug, PartialEq)]
pub struct RotationSequence {
    pub moving: PlateId,
    pub fixed: PlateId,
    pub poles: Vec<TotalReconstructionPole>,
}

impl RotationSequence {
    pub fn begin_time(&self) -> f64 {
        self.poles.first().map(|p| p.time).unwrap_or(0.0)
    }

    pub fn end_time(&self) -> f64 {
        self.poles.last().map(|p| p.time).unwrap_or(0.0)
    }

    pub fn contains(&self, t: f64) -> bool {
        !self.poles.is_empty()
            && t >= self.begin_time() - TIME_EPSILON
            && t <= self.end_time() + TIME_EPSILON
    }

    /// Interpolated rotation at `t`, or None outside the sequence span.
    pub fn rotation_at(&self, t: f64) -> Option<FiniteRotation> {
        if !self.contains(t) {
            return None;
        }
        for p in &self.poles {
            if (p.time - t).abs() <= TIME_EPSILON {
                return Some(p.rotation());
            }
        }
        for w in self.poles.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if a.time <= t && t <= b.time {
                let f = (t - a.time) / (b.time - a.time);
                return Some(a.rotation().slerp(b.rotation(), f));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pole(time: f64, angle: f64) -> TotalReconstructionPole {
        TotalReconstructionPole {
            moving: 101,
            fixed: 0,
            time,
            pole: LatLon::new(90.0, 0.0),
            angle,
            comment: String::new(),
        }
    }

    #[test]
    fn rotation_at_interpolates_and_bounds() {
        let seq = RotationSequence {
            moving: 101,
            fixed: 0,
            poles: vec![pole(0.0, 0.0), pole(10.0, 10.0), pole(30.0, 20.0)],
        };
        assert!(seq.rotation_at(-1.0).is_none());
        assert!(seq.rotation_at(30.5).is_none());
        let (_, a) = seq.rotation_at(20.0).expect("inside").to_pole();
        assert!((a - 15.0).abs() < 1e-9, "{a}");
        let (_, a) = seq.rotation_at(30.0).expect("last pole").to_pole();
        assert!((a - 20.0).abs() < 1e-9, "{a}");
    }
}
