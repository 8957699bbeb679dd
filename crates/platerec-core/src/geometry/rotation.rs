// crates/platerec-core/src/geometry/rotation.rs

use crate::geometry::point::{LatLon, UnitVector3};

/// Finite rotation about an Euler pole, stored as a unit quaternion.
///
/// Positive angles rotate counter-clockwise when viewed from above the pole
/// (right-hand rule about the pole axis).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FiniteRotation {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for FiniteRotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl FiniteRotation {
    pub const IDENTITY: FiniteRotation = FiniteRotation { w: 1.0, x: 0.0, y: 0.0, z: 0.0 };

    pub fn from_pole(pole: LatLon, angle_deg: f64) -> Self {
        let axis = pole.to_unit_vector();
        let half = angle_deg.to_radians() * 0.5;
        let s = half.sin();
        FiniteRotation {
            w: half.cos(),
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
        .normalized()
    }

    /// Euler pole and angle (degrees) with the angle in [0, 180].
    /// The identity maps to the north pole with a zero angle.
    pub fn to_pole(self) -> (LatLon, f64) {
        let q = if self.w < 0.0 { self.negated() } else { self };
        let w = q.w.clamp(-1.0, 1.0);
        let half = w.acos();
        let s = half.sin();
        if s.abs() < 1e-12 {
            return (LatLon::new(90.0, 0.0), 0.0);
        }
        let axis = UnitVector3::new(q.x / s, q.y / s, q.z / s);
        (axis.to_lat_lon(), (2.0 * half).to_degrees())
    }

    pub fn is_identity(self, tol: f64) -> bool {
        self.to_pole().1.abs() <= tol
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    pub fn compose(self, other: FiniteRotation) -> FiniteRotation {
        let (a, b) = (self, other);
        FiniteRotation {
            w: a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
            x: a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            y: a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            z: a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
        }
        .normalized()
    }

    pub fn inverse(self) -> FiniteRotation {
        FiniteRotation { w: self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    pub fn rotate_vector(self, v: UnitVector3) -> UnitVector3 {
        // v' = v + w*t + q × t, with t = 2 (q × v)
        let (qx, qy, qz) = (self.x, self.y, self.z);
        let tx = 2.0 * (qy * v.z - qz * v.y);
        let ty = 2.0 * (qz * v.x - qx * v.z);
        let tz = 2.0 * (qx * v.y - qy * v.x);
        UnitVector3::new(
            v.x + self.w * tx + (qy * tz - qz * ty),
            v.y + self.w * ty + (qz * tx - qx * tz),
            v.z + self.w * tz + (qx * ty - qy * tx),
        )
    }

    pub fn rotate(self, p: LatLon) -> LatLon {
        self.rotate_vector(p.to_unit_vector()).to_lat_lon()
    }

    /// Spherical linear interpolation from `self` (f=0) to `to` (f=1) along the shorter arc.
    pub fn slerp(self, to: FiniteRotation, f: f64) -> FiniteRotation {
        let mut b = to;
        let mut d = self.dot(b);
        if d < 0.0 {
            b = b.negated();
            d = -d;
        }

        if d > 0.9995 {
            return FiniteRotation {
                w: self.w + f * (b.w - self.w),
                x: self.x + f * (b.x - self.x),
                y: self.y + f * (b.y - self.y),
                z: self.z + f * (b.z - self.z),
            }
            .normalized();
        }

        let theta = d.clamp(-1.0, 1.0).acos();
        let sin_theta = theta.sin();
        let s0 = ((1.0 - f) * theta).sin() / sin_theta;
        let s1 = (f * theta).sin() / sin_theta;
        FiniteRotation {
            w: s0 * self.w + s1 * b.w,
            x: s0 * self.x + s1 * b.x,
            y: s0 * self.y + s1 * b.y,
            z: s0 * self.z + s1 * b.z,
        }
        .normalized()
    }

    fn dot(self, o: FiniteRotation) -> f64 {
        self.w * o.w + self.x * o.x + self.y * o.y + self.z * o.z
    }

    fn negated(self) -> FiniteRotation {
        FiniteRotation { w: -self.w, x: -self.x, y: -self.y, z: -self.z }
    }

    fn normalized(self) -> FiniteRotation {
        let n = self.dot(self).sqrt();
        if n == 0.0 {
            return FiniteRotation::IDENTITY;
        }
        FiniteRotation { w: self.w / n, x: self.x / n, y: self.y / n, z: self.z / n }
    }
}
