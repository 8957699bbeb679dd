//! Points on the unit sphere.

/// Geographic position in degrees. Latitude in [-90, 90], longitude in (-180, 180].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn to_unit_vector(self) -> UnitVector3 {
        let lat = self.lat.to_radians();
        let lon = self.lon.to_radians();
        UnitVector3 {
            x: lat.cos() * lon.cos(),
            y: lat.cos() * lon.sin(),
            z: lat.sin(),
        }
    }

    /// Same position within `tol` degrees. Longitudes at the poles are ignored.
    pub fn approx_eq(self, other: LatLon, tol: f64) -> bool {
        self.to_unit_vector().angle_to(other.to_unit_vector()).to_degrees() <= tol
    }
}

/// Cartesian point on the unit sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitVector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl UnitVector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, o: UnitVector3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: UnitVector3) -> UnitVector3 {
        UnitVector3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    /// Great-circle angle in radians.
    pub fn angle_to(self, o: UnitVector3) -> f64 {
        self.cross(o).norm().atan2(self.dot(o))
    }

    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Rescale onto the sphere. The zero vector maps to the north pole.
    pub fn normalized(self) -> UnitVector3 {
        let n = self.norm();
        if n == 0.0 {
            return UnitVector3::new(0.0, 0.0, 1.0);
        }
        UnitVector3::new(self.x / n, self.y / n, self.z / n)
    }

    pub fn to_lat_lon(self) -> LatLon {
        let v = self.normalized();
        let lat = v.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = if v.x.abs() < 1e-15 && v.y.abs() < 1e-15 {
            0.0
        } else {
            v.y.atan2(v.x).to_degrees()
        };
        LatLon { lat, lon }
    }
}
