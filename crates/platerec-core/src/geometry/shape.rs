use crate::geometry::point::LatLon;
use crate::geometry::rotation::FiniteRotation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Point,
    MultiPoint,
    Polyline,
    Polygon,
}

impl GeometryKind {
    pub fn label(self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::MultiPoint => "multi_point",
            GeometryKind::Polyline => "polyline",
            GeometryKind::Polygon => "polygon",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(LatLon),
    MultiPoint(Vec<LatLon>),
    Polyline(Vec<LatLon>),
    /// Exterior ring. The closing vertex is not repeated.
    Polygon(Vec<LatLon>),
}

impl Geometry {
    /// Classify a digitised segment the way line-format readers do:
    /// one point is a Point, a closed run of 4+ points is a Polygon, anything else a Polyline.
    pub fn from_segment(mut points: Vec<LatLon>) -> Option<Geometry> {
        match points.len() {
            0 => None,
            1 => Some(Geometry::Point(points[0])),
            n => {
                let closed = points[0].approx_eq(points[n - 1], 1e-9);
                if closed && n >= 4 {
                    points.pop();
                    Some(Geometry::Polygon(points))
                } else {
                    Some(Geometry::Polyline(points))
                }
            }
        }
    }

    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::MultiPoint(_) => GeometryKind::MultiPoint,
            Geometry::Polyline(_) => GeometryKind::Polyline,
            Geometry::Polygon(_) => GeometryKind::Polygon,
        }
    }

    pub fn points(&self) -> &[LatLon] {
        match self {
            Geometry::Point(p) => std::slice::from_ref(p),
            Geometry::MultiPoint(ps) | Geometry::Polyline(ps) | Geometry::Polygon(ps) => ps,
        }
    }

    /// Points as written to line-oriented formats; polygons repeat their first vertex.
    pub fn points_closed(&self) -> Vec<LatLon> {
        let mut out = self.points().to_vec();
        if let Geometry::Polygon(ring) = self {
            if let Some(first) = ring.first() {
                out.push(*first);
            }
        }
        out
    }

    pub fn rotated(&self, r: FiniteRotation) -> Geometry {
        let rot = |ps: &[LatLon]| ps.iter().map(|p| r.rotate(*p)).collect::<Vec<_>>();
        match self {
            Geometry::Point(p) => Geometry::Point(r.rotate(*p)),
            Geometry::MultiPoint(ps) => Geometry::MultiPoint(rot(ps)),
            Geometry::Polyline(ps) => Geometry::Polyline(rot(ps)),
            Geometry::Polygon(ps) => Geometry::Polygon(rot(ps)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_classification() {
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.0, 10.0);
        let c = LatLon::new(10.0, 10.0);
        assert_eq!(Geometry::from_segment(vec![]), None);
        assert_eq!(Geometry::from_segment(vec![a]).map(|g| g.kind()), Some(GeometryKind::Point));
        assert_eq!(
            Geometry::from_segment(vec![a, b, c]).map(|g| g.kind()),
            Some(GeometryKind::Polyline)
        );
        let poly = Geometry::from_segment(vec![a, b, c, a]).expect("polygon");
        assert_eq!(poly.kind(), GeometryKind::Polygon);
        assert_eq!(poly.points().len(), 3);
        assert_eq!(poly.points_closed().len(), 4);
    }
}
