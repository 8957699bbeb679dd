// crates/platerec-core/src/format/geojson.rs

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::{EngineError, Result};
use crate::feature::{Feature, ValidTime};
use crate::geometry::{Geometry, LatLon};
use crate::reconstruct::ReconstructedFeature;
use crate::format::plate_id_from_f64;
use crate::rotation::PlateId;

pub fn parse(text: &str, path: &Path) -> Result<Vec<Feature>> {
    let root: Value = serde_json::from_str(text)?;
    let bad = |msg: String| EngineError::parse(path, 0, msg);

    let items: Vec<&Value> = match root.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => root
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| bad("FeatureCollection without features array".into()))?
            .iter()
            .collect(),
        Some("Feature") => vec![&root],
        other => return Err(bad(format!("unsupported GeoJSON root type {other:?}"))),
    };

    let mut features = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let empty = Map::new();
        let props = item.get("properties").and_then(Value::as_object).unwrap_or(&empty);

        let geometries = match item.get("geometry") {
            Some(Value::Null) | None => Vec::new(),
            Some(g) => parse_geometry(g).map_err(|msg| bad(format!("feature {i}: {msg}")))?,
        };

        let attr = |key: &str| {
            number_property(props, key).map_err(|msg| bad(format!("feature {i}: {key}: {msg}")))
        };
        let plate_id = match attr("PLATEID1")? {
            Some(v) => plate_id_from_f64(v).map_err(|msg| bad(format!("feature {i}: PLATEID1: {msg}")))?,
            None => 0,
        };
        let begin = attr("FROMAGE")?.unwrap_or(f64::INFINITY);
        let end = attr("TOAGE")?.unwrap_or(f64::NEG_INFINITY);
        let name = match props.get("NAME") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        features.push(Feature {
            name,
            plate_id,
            valid_time: ValidTime::from_ages(begin, end),
            geometries,
        });
    }
    Ok(features)
}

/// Numeric property as f64. Numbers and numeric strings are accepted;
/// absent, null and blank values read as None.
fn number_property(props: &Map<String, Value>, key: &str) -> std::result::Result<Option<f64>, String> {
    match props.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| format!("bad number {n}")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("not a number: {s:?}")),
        Some(other) => Err(format!("expected a number, found {other}")),
    }
}

fn parse_geometry(g: &Value) -> std::result::Result<Vec<Geometry>, String> {
    let kind = g.get("type").and_then(Value::as_str).unwrap_or_default();
    let coords = g.get("coordinates").ok_or("geometry without coordinates")?;

    let out = match kind {
        "Point" => vec![Geometry::Point(position(coords)?)],
        "MultiPoint" => vec![Geometry::MultiPoint(positions(coords)?)],
        "LineString" => vec![Geometry::Polyline(positions(coords)?)],
        "MultiLineString" => array(coords)?
            .iter()
            .map(|l| positions(l).map(Geometry::Polyline))
            .collect::<std::result::Result<Vec<Geometry>, _>>()?,
        "Polygon" => vec![polygon(coords)?],
        "MultiPolygon" => array(coords)?
            .iter()
            .map(polygon)
            .collect::<std::result::Result<Vec<Geometry>, _>>()?,
        other => return Err(format!("unsupported geometry type {other:?}")),
    };
    Ok(out)
}

fn array(v: &Value) -> std::result::Result<&Vec<Value>, String> {
    v.as_array().ok_or_else(|| format!("expected array, found {v}"))
}

fn position(v: &Value) -> std::result::Result<LatLon, String> {
    let a = array(v)?;
    match (a.first().and_then(Value::as_f64), a.get(1).and_then(Value::as_f64)) {
        (Some(lon), Some(lat)) => Ok(LatLon::new(lat, lon)),
        _ => Err(format!("bad position {v}")),
    }
}

fn positions(v: &Value) -> std::result::Result<Vec<LatLon>, String> {
    array(v)?.iter().map(position).collect()
}

fn polygon(v: &Value) -> std::result::Result<Geometry, String> {
    let rings = array(v)?;
    let exterior = rings.first().ok_or("polygon without rings")?;
    let mut ring = positions(exterior)?;
    if ring.len() >= 2 && ring[0].approx_eq(ring[ring.len() - 1], 1e-9) {
        ring.pop();
    }
    Ok(Geometry::Polygon(ring))
}

fn coordinates(points: &[LatLon]) -> Value {
    Value::Array(points.iter().map(|p| json!([p.lon, p.lat])).collect())
}

fn geometry_json(g: &Geometry) -> Value {
    match g {
        Geometry::Point(p) => json!({ "type": "Point", "coordinates": [p.lon, p.lat] }),
        Geometry::MultiPoint(ps) => json!({ "type": "MultiPoint", "coordinates": coordinates(ps) }),
        Geometry::Polyline(ps) => json!({ "type": "LineString", "coordinates": coordinates(ps) }),
        Geometry::Polygon(_) => json!({
            "type": "Polygon",
            "coordinates": [coordinates(&g.points_closed())],
        }),
    }
}

#[derive(Serialize)]
struct Properties<'a> {
    #[serde(rename = "NAME")]
    name: &'a str,
    #[serde(rename = "PLATEID1")]
    plate_id: PlateId,
    #[serde(rename = "FROMAGE")]
    from_age: f64,
    #[serde(rename = "TOAGE")]
    to_age: f64,
}

pub fn to_value(items: &[ReconstructedFeature]) -> Value {
    let features: Vec<Value> = items
        .iter()
        .map(|item| {
            let (from_age, to_age) = item.valid_time.to_ages();
            let properties = Properties {
                name: &item.name,
                plate_id: item.plate_id,
                from_age,
                to_age,
            };
            json!({
                "type": "Feature",
                "geometry": geometry_json(&item.geometry),
                "properties": properties,
            })
        })
        .collect();
    json!({ "type": "FeatureCollection", "features": features })
}

pub fn write(path: &Path, items: &[ReconstructedFeature]) -> Result<Vec<PathBuf>> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &to_value(items))?;
    writeln!(w).map_err(|e| EngineError::io(path, e))?;
    w.flush().map_err(|e| EngineError::io(path, e))?;

    info!("wrote {} ({} features)", path.display(), items.len());
    Ok(vec![path.to_path_buf()])
}
