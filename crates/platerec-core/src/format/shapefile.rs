// crates/platerec-core/src/format/shapefile.rs

//! ESRI shapefile reader (.shp + .dbf) and writer (.shp / .shx / .dbf / .prj).
//!
//! .shp layout:
//! header[100]: file_code:i32be=9994 unused[5]:i32be len_words:i32be
//!              version:i32le=1000 shape_type:i32le bbox[4]:f64le zm[4]:f64le
//! records:     rec_no:i32be content_words:i32be content[..]
//!
//! .shx carries the same header followed by (offset_words:i32be, content_words:i32be) per record.
//! A shapefile holds a single shape type, so mixed exports are split per type.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{EngineError, Result};
use crate::feature::{Feature, ValidTime};
use crate::format::plate_id_from_f64;
use crate::geometry::{Geometry, GeometryKind, LatLon};
use crate::reconstruct::ReconstructedFeature;

const FILE_CODE: i32 = 9994;
const VERSION: i32 = 1000;
const HEADER_LEN: usize = 100;

const WGS84_PRJ: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],UNIT[\"Degree\",0.0174532925199433]]";

const NAME_LEN: usize = 80;
const PLATE_LEN: usize = 10;
const AGE_LEN: usize = 13;
const AGE_DECIMALS: usize = 4;

fn shape_type(kind: GeometryKind) -> i32 {
    match kind {
        GeometryKind::Point => 1,
        GeometryKind::Polyline => 3,
        GeometryKind::Polygon => 5,
        GeometryKind::MultiPoint => 8,
    }
}

/// Write `items` as one shapefile per geometry kind. Returns every file created.
pub fn write(path: &Path, items: &[ReconstructedFeature]) -> Result<Vec<PathBuf>> {
    let mut kinds: Vec<GeometryKind> = Vec::new();
    for item in items {
        let k = item.geometry.kind();
        if !kinds.contains(&k) {
            kinds.push(k);
        }
    }

    if kinds.len() <= 1 {
        let kind = kinds.first().copied().unwrap_or(GeometryKind::Polyline);
        let refs: Vec<&ReconstructedFeature> = items.iter().collect();
        return write_layer(path, kind, &refs);
    }

    let mut written = Vec::new();
    for kind in kinds {
        let layer: Vec<&ReconstructedFeature> =
            items.iter().filter(|i| i.geometry.kind() == kind).collect();
        written.extend(write_layer(&suffixed(path, kind), kind, &layer)?);
    }
    Ok(written)
}

fn suffixed(path: &Path, kind: GeometryKind) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}_{}.shp", kind.label()))
}

fn write_layer(path: &Path, kind: GeometryKind, items: &[&ReconstructedFeature]) -> Result<Vec<PathBuf>> {
    let (shp, shx) = encode_shapes(kind, items)?;
    let dbf = encode_dbf(items)?;

    let shx_path = path.with_extension("shx");
    let dbf_path = path.with_extension("dbf");
    let prj_path = path.with_extension("prj");

    std::fs::write(path, shp).map_err(|e| EngineError::io(path, e))?;
    std::fs::write(&shx_path, shx).map_err(|e| EngineError::io(&shx_path, e))?;
    std::fs::write(&dbf_path, dbf).map_err(|e| EngineError::io(&dbf_path, e))?;
    std::fs::write(&prj_path, WGS84_PRJ).map_err(|e| EngineError::io(&prj_path, e))?;

    info!(
        "wrote {} ({} {} records)",
        path.display(),
        items.len(),
        kind.label()
    );
    Ok(vec![path.to_path_buf(), shx_path, dbf_path, prj_path])
}

#[derive(Clone, Copy, Debug, Default)]
struct BBox {
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

impl BBox {
    fn of<'a>(points: impl IntoIterator<Item = &'a LatLon>) -> Option<BBox> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = BBox {
            xmin: first.lon,
            ymin: first.lat,
            xmax: first.lon,
            ymax: first.lat,
        };
        for p in it {
            b.xmin = b.xmin.min(p.lon);
            b.ymin = b.ymin.min(p.lat);
            b.xmax = b.xmax.max(p.lon);
            b.ymax = b.ymax.max(p.lat);
        }
        Some(b)
    }

    fn union(self, o: BBox) -> BBox {
        BBox {
            xmin: self.xmin.min(o.xmin),
            ymin: self.ymin.min(o.ymin),
            xmax: self.xmax.max(o.xmax),
            ymax: self.ymax.max(o.ymax),
        }
    }

    fn put(&self, b: &mut Vec<u8>) {
        for v in [self.xmin, self.ymin, self.xmax, self.ymax] {
            b.extend_from_slice(&v.to_le_bytes());
        }
    }
}

/// Vertices as stored in the .shp: polygons are closed and wound clockwise.
fn shape_points(g: &Geometry) -> Vec<LatLon> {
    match g {
        Geometry::Polygon(ring) => {
            let mut ring = ring.clone();
            if signed_area(&ring) > 0.0 {
                ring.reverse();
            }
            if let Some(first) = ring.first().copied() {
                ring.push(first);
            }
            ring
        }
        _ => g.points().to_vec(),
    }
}

/// Planar shoelace area in lon/lat; positive for counter-clockwise rings.
fn signed_area(ring: &[LatLon]) -> f64 {
    let n = ring.len();
    let mut a = 0.0;
    for i in 0..n {
        let p = ring[i];
        let q = ring[(i + 1) % n];
        a += p.lon * q.lat - q.lon * p.lat;
    }
    a * 0.5
}

fn encode_record(kind: GeometryKind, g: &Geometry) -> Result<(Vec<u8>, Option<BBox>)> {
    if g.kind() != kind {
        return Err(EngineError::Geometry(format!(
            "{} geometry in a {} shapefile",
            g.kind().label(),
            kind.label()
        )));
    }

    let pts = shape_points(g);
    let bbox = BBox::of(&pts);
    let mut c = Vec::with_capacity(48 + pts.len() * 16);
    c.extend_from_slice(&shape_type(kind).to_le_bytes());

    match kind {
        GeometryKind::Point => {
            let p = pts.first().copied().unwrap_or(LatLon::new(0.0, 0.0));
            c.extend_from_slice(&p.lon.to_le_bytes());
            c.extend_from_slice(&p.lat.to_le_bytes());
        }
        GeometryKind::MultiPoint => {
            bbox.unwrap_or_default().put(&mut c);
            c.extend_from_slice(&(pts.len() as i32).to_le_bytes());
            put_points(&mut c, &pts);
        }
        GeometryKind::Polyline | GeometryKind::Polygon => {
            bbox.unwrap_or_default().put(&mut c);
            c.extend_from_slice(&1i32.to_le_bytes());
            c.extend_from_slice(&(pts.len() as i32).to_le_bytes());
            c.extend_from_slice(&0i32.to_le_bytes());
            put_points(&mut c, &pts);
        }
    }
    Ok((c, bbox))
}

fn put_points(c: &mut Vec<u8>, pts: &[LatLon]) {
    for p in pts {
        c.extend_from_slice(&p.lon.to_le_bytes());
        c.extend_from_slice(&p.lat.to_le_bytes());
    }
}

fn put_header(b: &mut Vec<u8>, len_bytes: usize, kind: GeometryKind, bbox: BBox) {
    b.extend_from_slice(&FILE_CODE.to_be_bytes());
    for _ in 0..5 {
        b.extend_from_slice(&0i32.to_be_bytes());
    }
    b.extend_from_slice(&((len_bytes / 2) as i32).to_be_bytes());
    b.extend_from_slice(&VERSION.to_le_bytes());
    b.extend_from_slice(&shape_type(kind).to_le_bytes());
    bbox.put(b);
    for _ in 0..4 {
        b.extend_from_slice(&0f64.to_le_bytes());
    }
}

/// Encode the .shp and .shx byte streams.
fn encode_shapes(kind: GeometryKind, items: &[&ReconstructedFeature]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut records = Vec::new();
    let mut index = Vec::with_capacity(items.len() * 8);
    let mut total: Option<BBox> = None;

    for (i, item) in items.iter().enumerate() {
        let (content, bbox) = encode_record(kind, &item.geometry)?;
        if let Some(b) = bbox {
            total = Some(total.map_or(b, |t| t.union(b)));
        }

        let offset_words = ((HEADER_LEN + records.len()) / 2) as i32;
        let content_words = (content.len() / 2) as i32;
        index.extend_from_slice(&offset_words.to_be_bytes());
        index.extend_from_slice(&content_words.to_be_bytes());

        records.extend_from_slice(&((i + 1) as i32).to_be_bytes());
        records.extend_from_slice(&content_words.to_be_bytes());
        records.extend_from_slice(&content);
    }

    let bbox = total.unwrap_or_default();

    let mut shp = Vec::with_capacity(HEADER_LEN + records.len());
    put_header(&mut shp, HEADER_LEN + records.len(), kind, bbox);
    shp.extend_from_slice(&records);

    let mut shx = Vec::with_capacity(HEADER_LEN + index.len());
    put_header(&mut shx, HEADER_LEN + index.len(), kind, bbox);
    shx.extend_from_slice(&index);

    Ok((shp, shx))
}

struct DbfField {
    name: &'static str,
    kind: u8,
    len: usize,
    decimals: usize,
}

const DBF_FIELDS: [DbfField; 4] = [
    DbfField { name: "NAME", kind: b'C', len: NAME_LEN, decimals: 0 },
    DbfField { name: "PLATEID1", kind: b'N', len: PLATE_LEN, decimals: 0 },
    DbfField { name: "FROMAGE", kind: b'N', len: AGE_LEN, decimals: AGE_DECIMALS },
    DbfField { name: "TOAGE", kind: b'N', len: AGE_LEN, decimals: AGE_DECIMALS },
];

/// dBase III attribute table. The update date is pinned so exports are byte-reproducible.
fn encode_dbf(items: &[&ReconstructedFeature]) -> Result<Vec<u8>> {
    let header_len = 32 + 32 * DBF_FIELDS.len() + 1;
    let record_len = 1 + DBF_FIELDS.iter().map(|f| f.len).sum::<usize>();

    let mut b = Vec::with_capacity(header_len + record_len * items.len() + 1);
    b.push(0x03);
    b.extend_from_slice(&[70, 1, 1]);
    b.extend_from_slice(&(items.len() as u32).to_le_bytes());
    b.extend_from_slice(&(header_len as u16).to_le_bytes());
    b.extend_from_slice(&(record_len as u16).to_le_bytes());
    b.extend_from_slice(&[0u8; 20]);

    for f in &DBF_FIELDS {
        let mut name = [0u8; 11];
        name[..f.name.len()].copy_from_slice(f.name.as_bytes());
        b.extend_from_slice(&name);
        b.push(f.kind);
        b.extend_from_slice(&[0u8; 4]);
        b.push(f.len as u8);
        b.push(f.decimals as u8);
        b.extend_from_slice(&[0u8; 14]);
    }
    b.push(0x0D);

    for item in items {
        let (from_age, to_age) = item.valid_time.to_ages();
        b.push(b' ');
        put_text(&mut b, &item.name, NAME_LEN);
        put_number(&mut b, "PLATEID1", &item.plate_id.to_string(), PLATE_LEN)?;
        put_number(&mut b, "FROMAGE", &format!("{:.*}", AGE_DECIMALS, from_age), AGE_LEN)?;
        put_number(&mut b, "TOAGE", &format!("{:.*}", AGE_DECIMALS, to_age), AGE_LEN)?;
    }
    b.push(0x1A);
    Ok(b)
}

fn put_text(b: &mut Vec<u8>, s: &str, len: usize) {
    let mut bytes: Vec<u8> = s
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c as u8 } else { b'?' })
        .take(len)
        .collect();
    bytes.resize(len, b' ');
    b.extend_from_slice(&bytes);
}

/// Right-aligned numeric field. A value wider than the field is an error, never truncated.
fn put_number(b: &mut Vec<u8>, field: &str, s: &str, len: usize) -> Result<()> {
    if s.len() > len {
        return Err(EngineError::Geometry(format!(
            "{field} value {s} does not fit a {len}-character dbf field"
        )));
    }
    for _ in s.len()..len {
        b.push(b' ');
    }
    b.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Read a shapefile into one feature per record. Attributes come from the sibling .dbf
/// (`NAME`, `PLATEID1`, `FROMAGE`, `TOAGE`); without one, features get plate 0 for all time.
pub fn read(path: &Path) -> Result<Vec<Feature>> {
    let shp = std::fs::read(path).map_err(|e| EngineError::io(path, e))?;
    let shapes = decode_shapes(&shp).map_err(|msg| EngineError::parse(path, 0, msg))?;

    let dbf_path = path.with_extension("dbf");
    let records = match std::fs::read(&dbf_path) {
        Ok(bytes) => decode_dbf(&bytes).map_err(|msg| EngineError::parse(&dbf_path, 0, msg))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{}: no attribute table", path.display());
            Vec::new()
        }
        Err(e) => return Err(EngineError::io(&dbf_path, e)),
    };

    let mut features = Vec::with_capacity(shapes.len());
    for (i, geometries) in shapes.into_iter().enumerate() {
        let empty = HashMap::new();
        let attrs = records.get(i).unwrap_or(&empty);
        let bad = |msg: String| EngineError::parse(&dbf_path, i + 1, msg);
        let number = |key: &str| -> Result<Option<f64>> {
            match attrs.get(key).map(|v| v.as_str()) {
                None | Some("") => Ok(None),
                Some(v) => v
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| bad(format!("{key}: not a number: {v:?}"))),
            }
        };

        let plate_id = match number("PLATEID1")? {
            Some(v) => plate_id_from_f64(v).map_err(|msg| bad(format!("PLATEID1: {msg}")))?,
            None => 0,
        };
        let begin = number("FROMAGE")?.unwrap_or(f64::INFINITY);
        let end = number("TOAGE")?.unwrap_or(f64::NEG_INFINITY);
        features.push(Feature {
            name: attrs.get("NAME").cloned().unwrap_or_default(),
            plate_id,
            valid_time: ValidTime::from_ages(begin, end),
            geometries,
        });
    }
    Ok(features)
}

fn read_be_i32(b: &[u8], at: usize) -> std::result::Result<i32, String> {
    b.get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .map(i32::from_be_bytes)
        .ok_or_else(|| format!("truncated at byte {at}"))
}

fn read_le_i32(b: &[u8], at: usize) -> std::result::Result<i32, String> {
    b.get(at..at + 4)
        .and_then(|s| s.try_into().ok())
        .map(i32::from_le_bytes)
        .ok_or_else(|| format!("truncated at byte {at}"))
}

fn read_le_f64(b: &[u8], at: usize) -> std::result::Result<f64, String> {
    b.get(at..at + 8)
        .and_then(|s| s.try_into().ok())
        .map(f64::from_le_bytes)
        .ok_or_else(|| format!("truncated at byte {at}"))
}

fn read_count(b: &[u8], at: usize) -> std::result::Result<usize, String> {
    let n = read_le_i32(b, at)?;
    usize::try_from(n).map_err(|_| format!("negative count {n} at byte {at}"))
}

fn read_points(c: &[u8], at: usize, n: usize) -> std::result::Result<Vec<LatLon>, String> {
    (0..n)
        .map(|i| {
            let p = at + i * 16;
            Ok(LatLon::new(read_le_f64(c, p + 8)?, read_le_f64(c, p)?))
        })
        .collect()
}

/// Geometries per .shp record. Z and M shape types are read for their x/y only.
fn decode_shapes(shp: &[u8]) -> std::result::Result<Vec<Vec<Geometry>>, String> {
    if read_be_i32(shp, 0)? != FILE_CODE {
        return Err("not a shapefile (bad file code)".into());
    }

    let mut shapes = Vec::new();
    let mut at = HEADER_LEN;
    while at + 8 <= shp.len() {
        let words = usize::try_from(read_be_i32(shp, at + 4)?)
            .map_err(|_| format!("negative record length at byte {at}"))?;
        let start = at + 8;
        let c = shp
            .get(start..start + words * 2)
            .ok_or_else(|| format!("record at byte {at} runs past end of file"))?;
        shapes.push(decode_record(c).map_err(|msg| format!("record {}: {msg}", shapes.len() + 1))?);
        at = start + words * 2;
    }
    Ok(shapes)
}

fn decode_record(c: &[u8]) -> std::result::Result<Vec<Geometry>, String> {
    let geometries = match read_le_i32(c, 0)? {
        0 => Vec::new(),
        1 | 11 | 21 => vec![Geometry::Point(LatLon::new(read_le_f64(c, 12)?, read_le_f64(c, 4)?))],
        8 | 18 | 28 => {
            let n = read_count(c, 36)?;
            vec![Geometry::MultiPoint(read_points(c, 40, n)?)]
        }
        t @ (3 | 13 | 23 | 5 | 15 | 25) => {
            let polygon = matches!(t, 5 | 15 | 25);
            let num_parts = read_count(c, 36)?;
            let num_points = read_count(c, 40)?;
            let parts = (0..num_parts)
                .map(|i| read_count(c, 44 + i * 4))
                .collect::<std::result::Result<Vec<usize>, String>>()?;
            let points = read_points(c, 44 + num_parts * 4, num_points)?;

            let mut out = Vec::with_capacity(num_parts);
            for (i, &first) in parts.iter().enumerate() {
                let last = parts.get(i + 1).copied().unwrap_or(num_points);
                let mut part = points
                    .get(first..last)
                    .ok_or_else(|| format!("bad part offsets {first}..{last}"))?
                    .to_vec();
                if polygon {
                    if part.len() >= 2 && part[0].approx_eq(part[part.len() - 1], 1e-9) {
                        part.pop();
                    }
                    out.push(Geometry::Polygon(part));
                } else {
                    out.push(Geometry::Polyline(part));
                }
            }
            out
        }
        other => return Err(format!("unsupported shape type {other}")),
    };
    Ok(geometries)
}

/// dBase III records as field name -> trimmed text.
fn decode_dbf(b: &[u8]) -> std::result::Result<Vec<HashMap<String, String>>, String> {
    let count = b
        .get(4..8)
        .and_then(|s| s.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or("truncated dbf header")? as usize;
    let header_len = b
        .get(8..10)
        .and_then(|s| s.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or("truncated dbf header")? as usize;
    let record_len = b
        .get(10..12)
        .and_then(|s| s.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or("truncated dbf header")? as usize;

    let mut fields: Vec<(String, usize)> = Vec::new();
    let mut at = 32;
    while at + 32 <= header_len && b.get(at) != Some(&0x0D) {
        let d = b.get(at..at + 32).ok_or("truncated field descriptor")?;
        let name_end = d[..11].iter().position(|&x| x == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&d[..name_end]).to_ascii_uppercase();
        fields.push((name, d[16] as usize));
        at += 32;
    }

    let mut records = Vec::with_capacity(count);
    for r in 0..count {
        let start = header_len + r * record_len;
        let rec = b
            .get(start..start + record_len)
            .ok_or_else(|| format!("dbf record {} runs past end of file", r + 1))?;
        let mut values = HashMap::with_capacity(fields.len());
        let mut off = 1;
        for (name, len) in &fields {
            let raw = rec
                .get(off..off + len)
                .ok_or_else(|| format!("dbf record {} shorter than its fields", r + 1))?;
            values.insert(name.clone(), String::from_utf8_lossy(raw).trim().to_string());
            off += len;
        }
        records.push(values);
    }
    Ok(records)
}
