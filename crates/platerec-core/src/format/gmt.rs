// crates/platerec-core/src/format/gmt.rs

//! GMT multi-segment text (`.gmt`, `.xy`).
//!
//! A `>` line opens a segment; data lines are `lon lat`. Segment headers may
//! carry `plate_id=`, `begin=`, `end=` and `name=` (name runs to end of line).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{EngineError, Result};
use crate::feature::{Feature, ValidTime};
use crate::format::ExportHeader;
use crate::geometry::{Geometry, LatLon};
use crate::reconstruct::ReconstructedFeature;
use crate::rotation::PlateId;

#[derive(Clone, Debug, Default)]
struct SegmentHeader {
    name: String,
    plate_id: PlateId,
    begin: Option<f64>,
    end: Option<f64>,
}

impl SegmentHeader {
    fn valid_time(&self) -> ValidTime {
        ValidTime::from_ages(
            self.begin.unwrap_or(f64::INFINITY),
            self.end.unwrap_or(f64::NEG_INFINITY),
        )
    }
}

pub fn parse(text: &str, path: &Path) -> Result<Vec<Feature>> {
    let mut features = Vec::new();
    let mut header = SegmentHeader::default();
    let mut points: Vec<LatLon> = Vec::new();

    let mut flush = |header: &SegmentHeader, points: &mut Vec<LatLon>| {
        if let Some(g) = Geometry::from_segment(std::mem::take(points)) {
            features.push(Feature {
                name: header.name.clone(),
                plate_id: header.plate_id,
                valid_time: header.valid_time(),
                geometries: vec![g],
            });
        }
    };

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('>') {
            flush(&header, &mut points);
            header = parse_header(rest).map_err(|msg| EngineError::parse(path, line_no, msg))?;
            continue;
        }

        let mut f = line.split_whitespace();
        let (lon, lat) = match (f.next(), f.next()) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => return Err(EngineError::parse(path, line_no, "expected `lon lat`")),
        };
        let lon = lon
            .parse::<f64>()
            .map_err(|_| EngineError::parse(path, line_no, format!("bad longitude {lon:?}")))?;
        let lat = lat
            .parse::<f64>()
            .map_err(|_| EngineError::parse(path, line_no, format!("bad latitude {lat:?}")))?;
        points.push(LatLon::new(lat, lon));
    }
    flush(&header, &mut points);

    Ok(features)
}

/// Byte offset of a `name=` key that starts a token, so `filename=` is not a match.
fn name_key_offset(rest: &str) -> Option<usize> {
    rest.match_indices("name=")
        .map(|(i, _)| i)
        .find(|&i| i == 0 || rest[..i].ends_with(char::is_whitespace))
}

fn parse_header(rest: &str) -> std::result::Result<SegmentHeader, String> {
    let (attrs, name) = match name_key_offset(rest) {
        Some(i) => (&rest[..i], rest[i + "name=".len()..].trim().to_string()),
        None => (rest, String::new()),
    };

    let mut h = SegmentHeader {
        name,
        ..SegmentHeader::default()
    };
    for tok in attrs.split_whitespace() {
        let Some((key, value)) = tok.split_once('=') else {
            continue;
        };
        match key {
            "plate_id" => {
                h.plate_id = value
                    .parse()
                    .map_err(|_| format!("bad plate_id {value:?}"))?
            }
            "begin" => h.begin = Some(value.parse().map_err(|_| format!("bad begin {value:?}"))?),
            "end" => h.end = Some(value.parse().map_err(|_| format!("bad end {value:?}"))?),
            _ => {}
        }
    }
    Ok(h)
}

/// Write one segment per reconstructed geometry. `with_attributes` selects
/// `.gmt` (attributed headers) over bare `.xy` segments.
pub fn write(
    path: &Path,
    items: &[ReconstructedFeature],
    header: &ExportHeader,
    with_attributes: bool,
) -> Result<Vec<PathBuf>> {
    let file = File::create(path).map_err(|e| EngineError::io(path, e))?;
    let mut w = BufWriter::new(file);
    write_to(&mut w, items, header, with_attributes).map_err(|e| EngineError::io(path, e))?;
    w.flush().map_err(|e| EngineError::io(path, e))?;

    info!("wrote {} ({} segments)", path.display(), items.len());
    Ok(vec![path.to_path_buf()])
}

fn write_to<W: Write>(
    w: &mut W,
    items: &[ReconstructedFeature],
    header: &ExportHeader,
    with_attributes: bool,
) -> std::io::Result<()> {
    if with_attributes {
        writeln!(
            w,
            "# reconstruction_time={} anchor_plate_id={}",
            header.reconstruction_time, header.anchor_plate_id
        )?;
    }

    for item in items {
        if with_attributes {
            write!(
                w,
                "> plate_id={} begin={} end={}",
                item.plate_id, item.valid_time.begin, item.valid_time.end
            )?;
            if !item.name.is_empty() {
                write!(w, " name={}", item.name)?;
            }
            writeln!(w)?;
        } else {
            writeln!(w, ">")?;
        }

        for p in item.geometry.points_closed() {
            writeln!(w, "{:.6} {:.6}", p.lon, p.lat)?;
        }
    }
    Ok(())
}
