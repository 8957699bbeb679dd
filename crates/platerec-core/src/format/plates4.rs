// crates/platerec-core/src/format/plates4.rs

//! PLATES4 line format.
//!
//! Each feature:
//!   header line 1: free text (feature name)
//!   header line 2: `plate_id begin end [type code ...]`
//!   point lines:   `lat lon pen` (pen 3 = start segment, 2 = draw)
//!   terminator:    `99.0 99.0 3`

use std::path::Path;

use crate::error::{EngineError, Result};
use crate::feature::{Feature, ValidTime};
use crate::geometry::{Geometry, LatLon};
use crate::rotation::PlateId;

const PEN_UP: i32 = 3;
const PEN_DOWN: i32 = 2;

pub fn parse(text: &str, path: &Path) -> Result<Vec<Feature>> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    let mut features = Vec::new();

    while let Some((_, name_line)) = lines.find(|(_, l)| !l.trim().is_empty()) {
        let name = name_line.trim().to_string();

        let (hdr_no, hdr) = lines
            .next()
            .ok_or_else(|| EngineError::parse(path, 0, "unexpected eof after feature name"))?;
        let (plate_id, valid_time) =
            parse_header(hdr).map_err(|msg| EngineError::parse(path, hdr_no, msg))?;

        let mut geometries = Vec::new();
        let mut segment: Vec<LatLon> = Vec::new();
        let mut terminated = false;

        for (line_no, line) in lines.by_ref() {
            if line.trim().is_empty() {
                continue;
            }
            let (p, pen) = parse_point(line).map_err(|msg| EngineError::parse(path, line_no, msg))?;
            if is_terminator(p, pen) {
                terminated = true;
                break;
            }
            match pen {
                PEN_UP => {
                    geometries.extend(Geometry::from_segment(std::mem::take(&mut segment)));
                    segment.push(p);
                }
                PEN_DOWN => segment.push(p),
                other => {
                    return Err(EngineError::parse(path, line_no, format!("bad pen code {other}")))
                }
            }
        }

        if !terminated {
            return Err(EngineError::parse(
                path,
                hdr_no,
                format!("feature {name:?} has no 99.0 99.0 3 terminator"),
            ));
        }
        geometries.extend(Geometry::from_segment(segment));

        features.push(Feature {
            name,
            plate_id,
            valid_time,
            geometries,
        });
    }

    Ok(features)
}

fn parse_header(line: &str) -> std::result::Result<(PlateId, ValidTime), String> {
    let f: Vec<&str> = line.split_whitespace().collect();
    if f.len() < 3 {
        return Err(format!("header needs plate id, begin and end ages: {line:?}"));
    }
    let plate_id = f[0]
        .parse::<PlateId>()
        .map_err(|_| format!("bad plate id {:?}", f[0]))?;
    let begin = f[1].parse::<f64>().map_err(|_| format!("bad begin age {:?}", f[1]))?;
    let end = f[2].parse::<f64>().map_err(|_| format!("bad end age {:?}", f[2]))?;
    Ok((plate_id, ValidTime::from_ages(begin, end)))
}

fn parse_point(line: &str) -> std::result::Result<(LatLon, i32), String> {
    let f: Vec<&str> = line.split_whitespace().collect();
    if f.len() < 3 {
        return Err(format!("point line needs lat lon pen: {line:?}"));
    }
    let lat = f[0].parse::<f64>().map_err(|_| format!("bad latitude {:?}", f[0]))?;
    let lon = f[1].parse::<f64>().map_err(|_| format!("bad longitude {:?}", f[1]))?;
    let pen = f[2].parse::<i32>().map_err(|_| format!("bad pen code {:?}", f[2]))?;
    Ok((LatLon::new(lat, lon), pen))
}

fn is_terminator(p: LatLon, pen: i32) -> bool {
    pen == PEN_UP && p.lat == 99.0 && p.lon == 99.0
}
