// crates/platerec-core/src/rotation/file.rs

//! PLATES4 rotation file reader.
//!
//! Line layout: `moving time lat lon angle fixed [! comment]`.

use std::path::Path;

use log::{debug, warn};

use crate::error::{EngineError, Result};
use crate::geometry::LatLon;
use crate::rotation::{PlateId, RotationSequence, TotalReconstructionPole, COMMENT_PLATE_ID};

pub fn read_rotation_file(path: &Path) -> Result<Vec<RotationSequence>> {
    let text = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    parse_rotations(&text, path)
}

/// Parse rotation text. `path` is only used for error reporting.
pub fn parse_rotations(text: &str, path: &Path) -> Result<Vec<RotationSequence>> {
    let mut sequences: Vec<RotationSequence> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let pole = parse_pole_line(trimmed).map_err(|msg| EngineError::parse(path, line_no, msg))?;

        if pole.moving == COMMENT_PLATE_ID {
            debug!("{}:{line_no}: skipping comment pole", path.display());
            continue;
        }
        if pole.moving == pole.fixed {
            warn!(
                "{}:{line_no}: plate {} rotates relative to itself, skipping",
                path.display(),
                pole.moving
            );
            continue;
        }

        match sequences.last_mut() {
            Some(seq) if seq.moving == pole.moving && seq.fixed == pole.fixed => seq.poles.push(pole),
            _ => sequences.push(RotationSequence {
                moving: pole.moving,
                fixed: pole.fixed,
                poles: vec![pole],
            }),
        }
    }

    for seq in &mut sequences {
        seq.poles.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    Ok(sequences)
}

fn parse_pole_line(line: &str) -> std::result::Result<TotalReconstructionPole, String> {
    let (data, comment) = match line.find('!') {
        Some(i) => (&line[..i], line[i + 1..].trim()),
        None => (line, ""),
    };

    let fields: Vec<&str> = data.split_whitespace().collect();
    if fields.len() < 6 {
        return Err(format!("expected 6 fields, found {}", fields.len()));
    }

    let moving = parse_plate(fields[0], "moving plate id")?;
    let time = parse_f64(fields[1], "time")?;
    let lat = parse_f64(fields[2], "latitude")?;
    let lon = parse_f64(fields[3], "longitude")?;
    let angle = parse_f64(fields[4], "angle")?;
    let fixed = parse_plate(fields[5], "fixed plate id")?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} out of range"));
    }

    Ok(TotalReconstructionPole {
        moving,
        fixed,
        time,
        pole: LatLon::new(lat, lon),
        angle,
        comment: comment.to_string(),
    })
}

fn parse_plate(s: &str, what: &str) -> std::result::Result<PlateId, String> {
    s.parse::<PlateId>().map_err(|_| format!("bad {what}: {s:?}"))
}

fn parse_f64(s: &str, what: &str) -> std::result::Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("bad {what}: {s:?}")),
    }
}
