// crates/platerec-core/src/format/gpml.rs

//! GPlates Markup Language feature reader.
//!
//! Each child of a `gml:featureMember` is one feature. Recognised properties:
//! `gml:name`, `gpml:reconstructionPlateId`, `gml:validTime` (`gml:TimePeriod` begin/end or a
//! single `gml:TimeInstant`) and `gml:Point`/`gml:MultiPoint`/`gml:LineString`/`gml:Polygon`
//! geometry anywhere below the feature. Coordinates are `lat lon` pairs. Polygon interior
//! rings are dropped.

use std::path::Path;

use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{EngineError, Result};
use crate::feature::{Feature, ValidTime};
use crate::geometry::{Geometry, LatLon};
use crate::rotation::PlateId;

const DISTANT_PAST: &str = "http://gplates.org/times/distantPast";
const DISTANT_FUTURE: &str = "http://gplates.org/times/distantFuture";

#[derive(Default)]
struct Draft {
    name: String,
    plate_id: Option<PlateId>,
    begin: Option<f64>,
    end: Option<f64>,
    geometries: Vec<Geometry>,
    multi_point: Vec<LatLon>,
}

impl Draft {
    fn finish(self) -> Feature {
        Feature {
            name: self.name,
            plate_id: self.plate_id.unwrap_or(0),
            valid_time: ValidTime::from_ages(
                self.begin.unwrap_or(f64::INFINITY),
                self.end.unwrap_or(f64::NEG_INFINITY),
            ),
            geometries: self.geometries,
        }
    }
}

pub fn parse(text: &str, path: &Path) -> Result<Vec<Feature>> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let line_at = |pos: usize| {
        let end = pos.min(text.len());
        text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
    };

    let mut features = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut buf = String::new();
    // Index in `stack` of the feature element being read.
    let mut feature_at: Option<usize> = None;
    let mut draft = Draft::default();

    loop {
        let pos = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|e| EngineError::parse(path, line_at(pos), e.to_string()))?;
        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if stack.is_empty() && name != "FeatureCollection" {
                    return Err(EngineError::parse(
                        path,
                        line_at(pos),
                        format!("expected a gpml:FeatureCollection root, found {name:?}"),
                    ));
                }
                if feature_at.is_none() && stack.last().is_some_and(|p| p == "featureMember") {
                    feature_at = Some(stack.len());
                    draft = Draft::default();
                }
                stack.push(name);
                buf.clear();
            }
            Event::Text(t) => {
                let s = t
                    .unescape()
                    .map_err(|e| EngineError::parse(path, line_at(pos), e.to_string()))?;
                buf.push_str(&s);
            }
            Event::CData(c) => buf.push_str(&String::from_utf8_lossy(&c)),
            Event::End(_) => {
                let Some(name) = stack.pop() else { continue };
                let content = std::mem::take(&mut buf);
                let Some(at) = feature_at else { continue };

                if stack.len() == at {
                    features.push(std::mem::take(&mut draft).finish());
                    feature_at = None;
                    continue;
                }
                if name == "MultiPoint" {
                    let points = std::mem::take(&mut draft.multi_point);
                    if !points.is_empty() {
                        draft.geometries.push(Geometry::MultiPoint(points));
                    }
                }
                let content = content.trim();
                if !content.is_empty() {
                    read_property(&stack, at, &name, content, &mut draft)
                        .map_err(|msg| EngineError::parse(path, line_at(pos), msg))?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    debug!("{}: {} gpml features", path.display(), features.len());
    Ok(features)
}

/// Apply the text of leaf element `elem`, whose open ancestors are `stack`.
fn read_property(
    stack: &[String],
    feature_at: usize,
    elem: &str,
    text: &str,
    draft: &mut Draft,
) -> std::result::Result<(), String> {
    let within = |tag: &str| stack[feature_at..].iter().any(|a| a == tag);

    if within("reconstructionPlateId") {
        if draft.plate_id.is_none() {
            let id = text
                .parse::<PlateId>()
                .map_err(|_| format!("bad reconstructionPlateId {text:?}"))?;
            draft.plate_id = Some(id);
        }
    } else if elem == "timePosition" && within("validTime") {
        let t = time_position(text)?;
        if within("begin") {
            draft.begin = Some(t);
        } else if within("end") {
            draft.end = Some(t);
        } else {
            draft.begin = Some(t);
            draft.end = Some(t);
        }
    } else if elem == "name" && stack.len() == feature_at + 1 {
        draft.name = text.to_string();
    } else if elem == "pos" {
        let p = single_position(text)?;
        if within("MultiPoint") {
            draft.multi_point.push(p);
        } else {
            draft.geometries.push(Geometry::Point(p));
        }
    } else if elem == "posList" {
        if within("interior") || within("innerBoundaryIs") {
            return Ok(());
        }
        let mut points = pos_list(text)?;
        let geometry = if within("Polygon") || within("LinearRing") {
            if points.len() >= 2 && points[0].approx_eq(points[points.len() - 1], 1e-9) {
                points.pop();
            }
            Geometry::Polygon(points)
        } else if points.len() == 1 {
            Geometry::Point(points[0])
        } else {
            Geometry::Polyline(points)
        };
        draft.geometries.push(geometry);
    }
    Ok(())
}

fn time_position(text: &str) -> std::result::Result<f64, String> {
    match text {
        DISTANT_PAST => Ok(f64::INFINITY),
        DISTANT_FUTURE => Ok(f64::NEG_INFINITY),
        _ => text.parse().map_err(|_| format!("bad timePosition {text:?}")),
    }
}

fn pos_list(text: &str) -> std::result::Result<Vec<LatLon>, String> {
    let values = text
        .split_whitespace()
        .map(|v| v.parse::<f64>().map_err(|_| format!("bad coordinate {v:?}")))
        .collect::<std::result::Result<Vec<f64>, String>>()?;
    if values.len() % 2 != 0 {
        return Err(format!("odd coordinate count {} in posList", values.len()));
    }
    Ok(values.chunks_exact(2).map(|c| LatLon::new(c[0], c[1])).collect())
}

fn single_position(text: &str) -> std::result::Result<LatLon, String> {
    match pos_list(text)?.as_slice() {
        [p] => Ok(*p),
        _ => Err(format!("expected one lat/lon pair in pos, found {text:?}")),
    }
}
