use std::path::Path;

use platerec_core::rotation::file::parse_rotations;
use platerec_core::{
    reconstruct, reconstruct_features, EngineError, Feature, FeatureCollection, Geometry,
    GeometryKind, LatLon, RotationModel, ValidTime,
};

const ROT: &str = "\
101  0.0 90.0 0.0  0.0 000
101 50.0 90.0 0.0 50.0 000
201  0.0 90.0 0.0  0.0 101
201 50.0 90.0 0.0 25.0 101
";

fn model() -> RotationModel {
    RotationModel::from_sequences(parse_rotations(ROT, Path::new("mem.rot")).expect("parse"))
}

fn feature(name: &str, plate_id: u32, valid_time: ValidTime, geometries: Vec<Geometry>) -> Feature {
    Feature {
        name: name.to_string(),
        plate_id,
        valid_time,
        geometries,
    }
}

fn collections() -> Vec<FeatureCollection> {
    vec![
        FeatureCollection::new(
            "a.gmt",
            vec![
                feature(
                    "coast",
                    101,
                    ValidTime::ALL_TIME,
                    vec![Geometry::Polyline(vec![LatLon::new(0.0, 0.0), LatLon::new(10.0, 0.0)])],
                ),
                feature(
                    "young",
                    101,
                    ValidTime::new(5.0, 0.0),
                    vec![Geometry::Point(LatLon::new(0.0, 0.0))],
                ),
            ],
        ),
        FeatureCollection::new(
            "b.gmt",
            vec![feature(
                "island",
                201,
                ValidTime::new(100.0, 0.0),
                vec![Geometry::Polygon(vec![
                    LatLon::new(0.0, 0.0),
                    LatLon::new(0.0, 10.0),
                    LatLon::new(10.0, 10.0),
                ])],
            )],
        ),
    ]
}

#[test]
fn features_outside_valid_time_are_skipped() {
    let out = reconstruct_features(&collections(), &model(), 10.0, 0).expect("reconstruct");
    let names: Vec<&str> = out.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["coast", "island"]);

    let out = reconstruct_features(&collections(), &model(), 0.0, 0).expect("reconstruct");
    assert_eq!(out.len(), 3);
}

#[test]
fn geometries_follow_their_plates() {
    let out = reconstruct_features(&collections(), &model(), 20.0, 0).expect("reconstruct");
    let coast = out[0].geometry.points()[0];
    assert!(coast.approx_eq(LatLon::new(0.0, 20.0), 1e-7), "{coast:?}");
    // 201 -> 101 is 10 deg at 20 Ma, plus 20 deg for 101 -> 000.
    let island = out[1].geometry.points()[0];
    assert!(island.approx_eq(LatLon::new(0.0, 30.0), 1e-7), "{island:?}");
}

#[test]
fn anchor_plate_geometry_does_not_move() {
    let out = reconstruct_features(&collections(), &model(), 40.0, 101).expect("reconstruct");
    let coast = out[0].geometry.points()[0];
    assert!(coast.approx_eq(LatLon::new(0.0, 0.0), 1e-7), "{coast:?}");
}

#[test]
fn gmt_export_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.gmt");
    let summary = reconstruct(&collections(), &model(), &path, 20.0, 0).expect("reconstruct");
    assert_eq!(summary.features, 2);
    assert_eq!(summary.geometries, 2);
    assert_eq!(summary.files, vec![path.clone()]);

    let text = std::fs::read_to_string(&path).expect("read");
    assert!(text.starts_with("# reconstruction_time=20 anchor_plate_id=0\n"), "{text}");
    assert!(text.contains("> plate_id=101 begin=inf end=-inf name=coast\n"), "{text}");
    assert!(text.contains("> plate_id=201 begin=100 end=0 name=island\n"), "{text}");

    let back = FeatureCollection::from_file(&path).expect("read back");
    assert_eq!(back.len(), 2);
    assert_eq!(back.features[0].plate_id, 101);
    assert_eq!(back.features[0].valid_time, ValidTime::ALL_TIME);
    assert_eq!(back.features[1].geometries[0].kind(), GeometryKind::Polygon);
    let p = back.features[1].geometries[0].points()[0];
    assert!(p.approx_eq(LatLon::new(0.0, 30.0), 1e-5), "{p:?}");
}

#[test]
fn xy_export_has_bare_segments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.xy");
    reconstruct(&collections(), &model(), &path, 0.0, 0).expect("reconstruct");
    let text = std::fs::read_to_string(&path).expect("read");
    assert_eq!(text.lines().filter(|l| *l == ">").count(), 3);
    assert!(!text.contains("plate_id"));
    assert!(!text.contains('#'));
}

#[test]
fn geojson_export_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.geojson");
    reconstruct(&collections(), &model(), &path, 0.0, 0).expect("reconstruct");

    let back = FeatureCollection::from_file(&path).expect("read back");
    assert_eq!(back.len(), 3);
    assert_eq!(back.features[0].name, "coast");
    assert_eq!(back.features[0].valid_time, ValidTime::ALL_TIME);
    assert_eq!(back.features[1].valid_time, ValidTime::new(5.0, 0.0));
    assert_eq!(back.features[2].plate_id, 201);
    assert_eq!(back.features[2].geometries[0].points().len(), 3);
}

#[test]
fn empty_reconstruction_still_writes_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("empty.gmt");
    // Only the island collection; it appears at 100 Ma.
    let island_only = vec![collections().remove(1)];
    let summary = reconstruct(&island_only, &model(), &path, 500.0, 0).expect("reconstruct");
    assert_eq!(summary.geometries, 0);
    assert!(path.exists());
}

#[test]
fn unsupported_extension_fails_before_writing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.kml");
    match reconstruct(&collections(), &model(), &path, 10.0, 0) {
        Err(EngineError::UnsupportedFormat(_)) => {}
        other => panic!("expected unsupported format, got {other:?}"),
    }
    assert!(!path.exists());
}

fn be_i32(b: &[u8], at: usize) -> i32 {
    i32::from_be_bytes(b[at..at + 4].try_into().expect("4 bytes"))
}

fn le_i32(b: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(b[at..at + 4].try_into().expect("4 bytes"))
}

fn le_f64(b: &[u8], at: usize) -> f64 {
    f64::from_le_bytes(b[at..at + 8].try_into().expect("8 bytes"))
}

#[test]
fn shapefile_single_layer_layout() {
    let only_lines = vec![FeatureCollection::new(
        "lines.gmt",
        vec![
            feature(
                "a",
                101,
                ValidTime::ALL_TIME,
                vec![Geometry::Polyline(vec![LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0)])],
            ),
            feature(
                "b",
                201,
                ValidTime::new(80.0, 0.0),
                vec![Geometry::Polyline(vec![
                    LatLon::new(2.0, 2.0),
                    LatLon::new(3.0, 3.0),
                    LatLon::new(4.0, 4.0),
                ])],
            ),
        ],
    )];

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lines.shp");
    let summary = reconstruct(&only_lines, &model(), &path, 0.0, 0).expect("reconstruct");
    assert_eq!(summary.files.len(), 4);

    let shp = std::fs::read(&path).expect("shp");
    // header + (8 + 48 + 2*16) + (8 + 48 + 3*16)
    assert_eq!(shp.len(), 100 + 88 + 104);
    assert_eq!(be_i32(&shp, 0), 9994);
    assert_eq!(be_i32(&shp, 24) as usize * 2, shp.len());
    assert_eq!(le_i32(&shp, 28), 1000);
    assert_eq!(le_i32(&shp, 32), 3);
    assert_eq!(be_i32(&shp, 100), 1);
    assert_eq!(be_i32(&shp, 188), 2);

    let shx = std::fs::read(path.with_extension("shx")).expect("shx");
    assert_eq!(shx.len(), 100 + 16);
    assert_eq!(be_i32(&shx, 100), 50);
    assert_eq!(be_i32(&shx, 108), 94);

    let dbf = std::fs::read(path.with_extension("dbf")).expect("dbf");
    assert_eq!(dbf[0], 0x03);
    assert_eq!(u32::from_le_bytes(dbf[4..8].try_into().expect("u32")), 2);
    let header_len = u16::from_le_bytes(dbf[8..10].try_into().expect("u16")) as usize;
    let record_len = u16::from_le_bytes(dbf[10..12].try_into().expect("u16")) as usize;
    assert_eq!(header_len, 32 + 4 * 32 + 1);
    assert_eq!(record_len, 1 + 80 + 10 + 13 + 13);
    assert_eq!(dbf.len(), header_len + 2 * record_len + 1);
    let second = &dbf[header_len + record_len..header_len + 2 * record_len];
    let text = String::from_utf8_lossy(second);
    assert!(text.contains("       201"), "{text}");
    assert!(text.contains("      80.0000"), "{text}");

    assert!(path.with_extension("prj").exists());
}

#[test]
fn shapefile_polygons_are_closed_and_clockwise() {
    let polys = vec![FeatureCollection::new(
        "poly.gmt",
        vec![feature(
            "ccw",
            0,
            ValidTime::ALL_TIME,
            vec![Geometry::Polygon(vec![
                LatLon::new(0.0, 0.0),
                LatLon::new(0.0, 10.0),
                LatLon::new(10.0, 10.0),
                LatLon::new(10.0, 0.0),
            ])],
        )],
    )];

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("poly.shp");
    reconstruct(&polys, &model(), &path, 0.0, 0).expect("reconstruct");
    let shp = std::fs::read(&path).expect("shp");

    assert_eq!(le_i32(&shp, 32), 5);
    let content = 108;
    assert_eq!(le_i32(&shp, content + 40), 5);
    let pts: Vec<(f64, f64)> = (0..5)
        .map(|i| {
            let at = content + 48 + i * 16;
            (le_f64(&shp, at), le_f64(&shp, at + 8))
        })
        .collect();
    assert_eq!(pts[0], pts[4]);

    let mut area = 0.0;
    for w in pts.windows(2) {
        area += w[0].0 * w[1].1 - w[1].0 * w[0].1;
    }
    assert!(area < 0.0, "expected clockwise ring, area {area}");
}

#[test]
fn shapefile_mixed_kinds_split_per_layer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("mixed.shp");
    let summary = reconstruct(&collections(), &model(), &path, 0.0, 0).expect("reconstruct");

    assert!(!path.exists());
    for layer in ["mixed_polyline.shp", "mixed_point.shp", "mixed_polygon.shp"] {
        assert!(dir.path().join(layer).exists(), "{layer}");
    }
    assert_eq!(summary.files.len(), 12);
}

#[test]
fn shapefile_attribute_overflow_is_an_error() {
    let huge = vec![FeatureCollection::new(
        "huge.gmt",
        vec![feature(
            "ancient",
            101,
            ValidTime::new(1.0e12, 0.0),
            vec![Geometry::Point(LatLon::new(0.0, 0.0))],
        )],
    )];

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("huge.shp");
    match reconstruct(&huge, &model(), &path, 0.0, 0) {
        Err(EngineError::Geometry(msg)) => assert!(msg.contains("FROMAGE"), "{msg}"),
        other => panic!("expected geometry error, got {other:?}"),
    }
    assert!(!path.exists());
    assert!(!path.with_extension("dbf").exists());
}

#[test]
fn shapefile_largest_plate_id_fits() {
    let wide = vec![FeatureCollection::new(
        "wide.gmt",
        vec![feature(
            "max",
            u32::MAX,
            ValidTime::ALL_TIME,
            vec![Geometry::Point(LatLon::new(1.0, 2.0))],
        )],
    )];
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wide.shp");
    reconstruct(&wide, &model(), &path, 0.0, 0).expect("reconstruct");

    let fc = FeatureCollection::from_file(&path).expect("read back");
    assert_eq!(fc.features[0].plate_id, u32::MAX);
}

#[test]
fn shapefile_export_reads_back() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lines.shp");
    let lines = vec![FeatureCollection::new(
        "lines.gmt",
        vec![
            feature(
                "coast",
                101,
                ValidTime::ALL_TIME,
                vec![Geometry::Polyline(vec![LatLon::new(0.0, 0.0), LatLon::new(10.0, 0.0)])],
            ),
            feature(
                "ridge",
                201,
                ValidTime::new(80.0, 0.0),
                vec![Geometry::Polyline(vec![LatLon::new(5.0, 5.0), LatLon::new(6.0, 6.0)])],
            ),
        ],
    )];
    reconstruct(&lines, &model(), &path, 0.0, 0).expect("reconstruct");

    let fc = FeatureCollection::from_file(&path).expect("read back");
    assert_eq!(fc.len(), 2);
    assert_eq!(fc.features[0].name, "coast");
    assert_eq!(fc.features[0].plate_id, 101);
    assert_eq!(fc.features[0].valid_time, ValidTime::ALL_TIME);
    assert_eq!(fc.features[1].name, "ridge");
    assert_eq!(fc.features[1].plate_id, 201);
    assert_eq!(fc.features[1].valid_time, ValidTime::new(80.0, 0.0));

    let pts = fc.features[1].geometries[0].points();
    assert_eq!(fc.features[1].geometries[0].kind(), GeometryKind::Polyline);
    assert!(pts[0].approx_eq(LatLon::new(5.0, 5.0), 1e-9), "{pts:?}");
    assert!(pts[1].approx_eq(LatLon::new(6.0, 6.0), 1e-9), "{pts:?}");
}

#[test]
fn shapefile_polygon_reads_back_open() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("island.shp");
    let island_only = vec![collections().remove(1)];
    reconstruct(&island_only, &model(), &path, 0.0, 0).expect("reconstruct");

    let fc = FeatureCollection::from_file(&path).expect("read back");
    let g = &fc.features[0].geometries[0];
    assert_eq!(g.kind(), GeometryKind::Polygon);
    assert_eq!(g.points().len(), 3);
}

#[test]
fn shapefile_without_dbf_reads_with_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bare.shp");
    let points = vec![FeatureCollection::new(
        "p.gmt",
        vec![feature("p", 101, ValidTime::new(50.0, 0.0), vec![Geometry::Point(LatLon::new(1.0, 2.0))])],
    )];
    reconstruct(&points, &model(), &path, 0.0, 0).expect("reconstruct");
    std::fs::remove_file(path.with_extension("dbf")).expect("remove dbf");

    let fc = FeatureCollection::from_file(&path).expect("read back");
    assert_eq!(fc.len(), 1);
    assert_eq!(fc.features[0].plate_id, 0);
    assert_eq!(fc.features[0].valid_time, ValidTime::ALL_TIME);
    assert!(fc.features[0].geometries[0].points()[0].approx_eq(LatLon::new(1.0, 2.0), 1e-9));
}

#[test]
fn truncated_shapefile_is_parse_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("cut.shp");
    let lines = vec![collections().remove(0)];
    reconstruct(&lines, &model(), &dir.path().join("whole.shp"), 0.0, 0).expect("reconstruct");
    let whole = std::fs::read(dir.path().join("whole_polyline.shp")).expect("shp");
    std::fs::write(&path, &whole[..whole.len() - 10]).expect("write");

    assert!(matches!(
        FeatureCollection::from_file(&path),
        Err(EngineError::Parse { .. })
    ));
}
