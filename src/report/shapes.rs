//! GeoJSON export of the feed's shape polylines.

use super::{write_json, ReportOptions};
use crate::feed::Feed;
use crate::objects::ShapePoint;
use crate::Error;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ShapeIndex {
    shapes: Vec<String>,
    count: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct ShapeReportSummary {
    pub shapes_count: usize,
    pub files_written: usize,
    pub failures: usize,
}

fn shape_feature(shape_id: &str, points: &[ShapePoint]) -> Feature {
    let coordinates = points
        .iter()
        .map(|p| vec![p.longitude, p.latitude])
        .collect();
    let mut properties = JsonObject::new();
    properties.insert("shape_id".to_owned(), JsonValue::from(shape_id));
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coordinates))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Writes one GeoJSON `Feature` per shape, a combined
/// `FeatureCollection`, and an index of shape ids.
pub fn generate_shape_reports(
    feed: &Feed,
    options: &ReportOptions,
) -> Result<ShapeReportSummary, Error> {
    let mut summary = ShapeReportSummary {
        shapes_count: feed.shapes.len(),
        ..Default::default()
    };
    if feed.shapes.is_empty() {
        warn!("feed has no shapes, nothing to export");
        return Ok(summary);
    }

    let shapes_dir = options.output_dir.join("shapes");
    std::fs::create_dir_all(&shapes_dir)?;

    let mut shape_ids: Vec<&String> = feed.shapes.keys().collect();
    shape_ids.sort();

    let mut features = Vec::with_capacity(shape_ids.len());
    let mut written_ids = Vec::new();
    for shape_id in shape_ids {
        let points = &feed.shapes[shape_id];
        if points.is_empty() {
            continue;
        }
        let feature = shape_feature(shape_id, points);
        let path = shapes_dir.join(format!("{shape_id}.geojson"));
        match write_json(&path, &feature, options.pretty) {
            Ok(()) => {
                written_ids.push(shape_id.clone());
                summary.files_written += 1;
            }
            Err(e) => {
                warn!("could not write {}: {e}", path.display());
                summary.failures += 1;
            }
        }
        features.push(feature);
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    write_json(
        &shapes_dir.join("all_shapes.geojson"),
        &collection,
        options.pretty,
    )?;
    summary.files_written += 1;

    write_json(
        &shapes_dir.join("index.json"),
        &ShapeIndex {
            count: written_ids.len(),
            shapes: written_ids,
        },
        options.pretty,
    )?;
    summary.files_written += 1;

    info!(
        "shape export done: {} shapes, {} files",
        summary.shapes_count, summary.files_written
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Feed;

    #[test]
    fn feature_has_lon_lat_order() {
        let points = vec![
            ShapePoint {
                id: "shape1".to_owned(),
                latitude: 42.23,
                longitude: -8.72,
                sequence: 1,
            },
            ShapePoint {
                id: "shape1".to_owned(),
                latitude: 42.24,
                longitude: -8.71,
                sequence: 2,
            },
        ];
        let feature = shape_feature("shape1", &points);
        let Some(geometry) = feature.geometry else {
            panic!("no geometry")
        };
        match geometry.value {
            Value::LineString(coords) => {
                assert_eq!(vec![-8.72, 42.23], coords[0]);
                assert_eq!(vec![-8.71, 42.24], coords[1]);
            }
            other => panic!("expected a LineString, got {other:?}"),
        }
        let properties = feature.properties.unwrap();
        assert_eq!("shape1", properties["shape_id"]);
    }

    #[test]
    fn fixture_shape_points_in_sequence_order() {
        let feed = Feed::from_path("fixtures/basic").unwrap();
        let feature = shape_feature("shape1", &feed.shapes["shape1"]);
        let Some(geometry) = feature.geometry else {
            panic!("no geometry")
        };
        match geometry.value {
            Value::LineString(coords) => assert_eq!(3, coords.len()),
            other => panic!("expected a LineString, got {other:?}"),
        }
    }
}
