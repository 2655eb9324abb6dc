use geo::{Coord, LineString, Polygon};
use serde_json::Value;

use crate::error::MeshError;
use crate::geometry::{RawGeometry, geometry_bounds};

/// Reduce a GeoJSON value to sanitized lon/lat rings.
///
/// Accepts a FeatureCollection, a single Feature, or a bare geometry.
/// Only Polygon and MultiPolygon geometries contribute; everything else is
/// skipped. Rings keep only finite coordinate pairs and are discarded when
/// fewer than three points survive; a polygon whose outer ring is discarded
/// is dropped whole, while holes are dropped individually.
pub fn parse_geojson(value: &Value) -> Result<RawGeometry, MeshError> {
    let mut polygons = Vec::new();

    let features: Vec<&Value> = match value["type"].as_str() {
        Some("FeatureCollection") => value["features"]
            .as_array()
            .map(|items| items.iter().collect())
            .unwrap_or_default(),
        _ => vec![value],
    };

    for entry in features {
        let geometry = if entry["type"].as_str() == Some("Feature") {
            &entry["geometry"]
        } else {
            entry
        };

        match geometry["type"].as_str() {
            Some("Polygon") => {
                if let Some(rings) = geometry["coordinates"].as_array() {
                    polygons.extend(normalize_polygon(rings));
                }
            }
            Some("MultiPolygon") => {
                if let Some(parts) = geometry["coordinates"].as_array() {
                    for part in parts {
                        if let Some(rings) = part.as_array() {
                            polygons.extend(normalize_polygon(rings));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let bbox = geometry_bounds(&polygons)
        .map_err(|_| MeshError::InvalidGeometry("no valid polygons found in GeoJSON".to_string()))?;

    Ok(RawGeometry { polygons, bbox })
}

/// Build one polygon from GeoJSON ring arrays: first ring is the outer
/// boundary, the rest are holes.
fn normalize_polygon(rings: &[Value]) -> Option<Polygon<f64>> {
    let outer = sanitize_ring(rings.first()?)?;
    let holes = rings[1..].iter().filter_map(sanitize_ring).collect();
    Some(Polygon::new(outer, holes))
}

/// Keep finite coordinate pairs; drop the ring if fewer than three remain.
fn sanitize_ring(ring: &Value) -> Option<LineString<f64>> {
    let pairs = ring.as_array()?;
    if pairs.len() < 3 {
        return None;
    }

    let coords: Vec<Coord<f64>> = pairs
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            let lon = pair.first()?.as_f64()?;
            let lat = pair.get(1)?.as_f64()?;
            (lon.is_finite() && lat.is_finite()).then_some(Coord { x: lon, y: lat })
        })
        .collect();

    if coords.len() < 3 {
        return None;
    }

    // LineString rings are stored closed; Polygon::new closes them anyway
    // but being explicit keeps segment iteration simple.
    Some(LineString(coords))
}
