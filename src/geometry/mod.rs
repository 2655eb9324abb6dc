mod geojson;
mod project;

pub use geojson::parse_geojson;
pub use project::{ProjectedGeometry, Projection, Viewport, project_geometry};

use geo::{Coord, Polygon, Rect};

use crate::error::MeshError;

/// Boundary geometry in lon/lat space, reduced to sanitized rings.
#[derive(Debug, Clone)]
pub struct RawGeometry {
    pub polygons: Vec<Polygon<f64>>,
    /// Lon/lat box over every ring (outer and holes) of every polygon.
    pub bbox: Rect<f64>,
}

/// Axis-aligned box over all rings of a polygon set.
///
/// Returns `InvalidGeometry` if the set is empty or any coordinate is
/// non-finite, so downstream stages never see a degenerate box.
pub(crate) fn geometry_bounds(polygons: &[Polygon<f64>]) -> Result<Rect<f64>, MeshError> {
    let mut min = Coord { x: f64::INFINITY, y: f64::INFINITY };
    let mut max = Coord { x: f64::NEG_INFINITY, y: f64::NEG_INFINITY };

    for polygon in polygons {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for coord in &ring.0 {
                min.x = min.x.min(coord.x);
                min.y = min.y.min(coord.y);
                max.x = max.x.max(coord.x);
                max.y = max.y.max(coord.y);
            }
        }
    }

    if !(min.x.is_finite() && min.y.is_finite() && max.x.is_finite() && max.y.is_finite()) {
        return Err(MeshError::InvalidGeometry(
            "empty polygon set or non-finite extent".to_string(),
        ));
    }

    Ok(Rect::new(min, max))
}

/// Even-odd containment against one ring. The ring may carry the closing
/// duplicate point; the degenerate wrap segment never toggles the parity.
pub(crate) fn point_in_ring(point: Coord<f64>, ring: &[Coord<f64>]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);
        let mut dy = yj - yi;
        if dy == 0.0 {
            dy = 1e-9;
        }
        if (yi > point.y) != (yj > point.y) && point.x < (xj - xi) * (point.y - yi) / dy + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Containment against a polygon set: inside some outer ring and not
/// inside any of that polygon's holes.
pub(crate) fn point_in_geometry(point: Coord<f64>, polygons: &[Polygon<f64>]) -> bool {
    for polygon in polygons {
        if !point_in_ring(point, &polygon.exterior().0) {
            continue;
        }
        let in_hole = polygon
            .interiors()
            .iter()
            .any(|hole| point_in_ring(point, &hole.0));
        if !in_hole {
            return true;
        }
    }
    false
}

/// Arithmetic-mean centroid over the outer-ring points of a polygon set,
/// skipping the closing duplicate so no vertex is double counted.
pub(crate) fn outer_ring_centroid(polygons: &[Polygon<f64>], fallback: Coord<f64>) -> Coord<f64> {
    let mut sum = Coord { x: 0.0, y: 0.0 };
    let mut count = 0usize;

    for polygon in polygons {
        let ring = &polygon.exterior().0;
        let coords = if ring.len() > 1 && ring.first() == ring.last() {
            &ring[..ring.len() - 1]
        } else {
            &ring[..]
        };
        for coord in coords {
            sum.x += coord.x;
            sum.y += coord.y;
            count += 1;
        }
    }

    if count == 0 {
        return fallback;
    }
    Coord { x: sum.x / count as f64, y: sum.y / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn square(min: f64, max: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(min, min), (max, min), (max, max), (min, max)]),
            vec![],
        )
    }

    fn square_with_hole() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]),
            vec![LineString::from(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0)])],
        )
    }

    #[test]
    fn bounds_cover_outer_and_holes() {
        let bounds = geometry_bounds(&[square_with_hole()]).unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 10.0, y: 10.0 });
    }

    #[test]
    fn bounds_reject_empty_set() {
        let err = geometry_bounds(&[]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidGeometry(_)));
    }

    #[test]
    fn bounds_reject_non_finite_coordinates() {
        let bad = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (f64::NAN, 1.0), (1.0, 1.0)]),
            vec![],
        );
        assert!(geometry_bounds(&[bad]).is_err());
    }

    #[test]
    fn containment_respects_holes() {
        let polygons = [square_with_hole()];
        assert!(point_in_geometry(Coord { x: 2.0, y: 2.0 }, &polygons));
        assert!(!point_in_geometry(Coord { x: 5.0, y: 5.0 }, &polygons), "hole is excluded");
        assert!(!point_in_geometry(Coord { x: 11.0, y: 5.0 }, &polygons));
    }

    #[test]
    fn containment_checks_every_polygon() {
        let polygons = [square(0.0, 1.0), square(5.0, 6.0)];
        assert!(point_in_geometry(Coord { x: 5.5, y: 5.5 }, &polygons));
        assert!(!point_in_geometry(Coord { x: 3.0, y: 3.0 }, &polygons));
    }

    #[test]
    fn centroid_is_mean_of_outer_vertices() {
        let centroid = outer_ring_centroid(&[square(0.0, 2.0)], Coord { x: -1.0, y: -1.0 });
        assert!((centroid.x - 1.0).abs() < 1e-12);
        assert!((centroid.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn centroid_falls_back_when_empty() {
        let fallback = Coord { x: 210.0, y: 150.0 };
        assert_eq!(outer_ring_centroid(&[], fallback), fallback);
    }
}
