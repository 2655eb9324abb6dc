use geo::{Coord, LineString, Polygon, Rect};
use tracing::debug;

use crate::error::MeshError;
use crate::geometry::{RawGeometry, geometry_bounds, outer_ring_centroid};
use crate::inputs::BASELINE_OFFSET;

/// Target drawing surface. The defaults match the 420x300 canvas with a
/// 12px margin that all step-size and spacing constants are tuned for.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 420.0, height: 300.0, margin: 12.0 }
    }
}

impl Viewport {
    #[inline] fn inner_width(&self) -> f64 { self.width - self.margin * 2.0 }
    #[inline] fn inner_height(&self) -> f64 { self.height - self.margin * 2.0 }

    #[inline] fn center(&self) -> Coord<f64> {
        Coord { x: self.width / 2.0, y: self.height / 2.0 }
    }

    /// Clamp a coordinate into the drawable area, half a margin in from
    /// each edge (6..414 x 6..294 at the defaults).
    fn clamp(&self, coord: Coord<f64>) -> Coord<f64> {
        let inset = self.margin / 2.0;
        Coord {
            x: coord.x.clamp(inset, self.width - inset),
            y: coord.y.clamp(inset, self.height - inset),
        }
    }
}

/// Pure lon/lat -> viewport transform. Latitude is flipped because the
/// target space has y increasing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub min_lon: f64,
    pub max_lat: f64,
    pub scale: f64,
    pub x_pad: f64,
    pub y_pad: f64,
}

impl Projection {
    #[inline]
    pub fn apply(&self, lon: f64, lat: f64) -> Coord<f64> {
        Coord {
            x: self.x_pad + (lon - self.min_lon) * self.scale,
            y: self.y_pad + (self.max_lat - lat) * self.scale,
        }
    }
}

/// Output of the geometry stage: boundary rings in viewport space, the
/// offset-scaled domain rings mesh generation is bounded by, and the
/// transform the cluster layer shares.
#[derive(Debug, Clone)]
pub struct ProjectedGeometry {
    pub boundary: Vec<Polygon<f64>>,
    pub domain: Vec<Polygon<f64>>,
    pub bounds: Rect<f64>,
    pub projection: Projection,
    pub domain_factor: f64,
    pub viewport: Viewport,
}

/// Project raw boundary geometry and derive the domain polygons.
///
/// Pure function of (geometry, offset, viewport): fits the lon/lat box
/// into the viewport preserving aspect ratio, centers it, then scales
/// every ring about the projected centroid by the offset-derived domain
/// factor, clamping into the drawable area.
pub fn project_geometry(
    raw: &RawGeometry,
    offset: f64,
    viewport: Viewport,
) -> Result<ProjectedGeometry, MeshError> {
    if raw.polygons.is_empty() {
        return Err(MeshError::InvalidGeometry("empty polygon set".to_string()));
    }

    let bbox = raw.bbox;
    if !(bbox.min().x.is_finite() && bbox.min().y.is_finite()
        && bbox.max().x.is_finite() && bbox.max().y.is_finite())
    {
        return Err(MeshError::InvalidGeometry("non-finite bounding box".to_string()));
    }

    // Floor the spans so a degenerate extent cannot blow up the scale.
    let lon_span = (bbox.max().x - bbox.min().x).max(1e-8);
    let lat_span = (bbox.max().y - bbox.min().y).max(1e-8);
    let scale = (viewport.inner_width() / lon_span).min(viewport.inner_height() / lat_span);

    let fitted_w = lon_span * scale;
    let fitted_h = lat_span * scale;
    let projection = Projection {
        min_lon: bbox.min().x,
        max_lat: bbox.max().y,
        scale,
        x_pad: viewport.margin + (viewport.inner_width() - fitted_w) / 2.0,
        y_pad: viewport.margin + (viewport.inner_height() - fitted_h) / 2.0,
    };

    let boundary: Vec<Polygon<f64>> = raw
        .polygons
        .iter()
        .map(|polygon| map_polygon(polygon, |c| projection.apply(c.x, c.y)))
        .collect();

    let center = outer_ring_centroid(&boundary, viewport.center());
    let domain_factor = (1.0 + (offset - BASELINE_OFFSET) * 0.42).clamp(0.82, 1.30);
    let domain: Vec<Polygon<f64>> = boundary
        .iter()
        .map(|polygon| {
            map_polygon(polygon, |c| {
                viewport.clamp(Coord {
                    x: center.x + (c.x - center.x) * domain_factor,
                    y: center.y + (c.y - center.y) * domain_factor,
                })
            })
        })
        .collect();

    let bounds = geometry_bounds(&domain)?;
    debug!(
        polygons = boundary.len(),
        domain_factor,
        scale,
        "projected boundary geometry"
    );

    Ok(ProjectedGeometry { boundary, domain, bounds, projection, domain_factor, viewport })
}

fn map_polygon(polygon: &Polygon<f64>, f: impl Fn(&Coord<f64>) -> Coord<f64>) -> Polygon<f64> {
    let map_ring = |ring: &LineString<f64>| LineString(ring.0.iter().map(&f).collect());
    Polygon::new(
        map_ring(polygon.exterior()),
        polygon.interiors().iter().map(map_ring).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_in_ring;
    use geo::LineString;

    fn unit_square() -> RawGeometry {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
            vec![],
        );
        let bbox = geometry_bounds(std::slice::from_ref(&polygon)).unwrap();
        RawGeometry { polygons: vec![polygon], bbox }
    }

    #[test]
    fn unit_square_fills_inner_height_and_centers_x() {
        let projected = project_geometry(&unit_square(), BASELINE_OFFSET, Viewport::default()).unwrap();
        let p = projected.projection;

        // 276/1 < 396/1, so the square is fitted to the inner height.
        assert!((p.scale - 276.0).abs() < 1e-9);
        assert!((p.y_pad - 12.0).abs() < 1e-9);
        assert!((p.x_pad - (12.0 + (396.0 - 276.0) / 2.0)).abs() < 1e-9);

        // Latitude flip: the top-left projected corner is max_lat.
        let top_left = p.apply(0.0, 1.0);
        assert!((top_left.x - p.x_pad).abs() < 1e-9);
        assert!((top_left.y - p.y_pad).abs() < 1e-9);
    }

    #[test]
    fn baseline_offset_leaves_domain_at_unit_factor() {
        let projected = project_geometry(&unit_square(), BASELINE_OFFSET, Viewport::default()).unwrap();
        assert!((projected.domain_factor - 1.0).abs() < 1e-12);

        for (b, d) in projected.boundary[0]
            .exterior()
            .0
            .iter()
            .zip(projected.domain[0].exterior().0.iter())
        {
            assert!((b.x - d.x).abs() < 1e-9);
            assert!((b.y - d.y).abs() < 1e-9);
        }
    }

    #[test]
    fn domain_factor_is_clamped_at_both_ends() {
        let raw = unit_square();
        let grown = project_geometry(&raw, 10.0, Viewport::default()).unwrap();
        assert!((grown.domain_factor - 1.30).abs() < 1e-12);

        let shrunk = project_geometry(&raw, -10.0, Viewport::default()).unwrap();
        assert!((shrunk.domain_factor - 0.82).abs() < 1e-12);
    }

    #[test]
    fn expanded_domain_stays_inside_the_drawable_area() {
        let projected = project_geometry(&unit_square(), 1.0, Viewport::default()).unwrap();
        for coord in &projected.domain[0].exterior().0 {
            assert!(coord.x >= 6.0 && coord.x <= 414.0);
            assert!(coord.y >= 6.0 && coord.y <= 294.0);
        }
    }

    #[test]
    fn domain_bounds_cover_scaled_rings() {
        let projected = project_geometry(&unit_square(), 0.6, Viewport::default()).unwrap();
        for coord in &projected.domain[0].exterior().0 {
            assert!(coord.x >= projected.bounds.min().x - 1e-9);
            assert!(coord.x <= projected.bounds.max().x + 1e-9);
            assert!(coord.y >= projected.bounds.min().y - 1e-9);
            assert!(coord.y <= projected.bounds.max().y + 1e-9);
        }
    }

    #[test]
    fn projection_is_pure_and_reproducible() {
        let raw = unit_square();
        let a = project_geometry(&raw, 0.4, Viewport::default()).unwrap();
        let b = project_geometry(&raw, 0.4, Viewport::default()).unwrap();
        assert_eq!(a.projection, b.projection);
        assert_eq!(a.domain_factor, b.domain_factor);
        assert_eq!(a.domain[0].exterior().0, b.domain[0].exterior().0);
    }

    #[test]
    fn projected_square_interior_passes_containment() {
        let projected = project_geometry(&unit_square(), BASELINE_OFFSET, Viewport::default()).unwrap();
        let center = projected.projection.apply(0.5, 0.5);
        assert!(point_in_ring(center, &projected.domain[0].exterior().0));
    }
}
