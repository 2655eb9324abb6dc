use geo::{Coord, Polygon};
use tracing::debug;

use crate::geometry::{ProjectedGeometry, point_in_geometry};
use crate::inputs::ControlInputs;
use crate::mesh::{Mesh, distance, noise};
use crate::profile::StateProfile;

/// Merged sets above this count get one even-index halving to lighten
/// the O(n^2) passes.
const NODE_CAP: usize = 320;

/// Jitter amplitude as a fraction of the grid step.
const JITTER_SCALE: f64 = 0.34;

/// Generate the mesh for one render cycle: candidate grid, thinning,
/// boundary insertion, merge, decimation, then edge connection.
///
/// Fully reproducible for fixed inputs; the only perturbation source is
/// the seeded noise function.
pub fn build_mesh(inputs: &ControlInputs, geometry: &ProjectedGeometry, profile: &StateProfile) -> Mesh {
    let step = inputs.resolution.step();
    let seed = (profile.seed + inputs.model.seed_term() + inputs.resolution.level() * 17) as f64;

    let candidates = candidate_grid(geometry, step, seed);

    let min_dist = 4.8 + inputs.cutoff * 96.0;
    let interior = enforce_min_distance(&candidates, min_dist);
    let boundary = boundary_nodes(&geometry.domain, step, inputs.offset);
    let mut nodes = merge_nodes(interior, &boundary, min_dist * 0.65);

    if nodes.len() > NODE_CAP {
        nodes = nodes
            .into_iter()
            .enumerate()
            .filter(|(index, _)| index % 2 == 0)
            .map(|(_, node)| node)
            .collect();
    }

    let edges = super::connect_nodes(&nodes, inputs);
    let mean_edge_px = if edges.is_empty() {
        step
    } else {
        edges.iter().map(|e| e.length).sum::<f64>() / edges.len() as f64
    };

    debug!(
        candidates = candidates.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        mean_edge_px,
        "built mesh"
    );

    Mesh { nodes, edges, mean_edge_px }
}

/// Walk a row-staggered grid over the domain bounding box, jitter each
/// position with seeded noise, and keep positions inside the domain.
fn candidate_grid(geometry: &ProjectedGeometry, step: f64, seed: f64) -> Vec<Coord<f64>> {
    let bounds = geometry.bounds;
    let jitter = step * JITTER_SCALE;
    let mut candidates = Vec::new();
    let mut row = 0usize;

    let mut y = bounds.min().y;
    while y <= bounds.max().y {
        // Odd rows shift by half a step for a brick-like pattern.
        let shift = if row % 2 == 0 { 0.0 } else { step * 0.5 };
        let mut x = bounds.min().x;
        while x <= bounds.max().x {
            let point = Coord {
                x: x + shift + (noise(x * 0.11, y * 0.13, seed) - 0.5) * jitter,
                y: y + (noise(y * 0.09, x * 0.17, seed + 5.0) - 0.5) * jitter,
            };
            if point_in_geometry(point, &geometry.domain) {
                candidates.push(point);
            }
            x += step;
        }
        y += step;
        row += 1;
    }

    candidates
}

/// Greedy minimum-distance thinning in generation order. O(n^2); kept as
/// a standalone strategy so a grid- or tree-accelerated version can slot
/// in if the node cap is ever raised.
pub(crate) fn enforce_min_distance(points: &[Coord<f64>], min_dist: f64) -> Vec<Coord<f64>> {
    let min_dist2 = min_dist * min_dist;
    let mut selected: Vec<Coord<f64>> = Vec::new();

    for &p in points {
        let keep = selected.iter().all(|&q| {
            let dx = p.x - q.x;
            let dy = p.y - q.y;
            dx * dx + dy * dy >= min_dist2
        });
        if keep {
            selected.push(p);
        }
    }

    selected
}

/// Evenly spaced points along every outer-ring segment. The per-segment
/// count grows with segment length and the domain offset.
pub(crate) fn boundary_nodes(polygons: &[Polygon<f64>], step: f64, offset: f64) -> Vec<Coord<f64>> {
    let mut nodes = Vec::new();

    for polygon in polygons {
        // Rings are stored closed, so consecutive pairs cover the closing
        // segment without wrapping.
        for pair in polygon.exterior().0.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let length = distance(a, b);
            let count = (length / (step * 0.95) + offset * 2.2).round().max(1.0) as usize;
            for s in 0..=count {
                let t = s as f64 / count as f64;
                nodes.push(Coord {
                    x: a.x + (b.x - a.x) * t,
                    y: a.y + (b.y - a.y) * t,
                });
            }
        }
    }

    nodes
}

/// Admit extra points into the set only when they clear `min_dist` against
/// everything already included (greedy, same rule as thinning but with the
/// merge's asymmetric threshold).
pub(crate) fn merge_nodes(
    primary: Vec<Coord<f64>>,
    extras: &[Coord<f64>],
    min_dist: f64,
) -> Vec<Coord<f64>> {
    let min_dist2 = min_dist * min_dist;
    let mut merged = primary;

    for &p in extras {
        let near = merged.iter().any(|&q| {
            let dx = p.x - q.x;
            let dy = p.y - q.y;
            dx * dx + dy * dy < min_dist2
        });
        if !near {
            merged.push(p);
        }
    }

    merged
}
