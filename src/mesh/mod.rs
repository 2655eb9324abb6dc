mod builder;
mod connect;

pub use builder::build_mesh;
pub use connect::connect_nodes;

use geo::Coord;

/// An unordered pair of node indices with its cached Euclidean length.
/// Stored normalized (`a < b`); the edge set never holds duplicates or
/// self-loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshEdge {
    pub a: usize,
    pub b: usize,
    pub length: f64,
}

impl MeshEdge {
    pub(crate) fn new(i: usize, j: usize, length: f64) -> Self {
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        Self { a, b, length }
    }

    #[inline] pub(crate) fn key(&self) -> (usize, usize) { (self.a, self.b) }
}

/// One generated spatial mesh. Constructed fresh per parameter change and
/// fully replaced, never patched in place.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub nodes: Vec<Coord<f64>>,
    pub edges: Vec<MeshEdge>,
    /// Mean edge length in viewport units; the nominal step size when the
    /// edge set is empty.
    pub mean_edge_px: f64,
}

impl Mesh {
    #[inline] pub fn node_count(&self) -> usize { self.nodes.len() }

    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Number of edges incident to `node`.
    pub fn degree(&self, node: usize) -> usize {
        self.edges.iter().filter(|e| e.a == node || e.b == node).count()
    }
}

/// Deterministic 2D pseudo-noise in [0, 1): a stateless hash-like formula,
/// the only "randomness" in the pipeline.
#[inline]
pub(crate) fn noise(x: f64, y: f64, seed: f64) -> f64 {
    let value = (x * 12.9898 + y * 78.233 + seed * 37.719).sin() * 43758.5453;
    value - value.floor()
}

pub(crate) fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_is_deterministic_and_bounded() {
        for i in 0..200 {
            let x = i as f64 * 1.7;
            let y = i as f64 * 0.3 - 40.0;
            let v = noise(x, y, 23.0);
            assert!((0.0..1.0).contains(&v), "noise out of range: {v}");
            assert_eq!(v, noise(x, y, 23.0));
        }
    }

    #[test]
    fn noise_seeds_are_independent() {
        let a = noise(10.0, 20.0, 13.0);
        let b = noise(10.0, 20.0, 18.0);
        assert_ne!(a, b);
    }

    #[test]
    fn edges_normalize_their_index_pair() {
        let edge = MeshEdge::new(7, 2, 3.5);
        assert_eq!((edge.a, edge.b), (2, 7));
        assert_eq!(edge.key(), (2, 7));
    }

    #[test]
    fn degree_counts_both_endpoints() {
        let mesh = Mesh {
            nodes: vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 2.0, y: 0.0 },
            ],
            edges: vec![MeshEdge::new(0, 1, 1.0), MeshEdge::new(1, 2, 1.0)],
            mean_edge_px: 1.0,
        };
        assert_eq!(mesh.degree(0), 1);
        assert_eq!(mesh.degree(1), 2);
        assert_eq!(mesh.degree(2), 1);
    }
}
