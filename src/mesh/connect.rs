use ahash::AHashSet;
use geo::Coord;
use rstar::RTree;
use rstar::primitives::GeomWithData;
use tracing::debug;

use crate::inputs::ControlInputs;
use crate::mesh::{MeshEdge, distance};

/// Candidate-gather radius as a multiple of the maximum edge length.
const GATHER_FACTOR: f64 = 1.45;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Connect mesh nodes into an undirected edge graph.
///
/// Each node links to up to `k` of its nearest neighbors inside the
/// distance ceiling; a rescue pass then guarantees that no node is left
/// without an incident edge. The per-node gather is the greedy O(n^2)
/// strategy (fine at the capped node counts); the rescue pass runs on an
/// R-tree so the global-nearest lookups stay cheap.
pub fn connect_nodes(nodes: &[Coord<f64>], inputs: &ControlInputs) -> Vec<MeshEdge> {
    if nodes.len() < 2 {
        return Vec::new();
    }

    let step = inputs.resolution.step();
    let k = inputs.resolution.neighbor_k() + inputs.model.extra_neighbors();
    let max_edge = (step * 1.30).max(
        step * 2.35 + inputs.offset * 12.0 - inputs.cutoff * 34.0 + inputs.model.edge_bonus(),
    );

    let mut edges: Vec<MeshEdge> = Vec::new();
    let mut seen: AHashSet<(usize, usize)> = AHashSet::new();

    for i in 0..nodes.len() {
        let mut neighbors: Vec<(usize, f64)> = (0..nodes.len())
            .filter(|&j| j != i)
            .filter_map(|j| {
                let d = distance(nodes[i], nodes[j]);
                (d <= max_edge * GATHER_FACTOR).then_some((j, d))
            })
            .collect();
        neighbors.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut linked = 0usize;
        for &(j, d) in &neighbors {
            if d > max_edge {
                continue;
            }
            let edge = MeshEdge::new(i, j, d);
            if seen.insert(edge.key()) {
                edges.push(edge);
                linked += 1;
                if linked >= k {
                    break;
                }
            }
        }
    }

    rescue_isolated(nodes, &mut edges, &mut seen);
    debug!(nodes = nodes.len(), edges = edges.len(), max_edge, "connected mesh nodes");

    edges
}

/// Force a link from every edgeless node to its globally nearest other
/// node, ignoring the distance ceiling. When the whole edge set came out
/// sparse, every node gets the treatment (which also densifies thin
/// borderline graphs the neighbor pass barely touched).
fn rescue_isolated(
    nodes: &[Coord<f64>],
    edges: &mut Vec<MeshEdge>,
    seen: &mut AHashSet<(usize, usize)>,
) {
    let mut degree = vec![0usize; nodes.len()];
    for edge in edges.iter() {
        degree[edge.a] += 1;
        degree[edge.b] += 1;
    }

    let sparse = edges.len() < nodes.len().max(8);
    let targets: Vec<usize> = (0..nodes.len())
        .filter(|&i| sparse || degree[i] == 0)
        .collect();
    if targets.is_empty() {
        return;
    }

    let tree = RTree::bulk_load(
        nodes
            .iter()
            .enumerate()
            .map(|(idx, c)| IndexedPoint::new([c.x, c.y], idx))
            .collect(),
    );

    for i in targets {
        let query = [nodes[i].x, nodes[i].y];
        let nearest = tree
            .nearest_neighbor_iter(&query)
            .find(|point| point.data != i);
        if let Some(point) = nearest {
            let j = point.data;
            let edge = MeshEdge::new(i, j, distance(nodes[i], nodes[j]));
            if seen.insert(edge.key()) {
                edges.push(edge);
            }
        }
    }
}
