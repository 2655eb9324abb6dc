#![doc = "Deterministic spatial mesh and synthetic diagnostics engine for survey coverage maps"]
mod cluster;
mod error;
mod geometry;
mod inputs;
mod mesh;
mod metrics;
mod profile;
mod render;
mod session;

#[doc(inline)]
pub use error::MeshError;

#[doc(inline)]
pub use inputs::{
    BASELINE_CUTOFF, BASELINE_OFFSET, ControlInputs, IndicatorQuad, MeasurementRegime,
    ModelFamily, Resolution,
};

#[doc(inline)]
pub use geometry::{
    ProjectedGeometry, Projection, RawGeometry, Viewport, parse_geojson, project_geometry,
};

#[doc(inline)]
pub use mesh::{Mesh, MeshEdge, build_mesh, connect_nodes};

#[doc(inline)]
pub use metrics::{IndicatorSet, synthesize};

#[doc(inline)]
pub use profile::{ProfileCache, StateProfile};

#[doc(inline)]
pub use cluster::{
    ClusterData, ClusterPoint, ClusterRecord, ClusterView, OutcomeTotals, build_cluster_view,
};

#[doc(inline)]
pub use session::{Generation, RenderCycle, Scene, Session};

#[doc(inline)]
pub use render::write_scene_svg;
