use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::cluster::{ClusterData, ClusterView, build_cluster_view};
use crate::error::MeshError;
use crate::geometry::{ProjectedGeometry, RawGeometry, Viewport, project_geometry};
use crate::inputs::ControlInputs;
use crate::mesh::{Mesh, build_mesh};
use crate::metrics::{IndicatorSet, synthesize};
use crate::profile::{ProfileCache, StateProfile};

/// Everything one render cycle hands to the rendering collaborator.
#[derive(Debug, Clone)]
pub struct Scene {
    pub inputs: ControlInputs,
    pub profile: Arc<StateProfile>,
    pub geometry: ProjectedGeometry,
    pub mesh: Mesh,
    pub indicators: IndicatorSet,
    pub clusters: ClusterView,
}

/// Staleness token for one render cycle. A cycle whose generation has
/// been superseded produces no scene; the caller silently discards it and
/// keeps whatever interim state it chooses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// Long-lived computation context: the monotonically increasing render
/// generation and the per-region profile cache. The pipeline itself is
/// pure; this is the only shared state it touches.
#[derive(Debug, Default)]
pub struct Session {
    generation: AtomicU64,
    profiles: ProfileCache,
    viewport: Viewport,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_viewport(viewport: Viewport) -> Self {
        Self { viewport, ..Self::default() }
    }

    /// Start a render cycle for a fresh set of control inputs. Any cycle
    /// started earlier is superseded from this point on.
    pub fn begin(&self, inputs: ControlInputs) -> RenderCycle<'_> {
        let generation = Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        let profile = self.profiles.get(&inputs.state);
        debug!(generation = generation.0, state = %inputs.state, "begin render cycle");
        RenderCycle {
            session: self,
            generation,
            inputs,
            profile,
            geometry: None,
            mesh: None,
            clusters: None,
        }
    }

    /// Whether `generation` is still the newest cycle.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation.load(Ordering::SeqCst) == generation.0
    }

    /// Profile lookup through the session cache.
    pub fn profile(&self, state: &str) -> Arc<StateProfile> {
        self.profiles.get(state)
    }

    /// Run the whole pipeline in one call: projection, mesh, metrics, and
    /// cluster view. Returns `Ok(None)` when a newer cycle superseded this
    /// one before it finished.
    pub fn compute_scene(
        &self,
        inputs: ControlInputs,
        raw: &RawGeometry,
        clusters: Option<&ClusterData>,
    ) -> Result<Option<Scene>, MeshError> {
        let mut cycle = self.begin(inputs);
        cycle.project(raw)?;
        cycle.build_mesh()?;
        if let Some(data) = clusters {
            cycle.build_clusters(data)?;
        }
        cycle.finish()
    }
}

/// One in-flight recomputation. Stages must run in order: projection
/// first, then mesh and cluster view; `finish` assembles the scene only
/// if the cycle is still current.
pub struct RenderCycle<'a> {
    session: &'a Session,
    generation: Generation,
    inputs: ControlInputs,
    profile: Arc<StateProfile>,
    geometry: Option<ProjectedGeometry>,
    mesh: Option<Mesh>,
    clusters: Option<ClusterView>,
}

impl RenderCycle<'_> {
    #[inline] pub fn generation(&self) -> Generation { self.generation }

    #[inline] pub fn is_stale(&self) -> bool { !self.session.is_current(self.generation) }

    /// Geometry stage: project the boundary and derive the domain.
    pub fn project(&mut self, raw: &RawGeometry) -> Result<&ProjectedGeometry, MeshError> {
        let geometry = project_geometry(raw, self.inputs.offset, self.session.viewport)?;
        Ok(self.geometry.insert(geometry))
    }

    /// Mesh stage. Requires the geometry stage to have run.
    pub fn build_mesh(&mut self) -> Result<&Mesh, MeshError> {
        let geometry = self
            .geometry
            .as_ref()
            .ok_or(MeshError::MissingProjection("mesh stage before projection"))?;
        let mesh = build_mesh(&self.inputs, geometry, &self.profile);
        Ok(self.mesh.insert(mesh))
    }

    /// Cluster stage. Requires the geometry stage to have run; shares its
    /// projection, nothing else.
    pub fn build_clusters(&mut self, data: &ClusterData) -> Result<&ClusterView, MeshError> {
        let geometry = self
            .geometry
            .as_ref()
            .ok_or(MeshError::MissingProjection("cluster stage before projection"))?;
        let view = build_cluster_view(
            data,
            &self.inputs.vaccine,
            self.inputs.regime,
            &geometry.projection,
        );
        Ok(self.clusters.insert(view))
    }

    /// Assemble the scene. `Ok(None)` when a newer cycle has superseded
    /// this one; that is expected, not an error.
    pub fn finish(self) -> Result<Option<Scene>, MeshError> {
        let geometry = self
            .geometry
            .ok_or(MeshError::MissingProjection("finish before projection"))?;
        let mesh = self
            .mesh
            .ok_or(MeshError::MissingProjection("finish before mesh stage"))?;

        if !self.session.is_current(self.generation) {
            debug!(generation = self.generation.0, "discarding stale render cycle");
            return Ok(None);
        }

        let indicators = synthesize(&self.inputs, Some(&mesh), &self.profile);
        let clusters = self
            .clusters
            .unwrap_or_else(|| ClusterView::empty(self.inputs.regime));

        Ok(Some(Scene {
            inputs: self.inputs,
            profile: self.profile,
            geometry,
            mesh,
            indicators,
            clusters,
        }))
    }
}
