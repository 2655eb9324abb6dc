use std::str::FromStr;

use crate::error::MeshError;

/// Reference values the synthetic metrics are measured against.
pub const BASELINE_OFFSET: f64 = 0.25;
pub const BASELINE_CUTOFF: f64 = 0.08;

/// One row of additive indicator deltas. Shared by the resolution, model
/// family, and measurement-regime effect tables, and by profile baselines.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorQuad {
    pub rmse: f64,
    pub unc: f64,
    pub stability: f64,
    pub ppc: f64,
}

impl IndicatorQuad {
    pub const fn new(rmse: f64, unc: f64, stability: f64, ppc: f64) -> Self {
        Self { rmse, unc, stability, ppc }
    }
}

/// Discrete mesh density setting. Controls grid step size, neighbor
/// fan-out, the node-count multiplier, and one row of indicator effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Sparse, // level 1, coarse
    Medium, // level 2
    Fine,   // level 3
}

impl Resolution {
    /// Parse the 1..=3 integer level used by external control inputs.
    pub fn try_from_level(level: i64) -> Result<Self, MeshError> {
        match level {
            1 => Ok(Self::Sparse),
            2 => Ok(Self::Medium),
            3 => Ok(Self::Fine),
            other => Err(MeshError::unknown("resolution level", other.to_string())),
        }
    }

    #[inline] pub fn level(self) -> u32 {
        match self {
            Self::Sparse => 1,
            Self::Medium => 2,
            Self::Fine => 3,
        }
    }

    /// Grid step size in viewport units, coarse to fine.
    #[inline] pub fn step(self) -> f64 {
        match self {
            Self::Sparse => 52.0,
            Self::Medium => 36.0,
            Self::Fine => 24.0,
        }
    }

    /// Nearest-neighbor fan-out before the model-family bonus.
    #[inline] pub fn neighbor_k(self) -> usize {
        match self {
            Self::Sparse => 2,
            Self::Medium => 3,
            Self::Fine => 4,
        }
    }

    /// Node-count multiplier for the closed-form approximation used when
    /// no measured mesh is available.
    #[inline] pub fn node_mult(self) -> f64 {
        match self {
            Self::Sparse => 0.72,
            Self::Medium => 1.0,
            Self::Fine => 1.42,
        }
    }

    pub fn effects(self) -> IndicatorQuad {
        match self {
            Self::Sparse => IndicatorQuad::new(0.032, 0.048, -0.060, -0.033),
            Self::Medium => IndicatorQuad::new(0.0, 0.0, 0.0, 0.0),
            Self::Fine => IndicatorQuad::new(-0.019, -0.029, 0.040, 0.020),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sparse => "Sparse (Coarse)",
            Self::Medium => "Medium",
            Self::Fine => "Fine",
        }
    }
}

/// The two synthetic model families the lab compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    InlaSpde,
    SpGlm,
}

impl ModelFamily {
    pub fn effects(self) -> IndicatorQuad {
        match self {
            Self::InlaSpde => IndicatorQuad::new(-0.010, -0.014, 0.016, 0.010),
            Self::SpGlm => IndicatorQuad::new(0.010, 0.014, -0.012, -0.008),
        }
    }

    /// Contribution to the deterministic noise seed.
    #[inline] pub fn seed_term(self) -> u32 {
        match self {
            Self::InlaSpde => 11,
            Self::SpGlm => 29,
        }
    }

    /// Flat extension of the maximum edge length, in viewport units.
    #[inline] pub fn edge_bonus(self) -> f64 {
        match self {
            Self::InlaSpde => 5.0,
            Self::SpGlm => 0.0,
        }
    }

    /// Extra neighbor links granted on top of the resolution fan-out.
    #[inline] pub fn extra_neighbors(self) -> usize {
        match self {
            Self::InlaSpde => 1,
            Self::SpGlm => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InlaSpde => "INLA-SPDE",
            Self::SpGlm => "spGLM",
        }
    }
}

impl FromStr for ModelFamily {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inla" => Ok(Self::InlaSpde),
            "spglm" => Ok(Self::SpGlm),
            other => Err(MeshError::unknown("model family", other)),
        }
    }
}

/// Binary selector between the two measurement-evidence assumptions
/// (vaccination card plus caregiver recall, or card only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementRegime {
    CardPlusRecall, // mr1
    CardOnly,       // mr0
}

impl MeasurementRegime {
    pub fn effects(self) -> IndicatorQuad {
        match self {
            Self::CardPlusRecall => IndicatorQuad::new(-0.014, -0.025, 0.020, 0.012),
            Self::CardOnly => IndicatorQuad::new(0.018, 0.032, -0.024, -0.015),
        }
    }

    /// Short key used by the cluster summary data fields.
    #[inline] pub fn key(self) -> &'static str {
        match self {
            Self::CardPlusRecall => "mr1",
            Self::CardOnly => "mr0",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CardPlusRecall => "MR=1 (card + recall)",
            Self::CardOnly => "MR=0 (card only)",
        }
    }
}

impl FromStr for MeasurementRegime {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mr1" => Ok(Self::CardPlusRecall),
            "mr0" => Ok(Self::CardOnly),
            other => Err(MeshError::unknown("measurement regime", other)),
        }
    }
}

/// The full set of control inputs driving one render cycle.
#[derive(Debug, Clone)]
pub struct ControlInputs {
    pub state: String,
    pub model: ModelFamily,
    pub regime: MeasurementRegime,
    pub resolution: Resolution,
    /// Domain expansion control, intended range roughly 0.0..=1.0.
    pub offset: f64,
    /// Node-spacing cutoff, intended range roughly 0.0..=1.0.
    pub cutoff: f64,
    /// Outcome selector into per-cluster fields, e.g. "MCV1".
    pub vaccine: String,
}

impl ControlInputs {
    /// The reference configuration every delta is reported against.
    pub fn baseline() -> Self {
        Self {
            state: "Uttar Pradesh".to_string(),
            model: ModelFamily::InlaSpde,
            regime: MeasurementRegime::CardPlusRecall,
            resolution: Resolution::Medium,
            offset: BASELINE_OFFSET,
            cutoff: BASELINE_CUTOFF,
            vaccine: "MCV1".to_string(),
        }
    }
}
