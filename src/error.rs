use thiserror::Error;

/// Failure taxonomy for one render cycle.
///
/// `InvalidGeometry` is fatal to the cycle that raised it but never to the
/// process; `UnknownEnumValue` marks input that falls outside a closed
/// lookup set and should surface loudly at the parse boundary;
/// `MissingProjection` is a sequencing error (mesh or cluster stage invoked
/// before the geometry stage produced a projection).
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("unknown {kind} value: {value:?}")]
    UnknownEnumValue { kind: &'static str, value: String },

    #[error("projection not available: {0}")]
    MissingProjection(&'static str),
}

impl MeshError {
    pub(crate) fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownEnumValue { kind, value: value.into() }
    }
}
