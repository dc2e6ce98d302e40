//! Error types for technique setup, shader construction and configuration

use std::path::PathBuf;

use technique_common::{PixelTechniqueId, RawTechniqueId, VertexTechniqueId};

/// Failure to bind a shader pair for a requested technique
///
/// The caller must skip the draw. Nothing has been flushed or applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TechniqueError {
    /// No compiled vertex permutation for the technique
    #[error("no vertex shader for technique {vertex} (raw {raw})")]
    MissingVertexShader {
        raw: RawTechniqueId,
        vertex: VertexTechniqueId,
    },

    /// No compiled pixel permutation for the technique
    #[error("no pixel shader for technique {pixel} (raw {raw})")]
    MissingPixelShader {
        raw: RawTechniqueId,
        pixel: PixelTechniqueId,
    },
}

/// Invalid shader instance description
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    /// Offset table length differs from the stage's constant count
    #[error("offset table has {actual} entries, {stage} shaders need {expected}")]
    OffsetTableLength {
        stage: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Slot index at or beyond the stage's constant count
    #[error("slot {slot} is out of range for {stage} shaders (max {max})")]
    SlotOutOfRange {
        stage: &'static str,
        slot: usize,
        max: usize,
    },

    /// Offset lies outside every constant buffer the shader declares
    #[error("slot {slot} offset {offset} exceeds the largest constant buffer ({limit} words)")]
    OffsetOutOfRange { slot: usize, offset: u8, limit: u32 },
}

/// Failure to load or save a lighting configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lighting config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize lighting config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
