//! Shared technique types for the lighting shader
//!
//! This crate provides the GPU-free half of the lighting pipeline, shared between:
//! - `lighting-shader` (constant setup and binding)
//! - `technique-cli` (developer tooling)
//!
//! # Modules
//!
//! - [`technique`] - Raw/vertex/pixel technique ids, feature flags, base techniques
//! - [`codec`] - Mapping a requested technique to its raw, vertex and pixel projections

pub mod codec;
pub mod technique;

// Re-export commonly used codec items
pub use codec::{
    KillSwitches, REQUEST_BASE, to_pixel_technique, to_raw_technique, to_requested_technique,
    to_vertex_technique,
};

// Re-export commonly used technique items
pub use technique::{
    BASE_TECHNIQUE_MASK, BASE_TECHNIQUE_SHIFT, BaseTechnique, LIGHT_COUNT_SHIFT,
    PixelTechniqueId, RawTechniqueId, SHADOW_LIGHT_COUNT_SHIFT, TechniqueFlags,
    VertexTechniqueId,
};
