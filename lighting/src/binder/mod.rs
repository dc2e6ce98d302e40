//! Lighting shader binders
//!
//! [`LightingShader`] drives the three phases of a draw:
//!
//! 1. [`LightingShader::setup_technique`] resolves the shader pair and writes
//!    the technique tier (samplers, fog, output clamp, shadow mask).
//! 2. [`LightingShader::setup_material`] binds material textures and writes
//!    the material tier.
//! 3. [`LightingShader::setup_geometry`] writes transforms, lights and
//!    per-draw pipeline state into the geometry tier.
//!
//! Each phase flushes and applies its vertex/pixel pair before returning, and
//! each has a matching restore.

mod geometry;
mod material;
mod technique;

#[cfg(test)]
mod tests;

use crate::config::LightingConfig;
use crate::constants::{ConstantGroup, ConstantGroupLevel};
use crate::facade::{AddressMode, RendererFacade, TextureHandle};
use crate::library::ShaderLibrary;
use crate::shader::{Pixel, Vertex};

/// The lighting shader: its permutation library and global tunables
#[derive(Debug, Default)]
pub struct LightingShader {
    library: ShaderLibrary,
    config: LightingConfig,
}

impl LightingShader {
    pub fn new(library: ShaderLibrary, config: LightingConfig) -> Self {
        Self { library, config }
    }

    pub fn library(&self) -> &ShaderLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ShaderLibrary {
        &mut self.library
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LightingConfig) {
        self.config = config;
    }
}

/// Flush both groups of a tier and bind them to the pipeline
fn commit<R: RendererFacade>(
    renderer: &mut R,
    vertex: &ConstantGroup<'_, Vertex>,
    pixel: &ConstantGroup<'_, Pixel>,
    level: ConstantGroupLevel,
) {
    renderer.flush_constant_group(vertex);
    renderer.flush_constant_group(pixel);
    renderer.apply_constant_group_vsps(vertex, pixel, level);
}

/// Bind a texture and set the slot's address mode
fn bind_texture<R: RendererFacade>(renderer: &mut R, slot: u32, texture: Option<TextureHandle>, address: AddressMode) {
    renderer.set_shader_resource(slot, texture);
    renderer.set_texture_address_mode(slot, address);
}
