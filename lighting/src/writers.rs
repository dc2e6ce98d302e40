//! External constant writers
//!
//! Geometry setup hands a few payloads to collaborators outside this crate:
//! tree instance data, directional ambient, per-light constants and the
//! projected UV detail constants. Every method defaults to a no-op.

use glam::Mat4;

use crate::constants::ConstantGroup;
use crate::scene::{Geometry, RenderPass, ShaderProperty, WorldTransform};
use crate::shader::{Pixel, Vertex};

/// Parameters for the per-light constant writer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLightRequest {
    pub inverse_world: Mat4,
    pub light_count: u32,
    pub shadow_light_count: u32,
    /// Uniform scale applied to light radii
    pub scale: f32,
    pub model_space: bool,
}

/// Collaborators that populate constants outside the binders' own writes
pub trait ConstantWriters {
    /// Per-instance constants for TREE geometry
    fn write_tree_instance(&mut self, _vertex: &mut ConstantGroup<'_, Vertex>, _property: &ShaderProperty) {}

    /// Directional ambient constants, written after the directional light
    fn write_directional_ambient(&mut self, _pixel: &mut ConstantGroup<'_, Pixel>, _world: &WorldTransform, _model_space: bool) {}

    /// Point light constants, only called when the technique has lights
    fn write_point_lights(&mut self, _pixel: &mut ConstantGroup<'_, Pixel>, _pass: &RenderPass<'_>, _request: &PointLightRequest) {}

    /// Projected UV detail constants
    ///
    /// `geometry` is `Some` when the geometry supplied its own projected UV
    /// transform.
    fn write_projected_uv(
        &mut self,
        _pixel: &mut ConstantGroup<'_, Pixel>,
        _geometry: Option<&dyn Geometry>,
        _property: &ShaderProperty,
        _enable_normals: bool,
    ) {
    }
}

/// Writers that add nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalWriters;

impl ConstantWriters for NoExternalWriters {}

/// Records which delegates were invoked, for tests and tooling
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriterLog {
    pub tree_instances: usize,
    pub directional_ambient: Vec<bool>,
    pub point_lights: Vec<PointLightRequest>,
    /// Whether each projected UV call received the geometry
    pub projected_uv: Vec<bool>,
}

impl ConstantWriters for WriterLog {
    fn write_tree_instance(&mut self, _vertex: &mut ConstantGroup<'_, Vertex>, _property: &ShaderProperty) {
        self.tree_instances += 1;
    }

    fn write_directional_ambient(&mut self, _pixel: &mut ConstantGroup<'_, Pixel>, _world: &WorldTransform, model_space: bool) {
        self.directional_ambient.push(model_space);
    }

    fn write_point_lights(&mut self, _pixel: &mut ConstantGroup<'_, Pixel>, _pass: &RenderPass<'_>, request: &PointLightRequest) {
        self.point_lights.push(*request);
    }

    fn write_projected_uv(
        &mut self,
        _pixel: &mut ConstantGroup<'_, Pixel>,
        geometry: Option<&dyn Geometry>,
        _property: &ShaderProperty,
        _enable_normals: bool,
    ) {
        self.projected_uv.push(geometry.is_some());
    }
}
