//! Shader library
//!
//! Keyed store of compiled vertex, pixel and compute permutations. Binding a
//! technique looks up the vertex/pixel pair for its projected ids.

use std::sync::Arc;

use hashbrown::HashMap;
use technique_common::{PixelTechniqueId, RawTechniqueId, VertexTechniqueId};

use crate::error::TechniqueError;
use crate::shader::{Compute, ComputeTechniqueId, Pixel, ShaderInstance, Vertex};

/// Vertex and pixel permutation bound together for one technique
#[derive(Debug, Clone)]
pub struct ShaderPair {
    pub vertex: Arc<ShaderInstance<Vertex>>,
    pub pixel: Arc<ShaderInstance<Pixel>>,
}

/// All loaded permutations of the lighting shader
#[derive(Debug, Default)]
pub struct ShaderLibrary {
    vertex: HashMap<VertexTechniqueId, Arc<ShaderInstance<Vertex>>>,
    pixel: HashMap<PixelTechniqueId, Arc<ShaderInstance<Pixel>>>,
    compute: HashMap<ComputeTechniqueId, Arc<ShaderInstance<Compute>>>,
    active: Option<(VertexTechniqueId, PixelTechniqueId)>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a vertex permutation, replacing any previous one with the same id
    pub fn insert_vertex(&mut self, shader: ShaderInstance<Vertex>) -> Option<Arc<ShaderInstance<Vertex>>> {
        self.vertex.insert(shader.technique_id(), Arc::new(shader))
    }

    /// Register a pixel permutation, replacing any previous one with the same id
    pub fn insert_pixel(&mut self, shader: ShaderInstance<Pixel>) -> Option<Arc<ShaderInstance<Pixel>>> {
        self.pixel.insert(shader.technique_id(), Arc::new(shader))
    }

    pub fn insert_compute(&mut self, shader: ShaderInstance<Compute>) -> Option<Arc<ShaderInstance<Compute>>> {
        self.compute.insert(shader.technique_id(), Arc::new(shader))
    }

    pub fn vertex(&self, id: VertexTechniqueId) -> Option<&Arc<ShaderInstance<Vertex>>> {
        self.vertex.get(&id)
    }

    pub fn pixel(&self, id: PixelTechniqueId) -> Option<&Arc<ShaderInstance<Pixel>>> {
        self.pixel.get(&id)
    }

    pub fn compute(&self, id: ComputeTechniqueId) -> Option<&Arc<ShaderInstance<Compute>>> {
        self.compute.get(&id)
    }

    /// Number of loaded (vertex, pixel, compute) permutations
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.vertex.len(), self.pixel.len(), self.compute.len())
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.pixel.is_empty() && self.compute.is_empty()
    }

    /// Resolve and lock the shader pair for a technique
    ///
    /// # Errors
    ///
    /// Returns [`TechniqueError`] if either permutation is missing. The library
    /// state is unchanged in that case.
    pub fn begin_technique(
        &mut self,
        raw: RawTechniqueId,
        vertex: VertexTechniqueId,
        pixel: PixelTechniqueId,
    ) -> Result<ShaderPair, TechniqueError> {
        let vertex_shader = self
            .vertex
            .get(&vertex)
            .ok_or(TechniqueError::MissingVertexShader { raw, vertex })?;
        let pixel_shader = self
            .pixel
            .get(&pixel)
            .ok_or(TechniqueError::MissingPixelShader { raw, pixel })?;

        if let Some((v, p)) = self.active {
            tracing::debug!(vertex = %v, pixel = %p, "technique begun while another was active");
        }

        let pair = ShaderPair {
            vertex: Arc::clone(vertex_shader),
            pixel: Arc::clone(pixel_shader),
        };
        self.active = Some((vertex, pixel));
        Ok(pair)
    }

    /// Release the pair locked by [`ShaderLibrary::begin_technique`]
    pub fn end_technique(&mut self) {
        if self.active.take().is_none() {
            tracing::debug!("end_technique without an active technique");
        }
    }

    /// Ids of the currently locked pair
    pub fn active(&self) -> Option<(VertexTechniqueId, PixelTechniqueId)> {
        self.active
    }
}
