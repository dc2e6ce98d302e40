//! Renderer facade
//!
//! The device-context operations the binders drive. A real backend maps these
//! onto its sampler, resource and pipeline state; [`crate::RecordingRenderer`]
//! records them for tests and tooling.

use crate::constants::{ConstantGroup, ConstantGroupLevel};
use crate::shader::{Pixel, ShaderInstance, ShaderStage, Vertex};

/// Handle to a loaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

impl TextureHandle {
    /// Invalid/null texture handle
    pub const INVALID: TextureHandle = TextureHandle(0);
}

/// Handle to a device constant buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferHandle(pub u32);

/// Number of texture slots a pixel shader can sample
pub const TEXTURE_SLOT_COUNT: u32 = 16;

// ============================================================================
// Sampler and Pipeline Modes
// ============================================================================
//
// Modes are open newtypes: a backend may understand values beyond the named
// constants and they pass through unchanged.

/// Texture address mode (U/V)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AddressMode(pub u32);

impl AddressMode {
    /// Clamp U, clamp V
    pub const CLAMP: AddressMode = AddressMode(0);
    /// Clamp U, wrap V
    pub const CLAMP_WRAP: AddressMode = AddressMode(1);
    /// Wrap U, clamp V
    pub const WRAP_CLAMP: AddressMode = AddressMode(2);
    /// Wrap U, wrap V
    pub const WRAP: AddressMode = AddressMode(3);
}

/// Texture filter mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterMode(pub u32);

impl FilterMode {
    pub const NEAREST: FilterMode = FilterMode(0);
    pub const BILINEAR: FilterMode = FilterMode(1);
    pub const TRILINEAR: FilterMode = FilterMode(2);
    pub const ANISOTROPIC: FilterMode = FilterMode(3);
}

/// Depth test/write mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthMode(pub u32);

impl DepthMode {
    pub const DISABLED: DepthMode = DepthMode(0);
    pub const TEST: DepthMode = DepthMode(1);
    pub const TEST_WRITE: DepthMode = DepthMode(3);
    pub const TEST_EQUAL: DepthMode = DepthMode(4);
    pub const TEST_GREATER: DepthMode = DepthMode(6);
}

impl Default for DepthMode {
    fn default() -> Self {
        DepthMode::TEST_WRITE
    }
}

/// Stencil mode selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StencilMode(pub u32);

impl StencilMode {
    pub const DISABLED: StencilMode = StencilMode(0);
    /// Stencil write used by LOD fade passes
    pub const LOD_FADE_WRITE: StencilMode = StencilMode(11);
}

/// Alpha blend mode selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendMode(pub u32);

impl BlendMode {
    pub const DISABLED: BlendMode = BlendMode(0);
    /// Blend mode forced by z-writing accumulation passes
    pub const ACCUMULATE: BlendMode = BlendMode(1);
}

// ============================================================================
// Constant Buffers
// ============================================================================

/// Where a mapped constant buffer lives on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferPlacement {
    /// A buffer owned by the shader instance
    #[default]
    Dedicated,
    /// A slice of the renderer's shared ring buffer
    Ring { byte_offset: u32 },
}

/// A constant buffer handed out by the renderer for one tier of one shader
///
/// `data` is `None` when the buffer could not be mapped; every write through a
/// [`ConstantGroup`] then lands in the group's scratch sink.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConstantBuffer {
    pub handle: BufferHandle,
    pub data: Option<Vec<u32>>,
    pub placement: BufferPlacement,
}

impl ConstantBuffer {
    /// A mapped, zeroed buffer of `size_words` 4-byte words
    pub fn mapped(handle: BufferHandle, size_words: usize, placement: BufferPlacement) -> Self {
        Self {
            handle,
            data: Some(vec![0; size_words]),
            placement,
        }
    }

    /// A buffer with no CPU-visible memory
    pub fn unmapped(handle: BufferHandle) -> Self {
        Self {
            handle,
            data: None,
            placement: BufferPlacement::Dedicated,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_ring(&self) -> bool {
        matches!(self.placement, BufferPlacement::Ring { .. })
    }
}

// ============================================================================
// Facade Trait
// ============================================================================

/// Device-context operations consumed by the lighting binders
///
/// All calls happen on the render thread that owns the device context.
pub trait RendererFacade {
    /// Bind a texture (or nothing) to a pixel shader resource slot
    fn set_shader_resource(&mut self, slot: u32, texture: Option<TextureHandle>);

    fn set_texture_address_mode(&mut self, slot: u32, mode: AddressMode);

    fn set_texture_filter_mode(&mut self, slot: u32, mode: FilterMode);

    /// Set address and filter mode of a slot in one call
    fn set_texture_mode(&mut self, slot: u32, address: AddressMode, filter: FilterMode);

    /// Map the constant buffer for one tier of a shader
    fn get_shader_constant_group<'s, S: ShaderStage>(
        &mut self,
        shader: &'s ShaderInstance<S>,
        level: ConstantGroupLevel,
    ) -> ConstantGroup<'s, S>;

    /// Make the CPU-side writes of a group visible to the device
    fn flush_constant_group<S: ShaderStage>(&mut self, group: &ConstantGroup<'_, S>);

    /// Bind a flushed vertex/pixel group pair for a tier
    fn apply_constant_group_vsps(
        &mut self,
        vertex: &ConstantGroup<'_, Vertex>,
        pixel: &ConstantGroup<'_, Pixel>,
        level: ConstantGroupLevel,
    );

    fn set_depth_mode(&mut self, mode: DepthMode);

    /// Depth mode currently set on the device
    fn current_depth_mode(&self) -> DepthMode;

    fn set_stencil_mode(&mut self, mode: StencilMode, reference: u32);

    fn set_alpha_blend_mode(&mut self, mode: BlendMode);

    /// Alpha blend mode currently set on the device
    fn current_alpha_blend_mode(&self) -> BlendMode;
}
