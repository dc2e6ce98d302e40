//! Recording renderer
//!
//! A [`RendererFacade`] that executes nothing. Every call is appended to a
//! command list and the device state it would change is tracked, so tests and
//! tools can inspect bindings and read back flushed constants by slot.

use std::fmt;

use bytemuck::Pod;
use hashbrown::HashMap;

use crate::constants::{ConstantGroup, ConstantGroupLevel, Param, read_param};
use crate::facade::{
    AddressMode, BlendMode, BufferPlacement, ConstantBuffer, DepthMode, FilterMode, RendererFacade, StencilMode,
    TEXTURE_SLOT_COUNT, TextureHandle,
};
use crate::shader::{Pixel, ShaderHandle, ShaderInstance, ShaderStage, StageKind, Vertex};

/// Default capacity of the simulated ring buffer
pub const RING_CAPACITY_BYTES: u32 = 64 * 1024;
/// Ring allocations are aligned to this many bytes
pub const RING_ALIGNMENT: u32 = 256;

const SLOTS: usize = TEXTURE_SLOT_COUNT as usize;

/// One recorded facade call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    SetShaderResource {
        slot: u32,
        texture: Option<TextureHandle>,
    },
    SetTextureAddressMode {
        slot: u32,
        mode: AddressMode,
    },
    SetTextureFilterMode {
        slot: u32,
        mode: FilterMode,
    },
    SetTextureMode {
        slot: u32,
        address: AddressMode,
        filter: FilterMode,
    },
    MapConstantGroup {
        stage: StageKind,
        shader: ShaderHandle,
        level: ConstantGroupLevel,
        placement: BufferPlacement,
    },
    FlushConstantGroup {
        stage: StageKind,
        shader: ShaderHandle,
        level: ConstantGroupLevel,
    },
    ApplyConstantGroups {
        vertex: ShaderHandle,
        pixel: ShaderHandle,
        level: ConstantGroupLevel,
    },
    SetDepthMode(DepthMode),
    SetStencilMode {
        mode: StencilMode,
        reference: u32,
    },
    SetAlphaBlendMode(BlendMode),
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderCommand::SetShaderResource { slot, texture: Some(t) } => write!(f, "texture   [{slot:2}] = #{}", t.0),
            RenderCommand::SetShaderResource { slot, texture: None } => write!(f, "texture   [{slot:2}] = null"),
            RenderCommand::SetTextureAddressMode { slot, mode } => write!(f, "address   [{slot:2}] = {}", mode.0),
            RenderCommand::SetTextureFilterMode { slot, mode } => write!(f, "filter    [{slot:2}] = {}", mode.0),
            RenderCommand::SetTextureMode { slot, address, filter } => {
                write!(f, "mode      [{slot:2}] = address {}, filter {}", address.0, filter.0)
            }
            RenderCommand::MapConstantGroup {
                stage,
                shader,
                level,
                placement,
            } => match placement {
                BufferPlacement::Dedicated => write!(f, "map       {stage} #{} {level}", shader.0),
                BufferPlacement::Ring { byte_offset } => {
                    write!(f, "map       {stage} #{} {level} (ring +{byte_offset})", shader.0)
                }
            },
            RenderCommand::FlushConstantGroup { stage, shader, level } => write!(f, "flush     {stage} #{} {level}", shader.0),
            RenderCommand::ApplyConstantGroups { vertex, pixel, level } => {
                write!(f, "apply     vs #{} ps #{} {level}", vertex.0, pixel.0)
            }
            RenderCommand::SetDepthMode(mode) => write!(f, "depth     {}", mode.0),
            RenderCommand::SetStencilMode { mode, reference } => write!(f, "stencil   {} ref {reference}", mode.0),
            RenderCommand::SetAlphaBlendMode(mode) => write!(f, "blend     {}", mode.0),
        }
    }
}

/// Key of a flushed buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FlushKey {
    stage: StageKind,
    shader: ShaderHandle,
    level: ConstantGroupLevel,
}

/// Monotonic, wrapping ring allocator for small constant buffers
#[derive(Debug, Clone)]
struct RingAllocator {
    capacity: u32,
    cursor: u32,
    /// Buffers of at most this many words come from the ring; 0 disables it
    threshold_words: u32,
}

impl RingAllocator {
    fn allocate(&mut self, size_words: u32) -> Option<u32> {
        if self.threshold_words == 0 || size_words > self.threshold_words {
            return None;
        }
        let size = (size_words * 4).next_multiple_of(RING_ALIGNMENT);
        if self.cursor + size > self.capacity {
            tracing::trace!(cursor = self.cursor, "constant ring wrapped");
            self.cursor = 0;
        }
        let offset = self.cursor;
        self.cursor += size;
        Some(offset)
    }
}

/// Facade implementation that records instead of rendering
#[derive(Debug, Clone)]
pub struct RecordingRenderer {
    commands: Vec<RenderCommand>,
    textures: [Option<TextureHandle>; SLOTS],
    address_modes: [AddressMode; SLOTS],
    filter_modes: [FilterMode; SLOTS],
    depth_mode: DepthMode,
    blend_mode: BlendMode,
    stencil: (StencilMode, u32),
    flushed: HashMap<FlushKey, Vec<u32>>,
    ring: RingAllocator,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            textures: [None; SLOTS],
            address_modes: [AddressMode::WRAP; SLOTS],
            filter_modes: [FilterMode::BILINEAR; SLOTS],
            depth_mode: DepthMode::default(),
            blend_mode: BlendMode::DISABLED,
            stencil: (StencilMode::DISABLED, 0xFF),
            flushed: HashMap::new(),
            ring: RingAllocator {
                capacity: RING_CAPACITY_BYTES,
                cursor: 0,
                threshold_words: 0,
            },
        }
    }

    /// Serve buffers of at most `threshold_words` words from the shared ring
    pub fn with_ring(mut self, threshold_words: u32) -> Self {
        self.ring.threshold_words = threshold_words;
        self
    }

    /// Start from a specific depth mode
    pub fn with_depth_mode(mut self, mode: DepthMode) -> Self {
        self.depth_mode = mode;
        self
    }

    /// Start from a specific blend mode
    pub fn with_blend_mode(mut self, mode: BlendMode) -> Self {
        self.blend_mode = mode;
        self
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Drop recorded commands, keeping device state and flushed buffers
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Texture currently bound to `slot`
    pub fn bound_texture(&self, slot: u32) -> Option<TextureHandle> {
        self.textures.get(slot as usize).copied().flatten()
    }

    pub fn address_mode(&self, slot: u32) -> Option<AddressMode> {
        self.address_modes.get(slot as usize).copied()
    }

    pub fn filter_mode(&self, slot: u32) -> Option<FilterMode> {
        self.filter_modes.get(slot as usize).copied()
    }

    /// Current stencil mode and reference
    pub fn stencil(&self) -> (StencilMode, u32) {
        self.stencil
    }

    /// Words of the last flush of `shader`'s buffer at `level`
    pub fn flushed_words<S: ShaderStage>(&self, shader: &ShaderInstance<S>, level: ConstantGroupLevel) -> Option<&[u32]> {
        let key = FlushKey {
            stage: S::KIND,
            shader: shader.handle(),
            level,
        };
        self.flushed.get(&key).map(Vec::as_slice)
    }

    /// Read a slot from the last flush of `shader`'s buffer at `level`
    pub fn flushed_param<S: ShaderStage, T: Pod>(
        &self,
        shader: &ShaderInstance<S>,
        level: ConstantGroupLevel,
        param: Param<S, T>,
    ) -> Option<T> {
        read_param(shader, self.flushed_words(shader, level)?, param)
    }

    /// Number of recorded commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&RenderCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| predicate(c)).count()
    }

    fn record(&mut self, command: RenderCommand) {
        tracing::trace!(%command, "facade call");
        self.commands.push(command);
    }
}

impl RendererFacade for RecordingRenderer {
    fn set_shader_resource(&mut self, slot: u32, texture: Option<TextureHandle>) {
        if let Some(bound) = self.textures.get_mut(slot as usize) {
            *bound = texture;
        }
        self.record(RenderCommand::SetShaderResource { slot, texture });
    }

    fn set_texture_address_mode(&mut self, slot: u32, mode: AddressMode) {
        if let Some(current) = self.address_modes.get_mut(slot as usize) {
            *current = mode;
        }
        self.record(RenderCommand::SetTextureAddressMode { slot, mode });
    }

    fn set_texture_filter_mode(&mut self, slot: u32, mode: FilterMode) {
        if let Some(current) = self.filter_modes.get_mut(slot as usize) {
            *current = mode;
        }
        self.record(RenderCommand::SetTextureFilterMode { slot, mode });
    }

    fn set_texture_mode(&mut self, slot: u32, address: AddressMode, filter: FilterMode) {
        let index = slot as usize;
        if index < SLOTS {
            self.address_modes[index] = address;
            self.filter_modes[index] = filter;
        }
        self.record(RenderCommand::SetTextureMode { slot, address, filter });
    }

    fn get_shader_constant_group<'s, S: ShaderStage>(
        &mut self,
        shader: &'s ShaderInstance<S>,
        level: ConstantGroupLevel,
    ) -> ConstantGroup<'s, S> {
        let buffer = match shader.layout(level) {
            Some(layout) if layout.size_words > 0 => {
                let placement = match self.ring.allocate(layout.size_words) {
                    Some(byte_offset) => BufferPlacement::Ring { byte_offset },
                    None => BufferPlacement::Dedicated,
                };
                ConstantBuffer::mapped(layout.handle, layout.size_words as usize, placement)
            }
            Some(layout) => ConstantBuffer::unmapped(layout.handle),
            None => ConstantBuffer::unmapped(Default::default()),
        };

        self.record(RenderCommand::MapConstantGroup {
            stage: S::KIND,
            shader: shader.handle(),
            level,
            placement: buffer.placement,
        });
        ConstantGroup::new(shader, level, buffer)
    }

    fn flush_constant_group<S: ShaderStage>(&mut self, group: &ConstantGroup<'_, S>) {
        let key = FlushKey {
            stage: S::KIND,
            shader: group.shader().handle(),
            level: group.level(),
        };
        match group.data() {
            Some(data) => {
                self.flushed.insert(key, data.to_vec());
            }
            None => {
                self.flushed.remove(&key);
            }
        }
        self.record(RenderCommand::FlushConstantGroup {
            stage: key.stage,
            shader: key.shader,
            level: key.level,
        });
    }

    fn apply_constant_group_vsps(
        &mut self,
        vertex: &ConstantGroup<'_, Vertex>,
        pixel: &ConstantGroup<'_, Pixel>,
        level: ConstantGroupLevel,
    ) {
        self.record(RenderCommand::ApplyConstantGroups {
            vertex: vertex.shader().handle(),
            pixel: pixel.shader().handle(),
            level,
        });
    }

    fn set_depth_mode(&mut self, mode: DepthMode) {
        self.depth_mode = mode;
        self.record(RenderCommand::SetDepthMode(mode));
    }

    fn current_depth_mode(&self) -> DepthMode {
        self.depth_mode
    }

    fn set_stencil_mode(&mut self, mode: StencilMode, reference: u32) {
        self.stencil = (mode, reference);
        self.record(RenderCommand::SetStencilMode { mode, reference });
    }

    fn set_alpha_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
        self.record(RenderCommand::SetAlphaBlendMode(mode));
    }

    fn current_alpha_blend_mode(&self) -> BlendMode {
        self.blend_mode
    }
}
