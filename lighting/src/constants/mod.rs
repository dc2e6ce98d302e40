//! Constant buffer groups
//!
//! A [`ConstantGroup`] is the mapped constant buffer of one tier of one shader
//! instance. Parameters are addressed by typed, permutation-relative slots
//! ([`Param`]); the shader's offset table resolves each slot to a word offset
//! at write time. Slots the permutation does not use, offsets outside the
//! mapped buffer, and unmapped buffers all resolve into a per-group scratch
//! sink so call sites can write unconditionally.

pub mod params;


use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::Pod;

use crate::facade::{BufferPlacement, ConstantBuffer};
use crate::shader::{ShaderInstance, ShaderStage};

pub use params::*;

// ============================================================================
// Levels and Offsets
// ============================================================================

/// Granularity at which a constant buffer is rebound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ConstantGroupLevel {
    /// Rebound per technique change
    Technique = 0,
    /// Rebound per material change
    Material = 1,
    /// Rebound per draw
    Geometry = 2,
    /// Instanced geometry (grass, trees)
    Instance = 8,
    PreviousBones = 9,
    Bones = 10,
    AlphaTestRef = 11,
    PerFrame = 12,
}

impl ConstantGroupLevel {
    /// Number of tiers with a buffer per shader instance
    pub const TIER_COUNT: usize = 3;

    /// The tiers owned by shader instances, in binding order
    pub const TIERS: [ConstantGroupLevel; Self::TIER_COUNT] = [
        ConstantGroupLevel::Technique,
        ConstantGroupLevel::Material,
        ConstantGroupLevel::Geometry,
    ];

    /// Index into a shader's per-tier buffers
    pub fn tier_index(self) -> Option<usize> {
        match self {
            ConstantGroupLevel::Technique => Some(0),
            ConstantGroupLevel::Material => Some(1),
            ConstantGroupLevel::Geometry => Some(2),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ConstantGroupLevel::Technique => "technique",
            ConstantGroupLevel::Material => "material",
            ConstantGroupLevel::Geometry => "geometry",
            ConstantGroupLevel::Instance => "instance",
            ConstantGroupLevel::PreviousBones => "previous-bones",
            ConstantGroupLevel::Bones => "bones",
            ConstantGroupLevel::AlphaTestRef => "alpha-test-ref",
            ConstantGroupLevel::PerFrame => "per-frame",
        }
    }
}

impl fmt::Display for ConstantGroupLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved location of a constant slot in a shader's buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantOffset {
    /// Offset in 4-byte words
    Word(u8),
    /// The permutation does not read this slot
    Unused,
}

impl ConstantOffset {
    /// Raw offset table value meaning "unused"
    pub const UNUSED_RAW: u8 = 0xFF;

    pub fn from_raw(raw: u8) -> Self {
        if raw == Self::UNUSED_RAW {
            ConstantOffset::Unused
        } else {
            ConstantOffset::Word(raw)
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            ConstantOffset::Word(offset) => offset,
            ConstantOffset::Unused => Self::UNUSED_RAW,
        }
    }
}

// ============================================================================
// Typed Slots
// ============================================================================

/// Scratch sink capacity in bytes
pub const SCRATCH_BYTES: usize = 1024;
const SCRATCH_WORDS: usize = SCRATCH_BYTES / 4;

/// A typed, stage-bound constant slot
///
/// Construction is `const` and fails to compile for slots beyond the stage's
/// constant count.
pub struct Param<S: ShaderStage, T> {
    index: u8,
    _marker: PhantomData<fn() -> (S, T)>,
}

impl<S: ShaderStage, T> Param<S, T> {
    pub const fn new(index: u8) -> Self {
        assert!((index as usize) < S::MAX_CONSTANTS, "constant slot out of range for stage");
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub const fn index(self) -> usize {
        self.index as usize
    }
}

impl<S: ShaderStage, T> Clone for Param<S, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ShaderStage, T> Copy for Param<S, T> {}

impl<S: ShaderStage, T> fmt::Debug for Param<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", S::KIND, self.index)
    }
}

/// Word count of a constant value, checked against the scratch sink at compile time
fn words_of<T: Pod>() -> usize {
    const {
        assert!(size_of::<T>() <= SCRATCH_BYTES, "constant type exceeds scratch capacity");
        assert!(align_of::<T>() <= 4, "constant type must be at most 4-byte aligned");
        assert!(size_of::<T>() % 4 == 0, "constant type must be whole words");
    }
    size_of::<T>() / 4
}

// ============================================================================
// Constant Group
// ============================================================================

/// Mapped constant buffer for one tier of one shader instance
pub struct ConstantGroup<'s, S: ShaderStage> {
    shader: &'s ShaderInstance<S>,
    level: ConstantGroupLevel,
    buffer: ConstantBuffer,
    scratch: [u32; SCRATCH_WORDS],
}

impl<'s, S: ShaderStage> ConstantGroup<'s, S> {
    pub fn new(shader: &'s ShaderInstance<S>, level: ConstantGroupLevel, buffer: ConstantBuffer) -> Self {
        Self {
            shader,
            level,
            buffer,
            scratch: [0; SCRATCH_WORDS],
        }
    }

    pub fn shader(&self) -> &'s ShaderInstance<S> {
        self.shader
    }

    pub fn level(&self) -> ConstantGroupLevel {
        self.level
    }

    pub fn buffer(&self) -> &ConstantBuffer {
        &self.buffer
    }

    pub fn placement(&self) -> BufferPlacement {
        self.buffer.placement
    }

    /// Mapped buffer contents, `None` when unmapped
    pub fn data(&self) -> Option<&[u32]> {
        self.buffer.data.as_deref()
    }

    pub fn into_buffer(self) -> ConstantBuffer {
        self.buffer
    }

    /// Resolve a slot to a mutable reference
    ///
    /// Unused slots, offsets past the end of the mapped buffer and unmapped
    /// buffers all resolve into the scratch sink. Values written there are
    /// never read back.
    pub fn param_mut<T: Pod>(&mut self, param: Param<S, T>) -> &mut T {
        let words = words_of::<T>();

        let target: &mut [u32] = match (self.shader.offset(param.index()), self.buffer.data.as_mut()) {
            (ConstantOffset::Word(offset), Some(data))
                if usize::from(offset) + words <= data.len() =>
            {
                let start = usize::from(offset);
                &mut data[start..start + words]
            }
            (ConstantOffset::Word(offset), Some(data)) => {
                tracing::debug!(
                    stage = %S::KIND,
                    level = %self.level,
                    slot = param.index(),
                    offset,
                    buffer_words = data.len(),
                    "constant write past end of buffer, absorbed into scratch"
                );
                &mut self.scratch[..words]
            }
            (ConstantOffset::Word(_), None) | (ConstantOffset::Unused, _) => {
                tracing::trace!(stage = %S::KIND, slot = param.index(), "constant write absorbed into scratch");
                &mut self.scratch[..words]
            }
        };

        bytemuck::from_bytes_mut(bytemuck::cast_slice_mut::<u32, u8>(target))
    }

    /// Overwrite a whole slot
    pub fn set<T: Pod>(&mut self, param: Param<S, T>, value: T) {
        *self.param_mut(param) = value;
    }

    /// Read a slot back from the mapped buffer, `None` if it does not resolve into it
    pub fn get<T: Pod>(&self, param: Param<S, T>) -> Option<T> {
        read_param(self.shader, self.data()?, param)
    }
}

impl<S: ShaderStage> fmt::Debug for ConstantGroup<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstantGroup")
            .field("stage", &S::KIND)
            .field("technique", &self.shader.technique_id())
            .field("level", &self.level)
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// Read a slot out of a buffer laid out for `shader`
pub fn read_param<S: ShaderStage, T: Pod>(shader: &ShaderInstance<S>, data: &[u32], param: Param<S, T>) -> Option<T> {
    let words = words_of::<T>();
    match shader.offset(param.index()) {
        ConstantOffset::Word(offset) => {
            let start = usize::from(offset);
            let slice = data.get(start..start + words)?;
            Some(bytemuck::pod_read_unaligned(bytemuck::cast_slice::<u32, u8>(slice)))
        }
        ConstantOffset::Unused => None,
    }
}
