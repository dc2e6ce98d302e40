//! Compiled shader instances
//!
//! A [`ShaderInstance`] is one compiled permutation for one pipeline stage. It
//! carries the per-tier constant buffer layout and the slot offset table that
//! maps logical constant slots to word offsets inside those buffers. The table
//! is fixed at load time.

use std::fmt;
use std::hash::Hash;

use technique_common::{PixelTechniqueId, VertexTechniqueId};

use crate::constants::{ConstantGroupLevel, ConstantOffset};
use crate::error::ShaderError;
use crate::facade::BufferHandle;

/// Maximum constant slots addressable by a vertex shader
pub const MAX_VS_CONSTANTS: usize = 20;
/// Maximum constant slots addressable by a pixel shader
pub const MAX_PS_CONSTANTS: usize = 64;
/// Maximum constant slots addressable by a compute shader
pub const MAX_CS_CONSTANTS: usize = 32;

/// Pipeline stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Pixel,
    Compute,
}

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex",
            StageKind::Pixel => "pixel",
            StageKind::Compute => "compute",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compile-time pipeline stage marker
pub trait ShaderStage: 'static {
    const KIND: StageKind;
    /// Number of entries in the stage's offset table
    const MAX_CONSTANTS: usize;
    /// Technique id type that selects permutations of this stage
    type TechniqueId: Copy + Eq + Hash + fmt::Debug + fmt::Display;
}

/// Vertex stage marker
#[derive(Debug)]
pub enum Vertex {}

/// Pixel stage marker
#[derive(Debug)]
pub enum Pixel {}

/// Compute stage marker
#[derive(Debug)]
pub enum Compute {}

impl ShaderStage for Vertex {
    const KIND: StageKind = StageKind::Vertex;
    const MAX_CONSTANTS: usize = MAX_VS_CONSTANTS;
    type TechniqueId = VertexTechniqueId;
}

impl ShaderStage for Pixel {
    const KIND: StageKind = StageKind::Pixel;
    const MAX_CONSTANTS: usize = MAX_PS_CONSTANTS;
    type TechniqueId = PixelTechniqueId;
}

/// Technique id of a compute permutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ComputeTechniqueId(pub u32);

impl fmt::Display for ComputeTechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

impl ShaderStage for Compute {
    const KIND: StageKind = StageKind::Compute;
    const MAX_CONSTANTS: usize = MAX_CS_CONSTANTS;
    type TechniqueId = ComputeTechniqueId;
}

/// Device handle of a compiled shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderHandle(pub u32);

/// Device constant buffer backing one tier of a shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferLayout {
    pub handle: BufferHandle,
    /// Size in 4-byte words, 0 if the shader has no constants in this tier
    pub size_words: u32,
}

impl BufferLayout {
    pub const EMPTY: BufferLayout = BufferLayout {
        handle: BufferHandle(0),
        size_words: 0,
    };

    pub fn new(handle: BufferHandle, size_words: u32) -> Self {
        Self { handle, size_words }
    }
}

/// One compiled shader permutation
#[derive(Debug)]
pub struct ShaderInstance<S: ShaderStage> {
    technique_id: S::TechniqueId,
    handle: ShaderHandle,
    bytecode: Vec<u8>,
    layouts: [BufferLayout; ConstantGroupLevel::TIER_COUNT],
    offsets: Box<[ConstantOffset]>,
}

impl<S: ShaderStage> ShaderInstance<S> {
    /// Build an instance from a raw offset table (one byte per slot, 0xFF = unused)
    ///
    /// # Errors
    ///
    /// Returns an error if the table length differs from the stage's constant
    /// count or an offset lies outside every tier buffer.
    pub fn new(
        technique_id: S::TechniqueId,
        handle: ShaderHandle,
        bytecode: Vec<u8>,
        layouts: [BufferLayout; ConstantGroupLevel::TIER_COUNT],
        raw_offsets: &[u8],
    ) -> Result<Self, ShaderError> {
        if raw_offsets.len() != S::MAX_CONSTANTS {
            return Err(ShaderError::OffsetTableLength {
                stage: S::KIND.name(),
                expected: S::MAX_CONSTANTS,
                actual: raw_offsets.len(),
            });
        }

        let limit = layouts.iter().map(|l| l.size_words).max().unwrap_or(0);
        let offsets = raw_offsets
            .iter()
            .enumerate()
            .map(|(slot, &raw)| match ConstantOffset::from_raw(raw) {
                ConstantOffset::Word(offset) if u32::from(offset) >= limit => {
                    Err(ShaderError::OffsetOutOfRange { slot, offset, limit })
                }
                resolved => Ok(resolved),
            })
            .collect::<Result<Box<[_]>, _>>()?;

        Ok(Self {
            technique_id,
            handle,
            bytecode,
            layouts,
            offsets,
        })
    }

    /// Build an instance from `(slot, word offset)` pairs; every other slot is unused
    ///
    /// # Errors
    ///
    /// Same conditions as [`ShaderInstance::new`], plus a slot at or beyond the
    /// stage's constant count.
    pub fn from_slots(
        technique_id: S::TechniqueId,
        handle: ShaderHandle,
        layouts: [BufferLayout; ConstantGroupLevel::TIER_COUNT],
        slots: &[(usize, u8)],
    ) -> Result<Self, ShaderError> {
        let mut raw = vec![ConstantOffset::UNUSED_RAW; S::MAX_CONSTANTS];
        for &(slot, offset) in slots {
            let entry = raw.get_mut(slot).ok_or(ShaderError::SlotOutOfRange {
                stage: S::KIND.name(),
                slot,
                max: S::MAX_CONSTANTS,
            })?;
            *entry = offset;
        }
        Self::new(technique_id, handle, Vec::new(), layouts, &raw)
    }

    pub fn technique_id(&self) -> S::TechniqueId {
        self.technique_id
    }

    pub fn handle(&self) -> ShaderHandle {
        self.handle
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    /// Buffer layout of a tier, `None` for levels without per-shader buffers
    pub fn layout(&self, level: ConstantGroupLevel) -> Option<BufferLayout> {
        level.tier_index().map(|i| self.layouts[i])
    }

    /// Resolved offset of a slot
    pub fn offset(&self, slot: usize) -> ConstantOffset {
        self.offsets.get(slot).copied().unwrap_or(ConstantOffset::Unused)
    }

    pub fn offsets(&self) -> &[ConstantOffset] {
        &self.offsets
    }
}
