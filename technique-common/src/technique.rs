//! Technique identifiers
//!
//! A technique id is a 32-bit value packing a base technique index (bits 24-29)
//! with independent feature flags in the low 24 bits. Bits 30-31 are never
//! interpreted and are carried through every projection untouched.
//!
//! Three projections of the same bitmask exist:
//! - [`RawTechniqueId`]: full behavior selection for the binders
//! - [`VertexTechniqueId`]: selects the compiled vertex shader permutation
//! - [`PixelTechniqueId`]: selects the compiled pixel shader permutation
//!
//! Distinct raw ids may share a vertex or pixel id. That is how compiled
//! permutations are deduplicated.

use std::fmt;

// ============================================================================
// Bit Layout
// ============================================================================

/// Bit position of the base technique index
pub const BASE_TECHNIQUE_SHIFT: u32 = 24;

/// Mask covering the 6-bit base technique index
pub const BASE_TECHNIQUE_MASK: u32 = 0x3F << BASE_TECHNIQUE_SHIFT;

/// Bit position of the 3-bit light count
pub const LIGHT_COUNT_SHIFT: u32 = 3;

/// Bit position of the 3-bit shadow light count
pub const SHADOW_LIGHT_COUNT_SHIFT: u32 = 6;

const COUNT_MASK: u32 = 0x7;

bitflags::bitflags! {
    /// Feature flags stored in the low 24 bits of a technique id
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TechniqueFlags: u32 {
        /// Per-vertex colors
        const VC = 1 << 0;
        /// Skinned geometry (bones)
        const SKINNED = 1 << 1;
        /// Normal map is in model space
        const MODELSPACENORMALS = 1 << 2;
        /// Light count, bit 0
        const LIGHT_COUNT_BIT0 = 1 << 3;
        /// Light count, bit 1
        const LIGHT_COUNT_BIT1 = 1 << 4;
        /// Light count, bit 2
        const LIGHT_COUNT_BIT2 = 1 << 5;
        /// Shadow light count, bit 0
        const SHADOW_LIGHT_COUNT_BIT0 = 1 << 6;
        /// Shadow light count, bit 1
        const SHADOW_LIGHT_COUNT_BIT1 = 1 << 7;
        /// Shadow light count, bit 2
        const SHADOW_LIGHT_COUNT_BIT2 = 1 << 8;
        const SPECULAR = 1 << 9;
        const SOFT_LIGHTING = 1 << 10;
        const RIM_LIGHTING = 1 << 11;
        const BACK_LIGHTING = 1 << 12;
        /// Directional light casts shadows
        const SHADOW_DIR = 1 << 13;
        /// Deferred shadow mask is sampled
        const DEFSHADOW = 1 << 14;
        /// Projected decal UVs (snow/moss on top faces)
        const PROJECTED_UV = 1 << 15;
        const ANISO_LIGHTING = 1 << 16;
        const AMBIENT_SPECULAR = 1 << 17;
        /// World map overlay colors and textures
        const WORLD_MAP = 1 << 18;
        const BASE_OBJECT_IS_SNOW = 1 << 19;
        const DO_ALPHA_TEST = 1 << 20;
        const SNOW = 1 << 21;
        const CHARACTER_LIGHT = 1 << 22;
        const ADDITIONAL_ALPHA_MASK = 1 << 23;

        /// All three light count bits
        const LIGHT_COUNT_BITS = Self::LIGHT_COUNT_BIT0.bits()
            | Self::LIGHT_COUNT_BIT1.bits()
            | Self::LIGHT_COUNT_BIT2.bits();
        /// All three shadow light count bits
        const SHADOW_LIGHT_COUNT_BITS = Self::SHADOW_LIGHT_COUNT_BIT0.bits()
            | Self::SHADOW_LIGHT_COUNT_BIT1.bits()
            | Self::SHADOW_LIGHT_COUNT_BIT2.bits();
    }
}

impl TechniqueFlags {
    /// Flags that select vertex shader behavior directly
    pub const VERTEX_STAGE: Self = Self::VC
        .union(Self::SKINNED)
        .union(Self::MODELSPACENORMALS)
        .union(Self::PROJECTED_UV)
        .union(Self::WORLD_MAP);

    /// Flags that the vertex projection folds into [`TechniqueFlags::SPECULAR`]
    pub const VERTEX_SPECULAR_FOLD: Self = Self::SPECULAR
        .union(Self::RIM_LIGHTING)
        .union(Self::AMBIENT_SPECULAR);

    /// Bits the pixel projection strips (light and shadow light counts)
    pub const PIXEL_STRIPPED: Self = Self::LIGHT_COUNT_BITS.union(Self::SHADOW_LIGHT_COUNT_BITS);

    /// Shadow-light-count bits that, like SHADOW_DIR, mark a shadowed draw
    pub const SHADOWED: Self = Self::SHADOW_DIR.union(Self::SHADOW_LIGHT_COUNT_BITS);

    /// Flags that need the precipitation occlusion position
    pub const PRECIPITATION_OCCLUSION: Self = Self::SOFT_LIGHTING
        .union(Self::RIM_LIGHTING)
        .union(Self::BACK_LIGHTING)
        .union(Self::AMBIENT_SPECULAR);
}

// ============================================================================
// Base Techniques
// ============================================================================

/// Base technique stored in bits 24-29 of a technique id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseTechnique {
    None = 0,
    Envmap = 1,
    Glowmap = 2,
    Parallax = 3,
    FaceGen = 4,
    FaceGenRgbTint = 5,
    Hair = 6,
    ParallaxOcc = 7,
    MtLand = 8,
    LodLand = 9,
    Snow = 10,
    MultiLayerParallax = 11,
    Tree = 12,
    LodObj = 13,
    MultiIndexTriShapeSnow = 14,
    LodObjHd = 15,
    Eye = 16,
    Cloud = 17,
    LodLandNoise = 18,
    MtLandLodBlend = 19,
}

impl BaseTechnique {
    /// Every known base technique, in index order
    pub const ALL: [BaseTechnique; 20] = [
        BaseTechnique::None,
        BaseTechnique::Envmap,
        BaseTechnique::Glowmap,
        BaseTechnique::Parallax,
        BaseTechnique::FaceGen,
        BaseTechnique::FaceGenRgbTint,
        BaseTechnique::Hair,
        BaseTechnique::ParallaxOcc,
        BaseTechnique::MtLand,
        BaseTechnique::LodLand,
        BaseTechnique::Snow,
        BaseTechnique::MultiLayerParallax,
        BaseTechnique::Tree,
        BaseTechnique::LodObj,
        BaseTechnique::MultiIndexTriShapeSnow,
        BaseTechnique::LodObjHd,
        BaseTechnique::Eye,
        BaseTechnique::Cloud,
        BaseTechnique::LodLandNoise,
        BaseTechnique::MtLandLodBlend,
    ];

    /// Look up a base technique by its 6-bit index
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Upper-case name as used in shader permutation listings
    pub fn name(self) -> &'static str {
        match self {
            BaseTechnique::None => "NONE",
            BaseTechnique::Envmap => "ENVMAP",
            BaseTechnique::Glowmap => "GLOWMAP",
            BaseTechnique::Parallax => "PARALLAX",
            BaseTechnique::FaceGen => "FACEGEN",
            BaseTechnique::FaceGenRgbTint => "FACEGENRGBTINT",
            BaseTechnique::Hair => "HAIR",
            BaseTechnique::ParallaxOcc => "PARALLAXOCC",
            BaseTechnique::MtLand => "MTLAND",
            BaseTechnique::LodLand => "LODLAND",
            BaseTechnique::Snow => "SNOW",
            BaseTechnique::MultiLayerParallax => "MULTILAYERPARALLAX",
            BaseTechnique::Tree => "TREE",
            BaseTechnique::LodObj => "LODOBJ",
            BaseTechnique::MultiIndexTriShapeSnow => "MULTIINDEXTRISHAPESNOW",
            BaseTechnique::LodObjHd => "LODOBJHD",
            BaseTechnique::Eye => "EYE",
            BaseTechnique::Cloud => "CLOUD",
            BaseTechnique::LodLandNoise => "LODLANDNOISE",
            BaseTechnique::MtLandLodBlend => "MTLANDLODBLEND",
        }
    }

    /// Base technique bits positioned for OR-ing into a technique id
    pub const fn encoded(self) -> u32 {
        (self as u32) << BASE_TECHNIQUE_SHIFT
    }
}

impl fmt::Display for BaseTechnique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Technique Ids
// ============================================================================

/// Full technique id selecting binder behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawTechniqueId(pub u32);

impl RawTechniqueId {
    /// Compose a raw id from a base technique and feature flags
    pub const fn compose(base: BaseTechnique, flags: TechniqueFlags) -> Self {
        Self(base.encoded() | flags.bits())
    }

    /// Compose a raw id with explicit light and shadow light counts (each 0-7)
    pub fn with_light_counts(self, lights: u32, shadow_lights: u32) -> Self {
        let cleared = self.0 & !TechniqueFlags::PIXEL_STRIPPED.bits();
        Self(
            cleared
                | ((lights & COUNT_MASK) << LIGHT_COUNT_SHIFT)
                | ((shadow_lights & COUNT_MASK) << SHADOW_LIGHT_COUNT_SHIFT),
        )
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Raw 6-bit base technique index
    pub const fn base_index(self) -> u8 {
        ((self.0 & BASE_TECHNIQUE_MASK) >> BASE_TECHNIQUE_SHIFT) as u8
    }

    /// Decoded base technique, `None` for indices without a named technique
    pub fn base(self) -> Option<BaseTechnique> {
        BaseTechnique::from_index(self.base_index())
    }

    /// Feature flags (low 24 bits)
    pub const fn flags(self) -> TechniqueFlags {
        TechniqueFlags::from_bits_truncate(self.0)
    }

    /// True if any of `flags` is set
    pub const fn any(self, flags: TechniqueFlags) -> bool {
        self.0 & flags.bits() != 0
    }

    pub const fn light_count(self) -> u32 {
        (self.0 >> LIGHT_COUNT_SHIFT) & COUNT_MASK
    }

    pub const fn shadow_light_count(self) -> u32 {
        (self.0 >> SHADOW_LIGHT_COUNT_SHIFT) & COUNT_MASK
    }
}

impl fmt::Display for RawTechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

/// Technique id selecting a compiled vertex shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexTechniqueId(pub u32);

impl VertexTechniqueId {
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn base_index(self) -> u8 {
        ((self.0 & BASE_TECHNIQUE_MASK) >> BASE_TECHNIQUE_SHIFT) as u8
    }

    pub const fn flags(self) -> TechniqueFlags {
        TechniqueFlags::from_bits_truncate(self.0)
    }
}

impl fmt::Display for VertexTechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}

/// Technique id selecting a compiled pixel shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelTechniqueId(pub u32);

impl PixelTechniqueId {
    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn base_index(self) -> u8 {
        ((self.0 & BASE_TECHNIQUE_MASK) >> BASE_TECHNIQUE_SHIFT) as u8
    }

    pub const fn flags(self) -> TechniqueFlags {
        TechniqueFlags::from_bits_truncate(self.0)
    }
}

impl fmt::Display for PixelTechniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010X}", self.0)
    }
}
