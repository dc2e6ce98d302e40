//! Technique codec
//!
//! Pure mapping from an externally requested technique to its raw id and the
//! vertex/pixel projections used to select compiled shader permutations.

use serde::{Deserialize, Serialize};

use crate::technique::{
    BASE_TECHNIQUE_MASK, BaseTechnique, PixelTechniqueId, RawTechniqueId, TechniqueFlags,
    VertexTechniqueId,
};

/// Encoding base subtracted from every requested technique
pub const REQUEST_BASE: u32 = 0x4800_002D;

/// Clears the noise bit of LODLANDNOISE (base 18 -> base 9) and forces bits 24 and 27
const LOD_LAND_NOISE_DOWNGRADE_MASK: u32 = 0xC9FF_FFFF;
const LOD_LAND_NOISE_DOWNGRADE_SET: u32 = 0x0900_0000;

/// Global feature toggles layered on top of the raw id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KillSwitches {
    /// Render LODLANDNOISE as plain LODLAND
    #[serde(default)]
    pub disable_lod_land_noise: bool,
    /// Render PARALLAXOCC with no base technique
    #[serde(default)]
    pub disable_parallax_occlusion: bool,
}

/// Decode a requested technique into its raw id
///
/// The two kill switches are independent; at most one can match since they
/// key on different base techniques.
pub fn to_raw_technique(requested: u32, switches: KillSwitches) -> RawTechniqueId {
    let raw = requested.wrapping_sub(REQUEST_BASE);
    let base = RawTechniqueId(raw).base();

    if base == Some(BaseTechnique::LodLandNoise) && switches.disable_lod_land_noise {
        tracing::debug!(raw = %RawTechniqueId(raw), "LOD land noise disabled, downgrading to LODLAND");
        return RawTechniqueId((raw & LOD_LAND_NOISE_DOWNGRADE_MASK) | LOD_LAND_NOISE_DOWNGRADE_SET);
    }

    if base == Some(BaseTechnique::ParallaxOcc) && switches.disable_parallax_occlusion {
        tracing::debug!(raw = %RawTechniqueId(raw), "parallax occlusion disabled, clearing base technique");
        return RawTechniqueId(raw & !BASE_TECHNIQUE_MASK);
    }

    RawTechniqueId(raw)
}

/// Inverse of [`to_raw_technique`] without kill switches
pub fn to_requested_technique(raw: RawTechniqueId) -> u32 {
    raw.bits().wrapping_add(REQUEST_BASE)
}

/// Project a raw id onto the flags the vertex stage is compiled for
pub fn to_vertex_technique(raw: RawTechniqueId) -> VertexTechniqueId {
    let bits = raw.bits();
    let mut id = (bits & BASE_TECHNIQUE_MASK) | (bits & TechniqueFlags::VERTEX_STAGE.bits());

    if raw.any(TechniqueFlags::VERTEX_SPECULAR_FOLD) {
        id |= TechniqueFlags::SPECULAR.bits();
    }

    VertexTechniqueId(id)
}

/// Project a raw id onto the flags the pixel stage is compiled for
pub fn to_pixel_technique(raw: RawTechniqueId) -> PixelTechniqueId {
    let mut id = raw.bits() & !TechniqueFlags::PIXEL_STRIPPED.bits();

    if id & TechniqueFlags::MODELSPACENORMALS.bits() == 0 {
        id &= !TechniqueFlags::SKINNED.bits();
    }

    PixelTechniqueId(id | TechniqueFlags::VC.bits())
}
