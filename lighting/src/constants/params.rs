//! Named constant slots of the lighting shader
//!
//! Slot numbers are shared by every permutation; the word offset each one
//! resolves to is per permutation.

use super::Param;
use crate::shader::{Pixel, Vertex};

pub type Float2 = [f32; 2];
pub type Float3 = [f32; 3];
pub type Float4 = [f32; 4];
/// Three rows of a 4x4 matrix; the implied fourth row is `(0, 0, 0, 1)`
pub type Float3x4 = [f32; 12];

pub type VsParam<T> = Param<Vertex, T>;
pub type PsParam<T> = Param<Pixel, T>;

/// Vertex shader slots
pub mod vs {
    use super::*;

    pub const WORLD_VIEW_PROJ: VsParam<Float3x4> = Param::new(0);
    pub const PREV_WORLD_VIEW_PROJ: VsParam<Float3x4> = Param::new(1);
    pub const PRECIPITATION_OCCLUSION_WORLD_VIEW_PROJ: VsParam<Float3> = Param::new(2);
    /// Land LOD fade parameters
    pub const F_VARS0: VsParam<Float4> = Param::new(3);
    /// Projected UV transform
    pub const F_VARS3: VsParam<Float3x4> = Param::new(6);
    /// World map overlay colour
    pub const COLOR1: VsParam<Float4> = Param::new(8);
    /// Left eye centre
    pub const COLOR2: VsParam<Float4> = Param::new(9);
    /// Right eye centre
    pub const COLOR3: VsParam<Float4> = Param::new(10);
    /// Texture coordinate offset and scale
    pub const VELOCITY: VsParam<Float4> = Param::new(11);
    pub const ACCELERATION: VsParam<Float4> = Param::new(12);
    /// Fog distance scale and adjustment
    pub const SCALE_ADJUST: VsParam<Float4> = Param::new(13);
    pub const WIND: VsParam<Float4> = Param::new(14);
    pub const FOG_FAR_COLOR: VsParam<Float4> = Param::new(15);
}

/// Pixel shader slots
pub mod ps {
    use super::*;

    pub const NUM_LIGHT_NUM_SHADOW_LIGHT: PsParam<Float2> = Param::new(0);
    pub const DIR_LIGHT_DIRECTION: PsParam<Float3> = Param::new(3);
    pub const DIR_LIGHT_COLOR: PsParam<Float3> = Param::new(4);
    pub const AMBIENT_SPECULAR_TINT_AND_FRESNEL_POWER: PsParam<Float4> = Param::new(6);
    pub const MATERIAL_DATA: PsParam<Float4> = Param::new(7);
    pub const EMIT_COLOR: PsParam<Float4> = Param::new(8);
    pub const VPOS_OFFSET: PsParam<Float4> = Param::new(11);
    pub const SSR_PARAMS: PsParam<Float4> = Param::new(16);
    pub const WORLD_MAP_OVERLAY_PARAMETERS: PsParam<Float4> = Param::new(17);
    pub const FOG_COLOR: PsParam<Float4> = Param::new(19);
    pub const COLOUR_OUTPUT_CLAMP: PsParam<Float4> = Param::new(20);
    pub const ENVMAP_DATA: PsParam<Float4> = Param::new(21);
    pub const PARALLAX_OCC_DATA: PsParam<Float4> = Param::new(22);
    pub const TINT_COLOR: PsParam<Float4> = Param::new(23);
    pub const LOD_TEX_PARAMS: PsParam<Float4> = Param::new(24);
    pub const SPECULAR_COLOR: PsParam<Float4> = Param::new(25);
    pub const SPARKLE_PARAMS: PsParam<Float4> = Param::new(26);
    pub const MULTI_LAYER_PARALLAX_DATA: PsParam<Float4> = Param::new(27);
    pub const LIGHTING_EFFECT_PARAMS: PsParam<Float4> = Param::new(28);
    pub const IBL_PARAMS: PsParam<Float4> = Param::new(29);
    pub const LANDSCAPE_TEXTURE_1TO4_IS_SNOW: PsParam<Float4> = Param::new(30);
    pub const LANDSCAPE_TEXTURE_5TO6_IS_SNOW: PsParam<Float4> = Param::new(31);
    pub const LANDSCAPE_TEXTURE_1TO4_IS_SPEC_POWER: PsParam<Float4> = Param::new(32);
    pub const LANDSCAPE_TEXTURE_5TO6_IS_SPEC_POWER: PsParam<Float4> = Param::new(33);
    pub const SNOW_RIM_LIGHT_PARAMETERS: PsParam<Float4> = Param::new(34);
    pub const CHARACTER_LIGHT_PARAMS: PsParam<Float4> = Param::new(35);
}

/// Pack a row-major 3x4 from the first three rows of a column-vector matrix
pub fn float3x4(matrix: &glam::Mat4) -> Float3x4 {
    let r0 = matrix.row(0).to_array();
    let r1 = matrix.row(1).to_array();
    let r2 = matrix.row(2).to_array();
    [
        r0[0], r0[1], r0[2], r0[3], //
        r1[0], r1[1], r1[2], r1[3], //
        r2[0], r2[1], r2[2], r2[3],
    ]
}
