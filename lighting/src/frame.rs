//! Per-frame renderer state
//!
//! Everything the binders read that belongs to the frame rather than to a
//! draw: camera, fog, shadow targets, land LOD fading and shared textures.

use glam::{UVec2, Vec2, Vec3, Vec4};

use crate::facade::TextureHandle;

/// Fog parameters of the current frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogParams {
    pub near_color: Vec3,
    pub far_color: Vec3,
    pub near: f32,
    pub far: f32,
    pub power: f32,
    pub clamp: f32,
}

impl FogParams {
    /// Vertex fog scale/adjust constant, or `fallback` when both distances are zero
    pub fn scale_adjust(&self, fallback: [f32; 4]) -> [f32; 4] {
        if self.far != 0.0 || self.near != 0.0 {
            let m = (self.far - self.near).recip();
            [m * self.near, m, self.power, self.clamp]
        } else {
            fallback
        }
    }
}

/// Land LOD fade timing
///
/// The fade position moves from `from` to `to` over five times `duration`
/// seconds after `start_time`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandFade {
    pub time: f32,
    pub start_time: f32,
    pub duration: f32,
    pub from: Vec2,
    pub to: Vec2,
}

impl LandFade {
    /// Fade progress in `[0, 1]`; negative or undefined progress is 0
    pub fn factor(&self) -> f32 {
        let v = (self.time - self.start_time) / (self.duration * 5.0);
        // NaN compares false and falls through to 0
        if v >= 0.0 { v.min(1.0) } else { 0.0 }
    }

    pub fn position(&self, factor: f32) -> Vec2 {
        self.from + (self.to - self.from) * factor
    }
}

/// Secondary shadow target bound at technique setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecondaryShadowTarget {
    pub enabled: bool,
    pub bound: bool,
}

impl SecondaryShadowTarget {
    /// Both flags set: slot 15 must be released at technique restore
    pub fn needs_release(&self) -> bool {
        self.enabled && self.bound
    }
}

/// Image-based lighting parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IblParams {
    pub scale: f32,
    /// Select `primary` over `secondary`
    pub use_primary: bool,
    pub primary: Vec3,
    pub secondary: Vec3,
}

impl Default for IblParams {
    fn default() -> Self {
        Self {
            scale: 0.0,
            use_primary: true,
            primary: Vec3::ONE,
            secondary: Vec3::ONE,
        }
    }
}

impl IblParams {
    /// (scale, selected colour)
    pub fn constant(&self) -> [f32; 4] {
        let color = if self.use_primary { self.primary } else { self.secondary };
        [self.scale, color.x, color.y, color.z]
    }
}

/// Textures owned by the renderer and shared by every draw of a frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTextures {
    /// Bound to every slot for multi-texture landscapes at technique setup
    pub land: Option<TextureHandle>,
    pub shadow_mask: Option<TextureHandle>,
    pub projected_diffuse: Option<TextureHandle>,
    pub projected_normal: Option<TextureHandle>,
    pub projected_noise: Option<TextureHandle>,
    pub projected_normal_detail: Option<TextureHandle>,
    /// Used by environment-mapped materials without a mask
    pub default_envmap_mask: Option<TextureHandle>,
    pub world_map: [Option<TextureHandle>; 2],
}

/// Renderer-wide state for the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    /// Camera position; world matrices are written relative to it
    pub camera_position: Vec3,
    /// Camera delta applied to previous-frame world matrices
    pub previous_pos_adjust: Vec3,
    /// `None` when fog is off
    pub fog: Option<FogParams>,
    /// Land LOD origin for LOD landscapes (xyz, w)
    pub lod_land_origin: Vec4,
    pub land_fade: LandFade,
    /// Shadow mask render target size in pixels
    pub shadow_viewport: UVec2,
    pub secondary_shadow: Option<SecondaryShadowTarget>,
    pub textures: FrameTextures,
    /// Textures addressable by material pool indices
    pub texture_pool: Vec<Option<TextureHandle>>,
    /// Pool index of the character light probe
    pub character_light_probe: Option<u32>,
    /// Which texture coordinate set's offset/scale is written
    pub texcoord_index: usize,
    /// Global directional light intensity multiplier
    pub light_intensity: f32,
    /// Eye position of the precipitation occlusion accumulator
    pub accumulator_eye_position: Vec3,
    /// World map overlay colours (vertex, pixel)
    pub world_map_colors: [Vec4; 2],
    pub ibl: IblParams,
}

impl Default for FrameState {
    fn default() -> Self {
        Self {
            camera_position: Vec3::ZERO,
            previous_pos_adjust: Vec3::ZERO,
            fog: None,
            lod_land_origin: Vec4::ZERO,
            land_fade: LandFade::default(),
            shadow_viewport: UVec2::new(1280, 720),
            secondary_shadow: None,
            textures: FrameTextures::default(),
            texture_pool: Vec::new(),
            character_light_probe: None,
            texcoord_index: 0,
            light_intensity: 1.0,
            accumulator_eye_position: Vec3::ZERO,
            world_map_colors: [Vec4::ZERO; 2],
            ibl: IblParams::default(),
        }
    }
}

impl FrameState {
    /// Look up a pool texture; out-of-range indices resolve to nothing
    pub fn pool_texture(&self, index: u32) -> Option<TextureHandle> {
        let texture = self.texture_pool.get(index as usize).copied().flatten();
        if texture.is_none() {
            tracing::debug!(index, pool = self.texture_pool.len(), "texture pool entry is empty");
        }
        texture
    }

    /// Pixel offset constant for sampling the shadow mask
    pub fn shadow_texel_size(&self) -> [f32; 4] {
        [
            (self.shadow_viewport.x as f32).recip(),
            (self.shadow_viewport.y as f32).recip(),
            0.0,
            0.0,
        ]
    }

    /// Vertex acceleration constant for LOD landscapes
    pub fn lod_land_acceleration(&self) -> [f32; 4] {
        let origin = self.lod_land_origin;
        [
            origin.x - self.camera_position.x,
            origin.y - self.camera_position.y,
            origin.z - 15.0,
            origin.w - 15.0,
        ]
    }
}
