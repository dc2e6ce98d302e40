//! Lighting materials
//!
//! [`ShaderMaterial`] holds the fields every lighting material has;
//! [`MaterialKind`] carries the extra fields of each technique family.

use glam::{Vec2, Vec3};
use smallvec::SmallVec;

use crate::facade::{AddressMode, TextureHandle};

/// Number of landscape layers beyond the base layer that have texture slots
pub const LAND_LAYER_CAPACITY: usize = 6;

/// Material shared by every lighting technique
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderMaterial {
    pub diffuse: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    /// Rim and soft lighting texture
    pub rim_soft_lighting: Option<TextureHandle>,
    /// Back lighting texture, also the specular map for model-space normals
    pub specular_back_lighting: Option<TextureHandle>,
    /// Redirects the diffuse slot to the frame texture pool
    pub diffuse_pool_index: Option<u32>,
    /// Address mode for the material's own textures
    pub texture_clamp_mode: AddressMode,
    /// Per texture-coordinate-set offsets
    pub texcoord_offset: [Vec2; 2],
    /// Per texture-coordinate-set scales
    pub texcoord_scale: [Vec2; 2],
    pub specular_color: Vec3,
    pub specular_color_scale: f32,
    pub specular_power: f32,
    /// Soft/rim lighting parameters
    pub lighting_effect: [f32; 2],
    /// Stencil reference alpha for LOD stencil passes
    pub lod_stencil_alpha: f32,
    /// Fade alpha for LOD-fading passes
    pub lod_fade_alpha: f32,
    pub kind: MaterialKind,
}

impl Default for ShaderMaterial {
    fn default() -> Self {
        Self {
            diffuse: None,
            normal: None,
            rim_soft_lighting: None,
            specular_back_lighting: None,
            diffuse_pool_index: None,
            texture_clamp_mode: AddressMode::WRAP,
            texcoord_offset: [Vec2::ZERO; 2],
            texcoord_scale: [Vec2::ONE; 2],
            specular_color: Vec3::ONE,
            specular_color_scale: 1.0,
            specular_power: 1.0,
            lighting_effect: [0.0; 2],
            lod_stencil_alpha: 1.0,
            lod_fade_alpha: 1.0,
            kind: MaterialKind::Default,
        }
    }
}

impl ShaderMaterial {
    pub fn with_kind(kind: MaterialKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

/// Technique-family specific material fields
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MaterialKind {
    #[default]
    Default,
    Envmap(EnvmapMaterial),
    Glowmap {
        glow: Option<TextureHandle>,
    },
    Parallax {
        height: Option<TextureHandle>,
    },
    FaceGen {
        detail: Option<TextureHandle>,
        tint: Option<TextureHandle>,
        subsurface: Option<TextureHandle>,
    },
    /// FACEGENRGBTINT and HAIR
    Tint {
        color: Vec3,
    },
    ParallaxOcc {
        height: Option<TextureHandle>,
        /// Parallax occlusion parameters in stored order
        params: [f32; 2],
    },
    Landscape(Box<LandscapeMaterial>),
    LodLand {
        noise: Option<TextureHandle>,
        params: [f32; 3],
    },
    MultiLayerParallax {
        layer: Option<TextureHandle>,
        params: [f32; 4],
        envmap: EnvmapMaterial,
    },
    Snow {
        sparkle: [f32; 4],
    },
    Eye {
        envmap: EnvmapMaterial,
        left_eye_center: Vec3,
        right_eye_center: Vec3,
    },
}

impl MaterialKind {
    pub fn name(&self) -> &'static str {
        match self {
            MaterialKind::Default => "default",
            MaterialKind::Envmap(_) => "envmap",
            MaterialKind::Glowmap { .. } => "glowmap",
            MaterialKind::Parallax { .. } => "parallax",
            MaterialKind::FaceGen { .. } => "facegen",
            MaterialKind::Tint { .. } => "tint",
            MaterialKind::ParallaxOcc { .. } => "parallax-occlusion",
            MaterialKind::Landscape(_) => "landscape",
            MaterialKind::LodLand { .. } => "lod-land",
            MaterialKind::MultiLayerParallax { .. } => "multi-layer-parallax",
            MaterialKind::Snow { .. } => "snow",
            MaterialKind::Eye { .. } => "eye",
        }
    }
}

/// Environment map textures and intensity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnvmapMaterial {
    pub envmap: Option<TextureHandle>,
    /// Falls back to the frame's default mask when absent
    pub envmap_mask: Option<TextureHandle>,
    pub envmap_scale: f32,
}

/// One diffuse/normal pair of a multi-texture landscape
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LandLayer {
    pub diffuse: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
}

/// Multi-texture landscape material
///
/// The base diffuse and normal come from [`ShaderMaterial::diffuse`] and
/// [`ShaderMaterial::normal`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LandscapeMaterial {
    pub layers: SmallVec<[LandLayer; LAND_LAYER_CAPACITY]>,
    pub overlay: Option<TextureHandle>,
    pub noise: Option<TextureHandle>,
    /// LOD texture parameters (x, y, w)
    pub lod_params: [f32; 3],
    /// Per-texture snow flags, textures 1 to 6
    pub is_snow: [f32; 6],
    /// Per-texture specular power, textures 1 to 6
    pub spec_power: [f32; 6],
}
