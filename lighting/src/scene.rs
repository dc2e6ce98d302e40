//! Scene inputs for a draw
//!
//! A [`RenderPass`] pairs a piece of geometry with its shader property and the
//! lights affecting it. The scene traversal builds passes; binders only read them.

use glam::{Mat3, Mat4, Vec3};

use crate::material::ShaderMaterial;

// ============================================================================
// Transforms
// ============================================================================

/// Rigid transform with uniform scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub rotation: Mat3,
    pub translation: Vec3,
    pub scale: f32,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl WorldTransform {
    pub const IDENTITY: WorldTransform = WorldTransform {
        rotation: Mat3::IDENTITY,
        translation: Vec3::ZERO,
        scale: 1.0,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Column-vector matrix `[R * s | t]`
    pub fn to_matrix(&self) -> Mat4 {
        self.to_matrix_adjusted(Vec3::ZERO)
    }

    /// Column-vector matrix with `pos_adjust` subtracted from the translation
    pub fn to_matrix_adjusted(&self, pos_adjust: Vec3) -> Mat4 {
        let linear = self.rotation * self.scale;
        Mat4::from_cols(
            linear.x_axis.extend(0.0),
            linear.y_axis.extend(0.0),
            linear.z_axis.extend(0.0),
            (self.translation - pos_adjust).extend(1.0),
        )
    }

    /// Inverse transform, assuming an orthonormal rotation and non-zero scale
    pub fn inverse(&self) -> WorldTransform {
        let rotation = self.rotation.transpose();
        let scale = self.scale.recip();
        WorldTransform {
            rotation,
            translation: -(rotation * self.translation) * scale,
            scale,
        }
    }
}

/// Source of the inverse world matrix used for model-space lighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InverseWorldSource {
    /// Invert the geometry's world transform
    Transform,
    /// Invert a pure translation to the camera-relative origin
    CameraOrigin,
}

/// Inverse world matrix for lighting in model space
pub fn inverse_world_matrix(transform: &WorldTransform, camera_origin: Vec3, source: InverseWorldSource) -> Mat4 {
    match source {
        InverseWorldSource::Transform => transform.inverse().to_matrix(),
        InverseWorldSource::CameraOrigin => Mat4::from_translation(camera_origin).inverse(),
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Geometry collaborator queried during geometry setup
pub trait Geometry {
    fn world_transform(&self) -> &WorldTransform;

    fn previous_world_transform(&self) -> &WorldTransform;

    /// Geometry-provided projected UV transform, if the geometry carries one
    fn projected_uv_transform(&self) -> Option<Mat4> {
        None
    }
}

/// Plain geometry description
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub world: WorldTransform,
    pub previous_world: WorldTransform,
    pub projected_uv: Option<Mat4>,
}

impl MeshGeometry {
    /// Static geometry whose previous transform equals the current one
    pub fn at(world: WorldTransform) -> Self {
        Self {
            world,
            previous_world: world,
            projected_uv: None,
        }
    }
}

impl Geometry for MeshGeometry {
    fn world_transform(&self) -> &WorldTransform {
        &self.world
    }

    fn previous_world_transform(&self) -> &WorldTransform {
        &self.previous_world
    }

    fn projected_uv_transform(&self) -> Option<Mat4> {
        self.projected_uv
    }
}

// ============================================================================
// Lights and Properties
// ============================================================================

/// A light affecting a pass; the first light of a pass is the directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLight {
    pub color: Vec3,
    pub dimmer: f32,
    /// Direction the light travels
    pub direction: Vec3,
}

bitflags::bitflags! {
    /// Shader property flags consulted by geometry setup
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyFlags: u64 {
        const ZBUFFER_TEST = 1 << 31;
        const ZBUFFER_WRITE = 1 << 32;
    }
}

/// Per-object shader property
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProperty {
    pub flags: PropertyFlags,
    pub alpha: f32,
    pub emit_color: Vec3,
    pub emit_mult: f32,
    /// LOD fade written into material data and the SSR constant
    pub lod_fade: f32,
    /// Extra land LOD fade parameters (fVars0 xy)
    pub land_fade_params: [f32; 2],
    pub material: ShaderMaterial,
}

impl Default for ShaderProperty {
    fn default() -> Self {
        Self {
            flags: PropertyFlags::ZBUFFER_TEST | PropertyFlags::ZBUFFER_WRITE,
            alpha: 1.0,
            emit_color: Vec3::ZERO,
            emit_mult: 1.0,
            lod_fade: 0.0,
            land_fade_params: [0.0; 2],
            material: ShaderMaterial::default(),
        }
    }
}

// ============================================================================
// Render Pass
// ============================================================================

bitflags::bitflags! {
    /// Per-draw flags passed to geometry setup
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DrawFlags: u32 {
        /// Screen-space reflections off for this draw
        const NO_SSR = 1 << 1;
        /// Skip projected UV normals when the config honours this flag
        const NO_PROJECTED_NORMALS = 1 << 3;
        /// Use the current world transform as the previous one
        const CURRENT_AS_PREVIOUS = 1 << 4;
    }
}

/// Accumulation hint of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccumulationHint(pub u8);

impl AccumulationHint {
    /// Depth state is left to the accumulator
    pub const KEEP_DEPTH_A: AccumulationHint = AccumulationHint(2);
    /// Depth state is left to the accumulator; z-writing properties force blending
    pub const KEEP_DEPTH_BLEND: AccumulationHint = AccumulationHint(3);
    /// LOD fade stencil pass
    pub const LOD_STENCIL: AccumulationHint = AccumulationHint(10);

    /// Hints that leave depth mode untouched
    pub fn keeps_depth_mode(self) -> bool {
        self.0.wrapping_sub(2) <= 1
    }
}

/// One draw of one geometry with one property
#[derive(Clone, Copy)]
pub struct RenderPass<'a> {
    pub geometry: &'a dyn Geometry,
    pub property: &'a ShaderProperty,
    pub lights: &'a [SceneLight],
    pub accumulation_hint: AccumulationHint,
    /// LOD mode byte; bit 7 selects fade alpha over stencil alpha
    pub lod_mode: u8,
}

impl<'a> RenderPass<'a> {
    pub fn new(geometry: &'a dyn Geometry, property: &'a ShaderProperty) -> Self {
        Self {
            geometry,
            property,
            lights: &[],
            accumulation_hint: AccumulationHint::default(),
            lod_mode: 0,
        }
    }

    pub fn with_lights(mut self, lights: &'a [SceneLight]) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_accumulation_hint(mut self, hint: AccumulationHint) -> Self {
        self.accumulation_hint = hint;
        self
    }

    pub fn with_lod_mode(mut self, lod_mode: u8) -> Self {
        self.lod_mode = lod_mode;
        self
    }

    /// The pass fades by material fade alpha
    pub fn lod_fading(&self) -> bool {
        self.lod_mode & 0x80 != 0
    }

    pub fn directional_light(&self) -> Option<&SceneLight> {
        self.lights.first()
    }
}

impl std::fmt::Debug for RenderPass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("world", self.geometry.world_transform())
            .field("lights", &self.lights.len())
            .field("accumulation_hint", &self.accumulation_hint)
            .field("lod_mode", &self.lod_mode)
            .finish()
    }
}
