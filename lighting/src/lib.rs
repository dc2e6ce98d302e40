//! Lighting shader constant setup
//!
//! Selects lighting shader permutations, binds their textures and samplers, and
//! fills the technique, material and geometry constant tiers for each draw.
//!
//! # Modules
//!
//! - [`constants`] - Constant groups, typed slots and the slot table
//! - [`shader`] - Compiled shader instances and their offset tables
//! - [`library`] - Keyed store of vertex/pixel/compute permutations
//! - [`facade`] - The device operations the binders drive
//! - [`recording`] - A facade that records calls instead of rendering
//! - [`binder`] - [`LightingShader`] and its three setup phases
//! - [`scene`], [`material`], [`frame`] - Draw, material and frame inputs
//! - [`context`] - State carried between the phases of one draw
//! - [`writers`] - Hooks for constants populated outside this crate
//! - [`config`] - Global tunables loaded from TOML

pub mod binder;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod facade;
pub mod frame;
pub mod library;
pub mod material;
pub mod recording;
pub mod scene;
pub mod shader;
pub mod writers;

pub use binder::LightingShader;
pub use config::LightingConfig;
pub use constants::{ConstantGroup, ConstantGroupLevel, ConstantOffset, Param, ps, vs};
pub use context::{DrawContext, DrawState, SavedState};
pub use error::{ConfigError, ShaderError, TechniqueError};
pub use facade::{
    AddressMode, BlendMode, BufferHandle, BufferPlacement, ConstantBuffer, DepthMode, FilterMode, RendererFacade,
    StencilMode, TextureHandle,
};
pub use frame::{FogParams, FrameState, FrameTextures, IblParams, LandFade, SecondaryShadowTarget};
pub use library::{ShaderLibrary, ShaderPair};
pub use material::{EnvmapMaterial, LandLayer, LandscapeMaterial, MaterialKind, ShaderMaterial};
pub use recording::{RecordingRenderer, RenderCommand};
pub use scene::{
    AccumulationHint, DrawFlags, Geometry, MeshGeometry, PropertyFlags, RenderPass, SceneLight, ShaderProperty,
    WorldTransform,
};
pub use shader::{BufferLayout, Pixel, ShaderHandle, ShaderInstance, ShaderStage, Vertex};
pub use writers::{ConstantWriters, NoExternalWriters, PointLightRequest, WriterLog};
