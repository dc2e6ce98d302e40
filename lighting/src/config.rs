//! Lighting configuration
//!
//! Global tunables read by the binders. Stored as TOML; every field has a
//! default so partial files are valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use technique_common::KillSwitches;

use crate::error::ConfigError;

/// Lighting shader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LightingConfig {
    /// Technique kill switches
    #[serde(default)]
    pub kill_switches: KillSwitches,
    /// Colour output clamps
    #[serde(default)]
    pub output_clamp: OutputClampConfig,
    /// Fog and wind
    #[serde(default)]
    pub fog: FogConfig,
    /// Snow and landscape settings
    #[serde(default)]
    pub snow: SnowConfig,
    /// Projected UV decals
    #[serde(default)]
    pub projected_uv: ProjectedUvConfig,
    /// Screen-space reflections
    #[serde(default)]
    pub ssr: SsrConfig,
    /// Character rim light and ambient specular
    #[serde(default)]
    pub character_light: CharacterLightConfig,
    /// Shadow mask sampling
    #[serde(default)]
    pub shadow: ShadowConfig,
}

/// Colour output clamp settings (post-lit, post-env, post-spec).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputClampConfig {
    /// Clamp after lighting (default: 1.0)
    #[serde(default = "default_clamp")]
    pub post_lit: f32,
    /// Clamp after environment mapping (default: 1.0)
    #[serde(default = "default_clamp")]
    pub post_env: f32,
    /// Clamp after specular (default: 1.0)
    #[serde(default = "default_clamp")]
    pub post_spec: f32,
}

/// Fog and wind settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogConfig {
    /// Wind scalar written to the W channel of the wind/fog colour constant (default: 0.0)
    #[serde(default)]
    pub wind_speed: f32,
    /// Scale-adjust constant used when fog near and far are both zero
    /// (default: no fog contribution)
    #[serde(default = "default_fog_scale_adjust_fallback")]
    pub scale_adjust_fallback: [f32; 4],
}

/// Snow rim light and landscape settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnowConfig {
    /// Snow rim light intensity (default: 0.3)
    #[serde(default = "default_snow_rim_intensity")]
    pub rim_light_intensity: f32,
    /// Snow specular power for geometry (default: 3.0)
    #[serde(default = "default_snow_geometry_spec_power")]
    pub geometry_spec_power: f32,
    /// Snow specular power for normal maps (default: 2.0)
    #[serde(default = "default_snow_normal_spec_power")]
    pub normal_spec_power: f32,
    /// Enable snow rim lighting (default: true)
    #[serde(default = "default_true")]
    pub enable_rim_lighting: bool,
    /// Landscape multi-normal tiling factor (default: 1, must be non-zero)
    #[serde(default = "default_tiling_factor")]
    pub landscape_multi_normal_tiling_factor: u32,
    /// Force snow on landscape layers (default: false)
    #[serde(default)]
    pub landscape_override_snow: bool,
    /// Blend land LOD textures (default: false)
    #[serde(default)]
    pub lod_land_blend: bool,
}

/// Projected UV decal settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedUvConfig {
    /// Bind the projected normal textures (default: true)
    #[serde(default = "default_true")]
    pub enable_normals: bool,
    /// Suppress projected normals on draws flagged to skip them (default: false)
    #[serde(default)]
    pub normals_respect_draw_flag: bool,
    /// First row of the basis used when geometry has no projected UV transform
    /// (xyz) and the first entry of the second row (w)
    #[serde(default = "default_basis_seed")]
    pub basis_seed: [f32; 4],
}

/// Screen-space reflection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsrConfig {
    /// Depth at which reflections start fading (default: 0.0)
    #[serde(default)]
    pub fade_start: f32,
    /// Length of the fade (default: 1.0)
    #[serde(default = "default_one")]
    pub fade_range: f32,
    /// Global reflection scale (default: 1.0)
    #[serde(default = "default_one")]
    pub global_scale: f32,
}

/// Character lighting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterLightConfig {
    /// Write the character rim light constant (default: true)
    #[serde(default = "default_true")]
    pub enable_rim_lighting: bool,
    /// Character rim light constant
    #[serde(default = "default_character_light_params")]
    pub params: [f32; 4],
    /// Ambient specular tint (xyz) and fresnel power (w)
    #[serde(default = "default_ambient_specular")]
    pub ambient_specular: [f32; 4],
}

/// Shadow mask settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    /// Shadow filter quality; quality 4 samples the mask unfiltered (default: 3)
    #[serde(default = "default_shadow_quality")]
    pub filter_quality: u32,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

fn default_clamp() -> f32 {
    1.0
}

fn default_fog_scale_adjust_fallback() -> [f32; 4] {
    [0.0, 0.0, 1.0, 0.0]
}

fn default_snow_rim_intensity() -> f32 {
    0.3
}

fn default_snow_geometry_spec_power() -> f32 {
    3.0
}

fn default_snow_normal_spec_power() -> f32 {
    2.0
}

fn default_tiling_factor() -> u32 {
    1
}

fn default_basis_seed() -> [f32; 4] {
    [1.0, 0.0, 0.0, 0.0]
}

fn default_character_light_params() -> [f32; 4] {
    [0.5, 0.5, 0.5, 1.0]
}

fn default_ambient_specular() -> [f32; 4] {
    [1.0, 1.0, 1.0, 5.0]
}

fn default_shadow_quality() -> u32 {
    3
}

impl Default for OutputClampConfig {
    fn default() -> Self {
        Self {
            post_lit: default_clamp(),
            post_env: default_clamp(),
            post_spec: default_clamp(),
        }
    }
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            wind_speed: 0.0,
            scale_adjust_fallback: default_fog_scale_adjust_fallback(),
        }
    }
}

impl Default for SnowConfig {
    fn default() -> Self {
        Self {
            rim_light_intensity: default_snow_rim_intensity(),
            geometry_spec_power: default_snow_geometry_spec_power(),
            normal_spec_power: default_snow_normal_spec_power(),
            enable_rim_lighting: default_true(),
            landscape_multi_normal_tiling_factor: default_tiling_factor(),
            landscape_override_snow: false,
            lod_land_blend: false,
        }
    }
}

impl Default for ProjectedUvConfig {
    fn default() -> Self {
        Self {
            enable_normals: default_true(),
            normals_respect_draw_flag: false,
            basis_seed: default_basis_seed(),
        }
    }
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self {
            fade_start: 0.0,
            fade_range: default_one(),
            global_scale: default_one(),
        }
    }
}

impl Default for CharacterLightConfig {
    fn default() -> Self {
        Self {
            enable_rim_lighting: default_true(),
            params: default_character_light_params(),
            ambient_specular: default_ambient_specular(),
        }
    }
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            filter_quality: default_shadow_quality(),
        }
    }
}

impl LightingConfig {
    /// Parse a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LightingConfig = toml::from_str(content)?;
        if config.snow.landscape_multi_normal_tiling_factor == 0 {
            tracing::warn!("landscape_multi_normal_tiling_factor is 0, snow tiling reciprocal will be infinite");
        }
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading lighting config");
        Self::from_toml_str(&content)
    }

    /// Serialize to pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Colour output clamp constant (post-lit, post-env, post-spec, 0)
    pub fn colour_output_clamp(&self) -> [f32; 4] {
        [self.output_clamp.post_lit, self.output_clamp.post_env, self.output_clamp.post_spec, 0.0]
    }

    /// Snow rim light constant
    pub fn snow_rim_light_parameters(&self) -> [f32; 4] {
        [
            self.snow.rim_light_intensity,
            self.snow.geometry_spec_power,
            self.snow.normal_spec_power,
            if self.snow.enable_rim_lighting { 1.0 } else { 0.0 },
        ]
    }
}
