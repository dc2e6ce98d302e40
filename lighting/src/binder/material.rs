use technique_common::{BaseTechnique, RawTechniqueId, TechniqueFlags};

use super::{LightingShader, bind_texture, commit};
use crate::constants::{ConstantGroup, ConstantGroupLevel, Float4, VsParam, ps, vs};
use crate::context::DrawContext;
use crate::facade::{AddressMode, FilterMode, RendererFacade};
use crate::frame::FrameState;
use crate::material::{EnvmapMaterial, LAND_LAYER_CAPACITY, LandscapeMaterial, MaterialKind, ShaderMaterial};
use crate::shader::{Pixel, Vertex};

fn flag(set: bool) -> f32 {
    if set { 1.0 } else { 0.0 }
}

/// Base techniques that read technique-specific material fields
fn has_material_branch(base: BaseTechnique) -> bool {
    matches!(
        base,
        BaseTechnique::Envmap
            | BaseTechnique::Glowmap
            | BaseTechnique::Parallax
            | BaseTechnique::FaceGen
            | BaseTechnique::FaceGenRgbTint
            | BaseTechnique::Hair
            | BaseTechnique::ParallaxOcc
            | BaseTechnique::MtLand
            | BaseTechnique::MtLandLodBlend
            | BaseTechnique::LodLand
            | BaseTechnique::LodLandNoise
            | BaseTechnique::MultiLayerParallax
            | BaseTechnique::MultiIndexTriShapeSnow
            | BaseTechnique::Eye
    )
}

impl LightingShader {
    /// Bind material textures and write the material tier
    ///
    /// Must follow a successful [`LightingShader::setup_technique`]; without an
    /// active technique nothing is written.
    pub fn setup_material<R: RendererFacade>(&self, cx: &mut DrawContext<'_, R>, material: &ShaderMaterial) {
        let Some(pair) = cx.state.pair.clone() else {
            tracing::warn!(kind = material.kind.name(), "material setup without an active technique");
            return;
        };

        let raw = cx.state.raw;
        let renderer = &mut *cx.renderer;
        let frame = cx.frame;
        let mut vertex = renderer.get_shader_constant_group(&pair.vertex, ConstantGroupLevel::Material);
        let mut pixel = renderer.get_shader_constant_group(&pair.pixel, ConstantGroupLevel::Material);

        let clamp = material.texture_clamp_mode;
        let mut bind_diffuse_normal = true;

        match (raw.base(), &material.kind) {
            (Some(BaseTechnique::Envmap), MaterialKind::Envmap(envmap)) => {
                bind_envmap(renderer, frame, &mut pixel, envmap, clamp);
            }
            (Some(BaseTechnique::Glowmap), MaterialKind::Glowmap { glow }) => {
                bind_texture(renderer, 6, *glow, clamp);
            }
            (Some(BaseTechnique::Parallax), MaterialKind::Parallax { height }) => {
                bind_texture(renderer, 3, *height, clamp);
            }
            (Some(BaseTechnique::FaceGen), MaterialKind::FaceGen { detail, tint, subsurface }) => {
                bind_texture(renderer, 3, *detail, clamp);
                bind_texture(renderer, 4, *tint, clamp);
                bind_texture(renderer, 12, *subsurface, clamp);
            }
            (Some(BaseTechnique::FaceGenRgbTint | BaseTechnique::Hair), MaterialKind::Tint { color }) => {
                let tint = pixel.param_mut(ps::TINT_COLOR);
                tint[0] = color.x;
                tint[1] = color.y;
                tint[2] = color.z;
            }
            (Some(BaseTechnique::ParallaxOcc), MaterialKind::ParallaxOcc { height, params }) => {
                bind_texture(renderer, 3, *height, clamp);
                // Components are stored swapped
                let data = pixel.param_mut(ps::PARALLAX_OCC_DATA);
                data[0] = params[1];
                data[1] = params[0];
            }
            (Some(BaseTechnique::MtLand | BaseTechnique::MtLandLodBlend), MaterialKind::Landscape(land)) => {
                self.bind_landscape(renderer, &mut pixel, raw, material, land);
                bind_diffuse_normal = false;
            }
            (Some(base @ (BaseTechnique::LodLand | BaseTechnique::LodLandNoise)), MaterialKind::LodLand { noise, params }) => {
                pixel.set(ps::LOD_TEX_PARAMS, self.lod_tex_params(*params));
                if base == BaseTechnique::LodLandNoise {
                    if noise.is_some() {
                        bind_texture(renderer, 15, *noise, clamp);
                    }
                    renderer.set_texture_mode(15, AddressMode::WRAP, FilterMode::BILINEAR);
                }
            }
            (Some(BaseTechnique::MultiLayerParallax), MaterialKind::MultiLayerParallax { layer, params, envmap }) => {
                bind_texture(renderer, 8, *layer, clamp);
                pixel.set(ps::MULTI_LAYER_PARALLAX_DATA, *params);
                bind_envmap(renderer, frame, &mut pixel, envmap, clamp);
            }
            (Some(BaseTechnique::MultiIndexTriShapeSnow), MaterialKind::Snow { sparkle }) => {
                pixel.set(ps::SPARKLE_PARAMS, *sparkle);
            }
            (
                Some(BaseTechnique::Eye),
                MaterialKind::Eye {
                    envmap,
                    left_eye_center,
                    right_eye_center,
                },
            ) => {
                bind_envmap(renderer, frame, &mut pixel, envmap, clamp);
                write_xyz(&mut vertex, vs::COLOR2, left_eye_center.to_array());
                write_xyz(&mut vertex, vs::COLOR3, right_eye_center.to_array());
            }
            (Some(base), kind) if has_material_branch(base) => {
                tracing::warn!(%raw, kind = kind.name(), "material does not match the active technique");
            }
            _ => {}
        }

        self.write_common_material(renderer, frame, &mut vertex, &mut pixel, raw, material, bind_diffuse_normal);

        commit(renderer, &vertex, &pixel, ConstantGroupLevel::Material);
    }

    /// Material restore has nothing to undo
    pub fn restore_material<R: RendererFacade>(&self, _cx: &mut DrawContext<'_, R>, _material: &ShaderMaterial) {}

    fn lod_tex_params(&self, params: [f32; 3]) -> [f32; 4] {
        [params[0], params[1], flag(self.config.snow.lod_land_blend), params[2]]
    }

    fn bind_landscape<R: RendererFacade>(
        &self,
        renderer: &mut R,
        pixel: &mut ConstantGroup<'_, Pixel>,
        raw: RawTechniqueId,
        material: &ShaderMaterial,
        land: &LandscapeMaterial,
    ) {
        pixel.set(ps::LOD_TEX_PARAMS, self.lod_tex_params(land.lod_params));

        renderer.set_shader_resource(0, material.diffuse);
        renderer.set_shader_resource(7, material.normal);

        if land.layers.len() > LAND_LAYER_CAPACITY {
            tracing::debug!(layers = land.layers.len(), "landscape layers beyond capacity ignored");
        }
        for (i, layer) in land.layers.iter().take(LAND_LAYER_CAPACITY).enumerate() {
            let i = i as u32;
            bind_texture(renderer, 1 + i, layer.diffuse, AddressMode::WRAP);
            bind_texture(renderer, 8 + i, layer.normal, AddressMode::WRAP);
        }

        if land.overlay.is_some() {
            bind_texture(renderer, 13, land.overlay, AddressMode::CLAMP);
        }

        if land.noise.is_some() {
            bind_texture(renderer, 15, land.noise, material.texture_clamp_mode);
        }

        let spec = land.spec_power;
        pixel.set(ps::LANDSCAPE_TEXTURE_1TO4_IS_SPEC_POWER, [spec[0], spec[1], spec[2], spec[3]]);
        pixel.set(ps::LANDSCAPE_TEXTURE_5TO6_IS_SPEC_POWER, [spec[4], spec[5], 0.0, 0.0]);

        if raw.flags().contains(TechniqueFlags::SNOW) {
            let snow = land.is_snow;
            let tiling = self.config.snow.landscape_multi_normal_tiling_factor as f32;
            pixel.set(ps::LANDSCAPE_TEXTURE_1TO4_IS_SNOW, [snow[0], snow[1], snow[2], snow[3]]);
            pixel.set(
                ps::LANDSCAPE_TEXTURE_5TO6_IS_SNOW,
                [snow[4], snow[5], flag(self.config.snow.landscape_override_snow), tiling.recip()],
            );
        }
    }

    /// Writes shared by every technique, after the per-technique switch
    #[allow(clippy::too_many_arguments)]
    fn write_common_material<R: RendererFacade>(
        &self,
        renderer: &mut R,
        frame: &FrameState,
        vertex: &mut ConstantGroup<'_, Vertex>,
        pixel: &mut ConstantGroup<'_, Pixel>,
        raw: RawTechniqueId,
        material: &ShaderMaterial,
        bind_diffuse_normal: bool,
    ) {
        let flags = raw.flags();
        let clamp = material.texture_clamp_mode;

        let set = frame.texcoord_index.min(material.texcoord_offset.len() - 1);
        let (offset, scale) = (material.texcoord_offset[set], material.texcoord_scale[set]);
        vertex.set(vs::VELOCITY, [offset.x, offset.y, scale.x, scale.y]);

        if flags.contains(TechniqueFlags::SPECULAR) {
            let color = material.specular_color * material.specular_color_scale;
            pixel.set(ps::SPECULAR_COLOR, color.extend(material.specular_power).to_array());

            if flags.contains(TechniqueFlags::MODELSPACENORMALS) {
                bind_texture(renderer, 2, material.specular_back_lighting, clamp);
                renderer.set_shader_resource(2, material.specular_back_lighting);
                renderer.set_texture_mode(2, clamp, FilterMode::ANISOTROPIC);
            }
        }

        if flags.contains(TechniqueFlags::AMBIENT_SPECULAR) {
            pixel.set(ps::AMBIENT_SPECULAR_TINT_AND_FRESNEL_POWER, self.config.character_light.ambient_specular);
        }

        if flags.contains(TechniqueFlags::SOFT_LIGHTING) {
            bind_texture(renderer, 12, material.rim_soft_lighting, clamp);
            let effect = pixel.param_mut(ps::LIGHTING_EFFECT_PARAMS);
            effect[0] = material.lighting_effect[0];
            effect[1] = material.lighting_effect[1];
        }

        // Same writes as soft lighting; the flags toggle independently
        if flags.contains(TechniqueFlags::RIM_LIGHTING) {
            bind_texture(renderer, 12, material.rim_soft_lighting, clamp);
            let effect = pixel.param_mut(ps::LIGHTING_EFFECT_PARAMS);
            effect[0] = material.lighting_effect[0];
            effect[1] = material.lighting_effect[1];
        }

        if flags.contains(TechniqueFlags::BACK_LIGHTING) {
            bind_texture(renderer, 9, material.specular_back_lighting, clamp);
        }

        if flags.contains(TechniqueFlags::SNOW) {
            pixel.set(ps::SNOW_RIM_LIGHT_PARAMETERS, self.config.snow_rim_light_parameters());
        }

        if bind_diffuse_normal {
            let diffuse = match material.diffuse_pool_index {
                Some(index) => frame.pool_texture(index),
                None => material.diffuse,
            };
            bind_texture(renderer, 0, diffuse, clamp);
            bind_texture(renderer, 1, material.normal, clamp);
        }

        pixel.set(ps::IBL_PARAMS, frame.ibl.constant());

        if flags.contains(TechniqueFlags::CHARACTER_LIGHT) {
            if let Some(probe) = frame.character_light_probe {
                bind_texture(renderer, 11, frame.pool_texture(probe), AddressMode::CLAMP);
            }
            if self.config.character_light.enable_rim_lighting {
                pixel.set(ps::CHARACTER_LIGHT_PARAMS, self.config.character_light.params);
            }
        }
    }
}

/// Envmap at slot 4 and mask at slot 5, then the envmap data constant
fn bind_envmap<R: RendererFacade>(
    renderer: &mut R,
    frame: &FrameState,
    pixel: &mut ConstantGroup<'_, Pixel>,
    envmap: &EnvmapMaterial,
    clamp: AddressMode,
) {
    bind_texture(renderer, 4, envmap.envmap, clamp);
    let mask = envmap.envmap_mask.or(frame.textures.default_envmap_mask);
    bind_texture(renderer, 5, mask, clamp);

    let data = pixel.param_mut(ps::ENVMAP_DATA);
    data[0] = envmap.envmap_scale;
    data[1] = flag(envmap.envmap_mask.is_some());
}

fn write_xyz(vertex: &mut ConstantGroup<'_, Vertex>, param: VsParam<Float4>, xyz: [f32; 3]) {
    let value = vertex.param_mut(param);
    value[..3].copy_from_slice(&xyz);
}
