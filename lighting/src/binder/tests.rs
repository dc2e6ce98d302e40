#[cfg(test)]
mod tests {
    use super::super::*;
    use bytemuck::Pod;
    use glam::{Mat3, Mat4, UVec2, Vec2, Vec3, Vec4};
    use smallvec::smallvec;
    use technique_common::{
        BaseTechnique, REQUEST_BASE, RawTechniqueId, TechniqueFlags, to_pixel_technique, to_vertex_technique,
    };

    use crate::constants::{PsParam, VsParam, float3x4, ps, vs};
    use crate::context::{DrawContext, DrawState, SavedState};
    use crate::error::TechniqueError;
    use crate::facade::{BlendMode, BufferHandle, DepthMode, FilterMode, StencilMode};
    use crate::frame::{FogParams, FrameState, SecondaryShadowTarget};
    use crate::material::{EnvmapMaterial, LandLayer, LandscapeMaterial, MaterialKind, ShaderMaterial};
    use crate::recording::{RecordingRenderer, RenderCommand};
    use crate::scene::{
        AccumulationHint, DrawFlags, MeshGeometry, PropertyFlags, RenderPass, SceneLight, ShaderProperty, WorldTransform,
    };
    use crate::shader::{BufferLayout, ShaderHandle, ShaderInstance};
    use crate::writers::{ConstantWriters, NoExternalWriters, WriterLog};

    // ========================================================================
    // Harness
    // ========================================================================

    const VS_WORDS: u32 = 76;
    const PS_WORDS: u32 = 144;

    fn vertex_slots() -> Vec<(usize, u8)> {
        vec![
            (0, 0),
            (1, 12),
            (2, 24),
            (3, 28),
            (6, 32),
            (8, 44),
            (9, 48),
            (10, 52),
            (11, 56),
            (12, 60),
            (13, 64),
            (14, 68),
            (15, 72),
        ]
    }

    fn pixel_slots() -> Vec<(usize, u8)> {
        (0..36).map(|slot| (slot, (slot * 4) as u8)).collect()
    }

    fn insert_permutations(library: &mut ShaderLibrary, raw: RawTechniqueId, handle: u32) {
        let vertex_layout = [BufferLayout::new(BufferHandle(handle), VS_WORDS); 3];
        let pixel_layout = [BufferLayout::new(BufferHandle(handle + 1), PS_WORDS); 3];
        library.insert_vertex(
            ShaderInstance::from_slots(to_vertex_technique(raw), ShaderHandle(handle), vertex_layout, &vertex_slots())
                .unwrap(),
        );
        library.insert_pixel(
            ShaderInstance::from_slots(to_pixel_technique(raw), ShaderHandle(handle + 1), pixel_layout, &pixel_slots())
                .unwrap(),
        );
    }

    fn requested(raw: RawTechniqueId) -> u32 {
        raw.bits().wrapping_add(REQUEST_BASE)
    }

    struct Harness {
        shader: LightingShader,
        renderer: RecordingRenderer,
        frame: FrameState,
        state: DrawState,
        writers: WriterLog,
        raw: RawTechniqueId,
    }

    impl Harness {
        fn new(raw: RawTechniqueId) -> Self {
            Self::with_config(raw, LightingConfig::default())
        }

        fn with_config(raw: RawTechniqueId, config: LightingConfig) -> Self {
            let mut library = ShaderLibrary::new();
            insert_permutations(&mut library, raw, 1);
            Self {
                shader: LightingShader::new(library, config),
                renderer: RecordingRenderer::new(),
                frame: FrameState::default(),
                state: DrawState::new(),
                writers: WriterLog::default(),
                raw,
            }
        }

        fn technique(&mut self) -> Result<(), TechniqueError> {
            let mut cx = DrawContext::new(&mut self.renderer, &self.frame, &mut self.state);
            self.shader.setup_technique(&mut cx, requested(self.raw))
        }

        fn restore_technique(&mut self) {
            let mut cx = DrawContext::new(&mut self.renderer, &self.frame, &mut self.state);
            self.shader.restore_technique(&mut cx);
        }

        fn material(&mut self, material: &ShaderMaterial) {
            let mut cx = DrawContext::new(&mut self.renderer, &self.frame, &mut self.state);
            self.shader.setup_material(&mut cx, material);
            self.shader.restore_material(&mut cx, material);
        }

        fn geometry(&mut self, pass: &RenderPass<'_>, flags: DrawFlags) {
            let mut cx = DrawContext::new(&mut self.renderer, &self.frame, &mut self.state);
            self.shader.setup_geometry(&mut cx, &mut self.writers, pass, flags);
        }

        fn restore_geometry(&mut self, pass: &RenderPass<'_>) {
            let mut cx = DrawContext::new(&mut self.renderer, &self.frame, &mut self.state);
            self.shader.restore_geometry(&mut cx, pass);
        }

        fn pixel<T: Pod>(&self, level: ConstantGroupLevel, param: PsParam<T>) -> Option<T> {
            let shader = self.shader.library().pixel(to_pixel_technique(self.state.raw))?;
            self.renderer.flushed_param(&**shader, level, param)
        }

        fn vertex<T: Pod>(&self, level: ConstantGroupLevel, param: VsParam<T>) -> Option<T> {
            let shader = self.shader.library().vertex(to_vertex_technique(self.state.raw))?;
            self.renderer.flushed_param(&**shader, level, param)
        }

        fn resource_binds(&self, slot: u32) -> usize {
            self.renderer
                .count(|c| matches!(c, RenderCommand::SetShaderResource { slot: s, .. } if *s == slot))
        }
    }

    fn raw(base: BaseTechnique, flags: TechniqueFlags) -> RawTechniqueId {
        RawTechniqueId::compose(base, flags)
    }

    fn fog(near: f32, far: f32) -> FogParams {
        FogParams {
            near_color: Vec3::new(0.25, 0.5, 0.75),
            far_color: Vec3::new(0.5, 0.25, 0.125),
            near,
            far,
            power: 3.0,
            clamp: 0.5,
        }
    }

    const TECHNIQUE: ConstantGroupLevel = ConstantGroupLevel::Technique;
    const MATERIAL: ConstantGroupLevel = ConstantGroupLevel::Material;
    const GEOMETRY: ConstantGroupLevel = ConstantGroupLevel::Geometry;

    // ========================================================================
    // Technique
    // ========================================================================

    #[test]
    fn test_missing_permutation_skips_draw() {
        let mut harness = Harness::new(raw(BaseTechnique::Glowmap, TechniqueFlags::empty()));
        harness.raw = raw(BaseTechnique::Parallax, TechniqueFlags::empty());

        let err = harness.technique().unwrap_err();

        assert!(matches!(err, TechniqueError::MissingVertexShader { .. }));
        assert!(harness.state.pair.is_none());
        assert_eq!(harness.state.raw, RawTechniqueId::default());
        assert!(harness.renderer.commands().is_empty());
    }

    #[test]
    fn test_fog_scale_adjust_from_distances() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.frame.fog = Some(fog(1.0, 2.0));
        harness.technique().unwrap();

        assert_eq!(harness.vertex(TECHNIQUE, vs::SCALE_ADJUST), Some([1.0, 1.0, 3.0, 0.5]));
        assert_eq!(harness.vertex(TECHNIQUE, vs::WIND), Some([0.25, 0.5, 0.75, 0.0]));
        assert_eq!(harness.pixel(TECHNIQUE, ps::FOG_COLOR), Some([0.25, 0.5, 0.75, 0.0]));
        assert_eq!(harness.vertex(TECHNIQUE, vs::FOG_FAR_COLOR), Some([0.5, 0.25, 0.125, 0.0]));
    }

    #[test]
    fn test_fog_fallback_when_distances_are_zero() {
        let mut config = LightingConfig::default();
        config.fog.scale_adjust_fallback = [0.0, 0.5, 1.0, 2.0];
        config.fog.wind_speed = 4.0;
        let mut harness = Harness::with_config(raw(BaseTechnique::None, TechniqueFlags::empty()), config);
        harness.frame.fog = Some(fog(0.0, 0.0));
        harness.technique().unwrap();

        assert_eq!(harness.vertex(TECHNIQUE, vs::SCALE_ADJUST), Some([0.0, 0.5, 1.0, 2.0]));
        assert_eq!(harness.pixel(TECHNIQUE, ps::FOG_COLOR), Some([0.25, 0.5, 0.75, 4.0]));
    }

    #[test]
    fn test_fog_off_leaves_constants_untouched() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        assert_eq!(harness.vertex(TECHNIQUE, vs::SCALE_ADJUST), Some([0.0; 4]));
        assert_eq!(harness.pixel(TECHNIQUE, ps::COLOUR_OUTPUT_CLAMP), Some([1.0, 1.0, 1.0, 0.0]));
    }

    #[test]
    fn test_shadow_mask_bound_and_released() {
        let flags = TechniqueFlags::SHADOW_DIR | TechniqueFlags::DEFSHADOW;
        let mut harness = Harness::new(raw(BaseTechnique::None, flags));
        harness.frame.textures.shadow_mask = Some(TextureHandle(50));
        harness.frame.shadow_viewport = UVec2::new(1024, 512);
        harness.frame.secondary_shadow = Some(SecondaryShadowTarget {
            enabled: true,
            bound: true,
        });
        harness.renderer.set_shader_resource(15, Some(TextureHandle(60)));

        harness.technique().unwrap();

        assert_eq!(harness.renderer.bound_texture(14), Some(TextureHandle(50)));
        assert_eq!(harness.renderer.address_mode(14), Some(AddressMode::CLAMP));
        assert_eq!(harness.renderer.filter_mode(14), Some(FilterMode::BILINEAR));
        assert_eq!(harness.pixel(TECHNIQUE, ps::VPOS_OFFSET), Some([1.0 / 1024.0, 1.0 / 512.0, 0.0, 0.0]));

        harness.restore_technique();

        assert_eq!(harness.renderer.bound_texture(14), None);
        assert_eq!(harness.renderer.bound_texture(15), None);
        assert!(harness.state.pair.is_none());
        assert!(harness.shader.library().active().is_none());
    }

    #[test]
    fn test_shadow_light_count_marks_shadowed_draw() {
        let base = raw(BaseTechnique::None, TechniqueFlags::DEFSHADOW).with_light_counts(1, 1);
        let mut config = LightingConfig::default();
        config.shadow.filter_quality = 4;
        let mut harness = Harness::with_config(base, config);
        harness.frame.textures.shadow_mask = Some(TextureHandle(50));

        harness.technique().unwrap();

        assert_eq!(harness.renderer.bound_texture(14), Some(TextureHandle(50)));
        assert_eq!(harness.renderer.filter_mode(14), Some(FilterMode::NEAREST));
    }

    #[test]
    fn test_unshadowed_technique_keeps_secondary_target() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::DEFSHADOW));
        harness.frame.secondary_shadow = Some(SecondaryShadowTarget {
            enabled: true,
            bound: false,
        });
        harness.renderer.set_shader_resource(15, Some(TextureHandle(60)));

        harness.technique().unwrap();
        assert_eq!(harness.resource_binds(14), 0);

        harness.restore_technique();
        // DEFSHADOW alone still releases slot 14
        assert_eq!(harness.resource_binds(14), 1);
        assert_eq!(harness.renderer.bound_texture(15), Some(TextureHandle(60)));
    }

    #[test]
    fn test_technique_tier_committed_once() {
        let mut harness = Harness::new(raw(BaseTechnique::Glowmap, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let commands = harness.renderer.commands();
        let flushes = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::FlushConstantGroup { level: ConstantGroupLevel::Technique, .. }))
            .count();
        assert_eq!(flushes, 2);
        assert_eq!(
            commands.last(),
            Some(&RenderCommand::ApplyConstantGroups {
                vertex: ShaderHandle(1),
                pixel: ShaderHandle(2),
                level: ConstantGroupLevel::Technique,
            })
        );
        assert_eq!(harness.renderer.filter_mode(6), Some(FilterMode::ANISOTROPIC));
    }

    #[test]
    fn test_mtland_overrides_every_slot() {
        let mut harness = Harness::new(raw(BaseTechnique::MtLand, TechniqueFlags::empty()));
        harness.frame.textures.land = Some(TextureHandle(33));
        harness.technique().unwrap();

        for slot in 0..16 {
            assert_eq!(harness.renderer.bound_texture(slot), Some(TextureHandle(33)));
            assert_eq!(harness.renderer.address_mode(slot), Some(AddressMode::WRAP));
        }
        assert_eq!(harness.renderer.filter_mode(14), Some(FilterMode::ANISOTROPIC));
        assert_eq!(harness.renderer.filter_mode(15), Some(FilterMode::BILINEAR));
    }

    #[test]
    fn test_lod_land_acceleration() {
        let mut harness = Harness::new(raw(BaseTechnique::LodLand, TechniqueFlags::empty()));
        harness.frame.camera_position = Vec3::new(100.0, 200.0, 0.0);
        harness.frame.lod_land_origin = Vec4::new(150.0, 250.0, 20.0, 40.0);
        harness.technique().unwrap();

        assert_eq!(harness.vertex(TECHNIQUE, vs::ACCELERATION), Some([50.0, 50.0, 5.0, 25.0]));
        assert_eq!(harness.renderer.filter_mode(0), Some(FilterMode::BILINEAR));
    }

    #[test]
    fn test_parallax_occlusion_kill_switch() {
        let mut config = LightingConfig::default();
        config.kill_switches.disable_parallax_occlusion = true;
        let mut harness = Harness::with_config(raw(BaseTechnique::None, TechniqueFlags::SPECULAR), config);
        harness.raw = raw(BaseTechnique::ParallaxOcc, TechniqueFlags::SPECULAR);

        harness.technique().unwrap();

        assert_eq!(harness.state.raw.base(), Some(BaseTechnique::None));
        assert!(harness.state.raw.flags().contains(TechniqueFlags::SPECULAR));
    }

    #[test]
    fn test_lod_land_noise_kill_switch() {
        let mut config = LightingConfig::default();
        config.kill_switches.disable_lod_land_noise = true;
        let mut harness = Harness::with_config(raw(BaseTechnique::LodLand, TechniqueFlags::empty()), config);
        harness.raw = raw(BaseTechnique::LodLandNoise, TechniqueFlags::empty());

        harness.technique().unwrap();

        assert_eq!(harness.state.raw.base(), Some(BaseTechnique::LodLand));
    }

    // ========================================================================
    // Material
    // ========================================================================

    #[test]
    fn test_material_without_technique_writes_nothing() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.material(&ShaderMaterial::default());
        assert!(harness.renderer.commands().is_empty());
    }

    #[test]
    fn test_texcoord_offset_and_scale() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.frame.texcoord_index = 1;
        harness.technique().unwrap();

        let mut material = ShaderMaterial::default();
        material.texcoord_offset[1] = Vec2::new(0.25, 0.5);
        material.texcoord_scale[1] = Vec2::new(2.0, 4.0);
        harness.material(&material);

        assert_eq!(harness.vertex(MATERIAL, vs::VELOCITY), Some([0.25, 0.5, 2.0, 4.0]));
    }

    #[test]
    fn test_glowmap_and_diffuse_normal_use_clamp_mode() {
        let mut harness = Harness::new(raw(BaseTechnique::Glowmap, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let material = ShaderMaterial {
            diffuse: Some(TextureHandle(1)),
            normal: Some(TextureHandle(2)),
            texture_clamp_mode: AddressMode::CLAMP_WRAP,
            ..ShaderMaterial::with_kind(MaterialKind::Glowmap {
                glow: Some(TextureHandle(3)),
            })
        };
        harness.material(&material);

        assert_eq!(harness.renderer.bound_texture(0), Some(TextureHandle(1)));
        assert_eq!(harness.renderer.bound_texture(1), Some(TextureHandle(2)));
        assert_eq!(harness.renderer.bound_texture(6), Some(TextureHandle(3)));
        for slot in [0, 1, 6] {
            assert_eq!(harness.renderer.address_mode(slot), Some(AddressMode::CLAMP_WRAP));
        }
    }

    #[test]
    fn test_diffuse_pool_index_redirects() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.frame.texture_pool = vec![None, Some(TextureHandle(77))];
        harness.technique().unwrap();

        let material = ShaderMaterial {
            diffuse: Some(TextureHandle(1)),
            diffuse_pool_index: Some(1),
            ..ShaderMaterial::default()
        };
        harness.material(&material);

        assert_eq!(harness.renderer.bound_texture(0), Some(TextureHandle(77)));
    }

    #[test]
    fn test_envmap_mask_falls_back_to_frame_default() {
        let mut harness = Harness::new(raw(BaseTechnique::Envmap, TechniqueFlags::empty()));
        harness.frame.textures.default_envmap_mask = Some(TextureHandle(90));
        harness.technique().unwrap();

        let material = ShaderMaterial::with_kind(MaterialKind::Envmap(EnvmapMaterial {
            envmap: Some(TextureHandle(10)),
            envmap_mask: None,
            envmap_scale: 2.0,
        }));
        harness.material(&material);

        assert_eq!(harness.renderer.bound_texture(4), Some(TextureHandle(10)));
        assert_eq!(harness.renderer.bound_texture(5), Some(TextureHandle(90)));
        assert_eq!(harness.pixel(MATERIAL, ps::ENVMAP_DATA), Some([2.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_parallax_occlusion_data_is_swapped() {
        let mut harness = Harness::new(raw(BaseTechnique::ParallaxOcc, TechniqueFlags::empty()));
        harness.technique().unwrap();

        harness.material(&ShaderMaterial::with_kind(MaterialKind::ParallaxOcc {
            height: Some(TextureHandle(4)),
            params: [8.0, 0.05],
        }));

        assert_eq!(harness.pixel(MATERIAL, ps::PARALLAX_OCC_DATA), Some([0.05, 8.0, 0.0, 0.0]));
        assert_eq!(harness.renderer.bound_texture(3), Some(TextureHandle(4)));
    }

    #[test]
    fn test_eye_centres() {
        let mut harness = Harness::new(raw(BaseTechnique::Eye, TechniqueFlags::empty()));
        harness.technique().unwrap();

        harness.material(&ShaderMaterial::with_kind(MaterialKind::Eye {
            envmap: EnvmapMaterial {
                envmap: None,
                envmap_mask: Some(TextureHandle(5)),
                envmap_scale: 0.5,
            },
            left_eye_center: Vec3::new(1.0, 2.0, 3.0),
            right_eye_center: Vec3::new(-1.0, 2.0, 3.0),
        }));

        assert_eq!(harness.vertex(MATERIAL, vs::COLOR2), Some([1.0, 2.0, 3.0, 0.0]));
        assert_eq!(harness.vertex(MATERIAL, vs::COLOR3), Some([-1.0, 2.0, 3.0, 0.0]));
        assert_eq!(harness.pixel(MATERIAL, ps::ENVMAP_DATA), Some([0.5, 1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_landscape_material() {
        let mut config = LightingConfig::default();
        config.snow.landscape_multi_normal_tiling_factor = 4;
        config.snow.lod_land_blend = true;
        let mut harness = Harness::with_config(raw(BaseTechnique::MtLand, TechniqueFlags::SNOW), config);
        harness.technique().unwrap();
        harness.renderer.clear_commands();

        let land = LandscapeMaterial {
            layers: smallvec![
                LandLayer {
                    diffuse: Some(TextureHandle(11)),
                    normal: Some(TextureHandle(21)),
                },
                LandLayer {
                    diffuse: Some(TextureHandle(12)),
                    normal: Some(TextureHandle(22)),
                },
            ],
            overlay: Some(TextureHandle(40)),
            noise: Some(TextureHandle(41)),
            lod_params: [1.0, 2.0, 3.0],
            is_snow: [1.0, 0.0, 1.0, 0.0, 1.0, 0.0],
            spec_power: [10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
        };
        let material = ShaderMaterial {
            diffuse: Some(TextureHandle(1)),
            normal: Some(TextureHandle(2)),
            texture_clamp_mode: AddressMode::CLAMP,
            ..ShaderMaterial::with_kind(MaterialKind::Landscape(Box::new(land)))
        };
        harness.material(&material);

        let r = &harness.renderer;
        assert_eq!(r.bound_texture(0), Some(TextureHandle(1)));
        assert_eq!(r.bound_texture(7), Some(TextureHandle(2)));
        assert_eq!(r.bound_texture(1), Some(TextureHandle(11)));
        assert_eq!(r.bound_texture(2), Some(TextureHandle(12)));
        assert_eq!(r.bound_texture(8), Some(TextureHandle(21)));
        assert_eq!(r.bound_texture(9), Some(TextureHandle(22)));
        assert_eq!(r.bound_texture(13), Some(TextureHandle(40)));
        assert_eq!(r.bound_texture(15), Some(TextureHandle(41)));
        assert_eq!(r.address_mode(1), Some(AddressMode::WRAP));
        assert_eq!(r.address_mode(13), Some(AddressMode::CLAMP));
        // Diffuse and normal are not rebound with the clamp mode
        assert_eq!(harness.resource_binds(1), 1);

        assert_eq!(harness.pixel(MATERIAL, ps::LOD_TEX_PARAMS), Some([1.0, 2.0, 1.0, 3.0]));
        assert_eq!(harness.pixel(MATERIAL, ps::LANDSCAPE_TEXTURE_1TO4_IS_SPEC_POWER), Some([10.0, 20.0, 30.0, 40.0]));
        assert_eq!(harness.pixel(MATERIAL, ps::LANDSCAPE_TEXTURE_5TO6_IS_SPEC_POWER), Some([50.0, 60.0, 0.0, 0.0]));
        assert_eq!(harness.pixel(MATERIAL, ps::LANDSCAPE_TEXTURE_1TO4_IS_SNOW), Some([1.0, 0.0, 1.0, 0.0]));
        assert_eq!(harness.pixel(MATERIAL, ps::LANDSCAPE_TEXTURE_5TO6_IS_SNOW), Some([1.0, 0.0, 0.0, 0.25]));
    }

    #[test]
    fn test_lod_land_noise_forces_slot_15_mode() {
        let mut harness = Harness::new(raw(BaseTechnique::LodLandNoise, TechniqueFlags::empty()));
        harness.technique().unwrap();

        harness.material(&ShaderMaterial::with_kind(MaterialKind::LodLand {
            noise: None,
            params: [0.5, 0.25, 0.125],
        }));

        assert_eq!(harness.resource_binds(15), 0);
        assert_eq!(harness.renderer.filter_mode(15), Some(FilterMode::BILINEAR));
        assert_eq!(harness.pixel(MATERIAL, ps::LOD_TEX_PARAMS), Some([0.5, 0.25, 0.0, 0.125]));
    }

    #[test]
    fn test_specular_soft_and_rim_lighting() {
        let flags = TechniqueFlags::SPECULAR
            | TechniqueFlags::MODELSPACENORMALS
            | TechniqueFlags::SOFT_LIGHTING
            | TechniqueFlags::RIM_LIGHTING
            | TechniqueFlags::BACK_LIGHTING;
        let mut harness = Harness::new(raw(BaseTechnique::None, flags));
        harness.technique().unwrap();
        harness.renderer.clear_commands();

        let material = ShaderMaterial {
            specular_color: Vec3::new(1.0, 0.5, 0.25),
            specular_color_scale: 2.0,
            specular_power: 30.0,
            lighting_effect: [0.3, 0.6],
            rim_soft_lighting: Some(TextureHandle(12)),
            specular_back_lighting: Some(TextureHandle(9)),
            ..ShaderMaterial::default()
        };
        harness.material(&material);

        assert_eq!(harness.pixel(MATERIAL, ps::SPECULAR_COLOR), Some([2.0, 1.0, 0.5, 30.0]));
        assert_eq!(harness.pixel(MATERIAL, ps::LIGHTING_EFFECT_PARAMS), Some([0.3, 0.6, 0.0, 0.0]));
        assert_eq!(harness.renderer.bound_texture(12), Some(TextureHandle(12)));
        assert_eq!(harness.renderer.bound_texture(2), Some(TextureHandle(9)));
        assert_eq!(harness.renderer.bound_texture(9), Some(TextureHandle(9)));
        assert_eq!(harness.renderer.filter_mode(2), Some(FilterMode::ANISOTROPIC));
        // Soft and rim lighting bind slot 12 independently
        assert_eq!(harness.resource_binds(12), 2);
    }

    #[test]
    fn test_snow_and_character_light() {
        let flags = TechniqueFlags::SNOW | TechniqueFlags::CHARACTER_LIGHT | TechniqueFlags::AMBIENT_SPECULAR;
        let mut harness = Harness::new(raw(BaseTechnique::None, flags));
        harness.frame.texture_pool = vec![Some(TextureHandle(5)), Some(TextureHandle(6))];
        harness.frame.character_light_probe = Some(1);
        harness.frame.ibl.scale = 0.5;
        harness.frame.ibl.use_primary = false;
        harness.frame.ibl.secondary = Vec3::new(0.1, 0.2, 0.3);
        harness.technique().unwrap();

        harness.material(&ShaderMaterial::default());

        let config = LightingConfig::default();
        assert_eq!(harness.pixel(MATERIAL, ps::SNOW_RIM_LIGHT_PARAMETERS), Some(config.snow_rim_light_parameters()));
        assert_eq!(harness.pixel(MATERIAL, ps::CHARACTER_LIGHT_PARAMS), Some(config.character_light.params));
        assert_eq!(
            harness.pixel(MATERIAL, ps::AMBIENT_SPECULAR_TINT_AND_FRESNEL_POWER),
            Some(config.character_light.ambient_specular)
        );
        assert_eq!(harness.pixel(MATERIAL, ps::IBL_PARAMS), Some([0.5, 0.1, 0.2, 0.3]));
        assert_eq!(harness.renderer.bound_texture(11), Some(TextureHandle(6)));
        assert_eq!(harness.renderer.address_mode(11), Some(AddressMode::CLAMP));
    }

    #[test]
    fn test_mismatched_material_still_writes_common_constants() {
        let mut harness = Harness::new(raw(BaseTechnique::Envmap, TechniqueFlags::empty()));
        harness.technique().unwrap();

        harness.material(&ShaderMaterial::with_kind(MaterialKind::Glowmap {
            glow: Some(TextureHandle(3)),
        }));

        assert_eq!(harness.resource_binds(4), 0);
        assert_eq!(harness.resource_binds(6), 0);
        assert_eq!(harness.vertex(MATERIAL, vs::VELOCITY), Some([0.0, 0.0, 1.0, 1.0]));
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    fn geometry_at(translation: Vec3, scale: f32) -> MeshGeometry {
        MeshGeometry::at(WorldTransform {
            rotation: Mat3::IDENTITY,
            translation,
            scale,
        })
    }

    #[test]
    fn test_envmap_end_to_end() {
        let mut harness = Harness::new(raw(BaseTechnique::Envmap, TechniqueFlags::empty()));
        harness.frame.fog = Some(fog(1.0, 2.0));
        harness.frame.previous_pos_adjust = Vec3::new(1.0, 0.0, 0.0);

        assert!(harness.technique().is_ok());
        assert_eq!(harness.renderer.filter_mode(4), Some(FilterMode::ANISOTROPIC));
        assert_eq!(harness.renderer.filter_mode(5), Some(FilterMode::ANISOTROPIC));
        assert_eq!(harness.pixel(TECHNIQUE, ps::FOG_COLOR), Some([0.25, 0.5, 0.75, 0.0]));
        assert_eq!(harness.pixel(TECHNIQUE, ps::COLOUR_OUTPUT_CLAMP), Some([1.0, 1.0, 1.0, 0.0]));

        harness.material(&ShaderMaterial::with_kind(MaterialKind::Envmap(EnvmapMaterial {
            envmap: None,
            envmap_mask: None,
            envmap_scale: 0.75,
        })));
        assert_eq!(harness.pixel(MATERIAL, ps::ENVMAP_DATA), Some([0.75, 0.0, 0.0, 0.0]));
        assert_eq!(harness.renderer.bound_texture(4), None);
        assert_eq!(harness.renderer.bound_texture(5), None);

        let geometry = geometry_at(Vec3::new(10.0, 20.0, 30.0), 1.0);
        let property = ShaderProperty {
            lod_fade: 0.25,
            ..ShaderProperty::default()
        };
        let pass = RenderPass::new(&geometry, &property);
        harness.geometry(&pass, DrawFlags::empty());

        let world = geometry.world.to_matrix();
        let previous = geometry.world.to_matrix_adjusted(Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(harness.vertex(GEOMETRY, vs::WORLD_VIEW_PROJ), Some(float3x4(&world)));
        assert_eq!(harness.vertex(GEOMETRY, vs::PREV_WORLD_VIEW_PROJ), Some(float3x4(&previous)));
        assert_eq!(harness.pixel(GEOMETRY, ps::MATERIAL_DATA), Some([0.25, 0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_skinned_draw_skips_world_matrices() {
        let mut harness = Harness::new(raw(BaseTechnique::Envmap, TechniqueFlags::SKINNED));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::new(10.0, 20.0, 30.0), 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.vertex(GEOMETRY, vs::WORLD_VIEW_PROJ), Some([0.0; 12]));
        assert_eq!(harness.vertex(GEOMETRY, vs::PREV_WORLD_VIEW_PROJ), Some([0.0; 12]));
    }

    #[test]
    fn test_current_as_previous_flag() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = MeshGeometry {
            world: WorldTransform::from_translation(Vec3::new(5.0, 0.0, 0.0)),
            previous_world: WorldTransform::from_translation(Vec3::new(4.0, 0.0, 0.0)),
            projected_uv: None,
        };
        let property = ShaderProperty::default();
        let pass = RenderPass::new(&geometry, &property);

        harness.geometry(&pass, DrawFlags::empty());
        assert_eq!(
            harness.vertex(GEOMETRY, vs::PREV_WORLD_VIEW_PROJ),
            Some(float3x4(&geometry.previous_world.to_matrix()))
        );

        harness.geometry(&pass, DrawFlags::CURRENT_AS_PREVIOUS);
        assert_eq!(harness.vertex(GEOMETRY, vs::PREV_WORLD_VIEW_PROJ), Some(float3x4(&geometry.world.to_matrix())));
    }

    #[test]
    fn test_light_counts_and_point_light_delegate() {
        let technique = raw(BaseTechnique::None, TechniqueFlags::empty()).with_light_counts(3, 2);
        let mut harness = Harness::new(technique);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 2.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.pixel(GEOMETRY, ps::NUM_LIGHT_NUM_SHADOW_LIGHT), Some([3.0, 2.0]));
        let request = harness.writers.point_lights[0];
        assert_eq!((request.light_count, request.shadow_light_count), (3, 2));
        assert_eq!(request.scale, 2.0);
        assert!(request.model_space);
    }

    #[test]
    fn test_envmap_point_lights_use_unit_scale() {
        let technique = raw(BaseTechnique::Envmap, TechniqueFlags::empty()).with_light_counts(1, 0);
        let mut harness = Harness::new(technique);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 2.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.writers.point_lights[0].scale, 1.0);
        assert!(!harness.writers.point_lights[0].model_space);
        assert_eq!(harness.writers.directional_ambient, vec![false]);
    }

    #[test]
    fn test_no_lights_skips_point_light_delegate() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert!(harness.writers.point_lights.is_empty());
        assert_eq!(harness.pixel(GEOMETRY, ps::NUM_LIGHT_NUM_SHADOW_LIGHT), Some([0.0, 0.0]));
    }

    #[test]
    fn test_directional_light_in_model_space() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.frame.light_intensity = 0.5;
        harness.technique().unwrap();

        let geometry = MeshGeometry::at(WorldTransform {
            rotation: Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2),
            translation: Vec3::new(3.0, 0.0, 0.0),
            scale: 1.0,
        });
        let property = ShaderProperty {
            emit_color: Vec3::new(1.0, 0.5, 0.0),
            emit_mult: 2.0,
            ..ShaderProperty::default()
        };
        let lights = [SceneLight {
            color: Vec3::new(1.0, 0.5, 0.25),
            dimmer: 2.0,
            direction: Vec3::new(-1.0, 0.0, 0.0),
        }];
        harness.geometry(&RenderPass::new(&geometry, &property).with_lights(&lights), DrawFlags::empty());

        assert_eq!(harness.pixel(GEOMETRY, ps::DIR_LIGHT_COLOR), Some([1.0, 0.5, 0.25]));
        // +X in world is -Y in the rotated model frame
        let direction = harness.pixel(GEOMETRY, ps::DIR_LIGHT_DIRECTION).unwrap();
        assert!((Vec3::from_array(direction) - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5);
        assert_eq!(harness.pixel(GEOMETRY, ps::EMIT_COLOR), Some([2.0, 1.0, 0.0, 0.0]));
        assert_eq!(harness.writers.directional_ambient, vec![true]);
    }

    #[test]
    fn test_lod_fading_alpha() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let mut property = ShaderProperty {
            alpha: 0.5,
            ..ShaderProperty::default()
        };
        property.material.lod_fade_alpha = 0.5;

        harness.geometry(&RenderPass::new(&geometry, &property).with_lod_mode(0x80), DrawFlags::empty());
        assert_eq!(harness.pixel(GEOMETRY, ps::MATERIAL_DATA).map(|d| d[2]), Some(0.25));

        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());
        assert_eq!(harness.pixel(GEOMETRY, ps::MATERIAL_DATA).map(|d| d[2]), Some(0.5));
    }

    #[test]
    fn test_precipitation_occlusion_positions() {
        let mut harness = Harness::new(raw(BaseTechnique::Envmap, TechniqueFlags::empty()));
        harness.frame.accumulator_eye_position = Vec3::new(10.0, 20.0, 30.0);
        harness.frame.camera_position = Vec3::new(1.0, 2.0, 3.0);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());
        assert_eq!(
            harness.vertex(GEOMETRY, vs::PRECIPITATION_OCCLUSION_WORLD_VIEW_PROJ),
            Some([9.0, 18.0, 27.0])
        );

        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::SPECULAR));
        harness.frame.accumulator_eye_position = Vec3::new(10.0, 20.0, 30.0);
        harness.technique().unwrap();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());
        assert_eq!(
            harness.vertex(GEOMETRY, vs::PRECIPITATION_OCCLUSION_WORLD_VIEW_PROJ),
            Some([5.0, 20.0, 30.0])
        );
    }

    #[test]
    fn test_no_precipitation_without_lighting_effects() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.frame.accumulator_eye_position = Vec3::new(10.0, 20.0, 30.0);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.vertex(GEOMETRY, vs::PRECIPITATION_OCCLUSION_WORLD_VIEW_PROJ), Some([0.0; 3]));
    }

    #[test]
    fn test_land_fade_completes() {
        let mut harness = Harness::new(raw(BaseTechnique::MtLand, TechniqueFlags::empty()));
        harness.frame.land_fade.time = 100.0;
        harness.frame.land_fade.start_time = 0.0;
        harness.frame.land_fade.duration = 1.0;
        harness.frame.land_fade.to = Vec2::new(50.0, 60.0);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::new(10.0, 20.0, 0.0), 1.0);
        let property = ShaderProperty {
            land_fade_params: [0.5, 0.75],
            ..ShaderProperty::default()
        };
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.vertex(GEOMETRY, vs::F_VARS0), Some([0.5, 0.75, 40.0, 40.0]));
        assert!(!harness.state.land_fade_active);
    }

    #[test]
    fn test_land_fade_in_progress_stays_active() {
        let mut harness = Harness::new(raw(BaseTechnique::MtLandLodBlend, TechniqueFlags::empty()));
        harness.frame.land_fade.time = 5.0;
        harness.frame.land_fade.duration = 2.0;
        harness.frame.land_fade.to = Vec2::new(100.0, 0.0);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.vertex(GEOMETRY, vs::F_VARS0), Some([0.0, 0.0, 50.0, 0.0]));
        assert!(harness.state.land_fade_active);
    }

    #[test]
    fn test_tree_delegates_instance_constants() {
        let mut harness = Harness::new(raw(BaseTechnique::Tree, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.writers.tree_instances, 1);
    }

    #[test]
    fn test_geometry_with_no_external_writers() {
        let technique = raw(BaseTechnique::Tree, TechniqueFlags::PROJECTED_UV).with_light_counts(2, 0);
        let mut harness = Harness::new(technique);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        let pass = RenderPass::new(&geometry, &property);
        let writers: &mut dyn ConstantWriters = &mut NoExternalWriters;
        {
            let mut cx = DrawContext::new(&mut harness.renderer, &harness.frame, &mut harness.state);
            harness.shader.setup_geometry(&mut cx, writers, &pass, DrawFlags::empty());
        }

        assert_eq!(harness.pixel(GEOMETRY, ps::NUM_LIGHT_NUM_SHADOW_LIGHT), Some([2.0, 0.0]));
        assert!(harness.writers.point_lights.is_empty());
    }

    #[test]
    fn test_projected_uv_from_geometry() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::PROJECTED_UV));
        harness.frame.textures.projected_diffuse = Some(TextureHandle(1));
        harness.frame.textures.projected_normal = Some(TextureHandle(2));
        harness.frame.textures.projected_noise = Some(TextureHandle(3));
        harness.frame.textures.projected_normal_detail = Some(TextureHandle(4));
        harness.technique().unwrap();

        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let geometry = MeshGeometry {
            projected_uv: Some(transform),
            ..geometry_at(Vec3::ZERO, 1.0)
        };
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.vertex(GEOMETRY, vs::F_VARS3), Some(float3x4(&transform)));
        assert_eq!(harness.writers.projected_uv, vec![true]);
        for (slot, texture) in [(11, 1), (3, 2), (8, 3), (10, 4)] {
            assert_eq!(harness.renderer.bound_texture(slot), Some(TextureHandle(texture)));
            assert_eq!(harness.renderer.filter_mode(slot), Some(FilterMode::BILINEAR));
        }
    }

    #[test]
    fn test_projected_uv_basis_for_envmap() {
        let mut harness = Harness::new(raw(BaseTechnique::Envmap, TechniqueFlags::PROJECTED_UV));
        harness.frame.camera_position = Vec3::new(7.0, 8.0, 9.0);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::new(100.0, 0.0, 0.0), 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(
            harness.vertex(GEOMETRY, vs::F_VARS3),
            Some([1.0, 0.0, 0.0, 7.0, 0.0, 0.0, 0.0, 8.0, 0.0, 0.0, 1.0, 9.0])
        );
        assert_eq!(harness.writers.projected_uv, vec![false]);
        // No projected normal texture, so only the decal is bound
        assert_eq!(harness.resource_binds(3), 0);
    }

    #[test]
    fn test_projected_normals_respect_draw_flag() {
        let mut config = LightingConfig::default();
        config.projected_uv.normals_respect_draw_flag = true;
        let mut harness = Harness::with_config(raw(BaseTechnique::None, TechniqueFlags::PROJECTED_UV), config);
        harness.frame.textures.projected_normal = Some(TextureHandle(2));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::NO_PROJECTED_NORMALS);

        assert_eq!(harness.resource_binds(11), 1);
        assert_eq!(harness.resource_binds(3), 0);
    }

    #[test]
    fn test_hair_ignores_projected_uv() {
        let mut harness = Harness::new(raw(BaseTechnique::Hair, TechniqueFlags::PROJECTED_UV));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.resource_binds(11), 0);
        assert!(harness.writers.projected_uv.is_empty());
    }

    #[test]
    fn test_world_map_overlay() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::WORLD_MAP));
        harness.frame.textures.world_map = [Some(TextureHandle(12)), Some(TextureHandle(13))];
        harness.frame.world_map_colors = [Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 0.5)];
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        harness.geometry(&RenderPass::new(&geometry, &property), DrawFlags::empty());

        assert_eq!(harness.renderer.bound_texture(12), Some(TextureHandle(12)));
        assert_eq!(harness.renderer.bound_texture(13), Some(TextureHandle(13)));
        assert_eq!(harness.vertex(GEOMETRY, vs::COLOR1), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(harness.pixel(GEOMETRY, ps::WORLD_MAP_OVERLAY_PARAMETERS), Some([0.0, 1.0, 0.0, 0.5]));
    }

    #[test]
    fn test_ssr_params() {
        let mut config = LightingConfig::default();
        config.ssr.fade_start = 10.0;
        config.ssr.fade_range = 5.0;
        config.ssr.global_scale = 0.5;
        let mut harness = Harness::with_config(raw(BaseTechnique::None, TechniqueFlags::SPECULAR), config);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty {
            lod_fade: 0.75,
            ..ShaderProperty::default()
        };
        let pass = RenderPass::new(&geometry, &property);

        harness.geometry(&pass, DrawFlags::empty());
        assert_eq!(harness.pixel(GEOMETRY, ps::SSR_PARAMS), Some([10.0, 15.0, 0.5, 0.75]));
        assert_eq!(harness.pixel(GEOMETRY, ps::MATERIAL_DATA).map(|d| d[1]), Some(0.75));

        harness.geometry(&pass, DrawFlags::NO_SSR);
        assert_eq!(harness.pixel(GEOMETRY, ps::SSR_PARAMS), Some([10.0, 15.0, 0.5, 0.0]));
    }

    // ========================================================================
    // Pipeline State
    // ========================================================================

    #[test]
    fn test_depth_override_restores_cached_mode() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty {
            flags: PropertyFlags::ZBUFFER_TEST,
            ..ShaderProperty::default()
        };
        let pass = RenderPass::new(&geometry, &property);

        harness.geometry(&pass, DrawFlags::empty());
        assert_eq!(harness.renderer.current_depth_mode(), DepthMode::TEST);
        assert_eq!(harness.state.saved_depth, SavedState::Set(DepthMode::TEST_WRITE));

        harness.restore_geometry(&pass);
        assert_eq!(harness.renderer.current_depth_mode(), DepthMode::TEST_WRITE);
        assert_eq!(harness.state.saved_depth, SavedState::Unset);
    }

    #[test]
    fn test_depth_override_without_both_bits_caches_intermediate() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty {
            flags: PropertyFlags::empty(),
            ..ShaderProperty::default()
        };
        let pass = RenderPass::new(&geometry, &property);

        harness.geometry(&pass, DrawFlags::empty());
        assert_eq!(harness.renderer.current_depth_mode(), DepthMode::DISABLED);

        harness.restore_geometry(&pass);
        assert_eq!(harness.renderer.current_depth_mode(), DepthMode::TEST);
    }

    #[test]
    fn test_depth_written_without_override_when_both_bits_set() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.renderer = RecordingRenderer::new().with_depth_mode(DepthMode::TEST_EQUAL);
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        let pass = RenderPass::new(&geometry, &property);
        harness.geometry(&pass, DrawFlags::empty());

        assert!(harness.renderer.commands().contains(&RenderCommand::SetDepthMode(DepthMode::TEST_EQUAL)));
        assert!(!harness.state.saved_depth.is_set());

        harness.renderer.clear_commands();
        harness.restore_geometry(&pass);
        assert!(harness.renderer.commands().is_empty());
    }

    #[test]
    fn test_keep_depth_hints_leave_depth_alone() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty {
            flags: PropertyFlags::empty(),
            ..ShaderProperty::default()
        };
        harness.geometry(
            &RenderPass::new(&geometry, &property).with_accumulation_hint(AccumulationHint::KEEP_DEPTH_A),
            DrawFlags::empty(),
        );

        assert_eq!(harness.renderer.count(|c| matches!(c, RenderCommand::SetDepthMode(_))), 0);
    }

    #[test]
    fn test_lod_stencil_reference_and_reset() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let mut property = ShaderProperty::default();
        property.material.lod_stencil_alpha = 0.5;
        property.material.lod_fade_alpha = 1.0;
        let pass = RenderPass::new(&geometry, &property).with_accumulation_hint(AccumulationHint::LOD_STENCIL);

        harness.geometry(&pass, DrawFlags::empty());
        assert_eq!(harness.renderer.stencil(), (StencilMode::LOD_FADE_WRITE, 15));

        harness.restore_geometry(&pass);
        assert_eq!(harness.renderer.stencil(), (StencilMode::DISABLED, 0xFF));

        harness.geometry(&pass.with_lod_mode(0x80), DrawFlags::empty());
        assert_eq!(harness.renderer.stencil(), (StencilMode::LOD_FADE_WRITE, 31));
    }

    #[test]
    fn test_blend_override_on_accumulation_hint() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::empty()));
        harness.renderer = RecordingRenderer::new().with_blend_mode(BlendMode(5));
        harness.technique().unwrap();

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        let pass = RenderPass::new(&geometry, &property).with_accumulation_hint(AccumulationHint::KEEP_DEPTH_BLEND);

        harness.geometry(&pass, DrawFlags::empty());
        assert_eq!(harness.renderer.current_alpha_blend_mode(), BlendMode::ACCUMULATE);
        assert_eq!(harness.renderer.count(|c| matches!(c, RenderCommand::SetDepthMode(_))), 0);

        harness.restore_geometry(&pass);
        assert_eq!(harness.renderer.current_alpha_blend_mode(), BlendMode(5));
        assert!(!harness.state.saved_blend.is_set());
    }

    #[test]
    fn test_full_draw_commits_tiers_in_order() {
        let mut harness = Harness::new(raw(BaseTechnique::None, TechniqueFlags::SPECULAR));
        harness.renderer = RecordingRenderer::new().with_ring(VS_WORDS);
        harness.technique().unwrap();
        harness.material(&ShaderMaterial::default());

        let geometry = geometry_at(Vec3::ZERO, 1.0);
        let property = ShaderProperty::default();
        let pass = RenderPass::new(&geometry, &property);
        harness.geometry(&pass, DrawFlags::empty());
        harness.restore_geometry(&pass);
        harness.restore_technique();

        let applied: Vec<_> = harness
            .renderer
            .commands()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::ApplyConstantGroups { level, .. } => Some(*level),
                _ => None,
            })
            .collect();
        assert_eq!(applied, ConstantGroupLevel::TIERS.to_vec());

        let ring_maps = harness.renderer.count(|c| {
            matches!(
                c,
                RenderCommand::MapConstantGroup {
                    stage: crate::shader::StageKind::Vertex,
                    placement: crate::facade::BufferPlacement::Ring { .. },
                    ..
                }
            )
        });
        assert_eq!(ring_maps, 3);
    }
}
