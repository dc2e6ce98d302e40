use glam::{Mat3, Mat4, Vec3};
use technique_common::{BaseTechnique, TechniqueFlags};

use super::{LightingShader, bind_texture, commit};
use crate::constants::{ConstantGroup, ConstantGroupLevel, float3x4, ps, vs};
use crate::context::{DrawContext, DrawState, SavedState};
use crate::facade::{AddressMode, BlendMode, DepthMode, FilterMode, RendererFacade, StencilMode};
use crate::frame::FrameState;
use crate::scene::{
    AccumulationHint, DrawFlags, InverseWorldSource, PropertyFlags, RenderPass, WorldTransform, inverse_world_matrix,
};
use crate::shader::Vertex;
use crate::writers::{ConstantWriters, PointLightRequest};

/// Stencil reference scale for LOD stencil passes
const LOD_STENCIL_SCALE: f32 = 31.0;

impl LightingShader {
    /// Write transforms, lights and per-draw state into the geometry tier
    ///
    /// Called once per draw after material setup. Pipeline state changed here
    /// (stencil, depth, blend) is undone by [`LightingShader::restore_geometry`].
    pub fn setup_geometry<R, W>(&self, cx: &mut DrawContext<'_, R>, writers: &mut W, pass: &RenderPass<'_>, flags: DrawFlags)
    where
        R: RendererFacade,
        W: ConstantWriters + ?Sized,
    {
        let Some(pair) = cx.state.pair.clone() else {
            tracing::warn!("geometry setup without an active technique");
            return;
        };

        let raw = cx.state.raw;
        let technique = raw.flags();
        let base = raw.base();
        let renderer = &mut *cx.renderer;
        let frame = cx.frame;
        let property = pass.property;
        let world = pass.geometry.world_transform();

        let mut vertex = renderer.get_shader_constant_group(&pair.vertex, ConstantGroupLevel::Geometry);
        let mut pixel = renderer.get_shader_constant_group(&pair.pixel, ConstantGroupLevel::Geometry);

        let skinned = technique.contains(TechniqueFlags::SKINNED);
        let mut model_space = !skinned;
        let mut precipitation = false;
        let mut is_lod = false;

        if pass.accumulation_hint == AccumulationHint::KEEP_DEPTH_BLEND && property.flags.contains(PropertyFlags::ZBUFFER_WRITE) {
            cx.state.saved_blend = SavedState::Set(renderer.current_alpha_blend_mode());
            renderer.set_alpha_blend_mode(BlendMode::ACCUMULATE);
        }

        match base {
            Some(BaseTechnique::Envmap | BaseTechnique::MultiLayerParallax | BaseTechnique::Eye) => {
                if !skinned {
                    vertex.set(vs::WORLD_VIEW_PROJ, float3x4(&world.to_matrix()));
                }
                model_space = false;
                precipitation = true;
                pixel.param_mut(ps::MATERIAL_DATA)[0] = property.lod_fade;
            }
            Some(BaseTechnique::MtLand | BaseTechnique::MtLandLodBlend) => {
                write_land_fade(frame, cx.state, &mut vertex, world.translation, property.land_fade_params);
            }
            Some(BaseTechnique::LodLand | BaseTechnique::LodObj | BaseTechnique::LodObjHd) => {
                vertex.set(vs::WORLD_VIEW_PROJ, float3x4(&world.to_matrix()));
                vertex.set(vs::PREV_WORLD_VIEW_PROJ, float3x4(&world.to_matrix_adjusted(frame.previous_pos_adjust)));
                is_lod = true;
            }
            Some(BaseTechnique::Tree) => {
                writers.write_tree_instance(&mut vertex, property);
            }
            _ => {}
        }

        if !skinned && !is_lod {
            let previous = if flags.contains(DrawFlags::CURRENT_AS_PREVIOUS) {
                world
            } else {
                pass.geometry.previous_world_transform()
            };
            vertex.set(vs::WORLD_VIEW_PROJ, float3x4(&world.to_matrix()));
            vertex.set(vs::PREV_WORLD_VIEW_PROJ, float3x4(&previous.to_matrix_adjusted(frame.previous_pos_adjust)));
        }

        let inverse_world = inverse_world_matrix(world, frame.camera_position, InverseWorldSource::Transform);

        match pass.directional_light() {
            Some(light) => {
                let intensity = frame.light_intensity * light.dimmer;
                pixel.set(ps::DIR_LIGHT_COLOR, (light.color * intensity).to_array());

                let mut direction = -light.direction;
                if model_space {
                    direction = inverse_world.transform_vector3(direction);
                }
                pixel.set(ps::DIR_LIGHT_DIRECTION, direction.normalize_or_zero().to_array());
            }
            None => tracing::trace!("pass has no directional light"),
        }
        writers.write_directional_ambient(&mut pixel, world, model_space);

        let alpha = if pass.lod_fading() {
            property.alpha * property.material.lod_fade_alpha
        } else {
            property.alpha
        };
        pixel.param_mut(ps::MATERIAL_DATA)[2] = alpha;

        let emit = property.emit_color * property.emit_mult;
        pixel.param_mut(ps::EMIT_COLOR)[..3].copy_from_slice(&emit.to_array());

        let light_count = raw.light_count();
        let shadow_light_count = raw.shadow_light_count();
        pixel.set(ps::NUM_LIGHT_NUM_SHADOW_LIGHT, [light_count as f32, shadow_light_count as f32]);

        if light_count > 0 {
            let scale = match base {
                Some(BaseTechnique::Envmap | BaseTechnique::Eye) => 1.0,
                _ => world.scale,
            };
            let request = PointLightRequest {
                inverse_world,
                light_count,
                shadow_light_count,
                scale,
                model_space,
            };
            writers.write_point_lights(&mut pixel, pass, &request);
        }

        if technique.contains(TechniqueFlags::SPECULAR) {
            pixel.param_mut(ps::MATERIAL_DATA)[1] = property.lod_fade;
            precipitation = true;
        }

        if technique.intersects(TechniqueFlags::PRECIPITATION_OCCLUSION) {
            precipitation = true;
        }

        let projected = &self.config.projected_uv;
        let enable_normals =
            projected.enable_normals && (!flags.contains(DrawFlags::NO_PROJECTED_NORMALS) || !projected.normals_respect_draw_flag);

        if technique.contains(TechniqueFlags::PROJECTED_UV) && base != Some(BaseTechnique::Hair) {
            renderer.set_shader_resource(11, frame.textures.projected_diffuse);
            renderer.set_texture_mode(11, AddressMode::WRAP, FilterMode::BILINEAR);

            if enable_normals && frame.textures.projected_normal.is_some() {
                for (slot, texture) in [
                    (3, frame.textures.projected_normal),
                    (8, frame.textures.projected_noise),
                    (10, frame.textures.projected_normal_detail),
                ] {
                    renderer.set_shader_resource(slot, texture);
                    renderer.set_texture_mode(slot, AddressMode::WRAP, FilterMode::BILINEAR);
                }
            }

            match pass.geometry.projected_uv_transform() {
                Some(transform) => {
                    vertex.set(vs::F_VARS3, float3x4(&transform));
                    writers.write_projected_uv(&mut pixel, Some(pass.geometry), property, enable_normals);
                }
                None => {
                    let dont_multiply = base == Some(BaseTechnique::Envmap);
                    let transform = self.projected_uv_basis(world, frame.camera_position, dont_multiply);
                    vertex.set(vs::F_VARS3, float3x4(&transform));
                    writers.write_projected_uv(&mut pixel, None, property, enable_normals);
                }
            }
        }

        if technique.contains(TechniqueFlags::WORLD_MAP) {
            bind_texture(renderer, 12, frame.textures.world_map[0], AddressMode::WRAP);
            bind_texture(renderer, 13, frame.textures.world_map[1], AddressMode::WRAP);
            vertex.set(vs::COLOR1, frame.world_map_colors[0].to_array());
            pixel.set(ps::WORLD_MAP_OVERLAY_PARAMETERS, frame.world_map_colors[1].to_array());
        }

        if precipitation {
            let eye = frame.accumulator_eye_position;
            let position = if model_space {
                inverse_world.transform_point3(eye)
            } else {
                eye - frame.camera_position
            };
            vertex.set(vs::PRECIPITATION_OCCLUSION_WORLD_VIEW_PROJ, position.to_array());
        }

        if pass.accumulation_hint == AccumulationHint::LOD_STENCIL {
            let material = &property.material;
            let value = if pass.lod_fading() {
                material.lod_fade_alpha
            } else {
                material.lod_stencil_alpha
            };
            let reference = ((value * LOD_STENCIL_SCALE) as u32) & 0xFF;
            renderer.set_stencil_mode(StencilMode::LOD_FADE_WRITE, reference);
        }

        if !pass.accumulation_hint.keeps_depth_mode() {
            let mut mode = renderer.current_depth_mode();
            if !property.flags.contains(PropertyFlags::ZBUFFER_WRITE) {
                cx.state.saved_depth = SavedState::Set(mode);
                mode = DepthMode::TEST;
            }
            // Caches the already-overridden mode when both bits are clear
            if !property.flags.contains(PropertyFlags::ZBUFFER_TEST) {
                cx.state.saved_depth = SavedState::Set(mode);
                mode = DepthMode::DISABLED;
            }
            renderer.set_depth_mode(mode);
        }

        let ssr = &self.config.ssr;
        let reflect = if flags.contains(DrawFlags::NO_SSR) { 0.0 } else { 1.0 };
        let specular = if technique.contains(TechniqueFlags::SPECULAR) {
            property.lod_fade
        } else {
            0.0
        };
        pixel.set(
            ps::SSR_PARAMS,
            [ssr.fade_start, ssr.fade_start + ssr.fade_range, ssr.global_scale, reflect * specular],
        );

        commit(renderer, &vertex, &pixel, ConstantGroupLevel::Geometry);
    }

    /// Undo the stencil, depth and blend changes of geometry setup
    pub fn restore_geometry<R: RendererFacade>(&self, cx: &mut DrawContext<'_, R>, pass: &RenderPass<'_>) {
        if pass.accumulation_hint == AccumulationHint::LOD_STENCIL {
            cx.renderer.set_stencil_mode(StencilMode::DISABLED, 0xFF);
        }

        if let Some(mode) = cx.state.saved_depth.take() {
            cx.renderer.set_depth_mode(mode);
        }

        if let Some(mode) = cx.state.saved_blend.take() {
            cx.renderer.set_alpha_blend_mode(mode);
        }
    }

    /// Projected UV transform for geometry without its own
    ///
    /// The basis is seeded from config and placed at the camera. Unless
    /// `dont_multiply` is set it is followed by the camera-relative world transform.
    fn projected_uv_basis(&self, world: &WorldTransform, camera: Vec3, dont_multiply: bool) -> Mat4 {
        let [s0, s1, s2, s3] = self.config.projected_uv.basis_seed;
        let rows = [[s0, s1, s2], [s3, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let basis = WorldTransform {
            rotation: Mat3::from_cols_array_2d(&rows).transpose(),
            translation: camera,
            scale: 1.0,
        }
        .to_matrix();

        if dont_multiply {
            basis
        } else {
            world.to_matrix_adjusted(-camera) * basis
        }
    }
}

/// Land LOD fade constant (fVars0); clears the fade flag once complete
fn write_land_fade(
    frame: &FrameState,
    state: &mut DrawState,
    vertex: &mut ConstantGroup<'_, Vertex>,
    translation: Vec3,
    params: [f32; 2],
) {
    let factor = frame.land_fade.factor();
    let position = frame.land_fade.position(factor);
    if factor == 1.0 {
        state.land_fade_active = false;
    }
    vertex.set(
        vs::F_VARS0,
        [params[0], params[1], position.x - translation.x, position.y - translation.y],
    );
}
