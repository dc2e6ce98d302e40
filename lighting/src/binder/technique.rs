use technique_common::{BaseTechnique, TechniqueFlags, to_pixel_technique, to_raw_technique, to_vertex_technique};

use super::{LightingShader, commit};
use crate::constants::{ConstantGroup, ConstantGroupLevel, ps, vs};
use crate::context::DrawContext;
use crate::error::TechniqueError;
use crate::facade::{AddressMode, FilterMode, RendererFacade, TEXTURE_SLOT_COUNT};
use crate::frame::FrameState;
use crate::shader::{Pixel, Vertex};

/// Shadow slot sampled by deferred-shadow techniques
const SHADOW_MASK_SLOT: u32 = 14;
/// Slot of the secondary shadow target
const SECONDARY_SHADOW_SLOT: u32 = 15;
/// Filter quality that samples the shadow mask unfiltered
const UNFILTERED_SHADOW_QUALITY: u32 = 4;

impl LightingShader {
    /// Bind the shader pair for a requested technique and write the technique tier
    ///
    /// # Errors
    ///
    /// Returns [`TechniqueError`] if the library has no vertex or pixel
    /// permutation for the technique. The caller must skip the draw; nothing
    /// has been flushed and the draw state is unchanged.
    pub fn setup_technique<R: RendererFacade>(
        &mut self,
        cx: &mut DrawContext<'_, R>,
        requested: u32,
    ) -> Result<(), TechniqueError> {
        let raw = to_raw_technique(requested, self.config.kill_switches);
        let vertex_id = to_vertex_technique(raw);
        let pixel_id = to_pixel_technique(raw);

        let pair = self.library.begin_technique(raw, vertex_id, pixel_id).inspect_err(|err| {
            tracing::debug!(%err, "technique setup failed, draw skipped");
        })?;

        cx.state.raw = raw;
        cx.state.pair = Some(pair.clone());

        let renderer = &mut *cx.renderer;
        let frame = cx.frame;
        let mut vertex = renderer.get_shader_constant_group(&pair.vertex, ConstantGroupLevel::Technique);
        let mut pixel = renderer.get_shader_constant_group(&pair.pixel, ConstantGroupLevel::Technique);

        renderer.set_texture_filter_mode(0, FilterMode::ANISOTROPIC);
        renderer.set_texture_filter_mode(1, FilterMode::ANISOTROPIC);

        match raw.base() {
            Some(BaseTechnique::Envmap | BaseTechnique::Eye) => {
                renderer.set_texture_filter_mode(4, FilterMode::ANISOTROPIC);
                renderer.set_texture_filter_mode(5, FilterMode::ANISOTROPIC);
            }
            Some(BaseTechnique::Glowmap) => {
                renderer.set_texture_filter_mode(6, FilterMode::ANISOTROPIC);
            }
            Some(BaseTechnique::Parallax | BaseTechnique::ParallaxOcc) => {
                renderer.set_texture_filter_mode(3, FilterMode::ANISOTROPIC);
            }
            Some(BaseTechnique::FaceGen) => {
                renderer.set_texture_filter_mode(3, FilterMode::ANISOTROPIC);
                renderer.set_texture_filter_mode(4, FilterMode::ANISOTROPIC);
                renderer.set_texture_filter_mode(12, FilterMode::ANISOTROPIC);
            }
            Some(BaseTechnique::MtLand | BaseTechnique::MtLandLodBlend) => {
                for slot in 0..TEXTURE_SLOT_COUNT {
                    renderer.set_shader_resource(slot, frame.textures.land);
                    renderer.set_texture_mode(slot, AddressMode::WRAP, FilterMode::ANISOTROPIC);
                }
                renderer.set_texture_mode(15, AddressMode::WRAP, FilterMode::BILINEAR);
            }
            Some(BaseTechnique::LodLand | BaseTechnique::LodLandNoise) => {
                renderer.set_texture_mode(0, AddressMode::WRAP, FilterMode::BILINEAR);
                renderer.set_texture_mode(1, AddressMode::WRAP, FilterMode::BILINEAR);
                vertex.set(vs::ACCELERATION, frame.lod_land_acceleration());
            }
            Some(BaseTechnique::MultiLayerParallax) => {
                renderer.set_texture_filter_mode(4, FilterMode::ANISOTROPIC);
                renderer.set_texture_filter_mode(5, FilterMode::ANISOTROPIC);
                renderer.set_texture_filter_mode(8, FilterMode::ANISOTROPIC);
            }
            Some(BaseTechnique::MultiIndexTriShapeSnow) => {
                renderer.set_shader_resource(10, frame.textures.projected_noise);
                renderer.set_texture_mode(10, AddressMode::WRAP, FilterMode::NEAREST);
            }
            _ => {}
        }

        self.write_fog_wind(frame, &mut vertex, &mut pixel);
        pixel.set(ps::COLOUR_OUTPUT_CLAMP, self.config.colour_output_clamp());

        let shadowed = raw.any(TechniqueFlags::SHADOWED);
        if shadowed && raw.flags().contains(TechniqueFlags::DEFSHADOW) {
            let filter = if self.config.shadow.filter_quality != UNFILTERED_SHADOW_QUALITY {
                FilterMode::BILINEAR
            } else {
                FilterMode::NEAREST
            };
            renderer.set_shader_resource(SHADOW_MASK_SLOT, frame.textures.shadow_mask);
            renderer.set_texture_mode(SHADOW_MASK_SLOT, AddressMode::CLAMP, filter);
            pixel.set(ps::VPOS_OFFSET, frame.shadow_texel_size());
        }

        commit(renderer, &vertex, &pixel, ConstantGroupLevel::Technique);

        tracing::trace!(%raw, vertex = %vertex_id, pixel = %pixel_id, "technique bound");
        Ok(())
    }

    /// Release what technique setup bound and unlock the shader pair
    pub fn restore_technique<R: RendererFacade>(&mut self, cx: &mut DrawContext<'_, R>) {
        if cx.state.raw.flags().contains(TechniqueFlags::DEFSHADOW) {
            cx.renderer.set_shader_resource(SHADOW_MASK_SLOT, None);
        }

        if cx.frame.secondary_shadow.is_some_and(|target| target.needs_release()) {
            cx.renderer.set_shader_resource(SECONDARY_SHADOW_SLOT, None);
        }

        cx.state.pair = None;
        self.library.end_technique();
    }

    /// Wind, fog colour and fog distance constants; skipped when fog is off
    fn write_fog_wind(&self, frame: &FrameState, vertex: &mut ConstantGroup<'_, Vertex>, pixel: &mut ConstantGroup<'_, Pixel>) {
        let Some(fog) = frame.fog else {
            return;
        };

        let wind = fog.near_color.extend(self.config.fog.wind_speed).to_array();
        vertex.set(vs::WIND, wind);
        pixel.set(ps::FOG_COLOR, wind);

        vertex.set(vs::FOG_FAR_COLOR, fog.far_color.extend(0.0).to_array());
        vertex.set(vs::SCALE_ADJUST, fog.scale_adjust(self.config.fog.scale_adjust_fallback));
    }
}
