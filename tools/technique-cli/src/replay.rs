//! Replay command - run one draw through the binders
//!
//! Builds a shader library holding the permutations the technique resolves
//! to, a frame with every shared texture present, and a single pass, then
//! runs technique, material and geometry setup and their restores against
//! the recording renderer. Every recorded call is printed in order.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use glam::{Mat3, Vec2, Vec3};
use lighting_shader::{
    BufferHandle, BufferLayout, DrawContext, DrawFlags, DrawState, EnvmapMaterial, FogParams, FrameState, LandLayer,
    LandscapeMaterial, LightingConfig, LightingShader, MaterialKind, MeshGeometry, RecordingRenderer, RenderCommand,
    RenderPass, SceneLight, ShaderHandle, ShaderInstance, ShaderLibrary, ShaderMaterial, ShaderProperty,
    TextureHandle, WorldTransform, WriterLog,
};
use technique_common::{
    BaseTechnique, RawTechniqueId, to_pixel_technique, to_raw_technique, to_requested_technique,
    to_vertex_technique,
};

/// Vertex slots with their word sizes, in slot order
const VERTEX_SLOTS: [(usize, u8); 13] = [
    (0, 12),
    (1, 12),
    (2, 4),
    (3, 4),
    (6, 12),
    (8, 4),
    (9, 4),
    (10, 4),
    (11, 4),
    (12, 4),
    (13, 4),
    (14, 4),
    (15, 4),
];

/// Highest pixel slot written by the binders, plus one
const PIXEL_SLOTS: usize = 36;

/// Arguments for the replay command
#[derive(Args)]
pub struct ReplayArgs {
    /// Raw technique id, hex (0x...) or decimal
    #[arg(long, default_value = "0x01000200")]
    pub technique: String,

    /// Lighting config (TOML); defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Point light count encoded into the technique (0-7)
    #[arg(long, default_value_t = 0)]
    pub lights: u32,

    /// Shadowed point light count encoded into the technique (0-7)
    #[arg(long, default_value_t = 0)]
    pub shadow_lights: u32,

    /// Turn fog off for the frame
    #[arg(long)]
    pub no_fog: bool,

    /// Accumulation hint of the pass
    #[arg(long, default_value_t = 0)]
    pub hint: u8,
}

/// Execute the replay command
pub fn execute(args: ReplayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => LightingConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LightingConfig::default(),
    };

    let requested_raw = RawTechniqueId(crate::parse_id(&args.technique)?);
    let requested_raw = if args.lights > 0 || args.shadow_lights > 0 {
        requested_raw.with_light_counts(args.lights, args.shadow_lights)
    } else {
        requested_raw
    };
    let requested = to_requested_technique(requested_raw);
    let raw = to_raw_technique(requested, config.kill_switches);

    let library = build_library(raw).context("Failed to build shader library")?;
    let mut shader = LightingShader::new(library, config);

    let frame = build_frame(args.no_fog);
    let mut renderer = RecordingRenderer::new().with_ring(64);
    let mut state = DrawState::new();
    let mut writers = WriterLog::default();

    let material = material_for(raw.base());
    let geometry = MeshGeometry {
        previous_world: WorldTransform::from_translation(Vec3::new(99.0, 200.0, 50.0)),
        ..MeshGeometry::at(WorldTransform {
            rotation: Mat3::from_rotation_z(0.5),
            translation: Vec3::new(100.0, 200.0, 50.0),
            scale: 1.5,
        })
    };
    let property = ShaderProperty {
        lod_fade: 1.0,
        material: material.clone(),
        ..ShaderProperty::default()
    };
    let lights = [SceneLight {
        color: Vec3::new(1.0, 0.95, 0.8),
        dimmer: 1.0,
        direction: Vec3::new(0.3, 0.2, -0.9).normalize(),
    }];
    let pass = RenderPass::new(&geometry, &property)
        .with_lights(&lights)
        .with_accumulation_hint(lighting_shader::AccumulationHint(args.hint));

    println!("=== Replay ===");
    println!("  Requested: {requested:#010X}");
    println!("  Raw:       {raw}");
    println!("  Material:  {}", material.kind.name());
    println!();

    {
        let mut cx = DrawContext::new(&mut renderer, &frame, &mut state);
        shader
            .setup_technique(&mut cx, requested)
            .context("Technique setup failed, draw skipped")?;
        shader.setup_material(&mut cx, &material);
        shader.setup_geometry(&mut cx, &mut writers, &pass, DrawFlags::empty());
        shader.restore_geometry(&mut cx, &pass);
        shader.restore_material(&mut cx, &material);
        shader.restore_technique(&mut cx);
    }

    for (i, command) in renderer.commands().iter().enumerate() {
        println!("{i:4}  {command}");
    }

    let flushes = renderer.count(|c| matches!(c, RenderCommand::FlushConstantGroup { .. }));
    let textures = renderer.count(|c| matches!(c, RenderCommand::SetShaderResource { .. }));
    println!();
    println!("  {} calls, {flushes} flushes, {textures} texture binds", renderer.commands().len());
    println!(
        "  External writers: {} tree, {} ambient, {} point light, {} projected UV",
        writers.tree_instances,
        writers.directional_ambient.len(),
        writers.point_lights.len(),
        writers.projected_uv.len()
    );

    Ok(())
}

/// Library holding the vertex/pixel permutations of `raw`, with every slot mapped
fn build_library(raw: RawTechniqueId) -> Result<ShaderLibrary> {
    let mut vertex_slots = Vec::with_capacity(VERTEX_SLOTS.len());
    let mut vertex_words = 0u8;
    for (slot, words) in VERTEX_SLOTS {
        vertex_slots.push((slot, vertex_words));
        vertex_words += words;
    }
    let pixel_slots: Vec<(usize, u8)> = (0..PIXEL_SLOTS).map(|slot| (slot, (slot * 4) as u8)).collect();
    let pixel_words = (PIXEL_SLOTS * 4) as u32;

    let vertex_layout = [BufferLayout::new(BufferHandle(1), u32::from(vertex_words)); 3];
    let pixel_layout = [BufferLayout::new(BufferHandle(2), pixel_words); 3];

    let mut library = ShaderLibrary::new();
    library.insert_vertex(ShaderInstance::from_slots(
        to_vertex_technique(raw),
        ShaderHandle(1),
        vertex_layout,
        &vertex_slots,
    )?);
    library.insert_pixel(ShaderInstance::from_slots(
        to_pixel_technique(raw),
        ShaderHandle(2),
        pixel_layout,
        &pixel_slots,
    )?);
    Ok(library)
}

fn build_frame(no_fog: bool) -> FrameState {
    let mut frame = FrameState {
        camera_position: Vec3::new(90.0, 180.0, 60.0),
        previous_pos_adjust: Vec3::new(0.5, 0.0, 0.0),
        accumulator_eye_position: Vec3::new(100.0, 200.0, 2000.0),
        texture_pool: (100..108).map(|id| Some(TextureHandle(id))).collect(),
        character_light_probe: Some(3),
        ..FrameState::default()
    };

    if !no_fog {
        frame.fog = Some(FogParams {
            near_color: Vec3::new(0.4, 0.45, 0.5),
            far_color: Vec3::new(0.6, 0.65, 0.7),
            near: 500.0,
            far: 20_000.0,
            power: 1.0,
            clamp: 0.9,
        });
    }

    frame.land_fade.duration = 2.0;
    frame.land_fade.to = Vec2::new(128.0, 256.0);

    let textures = &mut frame.textures;
    textures.land = Some(TextureHandle(10));
    textures.shadow_mask = Some(TextureHandle(11));
    textures.projected_diffuse = Some(TextureHandle(12));
    textures.projected_normal = Some(TextureHandle(13));
    textures.projected_noise = Some(TextureHandle(14));
    textures.projected_normal_detail = Some(TextureHandle(15));
    textures.default_envmap_mask = Some(TextureHandle(16));
    textures.world_map = [Some(TextureHandle(17)), Some(TextureHandle(18))];
    frame
}

/// A material of the kind the base technique reads
fn material_for(base: Option<BaseTechnique>) -> ShaderMaterial {
    let envmap = EnvmapMaterial {
        envmap: Some(TextureHandle(30)),
        envmap_mask: None,
        envmap_scale: 1.0,
    };

    let kind = match base {
        Some(BaseTechnique::Envmap) => MaterialKind::Envmap(envmap),
        Some(BaseTechnique::Glowmap) => MaterialKind::Glowmap {
            glow: Some(TextureHandle(31)),
        },
        Some(BaseTechnique::Parallax) => MaterialKind::Parallax {
            height: Some(TextureHandle(32)),
        },
        Some(BaseTechnique::FaceGen) => MaterialKind::FaceGen {
            detail: Some(TextureHandle(33)),
            tint: Some(TextureHandle(34)),
            subsurface: Some(TextureHandle(35)),
        },
        Some(BaseTechnique::FaceGenRgbTint | BaseTechnique::Hair) => MaterialKind::Tint {
            color: Vec3::new(0.8, 0.6, 0.5),
        },
        Some(BaseTechnique::ParallaxOcc) => MaterialKind::ParallaxOcc {
            height: Some(TextureHandle(32)),
            params: [16.0, 0.04],
        },
        Some(BaseTechnique::MtLand | BaseTechnique::MtLandLodBlend) => {
            MaterialKind::Landscape(Box::new(LandscapeMaterial {
                layers: (0..3)
                    .map(|i| LandLayer {
                        diffuse: Some(TextureHandle(40 + i)),
                        normal: Some(TextureHandle(50 + i)),
                    })
                    .collect(),
                overlay: Some(TextureHandle(60)),
                noise: Some(TextureHandle(61)),
                lod_params: [0.25, 0.5, 1.0],
                is_snow: [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
                spec_power: [30.0; 6],
            }))
        }
        Some(BaseTechnique::LodLand | BaseTechnique::LodLandNoise) => MaterialKind::LodLand {
            noise: Some(TextureHandle(61)),
            params: [0.25, 0.5, 1.0],
        },
        Some(BaseTechnique::MultiLayerParallax) => MaterialKind::MultiLayerParallax {
            layer: Some(TextureHandle(36)),
            params: [0.1, 0.5, 1.0, 0.0],
            envmap,
        },
        Some(BaseTechnique::MultiIndexTriShapeSnow) => MaterialKind::Snow {
            sparkle: [1.0, 0.5, 0.25, 2.0],
        },
        Some(BaseTechnique::Eye) => MaterialKind::Eye {
            envmap,
            left_eye_center: Vec3::new(-0.03, 0.08, 1.6),
            right_eye_center: Vec3::new(0.03, 0.08, 1.6),
        },
        _ => MaterialKind::Default,
    };

    ShaderMaterial {
        diffuse: Some(TextureHandle(20)),
        normal: Some(TextureHandle(21)),
        rim_soft_lighting: Some(TextureHandle(22)),
        specular_back_lighting: Some(TextureHandle(23)),
        specular_power: 40.0,
        specular_color_scale: 1.0,
        lighting_effect: [0.3, 2.0],
        ..ShaderMaterial::with_kind(kind)
    }
}
