//! Decode command - print the ids derived from a technique

use anyhow::Result;
use clap::Args;
use technique_common::{
    KillSwitches, RawTechniqueId, TechniqueFlags, to_pixel_technique, to_raw_technique, to_requested_technique,
    to_vertex_technique,
};

/// Arguments for the decode command
#[derive(Args)]
pub struct DecodeArgs {
    /// Technique id, hex (0x...) or decimal
    pub id: String,

    /// Treat the id as a raw technique rather than a requested one
    #[arg(long)]
    pub raw: bool,

    /// Apply the LOD land noise kill switch
    #[arg(long)]
    pub no_lod_land_noise: bool,

    /// Apply the parallax occlusion kill switch
    #[arg(long)]
    pub no_parallax_occlusion: bool,
}

/// Execute the decode command
pub fn execute(args: DecodeArgs) -> Result<()> {
    let id = crate::parse_id(&args.id)?;
    let switches = KillSwitches {
        disable_lod_land_noise: args.no_lod_land_noise,
        disable_parallax_occlusion: args.no_parallax_occlusion,
    };

    let requested = if args.raw {
        to_requested_technique(RawTechniqueId(id))
    } else {
        id
    };
    let raw = to_raw_technique(requested, switches);

    for line in describe(requested, raw) {
        println!("{line}");
    }
    Ok(())
}

/// Human-readable breakdown of a technique
fn describe(requested: u32, raw: RawTechniqueId) -> Vec<String> {
    let base = match raw.base() {
        Some(base) => base.name().to_string(),
        None => format!("unknown ({})", raw.base_index()),
    };

    let named = raw
        .flags()
        .difference(TechniqueFlags::LIGHT_COUNT_BITS | TechniqueFlags::SHADOW_LIGHT_COUNT_BITS);
    let flags: Vec<&str> = named.iter_names().map(|(name, _)| name).collect();

    vec![
        format!("requested  {requested:#010X}"),
        format!("raw        {raw}"),
        format!("vertex     {}", to_vertex_technique(raw)),
        format!("pixel      {}", to_pixel_technique(raw)),
        format!("base       {base}"),
        format!("lights     {} ({} shadowed)", raw.light_count(), raw.shadow_light_count()),
        format!("flags      {}", if flags.is_empty() { "-".to_string() } else { flags.join(" ") }),
    ]
}
