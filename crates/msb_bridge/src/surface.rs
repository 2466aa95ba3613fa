//! Surface-type and terrain-type codes from the terrain-authoring toolset.
//!
//! Tags arrive as the toolset's enum names (`SURFACE_ICE`, `TERRAIN_SNOW`).
//! Matching ignores case and the `SURFACE_`/`TERRAIN_` prefix, so `ice` and
//! `Surface_Ice` resolve the same way.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceType {
    Default = 0x0000,
    Burning = 0x0001,
    Hangable = 0x0005,
    Slow = 0x0009,
    VerySlippery = 0x0013,
    Slippery = 0x0014,
    NotSlippery = 0x0015,
    ShallowQuicksand = 0x0021,
    DeepQuicksand = 0x0022,
    InstantQuicksand = 0x0023,
    Ice = 0x002E,
    Hard = 0x0030,
    HardSlippery = 0x0035,
    HardVerySlippery = 0x0036,
    HardNotSlippery = 0x0037,
    VerticalWind = 0x0038,
}

const SURFACE_NAMES: &[(&str, SurfaceType)] = &[
    ("default", SurfaceType::Default),
    ("burning", SurfaceType::Burning),
    ("hangable", SurfaceType::Hangable),
    ("slow", SurfaceType::Slow),
    ("very_slippery", SurfaceType::VerySlippery),
    ("slippery", SurfaceType::Slippery),
    ("not_slippery", SurfaceType::NotSlippery),
    ("shallow_quicksand", SurfaceType::ShallowQuicksand),
    ("deep_quicksand", SurfaceType::DeepQuicksand),
    ("instant_quicksand", SurfaceType::InstantQuicksand),
    ("ice", SurfaceType::Ice),
    ("hard", SurfaceType::Hard),
    ("hard_slippery", SurfaceType::HardSlippery),
    ("hard_very_slippery", SurfaceType::HardVerySlippery),
    ("hard_not_slippery", SurfaceType::HardNotSlippery),
    ("vertical_wind", SurfaceType::VerticalWind),
];

impl SurfaceType {
    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let key = normalize_tag(tag, "surface_");
        SURFACE_NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, kind)| *kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerrainType {
    Grass = 0x0000,
    Stone = 0x0001,
    Snow = 0x0002,
    Sand = 0x0003,
    Spooky = 0x0004,
    Water = 0x0005,
    Slide = 0x0006,
}

const TERRAIN_NAMES: &[(&str, TerrainType)] = &[
    ("grass", TerrainType::Grass),
    ("stone", TerrainType::Stone),
    ("snow", TerrainType::Snow),
    ("sand", TerrainType::Sand),
    ("spooky", TerrainType::Spooky),
    ("water", TerrainType::Water),
    ("slide", TerrainType::Slide),
];

impl TerrainType {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let key = normalize_tag(tag, "terrain_");
        TERRAIN_NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, kind)| *kind)
    }
}

fn normalize_tag(tag: &str, prefix: &str) -> String {
    let lowered = tag.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    match lowered.strip_prefix(prefix) {
        Some(rest) => rest.to_string(),
        None => lowered,
    }
}
