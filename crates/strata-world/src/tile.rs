//! Tile registry and the resolved tile palette used by generation.
//!
//! Tiles are identified by symbolic name; the registry hands out opaque
//! `TileId` handles in insertion order. Generation code never hard-codes a
//! numeric id: it resolves the names it needs once into a `TilePalette`.

use std::collections::HashMap;

use crate::error::WorldError;

/// Opaque handle to a registered tile type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u16);

impl TileId {
    /// Sentinel returned for cells outside the materialized world.
    pub const VOID: TileId = TileId(0);
}

/// Every tile the default registry knows about, in id order.
///
/// `void` must stay first. The ore tiers are kept consecutive so that the
/// legacy "base ore + depth offset" numbering still holds.
static DEFAULT_TILES: &[&str] = &[
    "void",
    "grass",
    "dirt",
    "flower",
    "hole",
    "stairs down",
    "stairs up",
    "water",
    "lava",
    "rock",
    "tree",
    "sand",
    "cactus",
    "iron ore",
    "gold ore",
    "gem ore",
    "lapis",
    "cloud",
    "cloud cactus",
    "infinite fall",
    "stone bricks",
    "stone wall",
    "wood planks",
    "wood wall",
    "wood door",
    "obsidian",
    "raw obsidian",
    "ornate obsidian",
    "obsidian wall",
    "obsidian door",
    "obsidian boss floor",
    "obsidian boss wall",
    "obsidian boss door",
];

/// Registry mapping tile names to numeric ids and back.
///
/// Name lookup is case-insensitive: `"Stairs Down"` and `"stairs down"`
/// resolve to the same tile.
pub struct TileRegistry {
    names: Vec<String>,
    by_name: HashMap<String, TileId>,
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TileRegistry {
    /// An empty registry holding only the `void` sentinel.
    pub fn new() -> Self {
        let mut registry = Self {
            names: Vec::new(),
            by_name: HashMap::new(),
        };
        registry.register("void");
        registry
    }

    /// A registry holding every tile used by world generation.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in &DEFAULT_TILES[1..] {
            registry.register(name);
        }
        registry
    }

    /// Register a tile, returning its handle. Registering an existing name
    /// returns the existing handle.
    pub fn register(&mut self, name: &str) -> TileId {
        let key = name.to_ascii_lowercase();
        if let Some(&id) = self.by_name.get(&key) {
            return id;
        }
        let id = TileId(self.names.len() as u16);
        self.names.push(key.clone());
        self.by_name.insert(key, id);
        id
    }

    /// Look up a tile by name.
    pub fn resolve(&self, name: &str) -> Option<TileId> {
        self.by_name.get(&name.to_ascii_lowercase()).copied()
    }

    /// Look up a tile by name, failing on unknown names.
    pub fn get(&self, name: &str) -> Result<TileId, WorldError> {
        self.resolve(name)
            .ok_or_else(|| WorldError::UnknownTile(name.to_string()))
    }

    /// Numeric id of a handle.
    pub fn id_of(&self, tile: TileId) -> u16 {
        tile.0
    }

    /// Handle for a numeric id, if one is registered.
    pub fn by_id(&self, id: u16) -> Option<TileId> {
        ((id as usize) < self.names.len()).then_some(TileId(id))
    }

    /// Registered (lowercase) name of a tile.
    pub fn name(&self, tile: TileId) -> Option<&str> {
        self.names.get(tile.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Ore tier mined at each underground depth.
pub fn ore_for_depth(depth: u8) -> &'static str {
    match depth {
        1 => "iron ore",
        2 => "gold ore",
        _ => "gem ore",
    }
}

/// Handles for every tile the generation pipeline writes or tests against.
#[derive(Debug, Clone)]
pub struct TilePalette {
    pub void: TileId,
    pub grass: TileId,
    pub dirt: TileId,
    pub flower: TileId,
    pub stairs_down: TileId,
    pub stairs_up: TileId,
    pub water: TileId,
    pub lava: TileId,
    pub rock: TileId,
    pub tree: TileId,
    pub sand: TileId,
    pub cactus: TileId,
    /// Ore tiers indexed by `depth - 1`.
    pub ores: [TileId; 3],
    pub lapis: TileId,
    pub cloud: TileId,
    pub cloud_cactus: TileId,
    pub infinite_fall: TileId,
    pub obsidian: TileId,
    pub raw_obsidian: TileId,
    pub obsidian_wall: TileId,
}

impl TilePalette {
    /// Resolve every palette entry through `registry`.
    pub fn resolve(registry: &TileRegistry) -> Result<Self, WorldError> {
        Ok(Self {
            void: TileId::VOID,
            grass: registry.get("grass")?,
            dirt: registry.get("dirt")?,
            flower: registry.get("flower")?,
            stairs_down: registry.get("stairs down")?,
            stairs_up: registry.get("stairs up")?,
            water: registry.get("water")?,
            lava: registry.get("lava")?,
            rock: registry.get("rock")?,
            tree: registry.get("tree")?,
            sand: registry.get("sand")?,
            cactus: registry.get("cactus")?,
            ores: [
                registry.get(ore_for_depth(1))?,
                registry.get(ore_for_depth(2))?,
                registry.get(ore_for_depth(3))?,
            ],
            lapis: registry.get("lapis")?,
            cloud: registry.get("cloud")?,
            cloud_cactus: registry.get("cloud cactus")?,
            infinite_fall: registry.get("infinite fall")?,
            obsidian: registry.get("obsidian")?,
            raw_obsidian: registry.get("raw obsidian")?,
            obsidian_wall: registry.get("obsidian wall")?,
        })
    }

    /// Ore tile for an underground depth in `1..=3`.
    pub fn ore(&self, depth: u8) -> TileId {
        self.ores[(depth.clamp(1, 3) - 1) as usize]
    }
}
