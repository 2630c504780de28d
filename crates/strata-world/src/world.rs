//! Multi-level world.
//!
//! Owns one chunk store and one generator per level. Loading a chunk first
//! makes sure the chunk at the same coordinates exists on the level above,
//! so that every staircase leading down arrives on a matching staircase
//! leading up.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, trace};

use crate::error::WorldError;
use crate::generator::ChunkGenerator;
use crate::settings::{GenerationContext, LevelKind, Settings, DUNGEON_DEPTH, SKY_DEPTH};
use crate::stairs::{link_stairs, Landing};
use crate::store::{Chunk, ChunkPos, ChunkStage, ChunkStore, TileMap};
use crate::structure::{StructureKind, StructureLibrary};
use crate::tile::{TileId, TileRegistry};

pub struct World {
    seed: u64,
    registry: Arc<TileRegistry>,
    library: Arc<StructureLibrary>,
    generators: BTreeMap<i32, ChunkGenerator>,
    levels: BTreeMap<i32, ChunkStore>,
}

impl World {
    /// A world over the default tile registry.
    pub fn new(seed: u64, settings: &Settings) -> Result<Self, WorldError> {
        Self::with_registry(seed, settings, TileRegistry::with_defaults())
    }

    pub fn with_registry(
        seed: u64,
        settings: &Settings,
        registry: TileRegistry,
    ) -> Result<Self, WorldError> {
        let registry = Arc::new(registry);
        let library = Arc::new(StructureLibrary::load(&registry)?);

        let mut generators = BTreeMap::new();
        for depth in DUNGEON_DEPTH..=SKY_DEPTH {
            let ctx = GenerationContext::from_settings(seed, depth, settings)?;
            let generator = ChunkGenerator::new(registry.clone(), library.clone(), ctx)?;
            generators.insert(depth, generator);
        }

        let shape = settings.shape()?;
        let theme = settings.theme()?;
        info!(seed, %shape, %theme, "world created");

        Ok(Self {
            seed,
            registry,
            library,
            generators,
            levels: BTreeMap::new(),
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn generator(&self, depth: i32) -> Option<&ChunkGenerator> {
        self.generators.get(&depth)
    }

    /// Chunks materialized so far on level `depth`.
    pub fn level(&self, depth: i32) -> Option<&ChunkStore> {
        self.levels.get(&depth)
    }

    /// Tile at world coordinates on level `depth`, `TileId::VOID` if not loaded.
    pub fn get_tile(&self, depth: i32, x: i32, y: i32) -> TileId {
        self.levels
            .get(&depth)
            .map_or(TileId::VOID, |level| level.get_tile(x, y))
    }

    /// Load chunk (`cx`, `cy`) of level `depth`, generating it and the chunk
    /// above it if needed.
    pub fn load_chunk(&mut self, depth: i32, cx: i32, cy: i32) -> Result<&Chunk, WorldError> {
        if !self.generators.contains_key(&depth) {
            return Err(WorldError::InvalidLevel { depth });
        }
        let pos = ChunkPos::new(cx, cy);
        let finished = self.levels.get(&depth).and_then(|l| l.stage(cx, cy))
            == Some(ChunkStage::Finished);

        if !finished {
            if depth < SKY_DEPTH {
                self.load_chunk(depth + 1, cx, cy)?;
            }
            self.generate_and_publish(depth, pos)?;
        }

        self.levels
            .get(&depth)
            .and_then(|level| level.chunk(pos))
            .ok_or(WorldError::InvalidLevel { depth })
    }

    /// Load a `chunks_x` x `chunks_y` rectangle of level `depth` starting at
    /// chunk (0, 0).
    pub fn create_map(
        &mut self,
        depth: i32,
        chunks_x: i32,
        chunks_y: i32,
    ) -> Result<&ChunkStore, WorldError> {
        for cy in 0..chunks_y {
            for cx in 0..chunks_x {
                self.load_chunk(depth, cx, cy)?;
            }
        }
        self.levels
            .get(&depth)
            .ok_or(WorldError::InvalidLevel { depth })
    }

    fn generate_and_publish(&mut self, depth: i32, pos: ChunkPos) -> Result<(), WorldError> {
        let generator = self
            .generators
            .get(&depth)
            .ok_or(WorldError::InvalidLevel { depth })?;
        let mut scratch = ChunkStore::new(depth);
        generator.generate_into(&mut scratch, pos.x, pos.y)?;

        let upper = self.levels.get(&(depth + 1)).and_then(|l| l.chunk(pos));
        if let Some(upper) = upper {
            let p = generator.palette();
            let landing = match LevelKind::from_depth(depth) {
                Some(LevelKind::Dungeon) => {
                    Landing::Structure(self.library.get(StructureKind::DungeonGate))
                }
                Some(LevelKind::Surface) => Landing::Ring(p.grass),
                Some(LevelKind::Sky) => Landing::Ring(p.cloud),
                _ => Landing::Ring(p.dirt),
            };
            let linked = link_stairs(upper, &mut scratch, p.stairs_down, p.stairs_up, landing);
            trace!(depth, cx = pos.x, cy = pos.y, linked = linked.len(), "stairs linked");
        }

        let level = self
            .levels
            .entry(depth)
            .or_insert_with(|| ChunkStore::new(depth));
        if let Some(chunk) = scratch.take(pos) {
            level.insert(chunk);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{SHAPE_KEY, THEME_KEY};
    use crate::store::CHUNK_SIZE;

    fn world(seed: u64) -> World {
        World::new(seed, &Settings::new()).unwrap()
    }

    #[test]
    fn loading_generates_every_level_above() {
        let mut w = world(17);
        w.load_chunk(-2, 0, 0).unwrap();
        for depth in -2..=SKY_DEPTH {
            assert_eq!(
                w.level(depth).and_then(|l| l.stage(0, 0)),
                Some(ChunkStage::Finished),
                "depth {depth} not loaded"
            );
        }
        assert!(w.level(-3).is_none());
    }

    #[test]
    fn stairs_down_arrive_on_stairs_up() {
        let mut w = world(2024);
        w.create_map(-1, 2, 2).unwrap();
        let p = w.generator(0).unwrap().palette().clone();
        let upper = w.level(0).unwrap();
        for chunk in upper.chunks() {
            let (ox, oy) = chunk.pos().origin();
            for (i, tile) in chunk.tiles().enumerate() {
                if tile != p.stairs_down {
                    continue;
                }
                let x = ox + i as i32 % CHUNK_SIZE;
                let y = oy + i as i32 / CHUNK_SIZE;
                assert_eq!(w.get_tile(-1, x, y), p.stairs_up, "no stairs up at ({x}, {y})");
            }
        }
        assert_eq!(w.level(SKY_DEPTH).unwrap().len(), 4);
    }

    #[test]
    fn dungeon_is_entered_through_a_gate() {
        let mut w = world(2024);
        w.create_map(DUNGEON_DEPTH, 2, 2).unwrap();
        let p = w.generator(DUNGEON_DEPTH).unwrap().palette().clone();
        let door = w.registry().get("obsidian door").unwrap();

        let mut entrances = Vec::new();
        for chunk in w.level(DUNGEON_DEPTH).unwrap().chunks() {
            let (ox, oy) = chunk.pos().origin();
            for (i, tile) in chunk.tiles().enumerate() {
                if tile == p.stairs_up {
                    entrances.push((ox + i as i32 % CHUNK_SIZE, oy + i as i32 / CHUNK_SIZE));
                }
            }
        }
        assert!(!entrances.is_empty(), "no way into the dungeon");
        for (x, y) in entrances {
            assert_eq!(w.get_tile(DUNGEON_DEPTH + 1, x, y), p.stairs_down);
            for (cx, cy) in [(-2, -2), (2, -2), (-2, 2), (2, 2)] {
                assert_eq!(w.get_tile(DUNGEON_DEPTH, x + cx, y + cy), p.obsidian_wall);
            }
            assert_eq!(w.get_tile(DUNGEON_DEPTH, x - 2, y), door);
            assert_eq!(w.get_tile(DUNGEON_DEPTH, x + 1, y), p.obsidian);
        }
    }

    #[test]
    fn reloading_returns_published_chunk() {
        let mut w = world(5);
        let first: Vec<_> = w.load_chunk(0, 1, 1).unwrap().tiles().collect();
        let second: Vec<_> = w.load_chunk(0, 1, 1).unwrap().tiles().collect();
        assert_eq!(first, second);
        assert_eq!(w.level(0).unwrap().len(), 1);
    }

    #[test]
    fn invalid_depth_is_rejected() {
        let mut w = world(0);
        assert_eq!(
            w.load_chunk(-7, 0, 0).err(),
            Some(WorldError::InvalidLevel { depth: -7 })
        );
        assert_eq!(w.get_tile(-7, 0, 0), TileId::VOID);
    }

    #[test]
    fn bad_settings_fail_construction() {
        let mut settings = Settings::new();
        settings.set(SHAPE_KEY, "donut");
        assert_eq!(
            World::new(0, &settings).err().map(|e| e.to_string()),
            Some(WorldError::UnknownShape("donut".into()).to_string())
        );
        let mut settings = Settings::new();
        settings.set(THEME_KEY, "hell");
        let w = World::new(0, &settings).unwrap();
        assert_eq!(w.generator(0).unwrap().context().theme.as_str(), "hell");
    }
}
