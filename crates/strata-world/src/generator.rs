//! Chunk generator.
//!
//! Runs the full pipeline for one chunk of one level: terrain
//! classification, decoration scatter, structure stamping and staircase
//! placement. Every call builds its own noise source and random stream from
//! the world seed and chunk coordinates, so one generator can be shared by
//! any number of threads.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error};

use crate::error::WorldError;
use crate::features::FeaturePlacer;
use crate::noise::PerlinNoise;
use crate::scatter;
use crate::settings::{chunk_seed, GenerationContext, LevelKind, ThemeKind};
use crate::stairs::{Candidates, StaircasePlacer};
use crate::store::{Chunk, ChunkPos, ChunkStage, ChunkStore, CHUNK_SIZE};
use crate::structure::StructureLibrary;
use crate::terrain::TerrainClassifier;
use crate::tile::{TileId, TilePalette, TileRegistry};

const S: u32 = CHUNK_SIZE as u32;

/// What one generation call placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// World coordinates of every staircase placed.
    pub stairs: Vec<(i32, i32)>,
    /// Number of structure templates stamped.
    pub structures: usize,
}

/// Generates chunks of one level for one world.
pub struct ChunkGenerator {
    registry: Arc<TileRegistry>,
    library: Arc<StructureLibrary>,
    palette: TilePalette,
    context: GenerationContext,
}

impl ChunkGenerator {
    /// Create a generator, resolving every tile it writes up front.
    pub fn new(
        registry: Arc<TileRegistry>,
        library: Arc<StructureLibrary>,
        context: GenerationContext,
    ) -> Result<Self, WorldError> {
        let palette = TilePalette::resolve(&registry)?;
        Ok(Self {
            registry,
            library,
            palette,
            context,
        })
    }

    pub fn context(&self) -> &GenerationContext {
        &self.context
    }

    pub fn palette(&self) -> &TilePalette {
        &self.palette
    }

    pub fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub fn library(&self) -> &StructureLibrary {
        &self.library
    }

    /// Generate chunk (`cx`, `cy`) into `store`.
    ///
    /// On success the chunk is in stage `Finished`. An invalid level depth is
    /// logged, leaves the chunk `Unfinished`, and returns
    /// `WorldError::InvalidLevel`.
    pub fn generate_into(
        &self,
        store: &mut ChunkStore,
        cx: i32,
        cy: i32,
    ) -> Result<GenerationReport, WorldError> {
        let ctx = &self.context;
        let Some(level) = ctx.level() else {
            error!(
                depth = ctx.level_depth,
                cx,
                cy,
                seed = ctx.world_seed,
                "level depth is not valid, chunk not generated"
            );
            store.set_stage(cx, cy, ChunkStage::Unfinished);
            return Err(WorldError::InvalidLevel {
                depth: ctx.level_depth,
            });
        };

        let pos = ChunkPos::new(cx, cy);
        let noise = PerlinNoise::new(ctx.world_seed);
        let mut rng = StdRng::seed_from_u64(chunk_seed(ctx.world_seed, ctx.level_depth, cx, cy));
        let classifier = TerrainClassifier::new(&noise, &self.palette);
        let features = FeaturePlacer::new(&self.palette, &self.library);
        let p = &self.palette;
        let mut report = GenerationReport::default();

        // Phase 1: Terrain
        let rocks = match level {
            LevelKind::Surface => classifier.surface(store, pos, ctx.shape, ctx.theme),
            LevelKind::Underground(depth) => {
                classifier.underground(store, pos, depth);
                Vec::new()
            }
            LevelKind::Dungeon => {
                classifier.dungeon(store, pos, &mut rng);
                Vec::new()
            }
            LevelKind::Sky => {
                classifier.sky(store, pos);
                Vec::new()
            }
        };

        // Phase 2: Decoration
        let passes = match level {
            LevelKind::Surface => scatter::surface_passes(p, ctx.theme),
            LevelKind::Underground(depth) => scatter::underground_passes(p, depth),
            LevelKind::Sky => scatter::sky_passes(p),
            LevelKind::Dungeon => Vec::new(),
        };
        for pass in &passes {
            pass.apply(store, pos, &mut rng);
        }

        // Phase 3: Structures
        report.structures = match level {
            LevelKind::Surface if ctx.theme != ThemeKind::Hell => {
                features.village(store, pos, &mut rng)
            }
            LevelKind::Surface => 0,
            LevelKind::Underground(3) => {
                features.mob_dungeon(store, pos, &mut rng)
                    + features.lava_pools(store, pos, &mut rng)
            }
            LevelKind::Underground(_) => features.mob_dungeon(store, pos, &mut rng),
            LevelKind::Dungeon => {
                features.dungeon_rooms(store, pos, &mut rng) + features.boss_room(store, pos)
            }
            LevelKind::Sky => features.air_wizard_house(store, pos),
        };
        store.set_stage(cx, cy, ChunkStage::UnfinishedStairs);

        // Phase 4: Staircases
        if let Some((placer, candidates)) = self.stair_plan(level, rocks) {
            report.stairs = placer.place(store, pos, candidates, &mut rng);
        } else if level == LevelKind::Underground(3) {
            report.stairs.extend(features.dungeon_lock(store, pos, &mut rng));
        }
        store.set_stage(cx, cy, ChunkStage::Finished);

        debug!(
            cx,
            cy,
            depth = ctx.level_depth,
            stairs = report.stairs.len(),
            structures = report.structures,
            "chunk generated"
        );
        Ok(report)
    }

    /// Generate chunk (`cx`, `cy`) on its own and return it, without
    /// touching any shared state.
    pub fn generate(&self, cx: i32, cy: i32) -> Result<Chunk, WorldError> {
        let depth = self.context.level_depth;
        let pos = ChunkPos::new(cx, cy);
        let mut scratch = ChunkStore::new(depth);
        self.generate_into(&mut scratch, cx, cy)?;
        Ok(scratch
            .take(pos)
            .unwrap_or_else(|| Chunk::new(pos, depth, TileId::VOID)))
    }

    fn stair_plan(
        &self,
        level: LevelKind,
        rocks: Vec<(i32, i32)>,
    ) -> Option<(StaircasePlacer, Candidates)> {
        let p = &self.palette;
        match level {
            LevelKind::Surface => Some((
                StaircasePlacer::new(p.stairs_down, p.rock, S / 21, u32::MAX),
                Candidates::List(rocks),
            )),
            LevelKind::Underground(depth) if depth < 3 => Some((
                StaircasePlacer::new(p.stairs_down, p.rock, S / 32, S * S / 100),
                Candidates::Random { inset: 0 },
            )),
            LevelKind::Sky => Some((
                StaircasePlacer::new(p.stairs_down, p.cloud, S / 64, S * S),
                Candidates::Random { inset: 1 },
            )),
            LevelKind::Underground(_) | LevelKind::Dungeon => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ShapeKind;
    use crate::store::TileMap;

    fn generator(seed: u64, depth: i32, shape: ShapeKind, theme: ThemeKind) -> ChunkGenerator {
        let registry = Arc::new(TileRegistry::with_defaults());
        let library = Arc::new(StructureLibrary::load(&registry).unwrap());
        let ctx = GenerationContext::new(seed, depth, shape, theme);
        ChunkGenerator::new(registry, library, ctx).unwrap()
    }

    fn snapshot(chunk: &Chunk) -> (Vec<TileId>, Vec<u16>) {
        (chunk.tiles().collect(), chunk.data_words().to_vec())
    }

    #[test]
    fn generation_is_deterministic() {
        for depth in -4..=1 {
            let worldgen = generator(1234, depth, ShapeKind::Island, ThemeKind::Forest);
            let a = worldgen.generate(2, -1).unwrap();
            let b = worldgen.generate(2, -1).unwrap();
            assert!(snapshot(&a) == snapshot(&b), "depth {depth} not deterministic");
            assert_eq!(a.furniture(), b.furniture());
        }
    }

    #[test]
    fn different_chunks_differ() {
        let worldgen = generator(7, 0, ShapeKind::Island, ThemeKind::Normal);
        let a = worldgen.generate(0, 0).unwrap();
        let b = worldgen.generate(1, 0).unwrap();
        assert!(snapshot(&a) != snapshot(&b));
    }

    #[test]
    fn parallel_matches_sequential() {
        let worldgen = generator(99, -2, ShapeKind::Box, ThemeKind::Normal);
        let coords: Vec<(i32, i32)> = (0..4).flat_map(|x| (0..2).map(move |y| (x, y))).collect();
        let sequential: Vec<_> = coords
            .iter()
            .map(|&(x, y)| snapshot(&worldgen.generate(x, y).unwrap()))
            .collect();
        let parallel: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = coords
                .iter()
                .map(|&(x, y)| {
                    let worldgen = &worldgen;
                    s.spawn(move || snapshot(&worldgen.generate(x, y).unwrap()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(sequential == parallel);
    }

    #[test]
    fn finished_after_success() {
        let worldgen = generator(3, 0, ShapeKind::Island, ThemeKind::Normal);
        let mut store = ChunkStore::new(0);
        let report = worldgen.generate_into(&mut store, 0, 0).unwrap();
        assert_eq!(store.stage(0, 0), Some(ChunkStage::Finished));
        assert_eq!(store.len(), 1, "generation spilled into a neighbour");
        for (x, y) in report.stairs {
            assert_eq!(store.get_tile(x, y), worldgen.palette().stairs_down);
        }
    }

    #[test]
    fn invalid_depth_stays_unfinished() {
        let worldgen = generator(3, 2, ShapeKind::Island, ThemeKind::Normal);
        let mut store = ChunkStore::new(2);
        assert_eq!(
            worldgen.generate_into(&mut store, 0, 0),
            Err(WorldError::InvalidLevel { depth: 2 })
        );
        assert_eq!(store.stage(0, 0), Some(ChunkStage::Unfinished));
        assert!(worldgen.generate(0, 0).is_err());
    }

    #[test]
    fn neighbours_do_not_change_a_chunk() {
        for depth in [0, -1, -2] {
            for seed in 0..20 {
                let worldgen = generator(seed, depth, ShapeKind::Island, ThemeKind::Normal);
                let alone = worldgen.generate(1, 1).unwrap();

                let mut store = ChunkStore::new(depth);
                for (cx, cy) in (0..3).flat_map(|y| (0..3).map(move |x| (x, y))) {
                    if (cx, cy) != (1, 1) {
                        worldgen.generate_into(&mut store, cx, cy).unwrap();
                    }
                }
                worldgen.generate_into(&mut store, 1, 1).unwrap();
                let shared = store.chunk(ChunkPos::new(1, 1)).unwrap();
                assert!(
                    snapshot(&alone) == snapshot(shared),
                    "seed {seed} depth {depth}: chunk (1, 1) depends on its neighbours"
                );
            }
        }
    }

    #[test]
    fn only_the_lock_leads_into_the_dungeon() {
        let worldgen = generator(5, -3, ShapeKind::Island, ThemeKind::Normal);
        let p = worldgen.palette();
        let mut locks = 0;
        for (cx, cy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let chunk = worldgen.generate(cx, cy).unwrap();
            let stairs = chunk.count(p.stairs_down);
            assert!(stairs <= 1, "chunk ({cx}, {cy}) has {stairs} stairs down");
            locks += stairs;
        }
        assert!(locks > 0);

        let dungeon = generator(5, -4, ShapeKind::Island, ThemeKind::Normal);
        let chunk = dungeon.generate(0, 0).unwrap();
        assert_eq!(chunk.count(dungeon.palette().stairs_down), 0);
    }
}
