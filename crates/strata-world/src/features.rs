//! Structure passes: stamping authored templates onto classified terrain.
//!
//! Every site is checked against the tiles already written for the chunk and
//! kept far enough from the chunk edge that the whole footprint stays inside.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

use crate::store::{ChunkPos, FurnitureSink, TileMap, CHUNK_SIZE};
use crate::structure::{Furniture, StructureKind, StructureLibrary};
use crate::tile::{TileId, TilePalette};

const CELLS: i32 = CHUNK_SIZE * CHUNK_SIZE;

/// Mobs a mob-dungeon spawner may be set up for.
const SPAWNER_MOBS: [&str; 3] = ["skeleton", "zombie", "slime"];

/// Arms of a mob dungeon and their offsets from its centre.
const MOB_DUNGEON_ARMS: [(StructureKind, i32, i32); 4] = [
    (StructureKind::MobDungeonNorth, 0, -5),
    (StructureKind::MobDungeonSouth, 0, 5),
    (StructureKind::MobDungeonEast, 5, 0),
    (StructureKind::MobDungeonWest, -5, 0),
];

/// Fortified rooms the dungeon picks from, one per accepted site.
const DUNGEON_ROOMS: [StructureKind; 4] = [
    StructureKind::OrnateLavaPool,
    StructureKind::DungeonGarden,
    StructureKind::DungeonChest,
    StructureKind::DungeonSpawner,
];

/// Sites tried per chunk for the lock above the dungeon.
const LOCK_ATTEMPTS: u32 = 32;

const VILLAGE_HOUSES: [StructureKind; 2] = [
    StructureKind::VillageHouseNormal,
    StructureKind::VillageHouseTwoDoor,
];

const VILLAGE_RUINS: [StructureKind; 2] = [
    StructureKind::VillageRuinedOverlay1,
    StructureKind::VillageRuinedOverlay2,
];

/// Whether every cell of the square of `radius` around (`x`, `y`) is `tile`.
fn all_of<M: TileMap>(map: &M, x: i32, y: i32, radius: i32, tile: TileId) -> bool {
    all_match(map, x, y, radius, |t| t == tile)
}

fn all_match<M, F>(map: &M, x: i32, y: i32, radius: i32, accept: F) -> bool
where
    M: TileMap,
    F: Fn(TileId) -> bool,
{
    (y - radius..=y + radius)
        .all(|yy| (x - radius..=x + radius).all(|xx| accept(map.get_tile(xx, yy))))
}

/// Runs the structure passes for one chunk.
pub struct FeaturePlacer<'a> {
    palette: &'a TilePalette,
    library: &'a StructureLibrary,
}

impl<'a> FeaturePlacer<'a> {
    pub fn new(palette: &'a TilePalette, library: &'a StructureLibrary) -> Self {
        Self { palette, library }
    }

    /// Dungeon: fortified rooms (lava pool, garden, chest or spawner) on
    /// solid obsidian, away from the chunk edge.
    pub fn dungeon_rooms<M>(&self, map: &mut M, pos: ChunkPos, rng: &mut StdRng) -> usize
    where
        M: TileMap + FurnitureSink,
    {
        let (ox, oy) = pos.origin();
        let mut stamped = 0;

        for _ in 0..CELLS / 450 {
            let lx = rng.gen_range(1..CHUNK_SIZE - 1);
            let ly = rng.gen_range(1..CHUNK_SIZE - 1);
            let (x, y) = (ox + lx, oy + ly);
            if !all_of(map, x, y, 1, self.palette.obsidian) {
                continue;
            }
            let interior = lx > 8 && ly > 8 && lx < CHUNK_SIZE - 8 && ly < CHUNK_SIZE - 8;
            if interior && rng.gen_range(0..2) == 0 {
                let room = DUNGEON_ROOMS[rng.gen_range(0..DUNGEON_ROOMS.len())];
                self.library.get(room).stamp(map, x, y);
                trace!(x, y, ?room, "dungeon room");
                stamped += 1;
            }
        }
        stamped
    }

    /// Dungeon: the boss room sits at the centre of chunk (0, 0) only.
    pub fn boss_room<M>(&self, map: &mut M, pos: ChunkPos) -> usize
    where
        M: TileMap + FurnitureSink,
    {
        if pos != ChunkPos::new(0, 0) {
            return 0;
        }
        let (x, y) = (CHUNK_SIZE / 2, CHUNK_SIZE / 2);
        self.library
            .get(StructureKind::DungeonBossRoom)
            .stamp(map, x, y);
        trace!(x, y, "boss room");
        1
    }

    /// Deepest underground tier: small lava pools sunk into solid rock.
    pub fn lava_pools<M>(&self, map: &mut M, pos: ChunkPos, rng: &mut StdRng) -> usize
    where
        M: TileMap + FurnitureSink,
    {
        let (ox, oy) = pos.origin();
        let pool = self.library.get(StructureKind::LavaPool);
        let mut stamped = 0;

        for _ in 0..CELLS / 800 {
            let x = ox + rng.gen_range(2..CHUNK_SIZE - 2);
            let y = oy + rng.gen_range(2..CHUNK_SIZE - 2);
            if all_of(map, x, y, 2, self.palette.rock) {
                pool.stamp(map, x, y);
                stamped += 1;
            }
        }
        stamped
    }

    /// Deepest underground tier: the walled lock over the dungeon, with a
    /// staircase down at its centre. Returns the staircase position.
    ///
    /// The site must be solid ground (no lava, no mob dungeon) for the whole
    /// footprint. At most one lock per chunk.
    pub fn dungeon_lock<M>(
        &self,
        map: &mut M,
        pos: ChunkPos,
        rng: &mut StdRng,
    ) -> Option<(i32, i32)>
    where
        M: TileMap + FurnitureSink,
    {
        let p = self.palette;
        let ground = [p.rock, p.dirt, p.lapis, p.ore(3)];
        let (ox, oy) = pos.origin();

        for _ in 0..LOCK_ATTEMPTS {
            let x = ox + rng.gen_range(2..CHUNK_SIZE - 2);
            let y = oy + rng.gen_range(2..CHUNK_SIZE - 2);
            if !all_match(map, x, y, 2, |t| ground.contains(&t)) {
                continue;
            }
            self.library
                .get(StructureKind::DungeonLock)
                .stamp(map, x, y);
            map.set_tile(x, y, p.stairs_down, 0);
            trace!(x, y, "dungeon lock");
            return Some((x, y));
        }
        None
    }

    /// Sky: the air wizard's house at the centre of chunk (0, 0) only.
    pub fn air_wizard_house<M>(&self, map: &mut M, pos: ChunkPos) -> usize
    where
        M: TileMap + FurnitureSink,
    {
        if pos != ChunkPos::new(0, 0) {
            return 0;
        }
        let (x, y) = (CHUNK_SIZE / 2, CHUNK_SIZE / 2);
        self.library
            .get(StructureKind::AirWizardHouse)
            .stamp(map, x, y);
        trace!(x, y, "air wizard house");
        1
    }

    /// Surface: a small cluster of houses on open grass, one chance in four
    /// per chunk.
    pub fn village<M>(&self, map: &mut M, pos: ChunkPos, rng: &mut StdRng) -> usize
    where
        M: TileMap + FurnitureSink,
    {
        if rng.gen_range(0..4) != 0 {
            return 0;
        }
        let (ox, oy) = pos.origin();
        let cx = ox + rng.gen_range(12..CHUNK_SIZE - 12);
        let cy = oy + rng.gen_range(12..CHUNK_SIZE - 12);
        let mut stamped = 0;

        for _ in 0..3 {
            let x = cx + rng.gen_range(-8..=8);
            let y = cy + rng.gen_range(-8..=8);
            if !all_of(map, x, y, 2, self.palette.grass) {
                continue;
            }
            let house = VILLAGE_HOUSES[rng.gen_range(0..VILLAGE_HOUSES.len())];
            self.library.get(house).stamp(map, x, y);
            if rng.gen_range(0..2) == 0 {
                let ruin = VILLAGE_RUINS[rng.gen_range(0..VILLAGE_RUINS.len())];
                self.library.get(ruin).stamp(map, x, y);
            }
            trace!(x, y, ?house, "village house");
            stamped += 1;
        }
        stamped
    }

    /// Underground: a walled room with a spawner and up to four arms.
    pub fn mob_dungeon<M>(&self, map: &mut M, pos: ChunkPos, rng: &mut StdRng) -> usize
    where
        M: TileMap + FurnitureSink,
    {
        if rng.gen_range(0..2) != 0 {
            return 0;
        }
        let (ox, oy) = pos.origin();
        let x = ox + rng.gen_range(12..CHUNK_SIZE - 12);
        let y = oy + rng.gen_range(12..CHUNK_SIZE - 12);
        if !all_of(map, x, y, 2, self.palette.rock) {
            return 0;
        }

        let mob = SPAWNER_MOBS[rng.gen_range(0..SPAWNER_MOBS.len())];
        self.library
            .get(StructureKind::MobDungeonCenter)
            .draw(map, x, y, |furniture| {
                if let Furniture::Spawner { mob: m } = furniture {
                    *m = mob;
                }
            });
        let mut stamped = 1;
        for (kind, dx, dy) in MOB_DUNGEON_ARMS {
            if rng.gen_range(0..2) == 0 {
                self.library.get(kind).stamp(map, x + dx, y + dy);
                stamped += 1;
            }
        }
        trace!(x, y, mob, arms = stamped - 1, "mob dungeon");
        stamped
    }
}
