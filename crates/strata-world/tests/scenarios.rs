//! # Generation scenarios
//!
//! End-to-end checks of whole generated chunks through the public API.

use std::sync::Arc;

use strata_world::noise::NoiseField;
use strata_world::stairs::STAIR_RADIUS;
use strata_world::{
    ChunkGenerator, ChunkStage, ChunkStore, GenerationContext, ShapeKind, StructureLibrary,
    ThemeKind, TileId, TileMap, TilePalette, TileRegistry, CHUNK_SIZE,
};

fn generator(seed: u64, depth: i32, shape: ShapeKind, theme: ThemeKind) -> ChunkGenerator {
    let registry = Arc::new(TileRegistry::with_defaults());
    let library = Arc::new(StructureLibrary::load(&registry).unwrap());
    ChunkGenerator::new(registry, library, GenerationContext::new(seed, depth, shape, theme))
        .unwrap()
}

/// Generate a `n` x `n` block of chunks into one store.
fn generate_map(g: &ChunkGenerator, n: i32) -> (ChunkStore, Vec<(i32, i32)>) {
    let mut store = ChunkStore::new(g.context().level_depth);
    let mut stairs = Vec::new();
    for cy in 0..n {
        for cx in 0..n {
            let report = g.generate_into(&mut store, cx, cy).unwrap();
            stairs.extend(report.stairs);
        }
    }
    (store, stairs)
}

fn neighbours(x: i32, y: i32) -> impl Iterator<Item = (i32, i32)> {
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (x + dx, y + dy)))
        .filter(move |&p| p != (x, y))
}

/// Test: seed 0, island, plain. Mixed terrain, stairs on a 2x2 map, no cacti.
#[test]
fn test_island_plain_seed_zero() {
    let g = generator(0, 0, ShapeKind::Island, ThemeKind::Plain);
    let p = g.palette();

    let chunk = g.generate(0, 0).unwrap();
    let kinds = [p.grass, p.water, p.rock]
        .iter()
        .filter(|&&t| chunk.count(t) > 0)
        .count();
    assert!(kinds >= 2, "chunk (0, 0) is a single terrain kind");

    let (store, stairs) = generate_map(&g, 2);
    assert!(!stairs.is_empty(), "no staircase on a 2x2 map");
    let cacti: usize = store.chunks().map(|c| c.count(p.cactus)).sum();
    assert_eq!(cacti, 0, "cactus outside the desert");
}

/// Test: every surface cell is one of the shape's tiles, for every shape.
#[test]
fn test_surface_classification_coverage() {
    for shape in ShapeKind::ALL {
        let g = generator(77, 0, shape, ThemeKind::Normal);
        let p = g.palette();
        let registry = g.registry();
        let allowed: Vec<TileId> = [
            "grass", "water", "rock", "sand", "tree", "flower", "stairs down",
            "wood planks", "wood wall", "wood door",
        ]
        .iter()
        .map(|n| registry.get(n).unwrap())
        .collect();

        let chunk = g.generate(-1, 2).unwrap();
        assert_eq!(chunk.count(TileId::VOID), 0, "{shape}: unassigned cells");
        for tile in chunk.tiles() {
            assert!(allowed.contains(&tile), "{shape}: unexpected {:?}", registry.name(tile));
        }
        assert_eq!(chunk.count(p.lava), 0);
    }
}

/// Test: the dungeon holds only its own palette and rooms, no open terrain.
#[test]
fn test_dungeon_palette() {
    let g = generator(0, -4, ShapeKind::Island, ThemeKind::Normal);
    let p: &TilePalette = g.palette();
    let registry = g.registry();
    let mut allowed = vec![p.obsidian_wall, p.lava, p.obsidian, p.raw_obsidian, p.dirt];
    // Fortified room floors and trim, and the boss room.
    allowed.extend([p.grass, p.flower]);
    for name in [
        "ornate obsidian",
        "obsidian door",
        "obsidian boss floor",
        "obsidian boss wall",
        "obsidian boss door",
    ] {
        allowed.push(registry.get(name).unwrap());
    }

    for (cx, cy) in [(0, 0), (1, 0), (-3, 5)] {
        let chunk = g.generate(cx, cy).unwrap();
        for tile in chunk.tiles() {
            assert!(
                allowed.contains(&tile),
                "chunk ({cx}, {cy}): {:?} in the dungeon",
                registry.name(tile)
            );
        }
        for surface in [p.water, p.sand, p.tree, p.rock] {
            assert_eq!(chunk.count(surface), 0);
        }
    }

    let boss_floor = registry.get("obsidian boss floor").unwrap();
    assert!(g.generate(0, 0).unwrap().count(boss_floor) > 0);
    assert_eq!(g.generate(1, 0).unwrap().count(boss_floor), 0);
}

/// Test: the sky is cloud, fall or the wizard's house, and cloud cacti never
/// touch the fall.
#[test]
fn test_sky_level() {
    let g = generator(0, 1, ShapeKind::Island, ThemeKind::Normal);
    let p = g.palette();
    let (store, _) = generate_map(&g, 2);
    let registry = g.registry();
    let house: Vec<TileId> = ["wood planks", "wood wall", "wood door"]
        .iter()
        .map(|n| registry.get(n).unwrap())
        .collect();

    let mut cacti = 0;
    for y in 0..2 * CHUNK_SIZE {
        for x in 0..2 * CHUNK_SIZE {
            let tile = store.get_tile(x, y);
            assert!(
                [p.cloud, p.infinite_fall, p.cloud_cactus, p.stairs_down].contains(&tile)
                    || house.contains(&tile),
                "unexpected sky tile at ({x}, {y})"
            );
            if tile == p.cloud_cactus {
                cacti += 1;
                for (nx, ny) in neighbours(x, y) {
                    assert_ne!(store.get_tile(nx, ny), p.infinite_fall, "cactus at ({x}, {y})");
                }
            }
        }
    }
    assert!(cacti > 0, "no cloud cactus on a 2x2 sky");
}

/// Test: stairs placed by one call sit in solid rock, spaced apart.
#[test]
fn test_staircase_isolation() {
    for depth in [0, -1, -2] {
        let g = generator(31, depth, ShapeKind::Mountain, ThemeKind::Normal);
        let p = g.palette();
        for (cx, cy) in [(0, 0), (2, 1), (-1, -1)] {
            let mut store = ChunkStore::new(depth);
            let report = g.generate_into(&mut store, cx, cy).unwrap();
            for (i, &(x, y)) in report.stairs.iter().enumerate() {
                assert_eq!(store.get_tile(x, y), p.stairs_down);
                for (nx, ny) in neighbours(x, y) {
                    assert_eq!(store.get_tile(nx, ny), p.rock, "depth {depth}: ({x}, {y})");
                }
                for &(ox, oy) in &report.stairs[i + 1..] {
                    assert!(
                        (ox - x).abs() > STAIR_RADIUS || (oy - y).abs() > STAIR_RADIUS,
                        "depth {depth}: ({x}, {y}) and ({ox}, {oy}) too close"
                    );
                }
            }
        }
    }
}

/// Test: two independently built generators agree bit for bit.
#[test]
fn test_determinism_across_generators() {
    for depth in -4..=1 {
        let a = generator(555, depth, ShapeKind::Irregular, ThemeKind::Desert)
            .generate(3, -2)
            .unwrap();
        let b = generator(555, depth, ShapeKind::Irregular, ThemeKind::Desert)
            .generate(3, -2)
            .unwrap();
        assert!(a.tiles().eq(b.tiles()), "tiles differ at depth {depth}");
        assert_eq!(a.data_words(), b.data_words(), "data differs at depth {depth}");
        assert_eq!(a.stage(), ChunkStage::Finished);
    }
}

/// Test: a desert actually grows cacti on its sand.
#[test]
fn test_desert_has_cacti() {
    let g = generator(8, 0, ShapeKind::Island, ThemeKind::Desert);
    let p = g.palette();
    let (store, _) = generate_map(&g, 2);
    let cacti: usize = store.chunks().map(|c| c.count(p.cactus)).sum();
    let sand: usize = store.chunks().map(|c| c.count(p.sand)).sum();
    assert!(sand > 0);
    assert!(cacti > 0);
}

/// Test: noise fields repeat with their own width and height.
#[test]
fn test_noise_periodicity() {
    let field = NoiseField::from_seed(9, 128, -64, 64, 32, 16, 3);
    for (x, y) in [(0, 0), (5, 7), (63, 31), (-3, 40)] {
        assert_eq!(field.sample(x, y), field.sample(x + 64, y));
        assert_eq!(field.sample(x, y), field.sample(x, y + 32));
    }
}
