//! Per-level terrain classification.
//!
//! Each level kind samples a handful of independent noise layers over the
//! chunk and turns the combined values into tiles. The thresholds below are
//! fixed tuning constants; changing any of them changes every world.

use rand::rngs::StdRng;
use rand::Rng;

use crate::noise::{NoiseField, PerlinNoise};
use crate::settings::{ShapeKind, ThemeKind};
use crate::store::{ChunkPos, TileMap, CHUNK_SIZE};
use crate::tile::{TileId, TilePalette};

const S: usize = CHUNK_SIZE as usize;

/// Coarse terrain class on the surface, resolved to a tile per theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceTerrain {
    Liquid,
    Rock,
    Ground,
}

/// One threshold test on the surface ridge (`val`) and vein (`m_val`) values.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub val_below: Option<f64>,
    pub val_above: Option<f64>,
    pub m_below: Option<f64>,
    pub terrain: SurfaceTerrain,
}

impl Band {
    const fn below(val: f64, terrain: SurfaceTerrain) -> Self {
        Self {
            val_below: Some(val),
            val_above: None,
            m_below: None,
            terrain,
        }
    }

    /// `val > 0.5 && m_val < -1.5`: the elevated band shared by every shape.
    const fn ridge(terrain: SurfaceTerrain) -> Self {
        Self {
            val_below: None,
            val_above: Some(0.5),
            m_below: Some(-1.5),
            terrain,
        }
    }

    fn matches(&self, val: f64, m_val: f64) -> bool {
        self.val_below.map_or(true, |t| val < t)
            && self.val_above.map_or(true, |t| val > t)
            && self.m_below.map_or(true, |t| m_val < t)
    }
}

/// Surface classification for one world shape: the first matching band
/// wins, otherwise `fallback`.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceRule {
    pub bands: [Band; 2],
    pub fallback: SurfaceTerrain,
}

impl SurfaceRule {
    pub fn classify(&self, val: f64, m_val: f64) -> SurfaceTerrain {
        self.bands
            .iter()
            .find(|band| band.matches(val, m_val))
            .map_or(self.fallback, |band| band.terrain)
    }
}

static ISLAND: SurfaceRule = SurfaceRule {
    bands: [
        Band::below(-0.5, SurfaceTerrain::Liquid),
        Band::ridge(SurfaceTerrain::Rock),
    ],
    fallback: SurfaceTerrain::Ground,
};

static BOX: SurfaceRule = SurfaceRule {
    bands: [
        Band::below(-1.5, SurfaceTerrain::Liquid),
        Band::ridge(SurfaceTerrain::Rock),
    ],
    fallback: SurfaceTerrain::Ground,
};

static MOUNTAIN: SurfaceRule = SurfaceRule {
    bands: [
        Band::below(-0.4, SurfaceTerrain::Ground),
        Band::ridge(SurfaceTerrain::Liquid),
    ],
    fallback: SurfaceTerrain::Rock,
};

static IRREGULAR: SurfaceRule = SurfaceRule {
    bands: [
        Band {
            val_below: Some(-0.5),
            val_above: None,
            m_below: Some(-0.5),
            terrain: SurfaceTerrain::Liquid,
        },
        Band::ridge(SurfaceTerrain::Rock),
    ],
    fallback: SurfaceTerrain::Ground,
};

impl ShapeKind {
    pub fn surface_rule(self) -> &'static SurfaceRule {
        match self {
            Self::Island => &ISLAND,
            Self::Box => &BOX,
            Self::Mountain => &MOUNTAIN,
            Self::Irregular => &IRREGULAR,
        }
    }
}

impl ThemeKind {
    /// Tile placed wherever the surface calls for open liquid.
    pub fn liquid(self, palette: &TilePalette) -> TileId {
        match self {
            Self::Hell => palette.lava,
            _ => palette.water,
        }
    }
}

/// `|a - b| * scale + offset`.
#[inline]
fn ridge(a: f64, b: f64, scale: f64, offset: f64) -> f64 {
    (a - b).abs() * scale + offset
}

/// `||a - b| - c| * 3 - 2`: thin vein/cavity lines.
#[inline]
fn vein(a: f64, b: f64, c: f64) -> f64 {
    ((a - b).abs() - c).abs() * 3.0 - 2.0
}

/// Converts sampled noise into tiles for one chunk.
pub struct TerrainClassifier<'a> {
    noise: &'a PerlinNoise,
    palette: &'a TilePalette,
}

impl<'a> TerrainClassifier<'a> {
    pub fn new(noise: &'a PerlinNoise, palette: &'a TilePalette) -> Self {
        Self { noise, palette }
    }

    fn field(&self, pos: ChunkPos, feature_size: i32, layer: i32) -> NoiseField {
        let (ox, oy) = pos.origin();
        NoiseField::new(self.noise, ox, oy, S, S, feature_size, layer)
    }

    /// Write `f(i)` to every cell, `i` being the row-major cell index.
    fn fill<M, F>(&self, map: &mut M, pos: ChunkPos, mut f: F)
    where
        M: TileMap,
        F: FnMut(usize) -> TileId,
    {
        let (ox, oy) = pos.origin();
        for ly in 0..S {
            for lx in 0..S {
                let tile = f(lx + ly * S);
                map.set_tile(ox + lx as i32, oy + ly as i32, tile, 0);
            }
        }
    }

    /// Surface: returns the world coordinates of every rock cell, which are
    /// the staircase candidates for this chunk.
    pub fn surface<M: TileMap>(
        &self,
        map: &mut M,
        pos: ChunkPos,
        shape: ShapeKind,
        theme: ThemeKind,
    ) -> Vec<(i32, i32)> {
        let m1 = self.field(pos, 16, 0);
        let m2 = self.field(pos, 16, 1);
        let m3 = self.field(pos, 16, 2);
        let n1 = self.field(pos, 32, 3);
        let n2 = self.field(pos, 32, 4);

        let rule = shape.surface_rule();
        let liquid = theme.liquid(self.palette);
        let (ox, oy) = pos.origin();
        let mut rocks = Vec::new();

        self.fill(map, pos, |i| {
            let val = ridge(n1.values()[i], n2.values()[i], 3.0, -1.0);
            let m_val = vein(m1.values()[i], m2.values()[i], m3.values()[i]);
            match rule.classify(val, m_val) {
                SurfaceTerrain::Liquid => liquid,
                SurfaceTerrain::Ground => self.palette.grass,
                SurfaceTerrain::Rock => {
                    rocks.push((ox + (i % S) as i32, oy + (i / S) as i32));
                    self.palette.rock
                }
            }
        });
        rocks
    }

    /// Underground tier `depth` in `1..=3`.
    pub fn underground<M: TileMap>(&self, map: &mut M, pos: ChunkPos, depth: u8) {
        let base = depth as i32 * 11;
        let m = [0, 1, 2].map(|k| self.field(pos, 16, base + k));
        let n = [3, 4, 5].map(|k| self.field(pos, 16, base + k));
        let w = [6, 7, 8].map(|k| self.field(pos, 16, base + k));
        let a = self.field(pos, 32, base + 9);
        let b = self.field(pos, 32, base + 10);

        let liquid = match depth {
            3 => self.palette.lava,
            1 => self.palette.dirt,
            _ => self.palette.water,
        };
        let liquid_cutoff = -1.0 + depth as f64 / 2.0 * 3.0;
        let p = self.palette;

        self.fill(map, pos, |i| {
            let val = ridge(a.values()[i], b.values()[i], 3.0, -2.0);
            let m_val = vein(m[0].values()[i], m[1].values()[i], m[2].values()[i]);
            let n_val = vein(n[0].values()[i], n[1].values()[i], n[2].values()[i]);
            let w_val = vein(w[0].values()[i], w[1].values()[i], w[2].values()[i]);

            if val > -1.0 && w_val < liquid_cutoff {
                liquid
            } else if val > -2.0 && (m_val < -1.7 || n_val < -1.4) {
                p.dirt
            } else {
                p.rock
            }
        });
    }

    /// Dungeon: walls and lava seams on a floor of mixed obsidian and dirt.
    pub fn dungeon<M: TileMap>(&self, map: &mut M, pos: ChunkPos, rng: &mut StdRng) {
        let a = self.field(pos, 10, 0);
        let b = self.field(pos, 10, 1);
        let p = self.palette;

        self.fill(map, pos, |i| {
            let val = ridge(a.values()[i], b.values()[i], -3.0, 3.5);
            // Walls need |a - b| > 1.18, which gradient noise seldom reaches:
            // about 0.03% of cells at seed 0, in thin seams.
            if val < -0.05 {
                p.obsidian_wall
            } else if val < -0.03 {
                p.lava
            } else if rng.gen_range(0..2) == 1 {
                if rng.gen_range(0..2) == 1 {
                    p.obsidian
                } else {
                    p.raw_obsidian
                }
            } else {
                p.dirt
            }
        });
    }

    /// Sky: walkable cloud over a fall-through void.
    pub fn sky<M: TileMap>(&self, map: &mut M, pos: ChunkPos) {
        let a = self.field(pos, 8, 0);
        let b = self.field(pos, 8, 1);
        let p = self.palette;

        self.fill(map, pos, |i| {
            let val = -ridge(a.values()[i], b.values()[i], 3.0, -2.0) - 2.2 + 1.75;
            if val < -0.25 {
                p.infinite_fall
            } else {
                p.cloud
            }
        });
    }
}
