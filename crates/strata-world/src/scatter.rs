//! Clustered decoration placement.
//!
//! A scatter pass picks cluster centres inside the chunk, spreads a few
//! sub-centres around each, then paints jittered cells around every
//! sub-centre. Cells are only painted where the current tile is the pass's
//! substrate, so the order of passes matters: sand runs before trees, trees
//! before flowers, flowers before cacti.

use rand::rngs::StdRng;
use rand::Rng;

use crate::settings::ThemeKind;
use crate::store::{ChunkPos, TileMap, CHUNK_SIZE};
use crate::tile::{TileId, TilePalette};

const CELLS: i32 = CHUNK_SIZE * CHUNK_SIZE;

/// Random offset applied around a centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// Uniform in `-r..=r`.
    Uniform(i32),
    /// `rand(up) - rand(down)`, peaked around zero.
    Spread { up: i32, down: i32 },
}

impl Jitter {
    fn offset(self, rng: &mut StdRng) -> i32 {
        match self {
            Self::Uniform(0) => 0,
            Self::Uniform(r) => rng.gen_range(-r..=r),
            Self::Spread { up, down } => rng.gen_range(0..up) - rng.gen_range(0..down),
        }
    }
}

/// Cells painted around each jittered point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Brush {
    Cell,
    Block3x3,
}

/// Data word written alongside a painted tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRule {
    Zero,
    /// Per-cluster base colour `rand(4) * rand(4)` plus a per-cell `rand(3)`.
    FlowerVariant,
}

/// One painting step of a cluster.
#[derive(Debug, Clone, Copy)]
pub struct Stroke {
    pub jitter: Jitter,
    pub attempts: u32,
    pub tile: TileId,
    pub data: DataRule,
}

impl Stroke {
    pub fn new(tile: TileId, jitter: Jitter, attempts: u32) -> Self {
        Self {
            jitter,
            attempts,
            tile,
            data: DataRule::Zero,
        }
    }

    pub fn with_data(mut self, data: DataRule) -> Self {
        self.data = data;
        self
    }
}

/// A three-level cluster scatter pass.
#[derive(Debug, Clone)]
pub struct ClusterScatter {
    /// One cluster per this many chunk cells.
    pub per_cells: i32,
    /// Cluster centres are drawn at least this far from the chunk edge.
    pub inset: i32,
    pub spread: Jitter,
    pub spread_attempts: u32,
    pub strokes: Vec<Stroke>,
    pub brush: Brush,
    pub substrate: TileId,
    /// Reject a cell if any tile of its 3x3 neighbourhood is this one.
    pub avoid: Option<TileId>,
}

impl ClusterScatter {
    /// Single-stroke pass with no sub-centre spread.
    pub fn new(per_cells: i32, substrate: TileId, stroke: Stroke) -> Self {
        Self {
            per_cells,
            inset: 0,
            spread: Jitter::Uniform(0),
            spread_attempts: 1,
            strokes: vec![stroke],
            brush: Brush::Cell,
            substrate,
            avoid: None,
        }
    }

    pub fn spread(mut self, spread: Jitter, attempts: u32) -> Self {
        self.spread = spread;
        self.spread_attempts = attempts;
        self
    }

    pub fn then(mut self, stroke: Stroke) -> Self {
        self.strokes.push(stroke);
        self
    }

    pub fn brush(mut self, brush: Brush) -> Self {
        self.brush = brush;
        self
    }

    pub fn inset(mut self, inset: i32) -> Self {
        self.inset = inset;
        self
    }

    pub fn avoiding(mut self, tile: TileId) -> Self {
        self.avoid = Some(tile);
        self
    }

    /// Number of clusters this pass places in one chunk.
    pub fn clusters(&self) -> i32 {
        CELLS / self.per_cells
    }

    /// Run the pass over chunk `pos`, returning the number of cells painted.
    pub fn apply<M: TileMap>(&self, map: &mut M, pos: ChunkPos, rng: &mut StdRng) -> usize {
        let (ox, oy) = pos.origin();
        let span = CHUNK_SIZE - 2 * self.inset;
        let mut painted = 0;

        for _ in 0..self.clusters() {
            let cx = ox + self.inset + rng.gen_range(0..span);
            let cy = oy + self.inset + rng.gen_range(0..span);
            let base = if self.strokes.iter().any(|s| s.data == DataRule::FlowerVariant) {
                rng.gen_range(0..4u16) * rng.gen_range(0..4u16)
            } else {
                0
            };

            for _ in 0..self.spread_attempts {
                let sx = cx + self.spread.offset(rng);
                let sy = cy + self.spread.offset(rng);
                for stroke in &self.strokes {
                    for _ in 0..stroke.attempts {
                        let x = sx + stroke.jitter.offset(rng);
                        let y = sy + stroke.jitter.offset(rng);
                        let data = match stroke.data {
                            DataRule::Zero => 0,
                            DataRule::FlowerVariant => base + rng.gen_range(0..3u16),
                        };
                        painted += self.paint(map, pos, x, y, stroke.tile, data);
                    }
                }
            }
        }
        painted
    }

    fn paint<M: TileMap>(
        &self,
        map: &mut M,
        pos: ChunkPos,
        x: i32,
        y: i32,
        tile: TileId,
        data: u16,
    ) -> usize {
        if let Some(avoid) = self.avoid {
            let blocked = (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| (x + dx, y + dy)))
                .any(|(nx, ny)| map.get_tile(nx, ny) == avoid);
            if blocked {
                return 0;
            }
        }

        let radius = match self.brush {
            Brush::Cell => 0,
            Brush::Block3x3 => 1,
        };
        let mut painted = 0;
        for yy in y - radius..=y + radius {
            for xx in x - radius..=x + radius {
                if pos.contains(xx, yy) && map.get_tile(xx, yy) == self.substrate {
                    map.set_tile(xx, yy, tile, data);
                    painted += 1;
                }
            }
        }
        painted
    }
}

/// Surface decoration passes for `theme`, in run order.
pub fn surface_passes(palette: &TilePalette, theme: ThemeKind) -> Vec<ClusterScatter> {
    let p = palette;
    let mut passes = Vec::new();

    let sand_ratio = if theme == ThemeKind::Desert { 200 } else { 2800 };
    passes.push(
        ClusterScatter::new(
            sand_ratio,
            p.grass,
            Stroke::new(p.sand, Jitter::Spread { up: 5, down: 5 }, 100),
        )
        .spread(Jitter::Uniform(10), 10)
        .brush(Brush::Block3x3),
    );

    let forest = theme == ThemeKind::Forest;
    let plain = theme == ThemeKind::Plain;
    let tree_ratios = [
        (forest, 200),
        (!forest && !plain, 1200),
        (plain, 2800),
        (!plain, 400),
    ];
    for (_, ratio) in tree_ratios.into_iter().filter(|(on, _)| *on) {
        passes.push(ClusterScatter::new(
            ratio,
            p.grass,
            Stroke::new(p.tree, Jitter::Spread { up: 15, down: 15 }, 200),
        ));
    }

    passes.push(ClusterScatter::new(
        400,
        p.grass,
        Stroke::new(p.flower, Jitter::Spread { up: 5, down: 5 }, 30)
            .with_data(DataRule::FlowerVariant),
    ));

    if theme == ThemeKind::Desert {
        passes.push(ClusterScatter::new(
            100,
            p.sand,
            Stroke::new(p.cactus, Jitter::Uniform(0), 1),
        ));
    }
    passes
}

/// Ore vein pass for underground tier `depth`.
pub fn underground_passes(palette: &TilePalette, depth: u8) -> Vec<ClusterScatter> {
    vec![ClusterScatter::new(
        200,
        palette.rock,
        Stroke::new(palette.ore(depth), Jitter::Spread { up: 5, down: 5 }, 30),
    )
    .then(Stroke::new(palette.lapis, Jitter::Spread { up: 3, down: 2 }, 10))]
}

/// Cloud cactus pass for the sky level.
pub fn sky_passes(palette: &TilePalette) -> Vec<ClusterScatter> {
    vec![ClusterScatter::new(
        50,
        palette.cloud,
        Stroke::new(palette.cloud_cactus, Jitter::Uniform(0), 1),
    )
    .inset(1)
    .avoiding(palette.infinite_fall)]
}
