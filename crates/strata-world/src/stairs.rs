//! Staircase placement and linking between adjacent levels.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::trace;

use crate::store::{Chunk, ChunkPos, FurnitureSink, TileMap, CHUNK_SIZE};
use crate::structure::StructureTemplate;
use crate::tile::TileId;

/// No two staircases placed by one generation call lie closer than this.
pub const STAIR_RADIUS: i32 = 15;

/// Where staircase candidates come from.
#[derive(Debug, Clone)]
pub enum Candidates {
    /// Draw from this list at random, removing each drawn entry.
    List(Vec<(i32, i32)>),
    /// Draw uniformly inside the chunk, at least `inset` from its edge.
    Random { inset: i32 },
}

impl Candidates {
    fn draw(&mut self, pos: ChunkPos, rng: &mut StdRng) -> Option<(i32, i32)> {
        match self {
            Self::List(list) if list.is_empty() => None,
            Self::List(list) => Some(list.swap_remove(rng.gen_range(0..list.len()))),
            Self::Random { inset } => {
                let (ox, oy) = pos.origin();
                let span = CHUNK_SIZE - 2 * *inset;
                Some((
                    ox + *inset + rng.gen_range(0..span),
                    oy + *inset + rng.gen_range(0..span),
                ))
            }
        }
    }
}

/// Places isolated staircases inside one chunk.
#[derive(Debug, Clone, Copy)]
pub struct StaircasePlacer {
    pub stair: TileId,
    pub substrate: TileId,
    pub radius: i32,
    pub budget: u32,
    pub attempts: u32,
}

impl StaircasePlacer {
    pub fn new(stair: TileId, substrate: TileId, budget: u32, attempts: u32) -> Self {
        Self {
            stair,
            substrate,
            radius: STAIR_RADIUS,
            budget,
            attempts,
        }
    }

    /// Place up to `budget` staircases, returning where they went. Running
    /// out of candidates or attempts is not an error.
    pub fn place<M: TileMap>(
        &self,
        map: &mut M,
        pos: ChunkPos,
        mut candidates: Candidates,
        rng: &mut StdRng,
    ) -> Vec<(i32, i32)> {
        let mut placed = Vec::new();
        for _ in 0..self.attempts {
            if placed.len() as u32 >= self.budget {
                break;
            }
            let Some((x, y)) = candidates.draw(pos, rng) else {
                break;
            };
            if self.accepts(map, pos, x, y) {
                map.set_tile(x, y, self.stair, 0);
                trace!(x, y, "staircase placed");
                placed.push((x, y));
            }
        }
        placed
    }

    /// Cells outside the chunk never count as substrate, so the answer does
    /// not depend on which neighbouring chunks `map` already holds.
    fn accepts<M: TileMap>(&self, map: &M, pos: ChunkPos, x: i32, y: i32) -> bool {
        for yy in y - 1..=y + 1 {
            for xx in x - 1..=x + 1 {
                if !pos.contains(xx, yy) || map.get_tile(xx, yy) != self.substrate {
                    return false;
                }
            }
        }

        let (ox, oy) = pos.origin();
        let (x0, x1) = ((x - self.radius).max(ox), (x + self.radius).min(ox + CHUNK_SIZE - 1));
        let (y0, y1) = ((y - self.radius).max(oy), (y + self.radius).min(oy + CHUNK_SIZE - 1));
        for yy in y0..=y1 {
            for xx in x0..=x1 {
                if map.get_tile(xx, yy) == self.stair {
                    return false;
                }
            }
        }
        true
    }
}

/// What surrounds a staircase arriving from the level above.
#[derive(Debug, Clone, Copy)]
pub enum Landing<'a> {
    /// Overwrite the 8 neighbours with this floor tile.
    Ring(TileId),
    /// Stamp this structure centred on the staircase first.
    Structure(&'a StructureTemplate),
}

/// Mirror every `stairs_down` in `upper` as `stairs_up` at the same
/// coordinates of `lower`. Returns the linked positions.
pub fn link_stairs<M>(
    upper: &Chunk,
    lower: &mut M,
    stairs_down: TileId,
    stairs_up: TileId,
    landing: Landing<'_>,
) -> Vec<(i32, i32)>
where
    M: TileMap + FurnitureSink,
{
    let (ox, oy) = upper.pos().origin();
    let size = CHUNK_SIZE as usize;
    let mut linked = Vec::new();

    for ly in 0..size {
        for lx in 0..size {
            if upper.tile(lx, ly) != stairs_down {
                continue;
            }
            let (x, y) = (ox + lx as i32, oy + ly as i32);
            match landing {
                Landing::Structure(template) => template.stamp(lower, x, y),
                Landing::Ring(floor) => {
                    for yy in y - 1..=y + 1 {
                        for xx in x - 1..=x + 1 {
                            lower.set_tile(xx, yy, floor, 0);
                        }
                    }
                }
            }
            lower.set_tile(x, y, stairs_up, 0);
            linked.push((x, y));
        }
    }
    linked
}
