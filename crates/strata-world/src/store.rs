//! Chunk and chunk-store data structures.
//!
//! A level's tiles are kept in fixed-size square chunks, materialized on
//! first write. Reads outside the materialized region return
//! `TileId::VOID` instead of failing: generation routinely reads one ring
//! of cells past a chunk's edge.

use std::collections::HashMap;

use crate::structure::Furniture;
use crate::tile::TileId;

/// Edge length of a chunk, in tiles.
pub const CHUNK_SIZE: i32 = 64;

const CELLS: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Chunk coordinates (world tile coordinate divided by `CHUNK_SIZE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

impl ChunkPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing world tile (`x`, `y`).
    pub fn of_tile(x: i32, y: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            y: y.div_euclid(CHUNK_SIZE),
        }
    }

    /// World coordinates of the chunk's top-left tile.
    pub fn origin(self) -> (i32, i32) {
        (self.x * CHUNK_SIZE, self.y * CHUNK_SIZE)
    }

    /// Whether world tile (`x`, `y`) lies inside this chunk.
    pub fn contains(self, x: i32, y: i32) -> bool {
        Self::of_tile(x, y) == self
    }
}

/// Generation progress of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChunkStage {
    Unfinished,
    UnfinishedStairs,
    Finished,
}

/// A furniture instance waiting on a chunk that has not been published yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedFurniture {
    pub x: i32,
    pub y: i32,
    pub furniture: Furniture,
}

/// A `CHUNK_SIZE` x `CHUNK_SIZE` block of tiles with per-tile data words.
pub struct Chunk {
    pos: ChunkPos,
    depth: i32,
    stage: ChunkStage,
    /// Palette indices for each tile, row-major: `ly * CHUNK_SIZE + lx`.
    cells: Box<[u16]>,
    /// Tile handles referenced by `cells`.
    palette: Vec<TileId>,
    data: Box<[u16]>,
    furniture: Vec<PlacedFurniture>,
}

impl Chunk {
    /// A chunk filled with `fill`, in stage `Unfinished`.
    pub fn new(pos: ChunkPos, depth: i32, fill: TileId) -> Self {
        Self {
            pos,
            depth,
            stage: ChunkStage::Unfinished,
            cells: vec![0; CELLS].into_boxed_slice(),
            palette: vec![fill],
            data: vec![0; CELLS].into_boxed_slice(),
            furniture: Vec::new(),
        }
    }

    #[inline]
    fn index(lx: usize, ly: usize) -> usize {
        debug_assert!(lx < CHUNK_SIZE as usize && ly < CHUNK_SIZE as usize);
        ly * CHUNK_SIZE as usize + lx
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn stage(&self) -> ChunkStage {
        self.stage
    }

    pub fn set_stage(&mut self, stage: ChunkStage) {
        self.stage = stage;
    }

    /// Tile at local coordinates. `lx` and `ly` must be in `[0, CHUNK_SIZE)`.
    pub fn tile(&self, lx: usize, ly: usize) -> TileId {
        self.palette[self.cells[Self::index(lx, ly)] as usize]
    }

    /// Data word at local coordinates.
    pub fn data(&self, lx: usize, ly: usize) -> u16 {
        self.data[Self::index(lx, ly)]
    }

    /// Set the tile and data word at local coordinates.
    pub fn set(&mut self, lx: usize, ly: usize, tile: TileId, data: u16) {
        let palette_index = match self.palette.iter().position(|&t| t == tile) {
            Some(idx) => idx,
            None => {
                self.palette.push(tile);
                self.palette.len() - 1
            }
        };
        let i = Self::index(lx, ly);
        self.cells[i] = palette_index as u16;
        self.data[i] = data;
    }

    pub fn set_data(&mut self, lx: usize, ly: usize, data: u16) {
        self.data[Self::index(lx, ly)] = data;
    }

    /// Number of cells holding `tile`.
    pub fn count(&self, tile: TileId) -> usize {
        match self.palette.iter().position(|&t| t == tile) {
            Some(idx) => self.cells.iter().filter(|&&c| c as usize == idx).count(),
            None => 0,
        }
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = TileId> + '_ {
        self.cells.iter().map(|&c| self.palette[c as usize])
    }

    /// All data words in row-major order.
    pub fn data_words(&self) -> &[u16] {
        &self.data
    }

    /// Furniture staged on this chunk during generation.
    pub fn furniture(&self) -> &[PlacedFurniture] {
        &self.furniture
    }

    /// Hand the staged furniture over to whoever publishes the chunk.
    pub fn drain_furniture(&mut self) -> Vec<PlacedFurniture> {
        std::mem::take(&mut self.furniture)
    }
}

/// Read/write access to a tile grid in world coordinates.
pub trait TileMap {
    fn get_tile(&self, x: i32, y: i32) -> TileId;
    fn set_tile(&mut self, x: i32, y: i32, tile: TileId, data: u16);
    fn get_data(&self, x: i32, y: i32) -> u16;
    fn set_data(&mut self, x: i32, y: i32, data: u16);
}

/// Receives furniture instances placed by structure stamping.
pub trait FurnitureSink {
    fn add_furniture(&mut self, furniture: Furniture, x: i32, y: i32);
}

/// All materialized chunks of one level.
pub struct ChunkStore {
    depth: i32,
    chunks: HashMap<ChunkPos, Chunk>,
}

impl ChunkStore {
    pub fn new(depth: i32) -> Self {
        Self {
            depth,
            chunks: HashMap::new(),
        }
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&pos)
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut Chunk> {
        self.chunks.get_mut(&pos)
    }

    /// Chunk at `pos`, created empty if it does not exist yet.
    pub fn chunk_or_create(&mut self, pos: ChunkPos) -> &mut Chunk {
        let depth = self.depth;
        self.chunks
            .entry(pos)
            .or_insert_with(|| Chunk::new(pos, depth, TileId::VOID))
    }

    /// Publish a chunk, replacing any chunk at the same position.
    pub fn insert(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.pos(), chunk);
    }

    pub fn take(&mut self, pos: ChunkPos) -> Option<Chunk> {
        self.chunks.remove(&pos)
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Stage of chunk (`cx`, `cy`), or `None` if it was never touched.
    pub fn stage(&self, cx: i32, cy: i32) -> Option<ChunkStage> {
        self.chunk(ChunkPos::new(cx, cy)).map(Chunk::stage)
    }

    pub fn set_stage(&mut self, cx: i32, cy: i32, stage: ChunkStage) {
        self.chunk_or_create(ChunkPos::new(cx, cy)).set_stage(stage);
    }

    #[inline]
    fn local(x: i32, y: i32) -> (usize, usize) {
        (
            x.rem_euclid(CHUNK_SIZE) as usize,
            y.rem_euclid(CHUNK_SIZE) as usize,
        )
    }
}

impl TileMap for ChunkStore {
    fn get_tile(&self, x: i32, y: i32) -> TileId {
        let (lx, ly) = Self::local(x, y);
        self.chunk(ChunkPos::of_tile(x, y))
            .map_or(TileId::VOID, |c| c.tile(lx, ly))
    }

    fn set_tile(&mut self, x: i32, y: i32, tile: TileId, data: u16) {
        let (lx, ly) = Self::local(x, y);
        self.chunk_or_create(ChunkPos::of_tile(x, y))
            .set(lx, ly, tile, data);
    }

    fn get_data(&self, x: i32, y: i32) -> u16 {
        let (lx, ly) = Self::local(x, y);
        self.chunk(ChunkPos::of_tile(x, y))
            .map_or(0, |c| c.data(lx, ly))
    }

    fn set_data(&mut self, x: i32, y: i32, data: u16) {
        let (lx, ly) = Self::local(x, y);
        self.chunk_or_create(ChunkPos::of_tile(x, y))
            .set_data(lx, ly, data);
    }
}

impl FurnitureSink for ChunkStore {
    /// Stages the furniture on the owning chunk; nothing reaches the live
    /// world until the chunk is published.
    fn add_furniture(&mut self, furniture: Furniture, x: i32, y: i32) {
        self.chunk_or_create(ChunkPos::of_tile(x, y))
            .furniture
            .push(PlacedFurniture { x, y, furniture });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::LanternKind;

    fn tile(n: u16) -> TileId {
        crate::tile::TileRegistry::with_defaults().by_id(n).unwrap()
    }

    #[test]
    fn unmaterialized_reads_are_void() {
        let store = ChunkStore::new(0);
        assert_eq!(store.get_tile(10, -3), TileId::VOID);
        assert_eq!(store.get_data(10, -3), 0);
        assert!(store.is_empty(), "reads must not materialize chunks");
    }

    #[test]
    fn set_get_roundtrip_across_negative_coordinates() {
        let mut store = ChunkStore::new(0);
        store.set_tile(-1, -1, tile(3), 7);
        store.set_tile(CHUNK_SIZE, 0, tile(4), 0);
        assert_eq!(store.get_tile(-1, -1), tile(3));
        assert_eq!(store.get_data(-1, -1), 7);
        assert_eq!(store.get_tile(CHUNK_SIZE, 0), tile(4));
        assert_eq!(store.stage(-1, -1), Some(ChunkStage::Unfinished));
        assert_eq!(store.stage(1, 0), Some(ChunkStage::Unfinished));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn last_write_wins() {
        let mut store = ChunkStore::new(0);
        store.set_tile(5, 5, tile(2), 1);
        store.set_tile(5, 5, tile(9), 0);
        store.set_data(5, 5, 4);
        assert_eq!(store.get_tile(5, 5), tile(9));
        assert_eq!(store.get_data(5, 5), 4);
    }

    #[test]
    fn chunk_palette_growth() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), 0, TileId::VOID);
        chunk.set(0, 0, tile(1), 0);
        chunk.set(1, 0, tile(2), 0);
        chunk.set(2, 0, tile(1), 0);
        assert_eq!(chunk.palette.len(), 3);
        assert_eq!(chunk.count(tile(1)), 2);
        assert_eq!(chunk.count(TileId::VOID), CELLS - 3);
        assert_eq!(chunk.count(tile(5)), 0);
    }

    #[test]
    fn row_major_ordering() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0), 0, TileId::VOID);
        chunk.set(3, 2, tile(6), 9);
        let idx = 2 * CHUNK_SIZE as usize + 3;
        assert_eq!(chunk.palette[chunk.cells[idx] as usize], tile(6));
        assert_eq!(chunk.data_words()[idx], 9);
    }

    #[test]
    fn chunk_pos_of_negative_tiles() {
        assert_eq!(ChunkPos::of_tile(-1, 0), ChunkPos::new(-1, 0));
        assert_eq!(ChunkPos::of_tile(CHUNK_SIZE - 1, -CHUNK_SIZE), ChunkPos::new(0, -1));
        assert!(ChunkPos::new(1, 1).contains(CHUNK_SIZE, 2 * CHUNK_SIZE - 1));
        assert_eq!(ChunkPos::new(-2, 3).origin(), (-2 * CHUNK_SIZE, 3 * CHUNK_SIZE));
    }

    #[test]
    fn furniture_is_staged_on_owning_chunk() {
        let mut store = ChunkStore::new(-4);
        store.add_furniture(Furniture::Lantern(LanternKind::Iron), CHUNK_SIZE + 2, 3);
        assert!(store.chunk(ChunkPos::new(0, 0)).is_none());
        let chunk = store.chunk_mut(ChunkPos::new(1, 0)).unwrap();
        assert_eq!(chunk.furniture().len(), 1);
        let drained = chunk.drain_furniture();
        assert_eq!(drained[0].x, CHUNK_SIZE + 2);
        assert!(chunk.furniture().is_empty());
    }
}
