//! Tile-world generation: noise, chunk storage, terrain, decoration,
//! structures, staircases and the multi-level world.

pub mod error;
pub mod features;
pub mod generator;
pub mod noise;
pub mod scatter;
pub mod settings;
pub mod stairs;
pub mod store;
pub mod structure;
pub mod terrain;
pub mod tile;
pub mod world;

pub use error::WorldError;
pub use generator::{ChunkGenerator, GenerationReport};
pub use settings::{GenerationContext, LevelKind, Settings, ShapeKind, ThemeKind};
pub use store::{Chunk, ChunkPos, ChunkStage, ChunkStore, FurnitureSink, TileMap, CHUNK_SIZE};
pub use structure::{Furniture, StructureKind, StructureLibrary, StructureTemplate};
pub use tile::{TileId, TilePalette, TileRegistry};
pub use world::World;
