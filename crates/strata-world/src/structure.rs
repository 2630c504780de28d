//! Hand-authored structure templates and stamping.
//!
//! A template is parsed once from a legend (`"W:obsidian wall,O:obsidian"`)
//! and a newline-delimited glyph grid, where `*` leaves the target cell
//! untouched. Stamping copies the tiles relative to an origin and hands
//! copies of the furniture prototypes to a `FurnitureSink`.
//!
//! Axis convention: grid row `r`, column `c` of a `w` x `h` pattern lands at
//! offset `(dx, dy) = (-w/2 + r, -h/2 + c)`. Rows map to x and columns to y,
//! so a pattern is placed transposed relative to how it reads in source.
//! Existing layouts depend on this; do not swap it back.

use std::collections::{BTreeMap, HashMap};

use crate::error::WorldError;
use crate::store::{FurnitureSink, TileMap};
use crate::tile::{TileId, TileRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanternKind {
    Normal,
    Iron,
    Gold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrafterKind {
    Workbench,
    Enchanter,
}

/// Furniture prototypes carried by structure templates.
#[derive(Debug, Clone, PartialEq)]
pub enum Furniture {
    Lantern(LanternKind),
    KnightStatue { health: u32 },
    /// A locked chest; `populated` flips once loot has been rolled for it.
    DungeonChest { populated: bool },
    Crafter(CrafterKind),
    Spawner { mob: &'static str },
}

/// An immutable pattern of tile offsets and furniture placements.
#[derive(Debug, Clone)]
pub struct StructureTemplate {
    name: &'static str,
    tiles: Vec<(i32, i32, TileId)>,
    furniture: BTreeMap<(i32, i32), Furniture>,
}

impl StructureTemplate {
    /// Parse a template from a legend and a glyph grid.
    pub fn parse(
        name: &'static str,
        legend: &str,
        pattern: &str,
        registry: &TileRegistry,
    ) -> Result<Self, WorldError> {
        let mut keys: HashMap<char, TileId> = HashMap::new();
        for entry in legend.split(',') {
            let (glyph, tile_name) = entry
                .split_once(':')
                .ok_or_else(|| WorldError::MalformedLegend {
                    entry: entry.to_string(),
                })?;
            let mut glyphs = glyph.trim().chars();
            let glyph = match (glyphs.next(), glyphs.next()) {
                (Some(g), None) if g != '*' => g,
                _ => {
                    return Err(WorldError::MalformedLegend {
                        entry: entry.to_string(),
                    })
                }
            };
            keys.insert(glyph, registry.get(tile_name.trim())?);
        }

        let rows: Vec<&str> = pattern.lines().collect();
        let width = rows.first().map_or(0, |r| r.chars().count());
        let height = rows.len();
        if width == 0 {
            return Err(WorldError::EmptyTemplate);
        }

        let mut tiles = Vec::new();
        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(WorldError::RaggedTemplate {
                    row,
                    expected: width,
                    found,
                });
            }
            for (column, glyph) in line.chars().enumerate() {
                if glyph == '*' {
                    continue;
                }
                let tile = *keys
                    .get(&glyph)
                    .ok_or(WorldError::UndeclaredGlyph { glyph, row, column })?;
                let dx = -(width as i32) / 2 + row as i32;
                let dy = -(height as i32) / 2 + column as i32;
                tiles.push((dx, dy, tile));
            }
        }

        Ok(Self {
            name,
            tiles,
            furniture: BTreeMap::new(),
        })
    }

    /// Attach a furniture prototype at offset (`dx`, `dy`).
    pub fn with_furniture(mut self, dx: i32, dy: i32, furniture: Furniture) -> Self {
        self.furniture.insert((dx, dy), furniture);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tile offsets in placement order.
    pub fn tiles(&self) -> &[(i32, i32, TileId)] {
        &self.tiles
    }

    pub fn furniture(&self) -> impl Iterator<Item = ((i32, i32), &Furniture)> {
        self.furniture.iter().map(|(&p, f)| (p, f))
    }

    /// Inclusive bounding box of the tile offsets: `(min_dx, min_dy, max_dx, max_dy)`.
    pub fn footprint(&self) -> (i32, i32, i32, i32) {
        self.tiles.iter().fold(
            (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
            |(x0, y0, x1, y1), &(dx, dy, _)| (x0.min(dx), y0.min(dy), x1.max(dx), y1.max(dy)),
        )
    }

    /// Stamp the template at (`x`, `y`).
    ///
    /// Tiles are written first (data word 0). Each furniture prototype is then
    /// cloned, passed through `handler`, and handed to `target`.
    pub fn draw<T, F>(&self, target: &mut T, x: i32, y: i32, mut handler: F)
    where
        T: TileMap + FurnitureSink,
        F: FnMut(&mut Furniture),
    {
        for &(dx, dy, tile) in &self.tiles {
            target.set_tile(x + dx, y + dy, tile, 0);
        }
        for (&(dx, dy), prototype) in &self.furniture {
            let mut instance = prototype.clone();
            handler(&mut instance);
            target.add_furniture(instance, x + dx, y + dy);
        }
    }

    /// `draw` with furniture left as authored.
    pub fn stamp<T: TileMap + FurnitureSink>(&self, target: &mut T, x: i32, y: i32) {
        self.draw(target, x, y, |_| {});
    }
}

/// Every authored structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StructureKind {
    DungeonGate,
    DungeonLock,
    DungeonBossRoom,
    DungeonSpawner,
    LavaPool,
    OrnateLavaPool,
    DungeonGarden,
    DungeonChest,
    MobDungeonCenter,
    MobDungeonNorth,
    MobDungeonSouth,
    MobDungeonEast,
    MobDungeonWest,
    AirWizardHouse,
    VillageHouseNormal,
    VillageHouseTwoDoor,
    VillageRuinedOverlay1,
    VillageRuinedOverlay2,
}

/// Static definition of one template.
struct StructureDef {
    kind: StructureKind,
    name: &'static str,
    legend: &'static str,
    pattern: &'static str,
    furniture: &'static [(i32, i32, Furniture)],
}

const FORTIFIED_ROOM: &str = "\
WWWDWWW
WOOOOOW
WOFFFOW
DOFFFOD
WOFFFOW
WOOOOOW
WWWDWWW";

static STRUCTURE_DEFS: &[StructureDef] = &[
    StructureDef {
        kind: StructureKind::DungeonGate,
        name: "dungeon gate",
        legend: "O:obsidian,D:obsidian door,W:obsidian wall",
        pattern: "WWDWW\nWOOOW\nDOOOD\nWOOOW\nWWDWW",
        furniture: &[(-1, -1, Furniture::Lantern(LanternKind::Iron))],
    },
    StructureDef {
        kind: StructureKind::DungeonLock,
        name: "dungeon lock",
        legend: "O:obsidian,W:obsidian wall",
        pattern: "WWWWW\nWOOOW\nWOOOW\nWOOOW\nWWWWW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::DungeonBossRoom,
        name: "dungeon boss room",
        legend: "O:obsidian boss floor,D:obsidian boss door,W:obsidian boss wall",
        pattern: "\
WWWWDWWWW
WOOOOOOOW
WOOOOOOOW
WOOOOOOOW
DOOOOOOOD
WOOOOOOOW
WOOOOOOOW
WOOOOOOOW
WWWWDWWWW",
        furniture: &[(0, 0, Furniture::KnightStatue { health: 5000 })],
    },
    StructureDef {
        kind: StructureKind::DungeonSpawner,
        name: "dungeon spawner",
        legend: "F:grass,W:obsidian wall,O:ornate obsidian,D:obsidian door",
        pattern: FORTIFIED_ROOM,
        furniture: &[(0, 0, Furniture::Spawner { mob: "knight" })],
    },
    StructureDef {
        kind: StructureKind::LavaPool,
        name: "lava pool",
        legend: "L:lava",
        pattern: "LL\nLL",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::OrnateLavaPool,
        name: "ornate lava pool",
        legend: "F:lava,W:obsidian wall,O:ornate obsidian,D:obsidian door",
        pattern: FORTIFIED_ROOM,
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::DungeonGarden,
        name: "dungeon garden",
        legend: "F:flower,W:obsidian wall,O:ornate obsidian,D:obsidian door",
        pattern: FORTIFIED_ROOM,
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::DungeonChest,
        name: "dungeon chest",
        legend: "F:grass,W:obsidian wall,O:ornate obsidian,D:obsidian door",
        pattern: FORTIFIED_ROOM,
        furniture: &[(0, 0, Furniture::DungeonChest { populated: false })],
    },
    StructureDef {
        kind: StructureKind::MobDungeonCenter,
        name: "mob dungeon center",
        legend: "B:stone bricks,W:stone wall",
        pattern: "WWBWW\nWBBBW\nBBBBB\nWBBBW\nWWBWW",
        furniture: &[(0, 0, Furniture::Spawner { mob: "skeleton" })],
    },
    StructureDef {
        kind: StructureKind::MobDungeonNorth,
        name: "mob dungeon north",
        legend: "B:stone bricks,W:stone wall",
        pattern: "WWWWW\nWBBBB\nBBBBB\nWBBBB\nWWWWW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::MobDungeonSouth,
        name: "mob dungeon south",
        legend: "B:stone bricks,W:stone wall",
        pattern: "WWWWW\nBBBBW\nBBBBB\nBBBBW\nWWWWW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::MobDungeonEast,
        name: "mob dungeon east",
        legend: "B:stone bricks,W:stone wall",
        pattern: "WBBBW\nWBBBW\nWBBBW\nWBBBW\nWWBWW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::MobDungeonWest,
        name: "mob dungeon west",
        legend: "B:stone bricks,W:stone wall",
        pattern: "WWBWW\nWBBBW\nWBBBW\nWBBBW\nWBBBW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::AirWizardHouse,
        name: "air wizard house",
        legend: "F:wood planks,W:wood wall,D:wood door",
        pattern: "WWWWWWW\nWFFFFFW\nDFFFFFW\nWFFFFFW\nWWWWWWW",
        furniture: &[
            (-2, 0, Furniture::Lantern(LanternKind::Gold)),
            (0, 0, Furniture::Crafter(CrafterKind::Enchanter)),
        ],
    },
    StructureDef {
        kind: StructureKind::VillageHouseNormal,
        name: "village house",
        legend: "F:wood planks,W:wood wall,D:wood door,G:grass",
        pattern: "WWWWW\nWFFFW\nWFFFD\nWFFFG\nWWWWW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::VillageHouseTwoDoor,
        name: "village house (two doors)",
        legend: "F:wood planks,W:wood wall,D:wood door,G:grass",
        pattern: "WWWWW\nWFFFW\nDFFFW\nWFFFW\nWWDWW",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::VillageRuinedOverlay1,
        name: "ruined village overlay 1",
        legend: "G:grass,F:wood planks",
        pattern: "**FG*\nF*GG*\n*G**F\nG*G**\n***G*",
        furniture: &[],
    },
    StructureDef {
        kind: StructureKind::VillageRuinedOverlay2,
        name: "ruined village overlay 2",
        legend: "G:grass,F:wood planks",
        pattern: "F**G*\n*****\n*GG**\nF**G*\n*F**G",
        furniture: &[],
    },
];

/// Every authored template, parsed once and shared read-only.
pub struct StructureLibrary {
    templates: HashMap<StructureKind, StructureTemplate>,
}

impl StructureLibrary {
    /// Parse all structure definitions against `registry`.
    pub fn load(registry: &TileRegistry) -> Result<Self, WorldError> {
        let mut templates = HashMap::with_capacity(STRUCTURE_DEFS.len());
        for def in STRUCTURE_DEFS {
            let mut template =
                StructureTemplate::parse(def.name, def.legend, def.pattern, registry)?;
            for (dx, dy, furniture) in def.furniture {
                template = template.with_furniture(*dx, *dy, furniture.clone());
            }
            templates.insert(def.kind, template);
        }
        Ok(Self { templates })
    }

    pub fn get(&self, kind: StructureKind) -> &StructureTemplate {
        // `load` parses every `StructureKind`, so the entry always exists.
        &self.templates[&kind]
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
