//! World-shape and theme settings, level kinds, and the per-call generation
//! context.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::WorldError;

/// Settings key holding the world shape tag.
pub const SHAPE_KEY: &str = "world.shape";
/// Settings key holding the world theme tag.
pub const THEME_KEY: &str = "world.theme";

/// Overall shape of the surface level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Island,
    Box,
    Mountain,
    Irregular,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [Self::Island, Self::Box, Self::Mountain, Self::Irregular];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Island => "island",
            Self::Box => "box",
            Self::Mountain => "mountain",
            Self::Irregular => "irregular",
        }
    }
}

impl FromStr for ShapeKind {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| WorldError::UnknownShape(s.to_string()))
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoration theme of the surface level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeKind {
    #[default]
    Normal,
    Hell,
    Desert,
    Forest,
    Plain,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 5] = [
        Self::Normal,
        Self::Hell,
        Self::Desert,
        Self::Forest,
        Self::Plain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Hell => "hell",
            Self::Desert => "desert",
            Self::Forest => "forest",
            Self::Plain => "plain",
        }
    }
}

impl FromStr for ThemeKind {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| WorldError::UnknownTheme(s.to_string()))
    }
}

impl fmt::Display for ThemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vertical stratum of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Sky,
    Surface,
    /// Underground tier, 1 (shallowest) to 3.
    Underground(u8),
    Dungeon,
}

/// Depth of the sky level.
pub const SKY_DEPTH: i32 = 1;
/// Depth of the dungeon level.
pub const DUNGEON_DEPTH: i32 = -4;

impl LevelKind {
    /// Level kind for a depth: 1 is the sky, 0 the surface, -1..=-3 the
    /// underground tiers and -4 the dungeon.
    pub fn from_depth(depth: i32) -> Option<Self> {
        match depth {
            SKY_DEPTH => Some(Self::Sky),
            0 => Some(Self::Surface),
            -3..=-1 => Some(Self::Underground((-depth) as u8)),
            DUNGEON_DEPTH => Some(Self::Dungeon),
            _ => None,
        }
    }

    pub fn depth(self) -> i32 {
        match self {
            Self::Sky => SKY_DEPTH,
            Self::Surface => 0,
            Self::Underground(d) => -(d as i32),
            Self::Dungeon => DUNGEON_DEPTH,
        }
    }
}

/// Opaque string key/value settings store.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: HashMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// World shape, defaulting to island when the key is absent.
    pub fn shape(&self) -> Result<ShapeKind, WorldError> {
        self.get(SHAPE_KEY).map_or(Ok(ShapeKind::default()), str::parse)
    }

    /// World theme, defaulting to normal when the key is absent.
    pub fn theme(&self) -> Result<ThemeKind, WorldError> {
        self.get(THEME_KEY).map_or(Ok(ThemeKind::default()), str::parse)
    }
}

/// Inputs of one chunk-generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationContext {
    pub world_seed: u64,
    pub level_depth: i32,
    pub shape: ShapeKind,
    pub theme: ThemeKind,
}

impl GenerationContext {
    pub fn new(world_seed: u64, level_depth: i32, shape: ShapeKind, theme: ThemeKind) -> Self {
        Self {
            world_seed,
            level_depth,
            shape,
            theme,
        }
    }

    /// Read shape and theme out of `settings`.
    pub fn from_settings(
        world_seed: u64,
        level_depth: i32,
        settings: &Settings,
    ) -> Result<Self, WorldError> {
        Ok(Self::new(
            world_seed,
            level_depth,
            settings.shape()?,
            settings.theme()?,
        ))
    }

    pub fn level(&self) -> Option<LevelKind> {
        LevelKind::from_depth(self.level_depth)
    }
}

/// Seed for the per-chunk random stream of chunk (`cx`, `cy`) at `depth`.
pub fn chunk_seed(world_seed: u64, depth: i32, cx: i32, cy: i32) -> u64 {
    world_seed
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(depth as u64)
        .wrapping_mul(341_873_128_712)
        .wrapping_add(cx as u64)
        .wrapping_mul(132_897_987_541)
        .wrapping_add(cy as u64)
        .wrapping_add(0x57A7_A)
}
