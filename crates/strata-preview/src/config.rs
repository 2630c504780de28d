use serde::Deserialize;
use std::path::Path;

use strata_world::settings::{SHAPE_KEY, THEME_KEY};
use strata_world::{Settings, ShapeKind, ThemeKind};

#[derive(Debug, Deserialize)]
pub struct PreviewConfig {
    pub world: WorldSection,
    #[serde(default)]
    pub preview: PreviewSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    pub seed: u64,
    #[serde(default)]
    pub shape: ShapeKind,
    #[serde(default)]
    pub theme: ThemeKind,
}

#[derive(Debug, Deserialize)]
pub struct PreviewSection {
    /// Level depth to render: 1 sky, 0 surface, -1..=-3 underground, -4 dungeon.
    #[serde(default)]
    pub level: i32,
    #[serde(default = "default_chunks")]
    pub chunks_x: i32,
    #[serde(default = "default_chunks")]
    pub chunks_y: i32,
}

fn default_chunks() -> i32 {
    2
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            level: 0,
            chunks_x: default_chunks(),
            chunks_y: default_chunks(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl PreviewConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// World settings as the generator reads them.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::new();
        settings.set(SHAPE_KEY, self.world.shape.as_str());
        settings.set(THEME_KEY, self.world.theme.as_str());
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [world]
            seed = 12345
            shape = "mountain"
            theme = "desert"

            [preview]
            level = -2
            chunks_x = 3

            [logging]
            level = "debug"
        "#;
        let config: PreviewConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.world.seed, 12345);
        assert_eq!(config.world.shape, ShapeKind::Mountain);
        assert_eq!(config.world.theme, ThemeKind::Desert);
        assert_eq!(config.preview.level, -2);
        assert_eq!(config.preview.chunks_x, 3);
        assert_eq!(config.preview.chunks_y, 2); // default
        assert_eq!(config.logging.level, "debug");

        let settings = config.settings();
        assert_eq!(settings.shape(), Ok(ShapeKind::Mountain));
        assert_eq!(settings.theme(), Ok(ThemeKind::Desert));
    }

    #[test]
    fn parse_minimal_config() {
        let config: PreviewConfig = toml::from_str("[world]\nseed = 0\n").unwrap();
        assert_eq!(config.world.shape, ShapeKind::Island);
        assert_eq!(config.world.theme, ThemeKind::Normal);
        assert_eq!(config.preview.level, 0);
        assert_eq!(config.preview.chunks_x, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let toml_str = r#"
            [world]
            seed = 1
            theme = "swamp"
        "#;
        assert!(toml::from_str::<PreviewConfig>(toml_str).is_err());
    }
}
