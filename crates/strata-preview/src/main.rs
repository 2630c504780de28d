mod config;

use std::collections::BTreeMap;
use std::io::{self, BufWriter, Write};

use config::PreviewConfig;
use strata_world::{World, CHUNK_SIZE};
use tracing::{error, info};

fn glyph(name: &str) -> char {
    match name {
        "grass" => '.',
        "dirt" => ',',
        "flower" => '*',
        "sand" => ':',
        "cactus" => '!',
        "tree" => 'T',
        "water" => '~',
        "lava" => '%',
        "rock" => '#',
        "iron ore" | "gold ore" | "gem ore" => '$',
        "lapis" => '&',
        "stairs down" => '>',
        "stairs up" => '<',
        "cloud" => '-',
        "cloud cactus" => '+',
        "infinite fall" => ' ',
        "obsidian" | "raw obsidian" | "ornate obsidian" => 'o',
        "obsidian wall" | "stone wall" | "wood wall" | "obsidian boss wall" => 'W',
        "obsidian door" | "wood door" | "obsidian boss door" => 'D',
        "stone bricks" | "wood planks" | "obsidian boss floor" => '=',
        _ => '?',
    }
}

fn render<W: Write>(
    world: &World,
    depth: i32,
    width: i32,
    height: i32,
    out: &mut W,
) -> io::Result<()> {
    let registry = world.registry();
    for y in 0..height {
        let line: String = (0..width)
            .map(|x| {
                let tile = world.get_tile(depth, x, y);
                registry.name(tile).map_or('?', glyph)
            })
            .collect();
        writeln!(out, "{line}")?;
    }
    out.flush()
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "preview.toml".into());
    let config = match PreviewConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    info!(
        "Strata preview v{} (seed: {}, shape: {}, theme: {})",
        env!("CARGO_PKG_VERSION"),
        config.world.seed,
        config.world.shape,
        config.world.theme
    );

    let mut world = match World::new(config.world.seed, &config.settings()) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Invalid world settings: {e}");
            std::process::exit(1);
        }
    };

    let depth = config.preview.level;
    let (chunks_x, chunks_y) = (config.preview.chunks_x, config.preview.chunks_y);
    if let Err(e) = world.create_map(depth, chunks_x, chunks_y) {
        error!("Could not generate level {depth}: {e}");
        std::process::exit(1);
    }
    info!("Generated {}x{} chunks of level {}", chunks_x, chunks_y, depth);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let (width, height) = (chunks_x * CHUNK_SIZE, chunks_y * CHUNK_SIZE);
    if let Err(e) = render(&world, depth, width, height, &mut out) {
        eprintln!("Failed to write map: {e}");
        std::process::exit(1);
    }

    let Some(level) = world.level(depth) else {
        return;
    };
    let mut histogram: BTreeMap<&str, usize> = BTreeMap::new();
    let mut furniture = 0;
    for chunk in level.chunks() {
        for tile in chunk.tiles() {
            let name = world.registry().name(tile).unwrap_or("?");
            *histogram.entry(name).or_default() += 1;
        }
        furniture += chunk.furniture().len();
    }
    for (name, count) in &histogram {
        info!("{name}: {count}");
    }
    info!("Furniture staged: {furniture}");
}
