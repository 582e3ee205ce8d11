use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::Parser;

use lumen_config::{BuildingLightDef, LightingConfig, MatLightDef};
use lumen_engine::{LightingEngine, RenderBuffer};
use lumen_light::{LightCell, raster::plot_circle};
use lumen_world::{Building, BuildingKind, MatPair, MemoryWorld, TileShape};

/// Lights a small demo scene and prints the result as ASCII shades.
#[derive(Parser, Debug)]
#[command(name = "lumen", about = "Tile-grid lighting demo")]
struct Args {
    /// Light configuration file (TOML); built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frames to simulate before printing.
    #[arg(long, default_value_t = 3)]
    frames: u32,
    /// Ray worker threads; 0 sizes to the machine.
    #[arg(long, default_value_t = 0)]
    threads: usize,
    /// Use anti-aliased rays.
    #[arg(long)]
    smooth: bool,
    /// Hour of day for the sky, 0..24.
    #[arg(long, default_value_t = 10.0)]
    hour: f32,
}

const STONE: MatPair = MatPair::new(0, 1);
const TORCH_KEY: (i32, i32, i32) = (42, 0, -1);
const BRIGHTNESS_RAMP: &[u8] = b" .:-=+*#%@";

/// A roofed circular keep on open ground: sun outside, one torch inside.
fn demo_world() -> MemoryWorld {
    let mut world = MemoryWorld::new(2, 2, 2);
    world.z_level = 0;
    world.fill_level(0, TileShape::Floor, STONE);
    let (cx, cy, r) = (16, 16, 9);
    plot_circle(cx, cy, r, |x, y| {
        world.set_shape(x, y, 0, TileShape::Wall);
        world.set_material(x, y, 0, STONE);
    });
    // Roof the interior so only the torch lights it.
    for x in cx - r..=cx + r {
        for y in cy - r..=cy + r {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r * r {
                world.set_shape(x, y, 1, TileShape::Wall);
                world.set_material(x, y, 1, STONE);
            }
        }
    }
    world.buildings.push(Building {
        key: TORCH_KEY,
        x: cx,
        y: cy,
        z: 0,
        complete: true,
        powered: false,
        kind: BuildingKind::Plain,
        material: STONE,
    });
    world
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => LightingConfig::from_path(path).unwrap_or_else(|e| {
            log::warn!("could not load {}: {e}; using defaults", path.display());
            LightingConfig::default()
        }),
        None => LightingConfig::default(),
    };
    cfg.day_hour = args.hour;
    cfg.buildings.entry(TORCH_KEY).or_insert(BuildingLightDef {
        light: {
            let mut torch = MatLightDef::emitting(LightCell::new(0.9, 0.75, 0.4), 8);
            torch.flicker = true;
            torch
        },
        ..BuildingLightDef::default()
    });

    let mut world = demo_world();
    let target = Arc::new(Mutex::new(RenderBuffer::new(0, 0)));
    let mut engine = LightingEngine::new(cfg, target.clone(), args.threads, args.smooth)?;

    for frame in 0..args.frames.max(1) {
        let start = Instant::now();
        engine.calculate(&world);
        log::info!("frame {frame} in {:?}", start.elapsed());
        world.tick += 1;
    }

    let buf = target.lock().unwrap_or_else(|p| p.into_inner());
    let mut out = String::new();
    for y in 0..buf.h {
        for x in 0..buf.w {
            let level = buf.get(x, y).max_channel().clamp(0.0, 1.0);
            let i = (level * (BRIGHTNESS_RAMP.len() - 1) as f32).round() as usize;
            out.push(BRIGHTNESS_RAMP[i] as char);
        }
        out.push('\n');
    }
    print!("{out}");
    Ok(())
}
