/// Headless driver: load a level, run the simulation on autopilot, report.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use glam::Vec2;
use tracing_subscriber::EnvFilter;

use beyond_shadows::config::GameConfig;
use beyond_shadows::domain::entity::FrameInput;
use beyond_shadows::error::Result;
use beyond_shadows::sim::event::GameEvent;
use beyond_shadows::sim::level::{embedded_level, load_level_file, LevelData};
use beyond_shadows::sim::step::step;
use beyond_shadows::sim::world::{Phase, WorldState};

/// Ticks spent walking in one direction before the autopilot turns.
const AUTOPILOT_LEG: u64 = 120;
/// The autopilot only throws at enemies closer than this.
const AUTOPILOT_RANGE: f32 = 400.0;

/// Run a level of Beyond the Shadows headlessly.
#[derive(Parser, Debug)]
#[command(name = "beyond-shadows")]
#[command(about = "Run the Beyond the Shadows simulation without a display")]
struct Args {
    /// Level file (.mapdata); falls back to the config, then the built-in level
    #[arg(long)]
    level: Option<PathBuf>,

    /// Config file; otherwise config.toml is searched next to the binary and in the CWD
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// RNG seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Default, Debug)]
struct Tally {
    thrown: u32,
    exploded: u32,
    double_exploded: u32,
    enemies_killed: u32,
    damage_taken: i32,
    upgrades: u32,
    particles: u32,
}

impl Tally {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PotionThrown { .. } => self.thrown += 1,
            GameEvent::PotionExploded { .. } => self.exploded += 1,
            GameEvent::PotionDoubleExploded { .. } => self.double_exploded += 1,
            GameEvent::EnemyKilled { .. } => self.enemies_killed += 1,
            GameEvent::PlayerDamaged { damage, .. } => self.damage_taken += damage,
            GameEvent::UpgradeCollected { .. } => self.upgrades += 1,
            GameEvent::Particle(_) => self.particles += 1,
            GameEvent::EnemyDamaged { .. } | GameEvent::EnemyActivated { .. } | GameEvent::PlayerKilled => {}
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beyond_shadows=info")))
        .init();

    let args = Args::parse();
    let mut config = GameConfig::load(args.config.as_deref());
    if let Some(seed) = args.seed {
        config.general.seed = seed;
    }
    let ticks = args.ticks.unwrap_or(config.general.ticks);

    let level = match load_level(args.level.or_else(|| config.general.level_path.clone())) {
        Ok(level) => level,
        Err(e) => {
            tracing::error!("could not load level: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut world = match WorldState::from_level(&level, config) {
        Ok(world) => world,
        Err(e) => {
            tracing::error!("could not build world: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut tally = Tally::default();
    for _ in 0..ticks {
        let input = autopilot(&world);
        for event in step(&mut world, input) {
            tally.record(&event);
        }
        if world.phase == Phase::GameOver {
            break;
        }
    }

    tracing::info!(
        ticks = world.tick,
        phase = ?world.phase,
        health = world.player_health(),
        enemies_left = world.live_enemy_count(),
        upgrades_left = world.upgrade_count(),
        lit = %format!("{:.1}%", world.lit_fraction() * 100.0),
        "run finished"
    );
    tracing::info!(?tally, modifiers = ?world.modifiers, "run summary");
    ExitCode::SUCCESS
}

fn load_level(path: Option<PathBuf>) -> Result<LevelData> {
    match path {
        Some(path) => load_level_file(&path),
        None => {
            tracing::info!("no level given, using the built-in level");
            embedded_level()
        }
    }
}

/// Walk a square, throwing at the nearest live enemy in range.
fn autopilot(world: &WorldState) -> FrameInput {
    let (move_x, move_y) = match (world.tick / AUTOPILOT_LEG) % 4 {
        0 => (1, 0),
        1 => (0, 1),
        2 => (-1, 0),
        _ => (0, -1),
    };

    let (px, py) = world.player_rect().center();
    let player = Vec2::new(px as f32, py as f32);
    let aim = world
        .enemies
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| {
            let (ex, ey) = e.rect().center();
            Vec2::new(ex as f32, ey as f32) - player
        })
        .filter(|offset| offset.length() < AUTOPILOT_RANGE)
        .min_by(|a, b| a.length().total_cmp(&b.length()));

    FrameInput {
        move_x,
        move_y,
        attack: aim.is_some(),
        aim: aim.unwrap_or(Vec2::ZERO),
    }
}
