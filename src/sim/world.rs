/// WorldState: the complete snapshot of a running level.
///
/// ## Layers
///
///   - `grid`    : collision tiles and rooms. Built once, never mutated.
///   - `lighting`: shadow cells plus every live light. Lights are owned
///     here; entities only hold their handles.
///   - entities  : player, enemies, pickups and potions.
///
/// ## Read access for the presentation layer
///
/// Darkness per shadow cell, entity rects and health, and live enemy /
/// upgrade counts. Nothing here performs I/O.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::GameConfig;
use crate::domain::ai::{Enemy, Targeting};
use crate::domain::entity::Player;
use crate::domain::geometry::Rect;
use crate::domain::lighting::LightingGrid;
use crate::domain::potion::PotionHandler;
use crate::domain::tile::TileGrid;
use crate::domain::upgrade::{RunModifiers, Upgrade};
use crate::error::Result;
use super::level::LevelData;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    GameOver,
}

pub struct WorldState {
    pub config: GameConfig,
    pub grid: TileGrid,
    pub lighting: LightingGrid,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub upgrades: Vec<Upgrade>,
    pub potions: PotionHandler,
    pub modifiers: RunModifiers,
    pub rng: ChaCha8Rng,
    pub phase: Phase,
    pub tick: u64,
}

impl WorldState {
    /// Build a playable world. Any integrity problem in `level` is returned
    /// here; nothing later in the run can fail.
    pub fn from_level(level: &LevelData, config: GameConfig) -> Result<Self> {
        level.validate()?;

        let grid = TileGrid::build(
            level.width,
            level.height,
            &level.tiles,
            &level.rooms,
            config.map.tile_size,
            config.map.neighborhood_range,
        )?;
        let (world_w, world_h) = grid.world_size();
        let mut lighting = LightingGrid::covering(world_w, world_h, config.lighting.cell_size);

        let player = Player::spawn(grid.tile_center(level.player_spawn), &config.player, &mut lighting);

        let enemies = level
            .enemies
            .iter()
            .enumerate()
            .map(|(id, spawn)| {
                let tuning = spawn.kind.config(&config);
                let targeting = spawn.room.map_or(Targeting::Roaming, Targeting::Room);
                let offset = id as u32 % tuning.retarget_ticks.max(1);
                Enemy::new(id, spawn.kind, grid.tile_center(spawn.tile), targeting, tuning, offset)
            })
            .collect();

        let upgrades = level
            .upgrades
            .iter()
            .map(|spawn| {
                let (cx, cy) = grid.tile_center(spawn.tile);
                Upgrade::new(spawn.kind, (cx + spawn.offset.0, cy + spawn.offset.1), config.upgrades.size)
            })
            .collect();

        let world = WorldState {
            grid,
            lighting,
            player,
            enemies,
            upgrades,
            potions: PotionHandler::new(),
            modifiers: RunModifiers::from_config(&config.upgrades),
            rng: ChaCha8Rng::seed_from_u64(config.general.seed),
            phase: Phase::Playing,
            tick: 0,
            config,
        };
        tracing::info!(
            width = level.width,
            height = level.height,
            solid = world.grid.solid_count(),
            rooms = world.grid.room_count(),
            enemies = world.enemies.len(),
            upgrades = world.upgrades.len(),
            "world built"
        );
        Ok(world)
    }

    /// Darkness of a shadow cell, 255 = black.
    pub fn darkness_at(&self, cx: usize, cy: usize) -> u8 {
        self.lighting.darkness_at(cx, cy)
    }

    /// Shadow grid size in cells.
    pub fn shadow_size(&self) -> (usize, usize) {
        (self.lighting.width(), self.lighting.height())
    }

    pub fn player_rect(&self) -> &Rect {
        self.player.rect()
    }

    pub fn player_health(&self) -> i32 {
        self.player.body.health
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    pub fn upgrade_count(&self) -> usize {
        self.upgrades.len()
    }

    /// Share of shadow cells that are at least partly lit.
    pub fn lit_fraction(&self) -> f32 {
        let (w, h) = self.shadow_size();
        if w * h == 0 {
            return 0.0;
        }
        let lit = self.lighting.darkness_values().filter(|d| *d < 255).count();
        lit as f32 / (w * h) as f32
    }
}
