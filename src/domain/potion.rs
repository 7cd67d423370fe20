/// Potion lifecycle: thrown → exploded hazard → removed.
///
/// ## Flight
///
/// A thrown potion carries a small light and flies along a unit direction
/// with a velocity that decays every tick. It explodes when it stops, when it
/// touches a live enemy (dealing direct damage) or when its centre enters a
/// solid tile.
///
/// ## Hazard
///
/// An exploded potion becomes a hazard in the same handler pass and ticks
/// right away: a bright light over a square area with an energy pool. Every damage period each
/// overlapping enemy takes damage and drains one energy. With no enemy inside,
/// energy wears out slowly instead. At zero energy the hazard double-explodes
/// and is dropped, with its light, on the handler's following pass.

use std::f32::consts::SQRT_2;

use glam::Vec2;
use rand::Rng;

use super::ai::Enemy;
use super::entity::{countdown, Throw};
use super::geometry::Rect;
use super::lighting::{LightId, LightSource, LightingGrid};
use super::particle::{self, ParticleKind, ParticleSpawn};
use super::tile::TileGrid;
use super::upgrade::RunModifiers;
use crate::config::GameConfig;

/// Things a potion did this tick that the step reports outward.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PotionSignal {
    EnemyHit { enemy: usize, damage: i32, killed: bool },
    Exploded { position: Vec2, hit_enemy: bool },
    DoubleExploded { position: Vec2 },
    Particle(ParticleSpawn),
}

fn rect_around(position: Vec2, size: i32) -> Rect {
    Rect::from_center(position.x as i32, position.y as i32, size, size)
}

// ══════════════════════════════════════════════════════════════
// Thrown potion
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct PotionUnexploded {
    pub position: Vec2,
    pub direction: Vec2,
    pub velocity: f32,
    pub velocity_decay: f32,
    pub damage: i32,
    pub rect: Rect,
    pub light: Option<LightId>,
    pub exploded: bool,
    pub hit_enemy: bool,
}

impl PotionUnexploded {
    pub fn new(throw: Throw, velocity: f32, damage: i32, cfg: &GameConfig, lighting: &mut LightingGrid) -> Self {
        let light = lighting.add_light(LightSource::new(throw.origin, cfg.potion.brightness, cfg.potion.light_radius));
        PotionUnexploded {
            position: throw.origin,
            direction: throw.direction.normalize_or_zero(),
            velocity,
            velocity_decay: cfg.potion.velocity_decay,
            damage,
            rect: rect_around(throw.origin, cfg.potion.size),
            light: Some(light),
            exploded: false,
            hit_enemy: false,
        }
    }

    /// Mark exploded and drop the flight light. Returns false if it already was.
    pub fn explode(&mut self, lighting: &mut LightingGrid) -> bool {
        if self.exploded {
            return false;
        }
        self.exploded = true;
        if let Some(id) = self.light.take() {
            lighting.remove_light(id);
        }
        true
    }

    pub fn update(
        &mut self,
        grid: &TileGrid,
        enemies: &mut [Enemy],
        lighting: &mut LightingGrid,
        signals: &mut Vec<PotionSignal>,
    ) {
        if self.exploded {
            return;
        }
        if self.velocity <= 0.0 {
            self.explode_with_signal(lighting, signals);
            return;
        }

        self.position += self.direction * self.velocity;
        self.velocity -= self.velocity_decay;
        if let Some(id) = self.light {
            lighting.move_light(id, self.position);
        }
        self.rect.set_center(self.position.x as i32, self.position.y as i32);

        for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
            if self.rect.colliderect(enemy.rect()) {
                let killed = enemy.hit(self.damage);
                signals.push(PotionSignal::EnemyHit { enemy: enemy.id, damage: self.damage, killed });
                self.hit_enemy = true;
                self.explode_with_signal(lighting, signals);
            }
        }

        let (x, y) = (self.position.x, self.position.y);
        if grid.surrounding_tiles(x, y).iter().any(|tile| tile.collidepoint(x, y)) {
            self.explode_with_signal(lighting, signals);
        }
    }

    fn explode_with_signal(&mut self, lighting: &mut LightingGrid, signals: &mut Vec<PotionSignal>) {
        if self.explode(lighting) {
            tracing::debug!(x = self.position.x, y = self.position.y, hit_enemy = self.hit_enemy, "potion exploded");
            signals.push(PotionSignal::Exploded { position: self.position, hit_enemy: self.hit_enemy });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Hazard
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct PotionExploded {
    pub position: Vec2,
    pub rect: Rect,
    pub light: LightId,
    pub energy: i32,
    pub damage: i32,
    pub double_exploded: bool,
    damage_timer: u32,
    wear_out_timer: u32,
    particle_timer: u32,
}

impl PotionExploded {
    /// Hazard whose light has `radius` and whose square area has side
    /// `radius × √2`. `update_offset` delays the first damage tick.
    pub fn new(
        position: Vec2,
        radius: i32,
        energy: i32,
        update_offset: u32,
        cfg: &GameConfig,
        lighting: &mut LightingGrid,
    ) -> Self {
        let side = (radius as f32 * SQRT_2) as i32;
        let light = lighting.add_light(LightSource::new(position, cfg.hazard.brightness, radius));
        PotionExploded {
            position,
            rect: rect_around(position, side),
            light,
            energy,
            damage: cfg.hazard.damage,
            double_exploded: false,
            damage_timer: cfg.hazard.damage_ticks.max(1) + update_offset,
            wear_out_timer: cfg.hazard.wear_out_ticks.max(1),
            particle_timer: cfg.hazard.particle_ticks.max(1),
        }
    }

    /// Flag for removal and flash a shrinking burst light. Returns false if
    /// it already had.
    pub fn double_explode(&mut self, cfg: &GameConfig, lighting: &mut LightingGrid) -> bool {
        if self.double_exploded {
            return false;
        }
        self.double_exploded = true;
        let burst = &cfg.lighting;
        lighting.add_light(LightSource::shrinking(
            self.position,
            burst.burst_brightness,
            burst.burst_radius,
            burst.burst_lifespan,
            burst.shrink_floor_radius,
        ));
        tracing::debug!(x = self.position.x, y = self.position.y, "hazard double-exploded");
        true
    }

    fn double_explode_with_signal(&mut self, cfg: &GameConfig, lighting: &mut LightingGrid, signals: &mut Vec<PotionSignal>) {
        if self.double_explode(cfg, lighting) {
            signals.push(PotionSignal::DoubleExploded { position: self.position });
        }
    }

    /// Damage, else wear out, else drift particles.
    ///
    /// Wear-out only advances on ticks when no live enemy is inside, so a
    /// hazard holding an enemy spends its energy on damage alone.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        enemies: &mut [Enemy],
        cfg: &GameConfig,
        lighting: &mut LightingGrid,
        rng: &mut R,
        signals: &mut Vec<PotionSignal>,
    ) {
        if self.double_exploded {
            return;
        }

        let hazard = &cfg.hazard;
        let occupied = enemies.iter().any(|e| e.is_alive() && self.rect.colliderect(e.rect()));

        if occupied && countdown(&mut self.damage_timer, hazard.damage_ticks.max(1)) {
            for enemy in enemies.iter_mut().filter(|e| e.is_alive()) {
                if !self.rect.colliderect(enemy.rect()) {
                    continue;
                }
                let killed = enemy.hit(self.damage);
                signals.push(PotionSignal::EnemyHit { enemy: enemy.id, damage: self.damage, killed });
                self.energy -= 1;
                if self.energy <= 0 {
                    self.double_explode_with_signal(cfg, lighting, signals);
                    return;
                }
            }
            return;
        }

        if !occupied && countdown(&mut self.wear_out_timer, hazard.wear_out_ticks.max(1)) {
            self.energy -= 1;
            if self.energy <= 0 {
                self.double_explode_with_signal(cfg, lighting, signals);
            }
            return;
        }

        if countdown(&mut self.particle_timer, hazard.particle_ticks.max(1)) {
            let spawn = particle::drift(
                rng,
                ParticleKind::HazardGlow,
                self.position.x,
                self.position.y,
                hazard.particle_speed,
                hazard.particle_lifespan,
            );
            signals.push(PotionSignal::Particle(spawn));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Handler
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default)]
pub struct PotionHandler {
    pub unexploded: Vec<PotionUnexploded>,
    pub exploded: Vec<PotionExploded>,
    hazards_created: u32,
}

impl PotionHandler {
    pub fn new() -> Self {
        PotionHandler::default()
    }

    pub fn throw(&mut self, throw: Throw, mods: &RunModifiers, cfg: &GameConfig, lighting: &mut LightingGrid) {
        let potion = PotionUnexploded::new(throw, mods.throw_velocity as f32, mods.direct_damage, cfg, lighting);
        self.unexploded.push(potion);
    }

    /// One handler pass:
    ///   1. exploded flights become hazards, the rest fly
    ///   2. double-exploded hazards are dropped with their light, the rest tick
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        grid: &TileGrid,
        enemies: &mut [Enemy],
        mods: &RunModifiers,
        cfg: &GameConfig,
        lighting: &mut LightingGrid,
        rng: &mut R,
    ) -> Vec<PotionSignal> {
        let mut signals = vec![];

        let mut flights = std::mem::take(&mut self.unexploded);
        for potion in &mut flights {
            if !potion.exploded {
                potion.update(grid, enemies, lighting, &mut signals);
            }
        }
        let (landed, flying): (Vec<_>, Vec<_>) = flights.into_iter().partition(|p| p.exploded);
        self.unexploded = flying;
        // Converted potions join the hazards below and tick this pass.
        for potion in landed {
            self.spawn_hazard(&potion, mods, cfg, lighting);
        }

        let hazards = std::mem::take(&mut self.exploded);
        for mut hazard in hazards {
            if hazard.double_exploded {
                lighting.remove_light(hazard.light);
                continue;
            }
            hazard.update(enemies, cfg, lighting, rng, &mut signals);
            self.exploded.push(hazard);
        }

        signals
    }

    fn spawn_hazard(&mut self, potion: &PotionUnexploded, mods: &RunModifiers, cfg: &GameConfig, lighting: &mut LightingGrid) {
        let mut energy = mods.hazard_energy;
        if potion.hit_enemy {
            energy /= cfg.hazard.enemy_hit_divisor.max(1);
        }
        let offset = self.hazards_created % cfg.hazard.damage_ticks.max(1);
        self.hazards_created += 1;
        let hazard = PotionExploded::new(potion.position, mods.hazard_light_radius, energy.max(1), offset, cfg, lighting);
        self.exploded.push(hazard);
    }

    pub fn clear(&mut self, lighting: &mut LightingGrid) {
        for potion in &mut self.unexploded {
            potion.explode(lighting);
        }
        for hazard in &self.exploded {
            lighting.remove_light(hazard.light);
        }
        self.unexploded.clear();
        self.exploded.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.unexploded.is_empty() && self.exploded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::domain::ai::{EnemyKind, Targeting};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_grid() -> TileGrid {
        TileGrid::from_diagram(&[
            "........",
            "........",
            "........",
            "........",
        ], &[], 128)
    }

    fn lighting() -> LightingGrid {
        LightingGrid::covering(1024, 512, 16)
    }

    fn enemy_at(id: usize, center: (i32, i32), health: i32) -> Enemy {
        let tuning = AgentConfig { health, ..AgentConfig::wanderer() };
        Enemy::new(id, EnemyKind::Wanderer, center, Targeting::Roaming, &tuning, 0)
    }

    fn throw_right(x: f32, y: f32) -> Throw {
        Throw { origin: Vec2::new(x, y), direction: Vec2::X }
    }

    #[test]
    fn flight_moves_with_decaying_velocity_then_explodes() {
        let grid = open_grid();
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let mut potion = PotionUnexploded::new(throw_right(100.0, 200.0), 12.0, 10, &cfg, &mut lights);
        let mut signals = vec![];

        for _ in 0..12 {
            potion.update(&grid, &mut [], &mut lights, &mut signals);
            assert!(!potion.exploded);
        }
        assert_eq!(potion.position, Vec2::new(178.0, 200.0));
        assert!(signals.is_empty());

        potion.update(&grid, &mut [], &mut lights, &mut signals);
        assert!(potion.exploded);
        assert_eq!(potion.position, Vec2::new(178.0, 200.0));
        assert_eq!(lights.light_count(), 0);
        assert_eq!(signals, vec![PotionSignal::Exploded { position: Vec2::new(178.0, 200.0), hit_enemy: false }]);
    }

    #[test]
    fn flight_light_follows_potion() {
        let grid = open_grid();
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let mut potion = PotionUnexploded::new(throw_right(100.0, 200.0), 12.0, 10, &cfg, &mut lights);
        potion.update(&grid, &mut [], &mut lights, &mut vec![]);
        let id = potion.light.unwrap();
        assert_eq!(lights.light(id).unwrap().position, Vec2::new(112.0, 200.0));
    }

    #[test]
    fn explode_is_idempotent() {
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let other = lights.add_light(LightSource::new(Vec2::new(500.0, 300.0), 255, 48));
        let mut potion = PotionUnexploded::new(throw_right(100.0, 200.0), 12.0, 10, &cfg, &mut lights);

        assert!(potion.explode(&mut lights));
        let after_first: Vec<u8> = lights.darkness_values().collect();
        assert!(!potion.explode(&mut lights));
        assert_eq!(after_first, lights.darkness_values().collect::<Vec<u8>>());
        assert!(lights.contains(other));
    }

    #[test]
    fn double_explode_is_idempotent() {
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let mut hazard = PotionExploded::new(Vec2::new(300.0, 300.0), 80, 100, 0, &cfg, &mut lights);
        assert!(hazard.double_explode(&cfg, &mut lights));
        assert_eq!(lights.light_count(), 2);
        assert!(!hazard.double_explode(&cfg, &mut lights));
        assert_eq!(lights.light_count(), 2);
    }

    #[test]
    fn flight_explodes_inside_solid_tile() {
        let grid = TileGrid::from_diagram(&[
            "...#",
            "...#",
        ], &[], 128);
        let cfg = GameConfig::stock();
        let mut lights = LightingGrid::covering(512, 256, 16);
        let mut potion = PotionUnexploded::new(throw_right(380.0, 64.0), 12.0, 10, &cfg, &mut lights);
        let mut signals = vec![];
        potion.update(&grid, &mut [], &mut lights, &mut signals);
        assert!(potion.exploded);
        assert_eq!(potion.position.x, 392.0);
        assert_eq!(signals.len(), 1);
    }

    #[test]
    fn direct_hit_damages_every_overlapping_enemy() {
        let grid = open_grid();
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let mut enemies = vec![enemy_at(0, (120, 200), 100), enemy_at(1, (125, 210), 5), enemy_at(2, (600, 200), 100)];
        let mut potion = PotionUnexploded::new(throw_right(100.0, 200.0), 12.0, 10, &cfg, &mut lights);
        let mut signals = vec![];

        potion.update(&grid, &mut enemies, &mut lights, &mut signals);

        assert!(potion.exploded && potion.hit_enemy);
        assert_eq!(enemies[0].body.health, 90);
        assert!(!enemies[1].is_alive());
        assert_eq!(enemies[2].body.health, 100);
        let exploded = signals.iter().filter(|s| matches!(s, PotionSignal::Exploded { .. })).count();
        assert_eq!(exploded, 1);
        assert!(signals.contains(&PotionSignal::EnemyHit { enemy: 1, damage: 10, killed: true }));
    }

    #[test]
    fn hazard_with_enemy_double_explodes_after_energy_times_period() {
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut hazard = PotionExploded::new(Vec2::new(300.0, 300.0), 80, 100, 0, &cfg, &mut lights);
        let mut enemies = vec![enemy_at(0, (300, 300), 1000)];
        let mut signals = vec![];

        for tick in 1..=600 {
            assert!(!hazard.double_exploded, "double-exploded early at tick {tick}");
            hazard.update(&mut enemies, &cfg, &mut lights, &mut rng, &mut signals);
        }
        assert!(hazard.double_exploded);
        assert_eq!(hazard.energy, 0);
        assert_eq!(enemies[0].body.health, 900);
        assert_eq!(signals.last(), Some(&PotionSignal::DoubleExploded { position: Vec2::new(300.0, 300.0) }));
    }

    #[test]
    fn hazard_wears_out_when_empty_and_drifts_particles() {
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut hazard = PotionExploded::new(Vec2::new(300.0, 300.0), 80, 2, 0, &cfg, &mut lights);
        let mut signals = vec![];

        for _ in 0..18 {
            hazard.update(&mut [], &cfg, &mut lights, &mut rng, &mut signals);
        }
        assert_eq!(hazard.energy, 1);
        assert!(signals.iter().any(|s| matches!(s, PotionSignal::Particle(p) if p.kind == ParticleKind::HazardGlow)));

        for _ in 0..18 {
            hazard.update(&mut [], &cfg, &mut lights, &mut rng, &mut signals);
        }
        assert!(hazard.double_exploded);
    }

    #[test]
    fn hazard_rect_side_is_radius_times_root_two() {
        let cfg = GameConfig::stock();
        let mut lights = lighting();
        let hazard = PotionExploded::new(Vec2::new(300.0, 300.0), 80, 100, 0, &cfg, &mut lights);
        assert_eq!(hazard.rect.w, 113);
        assert_eq!(hazard.rect.center(), (300, 300));
    }

    #[test]
    fn handler_converts_then_removes_with_light() {
        let grid = open_grid();
        let cfg = GameConfig::stock();
        let mods = RunModifiers::from_config(&cfg.upgrades);
        let mut lights = lighting();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut handler = PotionHandler::new();
        let mut enemies = vec![enemy_at(0, (300, 200), 100)];

        handler.throw(throw_right(200.0, 200.0), &mods, &cfg, &mut lights);
        let signals = handler.update(&grid, &mut enemies, &mods, &cfg, &mut lights, &mut rng);
        assert!(signals.is_empty());

        // Flies into the enemy within a few ticks.
        let mut hit = false;
        for _ in 0..10 {
            let signals = handler.update(&grid, &mut enemies, &mods, &cfg, &mut lights, &mut rng);
            hit |= signals.iter().any(|s| matches!(s, PotionSignal::Exploded { hit_enemy: true, .. }));
            if !handler.exploded.is_empty() {
                break;
            }
        }
        assert!(hit);
        assert!(handler.unexploded.is_empty());
        assert_eq!(handler.exploded.len(), 1);
        assert_eq!(handler.exploded[0].energy, 100 / 5);

        handler.exploded[0].double_explode(&cfg, &mut lights);
        let hazard_light = handler.exploded[0].light;
        handler.update(&grid, &mut enemies, &mods, &cfg, &mut lights, &mut rng);
        assert!(handler.is_empty());
        assert!(!lights.contains(hazard_light));
    }

    #[test]
    fn clear_removes_every_potion_light() {
        let grid = open_grid();
        let cfg = GameConfig::stock();
        let mods = RunModifiers::from_config(&cfg.upgrades);
        let mut lights = lighting();
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut handler = PotionHandler::new();
        handler.throw(throw_right(200.0, 200.0), &mods, &cfg, &mut lights);
        handler.throw(Throw { origin: Vec2::new(200.0, 200.0), direction: Vec2::Y }, &mods, &cfg, &mut lights);
        for _ in 0..15 {
            handler.update(&grid, &mut [], &mods, &cfg, &mut lights, &mut rng);
        }
        handler.throw(throw_right(200.0, 200.0), &mods, &cfg, &mut lights);
        assert!(lights.light_count() > 0);

        handler.clear(&mut lights);
        assert!(handler.is_empty());
        assert_eq!(lights.light_count(), 0);
    }
}
