/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Potion handler (flights, hazards, conversions, removals)
///   2. Player movement (x then y)
///   3. Player update (attack cooldown, throw, torch follow)
///   4. Enemies: sweep the dead, then update → move each in turn
///   5. Upgrade pickups
///   6. Lighting tick (shrinking lights)
///
/// Input, camera, drawing and particle simulation live outside the core and
/// slot in around these phases.

use crate::domain::ai::Enemy;
use crate::domain::entity::FrameInput;
use crate::domain::particle::{self, ParticleKind};
use crate::domain::potion::PotionSignal;
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    resolve_potions(world, &mut events);
    resolve_player(world, &input, &mut events);
    if resolve_enemies(world, &mut events) { return events; }
    resolve_upgrades(world, &mut events);
    world.lighting.tick();

    events
}

// ══════════════════════════════════════════════════════════════
// Potions
// ══════════════════════════════════════════════════════════════

fn resolve_potions(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let signals = world.potions.update(
        &world.grid,
        &mut world.enemies,
        &world.modifiers,
        &world.config,
        &mut world.lighting,
        &mut world.rng,
    );

    for signal in signals {
        match signal {
            PotionSignal::EnemyHit { enemy, damage, killed } => {
                events.push(GameEvent::EnemyDamaged { id: enemy, damage });
                if killed {
                    events.push(GameEvent::EnemyKilled { id: enemy });
                }
            }
            PotionSignal::Exploded { position, hit_enemy } => {
                events.push(GameEvent::PotionExploded { x: position.x, y: position.y, hit_enemy });
            }
            PotionSignal::DoubleExploded { position } => {
                events.push(GameEvent::PotionDoubleExploded { x: position.x, y: position.y });
            }
            PotionSignal::Particle(spawn) => events.push(GameEvent::Particle(spawn)),
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(world: &mut WorldState, input: &FrameInput, events: &mut Vec<GameEvent>) {
    world.player.move_by(&world.grid, input, world.config.player.speed);

    if let Some(throw) = world.player.update(input, &world.config.player, &mut world.lighting) {
        world.potions.throw(throw, &world.modifiers, &world.config, &mut world.lighting);
        events.push(GameEvent::PotionThrown { x: throw.origin.x, y: throw.origin.y });
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Returns true if the player died this tick.
fn resolve_enemies(world: &mut WorldState, events: &mut Vec<GameEvent>) -> bool {
    world.enemies.retain(Enemy::is_alive);

    for enemy in world.enemies.iter_mut() {
        let outcome = enemy.update(&mut world.player.body, &world.grid, &mut world.rng);
        if outcome.activated {
            events.push(GameEvent::EnemyActivated { id: enemy.id });
        }
        if outcome.player_damage > 0 {
            events.push(GameEvent::PlayerDamaged {
                damage: outcome.player_damage,
                health: world.player.body.health,
            });
        }
        enemy.move_toward_target(&world.grid);
    }

    if world.player.body.is_dead() {
        world.phase = Phase::GameOver;
        events.push(GameEvent::PlayerKilled);
        tracing::info!(tick = world.tick, "player killed");
        return true;
    }
    false
}

// ══════════════════════════════════════════════════════════════
// Upgrades
// ══════════════════════════════════════════════════════════════

fn resolve_upgrades(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let player_rect = *world.player.rect();
    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut world.upgrades)
        .into_iter()
        .partition(|u| u.touches(&player_rect));
    world.upgrades = kept;

    for upgrade in taken {
        let capped = world.modifiers.apply(upgrade.kind, &world.config.upgrades);
        tracing::debug!(kind = upgrade.kind.key(), capped, "upgrade collected");

        let (cx, cy) = upgrade.rect.center();
        let burst = particle::burst(
            &mut world.rng,
            ParticleKind::Pickup(upgrade.kind),
            cx as f32,
            cy as f32,
            world.config.upgrades.particle_count,
        );
        events.extend(burst.into_iter().map(GameEvent::Particle));
        events.push(GameEvent::UpgradeCollected { kind: upgrade.kind, capped });
    }
}
