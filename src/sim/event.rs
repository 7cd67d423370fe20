/// Events emitted during a simulation step.
/// The presentation layer consumes these for particles, animation and sound.

use crate::domain::particle::ParticleSpawn;
use crate::domain::upgrade::UpgradeKind;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Particle(ParticleSpawn),
    PotionThrown { x: f32, y: f32 },
    PotionExploded { x: f32, y: f32, hit_enemy: bool },
    PotionDoubleExploded { x: f32, y: f32 },
    EnemyDamaged { id: usize, damage: i32 },
    EnemyKilled { id: usize },
    EnemyActivated { id: usize },
    PlayerDamaged { damage: i32, health: i32 },
    PlayerKilled,
    UpgradeCollected { kind: UpgradeKind, capped: bool },
}
