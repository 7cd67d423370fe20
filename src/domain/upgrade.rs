/// Upgrade pickups and the run modifiers they raise.
///
/// Upgrades never touch global state: each pickup bumps one field of
/// [`RunModifiers`], which the step threads into throws and hazards.

use super::geometry::Rect;
use crate::config::{ModifierConfig, UpgradeConfig};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UpgradeKind {
    DirectDamage,
    HazardEnergy,
    HazardLightRadius,
    ThrowVelocity,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 4] = [
        UpgradeKind::DirectDamage,
        UpgradeKind::HazardEnergy,
        UpgradeKind::HazardLightRadius,
        UpgradeKind::ThrowVelocity,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        UpgradeKind::ALL.into_iter().find(|k| k.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            UpgradeKind::DirectDamage => "u_direct_damage",
            UpgradeKind::HazardEnergy => "u_exploded_potion_lifespan",
            UpgradeKind::HazardLightRadius => "u_light_radius",
            UpgradeKind::ThrowVelocity => "u_throw_velocity",
        }
    }

    fn tuning(self, cfg: &UpgradeConfig) -> &ModifierConfig {
        match self {
            UpgradeKind::DirectDamage => &cfg.direct_damage,
            UpgradeKind::HazardEnergy => &cfg.hazard_energy,
            UpgradeKind::HazardLightRadius => &cfg.hazard_light_radius,
            UpgradeKind::ThrowVelocity => &cfg.throw_velocity,
        }
    }
}

/// Per-run values raised by upgrades. Reset when a level is (re)loaded.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RunModifiers {
    pub direct_damage: i32,
    pub hazard_energy: i32,
    pub hazard_light_radius: i32,
    pub throw_velocity: i32,
}

impl RunModifiers {
    pub fn from_config(cfg: &UpgradeConfig) -> Self {
        RunModifiers {
            direct_damage: cfg.direct_damage.base,
            hazard_energy: cfg.hazard_energy.base,
            hazard_light_radius: cfg.hazard_light_radius.base,
            throw_velocity: cfg.throw_velocity.base,
        }
    }

    fn field(&mut self, kind: UpgradeKind) -> &mut i32 {
        match kind {
            UpgradeKind::DirectDamage => &mut self.direct_damage,
            UpgradeKind::HazardEnergy => &mut self.hazard_energy,
            UpgradeKind::HazardLightRadius => &mut self.hazard_light_radius,
            UpgradeKind::ThrowVelocity => &mut self.throw_velocity,
        }
    }

    /// Raise one modifier by its step, capped. Returns true if it is now at the cap.
    pub fn apply(&mut self, kind: UpgradeKind, cfg: &UpgradeConfig) -> bool {
        let tuning = *kind.tuning(cfg);
        let value = self.field(kind);
        *value = (*value + tuning.step).min(tuning.max);
        *value >= tuning.max
    }
}

#[derive(Clone, Debug)]
pub struct Upgrade {
    pub kind: UpgradeKind,
    pub rect: Rect,
}

impl Upgrade {
    pub fn new(kind: UpgradeKind, center: (i32, i32), size: i32) -> Self {
        Upgrade { kind, rect: Rect::from_center(center.0, center.1, size, size) }
    }

    pub fn touches(&self, player: &Rect) -> bool {
        self.rect.colliderect(player)
    }
}
