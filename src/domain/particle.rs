/// Cosmetic particle requests. The core never simulates particles; it only
/// describes the ones the presentation layer should spawn.

use std::f32::consts::TAU;

use rand::Rng;

use super::upgrade::UpgradeKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParticleKind {
    /// Slow drift from a lingering hazard.
    HazardGlow,
    /// Burst from a collected upgrade.
    Pickup(UpgradeKind),
}

/// Fire-and-forget spawn request `(kind, x, y, vx, vy, lifespan)`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ParticleSpawn {
    pub kind: ParticleKind,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub lifespan: u32,
}

/// One particle leaving `(x, y)` at a random angle and fixed speed.
pub fn drift<R: Rng + ?Sized>(rng: &mut R, kind: ParticleKind, x: f32, y: f32, speed: f32, lifespan: u32) -> ParticleSpawn {
    let angle = rng.gen_range(0.0..TAU);
    ParticleSpawn { kind, x, y, vx: angle.cos() * speed, vy: angle.sin() * speed, lifespan }
}

/// `count` particles with random angle, speed 0.1..2 and lifespan 5..=30.
pub fn burst<R: Rng + ?Sized>(rng: &mut R, kind: ParticleKind, x: f32, y: f32, count: u32) -> Vec<ParticleSpawn> {
    (0..count)
        .map(|_| {
            let speed = rng.gen_range(0.1..2.0);
            let lifespan = rng.gen_range(5..=30);
            drift(&mut *rng, kind, x, y, speed, lifespan)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn drift_has_requested_speed() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = drift(&mut rng, ParticleKind::HazardGlow, 3.0, 4.0, 0.1, 20);
        assert!(((p.vx * p.vx + p.vy * p.vy).sqrt() - 0.1).abs() < 1e-5);
        assert_eq!((p.x, p.y, p.lifespan), (3.0, 4.0, 20));
    }

    #[test]
    fn burst_stays_in_ranges() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let kind = ParticleKind::Pickup(UpgradeKind::ThrowVelocity);
        let spawns = burst(&mut rng, kind, 0.0, 0.0, 50);
        assert_eq!(spawns.len(), 50);
        for p in spawns {
            let speed = (p.vx * p.vx + p.vy * p.vy).sqrt();
            assert!((0.099..2.001).contains(&speed));
            assert!((5..=30).contains(&p.lifespan));
            assert_eq!(p.kind, kind);
        }
    }
}
