/// Entities: a rect with health that moves through the tile grid, and the
/// player built on top of it.
///
/// Movement is single-axis move-then-resolve: shift along one axis, then snap
/// the leading edge flush against every solid tile now overlapped. Callers
/// move x first, then y.

use glam::Vec2;

use super::geometry::Rect;
use super::lighting::{LightId, LightSource, LightingGrid};
use super::tile::TileGrid;
use crate::config::PlayerConfig;

/// Tick-down timer shared by every periodic behaviour.
///
/// Returns true once every `period` calls, resetting the timer when it fires.
/// A timer that starts above `period` delays the first firing by the excess.
pub fn countdown(timer: &mut u32, period: u32) -> bool {
    if *timer > 1 {
        *timer -= 1;
        false
    } else {
        *timer = period;
        true
    }
}

/// Frame input, as plain values. The presentation layer builds one per tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    /// -1, 0 or 1 per axis; larger magnitudes are reduced to their sign.
    pub move_x: i32,
    pub move_y: i32,
    pub attack: bool,
    /// Aim direction relative to the player's centre. Zero = no throw.
    pub aim: Vec2,
}

// ── Body ──

#[derive(Clone, Debug)]
pub struct Body {
    pub rect: Rect,
    pub health: i32,
}

impl Body {
    pub fn new(rect: Rect, health: i32) -> Self {
        Body { rect, health }
    }

    pub fn move_x(&mut self, grid: &TileGrid, dx: i32) {
        if dx == 0 {
            return;
        }
        self.rect.x += dx;
        for tile in grid.tiles_near(&self.rect) {
            if self.rect.colliderect(&tile) {
                if dx > 0 {
                    self.rect.set_right(tile.left());
                } else {
                    self.rect.set_left(tile.right());
                }
            }
        }
    }

    pub fn move_y(&mut self, grid: &TileGrid, dy: i32) {
        if dy == 0 {
            return;
        }
        self.rect.y += dy;
        for tile in grid.tiles_near(&self.rect) {
            if self.rect.colliderect(&tile) {
                if dy > 0 {
                    self.rect.set_bottom(tile.top());
                } else {
                    self.rect.set_top(tile.bottom());
                }
            }
        }
    }

    /// Apply damage, flooring health at 0. Returns true if this killed the body.
    pub fn deal_damage(&mut self, damage: i32) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = (self.health - damage).max(0);
        self.is_dead()
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn center_vec(&self) -> Vec2 {
        let (cx, cy) = self.rect.center();
        Vec2::new(cx as f32, cy as f32)
    }
}

// ── Player ──

/// A throw requested by the player this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Throw {
    pub origin: Vec2,
    pub direction: Vec2,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    pub attack_timer: u32,
    pub light: LightId,
}

impl Player {
    /// Spawn centred on `center` with the torch already lit.
    pub fn spawn(center: (i32, i32), cfg: &PlayerConfig, lighting: &mut LightingGrid) -> Self {
        let rect = Rect::from_center(center.0, center.1, cfg.width, cfg.height);
        let body = Body::new(rect, cfg.health);
        let light = lighting.add_light(LightSource::new(body.center_vec(), cfg.brightness, cfg.light_radius));
        Player { body, attack_timer: cfg.attack_delay, light }
    }

    pub fn rect(&self) -> &Rect {
        &self.body.rect
    }

    pub fn move_by(&mut self, grid: &TileGrid, input: &FrameInput, speed: i32) {
        self.body.move_x(grid, input.move_x.signum() * speed);
        self.body.move_y(grid, input.move_y.signum() * speed);
    }

    /// Attack cooldown, throw request and torch follow.
    ///
    /// The cooldown counts down first; a throw is only considered on a tick
    /// where it is already zero.
    pub fn update(&mut self, input: &FrameInput, cfg: &PlayerConfig, lighting: &mut LightingGrid) -> Option<Throw> {
        let throw = if self.attack_timer > 0 {
            self.attack_timer -= 1;
            None
        } else if input.attack {
            let direction = input.aim.normalize_or_zero();
            if direction == Vec2::ZERO {
                None
            } else {
                self.attack_timer = cfg.attack_delay;
                Some(Throw { origin: self.body.center_vec(), direction })
            }
        } else {
            None
        };

        lighting.move_light(self.light, self.body.center_vec());
        throw
    }
}
