/// Enemy AI: wander between nearby empty tiles, chase the player on sight.
///
/// Two kinds share one state machine:
///   - **Stalker** is room-gated. It sleeps until the player's tile falls
///     inside its room, and while bound to a room it chases the player anywhere
///     in that room and only wanders onto room tiles.
///   - **Wanderer** is active from the start and chases on sight only.
///
/// Lifecycle: `Dormant → Active → Dead`. Only room-gated agents with a room
/// start dormant.

use rand::seq::SliceRandom;
use rand::Rng;

use super::entity::{countdown, Body};
use super::geometry::Rect;
use super::tile::TileGrid;
use crate::config::{AgentConfig, GameConfig};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum EnemyKind {
    Stalker,
    Wanderer,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 2] = [EnemyKind::Stalker, EnemyKind::Wanderer];

    /// Look up a kind by its level-file key.
    pub fn from_key(key: &str) -> Option<Self> {
        EnemyKind::ALL.into_iter().find(|k| k.key() == key)
    }

    pub fn key(self) -> &'static str {
        match self {
            EnemyKind::Stalker => "e_stalker",
            EnemyKind::Wanderer => "e_wanderer",
        }
    }

    pub fn config(self, cfg: &GameConfig) -> &AgentConfig {
        match self {
            EnemyKind::Stalker => &cfg.stalker,
            EnemyKind::Wanderer => &cfg.wanderer,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AgentState {
    Dormant,
    Active,
    Dead,
}

/// Room binding. Swapping it swaps both the targeting and the wander rules.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Targeting {
    Roaming,
    Room(usize),
}

/// What an agent's update did that the step needs to report.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct AgentOutcome {
    pub activated: bool,
    pub player_damage: i32,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub kind: EnemyKind,
    pub body: Body,
    pub state: AgentState,
    pub targeting: Targeting,
    pub target: (i32, i32),
    retarget_timer: u32,
    damage_timer: u32,
    tuning: AgentConfig,
}

impl Enemy {
    /// `update_offset` delays the first retarget so agents spawned together
    /// do not all decide on the same tick.
    pub fn new(
        id: usize,
        kind: EnemyKind,
        center: (i32, i32),
        targeting: Targeting,
        tuning: &AgentConfig,
        update_offset: u32,
    ) -> Self {
        let rect = Rect::from_center(center.0, center.1, tuning.width, tuning.height);
        let mut enemy = Enemy {
            id,
            kind,
            body: Body::new(rect, tuning.health),
            state: AgentState::Active,
            targeting: Targeting::Roaming,
            target: rect.center(),
            retarget_timer: tuning.retarget_ticks.max(1) + update_offset,
            damage_timer: tuning.contact_damage_ticks.max(1),
            tuning: tuning.clone(),
        };
        enemy.set_room(targeting);
        if tuning.room_gated && matches!(targeting, Targeting::Room(_)) {
            enemy.state = AgentState::Dormant;
        }
        enemy
    }

    pub fn rect(&self) -> &Rect {
        &self.body.rect
    }

    pub fn is_alive(&self) -> bool {
        self.state != AgentState::Dead
    }

    /// Bind to a room or clear the binding. A dormant agent that loses its
    /// room has nothing left to wait for and wakes.
    pub fn set_room(&mut self, targeting: Targeting) {
        self.targeting = targeting;
        if targeting == Targeting::Roaming && self.state == AgentState::Dormant {
            self.state = AgentState::Active;
        }
    }

    fn distance_squared_to(&self, point: (i32, i32)) -> i64 {
        let (cx, cy) = self.body.rect.center();
        let dx = (point.0 - cx) as i64;
        let dy = (point.1 - cy) as i64;
        dx * dx + dy * dy
    }

    /// Within sight distance, or standing inside the agent's room.
    pub fn can_target_player(&self, player: &Rect, grid: &TileGrid) -> bool {
        if let Targeting::Room(room) = self.targeting {
            let (px, py) = player.center();
            if grid.room_contains(room, grid.tile_key_for(px, py)) {
                return true;
            }
        }
        let sight = self.tuning.sight_distance as i64;
        self.distance_squared_to(player.center()) < sight * sight
    }

    /// Pick a new empty tile nearby, but only once the current target is reached.
    fn choose_wander_tile<R: Rng + ?Sized>(&mut self, grid: &TileGrid, rng: &mut R) {
        let arrival = self.tuning.arrival_radius as i64;
        if self.distance_squared_to(self.target) >= arrival * arrival {
            return;
        }

        let (cx, cy) = self.body.rect.center();
        let own = grid.tile_key_for(cx, cy);
        let mut candidates = grid.empty_tile_keys_around(cx, cy);
        if let Targeting::Room(room) = self.targeting {
            candidates.retain(|key| grid.room_contains(room, *key));
        }

        let key = candidates.choose(rng).copied().unwrap_or(own);
        self.target = grid.tile_center(key);
    }

    /// Dormancy check, periodic retarget and contact damage.
    pub fn update<R: Rng + ?Sized>(&mut self, player: &mut Body, grid: &TileGrid, rng: &mut R) -> AgentOutcome {
        let mut outcome = AgentOutcome::default();
        match self.state {
            AgentState::Dead => {}
            AgentState::Dormant => {
                if let Targeting::Room(room) = self.targeting {
                    let (px, py) = player.rect.center();
                    if grid.room_contains(room, grid.tile_key_for(px, py)) {
                        self.state = AgentState::Active;
                        outcome.activated = true;
                        tracing::debug!(enemy = self.id, room, "enemy activated");
                    }
                }
            }
            AgentState::Active => {
                if countdown(&mut self.retarget_timer, self.tuning.retarget_ticks.max(1)) {
                    if self.can_target_player(&player.rect, grid) {
                        self.target = player.rect.center();
                    } else {
                        self.choose_wander_tile(grid, rng);
                    }
                }

                if !player.is_dead()
                    && self.body.rect.colliderect(&player.rect)
                    && countdown(&mut self.damage_timer, self.tuning.contact_damage_ticks.max(1))
                {
                    player.deal_damage(self.tuning.contact_damage);
                    outcome.player_damage = self.tuning.contact_damage;
                }
            }
        }
        outcome
    }

    /// Unit step per axis towards the target; the exact remainder when it is
    /// within one unit. Nothing happens inside the arrival radius.
    pub fn move_toward_target(&mut self, grid: &TileGrid) {
        if self.state != AgentState::Active {
            return;
        }
        let arrival = self.tuning.arrival_radius as i64;
        if self.distance_squared_to(self.target) < arrival * arrival {
            return;
        }

        let (cx, cy) = self.body.rect.center();
        let step = |diff: i32| if diff.abs() > 1 { diff.signum() } else { diff };
        self.body.move_x(grid, step(self.target.0 - cx));
        self.body.move_y(grid, step(self.target.1 - cy));
    }

    /// Take damage. Returns true if this killed the agent.
    pub fn hit(&mut self, damage: i32) -> bool {
        if !self.is_alive() {
            return false;
        }
        let killed = self.body.deal_damage(damage);
        if killed {
            self.state = AgentState::Dead;
            tracing::debug!(enemy = self.id, kind = self.kind.key(), "enemy killed");
        }
        killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::RoomRect;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn open_grid(rooms: &[RoomRect]) -> TileGrid {
        TileGrid::from_diagram(&[
            "..........",
            "..........",
            "..........",
            "..........",
            "..........",
        ], rooms, 128)
    }

    fn player_at(center: (i32, i32)) -> Body {
        Body::new(Rect::from_center(center.0, center.1, 50, 50), 100)
    }

    fn tuning(retarget: u32) -> AgentConfig {
        AgentConfig { retarget_ticks: retarget, ..AgentConfig::stalker() }
    }

    #[test]
    fn kind_keys_round_trip() {
        for kind in EnemyKind::ALL {
            assert_eq!(EnemyKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(EnemyKind::from_key("e_darkling"), None);
    }

    #[test]
    fn room_bound_agent_targets_player_anywhere_in_room() {
        // Room spans the whole map; the player is far beyond sight distance.
        let room = RoomRect { a: (0, 0), b: (9, 4) };
        let grid = open_grid(&[room]);
        let mut e = Enemy::new(0, EnemyKind::Stalker, (64, 64), Targeting::Room(0), &tuning(1), 0);
        e.state = AgentState::Active;
        let mut player = player_at((1200, 600));

        assert!(e.can_target_player(&player.rect, &grid));
        e.update(&mut player, &grid, &mut rng());
        assert_eq!(e.target, (1200, 600));
    }

    #[test]
    fn roaming_agent_ignores_player_out_of_sight() {
        let grid = open_grid(&[]);
        let e = Enemy::new(0, EnemyKind::Wanderer, (64, 64), Targeting::Roaming, &AgentConfig::wanderer(), 0);
        assert!(!e.can_target_player(&player_at((1200, 600)).rect, &grid));
        assert!(e.can_target_player(&player_at((150, 64)).rect, &grid));
    }

    #[test]
    fn dormant_until_player_enters_room() {
        let grid = open_grid(&[RoomRect { a: (5, 0), b: (9, 4) }]);
        let mut e = Enemy::new(0, EnemyKind::Stalker, (832, 64), Targeting::Room(0), &tuning(1), 0);
        assert_eq!(e.state, AgentState::Dormant);

        let mut player = player_at((64, 64));
        let outcome = e.update(&mut player, &grid, &mut rng());
        assert!(!outcome.activated);
        e.move_toward_target(&grid);
        assert_eq!(e.rect().center(), (832, 64));

        let mut player = player_at((704, 64));
        assert!(e.update(&mut player, &grid, &mut rng()).activated);
        assert_eq!(e.state, AgentState::Active);
    }

    #[test]
    fn clearing_room_wakes_a_dormant_agent() {
        let grid = open_grid(&[RoomRect { a: (5, 0), b: (9, 4) }]);
        let mut e = Enemy::new(0, EnemyKind::Stalker, (832, 64), Targeting::Room(0), &tuning(1), 0);
        e.set_room(Targeting::Roaming);
        assert_eq!(e.state, AgentState::Active);
        assert!(!e.can_target_player(&player_at((64, 600)).rect, &grid));
    }

    #[test]
    fn wander_target_is_an_adjacent_empty_tile_centre() {
        let grid = TileGrid::from_diagram(&[
            ".....",
            ".#...",
            ".....",
        ], &[], 128);
        let mut e = Enemy::new(0, EnemyKind::Wanderer, (320, 192), Targeting::Roaming, &tuning(1), 0);
        let mut player = player_at((5000, 5000));
        let mut r = rng();
        for _ in 0..20 {
            e.target = e.rect().center();
            e.update(&mut player, &grid, &mut r);
            let key = grid.tile_key_for(e.target.0, e.target.1);
            assert_ne!(key, (2, 1));
            assert!(!grid.is_solid(key));
            assert_eq!(grid.tile_center(key), e.target);
        }
    }

    #[test]
    fn wander_is_skipped_until_target_reached() {
        let grid = open_grid(&[]);
        let mut e = Enemy::new(0, EnemyKind::Wanderer, (320, 192), Targeting::Roaming, &tuning(1), 0);
        e.target = (600, 600);
        e.update(&mut player_at((5000, 5000)), &grid, &mut rng());
        assert_eq!(e.target, (600, 600));
    }

    #[test]
    fn room_wander_falls_back_to_own_tile() {
        // One-tile room: no neighbour qualifies.
        let grid = open_grid(&[RoomRect { a: (2, 2), b: (2, 2) }]);
        let mut e = Enemy::new(0, EnemyKind::Stalker, (300, 300), Targeting::Room(0), &tuning(1), 0);
        e.state = AgentState::Active;
        e.update(&mut player_at((5000, 5000)), &grid, &mut rng());
        assert_eq!(e.target, (320, 320));
    }

    #[test]
    fn retarget_respects_update_offset() {
        let grid = open_grid(&[]);
        let mut e = Enemy::new(0, EnemyKind::Wanderer, (64, 64), Targeting::Roaming, &tuning(3), 2);
        let mut player = player_at((100, 64));
        for _ in 0..4 {
            e.update(&mut player, &grid, &mut rng());
            assert_eq!(e.target, (64, 64));
        }
        e.update(&mut player, &grid, &mut rng());
        assert_eq!(e.target, (100, 64));
    }

    #[test]
    fn steps_one_unit_per_axis_and_stops_inside_arrival_radius() {
        let grid = open_grid(&[]);
        let mut e = Enemy::new(0, EnemyKind::Wanderer, (200, 200), Targeting::Roaming, &tuning(1), 0);
        e.target = (300, 201);
        e.move_toward_target(&grid);
        assert_eq!(e.rect().center(), (201, 201));
        e.move_toward_target(&grid);
        assert_eq!(e.rect().center(), (202, 201));

        e.target = (210, 201);
        e.move_toward_target(&grid);
        assert_eq!(e.rect().center(), (202, 201));
    }

    #[test]
    fn contact_damage_every_period_while_overlapping() {
        let grid = open_grid(&[]);
        let cfg = AgentConfig { contact_damage: 3, contact_damage_ticks: 2, ..AgentConfig::wanderer() };
        let mut e = Enemy::new(0, EnemyKind::Wanderer, (200, 200), Targeting::Roaming, &cfg, 0);
        let mut player = player_at((210, 200));
        let dealt: Vec<i32> = (0..4)
            .map(|_| e.update(&mut player, &grid, &mut rng()).player_damage)
            .collect();
        assert_eq!(dealt, vec![0, 3, 0, 3]);
        assert_eq!(player.health, 94);
    }

    #[test]
    fn hit_kills_once() {
        let mut e = Enemy::new(0, EnemyKind::Wanderer, (200, 200), Targeting::Roaming, &AgentConfig::wanderer(), 0);
        assert!(!e.hit(60));
        assert!(e.hit(60));
        assert_eq!(e.state, AgentState::Dead);
        assert_eq!(e.body.health, 0);
        assert!(!e.hit(60));
    }
}
