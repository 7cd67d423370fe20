/// Shadow grid: a fine grid of cells, each darkened unless a light reaches it.
///
/// ## Model
///
/// Every cell keeps the contribution of each light that reaches it, keyed by
/// the light's [`LightId`]. Its darkness is `255 − max(contributions)`, or 255
/// when nothing reaches it. The brightest light wins; overlapping lights do
/// not stack.
///
/// A light's contribution to a cell whose centre is `d` away is
/// `brightness × (1 − 0.5 × d / radius)`, truncated and clamped to 0..=255.
/// Only cells with `d² ≤ radius²` are touched.
///
/// ## Ownership
///
/// The grid owns every light in an arena. Callers hold handles. Geometry can
/// only change through [`LightingGrid::move_light`] / [`LightingGrid::reshape_light`],
/// which take the old contribution out before changing anything, so the set
/// of cells cleared on removal is always the set that was written on add.

use std::collections::BTreeMap;

use glam::Vec2;

/// Stable handle to a light owned by a [`LightingGrid`]. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LightId(u32);

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LightKind {
    /// Stays as placed until removed.
    Static,
    /// Radius shrinks from `start_radius` towards `floor_radius` as
    /// `lifespan` counts down, then the light asks to be removed.
    Shrinking {
        start_radius: i32,
        floor_radius: i32,
        lifespan: u32,
        max_lifespan: u32,
    },
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LightSource {
    pub position: Vec2,
    pub brightness: i32,
    pub radius: i32,
    pub kind: LightKind,
    pub to_remove: bool,
}

impl LightSource {
    pub fn new(position: Vec2, brightness: i32, radius: i32) -> Self {
        LightSource { position, brightness, radius, kind: LightKind::Static, to_remove: false }
    }

    pub fn shrinking(position: Vec2, brightness: i32, radius: i32, lifespan: u32, floor_radius: i32) -> Self {
        LightSource {
            position,
            brightness,
            radius,
            kind: LightKind::Shrinking {
                start_radius: radius,
                floor_radius,
                lifespan: lifespan.max(1),
                max_lifespan: lifespan.max(1),
            },
            to_remove: false,
        }
    }

    /// Does this light change every tick?
    pub fn is_updating(&self) -> bool {
        !matches!(self.kind, LightKind::Static)
    }

    /// Advance one tick of temporal behaviour.
    pub fn update(&mut self) {
        if let LightKind::Shrinking { start_radius, floor_radius, lifespan, max_lifespan } = &mut self.kind {
            *lifespan = lifespan.saturating_sub(1);
            let t = *lifespan as f32 / *max_lifespan as f32;
            self.radius = (t * *start_radius as f32 + (1.0 - t) * *floor_radius as f32) as i32;
            if *lifespan == 0 {
                self.to_remove = true;
            }
        }
    }

    /// Contribution to a cell `distance` away from the centre.
    pub fn contribution(&self, distance: f32) -> u8 {
        let multiplier = 1.0 - distance / self.radius as f32 * 0.5;
        (self.brightness as f32 * multiplier).clamp(0.0, 255.0) as u8
    }
}

/// One cell of the shadow grid.
#[derive(Clone, Debug)]
pub struct ShadowCell {
    darkness: u8,
    contributions: Vec<(LightId, u8)>,
}

impl ShadowCell {
    fn new() -> Self {
        ShadowCell { darkness: 255, contributions: vec![] }
    }

    /// 255 = full darkness.
    pub fn darkness(&self) -> u8 {
        self.darkness
    }

    pub fn contribution(&self, id: LightId) -> Option<u8> {
        self.contributions.iter().find(|(l, _)| *l == id).map(|(_, c)| *c)
    }

    pub fn light_count(&self) -> usize {
        self.contributions.len()
    }

    fn set(&mut self, id: LightId, value: u8) {
        match self.contributions.iter_mut().find(|(l, _)| *l == id) {
            Some(entry) => entry.1 = value,
            None => self.contributions.push((id, value)),
        }
        self.recalculate();
    }

    fn clear(&mut self, id: LightId) {
        let before = self.contributions.len();
        self.contributions.retain(|(l, _)| *l != id);
        if self.contributions.len() != before {
            self.recalculate();
        }
    }

    fn recalculate(&mut self) {
        let brightest = self.contributions.iter().map(|(_, c)| *c).max().unwrap_or(0);
        self.darkness = 255 - brightest;
    }
}

pub struct LightingGrid {
    cells: Vec<ShadowCell>,
    width: usize,
    height: usize,
    cell_size: i32,
    lights: BTreeMap<LightId, LightSource>,
    next_id: u32,
}

// ── Construction / read access ──

impl LightingGrid {
    /// `width` × `height` cells of `cell_size` world units, all dark.
    pub fn new(width: usize, height: usize, cell_size: i32) -> Self {
        LightingGrid {
            cells: vec![ShadowCell::new(); width * height],
            width,
            height,
            cell_size: cell_size.max(1),
            lights: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Grid covering a world of the given size in units.
    pub fn covering(world_width: i32, world_height: i32, cell_size: i32) -> Self {
        let cell_size = cell_size.max(1);
        let width = (world_width.max(0) / cell_size) as usize;
        let height = (world_height.max(0) / cell_size) as usize;
        LightingGrid::new(width, height, cell_size)
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn cell_size(&self) -> i32 { self.cell_size }

    pub fn cell(&self, cx: usize, cy: usize) -> Option<&ShadowCell> {
        if cx < self.width && cy < self.height {
            Some(&self.cells[cy * self.width + cx])
        } else {
            None
        }
    }

    /// Darkness at a cell; outside the grid is fully dark.
    pub fn darkness_at(&self, cx: usize, cy: usize) -> u8 {
        self.cell(cx, cy).map_or(255, ShadowCell::darkness)
    }

    /// Row-major darkness values for compositing the shadow overlay.
    pub fn darkness_values(&self) -> impl Iterator<Item = u8> + '_ {
        self.cells.iter().map(ShadowCell::darkness)
    }

    pub fn light(&self, id: LightId) -> Option<&LightSource> {
        self.lights.get(&id)
    }

    pub fn contains(&self, id: LightId) -> bool {
        self.lights.contains_key(&id)
    }

    /// Live lights in the order they were added.
    pub fn light_ids(&self) -> impl Iterator<Item = LightId> + '_ {
        self.lights.keys().copied()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}

// ── Mutation ──

impl LightingGrid {
    pub fn add_light(&mut self, source: LightSource) -> LightId {
        let id = LightId(self.next_id);
        self.next_id += 1;
        self.apply(id, &source);
        self.lights.insert(id, source);
        id
    }

    /// Remove a light and its contributions. Unknown handles are ignored.
    pub fn remove_light(&mut self, id: LightId) -> Option<LightSource> {
        let source = self.lights.remove(&id)?;
        self.unapply(id, &source);
        Some(source)
    }

    /// Reposition a light. Returns false for an unknown handle.
    pub fn move_light(&mut self, id: LightId, position: Vec2) -> bool {
        self.reshape_light(id, |source| source.position = position)
    }

    /// Change a light's geometry or brightness: its old contribution is
    /// removed, `change` runs, and the light is written back.
    pub fn reshape_light(&mut self, id: LightId, change: impl FnOnce(&mut LightSource)) -> bool {
        let Some(mut source) = self.lights.remove(&id) else {
            return false;
        };
        self.unapply(id, &source);
        change(&mut source);
        self.apply(id, &source);
        self.lights.insert(id, source);
        true
    }

    /// Advance every updating light. Lights that reach their terminal state
    /// are removed entirely; their handles are returned.
    pub fn tick(&mut self) -> Vec<LightId> {
        let updating: Vec<LightId> = self
            .lights
            .iter()
            .filter(|(_, s)| s.is_updating())
            .map(|(id, _)| *id)
            .collect();

        let mut expired = vec![];
        for id in updating {
            let Some(mut source) = self.lights.remove(&id) else { continue };
            self.unapply(id, &source);
            source.update();
            if source.to_remove {
                expired.push(id);
            } else {
                self.apply(id, &source);
                self.lights.insert(id, source);
            }
        }
        expired
    }

    /// Remove every light, leaving the grid fully dark.
    pub fn clear(&mut self) {
        self.lights.clear();
        for cell in &mut self.cells {
            *cell = ShadowCell::new();
        }
    }

    /// Cells a light reaches, as `((cx, cy), distance²)` pairs.
    ///
    /// Candidates are the square of `radius / cell + 1` cells around the
    /// light's own cell, clipped to the grid, then filtered by the exact
    /// squared distance to each cell centre.
    pub fn cells_within_radius(&self, source: &LightSource) -> Vec<((usize, usize), f32)> {
        if source.radius <= 0 {
            return vec![];
        }

        let cell = self.cell_size as f32;
        let half = cell / 2.0;
        let base_x = (source.position.x / cell).floor() as i32;
        let base_y = (source.position.y / cell).floor() as i32;
        let span = source.radius / self.cell_size + 1;
        let radius_squared = (source.radius as f32) * (source.radius as f32);

        let mut cells = vec![];
        for tx in (base_x - span).max(0)..=(base_x + span).min(self.width as i32 - 1) {
            let dx = tx as f32 * cell + half - source.position.x;
            for ty in (base_y - span).max(0)..=(base_y + span).min(self.height as i32 - 1) {
                let dy = ty as f32 * cell + half - source.position.y;
                let distance_squared = dx * dx + dy * dy;
                if distance_squared <= radius_squared {
                    cells.push(((tx as usize, ty as usize), distance_squared));
                }
            }
        }
        cells
    }

    fn apply(&mut self, id: LightId, source: &LightSource) {
        for ((cx, cy), distance_squared) in self.cells_within_radius(source) {
            let value = source.contribution(distance_squared.sqrt());
            self.cells[cy * self.width + cx].set(id, value);
        }
    }

    fn unapply(&mut self, id: LightId, source: &LightSource) {
        for ((cx, cy), _) in self.cells_within_radius(source) {
            self.cells[cy * self.width + cx].clear(id);
        }
    }
}
