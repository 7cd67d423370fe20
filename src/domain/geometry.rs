/// Integer axis-aligned rectangles in world units.
///
/// Edges follow screen conventions: `right = x + w`, `bottom = y + h`, and both
/// are exclusive. Two rects that only share an edge do not collide.

/// Integer tile coordinate `(x, y)` in the collision grid.
pub type TileKey = (i32, i32);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    /// Rect of the given size whose centre is `(cx, cy)`.
    pub fn from_center(cx: i32, cy: i32, w: i32, h: i32) -> Self {
        Rect { x: cx - w / 2, y: cy - h / 2, w, h }
    }

    #[inline] pub fn left(&self) -> i32 { self.x }
    #[inline] pub fn right(&self) -> i32 { self.x + self.w }
    #[inline] pub fn top(&self) -> i32 { self.y }
    #[inline] pub fn bottom(&self) -> i32 { self.y + self.h }
    #[inline] pub fn center_x(&self) -> i32 { self.x + self.w / 2 }
    #[inline] pub fn center_y(&self) -> i32 { self.y + self.h / 2 }

    pub fn center(&self) -> (i32, i32) {
        (self.center_x(), self.center_y())
    }

    pub fn set_left(&mut self, left: i32) { self.x = left; }
    pub fn set_right(&mut self, right: i32) { self.x = right - self.w; }
    pub fn set_top(&mut self, top: i32) { self.y = top; }
    pub fn set_bottom(&mut self, bottom: i32) { self.y = bottom - self.h; }

    pub fn set_center(&mut self, cx: i32, cy: i32) {
        self.x = cx - self.w / 2;
        self.y = cy - self.h / 2;
    }

    /// Strict overlap test. Touching edges do not count.
    pub fn colliderect(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Is the point inside? Left/top edges are inclusive, right/bottom exclusive.
    pub fn collidepoint(&self, px: f32, py: f32) -> bool {
        self.x as f32 <= px
            && px < self.right() as f32
            && self.y as f32 <= py
            && py < self.bottom() as f32
    }
}
