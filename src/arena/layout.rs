use crate::infra::{FloorBounds, WorldPoint};

/// Gap between neighbouring arena floors, in world units.
pub const ARENA_GAP: f32 = 2.0;

/// Places `count` copies of a floor on a near-square grid so parallel arenas
/// never overlap.
#[derive(Debug, Clone)]
pub struct ArenaLayout {
    count: usize,
    rows: usize,
    cols: usize,
    template: FloorBounds,
}

impl ArenaLayout {
    pub fn new(count: usize, template: FloorBounds) -> Self {
        let rows = ((count as f64).sqrt().floor() as usize).max(1);
        let cols = count.div_ceil(rows);
        Self {
            count,
            rows,
            cols,
            template,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Floor for arena `index`, laid out row-major along x then z.
    pub fn floor(&self, index: usize) -> FloorBounds {
        let spacing_x = self.template.size_x + ARENA_GAP;
        let spacing_z = self.template.size_z + ARENA_GAP;
        let dx = (index % self.cols) as f32 * spacing_x;
        let dz = (index / self.cols) as f32 * spacing_z;
        FloorBounds::new(
            self.template.min.translate(dx, dz),
            self.template.size_x,
            self.template.size_z,
        )
    }

    pub fn floors(&self) -> impl Iterator<Item = FloorBounds> + '_ {
        (0..self.count).map(|index| self.floor(index))
    }
}

impl Default for ArenaLayout {
    fn default() -> Self {
        Self::new(1, FloorBounds::centered_at(WorldPoint::ZERO, 20.0, 20.0))
    }
}
