use std::fmt;

/// Discrete grid coordinate. `row` follows the world x axis, `col` the world z axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, d_row: i32, d_col: i32) -> Cell {
        Cell::new(self.row + d_row, self.col + d_col)
    }

    pub fn chebyshev_distance(&self, other: &Cell) -> i32 {
        (self.row - other.row).abs().max((self.col - other.col).abs())
    }

    /// All cells of the (2·radius+1)² square centred on `self`, row-major.
    pub fn neighborhood(&self, radius: i32) -> impl Iterator<Item = Cell> + '_ {
        (-radius..=radius)
            .flat_map(move |d_row| (-radius..=radius).map(move |d_col| self.offset(d_row, d_col)))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Continuous position on the arena floor. `y` is kept for callers that work in 3D.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPoint {
    pub const ZERO: WorldPoint = WorldPoint {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn on_floor(x: f32, z: f32) -> Self {
        Self { x, y: 0.0, z }
    }

    pub fn translate(&self, dx: f32, dz: f32) -> WorldPoint {
        WorldPoint::new(self.x + dx, self.y, self.z + dz)
    }
}

/// Agent pose: floor position plus heading in degrees, 0° facing +z, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: WorldPoint,
    pub heading_deg: f32,
}

impl Pose {
    pub fn new(position: WorldPoint, heading_deg: f32) -> Self {
        Self {
            position,
            heading_deg: heading_deg.rem_euclid(360.0),
        }
    }

    /// Unit vector (dx, dz) the agent is facing.
    pub fn forward(&self) -> (f32, f32) {
        let rad = self.heading_deg.to_radians();
        (rad.sin(), rad.cos())
    }
}

/// Axis-aligned floor rectangle an arena is built on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorBounds {
    pub min: WorldPoint,
    pub size_x: f32,
    pub size_z: f32,
}

impl FloorBounds {
    pub fn new(min: WorldPoint, size_x: f32, size_z: f32) -> Self {
        Self { min, size_x, size_z }
    }

    pub fn centered_at(center: WorldPoint, size_x: f32, size_z: f32) -> Self {
        Self {
            min: center.translate(-size_x / 2.0, -size_z / 2.0),
            size_x,
            size_z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Seeker,
    Hider,
}

impl Role {
    /// Fixed stepping order within a tick.
    pub const ALL: [Role; 2] = [Role::Seeker, Role::Hider];

    pub fn index(self) -> usize {
        match self {
            Role::Seeker => 0,
            Role::Hider => 1,
        }
    }

    pub fn opponent(self) -> Role {
        match self {
            Role::Seeker => Role::Hider,
            Role::Hider => Role::Seeker,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::Hider => "hider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
