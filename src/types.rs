// Shared arena types and grid math
// Rows grow downward: Up is row - 1, Down is row + 1

use serde::{Deserialize, Serialize};

/// Identifier of a character in the arena
pub type AgentId = usize;

/// Integer cell coordinates on the arena grid
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct GridCoordinates {
    pub col: i32,
    pub row: i32,
}

impl GridCoordinates {
    pub const fn new(col: i32, row: i32) -> Self {
        GridCoordinates { col, row }
    }

    /// Returns the adjacent cell in the given direction
    pub fn neighbor(&self, direction: Direction) -> GridCoordinates {
        match direction {
            Direction::Up => GridCoordinates::new(self.col, self.row - 1),
            Direction::Down => GridCoordinates::new(self.col, self.row + 1),
            Direction::Left => GridCoordinates::new(self.col - 1, self.row),
            Direction::Right => GridCoordinates::new(self.col + 1, self.row),
        }
    }

    /// Euclidean distance, compared against blast ranges
    pub fn distance(a: GridCoordinates, b: GridCoordinates) -> f64 {
        let dc = (a.col - b.col) as f64;
        let dr = (a.row - b.row) as f64;
        (dc * dc + dr * dr).sqrt()
    }

    pub fn manhattan(a: GridCoordinates, b: GridCoordinates) -> i32 {
        (a.col - b.col).abs() + (a.row - b.row).abs()
    }
}

/// The four movement directions
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn are_opposite(a: Direction, b: Direction) -> bool {
        a.opposite() == b
    }

    /// Unit pixel offset for this direction
    pub fn delta(&self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }
}

/// Static classification of a map tile
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Empty,
    Unbreakable,
    Breakable,
    Bonus,
}

impl TileKind {
    pub fn is_collidable(&self) -> bool {
        matches!(self, TileKind::Unbreakable | TileKind::Breakable)
    }
}

/// Pickup held by a bonus tile
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BonusKind {
    BombUp,
    RangeUp,
    SpeedUp,
    RangeDown,
    SpeedDown,
}

impl BonusKind {
    pub fn all() -> [BonusKind; 5] {
        [
            BonusKind::BombUp,
            BonusKind::RangeUp,
            BonusKind::SpeedUp,
            BonusKind::RangeDown,
            BonusKind::SpeedDown,
        ]
    }

    /// Whether picking this bonus up helps the character
    pub fn is_good(&self) -> bool {
        matches!(self, BonusKind::BombUp | BonusKind::RangeUp | BonusKind::SpeedUp)
    }
}

/// An armed bomb; `time_remaining` counts ticks until detonation
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bomb {
    pub position: GridCoordinates,
    pub range: u32,
    pub time_remaining: u32,
    pub owner: Option<AgentId>,
}

/// Something standing on a cell besides its tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Character(AgentId),
    Bomb,
}

/// Read-only snapshot of a character handed to its controller each tick
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AgentState {
    pub id: AgentId,
    pub x: f64,
    pub y: f64,
    /// Pixels per tick
    pub max_speed: f64,
    pub bomb_count: u32,
    pub bomb_max: u32,
    pub range: u32,
    /// Facing of the body, used as the default heading
    pub heading: Option<Direction>,
}

/// What a controller wants its character to do this tick
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AgentIntent {
    pub direction: Option<Direction>,
    pub place_device: bool,
}
