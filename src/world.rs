// Read-only view of the arena consumed by controllers
//
// Everything here is a snapshot of the current tick. Queries outside the map
// report absence (no bomb, no bonus, no explosion) and a collidable tile, so
// ray scans always terminate at the border.

use crate::types::{AgentState, BonusKind, Bomb, Direction, Entity, GridCoordinates, TileKind};

pub trait WorldQuery {
    /// Side length of a cell in pixels
    fn tile_size(&self) -> f64;

    /// Simulation ticks per second
    fn fps(&self) -> u32;

    /// Ticks left on the round clock; zero or negative once expired
    fn time_remaining(&self) -> i64;

    /// Fuse given to a freshly placed bomb, in ticks
    fn bomb_fuse_ticks(&self) -> u32;

    /// Converts a pixel position to the cell containing it
    fn to_grid(&self, x: f64, y: f64) -> GridCoordinates {
        let size = self.tile_size();
        GridCoordinates::new((x / size).floor() as i32, (y / size).floor() as i32)
    }

    fn is_inside_map(&self, cell: GridCoordinates) -> bool;

    fn tile_kind(&self, cell: GridCoordinates) -> Option<TileKind>;

    fn is_collidable(&self, cell: GridCoordinates) -> bool {
        self.tile_kind(cell).map_or(true, |kind| kind.is_collidable())
    }

    fn first_bomb(&self, cell: GridCoordinates) -> Option<Bomb>;

    fn has_bomb(&self, cell: GridCoordinates) -> bool {
        self.first_bomb(cell).is_some()
    }

    /// Ticks the explosion on this cell stays active, if any
    fn explosion_time_remaining(&self, cell: GridCoordinates) -> Option<u32>;

    fn is_exploding(&self, cell: GridCoordinates) -> bool {
        self.explosion_time_remaining(cell).is_some()
    }

    fn entities(&self, cell: GridCoordinates) -> Vec<Entity>;

    fn bonus_kind(&self, cell: GridCoordinates) -> Option<BonusKind>;

    /// Whether the agent's body would hit an obstacle moving `distance` pixels
    fn is_colliding(&self, agent: &AgentState, direction: Direction, distance: f64) -> bool;
}

/// Helpers shared by the decision modules
pub(crate) fn is_good_bonus<W: WorldQuery + ?Sized>(world: &W, cell: GridCoordinates) -> bool {
    bonus_at(world, cell).map_or(false, |bonus| bonus.is_good())
}

pub(crate) fn is_bad_bonus<W: WorldQuery + ?Sized>(world: &W, cell: GridCoordinates) -> bool {
    bonus_at(world, cell).map_or(false, |bonus| !bonus.is_good())
}

fn bonus_at<W: WorldQuery + ?Sized>(world: &W, cell: GridCoordinates) -> Option<BonusKind> {
    if !world.is_inside_map(cell) || world.tile_kind(cell) != Some(TileKind::Bonus) {
        return None;
    }
    world.bonus_kind(cell)
}

/// Walkable and not blocked by a bomb
pub(crate) fn is_empty<W: WorldQuery + ?Sized>(world: &W, cell: GridCoordinates) -> bool {
    !world.is_collidable(cell) && !world.has_bomb(cell)
}
