// Bombing target assessment
//
// A bomb is worth placing when its blast would reach an opponent, or break a
// crate without first burning a good bonus lying closer on the same ray.

use crate::types::{AgentId, Direction, Entity, GridCoordinates, TileKind};
use crate::world::{is_empty, is_good_bonus, WorldQuery};

/// Whether a bomb with `range` placed on `origin` would hit something useful
pub fn has_target<W: WorldQuery + ?Sized>(
    world: &W,
    origin: GridCoordinates,
    agent: AgentId,
    range: u32,
) -> bool {
    let mut destroy_breakable = false;

    for dir in Direction::all() {
        let mut cell = origin;
        let mut good_bonus_on_ray = false;

        for _ in 0..range {
            cell = cell.neighbor(dir);
            if !world.is_inside_map(cell) {
                break;
            }

            if world.tile_kind(cell) == Some(TileKind::Breakable) {
                if !good_bonus_on_ray {
                    destroy_breakable = true;
                }
                break;
            }

            if !is_empty(world, cell) {
                break;
            }

            if is_good_bonus(world, cell) {
                good_bonus_on_ray = true;
                continue;
            }

            let opponent_here = world
                .entities(cell)
                .iter()
                .any(|e| matches!(e, Entity::Character(id) if *id != agent));
            if opponent_here {
                return true;
            }
        }
    }

    destroy_breakable
}
