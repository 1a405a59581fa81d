// Bomb threat evaluation
//
// A cell is threatened by every bomb that sits on one of its four rays, with
// no collidable tile in between, and whose range covers the distance to it.
// An optional hypothetical bomb lets the bomb check ask "what if I placed
// a bomb where I stand" without touching the world.

use crate::types::{Direction, GridCoordinates};
use crate::world::WorldQuery;

/// A bomb that does not exist yet but is assumed for one search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HypotheticalBomb {
    pub origin: GridCoordinates,
    pub range: u32,
    pub fuse: u32,
}

pub struct ThreatEvaluator<'a, W: WorldQuery + ?Sized> {
    world: &'a W,
    hypothetical: Option<HypotheticalBomb>,
}

impl<'a, W: WorldQuery + ?Sized> ThreatEvaluator<'a, W> {
    pub fn new(world: &'a W) -> Self {
        ThreatEvaluator { world, hypothetical: None }
    }

    pub fn with_hypothetical(world: &'a W, hypothetical: Option<HypotheticalBomb>) -> Self {
        ThreatEvaluator { world, hypothetical }
    }

    pub fn world(&self) -> &'a W {
        self.world
    }

    /// Minimum ticks before a blast reaches `target`, or None if nothing threatens it
    pub fn threat_time_remaining(&self, target: GridCoordinates) -> Option<u32> {
        let mut earliest: Option<u32> = None;
        let mut fold = |time: u32| {
            earliest = Some(earliest.map_or(time, |current| current.min(time)));
        };

        for dir in Direction::all() {
            let mut cell = target;
            while !self.world.is_collidable(cell) {
                if let Some(bomb) = self.world.first_bomb(cell) {
                    if GridCoordinates::distance(target, cell) <= bomb.range as f64 {
                        fold(bomb.time_remaining);
                    }
                }

                if let Some(h) = self.hypothetical {
                    if cell == h.origin && GridCoordinates::distance(target, h.origin) <= h.range as f64 {
                        fold(h.fuse);
                    }
                }

                cell = cell.neighbor(dir);
            }
        }

        earliest
    }

    /// Zero-lookahead safety check
    pub fn is_safe(&self, target: GridCoordinates) -> bool {
        if self.world.is_collidable(target) {
            return true;
        }

        if self.world.is_exploding(target) {
            return false;
        }

        self.threat_time_remaining(target).is_none()
    }
}
