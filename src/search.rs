// Threat-aware direction search
//
// Each candidate direction is walked cell by cell. A cell nobody threatens
// ends the walk as safe; a threatened cell that can still be crossed in time
// branches into every direction except straight back, one level deeper. The
// depth bound is the only thing that stops the recursion.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::cmp::Ordering;

use crate::threat::{HypotheticalBomb, ThreatEvaluator};
use crate::types::{AgentState, Direction, GridCoordinates};
use crate::world::{is_bad_bonus, is_empty, is_good_bonus, WorldQuery};

/// Walking into an active explosion or arriving after the blast
pub const SAFETY_BURNED: i32 = -2;
/// The next cell cannot be entered
pub const SAFETY_BLOCKED: i32 = -1;
/// Lookahead exhausted before reaching a safe cell
pub const SAFETY_UNKNOWN: i32 = 0;
/// A safe cell is reachable
pub const SAFETY_SAFE: i32 = 1;

/// Score of one candidate direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionInfo {
    pub safety: i32,
    /// Cells walked before the verdict
    pub steps: u32,
    pub bad_bonus: u32,
    pub good_bonus: u32,
}

impl Ord for DirectionInfo {
    /// Greater is better: safety, then fewer bad bonuses, then more steps,
    /// then more good bonuses
    fn cmp(&self, other: &Self) -> Ordering {
        self.safety
            .cmp(&other.safety)
            .then_with(|| other.bad_bonus.cmp(&self.bad_bonus))
            .then_with(|| self.steps.cmp(&other.steps))
            .then_with(|| self.good_bonus.cmp(&other.good_bonus))
    }
}

impl PartialOrd for DirectionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Exploration order of the four directions, most preferred first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionPreferences([Direction; 4]);

impl DirectionPreferences {
    pub fn new(order: [Direction; 4]) -> Self {
        DirectionPreferences(order)
    }

    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut preferences = Self::default();
        preferences.shuffle(rng);
        preferences
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.0.shuffle(rng);
    }

    pub fn iter(&self) -> impl Iterator<Item = Direction> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Direction] {
        &self.0
    }

    pub fn last(&self) -> Direction {
        self.0[3]
    }

    /// Moves `direction` to the least preferred slot, keeping the others in order
    pub fn move_to_back(&mut self, direction: Direction) {
        if let Some(idx) = self.0.iter().position(|d| *d == direction) {
            self.0[idx..].rotate_left(1);
        }
    }
}

impl Default for DirectionPreferences {
    fn default() -> Self {
        DirectionPreferences(Direction::all())
    }
}

/// Result of picking a heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Commit(Direction, DirectionInfo),
    /// Standing still is safer than every option
    HoldPosition,
    /// Nothing meets the requested minimum safety
    NoAcceptable,
}

pub struct SafetySearch<'a, W: WorldQuery + ?Sized> {
    threats: ThreatEvaluator<'a, W>,
    agent: &'a AgentState,
    preferences: &'a DirectionPreferences,
}

impl<'a, W: WorldQuery + ?Sized> SafetySearch<'a, W> {
    pub fn new(
        world: &'a W,
        agent: &'a AgentState,
        preferences: &'a DirectionPreferences,
        hypothetical: Option<HypotheticalBomb>,
    ) -> Self {
        SafetySearch {
            threats: ThreatEvaluator::with_hypothetical(world, hypothetical),
            agent,
            preferences,
        }
    }

    pub fn threats(&self) -> &ThreatEvaluator<'a, W> {
        &self.threats
    }

    /// Ticks needed to walk `steps` cells at full speed
    fn travel_time(&self, steps: i64) -> f64 {
        steps as f64 * self.threats.world().tile_size() / self.agent.max_speed.max(f64::EPSILON)
    }

    /// Scores walking from `position` towards `direction`, `depth` steps into the lookahead
    pub fn evaluate_direction(
        &self,
        position: GridCoordinates,
        direction: Direction,
        max_depth: u32,
        depth: u32,
    ) -> DirectionInfo {
        let world = self.threats.world();
        let next = position.neighbor(direction);
        let mut info = DirectionInfo {
            safety: SAFETY_UNKNOWN,
            steps: 1,
            bad_bonus: is_bad_bonus(world, next) as u32,
            good_bonus: is_good_bonus(world, next) as u32,
        };

        if !is_empty(world, next) {
            info.safety = SAFETY_BLOCKED;
            return info;
        }

        if let Some(remaining) = world.explosion_time_remaining(next) {
            info.safety = if remaining as f64 <= self.travel_time(depth as i64 - 1) {
                SAFETY_SAFE
            } else {
                SAFETY_BURNED
            };
            return info;
        }

        let threat = match self.threats.threat_time_remaining(next) {
            None => {
                info.safety = SAFETY_SAFE;
                info.good_bonus += self.count_good_bonuses_ahead(next, direction, max_depth, depth);
                return info;
            }
            Some(threat) => threat,
        };

        if depth + 1 >= max_depth {
            info.safety = SAFETY_UNKNOWN;
            return info;
        }

        if self.travel_time(depth as i64 + 1) > threat as f64 {
            info.safety = SAFETY_BURNED;
            return info;
        }

        let best = self
            .preferences
            .iter()
            .filter(|next_dir| !Direction::are_opposite(direction, *next_dir))
            .map(|next_dir| self.evaluate_direction(next, next_dir, max_depth, depth + 1))
            .fold(None, pick_better);

        match best {
            Some(best) => {
                info.safety = best.safety;
                info.steps += best.steps;
                info.bad_bonus += best.bad_bonus;
                info.good_bonus += best.good_bonus;
            }
            None => info.safety = SAFETY_BLOCKED,
        }
        info
    }

    /// Counts good bonuses straight ahead of a safe cell, stopping at the
    /// first obstacle, hazard or bad bonus
    fn count_good_bonuses_ahead(
        &self,
        from: GridCoordinates,
        direction: Direction,
        max_depth: u32,
        depth: u32,
    ) -> u32 {
        let world = self.threats.world();
        let mut cell = from;
        let mut count = 0;

        for _ in depth..max_depth {
            cell = cell.neighbor(direction);
            if !is_empty(world, cell)
                || world.is_exploding(cell)
                || is_bad_bonus(world, cell)
                || !self.threats.is_safe(cell)
            {
                break;
            }
            if is_good_bonus(world, cell) {
                count += 1;
            }
        }

        count
    }

    /// Picks a heading among the non-colliding directions
    pub fn choose_direction(
        &self,
        max_depth: u32,
        min_safety: i32,
        excluded: Option<Direction>,
    ) -> ChoiceOutcome {
        let world = self.threats.world();
        let location = world.to_grid(self.agent.x, self.agent.y);

        let mut best: Option<(Direction, DirectionInfo)> = None;
        for direction in self.preferences.iter() {
            if Some(direction) == excluded
                || world.is_colliding(self.agent, direction, self.agent.max_speed)
            {
                continue;
            }

            let info = self.evaluate_direction(location, direction, max_depth, 0);
            log::trace!("Agent {} {:?}: {:?}", self.agent.id, direction, info);
            if best.map_or(true, |(_, current)| info > current) {
                best = Some((direction, info));
            }
        }

        let poor = match best {
            None => true,
            Some((_, info)) => {
                info.safety <= SAFETY_UNKNOWN || info.steps > 1 || info.bad_bonus > 0
            }
        };
        if poor && self.threats.is_safe(location) {
            return ChoiceOutcome::HoldPosition;
        }

        match best {
            Some((direction, info)) if info.safety >= min_safety => ChoiceOutcome::Commit(direction, info),
            _ => ChoiceOutcome::NoAcceptable,
        }
    }
}

/// Keeps the first of equally ranked candidates
fn pick_better(best: Option<DirectionInfo>, candidate: DirectionInfo) -> Option<DirectionInfo> {
    match best {
        Some(current) if candidate <= current => Some(current),
        _ => Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn info(safety: i32, steps: u32, bad_bonus: u32, good_bonus: u32) -> DirectionInfo {
        DirectionInfo { safety, steps, bad_bonus, good_bonus }
    }

    #[test]
    fn test_ranking_prefers_safety_first() {
        assert!(info(1, 5, 2, 0) > info(0, 1, 0, 3));
        assert!(info(0, 1, 0, 0) > info(-1, 1, 0, 0));
        assert!(info(-1, 1, 0, 0) > info(-2, 1, 0, 0));
    }

    #[test]
    fn test_ranking_tie_breaks() {
        // Fewer bad bonuses beat more steps
        assert!(info(1, 1, 0, 0) > info(1, 3, 1, 0));
        // More confirmed steps next
        assert!(info(1, 3, 0, 0) > info(1, 2, 0, 5));
        // Then more good bonuses
        assert!(info(1, 2, 0, 2) > info(1, 2, 0, 1));
        assert_eq!(info(1, 2, 0, 1).cmp(&info(1, 2, 0, 1)), Ordering::Equal);
    }

    #[test]
    fn test_absent_info_is_worst() {
        let absent: Option<DirectionInfo> = None;
        assert!(Some(info(-2, 0, 9, 0)) > absent);
    }

    #[test]
    fn test_pick_better_keeps_first_on_tie() {
        let first = info(1, 1, 0, 0);
        let second = info(1, 1, 0, 0);
        assert_eq!(pick_better(Some(first), second), Some(first));
        assert_eq!(pick_better(None, second), Some(second));
        assert_eq!(pick_better(Some(first), info(1, 2, 0, 0)), Some(info(1, 2, 0, 0)));
    }

    #[test]
    fn test_move_to_back_preserves_order() {
        let mut prefs = DirectionPreferences::new([
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Right,
        ]);
        prefs.move_to_back(Direction::Left);
        assert_eq!(
            prefs.as_slice(),
            &[Direction::Up, Direction::Down, Direction::Right, Direction::Left]
        );
        prefs.move_to_back(Direction::Left);
        assert_eq!(prefs.last(), Direction::Left);
    }

    #[test]
    fn test_preferences_stay_a_permutation() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut prefs = DirectionPreferences::shuffled(&mut rng);
        for round in 0..200 {
            if round % 3 == 0 {
                prefs.move_to_back(Direction::all()[round % 4]);
            } else {
                prefs.shuffle(&mut rng);
            }
            for dir in Direction::all() {
                assert_eq!(prefs.iter().filter(|d| *d == dir).count(), 1);
            }
        }
    }
}
