// Per-tick decision policy
//
// The controller keeps a heading between ticks and only searches when that
// heading stops working: it is about to hit something, or the next step
// lands in a new cell. Bombing is decided first and only committed when a
// search under a hypothetical bomb on the current cell finds a safe exit.

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::{BehaviorConfig, Config, SearchConfig};
use crate::search::{ChoiceOutcome, DirectionPreferences, SafetySearch};
use crate::target::has_target;
use crate::threat::{HypotheticalBomb, ThreatEvaluator};
use crate::types::{AgentId, AgentIntent, AgentState, Direction, GridCoordinates};
use crate::world::WorldQuery;

/// Anything that can drive a character: the AI below, or an external input source
pub trait Controller {
    fn name(&self) -> &str;

    /// Attaches the controller to a (new) body
    fn bind(&mut self, agent: AgentId);

    /// Called exactly once per simulation tick
    fn update(&mut self, world: &dyn WorldQuery, agent: &AgentState);

    /// Heading for this tick, None to stand still
    fn direction(&self) -> Option<Direction>;

    /// One-shot bomb request; reading it clears it
    fn take_place_device(&mut self) -> bool;

    fn intent(&mut self) -> AgentIntent {
        let direction = self.direction();
        let place_device = self.take_place_device();
        AgentIntent { direction, place_device }
    }
}

/// Counters describing what the controller did, for logs and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecisionStats {
    pub ticks: u64,
    pub searches: u64,
    pub holds: u64,
    pub random_turns: u64,
    pub reshuffles: u64,
    pub bomb_checks: u64,
    pub bombs_committed: u64,
}

pub struct AiController<R = StdRng> {
    name: String,
    search: SearchConfig,
    behavior: BehaviorConfig,
    agent: Option<AgentId>,
    current_direction: Option<Direction>,
    preferences: DirectionPreferences,
    ticks_since_shuffle: u32,
    bombing: bool,
    simulating: bool,
    location: GridCoordinates,
    rng: R,
    stats: DecisionStats,
}

impl AiController<StdRng> {
    pub fn new(config: &Config) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AiController<R> {
    pub fn with_rng(config: &Config, mut rng: R) -> Self {
        let preferences = DirectionPreferences::shuffled(&mut rng);
        AiController {
            name: "AI".to_string(),
            search: config.search.clone(),
            behavior: config.behavior.clone(),
            agent: None,
            current_direction: None,
            preferences,
            ticks_since_shuffle: 0,
            bombing: false,
            simulating: false,
            location: GridCoordinates::new(0, 0),
            rng,
            stats: DecisionStats::default(),
        }
    }

    pub fn current_direction(&self) -> Option<Direction> {
        self.current_direction
    }

    pub fn set_current_direction(&mut self, direction: Option<Direction>) {
        self.current_direction = direction;
    }

    pub fn preferences(&self) -> &DirectionPreferences {
        &self.preferences
    }

    pub fn set_preferences(&mut self, preferences: DirectionPreferences) {
        self.preferences = preferences;
    }

    pub fn stats(&self) -> DecisionStats {
        self.stats
    }

    /// True only while a hypothetical bomb search is running
    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    pub fn agent(&self) -> Option<AgentId> {
        self.agent
    }

    pub fn location(&self) -> GridCoordinates {
        self.location
    }

    /// Runs one decision cycle against any world implementation
    pub fn decide<W: WorldQuery + ?Sized>(&mut self, world: &W, agent: &AgentState) {
        debug_assert!(!self.simulating, "decision cycle started inside a bomb check");
        self.stats.ticks += 1;
        self.location = world.to_grid(agent.x, agent.y);

        if self.is_ready_to_bomb(world, agent) {
            self.bombing = true;
            self.stats.bombs_committed += 1;
            debug!(
                "Agent {} placing a bomb at {:?}, escaping {:?}",
                agent.id, self.location, self.current_direction
            );
            return;
        }

        if self.current_direction.is_none() {
            self.current_direction = agent.heading;
        }

        let fps = world.fps().max(1) as f64;
        self.ticks_since_shuffle = self.ticks_since_shuffle.saturating_add(1);
        if self.ticks_since_shuffle as f64 >= self.behavior.shuffle_interval_seconds * fps
            && self.rng.random::<f64>() < self.behavior.shuffle_per_second / fps
        {
            self.shuffle_directions(world);
        }

        if let Some(heading) = self.current_direction {
            if world.is_colliding(agent, heading, agent.max_speed) {
                self.shuffle_directions(world);
                if !self.turn_safely(world, agent, None) {
                    self.turn_randomly(world, agent);
                }
            } else if self.location != self.next_position(world, agent, heading) {
                self.turn_safely(world, agent, None);
            }
        }

        if let Some(heading) = self.current_direction {
            let opposite = heading.opposite();
            if self.preferences.last() != opposite {
                self.preferences.move_to_back(opposite);
            }
        }

        let blocked = self
            .current_direction
            .map_or(false, |d| world.is_colliding(agent, d, agent.max_speed));
        debug_assert!(!blocked, "heading left pointing into a collision");
        if blocked {
            self.current_direction = None;
        }
    }

    /// Cell the body would reach after one more step in `direction`
    fn next_position<W: WorldQuery + ?Sized>(
        &self,
        world: &W,
        agent: &AgentState,
        direction: Direction,
    ) -> GridCoordinates {
        let reach = agent.max_speed + world.tile_size() / 2.0;
        let (dx, dy) = direction.delta();
        world.to_grid(agent.x + dx * reach, agent.y + dy * reach)
    }

    fn shuffle_directions<W: WorldQuery + ?Sized>(&mut self, world: &W) {
        if ThreatEvaluator::new(world).is_safe(self.location) {
            self.preferences.shuffle(&mut self.rng);
            self.ticks_since_shuffle = 0;
            self.stats.reshuffles += 1;
        }
    }

    fn turn_safely<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        agent: &AgentState,
        excluded: Option<Direction>,
    ) -> bool {
        let (depth, min_safety) = (self.search.turn_depth, self.search.turn_min_safety);
        self.apply_choice(world, agent, depth, min_safety, excluded, None)
    }

    fn apply_choice<W: WorldQuery + ?Sized>(
        &mut self,
        world: &W,
        agent: &AgentState,
        max_depth: u32,
        min_safety: i32,
        excluded: Option<Direction>,
        hypothetical: Option<HypotheticalBomb>,
    ) -> bool {
        self.stats.searches += 1;
        let search = SafetySearch::new(world, agent, &self.preferences, hypothetical);
        match search.choose_direction(max_depth, min_safety, excluded) {
            ChoiceOutcome::Commit(direction, info) => {
                log::trace!("Agent {} heading {:?} ({:?})", agent.id, direction, info);
                self.current_direction = Some(direction);
                true
            }
            ChoiceOutcome::HoldPosition => {
                self.current_direction = None;
                self.stats.holds += 1;
                true
            }
            ChoiceOutcome::NoAcceptable => false,
        }
    }

    /// Takes the first free direction that differs from the current heading
    fn turn_randomly<W: WorldQuery + ?Sized>(&mut self, world: &W, agent: &AgentState) {
        self.stats.random_turns += 1;
        let current = self.current_direction;
        self.current_direction = self
            .preferences
            .iter()
            .find(|d| Some(*d) != current && !world.is_colliding(agent, *d, agent.max_speed));
        debug!("Agent {} fell back to turning {:?}", agent.id, self.current_direction);
    }

    fn is_ready_to_bomb<W: WorldQuery + ?Sized>(&mut self, world: &W, agent: &AgentState) -> bool {
        if agent.bomb_count >= agent.bomb_max || world.time_remaining() <= 0 {
            return false;
        }
        if !ThreatEvaluator::new(world).is_safe(self.location) {
            return false;
        }

        let fps = world.fps().max(1) as f64;
        if self.rng.random::<f64>() >= self.behavior.bomb_trigger_per_second / fps {
            return false;
        }
        if !has_target(world, self.location, agent.id, agent.range) {
            return false;
        }

        debug_assert!(!self.simulating, "nested bomb check");
        let before = self.current_direction;
        let hypothetical = HypotheticalBomb {
            origin: self.location,
            range: agent.range,
            fuse: world.bomb_fuse_ticks(),
        };

        self.simulating = true;
        self.stats.bomb_checks += 1;
        let (depth, min_safety) = (self.search.bomb_escape_depth, self.search.bomb_escape_min_safety);
        let escape = self.apply_choice(world, agent, depth, min_safety, None, Some(hypothetical));
        self.simulating = false;

        if !escape {
            self.current_direction = before;
            debug!("Agent {} found no escape from a bomb at {:?}", agent.id, self.location);
        }
        escape
    }
}

impl<R: Rng> Controller for AiController<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind(&mut self, agent: AgentId) {
        self.agent = Some(agent);
        self.current_direction = None;
        self.bombing = false;
        self.simulating = false;
    }

    fn update(&mut self, world: &dyn WorldQuery, agent: &AgentState) {
        self.decide(world, agent);
    }

    fn direction(&self) -> Option<Direction> {
        if self.bombing {
            None
        } else {
            self.current_direction
        }
    }

    fn take_place_device(&mut self) -> bool {
        std::mem::replace(&mut self.bombing, false)
    }
}
