// Headless match runner
//
// Every tick each living character's controller sees the same world snapshot;
// intents are applied only after all controllers have decided, then the
// arena advances.

use log::info;
use serde::Serialize;

use crate::arena::Arena;
use crate::config::Config;
use crate::controller::{AiController, Controller};
use crate::types::{AgentId, AgentIntent, GridCoordinates};
use crate::world::WorldQuery;

/// One controller decision, as recorded in the debug trace
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub tick: u64,
    pub agent: AgentId,
    pub location: GridCoordinates,
    pub intent: AgentIntent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub ticks: u64,
    pub survivors: Vec<AgentId>,
    pub bombs_placed: u64,
    pub contestants: usize,
}

impl MatchOutcome {
    pub fn winner(&self) -> Option<AgentId> {
        match self.survivors.as_slice() {
            [winner] if self.contestants > 1 => Some(*winner),
            _ => None,
        }
    }
}

pub struct Match {
    arena: Arena,
    controllers: Vec<(AgentId, Box<dyn Controller + Send>)>,
    max_ticks: u64,
}

impl Match {
    pub fn new(arena: Arena, max_ticks: u64) -> Self {
        Match {
            arena,
            controllers: Vec::new(),
            max_ticks,
        }
    }

    /// Classic arena with one AI per spawn corner, everything derived from `seed`
    pub fn from_config(config: &Config, seed: u64) -> Self {
        let sim = &config.simulation;
        let arena = Arena::classic(
            sim.width,
            sim.height,
            sim.breakable_density,
            config.game_rules.clone(),
            seed,
        );
        let spawns = arena.spawn_points();
        let mut arena_match = Match::new(arena, sim.max_ticks);

        for (i, spawn) in spawns.into_iter().take(sim.agents).enumerate() {
            let id = arena_match.arena.spawn_character(spawn);
            let controller = AiController::with_seed(config, seed.wrapping_add(1 + i as u64));
            arena_match.add_controller(id, Box::new(controller));
        }

        info!(
            "Match seeded with {} on a {}x{} arena, {} agents",
            seed,
            sim.width,
            sim.height,
            arena_match.controllers.len()
        );
        arena_match
    }

    pub fn add_controller(&mut self, agent: AgentId, mut controller: Box<dyn Controller + Send>) {
        controller.bind(agent);
        self.controllers.push((agent, controller));
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    pub fn is_over(&self) -> bool {
        let alive = self.arena.alive_ids().len();
        let last_standing = self.controllers.len() > 1 && alive <= 1;
        alive == 0 || last_standing || self.arena.ticks() >= self.max_ticks
    }

    /// Runs a single tick and returns every decision taken in it
    pub fn step(&mut self) -> Vec<Decision> {
        let tick = self.arena.ticks();
        let mut decisions = Vec::with_capacity(self.controllers.len());

        for (agent, controller) in self.controllers.iter_mut() {
            let alive = self.arena.character(*agent).map_or(false, |c| c.alive);
            let state = match self.arena.agent_state(*agent) {
                Some(state) if alive => state,
                _ => continue,
            };

            controller.update(&self.arena, &state);
            decisions.push(Decision {
                tick,
                agent: *agent,
                location: self.arena.to_grid(state.x, state.y),
                intent: controller.intent(),
            });
        }

        for decision in &decisions {
            self.arena.apply_intent(decision.agent, decision.intent);
        }
        self.arena.tick();

        decisions
    }

    pub fn outcome(&self) -> MatchOutcome {
        MatchOutcome {
            ticks: self.arena.ticks(),
            survivors: self.arena.alive_ids(),
            bombs_placed: self.arena.bombs_placed(),
            contestants: self.controllers.len(),
        }
    }

    /// Steps until the match is over
    pub fn run(&mut self) -> MatchOutcome {
        while !self.is_over() {
            self.step();
        }
        let outcome = self.outcome();
        info!(
            "Match over after {} ticks: survivors {:?}, {} bombs placed",
            outcome.ticks, outcome.survivors, outcome.bombs_placed
        );
        outcome
    }
}
