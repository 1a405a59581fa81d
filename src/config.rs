// Configuration module for reading Bomber.toml
// Holds search tuning for the agent plus the rules the headless arena plays by

use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub behavior: BehaviorConfig,
    pub game_rules: GameRulesConfig,
    pub simulation: SimulationConfig,
    pub debug: DebugConfig,
}

/// Lookahead limits for the safety search
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Depth used when the heading is blocked or drifting
    pub turn_depth: u32,
    pub turn_min_safety: i32,
    /// Depth used to confirm an escape before placing a bomb
    pub bomb_escape_depth: u32,
    pub bomb_escape_min_safety: i32,
}

/// Probabilistic triggers, expressed per second of simulated time
#[derive(Debug, Deserialize, Clone)]
pub struct BehaviorConfig {
    pub bomb_trigger_per_second: f64,
    pub shuffle_interval_seconds: f64,
    pub shuffle_per_second: f64,
}

/// Arena rules
#[derive(Debug, Deserialize, Clone)]
pub struct GameRulesConfig {
    pub fps: u32,
    pub tile_size: f64,
    pub fuse_seconds: f64,
    pub explosion_seconds: f64,
    pub round_seconds: f64,
    /// Once the round clock runs out, one cell collapses every this many seconds
    pub collapse_seconds: f64,
    /// Pixels per tick
    pub character_speed: f64,
    /// Side of a character's hitbox as a fraction of the tile size
    pub hitbox_ratio: f64,
    pub starting_bombs: u32,
    pub starting_range: u32,
    pub bonus_drop_chance: f64,
}

impl GameRulesConfig {
    pub fn fuse_ticks(&self) -> u32 {
        self.seconds_to_ticks(self.fuse_seconds)
    }

    pub fn explosion_ticks(&self) -> u32 {
        self.seconds_to_ticks(self.explosion_seconds)
    }

    pub fn round_ticks(&self) -> i64 {
        self.seconds_to_ticks(self.round_seconds) as i64
    }

    /// Ticks between two collapses in sudden death, never zero
    pub fn collapse_ticks(&self) -> u32 {
        self.seconds_to_ticks(self.collapse_seconds).max(1)
    }

    fn seconds_to_ticks(&self, seconds: f64) -> u32 {
        (seconds * self.fps as f64).round().max(0.0) as u32
    }
}

/// Headless match settings
#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub width: i32,
    pub height: i32,
    pub agents: usize,
    pub max_ticks: u64,
    pub breakable_density: f64,
    /// Fixed seed for reproducible matches; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Pace ticks at `fps` instead of running flat out
    pub realtime: bool,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the Bomber.toml configuration file
    ///
    /// # Returns
    /// * `Result<Config, String>` - Parsed configuration or error message
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Loads default configuration from Bomber.toml in the project root
    pub fn load_default() -> Result<Self, String> {
        Self::from_file("Bomber.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Bomber.toml
    pub fn default_hardcoded() -> Self {
        Config {
            search: SearchConfig {
                turn_depth: 10,
                turn_min_safety: -1,
                bomb_escape_depth: 5,
                bomb_escape_min_safety: 1,
            },
            behavior: BehaviorConfig {
                bomb_trigger_per_second: 2.0,
                shuffle_interval_seconds: 0.5,
                shuffle_per_second: 0.5,
            },
            game_rules: GameRulesConfig {
                fps: 60,
                tile_size: 32.0,
                fuse_seconds: 2.0,
                explosion_seconds: 0.5,
                round_seconds: 180.0,
                collapse_seconds: 0.1,
                character_speed: 2.0,
                hitbox_ratio: 0.8,
                starting_bombs: 1,
                starting_range: 2,
                bonus_drop_chance: 0.3,
            },
            simulation: SimulationConfig {
                width: 15,
                height: 13,
                agents: 4,
                max_ticks: 12_000,
                breakable_density: 0.7,
                seed: None,
                realtime: false,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "bomber_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Bomber.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversions() {
        let rules = Config::default_hardcoded().game_rules;
        assert_eq!(rules.fuse_ticks(), 120);
        assert_eq!(rules.explosion_ticks(), 30);
        assert_eq!(rules.round_ticks(), 10_800);
        assert_eq!(rules.collapse_ticks(), 6);
    }

    #[test]
    fn test_bomber_toml_can_be_parsed() {
        let result = Config::from_file("Bomber.toml");
        assert!(result.is_ok(), "Failed to parse Bomber.toml: {:?}", result.err());
    }

    #[test]
    fn test_all_config_values_match_hardcoded_defaults() {
        let file_config = Config::from_file("Bomber.toml").expect("Bomber.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        // Search
        assert_eq!(file_config.search.turn_depth, hardcoded.search.turn_depth);
        assert_eq!(file_config.search.turn_min_safety, hardcoded.search.turn_min_safety);
        assert_eq!(file_config.search.bomb_escape_depth, hardcoded.search.bomb_escape_depth);
        assert_eq!(
            file_config.search.bomb_escape_min_safety,
            hardcoded.search.bomb_escape_min_safety
        );

        // Behavior
        assert_eq!(
            file_config.behavior.bomb_trigger_per_second,
            hardcoded.behavior.bomb_trigger_per_second
        );
        assert_eq!(
            file_config.behavior.shuffle_interval_seconds,
            hardcoded.behavior.shuffle_interval_seconds
        );
        assert_eq!(
            file_config.behavior.shuffle_per_second,
            hardcoded.behavior.shuffle_per_second
        );

        // Game rules
        let (file_rules, rules) = (&file_config.game_rules, &hardcoded.game_rules);
        assert_eq!(file_rules.fps, rules.fps);
        assert_eq!(file_rules.tile_size, rules.tile_size);
        assert_eq!(file_rules.fuse_seconds, rules.fuse_seconds);
        assert_eq!(file_rules.explosion_seconds, rules.explosion_seconds);
        assert_eq!(file_rules.round_seconds, rules.round_seconds);
        assert_eq!(file_rules.collapse_seconds, rules.collapse_seconds);
        assert_eq!(file_rules.character_speed, rules.character_speed);
        assert_eq!(file_rules.hitbox_ratio, rules.hitbox_ratio);
        assert_eq!(file_rules.starting_bombs, rules.starting_bombs);
        assert_eq!(file_rules.starting_range, rules.starting_range);
        assert_eq!(file_rules.bonus_drop_chance, rules.bonus_drop_chance);

        // Simulation
        let (file_sim, sim) = (&file_config.simulation, &hardcoded.simulation);
        assert_eq!(file_sim.width, sim.width);
        assert_eq!(file_sim.height, sim.height);
        assert_eq!(file_sim.agents, sim.agents);
        assert_eq!(file_sim.max_ticks, sim.max_ticks);
        assert_eq!(file_sim.breakable_density, sim.breakable_density);
        assert_eq!(file_sim.seed, sim.seed);
        assert_eq!(file_sim.realtime, sim.realtime);

        // Debug
        assert_eq!(file_config.debug.enabled, hardcoded.debug.enabled);
        assert_eq!(file_config.debug.log_file_path, hardcoded.debug.log_file_path);
    }

    #[test]
    fn test_missing_file_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_toml_returns_error() {
        let parsed: Result<Config, _> = toml::from_str("[search]\nturn_depth = \"deep\"");
        assert!(parsed.is_err());
    }
}
