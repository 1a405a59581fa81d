// Runs many seeded matches in parallel and reports how the AI fares
//
// Usage:
//   cargo run --release --bin tournament -- [options]
//
// Options:
//   --matches <n>     Number of matches to play (default: 32)
//   --seed <s>        Seed of the first match; match i uses s + i (default: 1)
//   --config <path>   Path to Bomber.toml (default: Bomber.toml)

use log::info;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::env;
use std::process;

use bomber_agent::config::Config;
use bomber_agent::simulation::{Match, MatchOutcome};

fn print_usage() {
    eprintln!("Bomber Tournament");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  tournament [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --matches <N>     Number of matches to play (default: 32)");
    eprintln!("  --seed <S>        Seed of the first match (default: 1)");
    eprintln!("  --config <path>   Path to Bomber.toml (default: Bomber.toml)");
    eprintln!("  --help            Show this help message");
}

/// Aggregated results across matches
#[derive(Debug, Default)]
struct TournamentStats {
    matches: usize,
    draws: usize,
    timeouts: usize,
    wins: BTreeMap<usize, usize>,
    total_ticks: u64,
    total_bombs: u64,
    total_survivors: usize,
}

impl TournamentStats {
    fn record(&mut self, outcome: &MatchOutcome, max_ticks: u64) {
        self.matches += 1;
        self.total_ticks += outcome.ticks;
        self.total_bombs += outcome.bombs_placed;
        self.total_survivors += outcome.survivors.len();

        if outcome.ticks >= max_ticks {
            self.timeouts += 1;
        }
        match outcome.winner() {
            Some(winner) => *self.wins.entry(winner).or_insert(0) += 1,
            None => self.draws += 1,
        }
    }

    fn print_report(&self) {
        let matches = self.matches.max(1) as f64;

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                  TOURNAMENT REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Matches:            {}", self.matches);
        println!("Draws:              {}", self.draws);
        println!("Timeouts:           {}", self.timeouts);
        println!("Average Ticks:      {:.1}", self.total_ticks as f64 / matches);
        println!("Average Bombs:      {:.1}", self.total_bombs as f64 / matches);
        println!("Average Survivors:  {:.2}", self.total_survivors as f64 / matches);
        println!("═══════════════════════════════════════════════════════════");
        for (agent, wins) in &self.wins {
            println!(
                "Agent {}: {} wins ({:.1}%)",
                agent,
                wins,
                *wins as f64 * 100.0 / matches
            );
        }
        println!();
    }
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    let raw = args
        .get(i + 1)
        .ok_or_else(|| format!("{} requires a value", flag))?;
    raw.parse::<T>()
        .map_err(|e| format!("Invalid value '{}' for {}: {}", raw, flag, e))
}

fn parse_args(args: &[String]) -> Result<(usize, u64, String), String> {
    let mut matches = 32;
    let mut seed = 1;
    let mut config_path = "Bomber.toml".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--matches" => {
                matches = parse_value(args, i, "--matches")?;
                i += 1;
            }
            "--seed" => {
                seed = parse_value(args, i, "--seed")?;
                i += 1;
            }
            "--config" => {
                config_path = parse_value(args, i, "--config")?;
                i += 1;
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    Ok((matches, seed, config_path))
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(0);
    }

    let (matches, seed, config_path) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    let config = match Config::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    info!(
        "Playing {} matches on {} threads",
        matches,
        rayon::current_num_threads()
    );

    let stats = Mutex::new(TournamentStats::default());
    let max_ticks = config.simulation.max_ticks;

    (0..matches as u64).into_par_iter().for_each(|i| {
        let mut arena_match = Match::from_config(&config, seed.wrapping_add(i));
        let outcome = arena_match.run();
        stats.lock().record(&outcome, max_ticks);
    });

    stats.into_inner().print_report();
}
