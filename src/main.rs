use log::info;
use std::env;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use bomber_agent::config::Config;
use bomber_agent::debug_logger::DebugLogger;
use bomber_agent::simulation::Match;

#[tokio::main]
async fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    info!("Starting Bomber arena...");

    // An explicit path wins over ./Bomber.toml
    let config = match env::args().nth(1) {
        Some(path) => Config::from_file(&path).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        }),
        None => Config::load_or_default(),
    };

    let seed = config.simulation.seed.unwrap_or_else(rand::random);
    let logger = DebugLogger::new(config.debug.enabled, &config.debug.log_file_path).await;
    let mut arena_match = Match::from_config(&config, seed);

    let fps = config.game_rules.fps.max(1) as f64;
    let mut pacing = tokio::time::interval(Duration::from_secs_f64(1.0 / fps));
    pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !arena_match.is_over() {
        if config.simulation.realtime {
            pacing.tick().await;
        }
        for decision in arena_match.step() {
            logger.log_decision(&decision);
        }
    }
    logger.flush().await;

    let outcome = arena_match.outcome();
    match outcome.winner() {
        Some(winner) => info!("Agent {} wins after {} ticks", winner, outcome.ticks),
        None => info!("No winner after {} ticks (survivors: {:?})", outcome.ticks, outcome.survivors),
    }
    info!("{} bombs placed", outcome.bombs_placed);
    println!("{}", arena_match.arena());
}
