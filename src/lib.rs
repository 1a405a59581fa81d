// Library exports for the Bomber agent
// The binaries and integration tests drive the same controller and arena

pub mod arena;
pub mod config;
pub mod controller;
pub mod debug_logger;
pub mod search;
pub mod simulation;
pub mod target;
pub mod threat;
pub mod types;
pub mod world;
