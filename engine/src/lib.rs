#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Swarmkit Engine – composes populations of autonomous units from pluggable
//! capability modules and drives them through synchronous setup/step rounds.

/// Configuration value types.
#[path = "../config.rs"]
pub mod config;

/// Leveled tasks and the task queue.
#[path = "../task.rs"]
pub mod task;

/// Capability module traits and the decomposition discipline.
#[path = "../capability.rs"]
pub mod capability;

/// Unit composition.
#[path = "../unit.rs"]
pub mod unit;

/// Population containers and traversal policies.
#[path = "../container.rs"]
pub mod container;

/// Synchronized swarm-level aggregate.
#[path = "../board.rs"]
pub mod board;

/// Swarm orchestrator.
#[path = "../swarm.rs"]
pub mod swarm;

/// Telemetry and RNG helpers.
#[path = "../helper.rs"]
pub mod helper;

pub use helper::{SwarmTelemetry, SwarmTelemetryBuilder};
pub use swarm::{StopCondition, Swarm, SwarmShared};
