use std::sync::Arc;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde_json::json;
use shared_logging::LogLevel;
use uuid::Uuid;

use crate::{
    board::Board,
    capability::UnitState,
    config::Config,
    container::{unit_handle, UnitsContainer},
    helper::SwarmTelemetry,
    task::UnitId,
    unit::{SwarmUnit, UnitKind},
};

/// Swarm-level state shared read-only by every unit for the swarm's
/// lifetime. Round-concurrent mutation is confined to the board.
pub struct SwarmShared<C: Config> {
    run_id: Uuid,
    config: C,
    board: Board<serde_json::Value>,
}

impl<C: Config> SwarmShared<C> {
    /// Wraps a global configuration into shared state.
    #[must_use]
    pub fn new(config: C) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            board: Board::new(),
        }
    }

    /// Identifier of this swarm run, used as the log origin tag.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The global configuration.
    #[must_use]
    pub const fn config(&self) -> &C {
        &self.config
    }

    /// The synchronized swarm-level aggregate.
    #[must_use]
    pub const fn board(&self) -> &Board<serde_json::Value> {
        &self.board
    }
}

/// Algorithm-specific stopping predicate, evaluated by the caller between
/// rounds.
pub trait StopCondition<C: Config>: Send {
    /// Whether the swarm should stop after `round` completed rounds.
    fn is_met(&self, shared: &SwarmShared<C>, round: u64) -> bool;
}

/// Top-level orchestrator: owns one population container, the swarm-level
/// configuration, and the master random source every unit's RNG forks from.
pub struct Swarm<Ctr, C>
where
    Ctr: UnitsContainer,
    C: Config,
{
    units: Ctr,
    shared: Arc<SwarmShared<C>>,
    rng: SmallRng,
    next_unit: u64,
    round: u64,
    telemetry: Option<SwarmTelemetry>,
    stop: Option<Box<dyn StopCondition<C>>>,
}

impl<Ctr, C> Swarm<Ctr, C>
where
    Ctr: UnitsContainer,
    C: Config,
{
    /// Creates a swarm over the given container and configuration. The seed
    /// fixes every random draw of the run, making rounds reproducible.
    #[must_use]
    pub fn new(units: Ctr, config: C, seed: u64) -> Self {
        Self {
            units,
            shared: Arc::new(SwarmShared::new(config)),
            rng: SmallRng::seed_from_u64(seed),
            next_unit: 0,
            round: 0,
            telemetry: None,
            stop: None,
        }
    }

    /// Attaches telemetry.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: SwarmTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Attaches a stopping predicate.
    #[must_use]
    pub fn with_stop_condition(mut self, stop: Box<dyn StopCondition<C>>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Constructs `count` units of the chosen kind, each linked to the
    /// swarm configuration and seeded from the master RNG, and adds them to
    /// the container.
    pub fn populate<K: UnitKind<C>>(&mut self, count: usize) {
        for _ in 0..count {
            let id = UnitId::new(self.next_unit);
            self.next_unit += 1;
            let rng = SmallRng::seed_from_u64(self.rng.gen());
            let state = UnitState::new(id, Arc::clone(&self.shared), rng);
            self.units.add_unit(unit_handle(K::build(state)));
        }
        self.log(
            LogLevel::Info,
            "swarm.populated",
            json!({ "added": count, "total": self.units.len() }),
        );
    }

    /// Runs the setup phase across the population.
    pub fn init(&mut self) {
        self.units.init();
        self.log(
            LogLevel::Info,
            "swarm.initialized",
            json!({ "units": self.units.len() }),
        );
    }

    /// Runs one step round across the population.
    pub fn iter(&mut self) {
        self.units.iter();
        self.round += 1;
        self.log(
            LogLevel::Debug,
            "swarm.round.completed",
            json!({ "round": self.round, "units": self.units.len() }),
        );
    }

    /// Whether the attached stopping predicate is met. Always false without
    /// one.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stop
            .as_ref()
            .map_or(false, |stop| stop.is_met(&self.shared, self.round))
    }

    /// Convenience driver: one setup phase, then step rounds until the
    /// stopping predicate is met or `max_rounds` completed. Returns the
    /// number of completed rounds.
    pub fn run(&mut self, max_rounds: u64) -> u64 {
        self.init();
        while self.round < max_rounds {
            self.iter();
            if self.is_stopped() {
                break;
            }
        }
        self.round
    }

    /// Applies an action to every unit through the container.
    pub fn for_each_agent(&self, action: &mut dyn FnMut(&mut dyn SwarmUnit)) {
        self.units.for_each(action);
    }

    /// Number of units in the population.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.units.len()
    }

    /// The container's pre-reservation hint.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.units.capacity()
    }

    /// Completed step rounds.
    #[must_use]
    pub const fn round(&self) -> u64 {
        self.round
    }

    /// Handle to the swarm-level shared state.
    #[must_use]
    pub const fn shared(&self) -> &Arc<SwarmShared<C>> {
        &self.shared
    }

    /// The population container.
    #[must_use]
    pub const fn container(&self) -> &Ctr {
        &self.units
    }

    /// Mutable access to the population container.
    pub fn container_mut(&mut self) -> &mut Ctr {
        &mut self.units
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.log(level, message, metadata);
        }
    }
}
