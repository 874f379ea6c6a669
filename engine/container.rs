use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::unit::SwarmUnit;

/// Shared-ownership handle to a unit.
///
/// Containers own their population through these handles; a caller may
/// retain a clone (say, the best unit found so far) without forcing
/// special-cased removal semantics. The lock is uncontended during a round
/// because each unit is visited exactly once per phase.
pub type UnitHandle = Arc<Mutex<dyn SwarmUnit>>;

/// Wraps a concrete unit into a [`UnitHandle`].
#[must_use]
pub fn unit_handle<U: SwarmUnit + 'static>(unit: U) -> UnitHandle {
    Arc::new(Mutex::new(unit))
}

/// Traversal policy for a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Visit units one at a time, in the container's order.
    #[default]
    Sequential,
    /// Visit units across worker threads; the fork-join barrier guarantees
    /// every unit finishes the phase before the round ends.
    Parallel,
}

/// Population storage plus traversal policy.
///
/// Two interchangeable policies implement this contract: an ordered
/// sequence ([`OrderedContainer`]) and an identity-keyed set
/// ([`KeyedContainer`]).
pub trait UnitsContainer {
    /// Transfers a unit into the container. Never fails; capacity is a
    /// hint, not a ceiling.
    fn add_unit(&mut self, unit: UnitHandle);

    /// Applies a side-effecting action to every live unit, one at a time,
    /// in the policy's order.
    fn for_each(&self, action: &mut dyn FnMut(&mut dyn SwarmUnit));

    /// Runs the setup phase on every unit.
    fn init(&self);

    /// Runs one step phase on every unit.
    fn iter(&self);

    /// Number of units actually added.
    fn len(&self) -> usize;

    /// Whether the container holds no units.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-reserved size hint. May be exceeded.
    fn capacity(&self) -> usize;
}

/// Insertion-ordered storage backed by a `Vec`, with a selectable
/// sequential or parallel round traversal.
#[derive(Default)]
pub struct OrderedContainer {
    units: Vec<UnitHandle>,
    traversal: Traversal,
}

impl OrderedContainer {
    /// Creates an empty container with the given traversal policy.
    #[must_use]
    pub const fn new(traversal: Traversal) -> Self {
        Self {
            units: Vec::new(),
            traversal,
        }
    }

    /// Creates a container pre-reserving room for `capacity` units.
    #[must_use]
    pub fn with_capacity(capacity: usize, traversal: Traversal) -> Self {
        Self {
            units: Vec::with_capacity(capacity),
            traversal,
        }
    }

    /// The configured traversal policy.
    #[must_use]
    pub const fn traversal(&self) -> Traversal {
        self.traversal
    }

    fn run_phase<F>(&self, phase: F)
    where
        F: Fn(&mut dyn SwarmUnit) + Send + Sync,
    {
        match self.traversal {
            Traversal::Sequential => {
                for unit in &self.units {
                    phase(&mut *unit.lock());
                }
            }
            Traversal::Parallel => {
                self.units.par_iter().for_each(|unit| phase(&mut *unit.lock()));
            }
        }
    }
}

impl UnitsContainer for OrderedContainer {
    fn add_unit(&mut self, unit: UnitHandle) {
        self.units.push(unit);
    }

    fn for_each(&self, action: &mut dyn FnMut(&mut dyn SwarmUnit)) {
        for unit in &self.units {
            action(&mut *unit.lock());
        }
    }

    fn init(&self) {
        self.run_phase(|unit| unit.init());
    }

    fn iter(&self) {
        self.run_phase(|unit| unit.iter());
    }

    fn len(&self) -> usize {
        self.units.len()
    }

    fn capacity(&self) -> usize {
        self.units.capacity()
    }
}

/// Unordered storage keyed by allocation identity; adding the same handle
/// twice keeps a single entry. Traversal is sequential.
#[derive(Default)]
pub struct KeyedContainer {
    units: IndexMap<usize, UnitHandle>,
}

impl KeyedContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a container pre-reserving room for `capacity` units.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            units: IndexMap::with_capacity(capacity),
        }
    }

    fn key(unit: &UnitHandle) -> usize {
        Arc::as_ptr(unit).cast::<()>() as usize
    }
}

impl UnitsContainer for KeyedContainer {
    fn add_unit(&mut self, unit: UnitHandle) {
        self.units.insert(Self::key(&unit), unit);
    }

    fn for_each(&self, action: &mut dyn FnMut(&mut dyn SwarmUnit)) {
        for unit in self.units.values() {
            action(&mut *unit.lock());
        }
    }

    fn init(&self) {
        for unit in self.units.values() {
            unit.lock().init();
        }
    }

    fn iter(&self) {
        for unit in self.units.values() {
            unit.lock().iter();
        }
    }

    fn len(&self) -> usize {
        self.units.len()
    }

    fn capacity(&self) -> usize {
        self.units.capacity()
    }
}
