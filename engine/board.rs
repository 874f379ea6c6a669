use parking_lot::Mutex;

/// Swarm-level aggregate slot touched by many units in the same round.
///
/// All access goes through one lock, so contention stays confined to
/// swarm-level state and never bleeds into a unit's private state. The
/// ordering predicate for [`Board::improve`] comes from the concrete
/// algorithm; the core only supplies the compare-and-update discipline.
#[derive(Debug, Default)]
pub struct Board<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Board<T> {
    /// Creates an empty board.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Creates a board seeded with an initial value.
    #[must_use]
    pub const fn with_value(value: T) -> Self {
        Self {
            slot: Mutex::new(Some(value)),
        }
    }

    /// Overwrites the slot unconditionally.
    pub fn store(&self, value: T) {
        *self.slot.lock() = Some(value);
    }

    /// Replaces the current value with `candidate` when the slot is empty
    /// or when `better(candidate, current)` holds. Returns whether the
    /// candidate was kept. Compare and swap happen under one lock.
    pub fn improve<F>(&self, candidate: T, better: F) -> bool
    where
        F: FnOnce(&T, &T) -> bool,
    {
        let mut slot = self.slot.lock();
        match slot.as_ref() {
            Some(current) if !better(&candidate, current) => false,
            _ => {
                *slot = Some(candidate);
                true
            }
        }
    }

    /// Applies an arbitrary read-modify-write step under the lock.
    pub fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut Option<T>),
    {
        apply(&mut self.slot.lock());
    }

    /// Clones the current value out of the slot.
    #[must_use]
    pub fn load(&self) -> Option<T>
    where
        T: Clone,
    {
        self.slot.lock().clone()
    }
}
