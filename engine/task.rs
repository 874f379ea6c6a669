use std::{
    collections::VecDeque,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Exclusive upper bound for task levels. Level `MAX_TASK_LEVEL - 1` is the
/// ceiling sentinel; level 0 is terminal.
pub const MAX_TASK_LEVEL: u32 = 256;

/// Stable integer handle to the unit owning a task.
///
/// Tasks carry the owner as plain data instead of a live reference; the
/// swarm that issued the id is responsible for keeping the unit alive while
/// tasks referencing it are queued anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u64);

impl UnitId {
    /// Wraps a raw index.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit-{}", self.0)
    }
}

/// Leveled work item.
///
/// The level, payload and owner are fixed at construction; only the
/// fully-decomposed flag mutates, and atomically, because handles to a task
/// may be retained outside the queue that processes it.
#[derive(Debug)]
pub struct Task {
    level: u32,
    owner: UnitId,
    payload: serde_json::Value,
    fully_decomposed: AtomicBool,
}

impl Task {
    /// Creates a task at the requested level.
    ///
    /// Levels at or above [`MAX_TASK_LEVEL`] saturate to
    /// `MAX_TASK_LEVEL - 1`. Level 0 tasks are terminal and are created
    /// already fully decomposed.
    #[must_use]
    pub fn new(level: u32, owner: UnitId, payload: serde_json::Value) -> Self {
        let level = level.min(MAX_TASK_LEVEL - 1);
        Self {
            level,
            owner,
            payload,
            fully_decomposed: AtomicBool::new(level == 0),
        }
    }

    /// Creates a terminal (level 0) task.
    #[must_use]
    pub fn terminal(owner: UnitId, payload: serde_json::Value) -> Self {
        Self::new(0, owner, payload)
    }

    /// Task level. 0 means terminal.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Owning unit.
    #[must_use]
    pub const fn owner(&self) -> UnitId {
        self.owner
    }

    /// Parameters the task was set with.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Whether the task needs no further decomposition.
    #[must_use]
    pub fn is_fully_decomposed(&self) -> bool {
        self.fully_decomposed.load(Ordering::Acquire)
    }

    /// Marks the task as needing no further decomposition.
    pub fn mark_fully_decomposed(&self) {
        self.fully_decomposed.store(true, Ordering::Release);
    }

    /// Wraps the task into a shared handle.
    #[must_use]
    pub fn into_handle(self) -> TaskHandle {
        Arc::new(self)
    }
}

/// Shared ownership handle to a task.
pub type TaskHandle = Arc<Task>;

/// Contract violations of a decomposition rule.
///
/// Every variant signals a programming error that risks a non-terminating
/// decomposition loop; the queue discipline treats them as fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecomposeError {
    /// A terminal task reached the decomposition rule.
    #[error("cannot decompose terminal task owned by {owner}")]
    TerminalTask {
        /// Owner of the offending task.
        owner: UnitId,
    },
    /// A rule produced a subtask whose level did not strictly decrease.
    #[error("decomposition must strictly decrease level: parent {parent}, child {child}")]
    LevelNotDecreased {
        /// Level of the decomposed task.
        parent: u32,
        /// Level of the offending subtask.
        child: u32,
    },
    /// A rule produced no subtasks for a non-terminal task.
    #[error("decomposition of a level {parent} task produced no subtasks")]
    NoSubtasks {
        /// Level of the decomposed task.
        parent: u32,
    },
}

/// Ordered double-ended sequence of task handles. The front task executes
/// first.
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<TaskHandle>,
}

impl TaskQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task in front; it will be executed first.
    pub fn push_front(&mut self, task: TaskHandle) {
        self.tasks.push_front(task);
    }

    /// Adds a task in back; it will be executed last.
    pub fn push_back(&mut self, task: TaskHandle) {
        self.tasks.push_back(task);
    }

    /// Next task to execute, if any.
    #[must_use]
    pub fn front(&self) -> Option<&TaskHandle> {
        self.tasks.front()
    }

    /// Removes and returns the front task.
    pub fn pop_front(&mut self) -> Option<TaskHandle> {
        self.tasks.pop_front()
    }

    /// Task at queue position `index` (0 = front).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TaskHandle> {
        self.tasks.get(index)
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the queue holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Iterates front to back.
    pub fn iter(&self) -> impl Iterator<Item = &TaskHandle> {
        self.tasks.iter()
    }
}
