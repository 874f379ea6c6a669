use std::{ops::Range, sync::Arc};

use rand::rngs::SmallRng;

use crate::{
    config::Config,
    swarm::SwarmShared,
    task::{DecomposeError, TaskHandle, TaskQueue, UnitId},
};

/// Unit-visible state handed to every capability call.
///
/// Capability modules do not hold a reference to their owning unit; the unit
/// id plus this state is the reachability they get. `shared` links back to
/// swarm-level state (global configuration, board), `rng` is the unit's
/// private random source forked from the swarm master seed.
pub struct UnitState<C: Config> {
    /// Stable id of the owning unit.
    pub id: UnitId,
    /// Swarm-level shared state, read-only during a round except through
    /// the board.
    pub shared: Arc<SwarmShared<C>>,
    /// Unit-private random source.
    pub rng: SmallRng,
}

impl<C: Config> UnitState<C> {
    /// Bundles unit-visible state.
    #[must_use]
    pub const fn new(id: UnitId, shared: Arc<SwarmShared<C>>, rng: SmallRng) -> Self {
        Self { id, shared, rng }
    }
}

/// Communication capability: the unit's exchange with the swarm and with
/// other units.
pub trait Communication<C: Config>: Send {
    /// One-time setup before the first round.
    fn init(&mut self, unit: &mut UnitState<C>);
    /// One discrete step.
    fn iter(&mut self, unit: &mut UnitState<C>);
}

/// Executor capability: performs the work the task manager queued.
///
/// The executor receives the task queue explicitly; the unit guarantees the
/// queue exists (and was initialized) before the executor looks for work.
pub trait Executor<C: Config>: Send {
    /// One-time setup before the first round.
    fn init(&mut self, unit: &mut UnitState<C>, tasks: &mut TaskQueue);
    /// One discrete step.
    fn iter(&mut self, unit: &mut UnitState<C>, tasks: &mut TaskQueue);
}

/// Task manager capability: owns the task queue and the decomposition rule.
///
/// The rule ([`TaskManager::decompose`]) is the sole deliberate extension
/// point of the task machinery; queueing and termination discipline are
/// supplied by the provided [`TaskManager::decompose_front`].
pub trait TaskManager<C: Config>: Send {
    /// One-time setup before the first round.
    fn init(&mut self, unit: &mut UnitState<C>);

    /// One discrete step.
    fn iter(&mut self, unit: &mut UnitState<C>);

    /// The owned task queue.
    fn queue(&self) -> &TaskQueue;

    /// Mutable access to the owned task queue.
    fn queue_mut(&mut self) -> &mut TaskQueue;

    /// Decomposition rule: turns a level `L > 0` task into its direct
    /// subtasks, each of a strictly lower level, collectively covering the
    /// original's work. Must return at least one subtask.
    ///
    /// The rule never sets the fully-decomposed flag of `task`; the caller
    /// does. It may pre-mark a returned subtask to stop further expansion
    /// of that branch.
    fn decompose(&mut self, unit: &mut UnitState<C>, task: &TaskHandle) -> Vec<TaskHandle>;

    /// Adds a task in front of the queue; it will be executed first.
    fn add_task_front(&mut self, task: TaskHandle) {
        self.queue_mut().push_front(task);
    }

    /// Adds a task in back of the queue; it will be executed last.
    fn add_task_back(&mut self, task: TaskHandle) {
        self.queue_mut().push_back(task);
    }

    /// Fully decomposes the front task, replacing it with the run of its
    /// terminal descendants (depth-first, rule order), which land in front
    /// of everything previously queued behind it.
    ///
    /// Returns the queue index range the inserted run occupies. On an empty
    /// queue, or when the front task is already fully decomposed, returns
    /// an empty range and performs no mutation.
    ///
    /// # Panics
    ///
    /// Fails fast on rule contract violations (see [`DecomposeError`]):
    /// a subtask level that does not strictly decrease, or an empty subtask
    /// set. Both risk a non-terminating decomposition loop.
    fn decompose_front(&mut self, unit: &mut UnitState<C>) -> Range<usize> {
        let pending = self
            .queue()
            .front()
            .map_or(false, |task| !task.is_fully_decomposed());
        if !pending {
            return 0..0;
        }
        let Some(root) = self.queue_mut().pop_front() else {
            return 0..0;
        };

        let mut run: Vec<TaskHandle> = Vec::new();
        let mut stack: Vec<TaskHandle> = vec![root];
        while let Some(task) = stack.pop() {
            if task.is_fully_decomposed() {
                run.push(task);
                continue;
            }
            // Terminal tasks are fully decomposed at construction, so a
            // level 0 task can never reach the rule.
            assert!(
                task.level() > 0,
                "{}",
                DecomposeError::TerminalTask {
                    owner: task.owner()
                }
            );
            let children = self.decompose(unit, &task);
            assert!(
                !children.is_empty(),
                "{}",
                DecomposeError::NoSubtasks {
                    parent: task.level()
                }
            );
            for child in &children {
                assert!(
                    child.level() < task.level(),
                    "{}",
                    DecomposeError::LevelNotDecreased {
                        parent: task.level(),
                        child: child.level()
                    }
                );
            }
            task.mark_fully_decomposed();
            // Reversed so the first child is expanded (and placed) first.
            stack.extend(children.into_iter().rev());
        }

        let len = run.len();
        for task in run.into_iter().rev() {
            self.queue_mut().push_front(task);
        }
        0..len
    }
}

/// Communication module that does nothing. Any unit must work unmodified
/// with this variant in the role.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyCommunication;

impl<C: Config> Communication<C> for EmptyCommunication {
    fn init(&mut self, _unit: &mut UnitState<C>) {}
    fn iter(&mut self, _unit: &mut UnitState<C>) {}
}

/// Executor module that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyExecutor;

impl<C: Config> Executor<C> for EmptyExecutor {
    fn init(&mut self, _unit: &mut UnitState<C>, _tasks: &mut TaskQueue) {}
    fn iter(&mut self, _unit: &mut UnitState<C>, _tasks: &mut TaskQueue) {}
}

/// Task manager with an empty rule: only tasks already fully decomposed may
/// be queued, since its rule never produces subtasks.
#[derive(Debug, Default)]
pub struct EmptyTaskManager {
    queue: TaskQueue,
}

impl<C: Config> TaskManager<C> for EmptyTaskManager {
    fn init(&mut self, _unit: &mut UnitState<C>) {}

    fn iter(&mut self, _unit: &mut UnitState<C>) {}

    fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    fn queue_mut(&mut self) -> &mut TaskQueue {
        &mut self.queue
    }

    fn decompose(&mut self, _unit: &mut UnitState<C>, _task: &TaskHandle) -> Vec<TaskHandle> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::EmptyConfig, task::Task};
    use rand::SeedableRng;
    use serde_json::json;

    fn state() -> UnitState<EmptyConfig> {
        UnitState::new(
            UnitId::new(0),
            Arc::new(SwarmShared::new(EmptyConfig)),
            SmallRng::seed_from_u64(7),
        )
    }

    /// Splits a level `L` task into two level `L - 1` halves.
    #[derive(Default)]
    struct SplittingManager {
        queue: TaskQueue,
    }

    impl TaskManager<EmptyConfig> for SplittingManager {
        fn init(&mut self, _unit: &mut UnitState<EmptyConfig>) {}
        fn iter(&mut self, _unit: &mut UnitState<EmptyConfig>) {}

        fn queue(&self) -> &TaskQueue {
            &self.queue
        }

        fn queue_mut(&mut self) -> &mut TaskQueue {
            &mut self.queue
        }

        fn decompose(
            &mut self,
            _unit: &mut UnitState<EmptyConfig>,
            task: &TaskHandle,
        ) -> Vec<TaskHandle> {
            let level = task.level() - 1;
            ["lo", "hi"]
                .into_iter()
                .map(|half| Task::new(level, task.owner(), json!(half)).into_handle())
                .collect()
        }
    }

    #[test]
    fn decompose_front_on_empty_queue_is_a_noop() {
        let mut manager = SplittingManager::default();
        let mut unit = state();
        let span = manager.decompose_front(&mut unit);
        assert!(span.is_empty());
        assert!(TaskManager::<EmptyConfig>::queue(&manager).is_empty());
    }

    #[test]
    fn decompose_front_on_terminal_front_is_a_noop() {
        let mut manager = SplittingManager::default();
        let mut unit = state();
        manager.add_task_back(Task::terminal(unit.id, json!(null)).into_handle());
        let span = manager.decompose_front(&mut unit);
        assert!(span.is_empty());
        assert_eq!(TaskManager::<EmptyConfig>::queue(&manager).len(), 1);
    }

    #[test]
    fn front_run_is_terminal_descendants_then_prior_entries() {
        let mut manager = SplittingManager::default();
        let mut unit = state();
        let behind = Task::terminal(unit.id, json!("behind")).into_handle();
        manager.add_task_back(Task::new(2, unit.id, json!("root")).into_handle());
        manager.add_task_back(std::sync::Arc::clone(&behind));

        let span = manager.decompose_front(&mut unit);
        // Level 2 splits into two level 1 halves, each splitting again.
        assert_eq!(span, 0..4);
        let queue = TaskManager::<EmptyConfig>::queue(&manager);
        assert_eq!(queue.len(), 5);
        for index in span {
            let task = queue.get(index).unwrap();
            assert_eq!(task.level(), 0);
            assert!(task.is_fully_decomposed());
        }
        assert!(std::sync::Arc::ptr_eq(queue.get(4).unwrap(), &behind));
    }

    #[test]
    fn pre_marked_subtask_stops_expansion_of_its_branch() {
        struct MarkingManager {
            queue: TaskQueue,
        }

        impl TaskManager<EmptyConfig> for MarkingManager {
            fn init(&mut self, _unit: &mut UnitState<EmptyConfig>) {}
            fn iter(&mut self, _unit: &mut UnitState<EmptyConfig>) {}

            fn queue(&self) -> &TaskQueue {
                &self.queue
            }

            fn queue_mut(&mut self) -> &mut TaskQueue {
                &mut self.queue
            }

            fn decompose(
                &mut self,
                _unit: &mut UnitState<EmptyConfig>,
                task: &TaskHandle,
            ) -> Vec<TaskHandle> {
                let child = Task::new(task.level() - 1, task.owner(), json!(null));
                child.mark_fully_decomposed();
                vec![child.into_handle()]
            }
        }

        let mut manager = MarkingManager {
            queue: TaskQueue::new(),
        };
        let mut unit = state();
        manager.add_task_back(Task::new(5, unit.id, json!(null)).into_handle());
        let span = manager.decompose_front(&mut unit);
        assert_eq!(span, 0..1);
        let front = TaskManager::<EmptyConfig>::queue(&manager).front().unwrap();
        assert_eq!(front.level(), 4);
    }

    #[test]
    #[should_panic(expected = "produced no subtasks")]
    fn empty_rule_on_pending_task_fails_fast() {
        let mut manager = EmptyTaskManager::default();
        let mut unit = state();
        TaskManager::<EmptyConfig>::add_task_back(
            &mut manager,
            Task::new(3, unit.id, json!(null)).into_handle(),
        );
        let _ = manager.decompose_front(&mut unit);
    }

    #[test]
    #[should_panic(expected = "strictly decrease")]
    fn non_decreasing_level_fails_fast() {
        struct EchoManager {
            queue: TaskQueue,
        }

        impl TaskManager<EmptyConfig> for EchoManager {
            fn init(&mut self, _unit: &mut UnitState<EmptyConfig>) {}
            fn iter(&mut self, _unit: &mut UnitState<EmptyConfig>) {}

            fn queue(&self) -> &TaskQueue {
                &self.queue
            }

            fn queue_mut(&mut self) -> &mut TaskQueue {
                &mut self.queue
            }

            fn decompose(
                &mut self,
                _unit: &mut UnitState<EmptyConfig>,
                task: &TaskHandle,
            ) -> Vec<TaskHandle> {
                vec![Task::new(task.level(), task.owner(), json!(null)).into_handle()]
            }
        }

        let mut manager = EchoManager {
            queue: TaskQueue::new(),
        };
        let mut unit = state();
        manager.add_task_back(Task::new(1, unit.id, json!(null)).into_handle());
        let _ = manager.decompose_front(&mut unit);
    }
}
