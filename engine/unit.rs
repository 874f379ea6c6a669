use crate::{
    capability::{
        Communication, EmptyCommunication, EmptyExecutor, EmptyTaskManager, Executor, TaskManager,
        UnitState,
    },
    config::Config,
    task::UnitId,
};

/// Autonomous population member driven through synchronous rounds.
pub trait SwarmUnit: Send {
    /// One-time setup before the first round.
    fn init(&mut self);
    /// One discrete step.
    fn iter(&mut self);
}

/// Factory seam used by `Swarm::populate`: a concrete unit kind buildable
/// from the state the swarm hands out.
pub trait UnitKind<C: Config>: SwarmUnit + Sized + 'static {
    /// Builds one unit around the given state.
    fn build(state: UnitState<C>) -> Self;
}

/// Unit composed of exactly one module per capability role.
///
/// The three modules are constructed together, share the unit's lifetime,
/// and are owned by value; a role that is absent is unrepresentable. Both
/// lifecycle calls delegate in a fixed order — task manager, communication,
/// executor — so the queue exists and is set up before the executor looks
/// for work.
pub struct BasicUnit<C, Cm, Tm, Ex>
where
    C: Config,
    Cm: Communication<C>,
    Tm: TaskManager<C>,
    Ex: Executor<C>,
{
    state: UnitState<C>,
    communication: Cm,
    task_manager: Tm,
    executor: Ex,
}

impl<C, Cm, Tm, Ex> BasicUnit<C, Cm, Tm, Ex>
where
    C: Config,
    Cm: Communication<C>,
    Tm: TaskManager<C>,
    Ex: Executor<C>,
{
    /// Composes a unit from its three modules.
    #[must_use]
    pub const fn new(state: UnitState<C>, communication: Cm, task_manager: Tm, executor: Ex) -> Self {
        Self {
            state,
            communication,
            task_manager,
            executor,
        }
    }

    /// Stable id of this unit.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.state.id
    }

    /// Unit-visible state.
    #[must_use]
    pub const fn state(&self) -> &UnitState<C> {
        &self.state
    }

    /// The communication module.
    #[must_use]
    pub const fn communication(&self) -> &Cm {
        &self.communication
    }

    /// Mutable access to the communication module.
    pub fn communication_mut(&mut self) -> &mut Cm {
        &mut self.communication
    }

    /// The task manager module.
    #[must_use]
    pub const fn task_manager(&self) -> &Tm {
        &self.task_manager
    }

    /// Mutable access to the task manager module.
    pub fn task_manager_mut(&mut self) -> &mut Tm {
        &mut self.task_manager
    }

    /// The executor module.
    #[must_use]
    pub const fn executor(&self) -> &Ex {
        &self.executor
    }

    /// Mutable access to the executor module.
    pub fn executor_mut(&mut self) -> &mut Ex {
        &mut self.executor
    }
}

impl<C, Cm, Tm, Ex> SwarmUnit for BasicUnit<C, Cm, Tm, Ex>
where
    C: Config,
    Cm: Communication<C>,
    Tm: TaskManager<C>,
    Ex: Executor<C>,
{
    fn init(&mut self) {
        let Self {
            state,
            communication,
            task_manager,
            executor,
        } = self;
        task_manager.init(state);
        communication.init(state);
        executor.init(state, task_manager.queue_mut());
    }

    fn iter(&mut self) {
        let Self {
            state,
            communication,
            task_manager,
            executor,
        } = self;
        task_manager.iter(state);
        communication.iter(state);
        executor.iter(state, task_manager.queue_mut());
    }
}

/// Unit whose every role is filled by the empty module variant. Useful as a
/// population placeholder and as the substitutability baseline.
pub type EmptyUnit<C> = BasicUnit<C, EmptyCommunication, EmptyTaskManager, EmptyExecutor>;

impl<C: Config> UnitKind<C> for EmptyUnit<C> {
    fn build(state: UnitState<C>) -> Self {
        Self::new(
            state,
            EmptyCommunication,
            EmptyTaskManager::default(),
            EmptyExecutor,
        )
    }
}
