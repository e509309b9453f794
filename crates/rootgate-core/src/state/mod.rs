//! Task status state machine.
//!
//! Validates status transitions against the permission matrix for the two
//! recognised roles. The engine applies the transition; this module only
//! decides whether it is allowed.

use rootgate_store::{Address, TaskStatus};

use crate::error::EngineError;

/// A role a caller can hold with respect to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The controlling identity of the account.
    Owner,
    /// The task's registered executor.
    Executor,
}

/// The roles a particular caller holds for a particular task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Roles {
    pub owner: bool,
    pub executor: bool,
}

impl Roles {
    pub fn resolve(caller: Address, owner: Address, executor: Address) -> Self {
        Self {
            owner: caller == owner,
            executor: caller == executor,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.owner && !self.executor
    }

    pub fn actors(&self) -> impl Iterator<Item = Actor> {
        [
            self.owner.then_some(Actor::Owner),
            self.executor.then_some(Actor::Executor),
        ]
        .into_iter()
        .flatten()
    }
}

/// The task status state machine.
///
/// ```text
/// inactive  --register-------------> active
/// active    --executor: complete---> completed   (terminal)
/// active    --executor: cancel-----> cancelled   (terminal)
/// *         --owner: cancel--------> cancelled   (except from completed)
/// ```
pub struct TaskStateMachine;

impl TaskStateMachine {
    /// Check whether `actor` may move a task from `from` to `to`.
    pub fn is_valid_transition(actor: Actor, from: TaskStatus, to: TaskStatus) -> bool {
        match actor {
            Actor::Owner => to == TaskStatus::Cancelled && from != TaskStatus::Completed,
            Actor::Executor => matches!(
                (from, to),
                (TaskStatus::Active, TaskStatus::Completed)
                    | (TaskStatus::Active, TaskStatus::Cancelled)
            ),
        }
    }

    /// Authorize a transition for a caller holding `roles`.
    ///
    /// A caller holding both roles may use either. A caller holding neither
    /// is rejected as unauthorized before the transition is considered.
    pub fn authorize(
        caller: Address,
        roles: Roles,
        from: TaskStatus,
        to: TaskStatus,
    ) -> Result<(), EngineError> {
        if roles.is_empty() {
            return Err(EngineError::UnauthorizedExecutor(caller));
        }
        if roles
            .actors()
            .any(|actor| Self::is_valid_transition(actor, from, to))
        {
            Ok(())
        } else {
            Err(EngineError::InvalidTaskStatus { from, to })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [TaskStatus; 4] = [
        TaskStatus::Inactive,
        TaskStatus::Active,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    #[test]
    fn owner_may_only_cancel_non_completed() {
        for from in ALL {
            for to in ALL {
                let expected = to == TaskStatus::Cancelled && from != TaskStatus::Completed;
                assert_eq!(
                    TaskStateMachine::is_valid_transition(Actor::Owner, from, to),
                    expected,
                    "owner {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn executor_may_only_close_active() {
        for from in ALL {
            for to in ALL {
                let expected = from == TaskStatus::Active
                    && matches!(to, TaskStatus::Completed | TaskStatus::Cancelled);
                assert_eq!(
                    TaskStateMachine::is_valid_transition(Actor::Executor, from, to),
                    expected,
                    "executor {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn nobody_resurrects_a_task() {
        for actor in [Actor::Owner, Actor::Executor] {
            for from in [TaskStatus::Completed, TaskStatus::Cancelled] {
                assert!(!TaskStateMachine::is_valid_transition(
                    actor,
                    from,
                    TaskStatus::Active
                ));
            }
        }
    }

    #[test]
    fn third_party_is_unauthorized() {
        let caller = Address::from_low_u8(9);
        let roles = Roles::resolve(caller, Address::from_low_u8(1), Address::from_low_u8(2));
        assert_eq!(
            TaskStateMachine::authorize(caller, roles, TaskStatus::Active, TaskStatus::Cancelled),
            Err(EngineError::UnauthorizedExecutor(caller))
        );
    }

    #[test]
    fn dual_role_caller_gets_union() {
        let caller = Address::from_low_u8(1);
        let roles = Roles::resolve(caller, caller, caller);
        assert_eq!(roles.actors().count(), 2);
        // Executor role grants completion, which the owner role alone would not.
        assert!(
            TaskStateMachine::authorize(caller, roles, TaskStatus::Active, TaskStatus::Completed)
                .is_ok()
        );
        // Owner role grants cancelling an already-cancelled task.
        assert!(
            TaskStateMachine::authorize(
                caller,
                roles,
                TaskStatus::Cancelled,
                TaskStatus::Cancelled
            )
            .is_ok()
        );
    }

    #[test]
    fn disallowed_transition_reports_both_states() {
        let caller = Address::from_low_u8(2);
        let roles = Roles::resolve(caller, Address::from_low_u8(1), caller);
        assert_eq!(
            TaskStateMachine::authorize(caller, roles, TaskStatus::Completed, TaskStatus::Cancelled),
            Err(EngineError::InvalidTaskStatus {
                from: TaskStatus::Completed,
                to: TaskStatus::Cancelled
            })
        );
    }
}
