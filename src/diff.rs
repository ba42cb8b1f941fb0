//! Change classification for task mutations.
//!
//! An update is classified by an explicit, priority-ordered rule table:
//! the first matching rule wins and exactly one [`ChangeKind`] is
//! produced per mutation, even when several fields changed together.
//! The table order is the precedence (status > reassignment > generic)
//! and is asserted by tests rather than implied by code layout.

use crate::task::{Task, TaskStatus};

/// A task lifecycle event with the state the classifier needs.
#[derive(Debug, Clone, Copy)]
pub enum TaskEvent<'a> {
    Created(&'a Task),
    Updated { previous: &'a Task, next: &'a Task },
    Deleted(&'a Task),
}

/// What changed, as far as notifications care.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    Created,
    StatusChanged { from: TaskStatus, to: TaskStatus },
    Reassigned { from: String, to: String },
    GenericUpdate,
    Deleted,
}

/// One entry in the update classification table.
pub struct UpdateRule {
    pub name: &'static str,
    pub matches: fn(&Task, &Task) -> Option<ChangeKind>,
}

/// Priority-ordered update rules. Order is the precedence.
pub const UPDATE_RULES: &[UpdateRule] = &[
    UpdateRule {
        name: "status_changed",
        matches: |previous, next| {
            if previous.status != next.status {
                Some(ChangeKind::StatusChanged {
                    from: previous.status,
                    to: next.status,
                })
            } else {
                None
            }
        },
    },
    UpdateRule {
        name: "reassigned",
        matches: |previous, next| {
            if previous.assigned_to != next.assigned_to {
                Some(ChangeKind::Reassigned {
                    from: previous.assigned_to.clone(),
                    to: next.assigned_to.clone(),
                })
            } else {
                None
            }
        },
    },
    // Catch-all: title/description/customer/deal/due-date edits share one
    // undifferentiated message.
    UpdateRule {
        name: "generic_update",
        matches: |_, _| Some(ChangeKind::GenericUpdate),
    },
];

/// Classify a lifecycle event into exactly one [`ChangeKind`].
pub fn classify(event: TaskEvent<'_>) -> ChangeKind {
    match event {
        TaskEvent::Created(_) => ChangeKind::Created,
        TaskEvent::Deleted(_) => ChangeKind::Deleted,
        TaskEvent::Updated { previous, next } => classify_update(previous, next),
    }
}

/// Run the update rule table; the trailing catch-all guarantees a match.
pub fn classify_update(previous: &Task, next: &Task) -> ChangeKind {
    UPDATE_RULES
        .iter()
        .find_map(|rule| (rule.matches)(previous, next))
        .unwrap_or(ChangeKind::GenericUpdate)
}

/// Whether the assignee changed, independently of which rule won.
///
/// When a status change outranks a simultaneous reassignment the
/// dispatcher still owes the previous assignee a notification; this
/// helper keeps that check out of the rule table.
pub fn reassignment_occurred(previous: &Task, next: &Task) -> bool {
    previous.assigned_to != next.assigned_to
}
