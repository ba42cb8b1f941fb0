//! Notification message composition.
//!
//! One template per change kind, operating purely on resolved display
//! names; the dispatcher handles lookup and placeholder substitution
//! before composing. Status values go through a total label table so a
//! message never leaks an unmapped raw enum value.

use std::collections::HashMap;

use crate::config::NotifyConfig;
use crate::task::TaskStatus;

/// Built-in status labels; any status missing from the config override
/// map falls back here, and anything else falls back to the raw value.
const STATUS_LABELS: &[(TaskStatus, &str)] = &[
    (TaskStatus::Todo, "not started"),
    (TaskStatus::InProgress, "in progress"),
    (TaskStatus::Done, "done"),
];

/// Total status-to-label mapping with per-deployment overrides.
#[derive(Debug, Clone, Default)]
pub struct StatusLabels {
    overrides: HashMap<String, String>,
}

impl StatusLabels {
    pub fn from_config(config: &NotifyConfig) -> Self {
        Self {
            overrides: config.labels.clone(),
        }
    }

    /// Label for a status: override, then built-in, then the raw value.
    pub fn label(&self, status: TaskStatus) -> String {
        if let Some(label) = self.overrides.get(status.as_str()) {
            return label.clone();
        }
        STATUS_LABELS
            .iter()
            .find(|(candidate, _)| *candidate == status)
            .map(|(_, label)| (*label).to_string())
            .unwrap_or_else(|| status.as_str().to_string())
    }
}

/// Which Created recipient the message addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatedAudience {
    /// The user the task was assigned to.
    Assignee,
    /// The creator, told their delegation succeeded.
    Creator,
}

/// Display-name context shared by every template.
#[derive(Debug, Clone)]
pub struct TaskContext<'a> {
    pub actor: &'a str,
    pub title: &'a str,
    pub customer: &'a str,
    pub deal: &'a str,
}

/// A change with every name and label already resolved.
#[derive(Debug, Clone)]
pub enum MessageBody<'a> {
    Created {
        audience: CreatedAudience,
        assignee: &'a str,
        self_assigned: bool,
    },
    StatusChanged {
        from_label: &'a str,
        to_label: &'a str,
    },
    Reassigned {
        from_name: &'a str,
        to_name: &'a str,
    },
    GenericUpdate,
    Deleted,
}

/// Compose the notification sentence for one recipient.
pub fn compose(ctx: &TaskContext<'_>, body: &MessageBody<'_>) -> String {
    let scope = format!(
        "task '{}' (customer '{}', deal '{}')",
        ctx.title, ctx.customer, ctx.deal
    );

    match body {
        MessageBody::Created {
            audience: CreatedAudience::Assignee,
            self_assigned: true,
            ..
        } => {
            format!("{} assigned a new {} to themselves.", ctx.actor, scope)
        }
        MessageBody::Created {
            audience: CreatedAudience::Assignee,
            assignee,
            ..
        } => {
            format!("{} assigned a new {} to {}.", ctx.actor, scope, assignee)
        }
        MessageBody::Created {
            audience: CreatedAudience::Creator,
            assignee,
            ..
        } => {
            format!("Your new {} was assigned to {}.", scope, assignee)
        }
        MessageBody::StatusChanged {
            from_label,
            to_label,
        } => {
            format!(
                "{} changed the status of {} from '{}' to '{}'.",
                ctx.actor, scope, from_label, to_label
            )
        }
        MessageBody::Reassigned { from_name, to_name } => {
            format!(
                "{} reassigned {} from '{}' to '{}'.",
                ctx.actor, scope, from_name, to_name
            )
        }
        MessageBody::GenericUpdate => {
            format!("{} updated {}.", ctx.actor, scope)
        }
        MessageBody::Deleted => {
            format!("{} deleted {}.", ctx.actor, scope)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>() -> TaskContext<'a> {
        TaskContext {
            actor: "Alice",
            title: "Contract Draft",
            customer: "Acme",
            deal: "Q3 Deal",
        }
    }

    #[test]
    fn created_templates_per_audience() {
        let assignee = compose(
            &ctx(),
            &MessageBody::Created {
                audience: CreatedAudience::Assignee,
                assignee: "Bob",
                self_assigned: false,
            },
        );
        assert_eq!(
            assignee,
            "Alice assigned a new task 'Contract Draft' (customer 'Acme', deal 'Q3 Deal') to Bob."
        );

        let creator = compose(
            &ctx(),
            &MessageBody::Created {
                audience: CreatedAudience::Creator,
                assignee: "Bob",
                self_assigned: false,
            },
        );
        assert_eq!(
            creator,
            "Your new task 'Contract Draft' (customer 'Acme', deal 'Q3 Deal') was assigned to Bob."
        );
        assert_ne!(assignee, creator);
    }

    #[test]
    fn self_assignment_variant() {
        let message = compose(
            &ctx(),
            &MessageBody::Created {
                audience: CreatedAudience::Assignee,
                assignee: "Alice",
                self_assigned: true,
            },
        );
        assert!(message.contains("to themselves"));
    }

    #[test]
    fn status_changed_embeds_both_labels() {
        let message = compose(
            &ctx(),
            &MessageBody::StatusChanged {
                from_label: "not started",
                to_label: "done",
            },
        );
        assert_eq!(
            message,
            "Alice changed the status of task 'Contract Draft' (customer 'Acme', deal 'Q3 Deal') from 'not started' to 'done'."
        );
    }

    #[test]
    fn remaining_templates() {
        let reassigned = compose(
            &ctx(),
            &MessageBody::Reassigned {
                from_name: "Bob",
                to_name: "Cleo",
            },
        );
        assert!(reassigned.contains("reassigned"));
        assert!(reassigned.contains("'Bob'"));
        assert!(reassigned.contains("'Cleo'"));

        assert_eq!(
            compose(&ctx(), &MessageBody::GenericUpdate),
            "Alice updated task 'Contract Draft' (customer 'Acme', deal 'Q3 Deal')."
        );
        assert_eq!(
            compose(&ctx(), &MessageBody::Deleted),
            "Alice deleted task 'Contract Draft' (customer 'Acme', deal 'Q3 Deal')."
        );
    }

    #[test]
    fn labels_are_total_with_overrides_and_fallback() {
        let labels = StatusLabels::default();
        assert_eq!(labels.label(TaskStatus::Todo), "not started");
        assert_eq!(labels.label(TaskStatus::InProgress), "in progress");
        assert_eq!(labels.label(TaskStatus::Done), "done");

        let mut config = NotifyConfig::default();
        config
            .labels
            .insert("todo".to_string(), "backlog".to_string());
        let labels = StatusLabels::from_config(&config);
        assert_eq!(labels.label(TaskStatus::Todo), "backlog");
        assert_eq!(labels.label(TaskStatus::Done), "done");
    }
}
