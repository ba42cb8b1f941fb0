//! Fanout dispatcher: one mutation in, zero or more notifications out.
//!
//! Each entry point is a straight-line pipeline over an already-applied
//! mutation: resolve display names, classify the change, resolve
//! recipients, compose per recipient, write to the notification store.
//! The dispatcher holds no state between invocations and no locks; the
//! caller owns the stores and lookups it is handed.
//!
//! Failure semantics: a notification write failure is logged, counted
//! in the report, and isolated to its recipient. The task mutation is
//! never rolled back and the caller never sees a fanout error.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::NotifyConfig;
use crate::diff::{classify_update, reassignment_occurred, ChangeKind};
use crate::directory::DisplayNames;
use crate::message::{compose, CreatedAudience, MessageBody, StatusLabels, TaskContext};
use crate::notification::{Notification, NotificationSink};
use crate::recipient;
use crate::task::Task;

/// Outcome of one fanout invocation.
///
/// `notifications` holds every record the recipients ended up with,
/// whether freshly inserted or reused by the Create dedup check.
#[derive(Debug, Clone, Serialize, Default)]
pub struct FanoutReport {
    pub notifications: Vec<Notification>,
    pub created: usize,
    pub reused: usize,
    pub failed: usize,
}

pub struct FanoutDispatcher<'a> {
    notifications: &'a dyn NotificationSink,
    users: &'a dyn DisplayNames,
    customers: &'a dyn DisplayNames,
    deals: &'a dyn DisplayNames,
    config: &'a NotifyConfig,
    labels: StatusLabels,
}

impl<'a> FanoutDispatcher<'a> {
    pub fn new(
        notifications: &'a dyn NotificationSink,
        users: &'a dyn DisplayNames,
        customers: &'a dyn DisplayNames,
        deals: &'a dyn DisplayNames,
        config: &'a NotifyConfig,
    ) -> Self {
        Self {
            notifications,
            users,
            customers,
            deals,
            config,
            labels: StatusLabels::from_config(config),
        }
    }

    /// Fanout for a created task. Applies the dedup policy: an existing
    /// record with the same (task id, message) is returned instead of a
    /// duplicate insert.
    pub fn on_task_created(&self, task: &Task, actor_uid: &str) -> FanoutReport {
        let mut report = FanoutReport::default();
        let actor = self.user_name(actor_uid);
        let customer = self.entity_name(self.customers, task.customer.as_deref());
        let deal = self.entity_name(self.deals, task.sales.as_deref());
        let assignee = self.user_name(&task.assigned_to);
        let self_assigned = actor_uid == task.assigned_to;

        let ctx = TaskContext {
            actor: &actor,
            title: &task.title,
            customer: &customer,
            deal: &deal,
        };

        for (uid, audience) in recipient::resolve_created(task) {
            let message = compose(
                &ctx,
                &MessageBody::Created {
                    audience,
                    assignee: &assignee,
                    self_assigned,
                },
            );
            self.deliver(&mut report, &uid, message, &task.id, true);
        }

        debug!(
            task = %task.id,
            created = report.created,
            reused = report.reused,
            failed = report.failed,
            "create fanout dispatched"
        );
        report
    }

    /// Fanout for an updated task.
    pub fn on_task_updated(&self, previous: &Task, next: &Task, actor_uid: &str) -> FanoutReport {
        let mut report = FanoutReport::default();
        let change = classify_update(previous, next);
        let actor = self.user_name(actor_uid);
        let customer = self.entity_name(self.customers, next.customer.as_deref());
        let deal = self.entity_name(self.deals, next.sales.as_deref());

        let ctx = TaskContext {
            actor: &actor,
            title: &next.title,
            customer: &customer,
            deal: &deal,
        };

        let mut recipients = recipient::resolve_updated(previous, next, &change);
        // Status change outranks a simultaneous reassignment for the
        // message text, but the previous assignee is still owed a
        // notification (worded as the status change).
        if matches!(change, ChangeKind::StatusChanged { .. })
            && reassignment_occurred(previous, next)
            && !recipients.contains(&previous.assigned_to)
        {
            recipients.push(previous.assigned_to.clone());
        }

        let body = match &change {
            ChangeKind::StatusChanged { from, to } => {
                let from_label = self.labels.label(*from);
                let to_label = self.labels.label(*to);
                OwnedBody::StatusChanged {
                    from_label,
                    to_label,
                }
            }
            ChangeKind::Reassigned { from, to } => OwnedBody::Reassigned {
                from_name: self.user_name(from),
                to_name: self.user_name(to),
            },
            _ => OwnedBody::GenericUpdate,
        };

        for uid in recipients {
            let message = compose(&ctx, &body.as_message());
            self.deliver(&mut report, &uid, message, &next.id, false);
        }

        debug!(
            task = %next.id,
            change = ?change,
            created = report.created,
            failed = report.failed,
            "update fanout dispatched"
        );
        report
    }

    /// Fanout for a deleted task. Notifications reference the removed
    /// task id but outlive the record itself.
    pub fn on_task_deleted(&self, task: &Task, actor_uid: &str) -> FanoutReport {
        let mut report = FanoutReport::default();
        let actor = self.user_name(actor_uid);
        let customer = self.entity_name(self.customers, task.customer.as_deref());
        let deal = self.entity_name(self.deals, task.sales.as_deref());

        let ctx = TaskContext {
            actor: &actor,
            title: &task.title,
            customer: &customer,
            deal: &deal,
        };

        for uid in recipient::resolve_deleted(task) {
            let message = compose(&ctx, &MessageBody::Deleted);
            self.deliver(&mut report, &uid, message, &task.id, false);
        }

        debug!(
            task = %task.id,
            created = report.created,
            failed = report.failed,
            "delete fanout dispatched"
        );
        report
    }

    /// Write one notification, honoring the Create-only dedup policy.
    /// A failed write is logged and counted; it never aborts the loop.
    fn deliver(
        &self,
        report: &mut FanoutReport,
        recipient_uid: &str,
        message: String,
        task_id: &str,
        dedup: bool,
    ) {
        if dedup {
            match self.notifications.find_by_task_and_message(task_id, &message) {
                Ok(Some(existing)) => {
                    report.reused += 1;
                    report.notifications.push(existing);
                    return;
                }
                Ok(None) => {}
                Err(err) => {
                    // Dedup is a defensive check; a failed lookup falls
                    // through to a normal insert.
                    warn!(task = %task_id, error = %err, "dedup lookup failed");
                }
            }
        }

        let notification =
            Notification::addressed_to(recipient_uid, message, Some(task_id.to_string()));
        match self.notifications.insert(notification) {
            Ok(stored) => {
                report.created += 1;
                report.notifications.push(stored);
            }
            Err(err) => {
                warn!(
                    recipient = %recipient_uid,
                    task = %task_id,
                    error = %err,
                    "notification write failed; recipient skipped"
                );
                report.failed += 1;
            }
        }
    }

    fn user_name(&self, uid: &str) -> String {
        self.users
            .display_name(uid)
            .unwrap_or_else(|| self.config.unknown_user.clone())
    }

    fn entity_name(&self, source: &dyn DisplayNames, id: Option<&str>) -> String {
        id.and_then(|id| source.display_name(id))
            .unwrap_or_else(|| self.config.unknown_entity.clone())
    }
}

/// Owned variant of [`MessageBody`] for the update path, where labels
/// and names are computed once and shared across recipients.
enum OwnedBody {
    StatusChanged {
        from_label: String,
        to_label: String,
    },
    Reassigned {
        from_name: String,
        to_name: String,
    },
    GenericUpdate,
}

impl OwnedBody {
    fn as_message(&self) -> MessageBody<'_> {
        match self {
            OwnedBody::StatusChanged {
                from_label,
                to_label,
            } => MessageBody::StatusChanged {
                from_label,
                to_label,
            },
            OwnedBody::Reassigned { from_name, to_name } => MessageBody::Reassigned {
                from_name,
                to_name,
            },
            OwnedBody::GenericUpdate => MessageBody::GenericUpdate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::task::TaskStatus;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct MemorySink {
        records: RefCell<Vec<Notification>>,
        fail_for: RefCell<Vec<String>>,
    }

    impl MemorySink {
        fn new() -> Self {
            Self {
                records: RefCell::new(Vec::new()),
                fail_for: RefCell::new(Vec::new()),
            }
        }

        fn fail_for(&self, uid: &str) {
            self.fail_for.borrow_mut().push(uid.to_string());
        }

        fn stored(&self) -> Vec<Notification> {
            self.records.borrow().clone()
        }
    }

    impl NotificationSink for MemorySink {
        fn find_by_task_and_message(
            &self,
            task_id: &str,
            message: &str,
        ) -> Result<Option<Notification>> {
            Ok(self.records.borrow().iter().cloned().find(|record| {
                record.related_task_id.as_deref() == Some(task_id) && record.message == message
            }))
        }

        fn insert(&self, notification: Notification) -> Result<Notification> {
            if self
                .fail_for
                .borrow()
                .contains(&notification.recipient_uid)
            {
                return Err(Error::NotificationWriteFailed("disk full".to_string()));
            }
            self.records.borrow_mut().push(notification.clone());
            Ok(notification)
        }
    }

    struct StaticNames(HashMap<String, String>);

    impl StaticNames {
        fn with(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(id, name)| (id.to_string(), name.to_string()))
                    .collect(),
            )
        }
    }

    impl DisplayNames for StaticNames {
        fn display_name(&self, id: &str) -> Option<String> {
            self.0.get(id).cloned()
        }
    }

    fn task(creator: &str, assignee: &str) -> Task {
        let now = Utc::now();
        Task {
            id: "t1".to_string(),
            title: "Contract Draft".to_string(),
            description: None,
            status: TaskStatus::Todo,
            assigned_to: assignee.to_string(),
            created_by: creator.to_string(),
            customer: Some("c1".to_string()),
            sales: Some("s1".to_string()),
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct Fixture {
        sink: MemorySink,
        users: StaticNames,
        customers: StaticNames,
        deals: StaticNames,
        config: NotifyConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                sink: MemorySink::new(),
                users: StaticNames::with(&[("u1", "Alice"), ("u2", "Bob"), ("u3", "Cleo")]),
                customers: StaticNames::with(&[("c1", "Acme")]),
                deals: StaticNames::with(&[("s1", "Q3 Deal")]),
                config: NotifyConfig::default(),
            }
        }

        fn dispatcher(&self) -> FanoutDispatcher<'_> {
            FanoutDispatcher::new(
                &self.sink,
                &self.users,
                &self.customers,
                &self.deals,
                &self.config,
            )
        }
    }

    #[test]
    fn create_notifies_assignee_and_creator_distinctly() {
        let fixture = Fixture::new();
        let report = fixture.dispatcher().on_task_created(&task("u1", "u2"), "u1");

        assert_eq!(report.created, 2);
        assert_eq!(report.failed, 0);
        let stored = fixture.sink.stored();
        assert_eq!(stored[0].recipient_uid, "u2");
        assert!(stored[0]
            .message
            .contains("Alice assigned a new task 'Contract Draft' (customer 'Acme', deal 'Q3 Deal') to Bob."));
        assert_eq!(stored[1].recipient_uid, "u1");
        assert_ne!(stored[0].message, stored[1].message);
    }

    #[test]
    fn create_twice_reuses_existing_records() {
        let fixture = Fixture::new();
        let t = task("u1", "u2");
        let first = fixture.dispatcher().on_task_created(&t, "u1");
        let second = fixture.dispatcher().on_task_created(&t, "u1");

        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(second.reused, 2);
        assert_eq!(fixture.sink.stored().len(), 2);
        assert_eq!(second.notifications[0].id, first.notifications[0].id);
    }

    #[test]
    fn update_dedup_is_not_applied() {
        let fixture = Fixture::new();
        let previous = task("u1", "u2");
        let mut next = previous.clone();
        next.status = TaskStatus::Done;

        fixture.dispatcher().on_task_updated(&previous, &next, "u1");
        fixture.dispatcher().on_task_updated(&previous, &next, "u1");

        // Repeated updates produce repeated, distinct-in-time records.
        assert_eq!(fixture.sink.stored().len(), 2);
    }

    #[test]
    fn status_change_message_carries_labels() {
        let fixture = Fixture::new();
        let previous = task("u1", "u2");
        let mut next = previous.clone();
        next.status = TaskStatus::Done;

        let report = fixture.dispatcher().on_task_updated(&previous, &next, "u1");
        assert_eq!(report.created, 1);
        let stored = fixture.sink.stored();
        assert_eq!(stored[0].recipient_uid, "u2");
        assert!(stored[0].message.contains("from 'not started' to 'done'"));
    }

    #[test]
    fn combined_status_and_reassignment_keeps_previous_assignee() {
        let fixture = Fixture::new();
        let previous = task("u1", "u2");
        let mut next = previous.clone();
        next.status = TaskStatus::InProgress;
        next.assigned_to = "u3".to_string();

        let report = fixture.dispatcher().on_task_updated(&previous, &next, "u1");
        assert_eq!(report.created, 2);

        let stored = fixture.sink.stored();
        let recipients: Vec<&str> = stored.iter().map(|n| n.recipient_uid.as_str()).collect();
        assert!(recipients.contains(&"u2"));
        assert!(recipients.contains(&"u3"));
        // Both messages use the status-changed wording.
        for record in &stored {
            assert!(record.message.contains("changed the status"));
        }
    }

    #[test]
    fn reassignment_names_old_and_new_assignee() {
        let fixture = Fixture::new();
        let previous = task("u1", "u2");
        let mut next = previous.clone();
        next.assigned_to = "u3".to_string();

        let report = fixture.dispatcher().on_task_updated(&previous, &next, "u1");
        assert_eq!(report.created, 2);
        for record in fixture.sink.stored() {
            assert!(record.message.contains("from 'Bob' to 'Cleo'"));
        }
    }

    #[test]
    fn delete_self_assigned_yields_single_record() {
        let fixture = Fixture::new();
        let report = fixture.dispatcher().on_task_deleted(&task("u1", "u1"), "u1");
        assert_eq!(report.created, 1);
        assert_eq!(fixture.sink.stored()[0].recipient_uid, "u1");
    }

    #[test]
    fn write_failure_is_isolated_per_recipient() {
        let fixture = Fixture::new();
        fixture.sink.fail_for("u2");

        let previous = task("u1", "u2");
        let mut next = previous.clone();
        next.assigned_to = "u3".to_string();

        let report = fixture.dispatcher().on_task_updated(&previous, &next, "u1");
        assert_eq!(report.failed, 1);
        assert_eq!(report.created, 1);
        assert_eq!(fixture.sink.stored()[0].recipient_uid, "u3");
    }

    #[test]
    fn unknown_ids_degrade_to_placeholders() {
        let fixture = Fixture::new();
        let mut t = task("ghost", "phantom");
        t.customer = None;
        t.sales = Some("missing-deal".to_string());

        let report = fixture.dispatcher().on_task_created(&t, "ghost");
        assert_eq!(report.failed, 0);
        let stored = fixture.sink.stored();
        assert!(stored[0].message.contains("an unknown user"));
        assert!(stored[0].message.contains("customer 'unknown'"));
        assert!(stored[0].message.contains("deal 'unknown'"));
    }
}
