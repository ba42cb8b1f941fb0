//! herald notify command implementations.
//!
//! The polling surface over the notification store: list, mark-read,
//! unread count. Recipient defaults to the acting user.

use serde::Serialize;

use crate::cli::{load_context, CommonOptions, NotifyCommands};
use crate::error::Result;
use crate::notification::{Notification, NotificationStore};
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct NotifyListOutput {
    recipient: String,
    total: usize,
    notifications: Vec<Notification>,
}

#[derive(Serialize)]
struct NotifyCountOutput {
    recipient: String,
    unread: usize,
}

pub fn run(common: &CommonOptions, command: NotifyCommands) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let store = NotificationStore::new(ctx.storage.clone());

    match command {
        NotifyCommands::List { recipient, unread } => {
            let recipient = recipient.unwrap_or_else(|| ctx.actor.clone());
            let notifications = store.list_for_recipient(&recipient, unread)?;

            let output = NotifyListOutput {
                recipient: recipient.clone(),
                total: notifications.len(),
                notifications,
            };

            let mut human = HumanOutput::new("Notifications");
            human.push_summary("Recipient", recipient);
            human.push_summary("Total", output.total.to_string());
            for record in &output.notifications {
                let marker = if record.read { " " } else { "*" };
                human.push_detail(format!("{marker} {} {}", record.id, record.message));
            }

            emit_success(common.output(), "notify list", &output, Some(&human))
        }
        NotifyCommands::Read { id } => {
            let updated = store.mark_read(&id)?;

            let mut human = HumanOutput::new("Notification marked read");
            human.push_summary("ID", updated.id.clone());
            human.push_summary("Message", updated.message.clone());

            emit_success(common.output(), "notify read", &updated, Some(&human))
        }
        NotifyCommands::Count { recipient } => {
            let recipient = recipient.unwrap_or_else(|| ctx.actor.clone());
            let unread = store.unread_count(&recipient)?;

            let output = NotifyCountOutput {
                recipient: recipient.clone(),
                unread,
            };

            let mut human = HumanOutput::new("Unread notifications");
            human.push_summary("Recipient", recipient);
            human.push_summary("Unread", unread.to_string());

            emit_success(common.output(), "notify count", &output, Some(&human))
        }
    }
}
