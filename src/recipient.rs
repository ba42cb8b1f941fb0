//! Recipient resolution: which users must be told about an event.
//!
//! Set semantics throughout: a uid appears at most once per event, even
//! when eligible under several rules. The actor is never filtered out;
//! every addressed party gets a record, including whoever performed the
//! mutation.

use crate::diff::ChangeKind;
use crate::message::CreatedAudience;
use crate::task::Task;

/// Recipients for a Create event, role-tagged.
///
/// The assignee and the creator receive differently worded messages, so
/// Create resolves to (uid, audience) pairs rather than a flat set.
pub fn resolve_created(task: &Task) -> Vec<(String, CreatedAudience)> {
    let mut recipients = vec![(task.assigned_to.clone(), CreatedAudience::Assignee)];
    if task.created_by != task.assigned_to {
        recipients.push((task.created_by.clone(), CreatedAudience::Creator));
    }
    recipients
}

/// Recipients for an Update event, per the classified change.
pub fn resolve_updated(previous: &Task, next: &Task, change: &ChangeKind) -> Vec<String> {
    match change {
        ChangeKind::Reassigned { .. } => dedup(vec![
            previous.assigned_to.clone(),
            next.assigned_to.clone(),
        ]),
        // StatusChanged and GenericUpdate address the current assignee.
        _ => vec![next.assigned_to.clone()],
    }
}

/// Recipients for a Delete event: creator and last assignee, collapsed.
pub fn resolve_deleted(task: &Task) -> Vec<String> {
    dedup(vec![task.created_by.clone(), task.assigned_to.clone()])
}

fn dedup(uids: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(uids.len());
    for uid in uids {
        if !seen.contains(&uid) {
            seen.push(uid);
        }
    }
    seen
}
