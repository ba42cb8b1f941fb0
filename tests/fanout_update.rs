mod support;

use herald::task::{TaskPatch, TaskStatus};
use support::TestCrm;

#[test]
fn status_change_notifies_current_assignee_with_labels() {
    let crm = TestCrm::with_team();
    let task = crm
        .tasks
        .create(crm.new_task("Contract Draft", "u2"), "u1")
        .expect("create");

    let patch = TaskPatch {
        status: Some(TaskStatus::Done),
        ..TaskPatch::default()
    };
    let (previous, next) = crm.tasks.update(&task.id, patch).expect("update");
    let report = crm.dispatcher().on_task_updated(&previous, &next, "u1");

    assert_eq!(report.created, 1);
    let records = crm
        .notifications
        .list_for_recipient("u2", false)
        .expect("list");
    assert_eq!(records.len(), 1);
    assert!(records[0]
        .message
        .contains("from 'not started' to 'done'"));

    // Nobody else was addressed.
    assert!(crm
        .notifications
        .list_for_recipient("u1", false)
        .expect("list")
        .is_empty());
}

#[test]
fn reassignment_notifies_old_and_new_assignee() {
    let crm = TestCrm::with_team();
    let task = crm
        .tasks
        .create(crm.new_task("Contract Draft", "u2"), "u1")
        .expect("create");

    let patch = TaskPatch {
        assigned_to: Some("u3".to_string()),
        ..TaskPatch::default()
    };
    let (previous, next) = crm.tasks.update(&task.id, patch).expect("update");
    let report = crm.dispatcher().on_task_updated(&previous, &next, "u1");

    assert_eq!(report.created, 2);
    for uid in ["u2", "u3"] {
        let records = crm
            .notifications
            .list_for_recipient(uid, false)
            .expect("list");
        assert_eq!(records.len(), 1, "recipient {uid}");
        assert!(records[0].message.contains("reassigned"));
        assert!(records[0].message.contains("from 'Bob' to 'Cleo'"));
    }
}

#[test]
fn combined_status_and_reassignment_still_reaches_previous_assignee() {
    let crm = TestCrm::with_team();
    let task = crm
        .tasks
        .create(crm.new_task("Contract Draft", "u2"), "u1")
        .expect("create");

    let patch = TaskPatch {
        status: Some(TaskStatus::InProgress),
        assigned_to: Some("u3".to_string()),
        ..TaskPatch::default()
    };
    let (previous, next) = crm.tasks.update(&task.id, patch).expect("update");
    let report = crm.dispatcher().on_task_updated(&previous, &next, "u1");

    assert_eq!(report.created, 2);
    for uid in ["u2", "u3"] {
        let records = crm
            .notifications
            .list_for_recipient(uid, false)
            .expect("list");
        assert_eq!(records.len(), 1, "recipient {uid}");
        // Status change wins the wording even for the previous assignee.
        assert!(records[0].message.contains("changed the status"));
        assert!(!records[0].message.contains("reassigned"));
    }
}

#[test]
fn generic_update_notifies_assignee_without_field_detail() {
    let crm = TestCrm::with_team();
    let task = crm
        .tasks
        .create(crm.new_task("Contract Draft", "u2"), "u1")
        .expect("create");

    let patch = TaskPatch {
        title: Some("Contract Draft v2".to_string()),
        description: Some("second pass".to_string()),
        ..TaskPatch::default()
    };
    let (previous, next) = crm.tasks.update(&task.id, patch).expect("update");
    let report = crm.dispatcher().on_task_updated(&previous, &next, "u1");

    assert_eq!(report.created, 1);
    let records = crm
        .notifications
        .list_for_recipient("u2", false)
        .expect("list");
    assert_eq!(
        records[0].message,
        "Alice updated task 'Contract Draft v2' (customer 'unknown', deal 'unknown')."
    );
}

#[test]
fn repeated_updates_are_not_deduplicated() {
    let crm = TestCrm::with_team();
    let task = crm
        .tasks
        .create(crm.new_task("Contract Draft", "u2"), "u1")
        .expect("create");

    for status in [TaskStatus::InProgress, TaskStatus::Todo, TaskStatus::InProgress] {
        let patch = TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        };
        let (previous, next) = crm.tasks.update(&task.id, patch).expect("update");
        crm.dispatcher().on_task_updated(&previous, &next, "u1");
    }

    // Third update repeats the first message text but still inserts.
    let records = crm
        .notifications
        .list_for_recipient("u2", false)
        .expect("list");
    assert_eq!(records.len(), 3);
}
