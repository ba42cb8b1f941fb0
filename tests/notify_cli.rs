mod support;

use serde_json::Value;
use support::{herald_cmd, TestCrm};

fn json_stdout(output: &[u8]) -> Value {
    serde_json::from_slice(output).expect("json envelope")
}

fn setup() -> TestCrm {
    let crm = TestCrm::with_team();
    herald_cmd(crm.path()).arg("init").assert().success();
    crm
}

fn create_task(crm: &TestCrm, title: &str, assignee: &str, actor: &str) -> String {
    let stdout = herald_cmd(crm.path())
        .args([
            "--actor", actor, "task", "new", title, "--assign", assignee, "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["schema_version"], "herald.v1");
    assert_eq!(envelope["status"], "success");
    envelope["data"]["task"]["id"]
        .as_str()
        .expect("task id")
        .to_string()
}

#[test]
fn create_fans_out_and_notify_list_polls() {
    let crm = setup();
    let task_id = create_task(&crm, "Contract Draft", "u2", "u1");

    let stdout = herald_cmd(crm.path())
        .args(["notify", "list", "--recipient", "u2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["total"], 1);
    let record = &envelope["data"]["notifications"][0];
    assert_eq!(record["related_task_id"], task_id.as_str());
    assert_eq!(record["read"], false);
    assert!(record["message"]
        .as_str()
        .expect("message")
        .contains("assigned a new task 'Contract Draft'"));

    // Creator got the delegation wording.
    let stdout = herald_cmd(crm.path())
        .args(["notify", "list", "--recipient", "u1", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["total"], 1);
    assert!(envelope["data"]["notifications"][0]["message"]
        .as_str()
        .expect("message")
        .contains("was assigned to"));
}

#[test]
fn mark_read_and_count() {
    let crm = setup();
    create_task(&crm, "Contract Draft", "u2", "u1");

    let stdout = herald_cmd(crm.path())
        .args(["notify", "list", "--recipient", "u2", "--unread", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    let notification_id = envelope["data"]["notifications"][0]["id"]
        .as_str()
        .expect("notification id")
        .to_string();

    herald_cmd(crm.path())
        .args(["notify", "read", &notification_id])
        .assert()
        .success();

    let stdout = herald_cmd(crm.path())
        .args(["notify", "count", "--recipient", "u2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["unread"], 0);
}

#[test]
fn status_shorthand_dispatches_status_fanout() {
    let crm = setup();
    let task_id = create_task(&crm, "Contract Draft", "u2", "u1");

    let stdout = herald_cmd(crm.path())
        .args(["--actor", "u1", "task", "status", &task_id, "done", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["task"]["status"], "done");
    assert_eq!(envelope["data"]["fanout"]["created"], 1);

    let stdout = herald_cmd(crm.path())
        .args(["notify", "list", "--recipient", "u2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["total"], 2);
    let messages: Vec<String> = envelope["data"]["notifications"]
        .as_array()
        .expect("array")
        .iter()
        .map(|n| n["message"].as_str().expect("message").to_string())
        .collect();
    assert!(messages
        .iter()
        .any(|m| m.contains("from 'not started' to 'done'")));
}

#[test]
fn delete_notifies_and_missing_task_is_user_error() {
    let crm = setup();
    let task_id = create_task(&crm, "Contract Draft", "u2", "u1");

    herald_cmd(crm.path())
        .args(["--actor", "u1", "task", "delete", &task_id])
        .assert()
        .success();

    // Deleting again: the task is gone, exit code 2, no fanout.
    herald_cmd(crm.path())
        .args(["--actor", "u1", "task", "delete", &task_id, "--json"])
        .assert()
        .failure()
        .code(2);

    // Notifications from the first delete survive the task.
    let stdout = herald_cmd(crm.path())
        .args(["notify", "count", "--recipient", "u2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["unread"], 2);
}

#[test]
fn events_flag_writes_jsonl_feed() {
    let crm = setup();
    let events_path = crm.path().join("feed.jsonl");
    let events_arg = events_path.to_string_lossy().to_string();

    let task_id = create_task(&crm, "Contract Draft", "u2", "u1");
    herald_cmd(crm.path())
        .args([
            "--actor", "u1", "--events", &events_arg, "task", "status", &task_id, "in_progress",
        ])
        .assert()
        .success();

    let raw = std::fs::read_to_string(&events_path).expect("feed");
    let lines: Vec<&str> = raw.lines().filter(|line| !line.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1);
    let event: Value = serde_json::from_str(lines[0]).expect("event json");
    assert_eq!(event["schema_version"], "herald.event.v1");
    assert_eq!(event["event"], "task_status_changed");
    assert_eq!(event["actor"], "u1");
    assert_eq!(event["data"]["task_id"], task_id.as_str());
    assert_eq!(event["data"]["from"], "todo");
    assert_eq!(event["data"]["to"], "in_progress");
}

#[test]
fn actor_defaults_flow_into_fanout_attribution() {
    let crm = setup();
    herald_cmd(crm.path())
        .args(["actor", "set", "u1"])
        .assert()
        .success();

    let stdout = herald_cmd(crm.path())
        .args(["task", "new", "Persisted actor task", "--assign", "u2", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let envelope = json_stdout(&stdout);
    assert_eq!(envelope["data"]["task"]["created_by"], "u1");
}
