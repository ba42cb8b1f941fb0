//! herald task command implementations.
//!
//! Every mutation follows the same shape: apply the store write first,
//! then hand the observed (previous, next) pair to the fanout
//! dispatcher, then emit the optional integration event. Fanout
//! failures surface as warnings, never as command failures.

use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::{load_context, CommonOptions, Context, TaskCommands};
use crate::config::NotifyConfig;
use crate::customer::CustomerStore;
use crate::diff::{classify_update, ChangeKind};
use crate::directory::{CachedNames, UserDirectory};
use crate::error::{Error, Result};
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::fanout::{FanoutDispatcher, FanoutReport};
use crate::notification::NotificationStore;
use crate::output::{emit_success, HumanOutput};
use crate::sales::DealStore;
use crate::task::{NewTask, Task, TaskPatch, TaskStatus, TaskStore};

/// Store bundle behind the task commands; the dispatcher borrows from
/// it so lookups and sinks share one lifetime.
struct Engine {
    tasks: TaskStore,
    notifications: NotificationStore,
    users: CachedNames<UserDirectory>,
    customers: CustomerStore,
    deals: DealStore,
    notify: NotifyConfig,
}

impl Engine {
    fn new(ctx: &Context) -> Self {
        Self {
            tasks: TaskStore::new(ctx.storage.clone()),
            notifications: NotificationStore::new(ctx.storage.clone()),
            users: CachedNames::new(
                UserDirectory::new(ctx.storage.clone()),
                ctx.config.directory.cache_capacity,
            ),
            customers: CustomerStore::new(ctx.storage.clone()),
            deals: DealStore::new(ctx.storage.clone()),
            notify: ctx.config.notify.clone(),
        }
    }

    fn dispatcher(&self) -> FanoutDispatcher<'_> {
        FanoutDispatcher::new(
            &self.notifications,
            &self.users,
            &self.customers,
            &self.deals,
            &self.notify,
        )
    }
}

#[derive(Serialize)]
struct TaskMutationOutput {
    task: Task,
    fanout: FanoutReport,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<Task>,
}

pub fn run(common: &CommonOptions, command: TaskCommands) -> Result<()> {
    match command {
        TaskCommands::New {
            title,
            assign,
            description,
            customer,
            deal,
            due,
        } => run_new(common, title, assign, description, customer, deal, due),
        TaskCommands::Show { id } => run_show(common, &id),
        TaskCommands::List { status } => run_list(common, status.as_deref()),
        TaskCommands::Update {
            id,
            title,
            description,
            status,
            assign,
            customer,
            deal,
            due,
            clear_customer,
            clear_deal,
            clear_due,
        } => {
            let patch = TaskPatch {
                title,
                description,
                status: parse_status(status.as_deref())?,
                assigned_to: assign,
                customer,
                sales: deal,
                due_date: parse_due(due.as_deref())?,
                clear_customer,
                clear_sales: clear_deal,
                clear_due_date: clear_due,
            };
            run_update(common, &id, patch, "task update")
        }
        TaskCommands::Status { id, status } => {
            let patch = TaskPatch {
                status: Some(status.parse::<TaskStatus>()?),
                ..TaskPatch::default()
            };
            run_update(common, &id, patch, "task status")
        }
        TaskCommands::Assign { id, uid } => {
            let patch = TaskPatch {
                assigned_to: Some(uid),
                ..TaskPatch::default()
            };
            run_update(common, &id, patch, "task assign")
        }
        TaskCommands::Delete { id } => run_delete(common, &id),
    }
}

fn run_new(
    common: &CommonOptions,
    title: String,
    assign: String,
    description: Option<String>,
    customer: Option<String>,
    deal: Option<String>,
    due: Option<String>,
) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let engine = Engine::new(&ctx);
    let mut sink = open_event_sink(common.events.as_deref())?;

    let fields = NewTask {
        title,
        description,
        assigned_to: assign,
        customer,
        sales: deal,
        due_date: parse_due(due.as_deref())?,
    };

    // Store write first; fanout only on success.
    let task = engine.tasks.create(fields, &ctx.actor)?;
    let fanout = engine.dispatcher().on_task_created(&task, &ctx.actor);

    let event_warning = emit_event(
        &mut sink,
        EventKind::TaskCreated,
        &ctx.actor,
        serde_json::json!({
            "task_id": task.id,
            "title": task.title,
            "assigned_to": task.assigned_to,
            "notifications": fanout.created,
        }),
    );

    let mut human = HumanOutput::new("Task created");
    push_fanout_summary(&mut human, &task, &fanout, event_warning);

    let output = TaskMutationOutput { task, fanout };
    emit_success(common.output(), "task new", &output, Some(&human))
}

fn run_update(
    common: &CommonOptions,
    id: &str,
    patch: TaskPatch,
    command: &str,
) -> Result<()> {
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update; pass at least one field".to_string(),
        ));
    }

    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let engine = Engine::new(&ctx);
    let mut sink = open_event_sink(common.events.as_deref())?;

    let (previous, next) = engine.tasks.update(id, patch)?;
    let fanout = engine.dispatcher().on_task_updated(&previous, &next, &ctx.actor);

    let change = classify_update(&previous, &next);
    let event_warning = emit_event(
        &mut sink,
        EventKind::from_change(&change),
        &ctx.actor,
        update_event_payload(&next, &change, &fanout),
    );

    let mut human = HumanOutput::new("Task updated");
    push_fanout_summary(&mut human, &next, &fanout, event_warning);

    let output = TaskMutationOutput {
        task: next,
        fanout,
    };
    emit_success(common.output(), command, &output, Some(&human))
}

fn run_delete(common: &CommonOptions, id: &str) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let engine = Engine::new(&ctx);
    let mut sink = open_event_sink(common.events.as_deref())?;

    let deleted = engine.tasks.delete(id)?;
    let fanout = engine.dispatcher().on_task_deleted(&deleted, &ctx.actor);

    let event_warning = emit_event(
        &mut sink,
        EventKind::TaskDeleted,
        &ctx.actor,
        serde_json::json!({
            "task_id": deleted.id,
            "title": deleted.title,
            "notifications": fanout.created,
        }),
    );

    let mut human = HumanOutput::new("Task deleted");
    push_fanout_summary(&mut human, &deleted, &fanout, event_warning);

    let output = TaskMutationOutput {
        task: deleted,
        fanout,
    };
    emit_success(common.output(), "task delete", &output, Some(&human))
}

fn run_show(common: &CommonOptions, id: &str) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let task = tasks.get(id)?;

    let mut human = HumanOutput::new("Task");
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Assigned", task.assigned_to.clone());

    emit_success(common.output(), "task show", &task, Some(&human))
}

fn run_list(common: &CommonOptions, status: Option<&str>) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let tasks = TaskStore::new(ctx.storage.clone());
    let status = parse_status(status)?;
    let records = tasks.list(status)?;

    let output = TaskListOutput {
        total: records.len(),
        tasks: records,
    };

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", output.total.to_string());
    for task in &output.tasks {
        human.push_detail(format!(
            "{} [{}] {} -> {}",
            task.id, task.status, task.title, task.assigned_to
        ));
    }

    emit_success(common.output(), "task list", &output, Some(&human))
}

fn parse_status(raw: Option<&str>) -> Result<Option<TaskStatus>> {
    raw.map(str::parse::<TaskStatus>).transpose()
}

fn parse_due(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|value| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| Error::InvalidArgument(format!("invalid due date: {value} (want YYYY-MM-DD)")))
    })
    .transpose()
}

fn update_event_payload(
    next: &Task,
    change: &ChangeKind,
    fanout: &FanoutReport,
) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "task_id": next.id,
        "title": next.title,
        "notifications": fanout.created,
    });
    match change {
        ChangeKind::StatusChanged { from, to } => {
            payload["from"] = serde_json::json!(from);
            payload["to"] = serde_json::json!(to);
        }
        ChangeKind::Reassigned { from, to } => {
            payload["from"] = serde_json::json!(from);
            payload["to"] = serde_json::json!(to);
        }
        _ => {}
    }
    payload
}

fn open_event_sink(events: Option<&str>) -> Result<Option<EventSink>> {
    match EventDestination::parse(events) {
        Some(destination) => Ok(Some(destination.open()?)),
        None => Ok(None),
    }
}

/// Emit one event; a sink failure becomes a human warning, not an error.
fn emit_event(
    sink: &mut Option<EventSink>,
    kind: EventKind,
    actor: &str,
    payload: serde_json::Value,
) -> Option<String> {
    let sink = sink.as_mut()?;
    let event = match Event::new(kind, Some(actor.to_string())).with_data(payload) {
        Ok(event) => event,
        Err(err) => return Some(format!("event payload error: {err}")),
    };
    match sink.emit(&event) {
        Ok(()) => None,
        Err(err) => Some(format!("event emit error: {err}")),
    }
}

fn push_fanout_summary(
    human: &mut HumanOutput,
    task: &Task,
    fanout: &FanoutReport,
    event_warning: Option<String>,
) {
    if let Some(warning) = event_warning {
        human.push_warning(warning);
    }
    human.push_summary("ID", task.id.clone());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Assigned", task.assigned_to.clone());
    human.push_summary(
        "Notifications",
        format!(
            "{} created, {} reused, {} failed",
            fanout.created, fanout.reused, fanout.failed
        ),
    );
    if fanout.failed > 0 {
        human.push_warning(format!(
            "{} notification write(s) failed; task mutation kept",
            fanout.failed
        ));
    }
}
