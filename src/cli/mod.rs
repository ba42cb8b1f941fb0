//! Command-line interface for herald
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand family is defined in its own submodule. Commands are
//! the thin controller layer: parse, mutate, hand off to the fanout
//! dispatcher, format the result.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{resolve_base_dir, Config};
use crate::error::{Error, Result};
use crate::storage::Storage;

mod actor;
mod directory;
mod init;
mod notify;
mod task;

/// herald - CRM task notifications
///
/// A small-business CRM task core: tasks with assignees, customers and
/// deals, and a notification fanout engine that tells every affected
/// user what changed.
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Base directory holding .herald/ (defaults to current directory)
    #[arg(long, global = true, env = "HERALD_DIR")]
    pub dir: Option<PathBuf>,

    /// Acting user id for mutations and message attribution
    #[arg(long, global = true, env = "HERALD_ACTOR")]
    pub actor: Option<String>,

    /// Emit task mutation events as JSONL ("-" for stdout, or a path)
    #[arg(long, global = true)]
    pub events: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the .herald/ data directory
    Init,

    /// Acting user identity
    #[command(subcommand)]
    Actor(ActorCommands),

    /// User directory management
    #[command(subcommand)]
    User(UserCommands),

    /// Customer registry management
    #[command(subcommand)]
    Customer(CustomerCommands),

    /// Deal registry management
    #[command(subcommand)]
    Deal(DealCommands),

    /// Task management (mutations trigger notification fanout)
    #[command(subcommand)]
    Task(TaskCommands),

    /// Notification polling and mark-read
    #[command(subcommand)]
    Notify(NotifyCommands),
}

#[derive(Subcommand, Debug)]
pub enum ActorCommands {
    /// Persist the acting uid for this data directory
    Set {
        /// User id to act as
        uid: String,
    },
    /// Show the resolved acting uid
    Show,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Add or replace a user record
    Add {
        /// Opaque user id
        uid: String,
        /// Display name used in notification messages
        #[arg(long)]
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
    },
    /// List user records
    List,
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommands {
    /// Add a customer
    Add {
        /// Customer name
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
    },
    /// List customers
    List,
}

#[derive(Subcommand, Debug)]
pub enum DealCommands {
    /// Add a deal
    Add {
        /// Deal name
        name: String,
        /// Customer id this deal belongs to
        #[arg(long)]
        customer: Option<String>,
        /// Deal amount
        #[arg(long)]
        amount: Option<f64>,
    },
    /// List deals
    List,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task and notify the assignee (and creator)
    New {
        /// Task title
        title: String,
        /// User id the task is assigned to
        #[arg(long)]
        assign: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Customer id
        #[arg(long)]
        customer: Option<String>,
        /// Deal id
        #[arg(long)]
        deal: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
    },
    /// Show one task
    Show {
        /// Task id
        id: String,
    },
    /// List tasks
    List {
        /// Filter by status: todo, in_progress, done
        #[arg(long)]
        status: Option<String>,
    },
    /// Update task fields and notify affected users
    Update {
        /// Task id
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New status: todo, in_progress, done
        #[arg(long)]
        status: Option<String>,
        /// Reassign to this user id
        #[arg(long)]
        assign: Option<String>,
        /// New customer id
        #[arg(long)]
        customer: Option<String>,
        /// New deal id
        #[arg(long)]
        deal: Option<String>,
        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Remove the customer reference
        #[arg(long, conflicts_with = "customer")]
        clear_customer: bool,
        /// Remove the deal reference
        #[arg(long, conflicts_with = "deal")]
        clear_deal: bool,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },
    /// Change task status (shorthand for update --status)
    Status {
        /// Task id
        id: String,
        /// New status: todo, in_progress, done
        status: String,
    },
    /// Reassign a task (shorthand for update --assign)
    Assign {
        /// Task id
        id: String,
        /// User id to assign to
        uid: String,
    },
    /// Delete a task and notify its creator and assignee
    Delete {
        /// Task id
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotifyCommands {
    /// List notifications for a recipient
    List {
        /// Recipient uid (defaults to the acting user)
        #[arg(long)]
        recipient: Option<String>,
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Mark a notification as read
    Read {
        /// Notification id
        id: String,
    },
    /// Count unread notifications for a recipient
    Count {
        /// Recipient uid (defaults to the acting user)
        #[arg(long)]
        recipient: Option<String>,
    },
}

/// Shared command context: resolved base dir, config, storage, actor.
pub(crate) struct Context {
    pub config: Config,
    pub storage: Storage,
    pub actor: String,
}

pub(crate) fn load_context(
    dir: Option<&std::path::Path>,
    cli_actor: Option<&str>,
    require_init: bool,
) -> Result<Context> {
    let base_dir = resolve_base_dir(dir);
    let config = Config::load_from_dir(&base_dir)?;
    let storage = Storage::for_base_dir(&base_dir);
    if require_init && !storage.is_initialized() {
        return Err(Error::NotInitialized(storage.data_root().to_path_buf()));
    }
    let actor = crate::actor::resolve_actor(&storage, &config, cli_actor);
    Ok(Context {
        config,
        storage,
        actor,
    })
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let common = CommonOptions {
            dir: self.dir,
            actor: self.actor,
            events: self.events,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init => init::run_init(&common),
            Commands::Actor(command) => actor::run(&common, command),
            Commands::User(command) => directory::run_user(&common, command),
            Commands::Customer(command) => directory::run_customer(&common, command),
            Commands::Deal(command) => directory::run_deal(&common, command),
            Commands::Task(command) => task::run(&common, command),
            Commands::Notify(command) => notify::run(&common, command),
        }
    }
}

/// Global flags shared by every subcommand.
#[derive(Debug, Clone)]
pub(crate) struct CommonOptions {
    pub dir: Option<PathBuf>,
    pub actor: Option<String>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl CommonOptions {
    /// JSON/quiet settings adjusted for whether events stream to stdout.
    pub(crate) fn output(&self) -> crate::output::OutputOptions {
        let events_to_stdout = self
            .events
            .as_deref()
            .map(|value| value.trim() == "-")
            .unwrap_or(false);
        crate::output::OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet || events_to_stdout,
        }
    }
}
