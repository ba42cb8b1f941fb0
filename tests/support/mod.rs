#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use herald::config::{Config, NotifyConfig};
use herald::customer::CustomerStore;
use herald::directory::{UserDirectory, UserRecord};
use herald::fanout::FanoutDispatcher;
use herald::notification::NotificationStore;
use herald::sales::DealStore;
use herald::storage::Storage;
use herald::task::{NewTask, TaskStore};
use tempfile::TempDir;

/// A scratch CRM: initialized data directory plus handles to every
/// store the fanout engine touches.
pub struct TestCrm {
    dir: TempDir,
    pub config: Config,
    pub tasks: TaskStore,
    pub notifications: NotificationStore,
    pub users: UserDirectory,
    pub customers: CustomerStore,
    pub deals: DealStore,
}

impl TestCrm {
    pub fn init() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let storage = Storage::for_base_dir(dir.path());
        storage.init().expect("storage init");

        Self {
            dir,
            config: Config::default(),
            tasks: TaskStore::new(storage.clone()),
            notifications: NotificationStore::new(storage.clone()),
            users: UserDirectory::new(storage.clone()),
            customers: CustomerStore::new(storage.clone()),
            deals: DealStore::new(storage),
        }
    }

    /// Scratch CRM pre-seeded with the users the scenarios use.
    pub fn with_team() -> Self {
        let crm = Self::init();
        crm.add_user("u1", "Alice");
        crm.add_user("u2", "Bob");
        crm.add_user("u3", "Cleo");
        crm
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn add_user(&self, uid: &str, name: &str) {
        self.users
            .add(UserRecord {
                uid: uid.to_string(),
                display_name: name.to_string(),
                email: None,
            })
            .expect("add user");
    }

    pub fn add_customer(&self, name: &str) -> String {
        self.customers.add(name, None).expect("add customer").id
    }

    pub fn add_deal(&self, name: &str) -> String {
        self.deals.add(name, None, None).expect("add deal").id
    }

    pub fn notify_config(&self) -> &NotifyConfig {
        &self.config.notify
    }

    pub fn dispatcher(&self) -> FanoutDispatcher<'_> {
        FanoutDispatcher::new(
            &self.notifications,
            &self.users,
            &self.customers,
            &self.deals,
            &self.config.notify,
        )
    }

    pub fn new_task(&self, title: &str, assignee: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            assigned_to: assignee.to_string(),
            customer: None,
            sales: None,
            due_date: None,
        }
    }
}

/// A herald command running against the given CRM directory.
pub fn herald_cmd(crm_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("herald").expect("binary");
    cmd.current_dir(crm_path);
    cmd.env_remove("HERALD_ACTOR");
    cmd.env_remove("HERALD_DIR");
    cmd
}
