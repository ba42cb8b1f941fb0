//! herald user/customer/deal command implementations.
//!
//! These registries feed display-name resolution during fanout; the
//! commands themselves are plain CRUD with no notification side.

use serde::Serialize;

use crate::cli::{load_context, CommonOptions, CustomerCommands, DealCommands, UserCommands};
use crate::customer::{CustomerRecord, CustomerStore};
use crate::directory::{UserDirectory, UserRecord};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::sales::{DealRecord, DealStore};

pub fn run_user(common: &CommonOptions, command: UserCommands) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let users = UserDirectory::new(ctx.storage.clone());

    match command {
        UserCommands::Add { uid, name, email } => {
            let record = users.add(UserRecord {
                uid,
                display_name: name,
                email,
            })?;

            let mut human = HumanOutput::new("User added");
            human.push_summary("Uid", record.uid.clone());
            human.push_summary("Name", record.display_name.clone());
            emit_success(common.output(), "user add", &record, Some(&human))
        }
        UserCommands::List => {
            let records = users.list()?;
            let output = UserListOutput {
                total: records.len(),
                users: records,
            };

            let mut human = HumanOutput::new("Users");
            human.push_summary("Total", output.total.to_string());
            for record in &output.users {
                human.push_detail(format!("{}: {}", record.uid, record.display_name));
            }
            emit_success(common.output(), "user list", &output, Some(&human))
        }
    }
}

#[derive(Serialize)]
struct UserListOutput {
    total: usize,
    users: Vec<UserRecord>,
}

pub fn run_customer(common: &CommonOptions, command: CustomerCommands) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let customers = CustomerStore::new(ctx.storage.clone());

    match command {
        CustomerCommands::Add { name, email } => {
            let record = customers.add(&name, email)?;

            let mut human = HumanOutput::new("Customer added");
            human.push_summary("Id", record.id.clone());
            human.push_summary("Name", record.name.clone());
            emit_success(common.output(), "customer add", &record, Some(&human))
        }
        CustomerCommands::List => {
            let records = customers.list()?;
            let output = CustomerListOutput {
                total: records.len(),
                customers: records,
            };

            let mut human = HumanOutput::new("Customers");
            human.push_summary("Total", output.total.to_string());
            for record in &output.customers {
                human.push_detail(format!("{}: {}", record.id, record.name));
            }
            emit_success(common.output(), "customer list", &output, Some(&human))
        }
    }
}

#[derive(Serialize)]
struct CustomerListOutput {
    total: usize,
    customers: Vec<CustomerRecord>,
}

pub fn run_deal(common: &CommonOptions, command: DealCommands) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
    let deals = DealStore::new(ctx.storage.clone());

    match command {
        DealCommands::Add {
            name,
            customer,
            amount,
        } => {
            let record = deals.add(&name, customer, amount)?;

            let mut human = HumanOutput::new("Deal added");
            human.push_summary("Id", record.id.clone());
            human.push_summary("Name", record.name.clone());
            emit_success(common.output(), "deal add", &record, Some(&human))
        }
        DealCommands::List => {
            let records = deals.list()?;
            let output = DealListOutput {
                total: records.len(),
                deals: records,
            };

            let mut human = HumanOutput::new("Deals");
            human.push_summary("Total", output.total.to_string());
            for record in &output.deals {
                human.push_detail(format!("{}: {}", record.id, record.name));
            }
            emit_success(common.output(), "deal list", &output, Some(&human))
        }
    }
}

#[derive(Serialize)]
struct DealListOutput {
    total: usize,
    deals: Vec<DealRecord>,
}
