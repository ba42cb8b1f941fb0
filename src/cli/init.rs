//! herald init command implementation.

use serde::Serialize;

use crate::cli::{load_context, CommonOptions};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct InitOutput {
    data_dir: String,
    created: bool,
}

pub fn run_init(common: &CommonOptions) -> Result<()> {
    let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), false)?;
    let created = !ctx.storage.is_initialized();
    ctx.storage.init()?;

    let data_dir = ctx.storage.data_root().display().to_string();
    let output = InitOutput {
        data_dir: data_dir.clone(),
        created,
    };

    let mut human = HumanOutput::new(if created {
        "Initialized herald data directory"
    } else {
        "Data directory already initialized"
    });
    human.push_summary("Path", data_dir);

    emit_success(common.output(), "init", &output, Some(&human))
}
