//! herald actor command implementations.

use serde::Serialize;

use crate::actor;
use crate::cli::{load_context, ActorCommands, CommonOptions};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct ActorOutput {
    actor: String,
}

pub fn run(common: &CommonOptions, command: ActorCommands) -> Result<()> {
    match command {
        ActorCommands::Set { uid } => {
            let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;
            actor::persist_actor(&ctx.storage, &uid)?;

            let output = ActorOutput { actor: uid.clone() };
            let mut human = HumanOutput::new("Actor set");
            human.push_summary("Actor", uid);
            emit_success(common.output(), "actor set", &output, Some(&human))
        }
        ActorCommands::Show => {
            let ctx = load_context(common.dir.as_deref(), common.actor.as_deref(), true)?;

            let output = ActorOutput {
                actor: ctx.actor.clone(),
            };
            let mut human = HumanOutput::new("Actor");
            human.push_summary("Actor", ctx.actor);
            emit_success(common.output(), "actor show", &output, Some(&human))
        }
    }
}
