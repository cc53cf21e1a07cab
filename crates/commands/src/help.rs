use {async_trait::async_trait, relaybot_common::Message, relaybot_sessions::Session};

use crate::{Command, CommandContext, CommandDescriptor, Outcome, Result};

pub struct HelpCommand;

#[async_trait]
impl Command for HelpCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "/help",
            description: "List all available commands",
            step_count: 1,
        }
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        mut session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        let listing = ctx
            .commands
            .iter()
            .map(|d| format!("{} - {}", d.name, d.description))
            .collect::<Vec<_>>()
            .join("\n");
        session.finish();
        Ok(Outcome::text(session, msg, &listing))
    }
}
