use {async_trait::async_trait, relaybot_common::Message, relaybot_sessions::Session};

use crate::{Command, CommandContext, CommandDescriptor, Outcome, Result};

pub const ECHO_PROMPT: &str = "Please input the content to echo.";

/// `/echo <text>` replies with `<text>`; a bare `/echo` asks for it first.
pub struct EchoCommand;

#[async_trait]
impl Command for EchoCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "/echo",
            description: "Echo back the content you send",
            step_count: 2,
        }
    }

    async fn execute(
        &self,
        _ctx: &CommandContext<'_>,
        mut session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        if session.current_step == 0 && msg.body.is_empty() {
            session.advance();
            return Ok(Outcome::text(session, msg, ECHO_PROMPT));
        }

        session.finish();
        Ok(Outcome::text(session, msg, &msg.body))
    }
}
