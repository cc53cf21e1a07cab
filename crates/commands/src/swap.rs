use std::mem;

use {
    async_trait::async_trait,
    relaybot_assets::resolve_symbol,
    relaybot_common::{Message, MessageCategory, OutboundMessage},
    relaybot_sessions::{Session, SessionData},
    serde::Serialize,
    tracing::debug,
};

use crate::{Command, CommandContext, CommandDescriptor, Error, Outcome, Result, transfer};

pub const SWAP_USAGE: &str = "Usage: /swap <SYMBOL>";
pub const SWAP_EXPECTED_TRANSFER: &str = "Swap cancelled, a transfer was expected.";

const BUTTON_COLOR: &str = "#0080FF";

#[derive(Debug, Serialize)]
struct Button {
    label: String,
    action: String,
    color: &'static str,
}

/// Button group asking the user to pay the bot.
fn pay_buttons(symbol: &str, bot_id: &str) -> Result<Vec<u8>> {
    let buttons = [Button {
        label: format!("Pay to swap for {symbol}"),
        action: format!("mixin://transfer/{bot_id}"),
        color: BUTTON_COLOR,
    }];
    Ok(serde_json::to_vec(&buttons)?)
}

/// `/swap ETH` asks the user to pay any asset, then swaps the payment into
/// ETH through the settlement service.
pub struct SwapCommand;

#[async_trait]
impl Command for SwapCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "/swap",
            description: "Swap the asset you pay into another asset",
            step_count: 2,
        }
    }

    fn accepts_transfers(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        mut session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        match session.current_step {
            0 => {
                let symbol = msg.body.trim();
                if symbol.is_empty() {
                    session.finish();
                    return Ok(Outcome::text(session, msg, SWAP_USAGE));
                }
                let target = match resolve_symbol(ctx.directory, ctx.assets, symbol).await {
                    Ok(asset) => asset,
                    Err(e) if e.is_not_found() => {
                        session.finish();
                        return Ok(Outcome::text(session, msg, &e.to_string()));
                    },
                    Err(e) => return Err(e.into()),
                };

                let payload = pay_buttons(&target.symbol, ctx.wallet.client_id())?;
                debug!(user_id = %session.user_id, target = %target.symbol, "awaiting swap payment");
                session.data = SessionData::Swap { target };
                session.advance();
                let reply = OutboundMessage::reply(msg, MessageCategory::AppButtonGroup, &payload);
                Ok(Outcome::reply(session, reply))
            },
            1 => {
                if msg.is_transfer() {
                    let view = msg.transfer_view()?;
                    if !transfer::is_incoming(ctx, msg, &view) {
                        debug!(
                            user_id = %session.user_id,
                            amount = %view.amount,
                            "not a payment, still awaiting swap payment"
                        );
                        return Ok(Outcome::silent(session));
                    }
                }
                // The flow ends here whatever happens to the payment.
                let data = mem::take(&mut session.data);
                session.finish();
                let SessionData::Swap { target } = data else {
                    return Err(Error::invalid_state("/swap step 1 without a target asset"));
                };
                if !msg.is_transfer() {
                    return Err(Error::rejected(SWAP_EXPECTED_TRANSFER));
                }
                let reply = transfer::handle_transfer(ctx, msg, Some(&target)).await?;
                Ok(Outcome { session, reply })
            },
            step => Err(Error::invalid_state(format!("/swap has no step {step}"))),
        }
    }
}
