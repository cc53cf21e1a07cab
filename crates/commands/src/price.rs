use {
    async_trait::async_trait,
    relaybot_assets::{Asset, resolve_symbol},
    relaybot_common::Message,
    relaybot_sessions::{Session, SessionData},
    tracing::debug,
};

use crate::{Command, CommandContext, CommandDescriptor, Error, Outcome, Result};

pub const PRICE_USAGE: &str = "Usage: /price <SYMBOL> [SYMBOL ...]";
pub const PRICE_CONFIRM: &str = "Confirm USD price? Reply Y, N to cancel, or a base ticker symbol.";

/// Outcome of resolving a list of symbols: either every asset, or the text
/// of the first lookup that missed.
enum Resolved<T> {
    Found(T),
    Missing(String),
}

async fn resolve(ctx: &CommandContext<'_>, symbol: &str) -> Result<Resolved<Asset>> {
    match resolve_symbol(ctx.directory, ctx.assets, symbol).await {
        Ok(asset) => Ok(Resolved::Found(asset)),
        Err(e) if e.is_not_found() => Ok(Resolved::Missing(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

fn usd_lines(assets: &[Asset]) -> String {
    assets
        .iter()
        .map(|a| format!("1 {}({}) = {} USD", a.symbol, a.name, a.price_usd.normalize()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn ratio_lines(assets: &[Asset], base: &Asset) -> String {
    assets
        .iter()
        .map(|a| {
            let ratio = a.price_usd.checked_div(base.price_usd).unwrap_or_default();
            // Significant digits, so cheap assets against dear bases stay visible.
            let ratio = ratio.round_sf(8).unwrap_or(ratio).normalize();
            format!("1 {}({}) ≈ {} {}({})", a.symbol, a.name, ratio, base.symbol, base.name)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `/price BTC ETH` quotes assets in USD or, on request, in another asset.
pub struct PriceCommand;

impl PriceCommand {
    async fn lookup(
        &self,
        ctx: &CommandContext<'_>,
        mut session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        let symbols: Vec<&str> = msg.body.split_whitespace().collect();
        if symbols.is_empty() {
            session.finish();
            return Ok(Outcome::text(session, msg, PRICE_USAGE));
        }

        let mut assets = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            match resolve(ctx, symbol).await? {
                Resolved::Found(asset) => assets.push(asset),
                Resolved::Missing(text) => {
                    session.finish();
                    return Ok(Outcome::text(session, msg, &text));
                },
            }
        }

        debug!(user_id = %session.user_id, count = assets.len(), "price lookup resolved");
        session.data = SessionData::Price { assets };
        session.advance();
        Ok(Outcome::text(session, msg, PRICE_CONFIRM))
    }

    async fn quote(
        &self,
        ctx: &CommandContext<'_>,
        mut session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        let SessionData::Price { assets } = &session.data else {
            return Err(Error::invalid_state("/price step 1 without resolved assets"));
        };

        let answer = msg.body.trim();
        if answer.eq_ignore_ascii_case("n") {
            session.finish();
            return Ok(Outcome::silent(session));
        }

        let text = if answer.eq_ignore_ascii_case("y") {
            usd_lines(assets)
        } else {
            let base = match resolve(ctx, answer).await? {
                Resolved::Found(base) => base,
                // Stay on this step so the user can try another ticker.
                Resolved::Missing(text) => return Ok(Outcome::text(session, msg, &text)),
            };
            if base.price_usd.is_zero() {
                let text = format!(
                    "{} has no USD price, reply another base ticker symbol.",
                    base.symbol
                );
                return Ok(Outcome::text(session, msg, &text));
            }
            ratio_lines(assets, &base)
        };

        session.finish();
        Ok(Outcome::text(session, msg, &text))
    }
}

#[async_trait]
impl Command for PriceCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "/price",
            description: "Show asset prices in USD or another asset",
            step_count: 2,
        }
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        match session.current_step {
            0 => self.lookup(ctx, session, msg).await,
            1 => self.quote(ctx, session, msg).await,
            step => Err(Error::invalid_state(format!("/price has no step {step}"))),
        }
    }
}
