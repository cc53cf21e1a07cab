use {
    async_trait::async_trait,
    relaybot_common::Message,
    relaybot_sessions::Session,
    serde::Deserialize,
    tracing::debug,
};

use crate::{Command, CommandContext, CommandDescriptor, Outcome, Result};

/// A quote with its attribution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Quote {
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub origin: String,
}

impl Quote {
    /// `"<content>\n<author> <<origin>>"`
    pub fn render(&self) -> String {
        format!("{}\n{} <{}>", self.content, self.author, self.origin)
    }
}

/// Source of quote-of-the-day texts.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch_quote(&self) -> Result<Quote>;
}

/// Fetches a quote from a JSON endpoint returning `{content, author, origin}`.
pub struct HttpQuoteSource {
    client: reqwest::Client,
    url: String,
}

impl HttpQuoteSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl QuoteSource for HttpQuoteSource {
    async fn fetch_quote(&self) -> Result<Quote> {
        debug!(url = %self.url, "fetching quote");
        let body = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

pub struct PoemCommand;

#[async_trait]
impl Command for PoemCommand {
    fn descriptor(&self) -> CommandDescriptor {
        CommandDescriptor {
            name: "/poem",
            description: "Send a random poem",
            step_count: 1,
        }
    }

    async fn execute(
        &self,
        ctx: &CommandContext<'_>,
        mut session: Session,
        msg: &Message,
    ) -> Result<Outcome> {
        let quote = ctx.quotes.fetch_quote().await?;
        session.finish();
        Ok(Outcome::text(session, msg, &quote.render()))
    }
}
