use std::{sync::Arc, time::Duration};

use {
    relaybot_sessions::SessionStore,
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use crate::counters;
use crate::{Dispatcher, RelayTransport};

/// Default wait between relay reconnect attempts.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Keeps a relay connection alive and feeds it to the dispatcher.
pub struct Runner {
    transport: Arc<dyn RelayTransport>,
    dispatcher: Arc<Dispatcher>,
    backoff: Duration,
    janitor_interval: Option<Duration>,
}

impl Runner {
    pub fn new(transport: Arc<dyn RelayTransport>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            transport,
            dispatcher,
            backoff: DEFAULT_RECONNECT_BACKOFF,
            janitor_interval: None,
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sweep idle sessions every `interval`. Has no effect when the session
    /// store has no TTL.
    #[must_use]
    pub fn with_janitor(mut self, interval: Duration) -> Self {
        self.janitor_interval = Some(interval);
        self
    }

    /// Listen until `cancel` fires, reconnecting after every stream end or
    /// failure. A message being handled when `cancel` fires is finished
    /// first.
    pub async fn run(self, cancel: CancellationToken) {
        let janitor = self.spawn_janitor(cancel.child_token());

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.transport.listen(self.dispatcher.as_ref(), &cancel).await {
                Ok(()) => debug!("relay stream ended"),
                Err(e) => warn!(error = %e, "relay stream failed"),
            }

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.backoff) => {
                    #[cfg(feature = "metrics")]
                    metrics::counter!(counters::RELAY_RECONNECTS_TOTAL).increment(1);
                    info!(backoff_ms = self.backoff.as_millis() as u64, "reconnecting to relay");
                },
            }
        }

        // The janitor holds a child token and stops with us.
        if let Some(janitor) = janitor
            && let Err(e) = janitor.await
        {
            warn!(error = %e, "session janitor panicked");
        }
        info!("relay loop stopped");
    }

    fn spawn_janitor(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let interval = self.janitor_interval?;
        let sessions = Arc::clone(self.dispatcher.sessions());
        let ttl = sessions.ttl()?;
        debug!(interval_secs = interval.as_secs(), ttl_secs = ttl.as_secs(), "session janitor started");
        Some(tokio::spawn(run_janitor(sessions, interval, cancel)))
    }
}

/// Evict idle sessions every `interval` until cancelled.
pub async fn run_janitor(sessions: Arc<SessionStore>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = sessions.evict_expired();
                if evicted > 0 {
                    #[cfg(feature = "metrics")]
                    metrics::counter!(counters::SESSIONS_EXPIRED_TOTAL).increment(evicted as u64);
                    info!(evicted, remaining = sessions.len(), "evicted idle sessions");
                }
            },
        }
    }
}
