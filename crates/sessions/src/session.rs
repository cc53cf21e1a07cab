use relaybot_assets::Asset;

/// Data a command carries between its steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionData {
    #[default]
    Empty,
    /// Assets resolved by `/price`, awaiting the base currency choice.
    Price { assets: Vec<Asset> },
    /// Asset selected by `/swap`, awaiting the user's payment.
    Swap { target: Asset },
}

/// One user's in-progress command.
///
/// An empty `command` means the session is finished and must not be
/// dispatched to again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub command: String,
    pub user_id: String,
    pub current_step: usize,
    pub data: SessionData,
}

impl Session {
    pub fn new(command: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            user_id: user_id.into(),
            current_step: 0,
            data: SessionData::Empty,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.command.is_empty()
    }

    /// Move to the next step.
    pub fn advance(&mut self) {
        self.current_step += 1;
    }

    /// Mark the flow complete; the dispatcher deletes finished sessions.
    pub fn finish(&mut self) {
        self.command.clear();
        self.data = SessionData::Empty;
    }
}
