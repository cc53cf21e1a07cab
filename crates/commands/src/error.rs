use thiserror::Error;

/// Reply sent to the user when a command fails for a reason they can't act on.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again later.";

#[derive(Debug, Error)]
pub enum Error {
    /// The command refused the input; the message is shown to the user as is.
    #[error("{message}")]
    Rejected { message: String },

    /// Session data does not match the command's current step.
    #[error("invalid session state: {message}")]
    InvalidState { message: String },

    #[error(transparent)]
    Assets(#[from] relaybot_assets::Error),

    #[error(transparent)]
    Relay(#[from] relaybot_common::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("settlement failed: {message}")]
    Settlement { message: String },
}

impl Error {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn settlement(message: impl Into<String>) -> Self {
        Self::Settlement {
            message: message.into(),
        }
    }

    /// Text to send back to the user. Internal and upstream failures are
    /// collapsed into [`GENERIC_FAILURE`]; their detail goes to the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
            Self::Assets(e) if e.is_not_found() => e.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
