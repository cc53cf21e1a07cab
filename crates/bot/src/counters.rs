//! Metric names recorded with the `metrics` feature.

/// Inbound messages accepted for dispatch
pub const MESSAGES_RECEIVED_TOTAL: &str = "relaybot_messages_received_total";
/// Inbound messages dropped before dispatch, by reason
pub const MESSAGES_DROPPED_TOTAL: &str = "relaybot_messages_dropped_total";
/// Command steps executed, by command
pub const COMMANDS_EXECUTED_TOTAL: &str = "relaybot_commands_executed_total";
/// Sessions removed because a command step failed
pub const SESSIONS_ABORTED_TOTAL: &str = "relaybot_sessions_aborted_total";
/// Sessions removed by the idle janitor
pub const SESSIONS_EXPIRED_TOTAL: &str = "relaybot_sessions_expired_total";
/// Relay stream reconnects
pub const RELAY_RECONNECTS_TOTAL: &str = "relaybot_relay_reconnects_total";
