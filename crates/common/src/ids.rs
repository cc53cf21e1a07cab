//! Deterministic identifiers derived from inbound message ids.
//!
//! The relay deduplicates by id, so anything we emit in response to a
//! message (replies, refunds, swap orders) is keyed off the inbound id. A
//! redelivered message then maps onto the same outbound id.

use uuid::Uuid;

pub const REPLY_TAG: &str = "reply";
pub const REFUND_TAG: &str = "refund";
pub const SWAP_TAG: &str = "swap";
pub const FOLLOW_TAG: &str = "follow";

/// Derive a v5 UUID from `message_id` and a fixed `tag`.
///
/// Message ids that are not UUIDs are first hashed into a namespace so the
/// result stays deterministic.
pub fn derive(message_id: &str, tag: &str) -> String {
    let namespace = Uuid::parse_str(message_id)
        .unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, message_id.as_bytes()));
    Uuid::new_v5(&namespace, tag.as_bytes()).to_string()
}

pub fn reply_id(message_id: &str) -> String {
    derive(message_id, REPLY_TAG)
}

pub fn refund_trace_id(message_id: &str) -> String {
    derive(message_id, REFUND_TAG)
}

/// Whether `id` identifies a real user (a non-nil UUID).
pub fn is_valid_user_id(id: &str) -> bool {
    Uuid::parse_str(id).is_ok_and(|uuid| !uuid.is_nil())
}
