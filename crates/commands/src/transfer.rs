//! Handling of transfer notifications: refunds for unsolicited payments and
//! settlement of payments a `/swap` flow is waiting for.

use {
    relaybot_assets::Asset,
    relaybot_common::{Message, OutboundMessage, TransferInput, TransferView, ids},
    rust_decimal::Decimal,
    tracing::{debug, info, warn},
};

use crate::{CommandContext, Result, SwapRequest};

pub const REFUND_MEMO: &str = "refund";

/// Reply sent once a swap payment has been handed to the exchange.
pub fn swap_reply(pay_symbol: &str, fill_symbol: &str) -> String {
    format!("{pay_symbol} -> {fill_symbol}, swap at 4swap.\nPlease check @7000103537 for swap result")
}

/// Whether `view` is money paid to the bot by someone else. Every other
/// snapshot is ignored by [`handle_transfer`].
pub fn is_incoming(ctx: &CommandContext<'_>, msg: &Message, view: &TransferView) -> bool {
    msg.user_id != ctx.wallet.client_id() && view.amount > Decimal::ZERO
}

/// Act on a transfer notification.
///
/// Without a `target` the payment is refunded in full and nothing is sent
/// back. With one, the paid asset is swapped into `target` for the sender.
/// Transfers made by the bot itself, and outgoing (non-positive) snapshots,
/// are ignored.
pub async fn handle_transfer(
    ctx: &CommandContext<'_>,
    msg: &Message,
    target: Option<&Asset>,
) -> Result<Option<OutboundMessage>> {
    if msg.user_id == ctx.wallet.client_id() {
        debug!(message_id = %msg.message_id, "ignoring transfer from self");
        return Ok(None);
    }

    let view = msg.transfer_view()?;
    if !is_incoming(ctx, msg, &view) {
        debug!(
            message_id = %msg.message_id,
            amount = %view.amount,
            "ignoring outgoing snapshot"
        );
        return Ok(None);
    }

    match target {
        None => {
            refund(ctx, msg, &view).await?;
            Ok(None)
        },
        Some(target) => swap(ctx, msg, &view, target).await.map(Some),
    }
}

/// Send the full amount back to the sender. The trace id is derived from the
/// message id so a redelivered notification cannot refund twice.
pub async fn refund(ctx: &CommandContext<'_>, msg: &Message, view: &TransferView) -> Result<()> {
    let input = TransferInput {
        asset_id: view.asset_id.clone(),
        opponent_id: msg.user_id.clone(),
        amount: view.amount,
        trace_id: ids::refund_trace_id(&msg.message_id),
        memo: REFUND_MEMO.to_string(),
    };
    ctx.wallet.transfer(&input).await?;
    info!(
        user_id = %msg.user_id,
        asset_id = %input.asset_id,
        amount = %input.amount,
        trace_id = %input.trace_id,
        "refunded unsolicited transfer"
    );
    Ok(())
}

async fn swap(
    ctx: &CommandContext<'_>,
    msg: &Message,
    view: &TransferView,
    target: &Asset,
) -> Result<OutboundMessage> {
    let paid = ctx.assets.read_asset(&view.asset_id).await?;
    if paid.asset_id == target.asset_id {
        warn!(
            user_id = %msg.user_id,
            asset_id = %paid.asset_id,
            "paid with the swap target, refunding"
        );
        refund(ctx, msg, view).await?;
        return Ok(OutboundMessage::text_reply(
            msg,
            &format!("Cannot swap {} for itself, the payment was refunded.", paid.symbol),
        ));
    }

    let request = SwapRequest {
        receiver_id: msg.user_id.clone(),
        pay_asset_id: paid.asset_id.clone(),
        fill_asset_id: target.asset_id.clone(),
        amount: view.amount,
        trace_id: ids::derive(&msg.message_id, ids::SWAP_TAG),
        follow_id: ids::derive(&msg.message_id, ids::FOLLOW_TAG),
    };
    ctx.settlement.swap(&request).await?;

    Ok(OutboundMessage::text_reply(
        msg,
        &swap_reply(&paid.symbol, &target.symbol),
    ))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::{BOT_ID, BTC_ID, ETH_ID, Fixture, USER_ID, btc, eth, transfer_message},
        std::str::FromStr,
    };

    #[tokio::test]
    async fn unsolicited_transfer_is_refunded_in_full() {
        let fx = Fixture::new();
        let msg = transfer_message(USER_ID, BTC_ID, "0.0123");
        let reply = handle_transfer(&fx.ctx(), &msg, None).await.unwrap();

        assert!(reply.is_none());
        let transfers = fx.wallet.transfers();
        assert_eq!(transfers.len(), 1);
        let refund = &transfers[0];
        assert_eq!(refund.opponent_id, USER_ID);
        assert_eq!(refund.asset_id, BTC_ID);
        assert_eq!(refund.amount, Decimal::from_str("0.0123").unwrap());
        assert_eq!(refund.memo, REFUND_MEMO);
        assert_eq!(refund.trace_id, ids::refund_trace_id(&msg.message_id));
    }

    #[tokio::test]
    async fn transfer_from_self_is_ignored() {
        let fx = Fixture::new();
        let msg = transfer_message(BOT_ID, BTC_ID, "1");
        assert!(handle_transfer(&fx.ctx(), &msg, None).await.unwrap().is_none());
        assert!(fx.wallet.transfers().is_empty());
    }

    #[tokio::test]
    async fn outgoing_snapshot_is_ignored() {
        let fx = Fixture::new();
        let msg = transfer_message(USER_ID, BTC_ID, "-0.5");
        assert!(handle_transfer(&fx.ctx(), &msg, Some(&eth())).await.unwrap().is_none());
        assert!(fx.wallet.transfers().is_empty());
        assert!(fx.settlement.requests().is_empty());
    }

    #[tokio::test]
    async fn only_positive_payments_from_others_are_incoming() {
        let fx = Fixture::new();
        let ctx = fx.ctx();
        for (user, amount, expected) in [
            (USER_ID, "0.1", true),
            (USER_ID, "0", false),
            (USER_ID, "-1", false),
            (BOT_ID, "1", false),
        ] {
            let msg = transfer_message(user, BTC_ID, amount);
            let view = msg.transfer_view().unwrap();
            assert_eq!(is_incoming(&ctx, &msg, &view), expected, "{user} {amount}");
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let fx = Fixture::new();
        let msg = transfer_message(USER_ID, BTC_ID, "1").with_body("not json");
        assert!(handle_transfer(&fx.ctx(), &msg, None).await.is_err());
    }

    #[tokio::test]
    async fn refund_failure_propagates() {
        let fx = Fixture::new();
        fx.wallet.fail_with("insufficient balance");
        let msg = transfer_message(USER_ID, BTC_ID, "1");
        assert!(matches!(
            handle_transfer(&fx.ctx(), &msg, None).await,
            Err(crate::Error::Relay(_))
        ));
    }

    #[tokio::test]
    async fn payment_with_target_is_swapped() {
        let fx = Fixture::new();
        let msg = transfer_message(USER_ID, BTC_ID, "0.5");
        let reply = handle_transfer(&fx.ctx(), &msg, Some(&eth()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reply.payload_text().unwrap(), swap_reply("BTC", "ETH"));
        assert_eq!(reply.message_id, ids::reply_id(&msg.message_id));

        let requests = fx.settlement.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.receiver_id, USER_ID);
        assert_eq!(request.pay_asset_id, BTC_ID);
        assert_eq!(request.fill_asset_id, ETH_ID);
        assert_eq!(request.amount, Decimal::from_str("0.5").unwrap());
        assert_eq!(request.trace_id, ids::derive(&msg.message_id, ids::SWAP_TAG));
        assert_ne!(request.trace_id, request.follow_id);
        assert!(fx.wallet.transfers().is_empty());
    }

    #[tokio::test]
    async fn paying_with_target_asset_is_refunded() {
        let fx = Fixture::new();
        let msg = transfer_message(USER_ID, BTC_ID, "0.5");
        let reply = handle_transfer(&fx.ctx(), &msg, Some(&btc()))
            .await
            .unwrap()
            .unwrap();

        assert!(reply.payload_text().unwrap().contains("refunded"));
        assert!(fx.settlement.requests().is_empty());
        assert_eq!(fx.wallet.transfers().len(), 1);
    }

    #[tokio::test]
    async fn settlement_failure_propagates() {
        let fx = Fixture::new();
        fx.settlement.fail_with("group offline");
        let msg = transfer_message(USER_ID, BTC_ID, "0.5");
        let err = handle_transfer(&fx.ctx(), &msg, Some(&eth()))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Settlement { .. }));
    }

    #[test]
    fn swap_reply_text() {
        assert_eq!(
            swap_reply("BTC", "ETH"),
            "BTC -> ETH, swap at 4swap.\nPlease check @7000103537 for swap result"
        );
    }
}
