//! Long-poll loop for inbound updates.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::bot::AppState;
use crate::dispatch::dispatch;
use crate::platform::next_offset;

/// Poll for updates until `stop` flips to `true`.
///
/// The offset lives here and nowhere else. Messages within one batch are
/// handled one at a time, in order. A failed or panicking poll waits
/// `retry_delay_secs` and tries again; nothing but the stop signal ends the
/// loop.
pub async fn run(state: Arc<AppState>, mut stop: watch::Receiver<bool>) {
    let timeout = state.config.telegram.poll_timeout_secs;
    let retry_delay = Duration::from_secs(state.config.telegram.retry_delay_secs);
    let mut offset = 0;

    info!("Polling for updates (timeout {}s)", timeout);

    loop {
        if *stop.borrow() {
            break;
        }

        let poll = AssertUnwindSafe(state.transport.get_updates(offset, timeout)).catch_unwind();
        let result = tokio::select! {
            result = poll => result,
            _ = stop.changed() => break,
        };

        let failed = match result {
            Ok(Ok(updates)) => {
                offset = next_offset(offset, &updates);
                if !updates.is_empty() {
                    debug!("Received {} update(s), next offset {}", updates.len(), offset);
                }
                for message in updates.into_iter().filter_map(|u| u.message) {
                    dispatch(&state, &message).await;
                }
                false
            }
            Ok(Err(e)) => {
                warn!("Poll error: {}", e);
                true
            }
            Err(_) => {
                error!("Poll panicked at offset {}", offset);
                true
            }
        };

        if failed {
            tokio::select! {
                _ = tokio::time::sleep(retry_delay) => {}
                _ = stop.changed() => break,
            }
        }
    }

    info!("Poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing;
    use crate::platform::testing::text_update;
    use crate::platform::ChatId;

    #[tokio::test]
    async fn test_offset_advances_and_nothing_is_redelivered() {
        let (state, transport) = testing::state();
        transport.push_updates(vec![text_update(10, 1, "/help"), text_update(11, 1, "/help")]);
        // The provider would re-send 10 and 11 if the offset were wrong.
        transport.push_updates(vec![
            text_update(10, 1, "/help"),
            text_update(11, 1, "/help"),
            text_update(12, 2, "/help"),
        ]);

        let (tx, rx) = watch::channel(false);
        transport.stop_when_drained(tx);
        run(state, rx).await;

        assert_eq!(transport.offsets(), vec![0, 12, 13]);
        assert_eq!(transport.sent_to(ChatId(1)).len(), 2);
        assert_eq!(transport.sent_to(ChatId(2)).len(), 1);
    }

    #[tokio::test]
    async fn test_poll_error_is_retried() {
        let (state, transport) = testing::state();
        transport.push_poll_error();
        transport.push_updates(vec![text_update(1, 5, "/start")]);

        let (tx, rx) = watch::channel(false);
        transport.stop_when_drained(tx);
        run(state.clone(), rx).await;

        assert_eq!(transport.offsets(), vec![0, 0, 2]);
        assert_eq!(state.registry.list_subscribers(), vec![ChatId(5)]);
    }

    #[tokio::test]
    async fn test_poll_panic_is_retried() {
        let (state, transport) = testing::state();
        transport.push_updates(vec![text_update(4, 1, "/help")]);
        transport.push_poll_panic();
        transport.push_updates(vec![text_update(5, 2, "/subscribe")]);

        let (tx, rx) = watch::channel(false);
        transport.stop_when_drained(tx);
        run(state.clone(), rx).await;

        assert_eq!(transport.offsets(), vec![0, 5, 5, 6]);
        assert_eq!(transport.sent_to(ChatId(1)).len(), 1);
        assert_eq!(state.registry.list_subscribers(), vec![ChatId(2)]);
    }

    #[tokio::test]
    async fn test_messages_handled_in_arrival_order() {
        let (state, transport) = testing::state();
        transport.push_updates(vec![
            text_update(1, 1, "/alert first"),
            text_update(2, 1, "/alert second"),
            text_update(3, 1, "/myalerts"),
        ]);

        let (tx, rx) = watch::channel(false);
        transport.stop_when_drained(tx);
        run(state.clone(), rx).await;

        assert_eq!(state.registry.list_alerts(ChatId(1)), vec!["first", "second"]);
        let last = transport.sent().pop().unwrap();
        assert!(last.text.contains("1. <code>first</code>\n2. <code>second</code>"));
    }

    #[tokio::test]
    async fn test_stop_before_start_never_polls() {
        let (state, transport) = testing::state();
        let (_tx, rx) = watch::channel(true);
        run(state, rx).await;
        assert!(transport.offsets().is_empty());
    }
}
