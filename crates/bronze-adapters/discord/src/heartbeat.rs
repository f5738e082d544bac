//! Heartbeat scheduler.
//!
//! One repeating timer per connection. Each tick sends
//! `{"op": 1, "d": <last sequence>}`, reading the sequence from the session's
//! watch channel. Starting while a timer is live cancels the old one first.

use std::time::Duration;

use bronze_core::ConnectionHandle;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::model::frame;

/// Drives the heartbeat of one connection.
pub struct HeartbeatScheduler {
    connection: ConnectionHandle,
    sequence: watch::Receiver<Option<u64>>,
    current: Option<CancellationToken>,
}

impl HeartbeatScheduler {
    /// Creates a stopped scheduler.
    pub fn new(connection: ConnectionHandle, sequence: watch::Receiver<Option<u64>>) -> Self {
        Self {
            connection,
            sequence,
            current: None,
        }
    }

    /// Starts heartbeating every `period`, replacing any live timer.
    ///
    /// The first beat is sent one period after starting.
    pub fn start(&mut self, period: Duration) {
        self.stop();

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let connection = self.connection.clone();
        let sequence = self.sequence.clone();

        debug!(bot_id = %connection.id, period_ms = period.as_millis() as u64, "Heartbeat started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let seq = *sequence.borrow();
                        trace!(bot_id = %connection.id, seq = ?seq, "Heartbeat");
                        if let Err(e) = connection.send_json(&frame::heartbeat(seq)).await {
                            warn!(bot_id = %connection.id, error = %e, "Heartbeat send failed");
                            break;
                        }
                    }
                }
            }
        });

        self.current = Some(token);
    }

    /// Stops the live timer, if any.
    pub fn stop(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
            debug!(bot_id = %self.connection.id, "Heartbeat stopped");
        }
    }

    /// Returns whether a timer is live.
    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use tokio::sync::{Notify, mpsc};

    fn scheduler() -> (
        HeartbeatScheduler,
        mpsc::Receiver<Vec<u8>>,
        watch::Sender<Option<u64>>,
    ) {
        let (tx, rx) = mpsc::channel(64);
        let (shutdown_tx, _) = watch::channel(false);
        let handle = ConnectionHandle::new("bot", tx, Arc::new(Notify::new()), shutdown_tx);
        let (seq_tx, seq_rx) = watch::channel(None);
        (HeartbeatScheduler::new(handle, seq_rx), rx, seq_tx)
    }

    fn drain(rx: &mut mpsc::Receiver<Vec<u8>>) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        while let Ok(data) = rx.try_recv() {
            out.push(serde_json::from_slice(&data).unwrap());
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_beats_with_latest_sequence() {
        let (mut hb, mut rx, seq) = scheduler();
        hb.start(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(150)).await;
        seq.send_replace(Some(3));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let beats = drain(&mut rx);
        assert_eq!(beats.len(), 2);
        assert_eq!(beats[0], serde_json::json!({"op": 1, "d": null}));
        assert_eq!(beats[1]["d"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_one_live_timer() {
        let (mut hb, mut rx, _seq) = scheduler();
        hb.start(Duration::from_millis(100));
        hb.start(Duration::from_millis(100));
        hb.start(Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(350)).await;

        assert_eq!(drain(&mut rx).len(), 3);
        assert!(hb.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_silences_timer() {
        let (mut hb, mut rx, _seq) = scheduler();
        hb.start(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        hb.stop();
        assert!(!hb.is_running());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(drain(&mut rx).len(), 1);
    }
}
