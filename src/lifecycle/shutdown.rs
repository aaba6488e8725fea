//! Shutdown coordination.
//!
//! `Shutdown` is the sending side, held by whoever decides when the server
//! stops (`main`, tests, or the server for its own background tasks).
//! Each task waits on a `ShutdownListener`.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// `trigger` stops every listener without an OS signal, which is how tests
/// shut a server down. Dropping the coordinator counts as a trigger.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener::from(self.subscribe())
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Listeners that have not yet been dropped.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`Shutdown`].
pub struct ShutdownListener {
    rx: broadcast::Receiver<()>,
    triggered: bool,
}

impl ShutdownListener {
    /// Completes once shutdown has been triggered or the coordinator is gone.
    /// Returns immediately on every later call.
    pub async fn triggered(&mut self) {
        if self.triggered {
            return;
        }
        // Ok, Closed and Lagged all mean a trigger happened or can no longer happen.
        let _ = self.rx.recv().await;
        self.triggered = true;
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

impl From<broadcast::Receiver<()>> for ShutdownListener {
    fn from(rx: broadcast::Receiver<()>) -> Self {
        Self {
            rx,
            triggered: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_every_listener() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.listener();
        let mut b = shutdown.listener();
        assert_eq!(shutdown.receiver_count(), 2);
        assert!(!a.is_triggered());

        shutdown.trigger();
        a.triggered().await;
        b.triggered().await;
        assert!(a.is_triggered());

        // Already triggered listeners resolve again without a new message.
        tokio::time::timeout(Duration::from_secs(1), a.triggered())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_listeners() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();
        drop(shutdown);

        tokio::time::timeout(Duration::from_secs(1), listener.triggered())
            .await
            .unwrap();
        assert!(listener.is_triggered());
    }

    #[tokio::test]
    async fn test_untriggered_listener_keeps_waiting() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();

        let waited = tokio::time::timeout(Duration::from_millis(50), listener.triggered()).await;
        assert!(waited.is_err());
        assert!(!listener.is_triggered());
    }
}
