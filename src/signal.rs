use tokio::sync::broadcast;

const SIGNAL_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSignal {
    /// A refresh cycle stored a new token pair.
    Refreshed,
    /// The session was destroyed; the application should navigate to
    /// `redirect_to` (the login entry point).
    LoggedOut { redirect_to: String },
}

#[derive(Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<AuthSignal>,
}

impl SignalBus {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(SIGNAL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, signal: AuthSignal) {
        // No subscribers is fine; the signal is advisory.
        let _ = self.tx.send(signal);
    }
}
