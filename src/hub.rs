//! Change-notification hub for live viewers.
//!
//! Signals carry no payload: subscribers learn that a buffer mutated and
//! re-fetch the snapshot they care about. Any number of mutations between
//! two observations collapse into a single wake-up, so a slow subscriber
//! may skip intermediate states but never misses that something changed.

use tokio::sync::watch;

/// The two signal channels the store mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogChannel {
    Console,
    Network,
}

/// Subscription handle for one channel.
///
/// Await [`watch::Receiver::changed`] to observe the next mutation signal.
/// Dropping the handle unsubscribes; this is safe at any time, including
/// while a notification is being delivered.
pub type ChangeListener = watch::Receiver<u64>;

/// Process-wide fan-out point for store mutation signals.
#[derive(Debug)]
pub struct ChangeHub {
    console: watch::Sender<u64>,
    network: watch::Sender<u64>,
}

impl ChangeHub {
    #[must_use]
    pub fn new() -> Self {
        let (console, _) = watch::channel(0);
        let (network, _) = watch::channel(0);
        Self { console, network }
    }

    /// Signal that the given channel's buffer mutated.
    pub fn notify(&self, channel: LogChannel) {
        self.sender(channel).send_modify(|version| {
            *version = version.wrapping_add(1);
        });
    }

    /// Register a listener for the given channel.
    #[must_use]
    pub fn subscribe(&self, channel: LogChannel) -> ChangeListener {
        self.sender(channel).subscribe()
    }

    /// Number of live listeners on the given channel.
    #[must_use]
    pub fn listeners(&self, channel: LogChannel) -> usize {
        self.sender(channel).receiver_count()
    }

    fn sender(&self, channel: LogChannel) -> &watch::Sender<u64> {
        match channel {
            LogChannel::Console => &self.console,
            LogChannel::Network => &self.network,
        }
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}
