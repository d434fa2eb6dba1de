//! Single-occupancy slot for the active wallet connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};

use crate::error::{BridgeError, Result};

/// Handle for one accepted wallet connection.
///
/// The transport layer drains `outbound` into the socket and calls
/// `vacate(generation)` when the connection closes. The generation tag keeps
/// a late close of a replaced connection from evicting a newer occupant.
#[derive(Debug)]
pub struct PeerSession {
    pub generation: u64,
    pub outbound: mpsc::UnboundedReceiver<String>,
}

#[derive(Debug)]
struct ActivePeer {
    generation: u64,
    tx: mpsc::UnboundedSender<String>,
}

/// Holds zero or one live wallet connection.
///
/// A second `accept` while the slot is occupied is rejected without touching
/// the occupant. Waiters parked in [`PeerSlot::wait_connected`] are woken as
/// soon as a connection is accepted.
#[derive(Debug, Default)]
pub struct PeerSlot {
    active: Mutex<Option<ActivePeer>>,
    connected: Notify,
    generations: AtomicU64,
}

impl PeerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy the slot if it is empty, returning the new session. Fails with
    /// [`BridgeError::WalletAlreadyConnected`] while a live occupant exists.
    pub fn accept(&self) -> Result<PeerSession> {
        let mut active = self.active.lock().expect("peer slot poisoned");
        if let Some(peer) = active.as_ref() {
            // A closed channel means the occupant's transport task already
            // died without vacating; treat the slot as free.
            if !peer.tx.is_closed() {
                return Err(BridgeError::WalletAlreadyConnected);
            }
        }
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, outbound) = mpsc::unbounded_channel();
        *active = Some(ActivePeer { generation, tx });
        drop(active);
        self.connected.notify_waiters();
        Ok(PeerSession {
            generation,
            outbound,
        })
    }

    /// Forward one serialized frame to the current occupant.
    pub fn send(&self, frame: String) -> Result<()> {
        let active = self.active.lock().expect("peer slot poisoned");
        match active.as_ref() {
            Some(peer) if !peer.tx.is_closed() => peer
                .tx
                .send(frame)
                .map_err(|_| BridgeError::NoWalletConnected),
            _ => Err(BridgeError::NoWalletConnected),
        }
    }

    /// Whether a ready occupant exists.
    pub fn is_connected(&self) -> bool {
        self.active
            .lock()
            .expect("peer slot poisoned")
            .as_ref()
            .is_some_and(|peer| !peer.tx.is_closed())
    }

    /// Clear the slot if `generation` still owns it. Returns true when the
    /// slot was actually vacated.
    pub fn vacate(&self, generation: u64) -> bool {
        let mut active = self.active.lock().expect("peer slot poisoned");
        if active.as_ref().is_some_and(|p| p.generation == generation) {
            *active = None;
            true
        } else {
            false
        }
    }

    /// Wait until the slot is occupied. Wakes on accept notification, with
    /// `poll` as a fallback tick. Returns immediately if already connected.
    pub async fn wait_connected(&self, poll: Duration) {
        loop {
            // Arm the notification before re-checking so an accept between
            // the check and the await is not missed.
            let notified = self.connected.notified();
            if self.is_connected() {
                return;
            }
            tokio::select! {
                _ = notified => {}
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }
}
