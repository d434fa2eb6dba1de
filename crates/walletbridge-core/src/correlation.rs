//! Correlation table: in-flight request ids mapped to one-shot completions.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::warn;

use crate::rpc::JsonRpcResponse;

/// Maps every in-flight request id to the sender half of a one-shot channel.
///
/// Ids come from the bridge's monotonic counter, so at most one completion
/// ever exists per id. Delivery is at-most-once: `resolve` removes the entry
/// before fulfilling it.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    pending: Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pending completion for `id` and return the receiver the
    /// caller awaits on.
    pub fn register(&self, id: u64) -> oneshot::Receiver<JsonRpcResponse> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending.lock().expect("correlation table poisoned");
        if pending.insert(id, tx).is_some() {
            // Cannot happen with monotonic ids; the displaced caller sees a
            // closed channel.
            warn!("replaced an in-flight completion for request id {id}");
        }
        rx
    }

    /// Deliver a response to the completion registered for its id. Returns
    /// false when no entry exists (unknown, already settled, or stale), in
    /// which case the response is simply dropped.
    pub fn resolve(&self, id: u64, response: JsonRpcResponse) -> bool {
        let completion = self
            .pending
            .lock()
            .expect("correlation table poisoned")
            .remove(&id);
        match completion {
            // A send error means the caller gave up (e.g. timed out); that
            // still counts as settled.
            Some(tx) => {
                let _ = tx.send(response);
                true
            }
            None => false,
        }
    }

    /// Drop the completion for `id` without settling it. Used when a frame
    /// could not be handed to the peer after registration.
    pub fn remove(&self, id: u64) {
        self.pending
            .lock()
            .expect("correlation table poisoned")
            .remove(&id);
    }

    /// Drop every pending completion. Each waiting caller observes a closed
    /// channel. Used by the stop-on-disconnect teardown policy.
    pub fn fail_all(&self) {
        self.pending
            .lock()
            .expect("correlation table poisoned")
            .drain()
            .for_each(drop);
    }

    /// Number of requests currently awaiting a response.
    pub fn len(&self) -> usize {
        self.pending.lock().expect("correlation table poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
