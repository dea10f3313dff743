//! Broadcast shutdown signal built on channel disconnection.
//!
//! Nothing is ever sent on the channel. Triggering drops the only sender, so
//! every current and future `recv` on a listener returns immediately. That
//! makes the signal usable as one arm of a `select!` next to the task queue.
//! Dropping every trigger without calling [`ShutdownTrigger::trigger`] has
//! the same effect.

use crossbeam::channel::{Receiver, Sender, TryRecvError, bounded};
use std::sync::{Arc, Mutex, PoisonError};

/// Create a connected trigger/listener pair
pub fn channel() -> (ShutdownTrigger, ShutdownListener) {
    let (sender, receiver) = bounded(0);
    (
        ShutdownTrigger {
            sender: Arc::new(Mutex::new(Some(sender))),
        },
        ShutdownListener { receiver },
    )
}

/// Fires the shutdown broadcast. Cheap to clone; every clone fires the same signal.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    sender: Arc<Mutex<Option<Sender<()>>>>,
}

impl ShutdownTrigger {
    /// Release every listener. Idempotent: returns `true` only for the call
    /// that actually fired the signal.
    pub fn trigger(&self) -> bool {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        guard.take().is_some()
    }

    pub fn is_triggered(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// Observes the shutdown broadcast
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    receiver: Receiver<()>,
}

impl ShutdownListener {
    /// Non-blocking check
    pub fn is_triggered(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block until shutdown fires
    pub fn wait(&self) {
        let _ = self.receiver.recv();
    }

    /// Channel to wait on inside `select!`; becomes ready (disconnected) on shutdown
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}
