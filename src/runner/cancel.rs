//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::info;

use super::gate::GateHandle;

/// Stops a workflow at the next step boundary.
///
/// Cancelling also rejects the pending pause, so a paused workflow stops
/// right away. An in-flight command is never interrupted.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
    gate: GateHandle,
}

impl CancelToken {
    pub fn new(gate: GateHandle) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            reason: Arc::new(Mutex::new(None)),
            gate,
        }
    }

    /// Request cancellation. Only the first reason is kept.
    pub fn cancel(&self, reason: &str) {
        if !self.flag.swap(true, Ordering::SeqCst) {
            info!("Cancellation requested: {}", reason);
            let mut slot = self.reason.lock().unwrap_or_else(|e| e.into_inner());
            *slot = Some(reason.to_string());
        }
        self.gate.reject_pending(reason);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<String> {
        self.reason
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::gate::SuspensionGate;

    #[test]
    fn cancel_sets_flag_and_keeps_first_reason() {
        let gate = SuspensionGate::new();
        let token = CancelToken::new(gate.handle());
        assert!(!token.is_cancelled());

        token.cancel("interrupted");
        token.cancel("again");
        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("interrupted"));
    }

    #[tokio::test]
    async fn cancel_rejects_pending_pause() {
        let gate = SuspensionGate::new();
        let token = CancelToken::new(gate.handle());
        let pending = gate.suspend("Confirm merge", None).unwrap();

        token.clone().cancel("interrupted");
        let err = pending.wait().await.unwrap_err();
        assert!(err.is_user_cancelled());
        assert!(!gate.handle().is_pending());
    }
}
