//! Single-slot pause/resume rendezvous.
//!
//! A workflow suspends by calling [`SuspensionGate::suspend`] and awaiting the
//! returned [`PendingPause`]. At most one pause is outstanding at a time.
//! External actors (the pause prompt, `upsync continue`, Ctrl-C) hold a
//! cloned [`GateHandle`] and fulfil the pause exactly once. The slot is
//! emptied under the lock before the waiter is woken, so a pause can never
//! be fired twice.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Result, UpsyncError};

/// What the workflow is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseNotice {
    /// Unique per gate; lets a late answer recognise a pause it no longer owns.
    pub id: u64,
    /// Step title shown to the user.
    pub title: String,
    /// Instructions shown under the title.
    pub detail: Option<String>,
}

#[derive(Debug)]
enum Resolution {
    Continue,
    Reject(String),
}

struct Suspension {
    notice: PauseNotice,
    tx: oneshot::Sender<Resolution>,
}

/// Cloneable view of a gate for external actors.
#[derive(Clone, Default)]
pub struct GateHandle {
    slot: Arc<Mutex<Option<Suspension>>>,
}

impl std::fmt::Debug for GateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

impl GateHandle {
    fn lock(&self) -> MutexGuard<'_, Option<Suspension>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The outstanding pause, if any.
    pub fn pending(&self) -> Option<PauseNotice> {
        self.lock().as_ref().map(|s| s.notice.clone())
    }

    /// Whether a pause is outstanding.
    pub fn is_pending(&self) -> bool {
        self.lock().is_some()
    }

    /// Continue the outstanding pause. Returns `false` when nothing is paused.
    pub fn resolve_pending(&self) -> bool {
        self.fulfil(None, Resolution::Continue)
    }

    /// Fail the outstanding pause. Returns `false` when nothing is paused.
    pub fn reject_pending(&self, reason: &str) -> bool {
        self.fulfil(None, Resolution::Reject(reason.to_string()))
    }

    /// Continue only if pause `id` is still the outstanding one.
    pub fn resolve_if(&self, id: u64) -> bool {
        self.fulfil(Some(id), Resolution::Continue)
    }

    /// Reject only if pause `id` is still the outstanding one.
    pub fn reject_if(&self, id: u64, reason: &str) -> bool {
        self.fulfil(Some(id), Resolution::Reject(reason.to_string()))
    }

    fn fulfil(&self, expected: Option<u64>, resolution: Resolution) -> bool {
        let taken = {
            let mut slot = self.lock();
            match (slot.as_ref(), expected) {
                (Some(s), Some(id)) if s.notice.id != id => None,
                _ => slot.take(),
            }
        };

        match taken {
            Some(suspension) => {
                debug!(
                    "Pause '{}' fulfilled: {:?}",
                    suspension.notice.title, resolution
                );
                // Receiver gone means the waiter already gave up; nothing to wake.
                let _ = suspension.tx.send(resolution);
                true
            }
            None => {
                debug!("No paused step to fulfil");
                false
            }
        }
    }

    fn discard(&self, id: Option<u64>) -> Option<PauseNotice> {
        let mut slot = self.lock();
        match (slot.as_ref(), id) {
            (Some(s), Some(id)) if s.notice.id != id => None,
            _ => slot.take().map(|s| s.notice),
        }
    }
}

/// Owner side of the pause slot. One per workflow run.
#[derive(Debug, Default)]
pub struct SuspensionGate {
    handle: GateHandle,
    next_id: AtomicU64,
}

impl SuspensionGate {
    /// Create an empty gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for external actors.
    pub fn handle(&self) -> GateHandle {
        self.handle.clone()
    }

    /// Record a pause and return the future side of it.
    ///
    /// Fails with [`UpsyncError::SuspensionPending`] if a pause is already
    /// outstanding.
    pub fn suspend(&self, title: &str, detail: Option<&str>) -> Result<PendingPause> {
        let mut slot = self.handle.lock();
        if let Some(existing) = slot.as_ref() {
            return Err(UpsyncError::SuspensionPending {
                title: existing.notice.title.clone(),
            });
        }

        let notice = PauseNotice {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            title: title.to_string(),
            detail: detail.map(str::to_string),
        };
        let (tx, rx) = oneshot::channel();
        *slot = Some(Suspension {
            notice: notice.clone(),
            tx,
        });

        Ok(PendingPause {
            notice,
            rx,
            handle: self.handle.clone(),
        })
    }

    /// Drop any outstanding pause without answering it.
    ///
    /// The waiter, if still alive, observes a cancellation.
    pub fn abandon(&self) -> Option<PauseNotice> {
        self.handle.discard(None)
    }
}

/// The waiting side of a pause.
///
/// Dropping it before an answer arrives clears the slot, so a pause never
/// outlives the code that was waiting on it.
pub struct PendingPause {
    notice: PauseNotice,
    rx: oneshot::Receiver<Resolution>,
    handle: GateHandle,
}

impl PendingPause {
    /// The notice recorded for this pause.
    pub fn notice(&self) -> &PauseNotice {
        &self.notice
    }

    /// Wait for the pause to be continued or rejected.
    pub async fn wait(mut self) -> Result<()> {
        match (&mut self.rx).await {
            Ok(Resolution::Continue) => Ok(()),
            Ok(Resolution::Reject(reason)) => Err(UpsyncError::cancelled(reason)),
            Err(_) => Err(UpsyncError::cancelled(format!(
                "pause '{}' was abandoned",
                self.notice.title
            ))),
        }
    }
}

impl Drop for PendingPause {
    fn drop(&mut self) {
        if self.handle.discard(Some(self.notice.id)).is_some() {
            debug!("Discarded unanswered pause '{}'", self.notice.title);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolve_wakes_waiter() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Confirm merge", Some("target: main")).unwrap();
        assert_eq!(pending.notice().detail.as_deref(), Some("target: main"));

        assert!(gate.handle().resolve_pending());
        pending.wait().await.unwrap();
        assert!(!gate.handle().is_pending());
    }

    #[tokio::test]
    async fn reject_surfaces_user_cancelled() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("Confirm merge", None).unwrap();

        assert!(gate.handle().reject_pending("not today"));
        let err = pending.wait().await.unwrap_err();
        assert!(err.is_user_cancelled());
        assert!(err.to_string().contains("not today"));
    }

    #[test]
    fn second_suspend_is_rejected() {
        let gate = SuspensionGate::new();
        let _first = gate.suspend("first", None).unwrap();
        let err = gate.suspend("second", None).err().unwrap();
        assert!(matches!(err, UpsyncError::SuspensionPending { ref title } if title == "first"));
    }

    #[test]
    fn fulfil_without_pending_is_noop() {
        let gate = SuspensionGate::new();
        assert!(!gate.handle().resolve_pending());
        assert!(!gate.handle().reject_pending("nothing"));
    }

    #[test]
    fn pause_fires_once() {
        let gate = SuspensionGate::new();
        let _pending = gate.suspend("only once", None).unwrap();
        let handle = gate.handle();
        assert!(handle.resolve_pending());
        assert!(!handle.resolve_pending());
        assert!(!handle.reject_pending("late"));
    }

    #[test]
    fn stale_id_does_not_fulfil_newer_pause() {
        let gate = SuspensionGate::new();
        let first = gate.suspend("first", None).unwrap();
        let first_id = first.notice().id;
        gate.handle().resolve_pending();
        drop(first);

        let second = gate.suspend("second", None).unwrap();
        assert_ne!(second.notice().id, first_id);
        assert!(!gate.handle().resolve_if(first_id));
        assert!(gate.handle().is_pending());
        assert!(gate.handle().resolve_if(second.notice().id));
    }

    #[test]
    fn dropping_pending_clears_slot() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("walk away", None).unwrap();
        assert!(gate.handle().is_pending());
        drop(pending);
        assert!(!gate.handle().is_pending());
        assert!(gate.suspend("again", None).is_ok());
    }

    #[tokio::test]
    async fn abandon_cancels_waiter() {
        let gate = SuspensionGate::new();
        let pending = gate.suspend("orphan", None).unwrap();
        assert_eq!(gate.abandon().map(|n| n.title), Some("orphan".to_string()));
        let err = pending.wait().await.unwrap_err();
        assert!(err.is_user_cancelled());
    }

    #[tokio::test]
    async fn external_task_resolves() {
        let gate = SuspensionGate::new();
        let handle = gate.handle();
        let pending = gate.suspend("wait for actor", None).unwrap();

        let actor = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            handle.resolve_pending()
        });

        pending.wait().await.unwrap();
        assert!(actor.await.unwrap());
    }
}
