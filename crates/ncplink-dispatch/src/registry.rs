use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ncplink_match::{CommandMatcher, Frame, Header};
use tracing::{debug, trace};

use crate::cell::ResponseFuture;
use crate::error::Result;
use crate::listener::{IndicationCallback, Listener};

/// Handle to a registered listener, used for explicit unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Active listeners of one NCP connection.
///
/// Frames are offered to listeners in registration order. Dispatch snapshots
/// the listener list before iterating, so registration and removal are safe
/// while a dispatch pass is running on another task.
pub struct DispatchRegistry<F> {
    listeners: Mutex<Vec<(ListenerId, Arc<Listener<F>>)>>,
    next_id: AtomicU64,
}

impl<F: Frame + Clone> DispatchRegistry<F> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a one-shot listener for a request that was just issued.
    ///
    /// The returned future resolves with the first matching frame; the entry
    /// removes itself from dispatch once it resolves.
    pub fn register_one_shot(
        &self,
        matchers: Vec<CommandMatcher>,
    ) -> Result<(ListenerId, ResponseFuture<F>)> {
        let (listener, response) = Listener::one_shot(matchers)?;
        let id = self.insert(listener);
        Ok((id, response))
    }

    /// Register an indication listener; `callback` runs for every matching
    /// frame until [`DispatchRegistry::remove`] is called with the id.
    pub fn register_indication(
        &self,
        matchers: Vec<CommandMatcher>,
        callback: IndicationCallback<F>,
    ) -> Result<ListenerId> {
        let listener = Listener::indication(matchers, callback)?;
        Ok(self.insert(listener))
    }

    /// Offer a decoded frame to every active listener, in registration
    /// order. Returns how many listeners handled it.
    ///
    /// One-shot listeners that resolve here are removed. Listeners whose
    /// header set cannot contain the frame's header are skipped without
    /// running their matchers.
    pub fn dispatch(&self, frame: &F) -> usize {
        let snapshot: Vec<(ListenerId, Arc<Listener<F>>)> = self.lock().clone();
        let header = frame.header();

        let mut handled = 0usize;
        let mut spent: Vec<ListenerId> = Vec::new();
        for (id, listener) in &snapshot {
            let headers = listener.matching_headers();
            if !headers.contains(&header) && !headers.contains(&Header::CatchAll) {
                continue;
            }
            if listener.resolve(frame) {
                handled += 1;
                if matches!(listener.as_ref(), Listener::OneShot(_)) {
                    spent.push(*id);
                }
            }
        }

        if !spent.is_empty() {
            self.lock().retain(|(id, _)| !spent.contains(id));
        }

        trace!(%header, handled, resolved = spent.len(), "frame dispatched");
        handled
    }

    /// Remove a listener from active dispatch.
    ///
    /// A still-pending one-shot is canceled so its waiter resumes with
    /// [`crate::DispatchError::Canceled`]. Returns false for an unknown or
    /// already-removed id.
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.lock();
            match listeners.iter().position(|(entry_id, _)| *entry_id == id) {
                Some(index) => Some(listeners.remove(index).1),
                None => None,
            }
        };
        match removed {
            Some(listener) => {
                listener.cancel();
                debug!(listener = %id, kind = listener.kind(), "listener removed");
                true
            }
            None => false,
        }
    }

    /// Remove every listener, canceling pending one-shots. Used on
    /// transport teardown.
    pub fn clear(&self) {
        let drained: Vec<(ListenerId, Arc<Listener<F>>)> = self.lock().drain(..).collect();
        for (_, listener) in &drained {
            listener.cancel();
        }
        debug!(removed = drained.len(), "registry cleared");
    }

    /// Number of active listeners.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn insert(&self, listener: Listener<F>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        debug!(listener = %id, kind = listener.kind(), "listener registered");
        self.lock().push((id, Arc::new(listener)));
        id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Arc<Listener<F>>)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F: Frame + Clone> Default for DispatchRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}
