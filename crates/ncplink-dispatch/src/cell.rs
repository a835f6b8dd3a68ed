use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::DispatchError;

enum CellState<F> {
    Pending(oneshot::Sender<F>),
    Resolved,
    Canceled,
}

/// Single-assignment container bridging the dispatcher to one waiting caller.
///
/// Exactly one writer (the dispatcher) and one reader (the caller awaiting a
/// response). The reader may cancel before a value is written; a write after
/// cancellation, or a second write, is a benign race and a silent no-op.
pub struct ResultCell<F> {
    state: Mutex<CellState<F>>,
}

impl<F> ResultCell<F> {
    /// Create a fresh cell and the future its reader awaits.
    pub fn new() -> (Self, ResponseFuture<F>) {
        let (tx, rx) = oneshot::channel();
        let cell = Self {
            state: Mutex::new(CellState::Pending(tx)),
        };
        (cell, ResponseFuture { rx })
    }

    /// Deliver a frame to the reader.
    ///
    /// Returns false, leaving the cell untouched, if it was already resolved
    /// or canceled.
    pub fn complete(&self, frame: F) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, CellState::Resolved) {
            CellState::Pending(tx) => {
                // The reader may have dropped its future already; the frame
                // is discarded with it.
                let _ = tx.send(frame);
                true
            }
            CellState::Resolved => false,
            CellState::Canceled => {
                *state = CellState::Canceled;
                false
            }
        }
    }

    /// Cancel the pending read.
    ///
    /// Returns true only if no frame was delivered yet; the reader's future
    /// then yields [`DispatchError::Canceled`]. Returns false once resolved.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, CellState::Canceled) {
            // Dropping the sender wakes the reader with the cancellation.
            CellState::Pending(_tx) => true,
            CellState::Resolved => {
                *state = CellState::Resolved;
                false
            }
            CellState::Canceled => false,
        }
    }

    /// True while no frame was delivered and the reader has not canceled.
    pub fn is_pending(&self) -> bool {
        matches!(&*self.lock(), CellState::Pending(_))
    }

    fn lock(&self) -> MutexGuard<'_, CellState<F>> {
        // Cell state stays consistent across a panicking writer.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F> fmt::Debug for ResultCell<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.lock() {
            CellState::Pending(_) => "pending",
            CellState::Resolved => "resolved",
            CellState::Canceled => "canceled",
        };
        f.debug_struct("ResultCell").field("state", &state).finish()
    }
}

/// Awaited by the caller of a one-shot request.
///
/// Resolves to the first frame the dispatcher delivered, or to
/// [`DispatchError::Canceled`] if the listener was canceled or torn down
/// first. Timeouts are the caller's concern, layered on top (for example
/// with `tokio::time::timeout`).
#[derive(Debug)]
pub struct ResponseFuture<F> {
    rx: oneshot::Receiver<F>,
}

impl<F> Future for ResponseFuture<F> {
    type Output = Result<F, DispatchError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.map_err(|_| DispatchError::Canceled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn complete_delivers_to_reader() {
        let (cell, response) = ResultCell::new();

        assert!(cell.is_pending());
        assert!(cell.complete(42u32));
        assert!(!cell.is_pending());
        assert_eq!(response.await, Ok(42));
    }

    #[tokio::test]
    async fn second_complete_is_a_noop() {
        let (cell, response) = ResultCell::new();

        assert!(cell.complete("first"));
        assert!(!cell.complete("second"));
        assert_eq!(response.await, Ok("first"));
    }

    #[tokio::test]
    async fn cancel_before_complete_suppresses_delivery() {
        let (cell, response) = ResultCell::<u32>::new();

        assert!(cell.cancel());
        assert!(!cell.complete(7));
        assert_eq!(response.await, Err(DispatchError::Canceled));
    }

    #[test]
    fn cancel_after_complete_returns_false() {
        let (cell, _response) = ResultCell::new();

        assert!(cell.complete(1u8));
        assert!(!cell.cancel());
    }

    #[test]
    fn cancel_twice_second_is_a_noop() {
        let (cell, _response) = ResultCell::<u8>::new();

        assert!(cell.cancel());
        assert!(!cell.cancel());
    }

    #[test]
    fn complete_with_dropped_reader_still_counts_as_resolved() {
        let (cell, response) = ResultCell::new();
        drop(response);

        assert!(cell.complete(5u8));
        assert!(!cell.complete(6u8));
    }

    #[test]
    fn debug_reports_state() {
        let (cell, _response) = ResultCell::<u8>::new();
        assert!(format!("{cell:?}").contains("pending"));
        cell.cancel();
        assert!(format!("{cell:?}").contains("canceled"));
    }
}
