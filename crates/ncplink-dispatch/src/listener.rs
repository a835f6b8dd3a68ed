use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures_core::future::BoxFuture;
use ncplink_match::{dedup_matchers, CommandMatcher, Frame, Header};
use tracing::warn;

use crate::cell::{ResponseFuture, ResultCell};
use crate::error::{DispatchError, Result};

/// What an indication callback did with its frame.
pub enum CallbackFlow {
    /// Handled synchronously; nothing left to do.
    Complete,
    /// Work to run to completion independently of the dispatch loop.
    ///
    /// Spawned fire-and-forget on the ambient Tokio runtime; dispatch of
    /// subsequent listeners and frames never waits for it.
    Deferred(BoxFuture<'static, ()>),
}

/// Callback invoked by an indication listener for every matching frame.
pub type IndicationCallback<F> = Box<dyn Fn(F) -> CallbackFlow + Send + Sync>;

/// Deduplicated, non-empty matcher set with its cached header union.
#[derive(Debug)]
struct MatcherSet {
    matchers: Vec<CommandMatcher>,
    headers: BTreeSet<Header>,
}

impl MatcherSet {
    fn new(input: Vec<CommandMatcher>) -> Result<Self> {
        let matchers = dedup_matchers(input);
        if matchers.is_empty() {
            return Err(DispatchError::EmptyMatchers);
        }
        let headers = matchers.iter().map(CommandMatcher::header).collect();
        Ok(Self { matchers, headers })
    }

    fn matches_frame<F: Frame>(&self, frame: &F) -> bool {
        self.matchers
            .iter()
            .any(|matcher| matcher.matches_frame(frame))
    }
}

/// A registered observer: one or more matchers plus a resolution strategy.
///
/// One-shot listeners complete a waiting caller and are then spent;
/// indication listeners invoke a callback and remain active until the
/// registry removes them.
pub enum Listener<F> {
    /// Bridges exactly one matching frame to one waiting caller.
    OneShot(OneShotListener<F>),
    /// Invokes a callback for every matching frame, indefinitely.
    Indication(IndicationListener<F>),
}

impl<F: Frame + Clone> Listener<F> {
    /// Build a one-shot listener; the caller awaits the returned future.
    pub fn one_shot(matchers: Vec<CommandMatcher>) -> Result<(Self, ResponseFuture<F>)> {
        let (listener, response) = OneShotListener::new(matchers)?;
        Ok((Listener::OneShot(listener), response))
    }

    /// Build an indication listener around `callback`.
    pub fn indication(
        matchers: Vec<CommandMatcher>,
        callback: IndicationCallback<F>,
    ) -> Result<Self> {
        Ok(Listener::Indication(IndicationListener::new(
            matchers, callback,
        )?))
    }

    /// Union of the header identities of every held matcher, for O(1)
    /// pre-filtering before the full match pass.
    pub fn matching_headers(&self) -> &BTreeSet<Header> {
        &self.matcher_set().headers
    }

    /// The deduplicated matcher set this listener holds.
    pub fn matchers(&self) -> &[CommandMatcher] {
        &self.matcher_set().matchers
    }

    /// Offer an incoming frame to this listener.
    ///
    /// Returns false without side effects when no held matcher matches.
    /// Otherwise a one-shot delivers the frame to its waiter (false if it
    /// was already resolved or canceled) and an indication runs its callback
    /// and always reports true.
    pub fn resolve(&self, frame: &F) -> bool {
        if !self.matcher_set().matches_frame(frame) {
            return false;
        }
        match self {
            Listener::OneShot(one_shot) => one_shot.deliver(frame.clone()),
            Listener::Indication(indication) => indication.deliver(frame.clone()),
        }
    }

    /// Cancel this listener if its variant supports it.
    ///
    /// True only for a one-shot that has not resolved yet; indication
    /// listeners are removed by the registry, never canceled from within.
    pub fn cancel(&self) -> bool {
        match self {
            Listener::OneShot(one_shot) => one_shot.cancel(),
            Listener::Indication(_) => false,
        }
    }

    /// Variant name, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Listener::OneShot(_) => "one-shot",
            Listener::Indication(_) => "indication",
        }
    }

    fn matcher_set(&self) -> &MatcherSet {
        match self {
            Listener::OneShot(one_shot) => &one_shot.set,
            Listener::Indication(indication) => &indication.set,
        }
    }
}

/// Bridges exactly one matched frame to exactly one waiting caller.
#[derive(Debug)]
pub struct OneShotListener<F> {
    set: MatcherSet,
    cell: ResultCell<F>,
}

impl<F> OneShotListener<F> {
    /// Build from a matcher sequence (deduplicated here) and a fresh cell.
    ///
    /// Fails with [`DispatchError::EmptyMatchers`] on an empty sequence.
    pub fn new(matchers: Vec<CommandMatcher>) -> Result<(Self, ResponseFuture<F>)> {
        let set = MatcherSet::new(matchers)?;
        let (cell, response) = ResultCell::new();
        Ok((Self { set, cell }, response))
    }

    /// Cancel the pending response; true only if no frame matched yet.
    pub fn cancel(&self) -> bool {
        self.cell.cancel()
    }

    /// True while the waiter has neither received a frame nor canceled.
    pub fn is_pending(&self) -> bool {
        self.cell.is_pending()
    }

    fn deliver(&self, frame: F) -> bool {
        self.cell.complete(frame)
    }
}

/// Invokes a user callback for every matching frame, indefinitely.
pub struct IndicationListener<F> {
    set: MatcherSet,
    callback: IndicationCallback<F>,
}

impl<F> IndicationListener<F> {
    /// Build from a matcher sequence (deduplicated here) and a callback.
    ///
    /// Fails with [`DispatchError::EmptyMatchers`] on an empty sequence.
    pub fn new(matchers: Vec<CommandMatcher>, callback: IndicationCallback<F>) -> Result<Self> {
        let set = MatcherSet::new(matchers)?;
        Ok(Self { set, callback })
    }

    fn deliver(&self, frame: F) -> bool {
        // A misbehaving subscriber must never abort dispatch for the rest.
        match catch_unwind(AssertUnwindSafe(|| (self.callback)(frame))) {
            Ok(CallbackFlow::Complete) => {}
            Ok(CallbackFlow::Deferred(work)) => {
                tokio::spawn(work);
            }
            Err(payload) => {
                warn!(
                    headers = ?self.set.headers,
                    panic = panic_message(payload.as_ref()),
                    "indication callback panicked; dispatch continues"
                );
            }
        }
        true
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
