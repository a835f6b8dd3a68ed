//! Listener registry and response correlation for NCP frame dispatch.
//!
//! This is the layer between "a frame arrived" and "who cares about it".
//! Request-issuing code registers a one-shot listener and awaits its
//! [`ResponseFuture`]; subscribers register indication listeners with a
//! callback. The [`DispatchRegistry`] walks active listeners for every
//! decoded frame, completes waiting callers, and drops spent one-shot
//! entries.

pub mod cell;
pub mod error;
pub mod listener;
pub mod registry;

pub use cell::{ResponseFuture, ResultCell};
pub use error::{DispatchError, Result};
pub use listener::{
    CallbackFlow, IndicationCallback, IndicationListener, Listener, OneShotListener,
};
pub use registry::{DispatchRegistry, ListenerId};
