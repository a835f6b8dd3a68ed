use std::fmt;

use serde_json::Value;

use crate::header::Header;

/// The engine's view of a decoded protocol frame.
///
/// The embedding driver owns decoding; this trait exposes only what matching
/// needs: the header identity for coarse pre-filtering and named field values
/// for constraint checks.
pub trait Frame: fmt::Debug {
    /// Header identity of this frame (never [`Header::CatchAll`]).
    fn header(&self) -> Header;

    /// Value of a decoded field, or `None` if the frame has no such field.
    fn field(&self, name: &str) -> Option<Value>;
}
