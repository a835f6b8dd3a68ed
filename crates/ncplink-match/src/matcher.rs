use std::collections::BTreeMap;

use serde_json::Value;

use crate::frame::Frame;
use crate::header::Header;

/// A predicate over frames: a header identity plus zero or more field
/// constraints.
///
/// A matcher with no constraints accepts every frame of its header. Adding
/// constraints narrows it. Matchers are immutable once built; they are only
/// ever compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMatcher {
    header: Header,
    constraints: BTreeMap<String, Value>,
}

impl CommandMatcher {
    /// Matcher accepting any frame with the given command ID.
    pub fn for_command(id: u16) -> Self {
        Self {
            header: Header::Command(id),
            constraints: BTreeMap::new(),
        }
    }

    /// Sentinel matcher accepting every frame regardless of header.
    pub fn catch_all() -> Self {
        Self {
            header: Header::CatchAll,
            constraints: BTreeMap::new(),
        }
    }

    /// Narrow this matcher: the named field must equal `value`.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(name.into(), value.into());
        self
    }

    /// Header identity of this matcher.
    pub fn header(&self) -> Header {
        self.header
    }

    /// Returns true if this is the catch-all sentinel.
    pub fn is_catch_all(&self) -> bool {
        self.header.is_catch_all()
    }

    /// The asymmetric covering relation: does this matcher accept everything
    /// `other` would accept?
    ///
    /// True when this is the catch-all, or when both headers are equal and
    /// every constraint here also appears in `other` with an equal value
    /// (fewer constraints = more general).
    pub fn matches(&self, other: &CommandMatcher) -> bool {
        if self.header.is_catch_all() {
            return true;
        }
        if self.header != other.header {
            return false;
        }
        self.constraints
            .iter()
            .all(|(name, value)| other.constraints.get(name) == Some(value))
    }

    /// Does an incoming frame satisfy this matcher?
    pub fn matches_frame<F: Frame>(&self, frame: &F) -> bool {
        if self.header.is_catch_all() {
            return true;
        }
        if self.header != frame.header() {
            return false;
        }
        self.constraints
            .iter()
            .all(|(name, value)| frame.field(name).as_ref() == Some(value))
    }
}
