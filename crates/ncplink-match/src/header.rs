use std::fmt;

/// Identity of a protocol message type, used for coarse pre-filtering.
///
/// The catch-all sentinel is distinct from every `Command` value and sorts
/// after all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Header {
    /// A concrete protocol message type ID.
    Command(u16),
    /// Sentinel identity of the catch-all matcher.
    CatchAll,
}

impl Header {
    /// Returns true if this is the catch-all sentinel.
    pub fn is_catch_all(self) -> bool {
        matches!(self, Header::CatchAll)
    }

    /// The raw protocol ID, if this is a concrete command header.
    pub fn command_id(self) -> Option<u16> {
        match self {
            Header::Command(id) => Some(id),
            Header::CatchAll => None,
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Header::Command(id) => write!(f, "0x{id:04X}"),
            Header::CatchAll => write!(f, "catch-all"),
        }
    }
}

impl From<u16> for Header {
    fn from(id: u16) -> Self {
        Header::Command(id)
    }
}
