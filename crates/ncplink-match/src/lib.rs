//! Command matchers for NCP frame correlation.
//!
//! A matcher describes either a command that was sent or a filter over frames
//! a subscriber wants to see. Matchers form a partial order under
//! [`CommandMatcher::matches`]: a matcher with fewer field constraints covers
//! one with more, and the catch-all sentinel covers everything.
//! [`dedup_matchers`] collapses a matcher sequence to its maximal elements so
//! no frame is processed twice by overlapping matchers in one listener.

pub mod dedup;
pub mod frame;
pub mod header;
pub mod matcher;

pub use dedup::dedup_matchers;
pub use frame::Frame;
pub use header::Header;
pub use matcher::CommandMatcher;
