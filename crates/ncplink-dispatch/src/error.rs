/// Errors from listener construction and response waiting.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A listener was constructed with zero matchers (caller bug).
    #[error("listener requires at least one matcher")]
    EmptyMatchers,

    /// The one-shot request was canceled before a matching frame arrived.
    #[error("response canceled before a matching frame arrived")]
    Canceled,
}

pub type Result<T> = std::result::Result<T, DispatchError>;
