use thiserror::Error;

/// Errors crossing the boundary between market clients, the collector,
/// and the analyzer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    /// Network-level failure talking to an external market.
    #[error("transport error: {0}")]
    Transport(String),

    /// The market answered, but not with anything usable.
    #[error("unexpected response: {0}")]
    BadResponse(String),

    /// A quote or listing is missing required identifying fields or
    /// carries impossible values.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// A strategy tag that is neither "all" nor a known opportunity kind.
    #[error("unknown strategy tag: {0}")]
    UnknownStrategy(String),

    /// Reading or parsing a local file (config, snapshot) failed.
    #[error("io error: {0}")]
    Io(String),
}
