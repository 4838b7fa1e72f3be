use thiserror::Error;

/// A single event that can't be placed in time. Skipped, never fatal to the day.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("event has neither a start/end range nor a touched_when time")]
    MissingTime,

    #[error("event range starting at {start}s has no end")]
    MissingEnd { start: i64 },

    #[error("event time {seconds}s is outside the representable range")]
    OutOfRange { seconds: i64 },
}

/// The payload isn't shaped like an energy history at all; nothing can be reported.
#[derive(Error, Debug)]
pub enum StructuralError {
    #[error("malformed history payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("history payload has no objects")]
    NoHistoryObject,

    #[error("unreadable day {day:?}")]
    BadDate {
        day: String,
        #[source]
        source: chrono::ParseError,
    },
}
