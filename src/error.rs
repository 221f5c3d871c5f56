//! Faults that can be detected in the columnar event data

// Variant fields are self-explanatory given the error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Data-integrity fault
///
/// None of these can be recovered from: a run which encounters one is aborted
/// rather than allowed to produce histograms from truncated objects.
///
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataError {
    /// A column required by an object category is absent from the store
    #[error("column `{0}` is absent from the event store")]
    MissingColumn(String),

    /// A column does not hold the kind of data which was requested
    #[error("column `{name}` holds {found} data, but {expected} data was requested")]
    ColumnType {
        name: String,
        found: &'static str,
        expected: &'static str,
    },

    /// A column does not hold one entry per event
    #[error("column `{name}` has {len} entries, but the store holds {num_events} events")]
    ColumnLength {
        name: String,
        len: usize,
        num_events: usize,
    },

    /// A column could not be decoded from the input tree
    #[error("column `{name}` could not be read: {reason}")]
    UnreadableColumn { name: String, reason: String },

    /// A per-event array is shorter than its declared object count
    #[error("column `{column}` has {len} values in event {event}, cannot read index {index}")]
    ShortArray {
        column: String,
        event: usize,
        index: usize,
        len: usize,
    },

    /// An object count field holds a negative value
    #[error("count column `{column}` is negative ({value}) in event {event}")]
    NegativeCount {
        column: String,
        event: usize,
        value: i32,
    },

    /// An event outside of the store was requested
    #[error("event {event} is out of range, the store holds {num_events} events")]
    EventOutOfRange { event: usize, num_events: usize },
}
