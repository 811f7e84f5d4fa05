use thiserror::Error;

/// Failures while turning a response page into records.
///
/// Blank fields are never errors; they become `None`. Anything in here aborts
/// the import.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("{field}: expected a number but found {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("{year}-{month}-{day} {hour}:{minute} is not a valid date and time")]
    InvalidTimestamp {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },
}
