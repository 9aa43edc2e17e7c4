//! Sorter-specific errors.

/// Errors that can occur during an external sort.
#[derive(Debug)]
pub enum SortError {
    /// Underlying I/O failure. Fatal; the sort cannot continue.
    Io(std::io::Error),

    /// `write` or `end_write` was called after the write phase closed.
    WriteAfterEnd,

    /// A phase method was called out of order: `begin_read` before
    /// `end_write`, or `read` before `begin_read`.
    OutOfPhase,

    /// `read` was called after the last record was consumed.
    Exhausted,
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortError::Io(e) => write!(f, "sort I/O error: {}", e),
            SortError::WriteAfterEnd => {
                write!(f, "write after the write phase was closed")
            }
            SortError::OutOfPhase => write!(f, "sort phase methods called out of order"),
            SortError::Exhausted => write!(f, "read past the last record"),
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SortError {
    fn from(e: std::io::Error) -> Self {
        SortError::Io(e)
    }
}
