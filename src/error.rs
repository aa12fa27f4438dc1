use std::fmt;

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, NetworkError>;

/// All errors the engine can report.
#[derive(Debug)]
pub enum NetworkError {
    /// A vector did not have the length the network topology requires.
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Layer sizes that cannot describe a network (fewer than two, or a zero width).
    InvalidTopology(String),
    /// A bounded buffer reached its capacity.
    BufferOverflow { capacity: usize },
    /// Indexed access past the end of a buffer.
    IndexOutOfRange { index: usize, len: usize },
    /// A persisted model whose bytes do not describe a valid network.
    CorruptModel(String),
    /// An underlying I/O error.
    Io(std::io::Error),
    /// A JSON config or metadata file could not be (de)serialized.
    Json(serde_json::Error),
}

impl NetworkError {
    pub(crate) fn shape(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            context,
            expected,
            actual,
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                context,
                expected,
                actual,
            } => write!(f, "shape mismatch in {context}: expected length {expected}, got {actual}"),
            Self::InvalidTopology(msg) => write!(f, "invalid topology: {msg}"),
            Self::BufferOverflow { capacity } => {
                write!(f, "buffer is full (capacity {capacity})")
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for length {len}")
            }
            Self::CorruptModel(msg) => write!(f, "corrupt model file: {msg}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
