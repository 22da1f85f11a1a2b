use std::error::Error;
use std::fmt::{self, Display};

/// Typed errors returned by the build pipeline. Every variant is fatal to the
/// build: there is no partial output and no resume.
#[derive(Debug)]
pub enum BuildError {
    /// Input lines are not grouped by their lower-cased leading character.
    SortOrder { key: String, line: u64 },
    /// File open / seek / read / write failure.
    Io(std::io::Error),
    /// A line could not be turned into an item. `line` is the 1-based line
    /// number in the input file, `line_in_span` counts from the group start.
    Parse {
        line: u64,
        line_in_span: u64,
        key: String,
        reason: String,
    },
    /// Artifact encoding failure.
    Serialization(String),
    /// Caller supplied an unusable parameter (e.g. zero shards).
    InvalidArgument(String),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::SortOrder { key, line } => write!(
                f,
                "input is not sorted: prefix {:?} reappears at line {}; sort the input \
                 case-insensitively first (e.g. `sort -f`)",
                key, line
            ),
            BuildError::Io(e) => write!(f, "io error: {}", e),
            BuildError::Parse {
                line,
                line_in_span,
                key,
                reason,
            } => write!(
                f,
                "error processing line #{} (line #{} of prefix {:?}): {}",
                line, line_in_span, key, reason
            ),
            BuildError::Serialization(s) => write!(f, "serialization error: {}", s),
            BuildError::InvalidArgument(s) => write!(f, "invalid argument: {}", s),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BuildError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}
