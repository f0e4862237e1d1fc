use thiserror::Error;

/// Primary error type for libris operations.
///
/// Catalog operations (borrow, return, remove, queries) never produce one of
/// these: their failure paths are explicit outcome variants. Errors come from
/// the command driver, configuration validation, and index integrity checks.
#[derive(Error, Debug)]
pub enum LibrisError {
    // === I/O Errors ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Command Errors ===
    /// A command line could not be parsed.
    #[error("line {line}: {detail}")]
    Parse { line: usize, detail: String },

    /// A command name is not recognized.
    #[error("line {line}: unknown command `{name}`")]
    UnknownCommand { line: usize, name: String },

    // === Configuration Errors ===
    /// A configuration value is out of its permitted range.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    // === Integrity Errors ===
    /// The index failed a structural invariant check.
    #[error("index integrity check failed: {detail}")]
    IndexCorrupt { detail: String },

    // === Internal Errors ===
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    Error = 1,
    Internal = 2,
    IoErr = 10,
    Corrupt = 11,
    Misuse = 21,
}

impl LibrisError {
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoErr,
            Self::Parse { .. } | Self::UnknownCommand { .. } => ErrorCode::Error,
            Self::InvalidConfig { .. } => ErrorCode::Misuse,
            Self::IndexCorrupt { .. } => ErrorCode::Corrupt,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io(_)
                | Self::Parse { .. }
                | Self::UnknownCommand { .. }
                | Self::InvalidConfig { .. }
        )
    }

    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Parse { .. } => Some("Commands take the form `Name(arg, ...)`, one per line"),
            Self::UnknownCommand { .. } => Some(
                "Known commands: InsertBook, PrintBook, PrintBooks, FindClosestBook, \
                 BorrowBook, ReturnBook, DeleteBook, ColorFlipCount, Quit",
            ),
            Self::InvalidConfig { .. } => Some("Waitlist capacity must be at least 1"),
            Self::IndexCorrupt { .. } | Self::Internal(_) => {
                Some("This is a bug; please report it with the command file that triggered it")
            }
            Self::Io(_) => None,
        }
    }

    /// Build a parse error for the given 1-based line number.
    pub fn parse(line: usize, detail: impl Into<String>) -> Self {
        Self::Parse {
            line,
            detail: detail.into(),
        }
    }

    /// Build an integrity error.
    pub fn corrupt(detail: impl Into<String>) -> Self {
        Self::IndexCorrupt {
            detail: detail.into(),
        }
    }

    /// Process exit code for the command-line driver.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LibrisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_includes_line() {
        let err = LibrisError::parse(7, "expected 3 arguments, got 2");
        assert_eq!(err.to_string(), "line 7: expected 3 arguments, got 2");
        assert_eq!(err.error_code(), ErrorCode::Error);
        assert!(err.is_user_recoverable());
    }

    #[test]
    fn unknown_command_display() {
        let err = LibrisError::UnknownCommand {
            line: 3,
            name: "LendBook".to_owned(),
        };
        assert_eq!(err.to_string(), "line 3: unknown command `LendBook`");
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn corrupt_is_not_recoverable() {
        let err = LibrisError::corrupt("red node 5 has red child 3");
        assert_eq!(err.error_code(), ErrorCode::Corrupt);
        assert!(!err.is_user_recoverable());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err: LibrisError = io.into();
        assert_eq!(err.error_code(), ErrorCode::IoErr);
        assert!(err.suggestion().is_none());
    }

    #[test]
    fn invalid_config_exit_code() {
        let err = LibrisError::InvalidConfig {
            detail: "waitlist_capacity must be > 0".to_owned(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.error_code(), ErrorCode::Misuse);
    }
}
