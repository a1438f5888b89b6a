use std::fmt;
use std::path::PathBuf;

/// Machine-readable error codes surfaced by the CLI in JSON mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    CatalogMissing,
    InvalidTimeZone,
    InvalidBackup,
    ValidationFailed,
    TaskNotFound,
    PersonRequired,
    RemoteUnavailable,
    RemoteRequestFailed,
    StoreIo,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::CatalogMissing => "E1003",
            Self::InvalidTimeZone => "E1004",
            Self::InvalidBackup => "E1005",
            Self::ValidationFailed => "E2001",
            Self::TaskNotFound => "E2002",
            Self::PersonRequired => "E2003",
            Self::RemoteUnavailable => "E4001",
            Self::RemoteRequestFailed => "E4002",
            Self::StoreIo => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Household not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::CatalogMissing => "Task catalog not found",
            Self::InvalidTimeZone => "Unknown time zone",
            Self::InvalidBackup => "Invalid backup document",
            Self::ValidationFailed => "Input validation failed",
            Self::TaskNotFound => "Task not found",
            Self::PersonRequired => "No current user selected",
            Self::RemoteUnavailable => "Remote log store unavailable",
            Self::RemoteRequestFailed => "Remote log store request failed",
            Self::StoreIo => "Local store I/O failure",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `hearth init` to set up this household."),
            Self::ConfigParseError => Some("Fix syntax in .hearth/config.toml and retry."),
            Self::CatalogMissing => {
                Some("Point [catalog].path in .hearth/config.toml at a catalog JSON file.")
            }
            Self::InvalidTimeZone => Some("Use an IANA zone name such as America/Mexico_City."),
            Self::InvalidBackup => Some("Backups must contain a `logs` array."),
            Self::ValidationFailed => None,
            Self::TaskNotFound => Some("Run `hearth task list` to see task ids."),
            Self::PersonRequired => Some("Pick a user with `hearth user <id>`."),
            Self::RemoteUnavailable => Some("Check the cloud section of the catalog."),
            Self::RemoteRequestFailed => {
                Some("Nothing was saved. Retry once the connection is back.")
            }
            Self::StoreIo => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `hearth` process finishes."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors produced by the hearth core.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error("household not initialized at {0}")]
    NotInitialized(PathBuf),

    #[error("failed to parse {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    #[error("catalog not found at {0}")]
    CatalogMissing(PathBuf),

    #[error("unknown time zone '{0}'")]
    InvalidTimeZone(String),

    #[error("invalid backup: {0}")]
    InvalidBackup(String),

    #[error("{0}")]
    Validation(String),

    #[error("task '{0}' not found")]
    TaskNotFound(String),

    #[error("no current user selected")]
    PersonRequired,

    #[error("remote log store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("remote request failed: {0}")]
    Remote(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lock error: {0}")]
    Lock(#[from] crate::lock::LockError),
}

impl HearthError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::ConfigParse { .. } | Self::Json(_) => ErrorCode::ConfigParseError,
            Self::CatalogMissing(_) => ErrorCode::CatalogMissing,
            Self::InvalidTimeZone(_) => ErrorCode::InvalidTimeZone,
            Self::InvalidBackup(_) => ErrorCode::InvalidBackup,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::TaskNotFound(_) => ErrorCode::TaskNotFound,
            Self::PersonRequired => ErrorCode::PersonRequired,
            Self::RemoteUnavailable(_) => ErrorCode::RemoteUnavailable,
            Self::Remote(_) => ErrorCode::RemoteRequestFailed,
            Self::Io(_) => ErrorCode::StoreIo,
            Self::Lock(err) => err.code(),
        }
    }

    /// Stable string form of [`Self::code`].
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.code().code()
    }

    /// Remediation text, falling back to the code's summary.
    #[must_use]
    pub fn suggestion(&self) -> String {
        let code = self.code();
        code.hint().unwrap_or(code.message()).to_string()
    }
}

pub type Result<T> = std::result::Result<T, HearthError>;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// A user-facing notification. Session operations return these instead of
/// propagating validation and remote failures.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}
