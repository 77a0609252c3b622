use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool} not found; install it first")]
    NotFound { tool: String },
    #[error("{tool} {action} failed with {status}:\n{output}")]
    Failed {
        tool: String,
        action: String,
        status: String,
        output: String,
    },
}

impl ToolError {
    pub fn not_found(tool: &str) -> Self {
        ToolError::NotFound {
            tool: tool.to_string(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("remote name may only contain letters, digits, '-' and '_'")]
    InvalidRemoteName,
    #[error("{0} must not contain line breaks or control characters")]
    ControlCharacters(&'static str),
    #[error("unknown remote type '{0}' (expected b2 or s3)")]
    UnknownRemoteKind(String),
    #[error("invalid sync direction '{0}' (expected upload, download or bidirectional)")]
    InvalidDirection(String),
    #[error("{field} must be a number between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("remote '{0}' already exists")]
    DuplicateRemote(String),
    #[error("remote '{0}' not found")]
    RemoteNotFound(String),
    #[error("sync pair '{0}' already exists")]
    DuplicatePairName(String),
    #[error("local path {0} is already used by another sync pair")]
    DuplicateLocalPath(String),
    #[error("sync pair '{0}' not found")]
    PairNotFound(String),
    #[error("remote '{0}' is used by a sync pair; remove the pair first")]
    RemoteInUse(String),
}

#[derive(Debug, Error)]
pub enum LockError {
    #[error("backup already running (lock file {} present)", path.display())]
    Held { path: PathBuf },
}
