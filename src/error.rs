use thiserror::Error;

/// Failure categories surfaced by the generation pipeline.
///
/// Every kind is terminal for the invocation. All but `Interrupted` map to the same exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Option,
    Value,
    Password,
    Generate,
    Clipboard,
    Interrupted,
    Io,
}

#[derive(Error, Debug)]
pub enum Error {
    /// Grammar violation or unknown flag. `reason` is diagnostic only.
    #[error("Unrecognized or incorrect options specified")]
    Option { reason: &'static str },

    #[error("Cannot set {field} value to {value}")]
    Value { field: &'static str, value: i64 },

    #[error("Failed to read the password")]
    Password,

    #[error("Password generator returned error code {0}")]
    Generate(i32),

    #[error("Cannot copy to clipboard")]
    Clipboard,

    #[error("Interrupted")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Option { .. } => ErrorKind::Option,
            Error::Value { .. } => ErrorKind::Value,
            Error::Password => ErrorKind::Password,
            Error::Generate(_) => ErrorKind::Generate,
            Error::Clipboard => ErrorKind::Clipboard,
            Error::Interrupted => ErrorKind::Interrupted,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}
