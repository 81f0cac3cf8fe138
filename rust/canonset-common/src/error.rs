use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns `true` for well-formed input that breaks a canon rule.
    pub fn is_canon_violation(&self) -> bool {
        matches!(self.kind(), ErrorKind::CanonViolation { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Malformed { .. })
    }

    pub fn malformed(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::Malformed {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn truncated(element: impl Into<String>) -> Error {
        Error::malformed(element, "unexpected end of buffer")
    }

    pub fn canon_violation(element: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::CanonViolation {
                element: element.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn capacity(resource: impl Into<String>, limit: u64) -> Error {
        Error(
            ErrorKind::Capacity {
                resource: resource.into(),
                limit,
            }
            .into(),
        )
    }

    pub fn dest_buffer_too_small(required: usize, available: usize) -> Error {
        Error(
            ErrorKind::DestBufferTooSmall {
                required,
                available,
            }
            .into(),
        )
    }

    pub fn unsupported_format(version: u64) -> Error {
        Error(ErrorKind::UnsupportedFormat { version }.into())
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Truncated or structurally broken input.
    #[error("malformed encoding at '{element}': {message}")]
    Malformed { element: String, message: String },

    /// Well-formed input that disagrees with a deterministic encoding rule.
    /// Indicates tampering or corruption of previously valid data.
    #[error("canonicity violation at '{element}': {message}")]
    CanonViolation { element: String, message: String },

    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("capacity exceeded for {resource} (limit {limit})")]
    Capacity { resource: String, limit: u64 },

    #[error("destination buffer is too small: {required} bytes required, {available} available")]
    DestBufferTooSmall { required: usize, available: usize },

    #[error("unsupported format version {version}")]
    UnsupportedFormat { version: u64 },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
