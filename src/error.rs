//! Application error type with a closed taxonomy of failure kinds.
//!
//! Soft failures (optimizer non-convergence, empty groups) are recorded on the
//! per-group results and never surface here; everything that does reach an
//! `AppError` aborts the run with full context in the message.

/// What went wrong, at the level callers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing configuration (flags, config file, option ranges).
    Config,
    /// Filesystem / serialization failure.
    Io,
    /// Input table violates the expected schema (missing column, non-numeric x).
    MalformedInput,
    /// Unknown model identifier.
    InvalidModel,
    /// Parameter vector with the wrong arity or non-finite entries.
    InvalidParameters,
    /// Log-likelihood evaluated on data outside its domain (e.g. correct > total).
    FitDomain,
    /// A partition key selected zero usable observations where some were required.
    EmptyGroup,
}

impl ErrorKind {
    /// Process exit code for this kind of failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::Io | ErrorKind::MalformedInput | ErrorKind::InvalidModel => 2,
            ErrorKind::EmptyGroup => 3,
            ErrorKind::InvalidParameters | ErrorKind::FitDomain => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
