use thiserror::Error;

/// Result type alias using MigrateError
pub type Result<T> = std::result::Result<T, MigrateError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in log events and tests.
/// Kinds group the failure families a run can hit: configuration,
/// contention on the lock, remote store failures, a corrupted ledger value,
/// and failing subprocesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Configuration
    MissingCredential,
    MissingConfig,
    AmbiguousMigration,

    // Coordination
    /// The token-keyed lock record was already consumed or never existed
    LockContention,

    // Remote store
    ExternalService,
    Transport,

    // Ledger
    /// The persisted version scalar is not an integer
    StateCorruption,

    // Local execution
    Subprocess,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::MissingCredential => "ERR_MISSING_CREDENTIAL",
            ExErrorKind::MissingConfig => "ERR_MISSING_CONFIG",
            ExErrorKind::AmbiguousMigration => "ERR_AMBIGUOUS_MIGRATION",
            ExErrorKind::LockContention => "ERR_LOCK_CONTENTION",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Transport => "ERR_TRANSPORT",
            ExErrorKind::StateCorruption => "ERR_STATE_CORRUPTION",
            ExErrorKind::Subprocess => "ERR_SUBPROCESS",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification of a failure plus the operation it happened in.
/// Built from a [`MigrateError`] at logging boundaries.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Errors raised while sequencing migrations
///
/// Display strings are the exact messages printed by the CLI, so wrapping
/// variants prefix their cause rather than replacing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MigrateError {
    // ===== Configuration =====
    /// A required credential is absent from the environment
    #[error("missing {var} env var")]
    MissingCredential { var: String },

    /// No CircleCI project could be resolved for remote calls
    #[error(
        "missing CircleCI project: pass --project or set CIRCLE_PROJECT_SLUG \
         (or CIRCLE_PROJECT_USERNAME and CIRCLE_PROJECT_REPONAME)"
    )]
    MissingProject,

    /// More than one migration file claims the same version
    #[error("{count} files found with version {version}")]
    AmbiguousMigration { count: usize, version: u64 },

    /// The migrations directory could not be searched
    #[error("failed to find migration file: {reason}")]
    MigrationLookup { reason: String },

    // ===== Coordination =====
    /// No lock generation to acquire against, or another run consumed it
    #[error("lock not found")]
    LockNotFound,

    /// The store answered the lock delete with an unexpected status
    #[error("failed to lock: {status}\n{body}")]
    LockFailed { status: String, body: String },

    /// A release did not complete; the inner error names the failing write
    #[error("failed to unlock: {source}")]
    UnlockFailed { source: Box<MigrateError> },

    /// The OS random source could not produce a lock token
    #[error("failed to read random bytes: {reason}")]
    RandomSource { reason: String },

    // ===== Remote store =====
    /// The store rejected an environment variable write
    #[error("failed to set env in CircleCI: {status}\n{body}")]
    StoreRejected { status: String, body: String },

    /// The request never produced an HTTP response
    #[error("request to CircleCI failed: {message}")]
    Transport { message: String },

    // ===== Ledger =====
    /// The persisted version is not an integer
    #[error("failed to parse current version: {reason}")]
    InvalidVersion { value: String, reason: String },

    /// Writing the new version failed
    #[error("failed to set version: {source}")]
    SetVersionFailed { source: Box<MigrateError> },

    // ===== Local execution =====
    /// The backend file could not be moved aside
    #[error("failed to disable backend: {reason}")]
    BackendDisable { reason: String },

    /// `terraform init` did not succeed after disabling the backend
    #[error("failed to terraform init: {reason}")]
    BackendInit { reason: String },

    /// The migration script could not be started or exited non-zero
    #[error("failed to run migration: {reason}")]
    MigrationFailed { path: String, reason: String },

    /// Filesystem failure outside the cases above
    #[error("{op} failed: {reason}")]
    Io { op: String, reason: String },
}

impl MigrateError {
    /// Wrap a failed release step
    pub fn unlock_failed(source: MigrateError) -> Self {
        MigrateError::UnlockFailed {
            source: Box::new(source),
        }
    }

    /// Wrap a failed ledger write
    pub fn set_version_failed(source: MigrateError) -> Self {
        MigrateError::SetVersionFailed {
            source: Box::new(source),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            MigrateError::MissingCredential { .. } => ExErrorKind::MissingCredential,
            MigrateError::MissingProject => ExErrorKind::MissingConfig,
            MigrateError::AmbiguousMigration { .. } => ExErrorKind::AmbiguousMigration,
            MigrateError::MigrationLookup { .. } => ExErrorKind::Io,
            MigrateError::LockNotFound => ExErrorKind::LockContention,
            MigrateError::LockFailed { .. } => ExErrorKind::ExternalService,
            MigrateError::UnlockFailed { source } => source.kind(),
            MigrateError::RandomSource { .. } => ExErrorKind::Internal,
            MigrateError::StoreRejected { .. } => ExErrorKind::ExternalService,
            MigrateError::Transport { .. } => ExErrorKind::Transport,
            MigrateError::InvalidVersion { .. } => ExErrorKind::StateCorruption,
            MigrateError::SetVersionFailed { source } => source.kind(),
            MigrateError::BackendDisable { .. } => ExErrorKind::Io,
            MigrateError::BackendInit { .. } => ExErrorKind::Subprocess,
            MigrateError::MigrationFailed { .. } => ExErrorKind::Subprocess,
            MigrateError::Io { .. } => ExErrorKind::Io,
        }
    }
}

impl From<MigrateError> for ExError {
    fn from(err: MigrateError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match err {
            MigrateError::UnlockFailed { source } => ex.with_op("unlock").with_source((*source).into()),
            MigrateError::SetVersionFailed { source } => {
                ex.with_op("set_version").with_source((*source).into())
            }
            MigrateError::LockNotFound | MigrateError::LockFailed { .. } => ex.with_op("lock"),
            MigrateError::InvalidVersion { .. } => ex.with_op("current_version"),
            MigrateError::AmbiguousMigration { .. } | MigrateError::MigrationLookup { .. } => {
                ex.with_op("find_migration")
            }
            MigrateError::BackendDisable { .. } | MigrateError::BackendInit { .. } => {
                ex.with_op("disable_backend")
            }
            MigrateError::MigrationFailed { .. } => ex.with_op("run_migration"),
            _ => ex,
        }
    }
}

impl From<&MigrateError> for ExError {
    fn from(err: &MigrateError) -> Self {
        err.clone().into()
    }
}

/// Create an IO error for the named operation
pub fn io_error(op: &str, err: std::io::Error) -> MigrateError {
    MigrateError::Io {
        op: op.to_string(),
        reason: err.to_string(),
    }
}
