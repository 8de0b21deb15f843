use std::fmt;
use std::sync::Arc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// TableError
// ---------------------------------------------------------------------------

/// Defect-level failures from `EntityChangeTable` operations.
///
/// Domain-level conditions (empty entity, undo with no history) are silent
/// no-ops and never produce an error; only a bad row index gets here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("row index {index} out of range (table has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown share class \"{0}\"")]
    UnknownShareClass(String),
}

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// The original error returned by a caller-supplied fetch function.
///
/// Stored behind an `Arc` so every caller coalesced onto the same in-flight
/// operation can observe the same failure. `Display` and `source()` defer to
/// the underlying error, so callers see it unchanged.
#[derive(Debug, Clone)]
pub struct FetchError(Arc<dyn std::error::Error + Send + Sync>);

impl FetchError {
    pub fn new(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self(Arc::from(source))
    }

    /// The underlying error as supplied by the fetch function.
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync) {
        self.0.as_ref()
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let inner: &(dyn std::error::Error + 'static) = self.0.as_ref();
        Some(inner)
    }
}

// ---------------------------------------------------------------------------
// QueryError
// ---------------------------------------------------------------------------

/// Failures surfaced by `QueryDedupCache::get_or_fetch`.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// The supplied fetch function failed. Never retried or wrapped further.
    #[error(transparent)]
    Fetch(FetchError),

    /// The in-flight operation this caller coalesced onto was dropped
    /// before it settled (its driving future was cancelled). The key is
    /// released; a retry starts a fresh fetch.
    #[error("in-flight query was dropped before completing")]
    Dropped,
}

/// Result of a caller-supplied fetch function.
pub type FetchResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

// ---------------------------------------------------------------------------
// FilingError / Result
// ---------------------------------------------------------------------------

/// Umbrella error for the service layer.
#[derive(Debug, Error)]
pub enum FilingError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

pub type Result<T, E = FilingError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
