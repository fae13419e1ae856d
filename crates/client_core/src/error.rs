//! Store failure taxonomy and the single-slot reporter the UI reads from.

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

/// One variant per store operation, each with a fixed user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Failed to load documents.")]
    Fetch,
    #[error("Failed to create the document.")]
    Create,
    #[error("Failed to update the document.")]
    Update,
    #[error("Failed to delete the document.")]
    Delete,
    /// The caller cancelled the operation; nothing was applied.
    #[error("The operation was cancelled.")]
    Cancelled,
}

impl StoreError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, StoreError::Cancelled)
    }
}

/// Holds the most recent store failure, if any. Later failures overwrite
/// earlier ones; nothing is accumulated.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    last: Mutex<Option<StoreError>>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, error: StoreError) {
        *self.slot() = Some(error);
    }

    /// Returns `true` if an error was present.
    pub fn clear(&self) -> bool {
        self.slot().take().is_some()
    }

    pub fn last(&self) -> Option<StoreError> {
        *self.slot()
    }

    pub fn message(&self) -> Option<String> {
        self.last().map(|error| error.message())
    }

    fn slot(&self) -> MutexGuard<'_, Option<StoreError>> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
