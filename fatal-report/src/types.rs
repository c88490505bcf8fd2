//! Core types for the fatal-report library
//!
//! This module defines the callback type stored by the registry and the
//! errors the registry hands back to its callers. The dispatcher itself never
//! fails - it either returns or terminates the process.

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// A cleanup action run on the fatal path
///
/// Callbacks are plain function pointers: they take no arguments, return
/// nothing, and are identified by address.
pub type Callback = fn();

/// Exit status used when a fatal report terminates the process
pub const EXIT_FAILURE: i32 = 1;

/// Errors reported by the callback registry
///
/// None of these are fatal. A host that only cares whether the registry
/// changed can use [`RegistryError::is_benign_noop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("callback is already registered")]
    Duplicate,

    #[error("callback is not registered")]
    NotFound,

    #[error("unable to allocate storage for callback")]
    AllocationFailed,
}

impl RegistryError {
    /// True when the call was a no-op on a well-formed registry
    /// (duplicate registration or removing an unknown callback).
    pub fn is_benign_noop(&self) -> bool {
        matches!(self, RegistryError::Duplicate | RegistryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RegistryError::Duplicate.to_string(),
            "callback is already registered"
        );
        assert_eq!(
            RegistryError::NotFound.to_string(),
            "callback is not registered"
        );
    }

    #[test]
    fn test_benign_noop_classification() {
        assert!(RegistryError::Duplicate.is_benign_noop());
        assert!(RegistryError::NotFound.is_benign_noop());
        assert!(!RegistryError::AllocationFailed.is_benign_noop());
    }
}
