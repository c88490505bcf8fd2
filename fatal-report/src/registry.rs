//! Cleanup-callback registry
//!
//! The registry holds the cleanup actions that must run before a fatal report
//! terminates the process. Entries are kept most-recent-first, so the action
//! registered last is the first one to run: resources acquired later are
//! released earlier.
//!
//! The registry is an ordinary value owned by the host. Its constructor is
//! `const`, so a host that wants exactly one registry per process can keep it
//! in a `static`:
//!
//! ```
//! use fatal_report::CallbackRegistry;
//!
//! static CLEANUP: CallbackRegistry = CallbackRegistry::new();
//!
//! fn restore_terminal() {}
//!
//! CLEANUP.register(restore_terminal).unwrap();
//! assert_eq!(CLEANUP.drain_and_invoke(), 1);
//! assert!(CLEANUP.is_empty());
//! ```

use crate::types::{Callback, RegistryError, Result};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered set of cleanup callbacks, drained on the fatal path
///
/// The lock is only held while the entry list itself is read or modified,
/// never while a callback runs. A callback may therefore register or
/// deregister callbacks on the same registry while it is being drained.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    /// Front is the most recently registered entry
    entries: Mutex<VecDeque<Callback>>,
}

impl CallbackRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Register a callback to be run when a fatal report is raised
    ///
    /// # Returns
    /// * `Ok(())` - the callback was added and will run before every
    ///   callback registered earlier
    /// * `Err(RegistryError::Duplicate)` - the callback is already present;
    ///   nothing changed
    /// * `Err(RegistryError::AllocationFailed)` - no storage for the entry;
    ///   nothing changed
    pub fn register(&self, func: Callback) -> Result<()> {
        let mut entries = self.lock();

        if entries.iter().any(|&cb| std::ptr::fn_addr_eq(cb, func)) {
            log::debug!("Refusing duplicate fatal callback registration");
            return Err(RegistryError::Duplicate);
        }

        // Only reachable under real memory exhaustion; not covered by tests.
        entries
            .try_reserve(1)
            .map_err(|_| RegistryError::AllocationFailed)?;
        entries.push_front(func);

        log::debug!("Registered fatal callback ({} pending)", entries.len());
        Ok(())
    }

    /// Remove a previously registered callback
    ///
    /// The relative order of the remaining callbacks is preserved.
    pub fn deregister(&self, func: Callback) -> Result<()> {
        let mut entries = self.lock();

        let position = entries
            .iter()
            .position(|&cb| std::ptr::fn_addr_eq(cb, func))
            .ok_or(RegistryError::NotFound)?;
        entries.remove(position);

        log::debug!("Deregistered fatal callback ({} pending)", entries.len());
        Ok(())
    }

    /// Run every registered callback exactly once, most recent first
    ///
    /// Each entry is unlinked before its callback is invoked. Callbacks added
    /// while draining land at the front and run next; callbacks removed while
    /// draining are not run. The registry is empty when this returns.
    ///
    /// Returns the number of callbacks invoked.
    pub fn drain_and_invoke(&self) -> usize {
        log::debug!("Running {} fatal callbacks", self.len());

        let mut invoked = 0;
        loop {
            // Guard must be released before the callback runs.
            let next = self.lock().pop_front();
            let Some(callback) = next else {
                break;
            };

            log::trace!("Invoking fatal callback #{}", invoked + 1);
            callback();
            invoked += 1;
        }

        log::debug!("Fatal callbacks completed ({} run)", invoked);
        invoked
    }

    /// Number of pending callbacks
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no callback is pending
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True if `func` is currently registered
    pub fn contains(&self, func: Callback) -> bool {
        self.lock().iter().any(|&cb| std::ptr::fn_addr_eq(cb, func))
    }

    /// Pending callbacks in the order they would be invoked
    pub fn snapshot(&self) -> Vec<Callback> {
        self.lock().iter().copied().collect()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Callback>> {
        // The lock is never held across a callback, so a poisoned lock still
        // guards a consistent list.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
