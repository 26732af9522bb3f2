//! # Owner-thread identity.
//!
//! [`Affinity`] is an explicit ownership token: it records the thread that created
//! it and is checked on every affinity-only entry point. No thread-local state is
//! involved.

use std::thread::{self, ThreadId};

use crate::error::DispatchError;

/// Identity of the affinity thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Affinity {
    owner: ThreadId,
}

impl Affinity {
    /// Captures the calling thread as the affinity thread.
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    /// The captured thread id.
    #[inline]
    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    /// True if the calling thread is the affinity thread.
    #[inline]
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    /// Returns [`DispatchError::WrongThread`] unless called on the affinity thread.
    pub fn check(&self) -> Result<(), DispatchError> {
        let actual = thread::current().id();
        if actual == self.owner {
            Ok(())
        } else {
            Err(DispatchError::WrongThread {
                expected: self.owner,
                actual,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_thread_passes_check() {
        let affinity = Affinity::current();
        assert!(affinity.is_current());
        assert!(affinity.check().is_ok());
    }

    #[test]
    fn test_other_thread_fails_check() {
        let affinity = Affinity::current();
        let res = thread::spawn(move || (affinity.is_current(), affinity.check()))
            .join()
            .unwrap();
        assert!(!res.0);
        assert!(matches!(
            res.1,
            Err(DispatchError::WrongThread { expected, .. }) if expected == affinity.owner()
        ));
    }
}
