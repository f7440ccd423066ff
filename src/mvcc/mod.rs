//! Commit versions and the clock that hands them out.

use std::fmt;

/// Logical version assigned to every committed write transaction.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(u64);

impl Version {
    /// Version of a freshly opened database.
    pub const MIN: Self = Self(0);

    /// Construct a version from a raw `u64`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` value backing this version.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version after `self`, saturating on overflow.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Version").field(&self.0).finish()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Tracks the next commit version to allocate.
#[derive(Debug, Clone, Copy)]
pub struct CommitClock {
    next: Version,
}

impl CommitClock {
    /// Create a clock that hands out versions starting from `start`.
    #[inline]
    pub const fn new(start: Version) -> Self {
        Self { next: start }
    }

    /// Allocate and return the next commit version.
    #[inline]
    pub fn next(&mut self) -> Version {
        let current = self.next;
        self.next = current.next();
        current
    }
}

impl Default for CommitClock {
    fn default() -> Self {
        Self::new(Version::MIN.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_clock_advances() {
        let mut clock = CommitClock::default();
        assert_eq!(clock.next(), Version::new(1));
        assert_eq!(clock.next(), Version::new(2));
        assert_eq!(clock.next(), Version::new(3));
    }

    #[test]
    fn version_saturates() {
        assert_eq!(Version::new(u64::MAX).next(), Version::new(u64::MAX));
        assert_eq!(Version::MIN.to_string(), "v0");
    }
}
