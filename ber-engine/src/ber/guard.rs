//! Nesting depth bound shared by every recursive decoding path

use ber_core::{BerError, BerResult, DEFAULT_MAX_DEPTH};

/// Nesting counter with a hard ceiling
///
/// The guard is a value: entering a level returns a new guard one level
/// deeper, and the caller's copy is untouched. Dropping back out of a
/// recursion therefore needs no bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursionGuard {
    depth: u32,
    limit: u32,
}

impl RecursionGuard {
    pub fn new(limit: u32) -> Self {
        Self { depth: 0, limit }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Descend one level
    ///
    /// # Error Handling
    /// Returns [`BerError::BoundsExceeded`] once the depth would pass the limit.
    /// This is the only fatal error of the engine.
    pub fn enter(self) -> BerResult<Self> {
        let depth = self.depth + 1;
        if depth > self.limit {
            return Err(BerError::BoundsExceeded {
                depth,
                limit: self.limit,
            });
        }
        Ok(Self { depth, ..self })
    }
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_up_to_limit() {
        let mut guard = RecursionGuard::new(3);
        for expected in 1..=3 {
            guard = guard.enter().unwrap();
            assert_eq!(guard.depth(), expected);
        }
        assert_eq!(
            guard.enter(),
            Err(BerError::BoundsExceeded { depth: 4, limit: 3 })
        );
    }

    #[test]
    fn test_enter_leaves_original() {
        let guard = RecursionGuard::default();
        let inner = guard.enter().unwrap();
        assert_eq!(guard.depth(), 0);
        assert_eq!(inner.depth(), 1);
        assert_eq!(inner.limit(), 500);
    }
}
