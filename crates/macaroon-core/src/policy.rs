//! First-party caveat evaluation.
//!
//! The core does not interpret predicates. It hands each first-party
//! `(key, constraint)` pair to a [`CaveatPolicy`] supplied by the caller,
//! which carries whatever request context it needs.

use std::collections::BTreeMap;

/// Evaluates first-party caveats against request context.
pub trait CaveatPolicy {
    /// Returns true if the caveat holds.
    fn evaluate(&self, key: &str, constraint: &str) -> bool;
}

impl<F> CaveatPolicy for F
where
    F: Fn(&str, &str) -> bool,
{
    fn evaluate(&self, key: &str, constraint: &str) -> bool {
        self(key, constraint)
    }
}

/// Accepts a caveat only if the context holds its key with an identical
/// value. Unknown keys are rejected.
#[derive(Debug, Clone, Default)]
pub struct ExactMatch {
    context: BTreeMap<String, String>,
}

impl ExactMatch {
    /// Empty context (rejects every first-party caveat).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl CaveatPolicy for ExactMatch {
    fn evaluate(&self, key: &str, constraint: &str) -> bool {
        self.context.get(key).is_some_and(|value| value == constraint)
    }
}
