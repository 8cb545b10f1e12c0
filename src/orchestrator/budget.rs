use crate::error::ThreadloopError;

/// Per-invocation allowance of Reason/Act pairs.
///
/// One unit is taken before every Reason step, so a model that keeps asking
/// for tools gets exactly `limit` full pairs before the invocation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    limit: usize,
    used: usize,
}

impl StepBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.limit - self.used
    }

    /// Take one unit, or fail with `RecursionLimitExceeded` when none is left.
    pub fn consume(&mut self) -> Result<(), ThreadloopError> {
        if self.used >= self.limit {
            return Err(ThreadloopError::RecursionLimitExceeded { limit: self.limit });
        }
        self.used += 1;
        Ok(())
    }
}
