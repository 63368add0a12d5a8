//! Depth and step budgets for expression evaluation.
//!
//! The evaluator bounds every walk so pathological or adversarial
//! expressions (deeply nested parentheses, enormous filter arrays) fail
//! predictably with [`EvalError::BudgetExceeded`] instead of blowing
//! the host stack or spinning unbounded.

use serde::{Deserialize, Serialize};

use crate::types::EvalError;

/// Per-evaluation resource limits. The engine's only tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalLimits {
    /// Maximum expression-tree depth reachable during one evaluation.
    pub max_depth: usize,
    /// Maximum total node visits during one evaluation, counting each
    /// filter-element predicate walk separately.
    pub max_steps: u64,
}

impl Default for EvalLimits {
    fn default() -> Self {
        // Generous for real profile rules (the corpus tops out around
        // depth 20) while keeping adversarial input cheap to reject
        EvalLimits {
            max_depth: 128,
            max_steps: 100_000,
        }
    }
}

/// Mutable budget state for one evaluation call.
pub(crate) struct Budget {
    limits: EvalLimits,
    steps: u64,
}

impl Budget {
    pub(crate) fn new(limits: EvalLimits) -> Self {
        Budget { limits, steps: 0 }
    }

    /// Charge one node visit at the given depth.
    pub(crate) fn visit(&mut self, depth: usize) -> Result<(), EvalError> {
        if depth > self.limits.max_depth {
            return Err(EvalError::BudgetExceeded {
                what: "depth".to_owned(),
                limit: self.limits.max_depth as u64,
            });
        }
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(EvalError::BudgetExceeded {
                what: "steps".to_owned(),
                limit: self.limits.max_steps,
            });
        }
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_limit_trips() {
        let mut budget = Budget::new(EvalLimits {
            max_depth: 4,
            max_steps: 1_000,
        });
        assert!(budget.visit(4).is_ok());
        assert!(matches!(
            budget.visit(5),
            Err(EvalError::BudgetExceeded { .. })
        ));
    }

    #[test]
    fn step_limit_trips() {
        let mut budget = Budget::new(EvalLimits {
            max_depth: 64,
            max_steps: 3,
        });
        for _ in 0..3 {
            budget.visit(1).unwrap();
        }
        assert!(matches!(
            budget.visit(1),
            Err(EvalError::BudgetExceeded { .. })
        ));
    }
}
