//! Deterministic budget admission for worker dispatches.
//!
//! Units are whitespace-delimited words: a stable proxy for model tokens, not
//! a tokenizer. Admission happens once, in [`BudgetAllocator::allocate`];
//! usage recorded afterwards is advisory and is never clamped.

use crate::error::SupervisorError;

pub const DEFAULT_TOTAL_BUDGET: u64 = 4096;
pub const DEFAULT_RESPONSE_RESERVE: u64 = 512;
pub const DEFAULT_TOOL_RESULT_RESERVE: u64 = 512;

/// Count budget units in `text`.
pub fn count_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Sum of budget units across several chunks.
pub fn estimate_tokens<'a>(chunks: impl IntoIterator<Item = &'a str>) -> u64 {
    chunks.into_iter().map(count_words).sum()
}

/// Admitted split of the budget for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub system_prompt: u64,
    pub task_context: u64,
    pub tool_results_buffer: u64,
    pub response_generation: u64,
}

impl Reservation {
    pub fn total(&self) -> u64 {
        self.system_prompt
            .saturating_add(self.task_context)
            .saturating_add(self.tool_results_buffer)
            .saturating_add(self.response_generation)
    }
}

#[derive(Debug, Clone)]
pub struct BudgetAllocator {
    total_budget: u64,
    response_reserve: u64,
    tool_result_reserve: u64,
    total_used: u64,
}

impl Default for BudgetAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_BUDGET)
    }
}

impl BudgetAllocator {
    pub fn new(total_budget: u64) -> Self {
        Self::with_reserves(
            total_budget,
            DEFAULT_RESPONSE_RESERVE,
            DEFAULT_TOOL_RESULT_RESERVE,
        )
    }

    pub fn with_reserves(total_budget: u64, response_reserve: u64, tool_result_reserve: u64) -> Self {
        Self {
            total_budget,
            response_reserve,
            tool_result_reserve,
            total_used: 0,
        }
    }

    pub fn total_budget(&self) -> u64 {
        self.total_budget
    }

    /// Admit a dispatch whose fixed costs are the rendered prompt and the
    /// supplied context. Both reserves are always added on top.
    ///
    /// Fails with [`SupervisorError::BudgetExceeded`]; the cost is
    /// deterministic, so callers must not retry.
    pub fn allocate(
        &self,
        system_prompt_tokens: u64,
        task_context_tokens: u64,
    ) -> Result<Reservation, SupervisorError> {
        let reservation = Reservation {
            system_prompt: system_prompt_tokens,
            task_context: task_context_tokens,
            tool_results_buffer: self.tool_result_reserve,
            response_generation: self.response_reserve,
        };
        let required = reservation.total();
        if required > self.total_budget {
            return Err(SupervisorError::BudgetExceeded {
                required,
                available: self.total_budget,
            });
        }
        Ok(reservation)
    }

    pub fn record_usage(&mut self, tokens: u64) {
        self.total_used = self.total_used.saturating_add(tokens);
    }

    pub fn total_used(&self) -> u64 {
        self.total_used
    }

    /// `total - used`; reaches zero once usage meets the total.
    pub fn remaining(&self) -> u64 {
        self.total_budget.saturating_sub(self.total_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_within_budget_returns_components() {
        let allocator = BudgetAllocator::default();
        let reservation = allocator.allocate(100, 200).expect("allocate");
        assert_eq!(
            reservation,
            Reservation {
                system_prompt: 100,
                task_context: 200,
                tool_results_buffer: 512,
                response_generation: 512,
            }
        );
        assert!(reservation.total() <= allocator.total_budget());
    }

    #[test]
    fn allocate_at_exact_budget_succeeds() {
        let allocator = BudgetAllocator::default();
        let reservation = allocator.allocate(3000, 72).expect("allocate");
        assert_eq!(reservation.total(), 4096);
    }

    #[test]
    fn allocate_over_budget_fails_with_amounts() {
        let allocator = BudgetAllocator::default();
        let err = allocator.allocate(3000, 73).expect_err("over budget");
        assert_eq!(
            err,
            SupervisorError::BudgetExceeded {
                required: 4097,
                available: 4096,
            }
        );
    }

    #[test]
    fn allocation_boundary_holds_across_fixed_costs() {
        let allocator = BudgetAllocator::with_reserves(100, 20, 30);
        for prompt in 0..=60u64 {
            for context in 0..=60u64 {
                let fits = prompt + context + 50 <= 100;
                match allocator.allocate(prompt, context) {
                    Ok(reservation) => {
                        assert!(fits, "{prompt}+{context} should have been rejected");
                        assert!(reservation.total() <= 100);
                    }
                    Err(err) => {
                        assert!(!fits, "{prompt}+{context} should have been admitted");
                        assert!(matches!(err, SupervisorError::BudgetExceeded { .. }));
                    }
                }
            }
        }
    }

    #[test]
    fn remaining_tracks_recorded_usage() {
        let mut allocator = BudgetAllocator::new(1000);
        let mut recorded = 0;
        for usage in [10, 0, 250, 40] {
            allocator.record_usage(usage);
            recorded += usage;
            assert_eq!(allocator.remaining(), 1000 - recorded);
            assert_eq!(allocator.total_used(), recorded);
        }
    }

    #[test]
    fn usage_beyond_total_is_recorded_not_clamped() {
        let mut allocator = BudgetAllocator::new(10);
        allocator.record_usage(25);
        assert_eq!(allocator.total_used(), 25);
        assert_eq!(allocator.remaining(), 0);
    }

    #[test]
    fn count_words_splits_on_any_whitespace() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("  one\ttwo\nthree  "), 3);
        assert_eq!(estimate_tokens(["a b", "", "c"]), 3);
    }
}
