//! Worker dispatch: scope a task, admit it against the budget and run it.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::capabilities::CapabilityRegistry;
use crate::core::budget::{BudgetAllocator, count_words, estimate_tokens};
use crate::io::config::BudgetConfig;
use crate::io::oracle::{WorkerOracle, WorkerTask};
use crate::io::prompt::{PromptEngine, WorkerPromptInputs};

/// Result text when a worker finishes without producing any.
pub const NO_OUTPUT: &str = "Subagent completed with no output.";

/// One delegated task.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub todo_id: &'a str,
    pub description: &'a str,
    pub capabilities: &'a [String],
    pub context: &'a str,
}

/// What a dispatch produced. `result` also carries rejections and worker
/// failures as descriptive text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub result: String,
    pub tokens_used: u64,
}

/// Builds scoped workers for one run.
///
/// Capability resolution is the only failure that escapes [`dispatch`]:
/// budget rejections and worker failures become the outcome's result text.
///
/// [`dispatch`]: WorkerDispatcher::dispatch
#[derive(Debug)]
pub struct WorkerDispatcher {
    registry: CapabilityRegistry,
    prompts: PromptEngine,
    allocator: BudgetAllocator,
}

impl WorkerDispatcher {
    pub fn new(registry: CapabilityRegistry, prompts: PromptEngine, budget: &BudgetConfig) -> Self {
        Self {
            registry,
            prompts,
            allocator: BudgetAllocator::with_reserves(
                budget.total,
                budget.response_reserve,
                budget.tool_result_reserve,
            ),
        }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    pub fn allocator(&self) -> &BudgetAllocator {
        &self.allocator
    }

    #[instrument(skip_all, fields(todo_id = request.todo_id, capabilities = request.capabilities.len()))]
    pub fn dispatch<W: WorkerOracle + ?Sized>(
        &mut self,
        worker: &W,
        request: &DispatchRequest<'_>,
    ) -> Result<DispatchOutcome> {
        let handles = self.registry.resolve(request.capabilities)?;

        let prompt = self.prompts.render_worker(&WorkerPromptInputs {
            todo_id: request.todo_id,
            description: request.description,
            context: request.context,
            capabilities: request.capabilities,
        })?;

        let result = match self
            .allocator
            .allocate(count_words(&prompt), count_words(request.context))
        {
            Err(err) => {
                warn!(err = %err, "dispatch rejected");
                format!("Error: context budget exceeded: {err}")
            }
            Ok(reservation) => {
                debug!(reserved = reservation.total(), "dispatch admitted");
                let task = WorkerTask {
                    todo_id: request.todo_id.to_string(),
                    prompt,
                };
                match worker.run(&task, &handles) {
                    Ok(Some(text)) => text,
                    Ok(None) => NO_OUTPUT.to_string(),
                    Err(err) => {
                        warn!(err = %err, "worker failed");
                        format!("Error: worker failed: {err:#}")
                    }
                }
            }
        };

        let tokens_used = estimate_tokens([request.description, request.context, result.as_str()]);
        self.allocator.record_usage(tokens_used);
        info!(
            tokens_used,
            remaining = self.allocator.remaining(),
            "dispatch finished"
        );
        Ok(DispatchOutcome {
            result,
            tokens_used,
        })
    }
}
