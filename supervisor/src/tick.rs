//! The orchestration loop: one `tick` consults the decision oracle and folds
//! the returned actions into the run state.
//!
//! A run has two states. RUNNING ticks return at least one action and leave
//! `final_output` unset; the first tick with zero actions sets `final_output`
//! and the run is DONE. Ticking a DONE state returns it unchanged.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::artifacts::ArtifactStore;
use crate::capabilities::CapabilityRegistry;
use crate::core::compression::compress_text;
use crate::core::plan::PlanParser;
use crate::core::state_update::{mark_in_progress, record_dispatch};
use crate::core::types::{Action, DecisionContext, Message, RunState, SubagentLog};
use crate::dispatch::{DispatchRequest, WorkerDispatcher};
use crate::io::config::SupervisorConfig;
use crate::io::oracle::{DecisionOracle, WorkerOracle};
use crate::io::prompt::PromptEngine;

/// Tool message recorded when a plan update is applied.
pub const PLAN_UPDATED: &str = "TODO updated";

/// Owns everything one run needs: oracles, registry, artifact store and
/// dispatcher. Build a fresh one per run.
#[derive(Debug)]
pub struct Supervisor<D, W> {
    decision: D,
    worker: W,
    dispatcher: WorkerDispatcher,
    store: ArtifactStore,
    plans: PlanParser,
    message_max_words: usize,
    per_subagent_limit: u64,
}

impl<D: DecisionOracle, W: WorkerOracle> Supervisor<D, W> {
    pub fn new(
        decision: D,
        worker: W,
        registry: CapabilityRegistry,
        store: ArtifactStore,
        config: &SupervisorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            decision,
            worker,
            dispatcher: WorkerDispatcher::new(registry, PromptEngine::new()?, &config.budget),
            store,
            plans: PlanParser::new()?,
            message_max_words: config.compression.message_max_words,
            per_subagent_limit: config.budget.total,
        })
    }

    /// Fresh RUNNING state for `objective`.
    pub fn start(&self, objective: impl Into<String>) -> RunState {
        let mut state = RunState::new(objective, self.per_subagent_limit);
        state.artifacts = self.store.snapshot();
        state
    }

    pub fn decision_oracle(&self) -> &D {
        &self.decision
    }

    pub fn worker_oracle(&self) -> &W {
        &self.worker
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Advance the run by one decision.
    ///
    /// Fails when the decision oracle fails or an action names an unknown
    /// capability; every other problem is folded into the returned state.
    #[instrument(skip_all, fields(messages = state.messages.len(), todo = state.todo.len()))]
    pub fn tick(&mut self, mut state: RunState) -> Result<RunState> {
        if state.is_done() {
            debug!("tick on finished run ignored");
            return Ok(state);
        }

        let context = self.context(&state);
        let decision = self
            .decision
            .decide(&context)
            .context("decision oracle failed")?;

        if decision.actions.is_empty() {
            info!("decision oracle returned no actions; run complete");
            state.messages.push(Message::supervisor(decision.text.clone()));
            state.final_output = Some(decision.text);
            state.artifacts = self.store.snapshot();
            return Ok(state);
        }

        let kinds: Vec<&str> = decision.actions.iter().map(Action::kind).collect();
        debug!(actions = ?kinds, "applying actions");
        let summary = if decision.text.trim().is_empty() {
            format!("actions: {}", kinds.join(", "))
        } else {
            decision.text.clone()
        };
        state.messages.push(Message::supervisor(summary));

        let mut state = decision
            .actions
            .iter()
            .try_fold(state, |state, action| self.apply(state, action))?;
        state.artifacts = self.store.snapshot();
        Ok(state)
    }

    fn context(&self, state: &RunState) -> DecisionContext {
        DecisionContext {
            objective: state.objective.clone(),
            messages: state
                .messages
                .iter()
                .map(|message| Message {
                    content: compress_text(&message.content, self.message_max_words),
                    ..message.clone()
                })
                .collect(),
            todo: (!state.todo.is_empty()).then(|| state.todo.clone()),
        }
    }

    fn apply(&mut self, mut state: RunState, action: &Action) -> Result<RunState> {
        match action {
            Action::PlanUpdate { items } => match self.plans.parse(items) {
                Ok(todo) => {
                    debug!(items = todo.len(), "plan replaced");
                    state.todo = todo;
                    state.messages.push(Message::tool("plan_update", PLAN_UPDATED));
                }
                Err(reason) => {
                    warn!(reason = %reason, "malformed plan update dropped");
                }
            },
            Action::Dispatch {
                todo_id,
                description,
                capabilities,
                context,
            } => {
                if !mark_in_progress(&mut state, todo_id) {
                    warn!(todo_id = %todo_id, "dispatch for unplanned todo rejected");
                    state.messages.push(Message::tool(
                        "dispatch",
                        format!("Error: todo '{todo_id}' not found in plan"),
                    ));
                    return Ok(state);
                }
                let outcome = self.dispatcher.dispatch(
                    &self.worker,
                    &DispatchRequest {
                        todo_id,
                        description,
                        capabilities,
                        context,
                    },
                )?;
                record_dispatch(
                    &mut state,
                    SubagentLog {
                        todo_id: todo_id.clone(),
                        prompt: description.clone(),
                        capabilities_used: capabilities.clone(),
                        result: outcome.result.clone(),
                        tokens_used: outcome.tokens_used,
                    },
                )
                .map_err(|err| anyhow!(err))?;
                state.messages.push(Message::tool("dispatch", outcome.result));
            }
            Action::CapabilityInvoke { name, args } => {
                let handle = self.dispatcher.registry().get(name)?;
                let result = handle.invoke(args);
                debug!(capability = %name, "supervisor capability call");
                state.messages.push(Message::tool(name.clone(), result));
            }
        }
        Ok(state)
    }
}
