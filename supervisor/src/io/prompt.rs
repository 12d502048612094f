//! Worker prompt rendering.
//!
//! The rendered prompt is both what the worker oracle receives and what the
//! dispatcher charges against the budget, so rendering must be deterministic.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

const WORKER_TEMPLATE: &str = include_str!("prompts/worker.md");

/// Inputs for one worker prompt.
#[derive(Debug, Clone)]
pub struct WorkerPromptInputs<'a> {
    pub todo_id: &'a str,
    pub description: &'a str,
    pub context: &'a str,
    pub capabilities: &'a [String],
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("worker", WORKER_TEMPLATE)
            .context("load worker template")?;
        Ok(Self { env })
    }

    pub fn render_worker(&self, input: &WorkerPromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("worker")?;
        let rendered = template
            .render(context! {
                todo_id => input.todo_id,
                description => input.description.trim(),
                context => Some(input.context.trim()).filter(|s| !s.is_empty()),
                capabilities => input.capabilities,
            })
            .context("render worker prompt")?;
        Ok(rendered)
    }
}
