// karat/src/flow/workflow.rs

//! `Workflow<T, E>`: an ordered list of named steps, their handlers, and the
//! run loop that drives them against a `Shared<T>` context.

use super::control::{Outcome, StepControl};
use super::shared::Shared;
use super::step::{Handler, SkipCondition, StepDef};
use crate::error::KaratError;
use std::collections::HashMap;
use std::future::Future;
use tracing::{event, instrument, span, Instrument, Level};

pub struct Workflow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  name: &'static str,
  steps: Vec<StepDef<T>>,
  handlers: HashMap<String, Vec<Handler<T, E>>>,
}

impl<T, E> Workflow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  /// Creates a workflow from `(step_name, optional)` pairs, run in order.
  pub fn new(name: &'static str, steps: &[(&str, bool)]) -> Self {
    Self {
      name,
      steps: steps
        .iter()
        .map(|(step, optional)| StepDef {
          name: (*step).to_string(),
          optional: *optional,
          skip_if: None,
        })
        .collect(),
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  fn step_mut(&mut self, step_name: &str) -> Result<&mut StepDef<T>, KaratError> {
    self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| KaratError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  /// Attaches a handler to `step_name`. Several handlers on one step run in
  /// registration order.
  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(Shared<T>) -> F + Send + Sync + 'static,
  ) -> Result<(), KaratError>
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<E> + Send + Sync + 'static,
  {
    self.step_mut(step_name)?;
    let handler: Handler<T, E> = Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
    Ok(())
  }

  pub fn skip_if(&mut self, step_name: &str, condition: SkipCondition<T>) -> Result<(), KaratError> {
    self.step_mut(step_name)?.skip_if = Some(condition);
    Ok(())
  }

  #[instrument(
    name = "Workflow::run",
    skip_all,
    fields(workflow = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: Shared<T>) -> Result<Outcome, E> {
    for (step_idx, step) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::DEBUG,
        "workflow_step",
        step_name = step.name.as_str(),
        step_index = step_idx
      );
      if let Some(outcome) = self.run_step(step, ctx.clone()).instrument(step_span).await? {
        return Ok(outcome);
      }
    }

    event!(Level::DEBUG, "Workflow completed.");
    Ok(Outcome::Completed)
  }

  /// Runs one step. `Some(outcome)` ends the workflow early.
  async fn run_step(&self, step: &StepDef<T>, ctx: Shared<T>) -> Result<Option<Outcome>, E> {
    if let Some(skip) = &step.skip_if {
      let skipped = skip(&ctx.read());
      if skipped {
        event!(Level::DEBUG, "Step skipped by condition.");
        return Ok(None);
      }
    }

    let handlers = match self.handlers.get(&step.name) {
      Some(handlers) if !handlers.is_empty() => handlers,
      _ if step.optional => {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(None);
      }
      _ => {
        event!(Level::ERROR, "Non-optional step has no handlers.");
        return Err(E::from(KaratError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }
    };

    for handler in handlers {
      match handler(ctx.clone()).await {
        Ok(StepControl::Continue) => {}
        Ok(StepControl::Halt) => {
          event!(Level::INFO, step_name = %step.name, "Workflow halted by step.");
          return Ok(Some(Outcome::Halted));
        }
        Err(e) => {
          event!(Level::WARN, step_name = %step.name, error = %e, "Step failed.");
          return Err(e);
        }
      }
    }
    Ok(None)
  }
}
