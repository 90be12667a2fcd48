// karat/src/flow/step.rs

use super::control::StepControl;
use super::shared::Shared;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A step handler: takes a clone of the shared context and resolves to a
/// control signal or the workflow's error type.
///
/// Handlers must release any lock guard on the context before awaiting.
pub type Handler<T, E> =
  Box<dyn Fn(Shared<T>) -> Pin<Box<dyn Future<Output = Result<StepControl, E>> + Send>> + Send + Sync>;

/// Evaluated against the context before a step runs; `true` skips the step.
pub type SkipCondition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
