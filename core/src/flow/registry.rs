// karat/src/flow/registry.rs

//! `Workflows<E>`: a registry of workflows keyed by their context type, so a
//! caller only needs to build the context to dispatch the right workflow.

use super::control::Outcome;
use super::shared::Shared;
use super::workflow::Workflow;
use crate::error::KaratError;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedWorkflow<E>: Send + Sync
where
  E: std::error::Error + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, E>;
}

#[async_trait]
impl<T, E> ErasedWorkflow<E> for Workflow<T, E>
where
  T: 'static + Send + Sync,
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, E> {
    let typed = ctx.downcast::<Shared<T>>().map_err(|_| {
      E::from(KaratError::Internal(format!(
        "context type mismatch for workflow '{}', expected {}",
        self.name(),
        std::any::type_name::<T>()
      )))
    })?;
    self.run(*typed).await
  }
}

pub struct Workflows<E>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  registry: RwLock<HashMap<TypeId, Arc<dyn ErasedWorkflow<E>>>>,
}

impl<E> Default for Workflows<E>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<E> Workflows<E>
where
  E: std::error::Error + From<KaratError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      registry: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `workflow` for its context type, replacing any previous one.
  pub fn register<T>(&self, workflow: Workflow<T, E>)
  where
    T: 'static + Send + Sync,
  {
    event!(Level::DEBUG, workflow = workflow.name(), context_type = %std::any::type_name::<T>(), "Registering workflow.");
    self.registry.write().insert(TypeId::of::<T>(), Arc::new(workflow));
  }

  pub fn is_registered<T: 'static>(&self) -> bool {
    self.registry.read().contains_key(&TypeId::of::<T>())
  }

  pub async fn run<T>(&self, ctx: Shared<T>) -> Result<Outcome, E>
  where
    T: 'static + Send + Sync,
  {
    let runner = {
      let registry = self.registry.read();
      registry.get(&TypeId::of::<T>()).cloned()
    }
    .ok_or_else(|| {
      let context_type = std::any::type_name::<T>().to_string();
      event!(Level::ERROR, %context_type, "No workflow registered.");
      E::from(KaratError::WorkflowNotRegistered { context_type })
    })?;

    runner.run_erased(Box::new(ctx)).await
  }
}
