//! Promise adapter - the executor-facing facade

use std::sync::Arc;

use tracing::trace;
use weft_core::{BridgeConfig, BridgeError, BridgeResult, Rejection, Value};
use weft_future::{Executor, OnFulfilled, OnRejected, Outcome, SettledResult, Thenable};
use weft_registry::{ThenableAdapter, ThenableAdapterRegistry, TypeDescriptor};

use crate::{BatchEvaluator, BatchTask, Promise};

struct Shared {
    config: BridgeConfig,
    registry: ThenableAdapterRegistry,
    batch: BatchEvaluator,
}

/// Bridges the executor's promise contract onto native futures
///
/// Cloning is cheap; clones share the registry and configuration, and
/// promises created by any clone belong to the same adapter.
#[derive(Clone)]
pub struct PromiseAdapter {
    shared: Arc<Shared>,
}

impl Default for PromiseAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PromiseAdapter {
    /// Create an adapter with default configuration
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    /// Create an adapter with custom configuration
    pub fn with_config(config: BridgeConfig) -> Self {
        PromiseAdapter {
            shared: Arc::new(Shared {
                batch: BatchEvaluator::new(config.batch_timeout),
                registry: ThenableAdapterRegistry::new(),
                config,
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    /// Registry of third-party thenable adapters
    pub fn registry(&self) -> &ThenableAdapterRegistry {
        &self.shared.registry
    }

    /// Register an adapter for a third-party thenable type
    pub fn register<A>(&self, descriptor: TypeDescriptor, adapter: A)
    where
        A: ThenableAdapter + 'static,
    {
        self.shared.registry.register(descriptor, adapter);
    }

    /// Do both handles refer to the same adapter?
    pub fn ptr_eq(&self, other: &PromiseAdapter) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn wrap(&self, thenable: Thenable) -> Promise {
        Promise::new(thenable, self.clone())
    }

    /// Bare create-from-callback is not offered; futures come from `then` and `all`
    pub fn create(&self, _resolver: Executor) -> BridgeResult<Promise> {
        Err(BridgeError::Unimplemented("create"))
    }

    pub fn create_fulfilled(&self, value: impl Into<Value>) -> Promise {
        self.wrap(Thenable::Settled(SettledResult::fulfilled(value.into())))
    }

    pub fn create_rejected(&self, reason: Rejection) -> Promise {
        self.wrap(Thenable::Settled(SettledResult::rejected(reason)))
    }

    /// Is `value` a native thenable or one the registry recognizes?
    pub fn is_thenable(&self, value: &Value) -> bool {
        Thenable::from_value(value).is_some() || self.shared.registry.can_convert(value)
    }

    /// Normalize a thenable value into a promise
    pub fn convert_thenable(&self, value: &Value) -> BridgeResult<Promise> {
        self.normalize(value).map(|thenable| self.wrap(thenable))
    }

    fn normalize(&self, value: &Value) -> BridgeResult<Thenable> {
        if let Some(thenable) = Thenable::from_value(value) {
            return Ok(thenable);
        }

        match value.as_object() {
            Some(object) if self.shared.registry.can_convert_object(object) => {
                self.shared.registry.convert_thenable(object)
            }
            _ => {
                trace!(type_name = value.type_name(), "unsupported thenable");
                Err(BridgeError::UnsupportedThenable(value.type_name().to_owned()))
            }
        }
    }

    /// Turn a registry-recognized value returned by a reaction into a native one
    fn adopt_external(&self, value: Value) -> Outcome {
        let recognized = value
            .as_object()
            .is_some_and(|object| self.shared.registry.can_convert_object(object));
        if !recognized || Thenable::from_value(&value).is_some() {
            return Ok(value);
        }

        self.normalize(&value)
            .map(Thenable::into_value)
            .map_err(Rejection::from)
    }

    fn adopting<T: 'static>(
        &self,
        reaction: Box<dyn FnOnce(T) -> Outcome + Send + 'static>,
    ) -> Box<dyn FnOnce(T) -> Outcome + Send + 'static> {
        let adapter = self.clone();
        Box::new(move |input: T| -> Outcome {
            let value = reaction(input)?;
            adapter.adopt_external(value)
        })
    }

    /// Chain reactions onto a promise created by this adapter
    pub fn then(
        &self,
        promise: &Promise,
        on_fulfilled: Option<OnFulfilled>,
        on_rejected: Option<OnRejected>,
    ) -> BridgeResult<Promise> {
        if !promise.adapter().ptr_eq(self) {
            return Err(BridgeError::ForeignPromise);
        }
        if on_fulfilled.is_none() && on_rejected.is_none() {
            return Ok(promise.clone());
        }

        let on_fulfilled = on_fulfilled.map(|reaction| self.adopting(reaction));
        let on_rejected = on_rejected.map(|reaction| self.adopting(reaction));

        promise
            .adopted()
            .then(on_fulfilled, on_rejected)
            .map(|thenable| self.wrap(thenable))
    }

    /// Evaluate values and thenables concurrently under the batch deadline
    ///
    /// Fulfills with the results in input order. The first rejection, or the
    /// deadline, rejects the whole batch.
    pub async fn all<I>(&self, items: I) -> Promise
    where
        I: IntoIterator<Item = Value>,
    {
        let tasks: Vec<BatchTask> = items
            .into_iter()
            .map(|item| self.batch_task(item))
            .collect();

        match self.shared.batch.evaluate(tasks).await {
            Ok(values) => self.create_fulfilled(Value::List(values)),
            Err(reason) => self.create_rejected(reason),
        }
    }

    fn batch_task(&self, item: Value) -> BatchTask {
        if !self.is_thenable(&item) {
            return BatchTask::Ready(item);
        }

        match self.normalize(&item) {
            Ok(thenable) => BatchTask::from(thenable),
            Err(e) => BatchTask::Settled(SettledResult::rejected(e.into())),
        }
    }
}
