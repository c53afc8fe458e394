//! Handler resolution cache.
//!
//! Resolving how to call the handler for a request type needs the concrete
//! type, which only the generic `send::<R>` knows. The registry keeps one
//! type-erased [`Invoker`] per request type so later dispatches skip that
//! work.
//!
//! ## Guarantees
//!
//! - The builder for a request type runs at most once on success, even when
//!   many tasks dispatch that type for the first time simultaneously.
//! - Building an invoker for one type never waits on another type.
//! - A failed build is not cached; the next dispatch tries again.
//! - Invokers hold no handler instance. They resolve the handler from the
//!   provider on every call, so handler lifetimes stay with the provider.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use conduit_core::di::ServiceProvider;
use conduit_core::{
    BoxFuture, CancellationToken, Contract, DispatchError, DispatchResult, HandlerFamily, Request,
    RequestKind,
};
use conduit_pipeline::AnyResponse;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::debug;

/// A shareable, type-erased invoker.
pub type Invoker = Arc<dyn ErasedInvoker>;

/// Calls the handler for one request type without naming that type.
pub trait ErasedInvoker: Send + Sync {
    /// Returns the fully qualified request type name.
    fn request_type(&self) -> &'static str;

    /// Returns the handler family of the request type.
    fn family(&self) -> HandlerFamily;

    /// Resolves the handler from `provider` and calls it with `request`.
    ///
    /// `request` must be the request type this invoker was built for.
    fn invoke<'a>(
        &'a self,
        request: &'a (dyn Any + Send + Sync),
        provider: &'a dyn ServiceProvider,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>>;
}

/// Invoker for request type `R`.
struct TypedInvoker<R> {
    _marker: PhantomData<fn() -> R>,
}

impl<R: Request> TypedInvoker<R> {
    const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R: Request> ErasedInvoker for TypedInvoker<R> {
    fn request_type(&self) -> &'static str {
        type_name::<R>()
    }

    fn family(&self) -> HandlerFamily {
        <R::Kind as RequestKind>::FAMILY
    }

    fn invoke<'a>(
        &'a self,
        request: &'a (dyn Any + Send + Sync),
        provider: &'a dyn ServiceProvider,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, DispatchResult<AnyResponse>> {
        Box::pin(invoke_typed::<R>(request, provider, cancel))
    }
}

async fn invoke_typed<R: Request>(
    request: &(dyn Any + Send + Sync),
    provider: &dyn ServiceProvider,
    cancel: &CancellationToken,
) -> DispatchResult<AnyResponse> {
    let contract = Contract::request::<R>();
    let request = request.downcast_ref::<R>().ok_or_else(|| {
        DispatchError::resolution(&contract, "request does not match the cached invoker")
    })?;

    let service = provider
        .resolve_one(&contract)?
        .ok_or_else(not_found::<R>)?;

    let call = <R::Kind as RequestKind>::handle(service, request, cancel).ok_or_else(|| {
        DispatchError::resolution(&contract, "registered service does not implement the contract")
    })?;

    let response = call.await?;
    Ok(Box::new(response))
}

fn not_found<R: Request>() -> DispatchError {
    DispatchError::HandlerNotFound {
        request_type: type_name::<R>(),
        family: <R::Kind as RequestKind>::FAMILY,
    }
}

/// Builds the invoker for `R`, failing fast when no handler is registered.
fn build_invoker<R: Request>(provider: &dyn ServiceProvider) -> DispatchResult<Invoker> {
    let contract = Contract::request::<R>();
    if !provider.is_registered(&contract)? {
        return Err(not_found::<R>());
    }

    debug!(
        request = type_name::<R>(),
        family = %contract.family(),
        "handler invoker cached"
    );
    Ok(Arc::new(TypedInvoker::<R>::new()))
}

/// Concurrent cache of invokers keyed by request type.
///
/// # Example
///
/// ```
/// use conduit_core::di::Container;
/// use conduit_core::fixtures::{AddCommand, AddCommandHandler};
/// use conduit_mediator::HandlerRegistry;
///
/// let mut container = Container::new();
/// container.add_command_handler::<AddCommand, _>(AddCommandHandler);
///
/// let registry = HandlerRegistry::new();
/// let first = registry.get_or_add::<AddCommand>(&container).unwrap();
/// let second = registry.get_or_add::<AddCommand>(&container).unwrap();
///
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    invokers: DashMap<TypeId, Arc<OnceCell<Invoker>>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            invokers: DashMap::new(),
        }
    }

    /// Returns the cached invoker for `R`, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HandlerNotFound`] when `provider` has no
    /// handler for `R`, or the provider's own resolution error.
    pub fn get_or_add<R: Request>(&self, provider: &dyn ServiceProvider) -> DispatchResult<Invoker> {
        self.get_or_add_with(TypeId::of::<R>(), || build_invoker::<R>(provider))
    }

    /// Returns the invoker cached under `key`, running `builder` on first use.
    ///
    /// Concurrent callers for the same key wait for a single builder run.
    /// Callers for other keys are not blocked. When `builder` fails nothing
    /// is cached.
    ///
    /// # Errors
    ///
    /// Returns the builder's error.
    pub fn get_or_add_with<F>(&self, key: TypeId, builder: F) -> DispatchResult<Invoker>
    where
        F: FnOnce() -> DispatchResult<Invoker>,
    {
        if let Some(invoker) = self
            .invokers
            .get(&key)
            .and_then(|entry| entry.value().get().cloned())
        {
            return Ok(invoker);
        }

        // The shard lock is released before the builder runs
        let cell = Arc::clone(self.invokers.entry(key).or_default().value());
        cell.get_or_try_init(builder).map(Arc::clone)
    }

    /// Returns `true` if an invoker for `key` has been built.
    #[must_use]
    pub fn contains(&self, key: &TypeId) -> bool {
        self.invokers
            .get(key)
            .is_some_and(|entry| entry.value().get().is_some())
    }

    /// Returns the number of built invokers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.invokers
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }

    /// Returns `true` if no invoker has been built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("invokers", &self.len())
            .finish()
    }
}
