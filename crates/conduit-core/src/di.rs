//! Handler lookup.
//!
//! The dispatch core never constructs handlers. It asks a [`ServiceProvider`]
//! for the services implementing a [`Contract`] and calls whatever comes back.
//! Hosts plug in their own container by implementing the trait; [`Container`]
//! is the in-crate implementation used by `MediatorBuilder` and the tests.
//!
//! # Example
//!
//! ```rust
//! use conduit_core::di::{Container, ServiceProvider};
//! use conduit_core::fixtures::{AddCommand, AddCommandHandler};
//! use conduit_core::Contract;
//!
//! let mut container = Container::new();
//! container.add_command_handler::<AddCommand, _>(AddCommandHandler);
//!
//! let service = container
//!     .resolve_one(&Contract::request::<AddCommand>())
//!     .unwrap();
//! assert!(service.is_some());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::contract::Contract;
use crate::error::{DispatchError, DispatchResult};
use crate::handler::{CommandHandler, NotificationHandler, QueryHandler};
use crate::message::{Command, Notification, Query};

/// A type-erased handler instance.
///
/// For a command handler the concrete value is `Arc<dyn CommandHandler<C>>`,
/// for a query handler `Arc<dyn QueryHandler<Q>>`, for a notification handler
/// `Arc<dyn NotificationHandler<N>>`.
pub type Service = Arc<dyn Any + Send + Sync>;

/// The handler-lookup capability consumed by the dispatch core.
///
/// Implementations own handler lifetimes. The core resolves on every call and
/// never keeps an instance beyond the call that obtained it.
pub trait ServiceProvider: Send + Sync {
    /// Resolves the single service implementing `contract`.
    ///
    /// Returns `Ok(None)` when nothing is registered.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Resolution`] when the contract cannot be
    /// resolved to exactly one service.
    fn resolve_one(&self, contract: &Contract) -> DispatchResult<Option<Service>>;

    /// Resolves every service implementing `contract`, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Resolution`] if the provider itself fails.
    fn resolve_many(&self, contract: &Contract) -> DispatchResult<Vec<Service>>;

    /// Returns `true` if exactly one service implements `contract`.
    ///
    /// The default resolves an instance and drops it. Providers with factory
    /// registrations should answer without constructing anything.
    ///
    /// # Errors
    ///
    /// Same as [`resolve_one`](Self::resolve_one).
    fn is_registered(&self, contract: &Contract) -> DispatchResult<bool> {
        Ok(self.resolve_one(contract)?.is_some())
    }
}

impl<P: ServiceProvider + ?Sized> ServiceProvider for Arc<P> {
    fn resolve_one(&self, contract: &Contract) -> DispatchResult<Option<Service>> {
        (**self).resolve_one(contract)
    }

    fn is_registered(&self, contract: &Contract) -> DispatchResult<bool> {
        (**self).is_registered(contract)
    }

    fn resolve_many(&self, contract: &Contract) -> DispatchResult<Vec<Service>> {
        (**self).resolve_many(contract)
    }
}

/// How a registered service is produced.
#[derive(Clone)]
enum Registration {
    /// One shared instance.
    Instance(Service),
    /// A fresh instance per resolution.
    Factory(Arc<dyn Fn() -> Service + Send + Sync>),
}

impl Registration {
    fn produce(&self) -> Service {
        match self {
            Self::Instance(service) => Arc::clone(service),
            Self::Factory(factory) => factory(),
        }
    }
}

/// An in-memory handler container.
///
/// Handlers are registered once at startup, keyed by contract. Instance
/// registrations are shared; factory registrations build a new handler on
/// every resolution, which is how per-call handler state is modelled.
///
/// # Thread Safety
///
/// The container is `Send + Sync` and read-only once handed to a mediator.
#[derive(Default, Clone)]
pub struct Container {
    services: HashMap<Contract, Vec<Registration>>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Registers the handler for command `C`.
    pub fn add_command_handler<C, H>(&mut self, handler: H) -> &mut Self
    where
        C: Command,
        H: CommandHandler<C>,
    {
        let handler: Arc<dyn CommandHandler<C>> = Arc::new(handler);
        self.insert(Contract::request::<C>(), Registration::Instance(Arc::new(handler)))
    }

    /// Registers a factory building the handler for command `C` on every resolution.
    pub fn add_command_handler_factory<C, H, F>(&mut self, factory: F) -> &mut Self
    where
        C: Command,
        H: CommandHandler<C>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory = move || -> Service {
            let handler: Arc<dyn CommandHandler<C>> = Arc::new(factory());
            Arc::new(handler)
        };
        self.insert(Contract::request::<C>(), Registration::Factory(Arc::new(factory)))
    }

    /// Registers the handler for query `Q`.
    pub fn add_query_handler<Q, H>(&mut self, handler: H) -> &mut Self
    where
        Q: Query,
        H: QueryHandler<Q>,
    {
        let handler: Arc<dyn QueryHandler<Q>> = Arc::new(handler);
        self.insert(Contract::request::<Q>(), Registration::Instance(Arc::new(handler)))
    }

    /// Registers a factory building the handler for query `Q` on every resolution.
    pub fn add_query_handler_factory<Q, H, F>(&mut self, factory: F) -> &mut Self
    where
        Q: Query,
        H: QueryHandler<Q>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory = move || -> Service {
            let handler: Arc<dyn QueryHandler<Q>> = Arc::new(factory());
            Arc::new(handler)
        };
        self.insert(Contract::request::<Q>(), Registration::Factory(Arc::new(factory)))
    }

    /// Appends a handler for notification `N`.
    pub fn add_notification_handler<N, H>(&mut self, handler: H) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N>,
    {
        self.add_shared_notification_handler::<N>(Arc::new(handler))
    }

    /// Appends an already shared handler for notification `N`.
    ///
    /// Useful when the caller keeps a reference to inspect the handler later.
    pub fn add_shared_notification_handler<N>(
        &mut self,
        handler: Arc<dyn NotificationHandler<N>>,
    ) -> &mut Self
    where
        N: Notification,
    {
        self.insert(
            Contract::notification::<N>(),
            Registration::Instance(Arc::new(handler)),
        )
    }

    /// Appends a factory building a handler for notification `N` on every publish.
    pub fn add_notification_handler_factory<N, H, F>(&mut self, factory: F) -> &mut Self
    where
        N: Notification,
        H: NotificationHandler<N>,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let factory = move || -> Service {
            let handler: Arc<dyn NotificationHandler<N>> = Arc::new(factory());
            Arc::new(handler)
        };
        self.insert(
            Contract::notification::<N>(),
            Registration::Factory(Arc::new(factory)),
        )
    }

    fn insert(&mut self, contract: Contract, registration: Registration) -> &mut Self {
        self.services.entry(contract).or_default().push(registration);
        self
    }

    /// Returns `true` if at least one service implements `contract`.
    #[must_use]
    pub fn contains(&self, contract: &Contract) -> bool {
        self.registrations(contract) > 0
    }

    /// Returns the number of services registered for `contract`.
    #[must_use]
    pub fn registrations(&self, contract: &Contract) -> usize {
        self.services.get(contract).map_or(0, Vec::len)
    }

    /// Returns the number of distinct contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Container {
    fn single(&self, contract: &Contract) -> DispatchResult<Option<&Registration>> {
        match self.services.get(contract).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([registration]) => Ok(Some(registration)),
            Some(many) => Err(DispatchError::resolution(
                contract,
                format!("{} services registered, expected exactly one", many.len()),
            )),
        }
    }
}

impl ServiceProvider for Container {
    fn resolve_one(&self, contract: &Contract) -> DispatchResult<Option<Service>> {
        Ok(self.single(contract)?.map(Registration::produce))
    }

    fn is_registered(&self, contract: &Contract) -> DispatchResult<bool> {
        Ok(self.single(contract)?.is_some())
    }

    fn resolve_many(&self, contract: &Contract) -> DispatchResult<Vec<Service>> {
        Ok(self
            .services
            .get(contract)
            .map(|registrations| registrations.iter().map(Registration::produce).collect())
            .unwrap_or_default())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("contract_count", &self.services.len())
            .finish()
    }
}
