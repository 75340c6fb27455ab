//! The shared client every generated interface delegates to.
//!
//! # Design
//! `Client` holds only immutable configuration (the base address and the
//! transport factory) behind an `Arc`, so clones are cheap and concurrent
//! calls never share per-call state. Each generated method hands its
//! descriptors and converted arguments to [`Client::invoke`], which runs
//! assemble then dispatch and returns whatever shape the method declared.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::assemble::{assemble, Argument};
use crate::descriptor::{EndpointDescriptor, ServiceDescriptor};
use crate::dispatch::ReturnShape;
use crate::error::{ApiError, ConfigError};
use crate::transport::{TransportFactory, UreqFactory};

/// A generated interface implementation bound to a [`Client`].
///
/// Implemented by the `<Trait>Client` structs that `#[web_api]` emits.
pub trait Service: Sized {
    const DESCRIPTOR: ServiceDescriptor;

    fn from_client(client: Client) -> Self;

    fn client(&self) -> &Client;
}

#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientConfig>,
}

struct ClientConfig {
    base: Url,
    factory: Arc<dyn TransportFactory>,
}

impl Client {
    /// Client for `base_address` using the default `ureq` transport.
    pub fn new(base_address: &str) -> Result<Self, ApiError> {
        Self::builder(base_address).build()
    }

    pub fn builder(base_address: &str) -> ClientBuilder {
        ClientBuilder {
            base_address: base_address.to_string(),
            factory: None,
        }
    }

    pub fn base_address(&self) -> &Url {
        &self.inner.base
    }

    pub(crate) fn factory(&self) -> &Arc<dyn TransportFactory> {
        &self.inner.factory
    }

    /// Bind this client to a generated interface.
    pub fn bind<S: Service>(&self) -> S {
        S::from_client(self.clone())
    }

    /// Run one call: classify `args`, assemble the request and resolve it
    /// into the declared return shape `R`. Argument conversion failures are
    /// passed in so they surface through the same shape.
    pub fn invoke<R: ReturnShape>(
        &self,
        service: &ServiceDescriptor,
        endpoint: &EndpointDescriptor,
        args: Result<Vec<Argument>, ApiError>,
    ) -> R {
        let plan = args.and_then(|args| assemble(&self.inner.base, service, endpoint, args));
        R::resolve(self, plan)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_address", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Client`]; the transport factory defaults to [`UreqFactory`].
pub struct ClientBuilder {
    base_address: String,
    factory: Option<Arc<dyn TransportFactory>>,
}

impl ClientBuilder {
    pub fn transport_factory(mut self, factory: impl TransportFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn build(self) -> Result<Client, ApiError> {
        let base = Url::parse(&self.base_address).map_err(|e| ConfigError::InvalidBaseAddress {
            address: self.base_address.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseAddress {
                address: self.base_address,
                reason: "address cannot carry a path".to_string(),
            }
            .into());
        }
        let factory = self
            .factory
            .unwrap_or_else(|| Arc::new(UreqFactory::default()));
        Ok(Client {
            inner: Arc::new(ClientConfig { base, factory }),
        })
    }
}

/// Live client for interface `S` at `base_address`, using the default
/// transport.
pub fn client<S: Service>(base_address: &str) -> Result<S, ApiError> {
    Ok(Client::new(base_address)?.bind())
}
