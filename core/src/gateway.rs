//! The schema gateway: one configured connection to the GraphQL endpoint.
//!
//! # Design
//! `SchemaGateway` owns the endpoint configuration, the query cache and a
//! `Transport`. It is shared by handing out `Arc<SchemaGateway>`; nothing in
//! this module is global. Hosts that want a single process-wide gateway use
//! a `GatewayCell`, which refuses a second configuration instead of
//! silently replacing the first.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http;
use crate::operation::{OperationDescriptor, ResultEnvelope};
use crate::transport::{HttpTransport, Transport};
use crate::watch::QueryWatch;

pub struct SchemaGateway {
    config: GatewayConfig,
    transport: Arc<dyn Transport>,
    cache: QueryCache,
}

impl std::fmt::Debug for SchemaGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaGateway")
            .field("config", &self.config)
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl SchemaGateway {
    pub fn new(config: GatewayConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            cache: QueryCache::new(),
        }
    }

    /// Validate `config` and connect over HTTP.
    pub fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let transport = HttpTransport::new()?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Drop all cached results and re-fire every live watch.
    pub fn invalidate(&self) {
        debug!(generation = self.cache.generation() + 1, "invalidating query cache");
        self.cache.invalidate();
    }

    /// Run one operation and return its raw envelope.
    ///
    /// Queries go through the cache policy. Successful mutations invalidate
    /// the cache when `refetch_on_mutation` is set.
    pub async fn execute(
        &self,
        descriptor: &OperationDescriptor,
    ) -> Result<ResultEnvelope, GatewayError> {
        if descriptor.is_query() {
            return self.query(descriptor).await;
        }
        let envelope = self.send(descriptor).await?;
        if envelope.is_ok() && self.config.refetch_on_mutation {
            self.invalidate();
        }
        Ok(envelope)
    }

    /// Subscribe to a query. `map` shapes each result before it is emitted.
    ///
    /// The first result is fetched right away; every later one follows a
    /// cache invalidation. Must be called within a Tokio runtime.
    pub fn watch_with<T, F>(self: &Arc<Self>, descriptor: OperationDescriptor, map: F) -> QueryWatch<T>
    where
        T: Send + 'static,
        F: Fn(Result<ResultEnvelope, GatewayError>) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.config.watch_buffer.max(1));
        let mut generation = self.cache.subscribe();
        let gateway = Arc::clone(self);

        let task = tokio::spawn(async move {
            loop {
                // Mark the current generation seen before fetching so an
                // invalidation racing the fetch triggers another round.
                generation.borrow_and_update();
                let result = gateway.execute(&descriptor).await;
                if tx.send(map(result)).await.is_err() {
                    break;
                }
                tokio::select! {
                    changed = generation.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        debug!(operation = descriptor.name, "cache invalidated, refetching");
                    }
                    () = tx.closed() => break,
                }
            }
            debug!(operation = descriptor.name, "watch stopped");
        });

        QueryWatch::new(ReceiverStream::new(rx), task)
    }

    async fn query(&self, descriptor: &OperationDescriptor) -> Result<ResultEnvelope, GatewayError> {
        let policy = self.config.cache_policy;
        let key = descriptor.cache_key();
        if policy.reads() {
            if let Some(hit) = self.cache.get(&key) {
                debug!(operation = descriptor.name, "cache hit");
                return Ok(hit);
            }
        }
        // A mutation that lands while this request is in flight makes the
        // answer stale; it must not be stored under the new generation.
        let generation = self.cache.generation();
        let envelope = self.send(descriptor).await?;
        if policy.writes()
            && envelope.is_ok()
            && !self.cache.put_if_generation(key, envelope.clone(), generation)
        {
            debug!(operation = descriptor.name, "cache invalidated in flight, result not stored");
        }
        Ok(envelope)
    }

    async fn send(&self, descriptor: &OperationDescriptor) -> Result<ResultEnvelope, GatewayError> {
        let request = http::encode_request(&self.config.endpoint, descriptor, &self.config.headers)?;
        let variables = Value::Object(descriptor.variables.clone());
        debug!(operation = descriptor.name, %variables, "executing operation");
        let after = self.config.timeout();
        let response = tokio::time::timeout(after, self.transport.send(request))
            .await
            .map_err(|_| GatewayError::Timeout {
                operation: descriptor.name.to_string(),
                after,
            })??;
        http::decode_response(response)
    }
}

/// Holds at most one configured gateway.
#[derive(Debug, Default)]
pub struct GatewayCell {
    inner: OnceCell<Arc<SchemaGateway>>,
}

impl GatewayCell {
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    /// Install the gateway. Fails with `AlreadyConfigured` on any call after
    /// the first; the first gateway stays in place.
    pub fn configure(
        &self,
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<SchemaGateway>, GatewayError> {
        if self.inner.get().is_some() {
            return Err(GatewayError::AlreadyConfigured);
        }
        config.validate()?;
        let endpoint = config.endpoint.clone();
        let gateway = Arc::new(SchemaGateway::new(config, transport));
        self.inner
            .set(Arc::clone(&gateway))
            .map_err(|_| GatewayError::AlreadyConfigured)?;
        info!(%endpoint, "schema gateway configured");
        Ok(gateway)
    }

    pub fn get(&self) -> Result<Arc<SchemaGateway>, GatewayError> {
        self.inner.get().cloned().ok_or(GatewayError::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}
