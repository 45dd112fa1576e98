//! Data-access core for the hero GraphQL schema.
//!
//! # Overview
//! `SchemaGateway` holds the one configured connection to a GraphQL
//! endpoint: it encodes operation descriptors into plain-data HTTP requests,
//! hands them to a `Transport`, decodes the `{data, errors}` envelope and
//! keeps an in-memory query cache whose invalidation re-fires live watches.
//! `HeroService` sits on top and is the only code that knows the six hero
//! operations, how their results are shaped, and how failures degrade.
//!
//! # Design
//! - The gateway is injected as `Arc<SchemaGateway>`; `GatewayCell` offers a
//!   configure-once slot without global state.
//! - Encoding and decoding are pure (`http` module); only the `Transport`
//!   does I/O, so tests substitute scripted transports.
//! - Plain service methods never return errors. Failures become a default
//!   value plus one `<operation> failed: <detail>` message on the
//!   `MessageSink`; `try_*` methods expose the typed `HeroError` instead.

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod operation;
pub mod recovery;
pub mod service;
pub mod sink;
pub mod transport;
pub mod types;
pub mod watch;

pub use cache::{CachePolicy, QueryCache};
pub use config::GatewayConfig;
pub use error::{ConfigError, GatewayError, HeroError};
pub use gateway::{GatewayCell, SchemaGateway};
pub use http::{HttpRequest, HttpResponse};
pub use operation::{ErrorDetail, OperationDescriptor, OperationKind, ResultEnvelope};
pub use recovery::Recovery;
pub use service::HeroService;
pub use sink::{MessageLog, MessageSink, TracingSink};
pub use transport::{HttpTransport, Transport};
pub use types::{DeleteAck, Hero, HeroId, HeroInput, NewHero};
pub use watch::QueryWatch;
