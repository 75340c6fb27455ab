//! Declarative HTTP clients from annotated traits.
//!
//! # Overview
//! Annotate a trait with [`web_api`] and every method becomes an HTTP call:
//! arguments are classified as path, query, field or body parameters, the
//! URI template is resolved, the body is encoded with the service's media
//! type, and the response is decoded into the method's declared return type.
//!
//! ```ignore
//! use webapi_core::{web_api, ApiError, Pending};
//!
//! #[web_api]
//! #[header("User-Agent", "webapi")]
//! pub trait GitHub {
//!     #[get("rate_limit")]
//!     fn rate_limit(&self) -> Result<serde_json::Value, ApiError>;
//!
//!     #[get("repos/{owner}/{repo}/issues")]
//!     fn issues(&self, #[path] owner: &str, #[path] repo: &str, state: &str) -> Pending<Vec<Issue>>;
//! }
//!
//! let github = GitHubClient::new("https://api.github.com")?;
//! let limits = github.rate_limit()?;
//! ```
//!
//! # Design
//! - Descriptors are `const` tables emitted by the macro; the pipeline
//!   (`assemble` then `dispatch`) is ordinary library code shared by every
//!   generated method.
//! - The declared return type picks blocking or asynchronous, raw or typed
//!   resolution (see [`dispatch`]).
//! - The transport is pluggable through [`TransportFactory`]; the default is
//!   `ureq`.

pub mod assemble;
pub mod client;
pub mod codec;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod transport;
pub mod uri;

pub use assemble::{assemble, Argument, RequestPlan};
pub use client::{client, Client, ClientBuilder, Service};
pub use codec::{EncodedBody, MediaType, Payload};
pub use descriptor::{EndpointDescriptor, Header, ParameterDescriptor, Role, ServiceDescriptor};
pub use dispatch::{Pending, PendingResponse, ReturnShape};
pub use error::{ApiError, CodecError, ConfigError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportFactory, UreqFactory, UreqTransport};
pub use webapi_macros::web_api;
