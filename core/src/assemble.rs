//! Turns one method call into a ready-to-send request.
//!
//! # Design
//! Arguments are classified in declaration order into path, query, field
//! and body buckets. Role conflicts can only be detected here, once the
//! call's arguments are known, so every metadata check runs before anything
//! is encoded or sent. The resulting [`RequestPlan`] is owned by the call
//! and dropped once its response is resolved.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::codec::{self, EncodedBody, MediaType, Payload};
use crate::descriptor::{EndpointDescriptor, Role, ServiceDescriptor};
use crate::error::{ApiError, CodecError, ConfigError};
use crate::http::{HttpMethod, HttpRequest};
use crate::uri::{self, value_text, value_texts};

/// One call argument, copied out of the caller's value.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    value: Value,
    type_name: &'static str,
}

impl Argument {
    pub fn new<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value)
            .map_err(|e| ApiError::SerializationError(CodecError::Json(e)))?;
        Ok(Self {
            value,
            type_name: std::any::type_name::<T>(),
        })
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// The fully resolved request for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    /// Endpoint the plan was built for, carried into log events.
    pub endpoint: &'static str,
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<EncodedBody>,
    /// Service codec, used to decode responses that name no known type.
    pub media_type: MediaType,
}

impl RequestPlan {
    pub fn into_request(self) -> HttpRequest {
        HttpRequest {
            method: self.method,
            url: self.url.into(),
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Classify `args` against the endpoint's parameters and build the plan.
pub fn assemble(
    base: &Url,
    service: &ServiceDescriptor,
    endpoint: &EndpointDescriptor,
    args: Vec<Argument>,
) -> Result<RequestPlan, ApiError> {
    if args.len() != endpoint.params.len() {
        return Err(ConfigError::ArgumentCount {
            endpoint: endpoint.name.to_string(),
            expected: endpoint.params.len(),
            actual: args.len(),
        }
        .into());
    }

    let mut path: Vec<(String, String)> = Vec::new();
    let mut query: Vec<(String, Vec<String>)> = Vec::new();
    let mut fields = Map::new();
    let mut body: Option<Payload> = None;

    for (param, arg) in endpoint.params.iter().zip(args) {
        let key = param.key();
        match param.role() {
            Role::Query => {
                if query.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
                    return Err(ConfigError::DuplicateQuery(key.to_string()).into());
                }
                query.push((key.to_string(), value_texts(&arg.value)));
            }
            Role::Path => {
                if path.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
                    return Err(ConfigError::DuplicatePath(key.to_string()).into());
                }
                path.push((key.to_string(), value_text(&arg.value)));
            }
            Role::Body => {
                if body.is_some() || !fields.is_empty() {
                    return Err(ConfigError::SingleBody.into());
                }
                let type_name = if arg.value.is_null() {
                    param.type_name
                } else {
                    arg.type_name
                };
                body = Some(Payload::Body {
                    type_name,
                    value: arg.value,
                });
            }
            Role::Field => {
                if body.is_some() {
                    return Err(ConfigError::SingleBody.into());
                }
                if fields.keys().any(|k| k.eq_ignore_ascii_case(key)) {
                    return Err(ConfigError::DuplicateField(key.to_string()).into());
                }
                fields.insert(key.to_string(), arg.value);
            }
        }
    }

    let base = uri::service_base(base, service.uri)?;
    let url = uri::resolve(&base, endpoint.template, endpoint.name, &path, &query)?;

    let headers = service
        .headers
        .iter()
        .chain(endpoint.headers)
        .flat_map(|header| {
            header
                .values
                .iter()
                .map(move |value| (header.key.to_string(), value.to_string()))
        })
        .collect();

    let method = endpoint.method();
    let payload = body.unwrap_or(Payload::Fields(fields));
    let body = if method.has_body() {
        let encoded =
            codec::encode(service.media_type, &payload).map_err(ApiError::SerializationError)?;
        Some(encoded)
    } else {
        if payload != Payload::Fields(Map::new()) {
            debug!(endpoint = endpoint.name, %method, "payload not transmitted for bodiless verb");
        }
        None
    };

    Ok(RequestPlan {
        endpoint: endpoint.name,
        method,
        url,
        headers,
        body,
        media_type: service.media_type,
    })
}
