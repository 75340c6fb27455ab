//! The transport boundary and the default `ureq` implementation.
//!
//! # Design
//! A [`TransportFactory`] is asked for a fresh [`Transport`] on every
//! invocation. The handle lives only for that round trip and is dropped on
//! every exit path. Connection pooling and thread safety belong to the
//! transport: [`UreqFactory`] shares one `ureq::Agent` and hands out clones,
//! which reuse the agent's pool.

use url::Url;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP round trip. Non-success statuses are data, not errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Creates a transport handle for one invocation.
pub trait TransportFactory: Send + Sync {
    fn create(&self, base: &Url) -> Box<dyn Transport>;
}

impl<F> TransportFactory for F
where
    F: Fn(&Url) -> Box<dyn Transport> + Send + Sync,
{
    fn create(&self, base: &Url) -> Box<dyn Transport> {
        self(base)
    }
}

/// Default factory backed by a shared `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqFactory {
    agent: ureq::Agent,
}

impl UreqFactory {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqFactory {
    /// An agent that reports 4xx/5xx responses as data so the dispatcher can
    /// decide how to interpret them.
    fn default() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl TransportFactory for UreqFactory {
    fn create(&self, _base: &Url) -> Box<dyn Transport> {
        Box::new(UreqTransport {
            agent: self.agent.clone(),
        })
    }
}

/// Blocking transport over `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let result = match &request.body {
            Some(body) => {
                if !request.has_header("content-type") {
                    builder = builder.header("content-type", body.content_type);
                }
                let req = builder.body(body.bytes.as_slice()).map_err(TransportError::new)?;
                self.agent.run(req)
            }
            None => {
                let req = builder.body(()).map_err(TransportError::new)?;
                self.agent.run(req)
            }
        };
        let mut response = result.map_err(TransportError::new)?;

        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (key.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(TransportError::new)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: reason_phrase(status),
            headers,
            body,
        })
    }
}

/// `ureq` does not surface the server's reason phrase, so the canonical one
/// is used. Unregistered codes fall back to the numeric code.
fn reason_phrase(status: ureq::http::StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => reason.to_string(),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use ureq::http::StatusCode;

    use super::*;

    #[test]
    fn registered_codes_use_the_canonical_phrase() {
        assert_eq!(reason_phrase(StatusCode::NOT_FOUND), "Not Found");
    }

    #[test]
    fn unregistered_codes_fall_back_to_the_number() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(reason_phrase(status), "599");
    }
}
