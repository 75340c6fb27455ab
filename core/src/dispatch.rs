//! Sends a request plan and resolves it into the method's declared return shape.
//!
//! # Design
//! The declared return type of a generated method selects how the response
//! is resolved, through [`ReturnShape`]:
//!
//! | Declared return                  | Resolution                          |
//! |----------------------------------|-------------------------------------|
//! | `Result<HttpResponse, ApiError>` | blocking, raw, any status           |
//! | `PendingResponse`                | asynchronous, raw, any status       |
//! | `Result<T, ApiError>`            | blocking, 2xx decoded into `T`      |
//! | `Pending<T>`                     | asynchronous, 2xx decoded into `T`  |
//!
//! Every shape makes exactly one transport round trip. Asynchronous shapes
//! issue the call on tokio's blocking pool before the handle is returned;
//! dropping the handle detaches the call rather than cancelling it.

use std::future::{self, Future};
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::de::DeserializeOwned;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::assemble::RequestPlan;
use crate::client::Client;
use crate::codec::{self, MediaType};
use crate::error::{ApiError, ConfigError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::TransportFactory;

/// A return type a generated method may declare.
pub trait ReturnShape: Sized {
    /// Resolve an assembled plan, or carry an assembly failure, into `Self`.
    fn resolve(client: &Client, plan: Result<RequestPlan, ApiError>) -> Self;
}

impl ReturnShape for Result<HttpResponse, ApiError> {
    fn resolve(client: &Client, plan: Result<RequestPlan, ApiError>) -> Self {
        let plan = plan?;
        round_trip(client.factory().as_ref(), client.base_address(), plan.endpoint, plan.into_request())
    }
}

impl<T: DeserializeOwned> ReturnShape for Result<T, ApiError> {
    fn resolve(client: &Client, plan: Result<RequestPlan, ApiError>) -> Self {
        let plan = plan?;
        let (endpoint, media_type) = (plan.endpoint, plan.media_type);
        let response = round_trip(client.factory().as_ref(), client.base_address(), endpoint, plan.into_request())?;
        decode_response(endpoint, media_type, response)
    }
}

/// In-flight raw response. Resolves to the response whatever its status.
#[derive(Debug)]
pub struct PendingResponse {
    inner: InFlight<HttpResponse>,
}

impl ReturnShape for PendingResponse {
    fn resolve(client: &Client, plan: Result<RequestPlan, ApiError>) -> Self {
        let inner = InFlight::spawn(client, plan, |factory, base, plan| {
            round_trip(factory.as_ref(), &base, plan.endpoint, plan.into_request())
        });
        Self { inner }
    }
}

impl Future for PendingResponse {
    type Output = Result<HttpResponse, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

/// In-flight typed result. Resolves to the decoded body on 2xx and to
/// [`ApiError::HttpError`] otherwise.
#[derive(Debug)]
pub struct Pending<T> {
    inner: InFlight<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Send + 'static> ReturnShape for Pending<T> {
    fn resolve(client: &Client, plan: Result<RequestPlan, ApiError>) -> Self {
        let inner = InFlight::spawn(client, plan, |factory, base, plan| {
            let (endpoint, media_type) = (plan.endpoint, plan.media_type);
            let response = round_trip(factory.as_ref(), &base, endpoint, plan.into_request())?;
            decode_response(endpoint, media_type, response)
        });
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<T> Future for Pending<T> {
    type Output = Result<T, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx)
    }
}

#[derive(Debug)]
enum InFlight<T> {
    Rejected(future::Ready<Result<T, ApiError>>),
    Running(JoinHandle<Result<T, ApiError>>),
}

impl<T: Send + 'static> InFlight<T> {
    fn spawn<F>(client: &Client, plan: Result<RequestPlan, ApiError>, work: F) -> Self
    where
        F: FnOnce(Arc<dyn TransportFactory>, Url, RequestPlan) -> Result<T, ApiError> + Send + 'static,
    {
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => return InFlight::Rejected(future::ready(Err(e))),
        };
        let Ok(runtime) = Handle::try_current() else {
            return InFlight::Rejected(future::ready(Err(ConfigError::NoRuntime.into())));
        };
        let factory = Arc::clone(client.factory());
        let base = client.base_address().clone();
        InFlight::Running(runtime.spawn_blocking(move || work(factory, base, plan)))
    }
}

impl<T> Future for InFlight<T> {
    type Output = Result<T, ApiError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.get_mut() {
            InFlight::Rejected(ready) => Pin::new(ready).poll(cx),
            InFlight::Running(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(join)) => Poll::Ready(Err(ApiError::Transport(TransportError::new(join)))),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// One transport round trip. The transport handle is released when this
/// returns, whether or not a response was obtained.
fn round_trip(
    factory: &dyn TransportFactory,
    base: &Url,
    endpoint: &'static str,
    request: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let transport = factory.create(base);
    debug!(
        endpoint,
        method = %request.method,
        url = %request.url,
        has_body = request.body.is_some(),
        "dispatching request"
    );
    let response = transport.send(&request).map_err(ApiError::Transport)?;
    debug!(endpoint, status = response.status, "response received");
    Ok(response)
}

fn decode_response<T: DeserializeOwned>(
    endpoint: &'static str,
    media_type: MediaType,
    response: HttpResponse,
) -> Result<T, ApiError> {
    if !response.is_success() {
        warn!(endpoint, status = response.status, reason = %response.reason, "non-success status");
        return Err(ApiError::HttpError {
            status: response.status,
            reason: response.reason,
        });
    }
    let media_type = response
        .content_type()
        .and_then(MediaType::from_content_type)
        .unwrap_or(media_type);
    codec::decode(media_type, &response.body).map_err(ApiError::DeserializationError)
}
