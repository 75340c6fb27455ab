//! Error types for generated clients.
//!
//! # Design
//! Each failure kind gets its own variant so callers can tell a bad
//! declaration from a network failure, a non-success status, or a body that
//! did not decode, without reading message text. Transport and codec errors
//! keep the collaborator's original error as their source.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Errors returned by every generated client method.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The declarative metadata is contradictory or incomplete for this call.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport failed before a response was obtained.
    #[error("transport failed: {0}")]
    Transport(#[source] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {reason}")]
    HttpError { status: u16, reason: String },

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] CodecError),

    /// The response body could not be decoded into the declared type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] CodecError),
}

impl ApiError {
    /// Status code carried by an `HttpError`.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, ApiError::Config(_))
    }
}

/// Malformed or contradictory metadata, detected when a method is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("only one body parameter is supported")]
    SingleBody,

    #[error("query parameter `{0}` is declared more than once")]
    DuplicateQuery(String),

    #[error("path parameter `{0}` is declared more than once")]
    DuplicatePath(String),

    #[error("field parameter `{0}` is declared more than once")]
    DuplicateField(String),

    #[error("no path parameter supplies placeholder `{{{0}}}`")]
    UnresolvedPlaceholder(String),

    #[error("unsupported media type `{0}`")]
    UnknownMediaType(String),

    #[error("invalid base address `{address}`: {reason}")]
    InvalidBaseAddress { address: String, reason: String },

    #[error("endpoint `{endpoint}` declares {expected} parameters but received {actual} arguments")]
    ArgumentCount {
        endpoint: String,
        expected: usize,
        actual: usize,
    },

    #[error("asynchronous return shapes must be called inside a tokio runtime")]
    NoRuntime,
}

/// Failure reported by a [`Transport`](crate::transport::Transport).
///
/// Wraps the transport's own error unchanged; use [`downcast_ref`] to
/// recover it.
///
/// [`downcast_ref`]: TransportError::downcast_ref
#[derive(Debug)]
pub struct TransportError {
    inner: Box<dyn StdError + Send + Sync>,
}

impl TransportError {
    pub fn new(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self { inner: error.into() }
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.inner
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.inner
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

/// Failure inside one of the body codecs.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    XmlDecode(#[from] quick_xml::DeError),

    #[error(transparent)]
    XmlEncode(#[from] quick_xml::SeError),

    #[error(transparent)]
    FormDecode(#[from] serde::de::value::Error),

    #[error(transparent)]
    FormEncode(#[from] serde_html_form::ser::Error),

    #[error("form encoding: {0}")]
    Form(String),
}
