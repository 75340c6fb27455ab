//! Declarative metadata describing a client interface.
//!
//! # Design
//! Descriptors are plain `'static` tables so `#[web_api]` can emit them as
//! `const` items: one `ServiceDescriptor` per trait, one
//! `EndpointDescriptor` per method, one `ParameterDescriptor` per
//! argument. They carry no behaviour beyond defaulting rules; the
//! assembler interprets them on every call.

use crate::codec::MediaType;
use crate::http::HttpMethod;

/// A header key with its ordered values. Each value is sent as its own
/// header line, and repeated keys accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub key: &'static str,
    pub values: &'static [&'static str],
}

/// Compiled metadata for one client interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Interface name, used in log events.
    pub name: &'static str,
    /// Service URI. Relative values are joined onto the client's base
    /// address, absolute values replace it.
    pub uri: Option<&'static str>,
    /// Codec for request bodies and the fallback codec for responses.
    pub media_type: MediaType,
    pub headers: &'static [Header],
}

impl ServiceDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            uri: None,
            media_type: MediaType::Json,
            headers: &[],
        }
    }
}

/// Compiled metadata for one interface method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    /// Method identifier. Used as the path segment when `template` is absent.
    pub name: &'static str,
    pub method: Option<HttpMethod>,
    /// URI template with `{name}` placeholders for path parameters.
    pub template: Option<&'static str>,
    pub headers: &'static [Header],
    /// Parameters in declaration order.
    pub params: &'static [ParameterDescriptor],
}

impl EndpointDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            method: None,
            template: None,
            headers: &[],
            params: &[],
        }
    }

    /// Declared verb, or GET when none was declared.
    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or_default()
    }
}

/// How an argument contributes to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Substituted into a `{name}` placeholder of the URI template.
    Path,
    /// Appended to the query string.
    Query,
    /// Collected with other fields into one map that becomes the body.
    Field,
    /// Sent as the whole body.
    Body,
}

/// Compiled metadata for one method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub role: Option<Role>,
    pub alias: Option<&'static str>,
    /// Declared type, used to name an absent body value.
    pub type_name: &'static str,
}

impl ParameterDescriptor {
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            role: None,
            alias: None,
            type_name,
        }
    }

    pub const fn with_role(self, role: Role) -> Self {
        Self {
            role: Some(role),
            ..self
        }
    }

    pub const fn with_alias(self, alias: &'static str) -> Self {
        Self {
            alias: Some(alias),
            ..self
        }
    }

    /// Parameters without a declared role are query parameters.
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::Query)
    }

    /// Name the argument is registered under: the alias, else the declared name.
    pub fn key(&self) -> &'static str {
        match self.alias {
            Some(alias) if !alias.is_empty() => alias,
            _ => self.name,
        }
    }
}
