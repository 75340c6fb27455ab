//! HTTP transport types exchanged with the transport collaborator.
//!
//! # Design
//! Requests and responses are plain data. The core assembles an
//! `HttpRequest`, hands it to a [`Transport`](crate::transport::Transport),
//! and interprets the returned `HttpResponse`; it never speaks the wire
//! protocol itself.
//!
//! All fields use owned types (`String`, `Vec`) so values can move onto the
//! blocking pool for asynchronous return shapes.

use std::fmt;

use crate::codec::EncodedBody;

/// HTTP method for a request. Endpoints that declare no verb use `Get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Only POST and PUT transmit a payload. GET and DELETE drop any
    /// classified body or field parameters.
    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Produced from a [`RequestPlan`](crate::assemble::RequestPlan). `headers`
/// keeps every declared value in order, so a key may appear more than once.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<EncodedBody>,
}

impl HttpRequest {
    /// Case-insensitive header presence check.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(key, _)| key.eq_ignore_ascii_case(name))
    }
}

/// An HTTP response described as plain data.
///
/// `reason` is the reason phrase reported by the transport, or the canonical
/// phrase for `status` when the transport has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of the named header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            reason: String::new(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: b"{}".to_vec(),
        }
    }

    #[test]
    fn success_is_the_2xx_range() {
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(199).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = response(200);
        assert_eq!(resp.content_type(), Some("application/json"));
        assert_eq!(resp.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(resp.header("accept"), None);
    }

    #[test]
    fn only_post_and_put_carry_bodies() {
        assert!(HttpMethod::Post.has_body());
        assert!(HttpMethod::Put.has_body());
        assert!(!HttpMethod::Get.has_body());
        assert!(!HttpMethod::Delete.has_body());
        assert_eq!(HttpMethod::default(), HttpMethod::Get);
    }
}
