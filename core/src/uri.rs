//! Request URI resolution: template expansion, path joining, query building.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use url::Url;

use crate::error::ConfigError;

/// Everything outside the RFC 3986 unreserved set is escaped in query values.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the request URL for one call.
///
/// `template` placeholders are filled from `path_params` (names compared
/// case-insensitively). Without a template, `method_name` becomes the path
/// segment. Query pairs follow `query_params` order; a key with several
/// values is repeated once per value.
pub fn resolve(
    base: &Url,
    template: Option<&str>,
    method_name: &str,
    path_params: &[(String, String)],
    query_params: &[(String, Vec<String>)],
) -> Result<Url, ConfigError> {
    let segment = match template {
        Some(template) if !template.is_empty() => expand_template(template, path_params)?,
        _ => method_name.to_string(),
    };

    let mut url = base.clone();
    url.set_path(&join_path(base.path(), &segment));

    let pairs: Vec<String> = query_params
        .iter()
        .flat_map(|(key, values)| {
            values
                .iter()
                .map(move |value| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
        })
        .collect();
    if !pairs.is_empty() {
        let mut query = url.query().unwrap_or_default().to_string();
        for pair in pairs {
            if !query.is_empty() {
                query.push('&');
            }
            query.push_str(&pair);
        }
        url.set_query(Some(&query));
    }

    Ok(url)
}

/// Substitute every `{name}` placeholder. A placeholder with no matching
/// parameter is an error; text outside placeholders is copied unchanged.
pub fn expand_template(template: &str, path_params: &[(String, String)]) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if close > 0 => {
                let name = &after[..close];
                let value = path_params
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
                    .ok_or_else(|| ConfigError::UnresolvedPlaceholder(name.to_string()))?;
                out.push_str(value);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// Join two path pieces with exactly one slash between them.
pub fn join_path(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment.trim_start_matches('/'))
}

/// Apply a service URI to the client's base address.
pub fn service_base(base: &Url, service_uri: Option<&str>) -> Result<Url, ConfigError> {
    let Some(uri) = service_uri.filter(|uri| !uri.is_empty()) else {
        return Ok(base.clone());
    };
    match Url::parse(uri) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let mut url = base.clone();
            url.set_path(&join_path(base.path(), uri));
            Ok(url)
        }
        Err(e) => Err(ConfigError::InvalidBaseAddress {
            address: uri.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Text form of a scalar argument. Strings are used verbatim, null is empty,
/// arrays and objects use their compact JSON text.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Text forms of an argument that may be a sequence: one entry per element
/// for arrays, a single entry otherwise.
pub(crate) fn value_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect(),
        other => vec![value_text(other)],
    }
}
