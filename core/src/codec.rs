//! Body codecs keyed by media type.
//!
//! # Design
//! The set of media types is closed: JSON (`serde_json`), XML (`quick-xml`)
//! and form URL encoding (`serde_html_form`). Arguments reach the codec
//! already copied into a [`serde_json::Value`], so encoding never touches
//! caller-owned data.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{CodecError, ConfigError};
use crate::uri::value_text;

/// Supported body encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MediaType {
    #[default]
    Json,
    Xml,
    FormUrlEncoded,
}

impl MediaType {
    /// `Content-Type` sent with an encoded body.
    pub fn content_type(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json; charset=utf-8",
            MediaType::Xml => "application/xml; charset=utf-8",
            MediaType::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }

    /// Media type named by a `Content-Type` header, ignoring parameters.
    /// Returns `None` for anything outside the supported set.
    pub fn from_content_type(header: &str) -> Option<Self> {
        header.parse().ok()
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let essence = self.content_type();
        f.write_str(essence.split(';').next().unwrap_or(essence))
    }
}

impl FromStr for MediaType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or(s).trim().to_ascii_lowercase();
        match essence.as_str() {
            "json" | "application/json" | "text/json" => Ok(MediaType::Json),
            "xml" | "application/xml" | "text/xml" => Ok(MediaType::Xml),
            "form" | "formurlencoded" | "application/x-www-form-urlencoded" => {
                Ok(MediaType::FormUrlEncoded)
            }
            _ => Err(ConfigError::UnknownMediaType(s.to_string())),
        }
    }
}

/// What a call sends as its body: one body argument, or the field map.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Body { type_name: &'static str, value: Value },
    Fields(Map<String, Value>),
}

/// Encoded request body with the content type that describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn encode(media_type: MediaType, payload: &Payload) -> Result<EncodedBody, CodecError> {
    let field_map;
    let (root, value) = match payload {
        Payload::Body { type_name, value } => (xml_root(type_name), value),
        Payload::Fields(fields) => {
            field_map = Value::Object(fields.clone());
            (FIELDS_ROOT.to_string(), &field_map)
        }
    };
    let bytes = match media_type {
        MediaType::Json => serde_json::to_vec(value)?,
        MediaType::Xml => quick_xml::se::to_string_with_root(&root, value)?.into_bytes(),
        MediaType::FormUrlEncoded => encode_form(value)?.into_bytes(),
    };
    Ok(EncodedBody {
        content_type: media_type.content_type(),
        bytes,
    })
}

/// Decode a response body. An empty body reads as `null` whatever the media
/// type, so unit and `Option` return types accept `204 No Content`.
pub fn decode<T: DeserializeOwned>(media_type: MediaType, bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    match media_type {
        MediaType::Json => Ok(serde_json::from_slice(bytes)?),
        MediaType::Xml => Ok(quick_xml::de::from_reader(bytes)?),
        MediaType::FormUrlEncoded => Ok(serde_html_form::from_bytes(bytes)?),
    }
}

const FIELDS_ROOT: &str = "fields";

fn encode_form(value: &Value) -> Result<String, CodecError> {
    let Value::Object(fields) = value else {
        return Err(CodecError::Form(format!(
            "expected an object with named fields, got `{}`",
            value_text(value)
        )));
    };
    let fields: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), form_value(value)))
        .collect();
    Ok(serde_html_form::to_string(&fields)?)
}

/// Reduce a field to what a form can carry: scalars and flat sequences.
/// Null becomes the empty string and nested objects their JSON text.
fn form_value(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::Array(_) => Value::String(item.to_string()),
                    other => form_value(other),
                })
                .collect(),
        ),
        Value::Null | Value::Object(_) => Value::String(value_text(value)),
        scalar => scalar.clone(),
    }
}

/// XML root element for a body type: the last path segment of the type name
/// without references, `Option` or generic arguments.
fn xml_root(type_name: &str) -> String {
    let mut name = type_name.trim().trim_start_matches('&').trim_start_matches("mut ");
    for prefix in ["core::option::Option<", "Option<"] {
        if let Some(inner) = name.strip_prefix(prefix).and_then(|s| s.strip_suffix('>')) {
            name = inner.trim().trim_start_matches('&');
        }
    }
    let base = name.split('<').next().unwrap_or(name).trim();
    let last = base.rsplit("::").next().unwrap_or(base);
    let valid = last.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && last.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        last.to_string()
    } else {
        "body".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn body(type_name: &'static str, value: Value) -> Payload {
        Payload::Body { type_name, value }
    }

    fn fields(value: Value) -> Payload {
        match value {
            Value::Object(map) => Payload::Fields(map),
            _ => panic!("fields must be an object"),
        }
    }

    #[test]
    fn media_type_parses_keys_and_content_types() {
        assert_eq!("json".parse::<MediaType>().unwrap(), MediaType::Json);
        assert_eq!("application/json; charset=utf-8".parse::<MediaType>().unwrap(), MediaType::Json);
        assert_eq!("Text/XML".parse::<MediaType>().unwrap(), MediaType::Xml);
        assert_eq!(
            "application/x-www-form-urlencoded".parse::<MediaType>().unwrap(),
            MediaType::FormUrlEncoded
        );
    }

    #[test]
    fn unknown_media_type_is_a_config_error() {
        let err = "text/csv".parse::<MediaType>().unwrap_err();
        assert_eq!(err, ConfigError::UnknownMediaType("text/csv".to_string()));
        assert_eq!(MediaType::from_content_type("text/plain"), None);
    }

    #[test]
    fn json_body_matches_serde_json() {
        let value = json!({"title": "Buy milk", "tags": ["home"]});
        let encoded = encode(MediaType::Json, &body("demo::CreateItem", value.clone())).unwrap();
        assert_eq!(encoded.content_type, "application/json; charset=utf-8");
        assert_eq!(encoded.bytes, serde_json::to_vec(&value).unwrap());
    }

    #[test]
    fn field_map_keeps_declaration_order() {
        let encoded = encode(MediaType::Json, &fields(json!({"zeta": 1, "alpha": 2}))).unwrap();
        assert_eq!(encoded.bytes, br#"{"zeta":1,"alpha":2}"#);
    }

    #[test]
    fn xml_root_is_named_after_the_type() {
        let encoded = encode(MediaType::Xml, &body("&demo::types::Note", json!({"text": "hi"}))).unwrap();
        assert_eq!(String::from_utf8(encoded.bytes).unwrap(), "<Note><text>hi</text></Note>");
    }

    #[test]
    fn xml_fields_use_a_fields_root() {
        let encoded = encode(MediaType::Xml, &fields(json!({"name": "x"}))).unwrap();
        assert_eq!(String::from_utf8(encoded.bytes).unwrap(), "<fields><name>x</name></fields>");
    }

    #[test]
    fn xml_root_strips_wrappers() {
        assert_eq!(xml_root("core::option::Option<&demo::Note>"), "Note");
        assert_eq!(xml_root("alloc::vec::Vec<demo::Note>"), "Vec");
        assert_eq!(xml_root("()"), "body");
        assert_eq!(xml_root("&str"), "str");
    }

    #[test]
    fn form_encoding_repeats_sequence_keys() {
        let encoded = encode(
            MediaType::FormUrlEncoded,
            &fields(json!({"title": "a b", "tags": ["x", "y"], "done": false})),
        )
        .unwrap();
        assert_eq!(encoded.content_type, "application/x-www-form-urlencoded");
        assert_eq!(encoded.bytes, b"title=a+b&tags=x&tags=y&done=false");
    }

    #[test]
    fn form_encoding_rejects_scalars() {
        let err = encode(MediaType::FormUrlEncoded, &body("u32", json!(5))).unwrap_err();
        assert!(matches!(err, CodecError::Form(_)));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Note {
        text: String,
    }

    #[test]
    fn decodes_each_media_type() {
        let json: Note = decode(MediaType::Json, br#"{"text":"a"}"#).unwrap();
        assert_eq!(json.text, "a");
        let xml: Note = decode(MediaType::Xml, b"<Note><text>b</text></Note>").unwrap();
        assert_eq!(xml.text, "b");
        let form: Note = decode(MediaType::FormUrlEncoded, b"text=c+d").unwrap();
        assert_eq!(form.text, "c d");
    }

    #[test]
    fn form_decoding_collects_repeated_keys() {
        let value: Value = decode(MediaType::FormUrlEncoded, b"t=a&t=b&t=c&u=1").unwrap();
        assert_eq!(value, json!({"t": ["a", "b", "c"], "u": "1"}));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Counted {
        name: String,
        quantity: u32,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn form_decoding_parses_typed_fields() {
        let counted: Counted = decode(MediaType::FormUrlEncoded, b"name=x&quantity=3&tags=a").unwrap();
        assert_eq!(
            counted,
            Counted {
                name: "x".to_string(),
                quantity: 3,
                tags: vec!["a".to_string()],
            }
        );
    }

    #[test]
    fn form_encoding_flattens_null_and_nested_values() {
        let encoded = encode(
            MediaType::FormUrlEncoded,
            &fields(json!({"a": null, "b": {"c": 1}, "n": 2.5})),
        )
        .unwrap();
        assert_eq!(encoded.bytes, b"a=&b=%7B%22c%22%3A1%7D&n=2.5");
    }

    #[test]
    fn empty_body_decodes_as_null_for_every_media_type() {
        for media_type in [MediaType::Json, MediaType::Xml, MediaType::FormUrlEncoded] {
            decode::<()>(media_type, b"").unwrap();
            let missing: Option<Note> = decode(media_type, b"\n").unwrap();
            assert_eq!(missing, None);
        }
    }

    #[test]
    fn bad_json_surfaces_the_serde_error() {
        let err = decode::<Note>(MediaType::Json, b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }
}
