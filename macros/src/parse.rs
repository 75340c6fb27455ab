//! Parsing of `#[web_api]` metadata attributes.
//!
//! Every helper here removes the attributes it understands from the item
//! it inspects, so the trait re-emitted by the macro carries only the
//! user's remaining attributes (docs, lints).

use proc_macro2::TokenStream;
use syn::{
    ext::IdentExt, parse::Parser, punctuated::Punctuated, Attribute, Error, FnArg, Ident, LitStr,
    Meta, Pat, PatType, Result, ReturnType, Signature, Token, TraitItemFn, Type,
};

/// Service-level configuration from `#[web_api(...)]` and trait `#[header]`s.
#[derive(Debug, Default)]
pub struct ServiceConfig {
    pub uri: Option<LitStr>,
    pub media_type: MediaType,
    pub headers: Vec<HeaderDef>,
}

impl ServiceConfig {
    /// Parse the attribute arguments: `path = "..."`, `media_type = "..."`.
    pub fn from_args(args: TokenStream) -> Result<Self> {
        let mut config = ServiceConfig::default();
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("path") {
                config.uri = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("media_type") {
                let lit: LitStr = meta.value()?.parse()?;
                config.media_type = MediaType::from_lit(&lit)?;
            } else {
                return Err(meta.error(format!(
                    "unknown web_api argument: `{}`. Expected `path` or `media_type`",
                    meta.path.get_ident().map(|i| i.to_string()).unwrap_or_default()
                )));
            }
            Ok(())
        });
        parser.parse2(args)?;
        Ok(config)
    }
}

/// Body media type, mirroring `webapi_core::MediaType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Json,
    Xml,
    FormUrlEncoded,
}

impl MediaType {
    pub fn from_lit(lit: &LitStr) -> Result<Self> {
        let value = lit.value();
        let essence = value.split(';').next().unwrap_or(&value).trim().to_ascii_lowercase();
        match essence.as_str() {
            "json" | "application/json" | "text/json" => Ok(MediaType::Json),
            "xml" | "application/xml" | "text/xml" => Ok(MediaType::Xml),
            "form" | "formurlencoded" | "application/x-www-form-urlencoded" => {
                Ok(MediaType::FormUrlEncoded)
            }
            _ => Err(Error::new(
                lit.span(),
                format!("unsupported media type `{value}`. Expected one of: json, xml, form"),
            )),
        }
    }

    pub fn variant(&self) -> Ident {
        let name = match self {
            MediaType::Json => "Json",
            MediaType::Xml => "Xml",
            MediaType::FormUrlEncoded => "FormUrlEncoded",
        };
        Ident::new(name, proc_macro2::Span::call_site())
    }
}

/// `#[header("Key", "value", ...)]`
#[derive(Debug, Clone)]
pub struct HeaderDef {
    pub key: LitStr,
    pub values: Vec<LitStr>,
}

impl HeaderDef {
    fn from_attr(attr: &Attribute) -> Result<Self> {
        let lits = attr.parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)?;
        let mut lits = lits.into_iter();
        let key = lits.next().ok_or_else(|| {
            Error::new_spanned(attr, "expected `#[header(\"Key\", \"value\", ...)]`")
        })?;
        Ok(Self {
            key,
            values: lits.collect(),
        })
    }
}

/// Remove every `#[header]` from `attrs`, returning them in order.
pub fn take_headers(attrs: &mut Vec<Attribute>) -> Result<Vec<HeaderDef>> {
    let mut headers = Vec::new();
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs.drain(..) {
        if attr.path().is_ident("header") {
            headers.push(HeaderDef::from_attr(&attr)?);
        } else {
            kept.push(attr);
        }
    }
    *attrs = kept;
    Ok(headers)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn from_attr(attr: &Attribute) -> Option<Self> {
        let path = attr.path();
        if path.is_ident("get") {
            Some(HttpMethod::Get)
        } else if path.is_ident("post") {
            Some(HttpMethod::Post)
        } else if path.is_ident("put") {
            Some(HttpMethod::Put)
        } else if path.is_ident("delete") {
            Some(HttpMethod::Delete)
        } else {
            None
        }
    }

    pub fn variant(&self) -> Ident {
        let name = match self {
            HttpMethod::Get => "Get",
            HttpMethod::Post => "Post",
            HttpMethod::Put => "Put",
            HttpMethod::Delete => "Delete",
        };
        Ident::new(name, proc_macro2::Span::call_site())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Path,
    Query,
    Field,
    Body,
}

impl Role {
    fn from_attr(attr: &Attribute) -> Option<Self> {
        let path = attr.path();
        if path.is_ident("path") {
            Some(Role::Path)
        } else if path.is_ident("query") {
            Some(Role::Query)
        } else if path.is_ident("field") {
            Some(Role::Field)
        } else if path.is_ident("body") {
            Some(Role::Body)
        } else {
            None
        }
    }

    pub fn variant(&self) -> Ident {
        let name = match self {
            Role::Path => "Path",
            Role::Query => "Query",
            Role::Field => "Field",
            Role::Body => "Body",
        };
        Ident::new(name, proc_macro2::Span::call_site())
    }
}

/// One method parameter with its role metadata.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub ident: Ident,
    pub ty: Type,
    pub role: Option<Role>,
    pub alias: Option<LitStr>,
}

impl ParamDef {
    fn take(arg: &mut PatType) -> Result<Self> {
        let ident = match &*arg.pat {
            Pat::Ident(pat) if pat.subpat.is_none() => pat.ident.clone(),
            other => {
                return Err(Error::new_spanned(
                    other,
                    "web_api parameters must be plain identifiers",
                ))
            }
        };

        let mut role = None;
        let mut alias = None;
        let mut kept = Vec::with_capacity(arg.attrs.len());
        for attr in arg.attrs.drain(..) {
            let Some(found) = Role::from_attr(&attr) else {
                kept.push(attr);
                continue;
            };
            if role.is_some() {
                return Err(Error::new_spanned(&attr, "a parameter may declare only one role"));
            }
            role = Some(found);
            alias = match &attr.meta {
                Meta::Path(_) => None,
                Meta::List(_) if found == Role::Body => {
                    return Err(Error::new_spanned(&attr, "`#[body]` does not take an alias"));
                }
                Meta::List(_) => Some(attr.parse_args::<LitStr>()?),
                Meta::NameValue(_) => {
                    return Err(Error::new_spanned(&attr, "expected `#[role]` or `#[role(\"alias\")]`"));
                }
            };
        }
        arg.attrs = kept;

        Ok(Self {
            ident,
            ty: (*arg.ty).clone(),
            role,
            alias,
        })
    }
}

/// One trait method with its endpoint metadata.
#[derive(Debug, Clone)]
pub struct EndpointDef {
    pub name: String,
    pub method: Option<HttpMethod>,
    pub template: Option<LitStr>,
    pub headers: Vec<HeaderDef>,
    pub params: Vec<ParamDef>,
    /// Signature with metadata attributes removed.
    pub sig: Signature,
}

impl EndpointDef {
    pub fn take(item: &mut TraitItemFn) -> Result<Self> {
        if let Some(body) = &item.default {
            return Err(Error::new_spanned(body, "web_api methods must not have a default body"));
        }
        let sig = &mut item.sig;
        if let Some(asyncness) = &sig.asyncness {
            return Err(Error::new_spanned(
                asyncness,
                "declare `fn ... -> Pending<T>` instead of `async fn`",
            ));
        }
        if !sig.generics.params.is_empty() {
            return Err(Error::new_spanned(&sig.generics, "web_api methods cannot be generic"));
        }
        match sig.receiver() {
            Some(receiver) if receiver.reference.is_some() && receiver.mutability.is_none() => {}
            _ => {
                return Err(Error::new_spanned(
                    &sig.ident,
                    "web_api methods must take `&self` as their first parameter",
                ))
            }
        }
        if let ReturnType::Default = sig.output {
            return Err(Error::new_spanned(&sig.ident, "web_api methods must declare a return type"));
        }

        let mut params = Vec::new();
        for input in sig.inputs.iter_mut() {
            if let FnArg::Typed(arg) = input {
                params.push(ParamDef::take(arg)?);
            }
        }

        let mut method = None;
        let mut template = None;
        let mut headers = Vec::new();
        let mut kept = Vec::with_capacity(item.attrs.len());
        for attr in item.attrs.drain(..) {
            if attr.path().is_ident("header") {
                headers.push(HeaderDef::from_attr(&attr)?);
            } else if let Some(verb) = HttpMethod::from_attr(&attr) {
                if method.is_some() {
                    return Err(Error::new_spanned(&attr, "a method may declare only one HTTP verb"));
                }
                method = Some(verb);
                template = match &attr.meta {
                    Meta::Path(_) => None,
                    Meta::List(_) => Some(attr.parse_args::<LitStr>()?),
                    Meta::NameValue(_) => {
                        return Err(Error::new_spanned(
                            &attr,
                            "expected `#[verb]` or `#[verb(\"template\")]`",
                        ));
                    }
                };
            } else {
                kept.push(attr);
            }
        }
        item.attrs = kept;

        Ok(Self {
            name: item.sig.ident.unraw().to_string(),
            method,
            template,
            headers,
            params,
            sig: item.sig.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::parse_quote;

    use super::*;

    #[test]
    fn service_args_are_parsed() {
        let config = ServiceConfig::from_args(quote!(path = "api/v3", media_type = "xml")).unwrap();
        assert_eq!(config.uri.unwrap().value(), "api/v3");
        assert_eq!(config.media_type, MediaType::Xml);
    }

    #[test]
    fn empty_service_args_default_to_json() {
        let config = ServiceConfig::from_args(TokenStream::new()).unwrap();
        assert!(config.uri.is_none());
        assert_eq!(config.media_type, MediaType::Json);
    }

    #[test]
    fn unknown_service_arg_is_rejected() {
        let err = ServiceConfig::from_args(quote!(base_url = "x")).unwrap_err();
        assert!(err.to_string().contains("unknown web_api argument"));
    }

    #[test]
    fn unknown_media_type_is_rejected() {
        let err = ServiceConfig::from_args(quote!(media_type = "text/csv")).unwrap_err();
        assert!(err.to_string().contains("unsupported media type"));
    }

    #[test]
    fn headers_are_taken_in_order() {
        let mut attrs: Vec<Attribute> = vec![
            parse_quote!(#[doc = "docs stay"]),
            parse_quote!(#[header("User-Agent", "webapi")]),
            parse_quote!(#[header("Accept", "a", "b")]),
        ];
        let headers = take_headers(&mut attrs).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(headers[0].key.value(), "User-Agent");
        assert_eq!(headers[1].values.len(), 2);
    }

    #[test]
    fn endpoint_metadata_is_extracted() {
        let mut item: TraitItemFn = parse_quote! {
            /// Search items.
            #[get("items/{p}")]
            #[header("X-Trace", "1")]
            fn search(&self, term: &str, #[path("p")] page: u32) -> Result<Vec<Item>, ApiError>;
        };
        let endpoint = EndpointDef::take(&mut item).unwrap();
        assert_eq!(endpoint.name, "search");
        assert_eq!(endpoint.method, Some(HttpMethod::Get));
        assert_eq!(endpoint.template.unwrap().value(), "items/{p}");
        assert_eq!(endpoint.headers.len(), 1);
        assert_eq!(endpoint.params[0].role, None);
        assert_eq!(endpoint.params[1].role, Some(Role::Path));
        assert_eq!(endpoint.params[1].alias.as_ref().unwrap().value(), "p");
        assert_eq!(item.attrs.len(), 1, "only the doc comment remains");
        let FnArg::Typed(page) = &item.sig.inputs[2] else {
            panic!("expected typed argument");
        };
        assert!(page.attrs.is_empty());
    }

    #[test]
    fn verb_without_template_is_allowed() {
        let mut item: TraitItemFn = parse_quote! {
            #[post]
            fn create(&self, #[body] item: NewItem) -> Pending<Item>;
        };
        let endpoint = EndpointDef::take(&mut item).unwrap();
        assert_eq!(endpoint.method, Some(HttpMethod::Post));
        assert!(endpoint.template.is_none());
        assert_eq!(endpoint.params[0].role, Some(Role::Body));
    }

    #[test]
    fn two_verbs_are_rejected() {
        let mut item: TraitItemFn = parse_quote! {
            #[get]
            #[post]
            fn both(&self) -> Result<(), ApiError>;
        };
        let err = EndpointDef::take(&mut item).unwrap_err();
        assert!(err.to_string().contains("only one HTTP verb"));
    }

    #[test]
    fn body_alias_is_rejected() {
        let mut item: TraitItemFn = parse_quote! {
            #[post]
            fn create(&self, #[body("b")] item: NewItem) -> Result<(), ApiError>;
        };
        let err = EndpointDef::take(&mut item).unwrap_err();
        assert!(err.to_string().contains("does not take an alias"));
    }

    #[test]
    fn async_and_owned_receivers_are_rejected() {
        let mut item: TraitItemFn = parse_quote! {
            async fn ping(&self) -> Result<(), ApiError>;
        };
        assert!(EndpointDef::take(&mut item).is_err());

        let mut item: TraitItemFn = parse_quote! {
            fn ping(self) -> Result<(), ApiError>;
        };
        assert!(EndpointDef::take(&mut item).is_err());

        let mut item: TraitItemFn = parse_quote! {
            fn ping(&self);
        };
        assert!(EndpointDef::take(&mut item).is_err());
    }
}
