//! Code generation for `#[web_api]`.
//!
//! The annotated trait is re-emitted without its metadata attributes,
//! followed by a `<Trait>Client` struct that implements it. Each generated
//! method body only builds `const` descriptors and converts its arguments;
//! everything else happens in `webapi_core::Client::invoke`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{Error, ItemTrait, LitStr, Result, TraitItem};

use crate::parse::{take_headers, EndpointDef, HeaderDef, ParamDef, ServiceConfig};

pub fn web_api(args: TokenStream, item: TokenStream) -> TokenStream {
    match expand(args, item) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(args: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let mut item: ItemTrait = syn::parse2(item)?;
    let mut service = ServiceConfig::from_args(args)?;
    service.headers = take_headers(&mut item.attrs)?;

    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(&item.generics, "web_api traits cannot be generic"));
    }

    let mut endpoints = Vec::with_capacity(item.items.len());
    for trait_item in &mut item.items {
        match trait_item {
            TraitItem::Fn(method) => endpoints.push(EndpointDef::take(method)?),
            other => {
                return Err(Error::new_spanned(other, "web_api traits may only declare methods"));
            }
        }
    }

    let trait_ident = &item.ident;
    let client_ident = format_ident!("{}Client", trait_ident);
    let vis = &item.vis;
    let service_name = trait_ident.to_string();
    let doc = format!("HTTP client implementing [`{service_name}`].");
    let uri = optional_lit(service.uri.as_ref());
    let media_type = service.media_type.variant();
    let headers = service.headers.iter().map(header_tokens);
    let methods = endpoints.iter().map(method_tokens);

    Ok(quote! {
        #item

        #[doc = #doc]
        #[derive(Debug, Clone)]
        #vis struct #client_ident {
            client: ::webapi_core::Client,
        }

        impl #client_ident {
            /// Client for `base_address` using the default transport.
            #vis fn new(base_address: &str) -> ::core::result::Result<Self, ::webapi_core::ApiError> {
                ::core::result::Result::Ok(Self {
                    client: ::webapi_core::Client::new(base_address)?,
                })
            }
        }

        impl ::webapi_core::Service for #client_ident {
            const DESCRIPTOR: ::webapi_core::ServiceDescriptor = ::webapi_core::ServiceDescriptor {
                name: #service_name,
                uri: #uri,
                media_type: ::webapi_core::MediaType::#media_type,
                headers: &[#(#headers),*],
            };

            fn from_client(client: ::webapi_core::Client) -> Self {
                Self { client }
            }

            fn client(&self) -> &::webapi_core::Client {
                &self.client
            }
        }

        impl #trait_ident for #client_ident {
            #(#methods)*
        }
    })
}

fn method_tokens(endpoint: &EndpointDef) -> TokenStream {
    let sig = &endpoint.sig;
    let name = &endpoint.name;
    let method = match endpoint.method {
        Some(method) => {
            let variant = method.variant();
            quote!(::core::option::Option::Some(::webapi_core::HttpMethod::#variant))
        }
        None => quote!(::core::option::Option::None),
    };
    let template = optional_lit(endpoint.template.as_ref());
    let headers = endpoint.headers.iter().map(header_tokens);
    let params = endpoint.params.iter().map(param_tokens);
    let idents = endpoint.params.iter().map(|p| &p.ident);

    quote! {
        #sig {
            const ENDPOINT: ::webapi_core::EndpointDescriptor = ::webapi_core::EndpointDescriptor {
                name: #name,
                method: #method,
                template: #template,
                headers: &[#(#headers),*],
                params: &[#(#params),*],
            };
            #[allow(clippy::redundant_closure_call)]
            let args = (|| -> ::core::result::Result<::std::vec::Vec<::webapi_core::Argument>, ::webapi_core::ApiError> {
                ::core::result::Result::Ok(::std::vec![#(::webapi_core::Argument::new(&#idents)?),*])
            })();
            self.client.invoke(&<Self as ::webapi_core::Service>::DESCRIPTOR, &ENDPOINT, args)
        }
    }
}

fn param_tokens(param: &ParamDef) -> TokenStream {
    let name = param.ident.to_string();
    let type_name = param.ty.to_token_stream().to_string().replace(' ', "");
    let role = match param.role {
        Some(role) => {
            let variant = role.variant();
            quote!(::core::option::Option::Some(::webapi_core::Role::#variant))
        }
        None => quote!(::core::option::Option::None),
    };
    let alias = optional_lit(param.alias.as_ref());
    quote! {
        ::webapi_core::ParameterDescriptor {
            name: #name,
            role: #role,
            alias: #alias,
            type_name: #type_name,
        }
    }
}

fn header_tokens(header: &HeaderDef) -> TokenStream {
    let key = &header.key;
    let values = &header.values;
    quote! {
        ::webapi_core::Header {
            key: #key,
            values: &[#(#values),*],
        }
    }
}

fn optional_lit(lit: Option<&LitStr>) -> TokenStream {
    match lit {
        Some(lit) => quote!(::core::option::Option::Some(#lit)),
        None => quote!(::core::option::Option::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(args: TokenStream, item: TokenStream) -> String {
        web_api(args, item).to_string()
    }

    #[test]
    fn emits_trait_client_and_descriptors() {
        let out = render(
            quote!(path = "api", media_type = "xml"),
            quote! {
                #[header("User-Agent", "webapi")]
                pub trait Inventory {
                    #[get("items/{p}")]
                    fn search(&self, #[path("p")] page: u32, term: &str) -> Result<Vec<Item>, ApiError>;
                }
            },
        );
        assert!(out.contains("pub trait Inventory"));
        assert!(out.contains("pub struct InventoryClient"));
        assert!(out.contains("impl :: webapi_core :: Service for InventoryClient"));
        assert!(out.contains("impl Inventory for InventoryClient"));
        assert!(out.contains("MediaType :: Xml"));
        assert!(out.contains("\"api\""));
        assert!(out.contains("\"items/{p}\""));
        assert!(out.contains("\"User-Agent\""));
        assert!(out.contains("type_name : \"&str\""));
        assert!(out.contains("alias : :: core :: option :: Option :: Some (\"p\")"));
        assert!(!out.contains("# [path"), "parameter attributes are stripped");
        assert!(!out.contains("# [header"), "header attributes are stripped");
    }

    #[test]
    fn endpoint_without_verb_has_no_method() {
        let out = render(
            TokenStream::new(),
            quote! {
                trait Api {
                    fn ping(&self) -> Result<HttpResponse, ApiError>;
                }
            },
        );
        assert!(out.contains("method : :: core :: option :: Option :: None"));
        assert!(out.contains("template : :: core :: option :: Option :: None"));
        assert!(out.contains("MediaType :: Json"));
    }

    #[test]
    fn raw_method_names_are_unescaped() {
        let out = render(
            TokenStream::new(),
            quote! {
                trait Api {
                    #[get]
                    fn r#type(&self) -> Result<HttpResponse, ApiError>;
                }
            },
        );
        assert!(out.contains("name : \"type\""));
    }

    #[test]
    fn errors_become_compile_errors() {
        let out = render(
            TokenStream::new(),
            quote! {
                trait Api {
                    const LIMIT: u32;
                }
            },
        );
        assert!(out.contains("compile_error"));
        assert!(out.contains("may only declare methods"));

        let out = render(
            TokenStream::new(),
            quote! {
                trait Api<T> {
                    fn get(&self) -> Result<T, ApiError>;
                }
            },
        );
        assert!(out.contains("cannot be generic"));
    }
}
