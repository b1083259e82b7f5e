use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parenthesized, parse_macro_input, punctuated::Punctuated, Attribute, DeriveInput, Lit,
    LitBool, LitStr, Path, Token, Type,
};

struct RequestArgs {
    response: Option<Type>,
    name: Option<LitStr>,
}

struct CacheableArgs {
    duration: i64,
    vary_by_user: bool,
    prefix: Option<String>,
}

enum InvalidationArgs {
    Queries(Vec<Path>),
    Pattern(String),
    All,
}

fn path_name(path: &Path) -> String {
    path.segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::")
}

fn parse_request_attr(attr: &Attribute, args: &mut RequestArgs) -> syn::Result<()> {
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("response") {
            args.response = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("name") {
            args.name = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error(format!(
                "unknown attribute `{}`, expected `response` or `name`",
                path_name(&meta.path)
            )))
        }
    })
}

fn parse_cacheable_attr(attr: &Attribute) -> syn::Result<CacheableArgs> {
    let mut duration = None;
    let mut vary_by_user = false;
    let mut prefix = None;

    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("duration") {
            let value = meta.value()?;
            let negative: Option<Token![-]> = value.parse()?;
            let lit: Lit = value.parse()?;
            if let Lit::Int(i) = lit {
                let parsed: i64 = i.base10_parse()?;
                duration = Some(if negative.is_some() { -parsed } else { parsed });
                Ok(())
            } else {
                Err(syn::Error::new(lit.span(), "duration must be an integer"))
            }
        } else if meta.path.is_ident("vary_by_user") {
            vary_by_user = if meta.input.peek(Token![=]) {
                let flag: LitBool = meta.value()?.parse()?;
                flag.value
            } else {
                true
            };
            Ok(())
        } else if meta.path.is_ident("prefix") {
            let lit: LitStr = meta.value()?.parse()?;
            if lit.value().is_empty() {
                return Err(syn::Error::new(lit.span(), "prefix must not be empty"));
            }
            prefix = Some(lit.value());
            Ok(())
        } else {
            Err(meta.error(format!(
                "unknown attribute `{}`, expected `duration`, `vary_by_user`, or `prefix`",
                path_name(&meta.path)
            )))
        }
    })?;

    let duration = duration
        .ok_or_else(|| syn::Error::new_spanned(attr, "missing required attribute `duration`"))?;

    Ok(CacheableArgs {
        duration,
        vary_by_user,
        prefix,
    })
}

fn parse_invalidates_attr(attr: &Attribute) -> syn::Result<InvalidationArgs> {
    let mut form: Option<InvalidationArgs> = None;

    attr.parse_nested_meta(|meta| {
        if form.is_some() {
            return Err(meta.error(
                "`queries`, `pattern` and `all` are mutually exclusive; \
                 use a separate #[invalidates(...)] attribute",
            ));
        }

        if meta.path.is_ident("all") {
            form = Some(InvalidationArgs::All);
            Ok(())
        } else if meta.path.is_ident("pattern") {
            let lit: LitStr = meta.value()?.parse()?;
            if lit.value().is_empty() {
                return Err(syn::Error::new(lit.span(), "pattern must not be empty"));
            }
            form = Some(InvalidationArgs::Pattern(lit.value()));
            Ok(())
        } else if meta.path.is_ident("queries") {
            let content;
            parenthesized!(content in meta.input);
            let paths = Punctuated::<Path, Token![,]>::parse_terminated(&content)?;
            if paths.is_empty() {
                return Err(meta.error("`queries(...)` needs at least one query type"));
            }
            form = Some(InvalidationArgs::Queries(paths.into_iter().collect()));
            Ok(())
        } else {
            Err(meta.error(format!(
                "unknown attribute `{}`, expected `queries`, `pattern`, or `all`",
                path_name(&meta.path)
            )))
        }
    })?;

    form.ok_or_else(|| {
        syn::Error::new_spanned(
            attr,
            "expected `queries(...)`, `pattern = \"...\"`, or `all`",
        )
    })
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let mut request = RequestArgs {
        response: None,
        name: None,
    };
    let mut cacheable = None;
    let mut invalidations = Vec::new();

    for attr in &input.attrs {
        if attr.path().is_ident("request") {
            parse_request_attr(attr, &mut request)?;
        } else if attr.path().is_ident("cacheable") {
            if cacheable.is_some() {
                return Err(syn::Error::new_spanned(
                    attr,
                    "only one #[cacheable(...)] attribute is allowed",
                ));
            }
            cacheable = Some(parse_cacheable_attr(attr)?);
        } else if attr.path().is_ident("invalidates") {
            invalidations.push(parse_invalidates_attr(attr)?);
        }
    }

    let response = request.response.ok_or_else(|| {
        syn::Error::new(
            input.ident.span(),
            "missing required attribute `#[request(response = ...)]`",
        )
    })?;

    let ident = &input.ident;
    let name = request
        .name
        .map(|n| n.value())
        .unwrap_or_else(|| ident.to_string());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let cache_policy = match cacheable {
        Some(args) => {
            let duration = args.duration;
            let vary_by_user = args.vary_by_user;
            let prefix = match args.prefix {
                Some(p) => quote! { .with_prefix(#p) },
                None => quote! {},
            };
            quote! {
                fn cache_policy() -> ::core::option::Option<::query_cache::mediator::CachePolicy> {
                    ::core::option::Option::Some(
                        ::query_cache::mediator::CachePolicy::new(#duration)
                            .vary_by_user(#vary_by_user)
                            #prefix
                    )
                }
            }
        }
        None => quote! {},
    };

    let invalidations = if invalidations.is_empty() {
        quote! {}
    } else {
        let items = invalidations.iter().map(|inv| match inv {
            InvalidationArgs::All => quote! { ::query_cache::mediator::Invalidation::All },
            InvalidationArgs::Pattern(p) => {
                quote! { ::query_cache::mediator::Invalidation::pattern(#p) }
            }
            InvalidationArgs::Queries(paths) => quote! {
                ::query_cache::mediator::Invalidation::queries([
                    #(<#paths as ::query_cache::mediator::Request>::NAME),*
                ])
            },
        });
        quote! {
            fn invalidations() -> ::std::vec::Vec<::query_cache::mediator::Invalidation> {
                ::std::vec![#(#items),*]
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::query_cache::mediator::Request for #ident #ty_generics #where_clause {
            type Response = #response;

            const NAME: &'static str = #name;

            #cache_policy

            #invalidations
        }
    })
}

/// Derives `query_cache::mediator::Request` and attaches caching declarations.
///
/// ```ignore
/// #[derive(Serialize, Request)]
/// #[request(response = Vec<Person>)]
/// #[cacheable(duration = 300)]
/// pub struct ListPeopleQuery;
///
/// #[derive(Serialize, Request)]
/// #[request(response = Person)]
/// #[invalidates(queries(ListPeopleQuery, SearchPeopleQuery))]
/// #[invalidates(pattern = "roles:*")]
/// pub struct CreatePersonCommand { /* ... */ }
/// ```
///
/// - `request(response = T, name = "...")`: response type (required) and an
///   optional name override, used in the cache namespace.
/// - `cacheable(duration = N, vary_by_user, prefix = "...")`: at most once.
/// - `invalidates(queries(..) | pattern = "..." | all)`: repeatable, one form
///   per attribute.
#[proc_macro_derive(Request, attributes(request, cacheable, invalidates))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
