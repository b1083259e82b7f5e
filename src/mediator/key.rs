//! Deterministic cache keys derived from a request's type and fields.
//!
//! A key reads `{namespace}:{fields}`, the namespace being the request name,
//! under the policy prefix when one is set. Object fields render as sorted
//! `name=value` pairs joined by `&`, names escaped and values in canonical
//! JSON, so two requests with equal fields always share a key no matter how
//! their fields were declared or populated, and unequal fields never do.
//! Overlong field renderings are replaced by a SHA-256 digest.
//! Principal-varying policies append `|principal=...`.

use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::mediator::{CachePolicy, Request, RequestContext, RequestEnvelope};

/// Field renderings longer than this are hashed.
const MAX_INLINE_FIELDS: usize = 200;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("request '{request}' could not be serialized for its cache key: {source}")]
    Serialization {
        request: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub struct CacheKeyGenerator;

impl CacheKeyGenerator {
    /// Key for a request travelling through the pipeline.
    pub fn generate(
        request: &RequestEnvelope<'_>,
        policy: &CachePolicy,
    ) -> Result<String, KeyError> {
        let fields = request
            .request()
            .to_json()
            .map_err(|source| KeyError::Serialization {
                request: request.name(),
                source,
            })?;
        Ok(Self::build(request.name(), &fields, policy, request.context()))
    }

    /// Key for a typed request, as the caching behavior would compute it.
    pub fn generate_for<R: Request>(
        request: &R,
        policy: &CachePolicy,
        context: &RequestContext,
    ) -> Result<String, KeyError> {
        let fields = serde_json::to_value(request).map_err(|source| KeyError::Serialization {
            request: R::NAME,
            source,
        })?;
        Ok(Self::build(R::NAME, &fields, policy, context))
    }

    fn build(
        request_name: &str,
        fields: &Value,
        policy: &CachePolicy,
        context: &RequestContext,
    ) -> String {
        let mut rendered = render_fields(fields);
        if rendered.len() > MAX_INLINE_FIELDS {
            rendered = format!("#{}", hex::encode(Sha256::digest(rendered.as_bytes())));
        }

        let mut key = format!("{}:{}", policy.namespace(request_name), rendered);
        if policy.varies_by_user() {
            key.push_str("|principal=");
            match context.principal() {
                Some(principal) => write_string(principal, &mut key),
                None => key.push_str("null"),
            }
        }
        key
    }
}

/// Top-level rendering: objects become `name=value` pairs, a fieldless
/// request renders empty.
fn render_fields(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Null => {}
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            for (i, (name, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push('&');
                }
                write_field_name(name, &mut out);
                out.push('=');
                write_canonical(value, &mut out);
            }
        }
        other => write_canonical(other, &mut out),
    }
    out
}

/// JSON with object members sorted by name and no whitespace.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (name, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(name, out);
                out.push(':');
                write_canonical(value, out);
            }
            out.push('}');
        }
    }
}

/// Names come from user data when a map is flattened into the request.
fn write_field_name(name: &str, out: &mut String) {
    for c in name.chars() {
        if matches!(c, '\\' | '&' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
}

fn write_string(s: &str, out: &mut String) {
    // Serializing a str cannot fail.
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => out.push_str(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct ListAll;

    impl Request for ListAll {
        type Response = Vec<String>;
        const NAME: &'static str = "ListAll";
    }

    #[derive(Serialize)]
    struct ById {
        id: u32,
    }

    impl Request for ById {
        type Response = Option<String>;
        const NAME: &'static str = "ById";
    }

    #[derive(Serialize)]
    struct ById2 {
        id: u32,
    }

    impl Request for ById2 {
        type Response = Option<String>;
        const NAME: &'static str = "ById2";
    }

    #[derive(Serialize)]
    struct Search {
        term: String,
        page: u32,
        filter: Filter,
    }

    #[derive(Serialize)]
    struct Filter {
        roles: Vec<String>,
        active: Option<bool>,
    }

    impl Request for Search {
        type Response = Vec<String>;
        const NAME: &'static str = "Search";
    }

    // Same fields as `Search`, declared in another order.
    #[derive(Serialize)]
    struct SearchReordered {
        page: u32,
        filter: FilterReordered,
        term: String,
    }

    #[derive(Serialize)]
    struct FilterReordered {
        active: Option<bool>,
        roles: Vec<String>,
    }

    impl Request for SearchReordered {
        type Response = Vec<String>;
        const NAME: &'static str = "Search";
    }

    fn anonymous() -> RequestContext {
        RequestContext::anonymous()
    }

    fn key<R: Request>(request: &R, policy: &CachePolicy, ctx: &RequestContext) -> String {
        CacheKeyGenerator::generate_for(request, policy, ctx).unwrap()
    }

    #[test]
    fn test_fieldless_request_key() {
        let policy = CachePolicy::new(60);
        assert_eq!(key(&ListAll, &policy, &anonymous()), "ListAll:");
    }

    #[test]
    fn test_single_field_key() {
        let policy = CachePolicy::new(60);
        assert_eq!(key(&ById { id: 7 }, &policy, &anonymous()), "ById:id=7");
        assert_ne!(
            key(&ById { id: 7 }, &policy, &anonymous()),
            key(&ById { id: 8 }, &policy, &anonymous())
        );
    }

    #[test]
    fn test_prefix_goes_ahead_of_type_name() {
        let policy = CachePolicy::new(60).with_prefix("people");
        assert_eq!(
            key(&ById { id: 1 }, &policy, &anonymous()),
            "people:ById:id=1"
        );
        assert_ne!(
            key(&ById { id: 1 }, &policy, &anonymous()),
            key(&ById2 { id: 1 }, &policy, &anonymous())
        );
    }

    #[test]
    fn test_flattened_map_names_stay_distinct() {
        #[derive(Serialize)]
        struct Filtered {
            #[serde(flatten)]
            terms: BTreeMap<String, u32>,
        }
        impl Request for Filtered {
            type Response = ();
            const NAME: &'static str = "Filtered";
        }

        let policy = CachePolicy::new(60);
        let plain = Filtered {
            terms: BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)]),
        };
        let crafted = Filtered {
            terms: BTreeMap::from([("a=1&b".to_string(), 2)]),
        };

        let plain_key = key(&plain, &policy, &anonymous());
        assert_eq!(plain_key, "Filtered:a=1&b=2");
        assert_eq!(
            key(&crafted, &policy, &anonymous()),
            r"Filtered:a\=1\&b=2"
        );
        assert_ne!(plain_key, key(&crafted, &policy, &anonymous()));
    }

    #[test]
    fn test_nested_fields_ignore_declaration_order() {
        let policy = CachePolicy::new(60);
        let a = Search {
            term: "ada".into(),
            page: 2,
            filter: Filter {
                roles: vec!["admin".into(), "ops".into()],
                active: Some(true),
            },
        };
        let b = SearchReordered {
            page: 2,
            filter: FilterReordered {
                active: Some(true),
                roles: vec!["admin".into(), "ops".into()],
            },
            term: "ada".into(),
        };
        let key_a = key(&a, &policy, &anonymous());
        assert_eq!(key_a, key(&b, &policy, &anonymous()));
        assert_eq!(
            key_a,
            r#"Search:filter={"active":true,"roles":["admin","ops"]}&page=2&term="ada""#
        );
    }

    #[test]
    fn test_string_values_stay_distinct() {
        #[derive(Serialize)]
        struct Text {
            a: String,
            b: String,
        }
        impl Request for Text {
            type Response = ();
            const NAME: &'static str = "Text";
        }

        let policy = CachePolicy::new(60);
        let one = Text {
            a: "x&b=y".into(),
            b: String::new(),
        };
        let two = Text {
            a: "x".into(),
            b: "y".into(),
        };
        assert_ne!(
            key(&one, &policy, &anonymous()),
            key(&two, &policy, &anonymous())
        );
    }

    #[test]
    fn test_long_fields_are_hashed() {
        #[derive(Serialize)]
        struct Long {
            body: String,
        }
        impl Request for Long {
            type Response = ();
            const NAME: &'static str = "Long";
        }

        let policy = CachePolicy::new(60);
        let generated = key(
            &Long {
                body: "x".repeat(500),
            },
            &policy,
            &anonymous(),
        );
        let digest = generated.strip_prefix("Long:#").unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));

        let other = key(
            &Long {
                body: "y".repeat(500),
            },
            &policy,
            &anonymous(),
        );
        assert_ne!(generated, other);
    }

    #[test]
    fn test_vary_by_user_appends_principal() {
        let policy = CachePolicy::new(60).vary_by_user(true);
        let alice = key(&ListAll, &policy, &RequestContext::for_principal("alice"));
        let bob = key(&ListAll, &policy, &RequestContext::for_principal("bob"));
        let nobody = key(&ListAll, &policy, &anonymous());

        assert_eq!(alice, r#"ListAll:|principal="alice""#);
        assert_eq!(nobody, "ListAll:|principal=null");
        assert_ne!(alice, bob);
    }

    #[test]
    fn test_principal_ignored_without_vary_by_user() {
        let policy = CachePolicy::new(60);
        assert_eq!(
            key(&ListAll, &policy, &RequestContext::for_principal("alice")),
            key(&ListAll, &policy, &anonymous())
        );
    }

    proptest! {
        #[test]
        fn prop_key_is_deterministic(id in any::<u32>(), term in ".{0,300}") {
            let policy = CachePolicy::new(60);
            let request = Search {
                term: term.clone(),
                page: id,
                filter: Filter { roles: vec![term], active: None },
            };
            let first = key(&request, &policy, &anonymous());
            let second = key(&request, &policy, &anonymous());
            prop_assert_eq!(&first, &second);
            prop_assert!(first.starts_with("Search:"));
        }

        #[test]
        fn prop_distinct_ids_give_distinct_keys(a in any::<u32>(), b in any::<u32>()) {
            prop_assume!(a != b);
            let policy = CachePolicy::new(60);
            prop_assert_ne!(
                key(&ById { id: a }, &policy, &anonymous()),
                key(&ById { id: b }, &policy, &anonymous())
            );
        }
    }
}
