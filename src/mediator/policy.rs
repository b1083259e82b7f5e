//! Cacheable and invalidation declarations, and the registry that resolves
//! them by request name at dispatch time.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use thiserror::Error;

use crate::cache::EntryOptions;
use crate::mediator::Request;

/// Declares a query's result cacheable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// `None` when the declared duration was not positive; the configured
    /// default applies instead.
    duration: Option<Duration>,
    vary_by_user: bool,
    prefix: Option<String>,
}

impl CachePolicy {
    /// A policy caching for `duration_seconds`. Zero or negative values fall
    /// back to the configured default duration.
    pub fn new(duration_seconds: i64) -> Self {
        let duration = u64::try_from(duration_seconds)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Self {
            duration,
            vary_by_user: false,
            prefix: None,
        }
    }

    pub fn vary_by_user(mut self, vary: bool) -> Self {
        self.vary_by_user = vary;
        self
    }

    /// Group the request's keys under `prefix`, ahead of the request name.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn effective_duration(&self, default: Duration) -> Duration {
        self.duration.unwrap_or(default)
    }

    pub fn varies_by_user(&self) -> bool {
        self.vary_by_user
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Key namespace for a request of type `request_name`: the name itself,
    /// or `{prefix}:{name}` when a prefix is set.
    pub fn namespace<'a>(&self, request_name: &'a str) -> Cow<'a, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{request_name}")),
            None => Cow::Borrowed(request_name),
        }
    }

    pub fn entry_options(&self, default: Duration) -> EntryOptions {
        EntryOptions::absolute(self.effective_duration(default))
    }
}

/// Which cached results a command makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Every entry of the named query types.
    Queries(Vec<&'static str>),
    /// Every key matching a glob pattern (`*` and `?`).
    Pattern(String),
    /// The whole cache.
    All,
}

impl Invalidation {
    pub fn queries<I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        Self::Queries(names.into_iter().collect())
    }

    pub fn query<R: Request>() -> Self {
        Self::Queries(vec![R::NAME])
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern(pattern.into())
    }
}

/// Two distinct request types claimed the same name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request name '{name}' is already used by another request type")]
pub struct DuplicateRequestName {
    pub name: &'static str,
}

/// Policies and invalidations keyed by request name.
///
/// Populated from each registered request's declarations; programmatic
/// overrides win over declared policies. Each name belongs to exactly one
/// request type.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: HashMap<&'static str, CachePolicy>,
    invalidations: HashMap<&'static str, Vec<Invalidation>>,
    owners: HashMap<&'static str, TypeId>,
    declared: HashSet<&'static str>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `R::NAME` to `R`. Fails when another type already holds the name.
    pub fn claim<R: Request>(&mut self) -> Result<(), DuplicateRequestName> {
        let id = TypeId::of::<R>();
        match self.owners.entry(R::NAME).or_insert(id) {
            owner if *owner == id => Ok(()),
            _ => Err(DuplicateRequestName { name: R::NAME }),
        }
    }

    /// Record the declarations attached to `R`. Repeated calls are no-ops.
    pub fn declare<R: Request>(&mut self) -> Result<(), DuplicateRequestName> {
        self.claim::<R>()?;
        if !self.declared.insert(R::NAME) {
            return Ok(());
        }
        if let Some(policy) = R::cache_policy() {
            self.policies.entry(R::NAME).or_insert(policy);
        }
        let declared = R::invalidations();
        if !declared.is_empty() {
            let list = self.invalidations.entry(R::NAME).or_default();
            list.splice(0..0, declared);
        }
        Ok(())
    }

    pub fn set_policy(&mut self, request_name: &'static str, policy: CachePolicy) {
        self.policies.insert(request_name, policy);
    }

    pub fn add_invalidation(&mut self, request_name: &'static str, invalidation: Invalidation) {
        self.invalidations
            .entry(request_name)
            .or_default()
            .push(invalidation);
    }

    pub fn policy(&self, request_name: &str) -> Option<&CachePolicy> {
        self.policies.get(request_name)
    }

    pub fn invalidations(&self, request_name: &str) -> &[Invalidation] {
        self.invalidations
            .get(request_name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Key namespace used for `request_name`'s entries.
    pub fn namespace_for<'a>(&self, request_name: &'a str) -> Cow<'a, str> {
        match self.policies.get(request_name) {
            Some(policy) => policy.namespace(request_name),
            None => Cow::Borrowed(request_name),
        }
    }
}
