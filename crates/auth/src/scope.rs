use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Scope identifier.
///
/// Scopes are opaque strings (e.g. "houses:write") gating one category of
/// operations. There is no hierarchy and no wildcard: a requirement is met only
/// by the exact same string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scope(Cow<'static, str>);

impl Scope {
    pub const USERS_READ: Scope = Scope(Cow::Borrowed("users:read"));
    pub const USERS_WRITE: Scope = Scope(Cow::Borrowed("users:write"));
    pub const HOUSES_READ: Scope = Scope(Cow::Borrowed("houses:read"));
    pub const HOUSES_WRITE: Scope = Scope(Cow::Borrowed("houses:write"));

    /// The application's scope vocabulary.
    pub const ALL: [Scope; 4] = [
        Self::USERS_READ,
        Self::USERS_WRITE,
        Self::HOUSES_READ,
        Self::HOUSES_WRITE,
    ];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Scope {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of scopes, parsed from (and rendered back to) the space-delimited
/// storage/wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet(BTreeSet<Scope>);

impl ScopeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every scope in the vocabulary.
    pub fn all() -> Self {
        Scope::ALL.into_iter().collect()
    }

    /// Parse a space-delimited scope string. Runs of whitespace and
    /// leading/trailing whitespace are ignored.
    pub fn parse(delimited: &str) -> Self {
        delimited
            .split_whitespace()
            .map(|s| Scope::new(s.to_owned()))
            .collect()
    }

    pub fn contains(&self, scope: &Scope) -> bool {
        self.0.contains(scope)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }

    /// Scopes of `required` that this set does not grant, in order.
    pub fn missing<'a>(&self, required: &'a ScopeSet) -> Vec<&'a Scope> {
        required.iter().filter(|s| !self.contains(s)).collect()
    }

    /// Scopes present in both sets.
    pub fn intersection(&self, other: &ScopeSet) -> ScopeSet {
        self.0.intersection(&other.0).cloned().collect()
    }

    /// Narrow a granted set to what a client asked for.
    ///
    /// An empty request means "everything granted". Requested scopes the
    /// principal does not hold are dropped silently.
    pub fn narrow_to(&self, requested: &ScopeSet) -> ScopeSet {
        if requested.is_empty() {
            self.clone()
        } else {
            self.intersection(requested)
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().map(|s| s.as_str().to_owned()).collect()
    }
}

impl FromIterator<Scope> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = Scope>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ScopeSet {
    type Item = &'a Scope;
    type IntoIter = std::collections::btree_set::Iter<'a, Scope>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl core::fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut first = true;
        for scope in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(scope.as_str())?;
            first = false;
        }
        Ok(())
    }
}
