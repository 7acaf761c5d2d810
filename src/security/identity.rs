//! Authenticated principal and its claims.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Set of claim names held by an identity. Order is irrelevant.
pub type ClaimSet = HashSet<String>;

/// Claims attached to an identity.
///
/// `Absent` and an empty `Present` set are different states: the
/// validated-claims guard denies `Absent` without consulting its predicate,
/// but hands an empty set to the predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Claims {
    #[default]
    Absent,
    Present(ClaimSet),
}

impl Claims {
    /// Build a present claim collection from any iterable of names.
    pub fn present<I, S>(claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Claims::Present(claims.into_iter().map(Into::into).collect())
    }

    /// The materialized claim set, if any.
    pub fn as_set(&self) -> Option<&ClaimSet> {
        match self {
            Claims::Absent => None,
            Claims::Present(set) => Some(set),
        }
    }

    /// Whether `claim` is held. Always false when claims are absent.
    pub fn contains(&self, claim: &str) -> bool {
        self.as_set().is_some_and(|set| set.contains(claim))
    }
}

/// The resolved current user of a request.
///
/// Created by the authentication collaborator and attached to the request
/// context before the pipeline runs. Holding an `Identity` does not make a
/// request authenticated; see [`Identity::is_authenticated`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_name: Option<String>,
    #[serde(default)]
    pub claims: Claims,
}

impl Identity {
    /// Identity with a user name and no claims collection.
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: Some(user_name.into()),
            claims: Claims::Absent,
        }
    }

    /// Attach a present claim collection.
    pub fn with_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims = Claims::present(claims);
        self
    }

    /// True when the user name is present and not blank.
    pub fn is_authenticated(&self) -> bool {
        self.user_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_names_are_unauthenticated() {
        assert!(!Identity::default().is_authenticated());
        assert!(!Identity::new("").is_authenticated());
        assert!(!Identity::new("   ").is_authenticated());
        assert!(Identity::new("Bob").is_authenticated());
    }

    #[test]
    fn test_absent_and_empty_claims_differ() {
        let absent = Identity::new("Bob");
        let empty = Identity::new("Bob").with_claims(Vec::<String>::new());

        assert_eq!(absent.claims.as_set(), None);
        assert_eq!(empty.claims.as_set().map(|s| s.len()), Some(0));
        assert_ne!(absent, empty);
        assert!(!absent.claims.contains("Claim1"));
    }
}
