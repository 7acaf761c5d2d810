//! Declarative security policies.
//!
//! # Responsibilities
//! - Translate intents ("requires authentication", "requires claims", ...)
//!   into guards
//! - Decide where each guard lands in the module's pipeline
//!
//! # Pipeline contributions
//! ```text
//! requires_authentication     1 guard  at end
//! requires_claims             2 guards at end    (authentication, claims)
//! requires_any_claim          2 guards at end    (authentication, any-claim)
//! requires_validated_claims   2 guards at start  (authentication runs first)
//! requires_https              1 guard  at end
//! ```
//!
//! # Design Decisions
//! - Claim guards also reject unauthenticated requests themselves, so they
//!   are correct even when moved or used on their own
//! - Validated-claims checks go to the start: the latest declaration runs
//!   before everything registered earlier

use std::borrow::Cow;
use std::sync::Arc;

use crate::http::context::RequestContext;
use crate::http::response::GuardResponse;
use crate::security::guard::{BoxError, Guard, GuardError, GuardResult};
use crate::security::https::HttpsGuard;
use crate::security::identity::{ClaimSet, Claims, Identity};
use crate::security::module::HookedModule;

/// Pipeline item names used by the built-in policies.
pub mod names {
    pub const REQUIRES_AUTHENTICATION: &str = "requires_authentication";
    pub const REQUIRES_CLAIMS: &str = "requires_claims";
    pub const REQUIRES_ANY_CLAIM: &str = "requires_any_claim";
    pub const REQUIRES_VALIDATED_CLAIMS: &str = "requires_validated_claims";
    pub const REQUIRES_HTTPS: &str = "requires_https";
}

type ClaimsValidator = dyn Fn(&ClaimSet) -> Result<bool, BoxError> + Send + Sync;

/// Returns the authenticated user, or the 401 to send instead.
fn authenticated(context: &RequestContext) -> Result<&Identity, GuardResponse> {
    match context.current_user() {
        Some(user) if user.is_authenticated() => Ok(user),
        _ => Err(GuardResponse::unauthorized()),
    }
}

/// Rejects requests without an authenticated user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationGuard;

impl Guard for AuthenticationGuard {
    fn check(&self, context: &RequestContext) -> GuardResult {
        Ok(authenticated(context).err())
    }

    fn name(&self) -> Cow<'static, str> {
        names::REQUIRES_AUTHENTICATION.into()
    }
}

/// Requires every listed claim.
#[derive(Debug, Clone)]
pub struct ClaimsGuard {
    required: ClaimSet,
}

impl ClaimsGuard {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }
}

impl Guard for ClaimsGuard {
    fn check(&self, context: &RequestContext) -> GuardResult {
        let user = match authenticated(context) {
            Ok(user) => user,
            Err(denied) => return Ok(Some(denied)),
        };

        let satisfied = self
            .required
            .iter()
            .all(|claim| user.claims.contains(claim));

        Ok((!satisfied).then(GuardResponse::forbidden))
    }

    fn name(&self) -> Cow<'static, str> {
        names::REQUIRES_CLAIMS.into()
    }
}

/// Requires at least one of the listed claims.
#[derive(Debug, Clone)]
pub struct AnyClaimGuard {
    accepted: ClaimSet,
}

impl AnyClaimGuard {
    pub fn new<I, S>(accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: accepted.into_iter().map(Into::into).collect(),
        }
    }
}

impl Guard for AnyClaimGuard {
    fn check(&self, context: &RequestContext) -> GuardResult {
        let user = match authenticated(context) {
            Ok(user) => user,
            Err(denied) => return Ok(Some(denied)),
        };

        let satisfied = self
            .accepted
            .iter()
            .any(|claim| user.claims.contains(claim));

        Ok((!satisfied).then(GuardResponse::forbidden))
    }

    fn name(&self) -> Cow<'static, str> {
        names::REQUIRES_ANY_CLAIM.into()
    }
}

/// Hands the user's claims to a predicate.
///
/// The predicate runs at most once per check, and never when the identity has
/// no claims collection. Predicate errors are returned as
/// [`GuardError::Predicate`], not turned into a 403.
#[derive(Clone)]
pub struct ValidatedClaimsGuard {
    validator: Arc<ClaimsValidator>,
}

impl ValidatedClaimsGuard {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&ClaimSet) -> bool + Send + Sync + 'static,
    {
        Self {
            validator: Arc::new(move |claims: &ClaimSet| -> Result<bool, BoxError> {
                Ok(predicate(claims))
            }),
        }
    }

    pub fn fallible<F, E>(predicate: F) -> Self
    where
        F: Fn(&ClaimSet) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self {
            validator: Arc::new(move |claims: &ClaimSet| -> Result<bool, BoxError> {
                predicate(claims).map_err(Into::into)
            }),
        }
    }
}

impl std::fmt::Debug for ValidatedClaimsGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedClaimsGuard").finish_non_exhaustive()
    }
}

impl Guard for ValidatedClaimsGuard {
    fn check(&self, context: &RequestContext) -> GuardResult {
        let user = match authenticated(context) {
            Ok(user) => user,
            Err(denied) => return Ok(Some(denied)),
        };

        let claims = match &user.claims {
            Claims::Absent => return Ok(Some(GuardResponse::forbidden())),
            Claims::Present(claims) => claims,
        };

        let valid = (self.validator)(claims).map_err(|source| GuardError::Predicate {
            guard: names::REQUIRES_VALIDATED_CLAIMS.into(),
            source,
        })?;

        Ok((!valid).then(GuardResponse::forbidden))
    }

    fn name(&self) -> Cow<'static, str> {
        names::REQUIRES_VALIDATED_CLAIMS.into()
    }
}

/// Policy declarations available on every module.
pub trait ModuleSecurity: HookedModule {
    /// Any authenticated user. Adds one guard at the end.
    fn requires_authentication(&mut self) -> &mut Self {
        self.before().insert_at_end(AuthenticationGuard);
        self
    }

    /// An authenticated user holding every claim in `claims`.
    /// Adds two guards at the end.
    fn requires_claims<I, S>(&mut self, claims: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.before();
        before.insert_at_end(AuthenticationGuard);
        before.insert_at_end(ClaimsGuard::new(claims));
        self
    }

    /// An authenticated user holding at least one claim in `claims`.
    /// Adds two guards at the end.
    fn requires_any_claim<I, S>(&mut self, claims: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.before();
        before.insert_at_end(AuthenticationGuard);
        before.insert_at_end(AnyClaimGuard::new(claims));
        self
    }

    /// An authenticated user whose claims satisfy `predicate`.
    /// Adds two guards at the start; authentication runs first.
    fn requires_validated_claims<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&ClaimSet) -> bool + Send + Sync + 'static,
    {
        push_validated_claims(self.before(), ValidatedClaimsGuard::new(predicate));
        self
    }

    /// Like [`requires_validated_claims`](Self::requires_validated_claims) for
    /// predicates that can fail. Failures propagate out of the pipeline.
    fn requires_validated_claims_fallible<F, E>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&ClaimSet) -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        push_validated_claims(self.before(), ValidatedClaimsGuard::fallible(predicate));
        self
    }

    /// Requests must use HTTPS, redirecting plaintext GETs. This is the
    /// default form of [`requires_https`](Self::requires_https).
    fn requires_secure(&mut self) -> &mut Self {
        self.requires_https(true)
    }

    /// Requests must use HTTPS; plaintext GETs are redirected when `redirect`
    /// is set. Adds one guard at the end.
    fn requires_https(&mut self, redirect: bool) -> &mut Self {
        self.before().insert_at_end(HttpsGuard::new(redirect));
        self
    }

    /// Like [`requires_https`](Self::requires_https), redirecting to `port`.
    fn requires_https_on_port(&mut self, redirect: bool, port: u16) -> &mut Self {
        self.before().insert_at_end(HttpsGuard::with_port(redirect, port));
        self
    }
}

impl<M: HookedModule + ?Sized> ModuleSecurity for M {}

fn push_validated_claims(
    before: &mut crate::security::pipeline::BeforePipeline,
    guard: ValidatedClaimsGuard,
) {
    before.insert_at_start(guard);
    before.insert_at_start(AuthenticationGuard);
}
