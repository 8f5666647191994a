//! Identity provider seam and the data it exchanges.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::claims::{first_string, Claims};
use crate::error::AuthError;

pub mod cognito;

pub use cognito::CognitoProvider;

/// Namespace the provider prepends to required-attribute names in a
/// forced-password-change challenge.
pub(crate) const USER_ATTRIBUTE_PREFIX: &str = "userAttributes.";

/// Identity record for a signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Pending forced-password-change challenge.
///
/// Lives only between a sign-in resolving `ChallengeRequired` and that
/// challenge being completed or cancelled; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeState {
    /// Opaque continuation handle for the challenge response.
    pub session: String,
    /// Username the challenge was issued for.
    pub username: String,
    /// Required attribute names as received (still namespaced).
    pub required_attributes: Vec<String>,
    /// Attribute values the provider already knows.
    pub known_attributes: HashMap<String, String>,
}

impl ChallengeState {
    pub fn new(
        session: impl Into<String>,
        username: impl Into<String>,
        required_attributes: Vec<String>,
        mut known_attributes: HashMap<String, String>,
    ) -> Self {
        // The pool echoes `email_verified` back; it is not a profile field
        // and must not be submitted with the challenge response.
        known_attributes.remove("email_verified");
        Self {
            session: session.into(),
            username: username.into(),
            required_attributes,
            known_attributes,
        }
    }
}

/// Result of a credential sign-in.
#[derive(Debug, Clone)]
pub enum SignInOutcome {
    Authenticated(User),
    ChallengeRequired(ChallengeState),
}

/// The one seam to the remote identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// On `Authenticated` the session token has been persisted before the
    /// future resolves.
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError>;

    /// Commit a pending password change plus any required attributes.
    ///
    /// `attributes` holds bare (un-namespaced) attribute names. Persists the
    /// new session token on success.
    async fn complete_challenge(
        &self,
        challenge: &ChallengeState,
        new_password: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<User, AuthError>;

    /// End the session. Local termination always succeeds; a provider-side
    /// failure is logged and dropped.
    async fn sign_out(&self);

    /// Recover an existing session with no user interaction. Every failure
    /// resolves to `None`.
    async fn restore_session(&self) -> Option<User>;
}

/// Build a [`User`] from decoded token claims.
///
/// The id comes from the `sub` claim alone; `username` only fills the email
/// when both email claims are absent. The challenge-completion path layers
/// its own id fallback on top of this.
pub(crate) fn user_from_claims(claims: &Claims, username: &str) -> User {
    let id = first_string(claims, &["sub"]).unwrap_or_default().to_string();
    let email = first_string(claims, &["email", "cognito:username"])
        .unwrap_or(username)
        .to_string();
    let name = first_string(claims, &["name", "given_name", "preferred_username"])
        .map(str::to_string)
        .or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        });
    User { id, email, name }
}
