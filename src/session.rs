//! Sign-in flow orchestration.
//!
//! [`SessionFlow`] drives the three-outcome sign-in protocol for a UI layer:
//! submit credentials, resolve a forced-password-change challenge, cancel it,
//! sign out. Every failure lands back in an interactive state with the error
//! attached; the flow never gets stuck mid-call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::AuthError;
use crate::identity::IdentityStore;
use crate::provider::{ChallengeState, IdentityProvider, SignInOutcome, User, USER_ATTRIBUTE_PREFIX};

const MIN_PASSWORD_LEN: usize = 8;

/// Where the sign-in flow currently stands.
#[derive(Debug, Clone)]
pub enum FlowState {
    Idle,
    /// Credential form shown, optionally with the previous failure.
    AwaitingCredentials { error: Option<AuthError> },
    /// A sign-in call is in flight; further submissions are ignored.
    Authenticating,
    /// The provider demands a new password before granting a session.
    ChallengePending {
        challenge: ChallengeState,
        error: Option<AuthError>,
    },
    /// A challenge-completion call is in flight.
    CompletingChallenge { challenge: ChallengeState },
    /// Terminal for this flow; the current user has been set.
    Authenticated { user: User },
}

impl FlowState {
    /// Error attached to the current interactive state, if any.
    pub fn error(&self) -> Option<&AuthError> {
        match self {
            Self::AwaitingCredentials { error } | Self::ChallengePending { error, .. } => {
                error.as_ref()
            }
            _ => None,
        }
    }
}

/// Extra fields the challenge form must render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChallengeFields {
    pub given_name: bool,
    pub family_name: bool,
}

/// Values collected by the challenge form.
#[derive(Debug, Clone, Default)]
pub struct ChallengeSubmission {
    pub new_password: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

/// Orchestrates sign-in against an [`IdentityProvider`].
///
/// One provider call may be in flight per flow instance; submissions while
/// `Authenticating` or `CompletingChallenge` are ignored, not queued. The
/// flow is the only writer of the current user; the provider is the only
/// writer of the token.
pub struct SessionFlow {
    provider: Arc<dyn IdentityProvider>,
    identity: Arc<IdentityStore>,
    state: Mutex<FlowState>,
}

impl SessionFlow {
    pub fn new(provider: Arc<dyn IdentityProvider>, identity: Arc<IdentityStore>) -> Self {
        Self {
            provider,
            identity,
            state: Mutex::new(FlowState::Idle),
        }
    }

    // The lock is never held across an await.
    fn lock(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current flow state.
    pub fn state(&self) -> FlowState {
        self.lock().clone()
    }

    /// Show the credential form.
    pub fn begin(&self) {
        let mut state = self.lock();
        if !matches!(
            *state,
            FlowState::Authenticating | FlowState::CompletingChallenge { .. }
        ) {
            *state = FlowState::AwaitingCredentials { error: None };
        }
    }

    /// Submit credentials. Returns the state the flow settled in.
    ///
    /// Field validation failures never reach the provider; they attach an
    /// error to `AwaitingCredentials` directly.
    pub async fn submit_credentials(&self, email: &str, password: &str) -> FlowState {
        {
            let mut state = self.lock();
            if matches!(
                *state,
                FlowState::Authenticating | FlowState::CompletingChallenge { .. }
            ) {
                debug!("credential submission ignored; a provider call is in flight");
                return state.clone();
            }
            if let Err(error) = validate_credentials(email, password) {
                *state = FlowState::AwaitingCredentials { error: Some(error) };
                return state.clone();
            }
            *state = FlowState::Authenticating;
        }

        let outcome = self.provider.sign_in(email, password).await;

        let mut state = self.lock();
        *state = match outcome {
            Ok(SignInOutcome::Authenticated(user)) => {
                self.identity.set_user(user.clone());
                FlowState::Authenticated { user }
            }
            Ok(SignInOutcome::ChallengeRequired(challenge)) => FlowState::ChallengePending {
                challenge,
                error: None,
            },
            Err(error) => FlowState::AwaitingCredentials { error: Some(error) },
        };
        state.clone()
    }

    /// Submit the new password and any required attributes for the pending
    /// challenge. Ignored unless a challenge is pending.
    pub async fn submit_challenge(&self, submission: ChallengeSubmission) -> FlowState {
        let challenge = {
            let mut state = self.lock();
            let FlowState::ChallengePending { challenge, .. } = &*state else {
                debug!("challenge submission ignored; no challenge is pending");
                return state.clone();
            };
            let challenge = challenge.clone();
            let fields = required_fields(&challenge.required_attributes);
            if let Err(error) = validate_challenge(fields, &submission) {
                *state = FlowState::ChallengePending {
                    challenge,
                    error: Some(error),
                };
                return state.clone();
            }
            *state = FlowState::CompletingChallenge {
                challenge: challenge.clone(),
            };
            challenge
        };

        let attributes = submitted_attributes(&submission);
        let result = self
            .provider
            .complete_challenge(&challenge, &submission.new_password, &attributes)
            .await;

        let mut state = self.lock();
        *state = match result {
            Ok(user) => {
                self.identity.set_user(user.clone());
                FlowState::Authenticated { user }
            }
            Err(error) => FlowState::ChallengePending {
                challenge,
                error: Some(error),
            },
        };
        state.clone()
    }

    /// Discard the pending challenge and return to the credential form.
    pub fn cancel_challenge(&self) {
        let mut state = self.lock();
        if matches!(*state, FlowState::ChallengePending { .. }) {
            *state = FlowState::AwaitingCredentials { error: None };
        }
    }

    /// Extra form fields required by the pending challenge.
    pub fn challenge_fields(&self) -> ChallengeFields {
        match &*self.lock() {
            FlowState::ChallengePending { challenge, .. }
            | FlowState::CompletingChallenge { challenge } => {
                required_fields(&challenge.required_attributes)
            }
            _ => ChallengeFields::default(),
        }
    }

    /// End the session. The local session is cleared even when the
    /// provider-side call fails.
    pub async fn sign_out(&self) {
        self.provider.sign_out().await;
        self.identity.clear();
        *self.lock() = FlowState::Idle;
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let (local, domain) = email.trim().split_once('@').unwrap_or(("", ""));
    if local.is_empty() || domain.is_empty() {
        return Err(AuthError::InvalidParameter(
            "Invalid email address".to_string(),
        ));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidParameter(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

fn strip_attribute_prefix(name: &str) -> &str {
    name.strip_prefix(USER_ATTRIBUTE_PREFIX).unwrap_or(name)
}

/// Which of the recognized attributes the provider still requires.
/// Unrecognized names are ignored and never block submission.
fn required_fields(required: &[String]) -> ChallengeFields {
    let mut fields = ChallengeFields::default();
    for name in required {
        match strip_attribute_prefix(name) {
            "given_name" => fields.given_name = true,
            "family_name" => fields.family_name = true,
            _ => {}
        }
    }
    fields
}

fn validate_challenge(
    fields: ChallengeFields,
    submission: &ChallengeSubmission,
) -> Result<(), AuthError> {
    if submission.new_password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidParameter(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if fields.given_name && is_blank(submission.given_name.as_deref()) {
        return Err(AuthError::InvalidParameter(
            "Given name is required".to_string(),
        ));
    }
    if fields.family_name && is_blank(submission.family_name.as_deref()) {
        return Err(AuthError::InvalidParameter(
            "Family name is required".to_string(),
        ));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn submitted_attributes(submission: &ChallengeSubmission) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    let mut insert = |key: &str, value: Option<&str>| {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            attributes.insert(key.to_string(), value.to_string());
        }
    };
    insert("given_name", submission.given_name.as_deref());
    insert("family_name", submission.family_name.as_deref());
    attributes
}
