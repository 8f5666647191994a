//! Wire client for the user-pool identity service.
//!
//! Speaks the pool's JSON protocol: one POST endpoint, the operation named
//! in the `X-Amz-Target` header, failures carried as `__type` + `message`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::claims;
use crate::config::PoolConfig;
use crate::error::AuthError;
use crate::store::TokenStore;

use super::{
    user_from_claims, ChallengeState, IdentityProvider, SignInOutcome, User,
    USER_ATTRIBUTE_PREFIX,
};

const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const NEW_PASSWORD_REQUIRED: &str = "NEW_PASSWORD_REQUIRED";

/// User-pool client.
///
/// The only component that talks to the network. Persists the session token
/// through the [`TokenStore`] as a side effect of successful calls; a failed
/// store write is logged and swallowed, never surfaced as a sign-in failure.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use vestibule::config::PoolConfig;
/// use vestibule::provider::CognitoProvider;
/// use vestibule::store::FileTokenStore;
///
/// let store = Arc::new(FileTokenStore::new_default());
/// let provider = CognitoProvider::new(PoolConfig::from_env(), store);
/// ```
pub struct CognitoProvider {
    client: reqwest::Client,
    config: PoolConfig,
    endpoint: String,
    token_store: Arc<dyn TokenStore>,
}

impl CognitoProvider {
    pub fn new(config: PoolConfig, token_store: Arc<dyn TokenStore>) -> Self {
        let endpoint = config.endpoint();
        Self {
            client: reqwest::Client::new(),
            config,
            endpoint,
            token_store,
        }
    }

    /// Override the service endpoint (tests).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: Value,
    ) -> Result<T, AuthError> {
        debug!(operation, "user pool request");
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/x-amz-json-1.1")
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{operation}"))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let failure = resp
                .json::<ProviderFailure>()
                .await
                .unwrap_or_default();
            return Err(failure.into_error());
        }
        Ok(resp.json().await?)
    }

    fn persist_token(&self, token: &str) {
        if let Err(err) = self.token_store.save(token) {
            warn!(%err, "failed to persist session token; session will not survive restart");
        }
    }
}

#[async_trait]
impl IdentityProvider for CognitoProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, AuthError> {
        self.config.validate()?;
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.config.client_id,
            "AuthParameters": { "USERNAME": email, "PASSWORD": password },
        });
        let response: InitiateAuthResponse = self.call("InitiateAuth", body).await?;

        if let Some(token) = response.authentication_result.and_then(|r| r.id_token) {
            self.persist_token(&token);
            let claims = claims::decode(&token).unwrap_or_default();
            return Ok(SignInOutcome::Authenticated(user_from_claims(
                &claims, email,
            )));
        }

        match (response.challenge_name.as_deref(), response.session) {
            (Some(NEW_PASSWORD_REQUIRED), Some(session)) => {
                let params = response.challenge_parameters.unwrap_or_default();
                let challenge = ChallengeState::new(
                    session,
                    email,
                    parse_attribute_names(params.required_attributes.as_deref()),
                    parse_attribute_map(params.user_attributes.as_deref()),
                );
                Ok(SignInOutcome::ChallengeRequired(challenge))
            }
            (Some(other), _) => Err(AuthError::unknown(Some(format!(
                "Unsupported challenge: {other}"
            )))),
            _ => Err(AuthError::unknown(Some(
                "Sign-in response carried no token or challenge".to_string(),
            ))),
        }
    }

    async fn complete_challenge(
        &self,
        challenge: &ChallengeState,
        new_password: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<User, AuthError> {
        self.config.validate()?;
        let mut responses = serde_json::Map::new();
        responses.insert(
            "USERNAME".to_string(),
            Value::String(challenge.username.clone()),
        );
        responses.insert(
            "NEW_PASSWORD".to_string(),
            Value::String(new_password.to_string()),
        );
        for (name, value) in attributes {
            responses.insert(
                format!("{USER_ATTRIBUTE_PREFIX}{name}"),
                Value::String(value.clone()),
            );
        }
        let body = json!({
            "ClientId": self.config.client_id,
            "ChallengeName": NEW_PASSWORD_REQUIRED,
            "Session": challenge.session,
            "ChallengeResponses": responses,
        });
        let response: RespondToChallengeResponse =
            self.call("RespondToAuthChallenge", body).await?;
        let token = response
            .authentication_result
            .and_then(|r| r.id_token)
            .ok_or_else(|| {
                AuthError::unknown(Some("Challenge response carried no token".to_string()))
            })?;
        self.persist_token(&token);
        let claims = claims::decode(&token).unwrap_or_default();
        let mut user = user_from_claims(&claims, &challenge.username);
        // Only this path substitutes the username for a missing `sub`.
        if user.id.is_empty() {
            user.id = challenge.username.clone();
        }
        Ok(user)
    }

    async fn sign_out(&self) {
        let token = match self.token_store.load() {
            Ok(token) => token,
            Err(err) => {
                warn!(%err, "failed to read stored token during sign-out");
                None
            }
        };
        // Local termination first; the caller is signed out no matter what
        // the provider says.
        if let Err(err) = self.token_store.clear() {
            warn!(%err, "failed to clear stored token during sign-out");
        }
        let Some(token) = token else { return };
        let body = json!({ "AccessToken": token });
        if let Err(err) = self.call::<Value>("GlobalSignOut", body).await {
            warn!(%err, "provider-side sign-out failed; local session already cleared");
        }
    }

    async fn restore_session(&self) -> Option<User> {
        let token = self.token_store.load().ok().flatten()?;
        if self.config.validate().is_err() {
            return None;
        }
        let body = json!({ "AccessToken": token });
        let response: GetUserResponse = match self.call("GetUser", body).await {
            Ok(response) => response,
            Err(err) => {
                debug!(%err, "session restore rejected");
                return None;
            }
        };
        self.persist_token(&token);
        let claims = claims::decode(&token).unwrap_or_default();
        let username = response.username.unwrap_or_default();
        Some(user_from_claims(&claims, &username))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderFailure {
    #[serde(rename = "__type")]
    kind: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

impl ProviderFailure {
    fn into_error(self) -> AuthError {
        match self.kind {
            Some(kind) => {
                // `__type` may carry a `namespace#Category` form.
                let category = kind.rsplit('#').next().unwrap_or_default();
                AuthError::from_category(category, self.message)
            }
            None => AuthError::unknown(self.message),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthResponse {
    authentication_result: Option<AuthenticationResult>,
    challenge_name: Option<String>,
    session: Option<String>,
    challenge_parameters: Option<ChallengeParameters>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RespondToChallengeResponse {
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    id_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChallengeParameters {
    #[serde(rename = "userAttributes")]
    user_attributes: Option<String>,
    #[serde(rename = "requiredAttributes")]
    required_attributes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetUserResponse {
    username: Option<String>,
}

/// Challenge parameters arrive as JSON strings; malformed ones degrade to
/// empty rather than failing the challenge.
fn parse_attribute_map(raw: Option<&str>) -> HashMap<String, String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

fn parse_attribute_names(raw: Option<&str>) -> Vec<String> {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
