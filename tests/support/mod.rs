#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;
use tokio::sync::Notify;
use vestibule::error::AuthError;
use vestibule::provider::{ChallengeState, IdentityProvider, SignInOutcome, User};
use vestibule::store::{StoreError, TokenStore};

/// Single-slot in-memory token store.
#[derive(Default)]
pub struct InMemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, token: &str) {
        *self.slot.lock().expect("store lock poisoned") = Some(token.to_string());
    }

    pub fn get(&self) -> Option<String> {
        self.slot.lock().expect("store lock poisoned").clone()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.get())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        self.seed(token);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// Unsigned JWT-shaped token with the given payload.
pub fn id_token(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).expect("serialize payload"));
    format!("{header}.{body}.test-signature")
}

pub fn user(id: &str, email: &str, name: Option<&str>) -> User {
    User {
        id: id.to_string(),
        email: email.to_string(),
        name: name.map(str::to_string),
    }
}

pub fn challenge(required: &[&str]) -> ChallengeState {
    ChallengeState::new(
        "session-handle-1",
        "kim@example.com",
        required.iter().map(|n| n.to_string()).collect(),
        HashMap::new(),
    )
}

/// Provider double with scripted outcomes and call counters.
///
/// An optional gate keeps `sign_in` suspended until released, for tests
/// covering the in-flight submission guard.
#[derive(Default)]
pub struct ScriptedProvider {
    sign_in_outcome: Mutex<Option<Result<SignInOutcome, AuthError>>>,
    challenge_outcome: Mutex<Option<Result<User, AuthError>>>,
    restore_outcome: Mutex<Option<User>>,
    gate: Option<Arc<Notify>>,
    pub sign_in_calls: AtomicUsize,
    pub challenge_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
    pub restore_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sign_in(self, outcome: Result<SignInOutcome, AuthError>) -> Self {
        *self.sign_in_outcome.lock().expect("script lock poisoned") = Some(outcome);
        self
    }

    pub fn with_challenge(self, outcome: Result<User, AuthError>) -> Self {
        *self.challenge_outcome.lock().expect("script lock poisoned") = Some(outcome);
        self
    }

    pub fn with_restore(self, user: Option<User>) -> Self {
        *self.restore_outcome.lock().expect("script lock poisoned") = user;
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<SignInOutcome, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.sign_in_outcome
            .lock()
            .expect("script lock poisoned")
            .clone()
            .unwrap_or_else(|| Err(AuthError::unknown(None)))
    }

    async fn complete_challenge(
        &self,
        _challenge: &ChallengeState,
        _new_password: &str,
        _attributes: &HashMap<String, String>,
    ) -> Result<User, AuthError> {
        self.challenge_calls.fetch_add(1, Ordering::SeqCst);
        self.challenge_outcome
            .lock()
            .expect("script lock poisoned")
            .clone()
            .unwrap_or_else(|| Err(AuthError::unknown(None)))
    }

    async fn sign_out(&self) {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn restore_session(&self) -> Option<User> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        self.restore_outcome
            .lock()
            .expect("script lock poisoned")
            .clone()
    }
}
