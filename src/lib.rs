//! Vestibule — session SDK for Cognito-style user pools.
//!
//! Converts a username/password exchange into one of three outcomes
//! (authenticated user, forced-password-change challenge, or a typed error),
//! persists the session token, derives a display identity from token claims,
//! and keeps a watchable current-user value consistent across restarts.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vestibule::prelude::*;
//!
//! # async fn example() {
//! let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new_default());
//! let provider = Arc::new(CognitoProvider::new(PoolConfig::from_env(), store.clone()));
//!
//! // Resolve the startup value once; observers see Loading until then.
//! let identity = Arc::new(IdentityStore::new(store));
//! identity.hydrate(provider.as_ref()).await;
//!
//! let flow = SessionFlow::new(provider, identity.clone());
//! flow.begin();
//! let state = flow.submit_credentials("kim@example.com", "correct horse").await;
//! println!("{state:?}; signed in as {}", identity.display_name());
//! # }
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod identity;
pub mod prelude;
pub mod provider;
pub mod session;
pub mod store;
