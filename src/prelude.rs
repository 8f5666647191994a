//! Convenience re-exports for common use.

pub use crate::config::PoolConfig;
pub use crate::error::{AuthError, AuthErrorKind};
pub use crate::identity::{CurrentUser, IdentityStore};
pub use crate::provider::{
    ChallengeState, CognitoProvider, IdentityProvider, SignInOutcome, User,
};
pub use crate::session::{ChallengeFields, ChallengeSubmission, FlowState, SessionFlow};
pub use crate::store::{FileTokenStore, StoreError, TokenStore, TokenStoreConfig};
