//! User-pool configuration.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for a user pool.
///
/// # Example
/// ```
/// use vestibule::config::PoolConfig;
///
/// let config = PoolConfig::new("us-east-1", "us-east-1_AbC123", "4example-client-id");
/// assert_eq!(config.endpoint(), "https://cognito-idp.us-east-1.amazonaws.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
}

impl PoolConfig {
    pub fn new(
        region: impl Into<String>,
        user_pool_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            user_pool_id: user_pool_id.into(),
            client_id: client_id.into(),
        }
    }

    /// Read `AWS_REGION`, `COGNITO_USER_POOL_ID`, and `COGNITO_CLIENT_ID`
    /// from the environment. A `.env` file is honored when present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            region: std::env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            user_pool_id: std::env::var("COGNITO_USER_POOL_ID").unwrap_or_default(),
            client_id: std::env::var("COGNITO_CLIENT_ID").unwrap_or_default(),
        }
    }

    /// Reject configs missing the pool or client id.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.user_pool_id.is_empty() || self.client_id.is_empty() {
            return Err(AuthError::InvalidParameter(
                "Pool not configured. Set COGNITO_USER_POOL_ID and COGNITO_CLIENT_ID.".to_string(),
            ));
        }
        Ok(())
    }

    /// Regional service endpoint.
    pub fn endpoint(&self) -> String {
        format!("https://cognito-idp.{}.amazonaws.com", self.region)
    }
}
