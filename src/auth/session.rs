//! Session management
//!
//! A [`Session`] is never stored. It is derived from the persisted token on
//! every query, so two consecutive queries with no token change agree.

use serde::Serialize;
use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::claims::{decode_claims, ClaimPolicy};
use crate::auth::store::TokenStore;
use crate::config::SessionConfig;

/// Default window before expiry in which a token counts as expiring soon
pub const EXPIRING_SOON_SECS: i64 = 300;

/// Session information
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub is_authenticated: bool,
    pub token: Option<String>,
}

impl Session {
    /// Unauthenticated session with no token
    pub fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            token: None,
        }
    }

    /// Authenticated session carrying `token`
    pub fn authenticated(token: String) -> Self {
        Self {
            is_authenticated: true,
            token: Some(token),
        }
    }
}

/// How to treat tokens that carry no `exp` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// No `exp` means the token never expires
    #[default]
    Lenient,
    /// No `exp` means the token is invalid
    Strict,
}

/// Client-side view of the credential shared with [`ApiClient`]
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    api: ApiClient,
    claims: ClaimPolicy,
    expiry: ExpiryPolicy,
    expiring_soon_secs: i64,
}

impl SessionManager {
    /// Create a session manager over the same store the API client uses
    pub fn new(store: Arc<dyn TokenStore>, api: ApiClient) -> Self {
        Self {
            store,
            api,
            claims: ClaimPolicy::default(),
            expiry: ExpiryPolicy::default(),
            expiring_soon_secs: EXPIRING_SOON_SECS,
        }
    }

    /// Create a session manager from the `[session]` config section
    pub fn from_config(config: &SessionConfig, store: Arc<dyn TokenStore>, api: ApiClient) -> Self {
        let expiry = if config.require_expiry {
            ExpiryPolicy::Strict
        } else {
            ExpiryPolicy::Lenient
        };
        Self::new(store, api)
            .with_expiry_policy(expiry)
            .with_expiring_soon_secs(config.expiring_soon_secs)
    }

    /// Set how tokens without `exp` are treated
    pub fn with_expiry_policy(mut self, expiry: ExpiryPolicy) -> Self {
        self.expiry = expiry;
        self
    }

    /// Set the expiring-soon window in seconds
    pub fn with_expiring_soon_secs(mut self, secs: i64) -> Self {
        self.expiring_soon_secs = secs;
        self
    }

    /// Set the identity claim precedence
    pub fn with_claim_policy(mut self, claims: ClaimPolicy) -> Self {
        self.claims = claims;
        self
    }

    /// Check a token's structure and expiry.
    ///
    /// An expired token that is also the stored one gets evicted.
    pub fn is_token_valid(&self, token: Option<&str>) -> bool {
        self.is_token_valid_at(token, now())
    }

    fn is_token_valid_at(&self, token: Option<&str>, now: i64) -> bool {
        let Some(token) = token else {
            return false;
        };

        let claims = match decode_claims(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Error decoding token: {}", e);
                return false;
            }
        };

        match claims.exp {
            Some(_) if claims.is_expired_at(now) => {
                if self.store.get().as_deref() == Some(token) {
                    tracing::info!("Stored token expired, removing it");
                    self.evict();
                }
                false
            }
            Some(_) => true,
            None => self.expiry == ExpiryPolicy::Lenient,
        }
    }

    /// Derive the current session from the stored token
    pub fn current_session(&self) -> Session {
        match self.store.get() {
            Some(token) if self.is_token_valid(Some(&token)) => Session::authenticated(token),
            Some(_) => {
                self.evict();
                Session::anonymous()
            }
            None => Session::anonymous(),
        }
    }

    /// Whether the stored token is currently valid
    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_authenticated
    }

    /// Stored token, if it is currently valid
    pub fn current_token(&self) -> Option<String> {
        self.current_session().token
    }

    /// Identity of the session's user
    pub fn current_user_id(&self) -> Option<String> {
        let token = self.current_token()?;
        self.claims.user_id(&token)
    }

    /// Check if the token expires within the configured window
    pub fn is_token_expiring_soon(&self) -> bool {
        let Some(token) = self.current_token() else {
            return false;
        };
        match decode_claims(&token) {
            Ok(claims) => claims
                .seconds_until_expiry(now())
                .is_some_and(|left| left < self.expiring_soon_secs),
            Err(e) => {
                tracing::warn!("Error decoding token: {}", e);
                false
            }
        }
    }

    /// Returns `false` when the token would need a refresh.
    ///
    /// The backend has no refresh endpoint, so nothing is ever refreshed.
    pub fn refresh_token_if_needed(&self) -> bool {
        if self.is_token_expiring_soon() {
            tracing::debug!("Token expiring soon and cannot be refreshed");
            return false;
        }
        true
    }

    /// End the session.
    ///
    /// The backend call is best effort. Local state is cleared even if the
    /// call fails or this future is dropped before it completes.
    pub async fn logout(&self) {
        let _guard = ClearOnDrop(self);

        let response = self.api.logout_user().await;
        if !response.success {
            tracing::warn!(
                "Error during logout API call: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    fn evict(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to remove stored token: {}", e);
        }
    }
}

struct ClearOnDrop<'a>(&'a SessionManager);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.evict();
        self.0.api.set_token(None);
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
