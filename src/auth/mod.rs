//! Authentication and session management

pub mod claims;
pub mod session;
pub mod store;

pub use claims::{decode_claims, mask_token, ClaimPolicy, TokenClaims, IDENTITY_CLAIMS};
pub use session::{ExpiryPolicy, Session, SessionManager, EXPIRING_SOON_SECS};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
