//! `invoicedesk-auth`: credentials sign-in and session tokens.
//!
//! This crate is intentionally decoupled from HTTP and storage: user lookup
//! goes through the [`CredentialsProvider`] trait, and the only authorization
//! rule is "a valid session is present".

pub mod authenticate;
pub mod credentials;
pub mod error;
pub mod password;
pub mod session;

pub use authenticate::{authenticate, Authentication, INVALID_CREDENTIALS, SOMETHING_WENT_WRONG};
pub use credentials::{Credentials, CredentialsProvider, InMemoryCredentialsProvider, SignedInUser};
pub use error::{AuthError, SignInError};
pub use password::PasswordHash;
pub use session::{validate_claims, SessionClaims, SessionError, SessionKeys, SessionValidator};
