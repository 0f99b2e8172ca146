//! Login boundary: turns sign-in failures into display-ready messages.

use crate::credentials::{Credentials, CredentialsProvider, SignedInUser};
use crate::error::{AuthError, SignInError};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const SOMETHING_WENT_WRONG: &str = "Something went wrong.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    SignedIn(SignedInUser),
    /// Authentication failed; the message is safe to show to the user.
    Rejected(&'static str),
}

/// Sign in with credentials.
///
/// - `CredentialsSignin` → `Rejected("Invalid credentials.")`
/// - any other [`AuthError`] → `Rejected("Something went wrong.")`
/// - non-authentication errors are returned unchanged as `Err`
pub async fn authenticate<P>(provider: &P, credentials: &Credentials) -> anyhow::Result<Authentication>
where
    P: CredentialsProvider + ?Sized,
{
    match provider.sign_in(credentials).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "signed in");
            Ok(Authentication::SignedIn(user))
        }
        Err(SignInError::Auth(AuthError::CredentialsSignin)) => {
            tracing::info!(email = %credentials.email, "sign-in rejected: bad credentials");
            Ok(Authentication::Rejected(INVALID_CREDENTIALS))
        }
        Err(SignInError::Auth(other)) => {
            tracing::warn!(error = %other, "sign-in failed");
            Ok(Authentication::Rejected(SOMETHING_WENT_WRONG))
        }
        Err(SignInError::Internal(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::InMemoryCredentialsProvider;

    enum Fails {
        Misconfigured,
        StoreDown,
    }

    #[async_trait]
    impl CredentialsProvider for Fails {
        async fn sign_in(&self, _credentials: &Credentials) -> Result<SignedInUser, SignInError> {
            match self {
                Fails::Misconfigured => Err(AuthError::other("provider disabled").into()),
                Fails::StoreDown => Err(anyhow::anyhow!("connection refused").into()),
            }
        }
    }

    #[tokio::test]
    async fn bad_credentials_map_to_invalid_credentials() {
        let provider = InMemoryCredentialsProvider::new();
        provider.add_user("User", "user@nextmail.com", "123456");

        let result = authenticate(&provider, &Credentials::new("user@nextmail.com", "nope-nope"))
            .await
            .unwrap();
        assert_eq!(result, Authentication::Rejected(INVALID_CREDENTIALS));
    }

    #[tokio::test]
    async fn other_auth_errors_collapse_to_generic_message() {
        let result = authenticate(&Fails::Misconfigured, &Credentials::new("a@b.co", "123456"))
            .await
            .unwrap();
        assert_eq!(result, Authentication::Rejected(SOMETHING_WENT_WRONG));
    }

    #[tokio::test]
    async fn non_auth_errors_are_returned_unchanged() {
        let err = authenticate(&Fails::StoreDown, &Credentials::new("a@b.co", "123456"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection refused");
    }

    #[tokio::test]
    async fn valid_credentials_sign_in() {
        let provider = InMemoryCredentialsProvider::new();
        let id = provider.add_user("User", "user@nextmail.com", "123456");

        match authenticate(&provider, &Credentials::new("user@nextmail.com", "123456")).await {
            Ok(Authentication::SignedIn(user)) => assert_eq!(user.id, id),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
