use thiserror::Error;

/// Typed authentication failure.
///
/// The discriminant matters to callers: only [`AuthError::CredentialsSignin`]
/// gets a specific user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The submitted credentials were malformed or did not match a user.
    #[error("credentials sign-in failed")]
    CredentialsSignin,

    /// Any other authentication failure (misconfiguration, disabled provider, ...).
    #[error("authentication failed: {0}")]
    Other(String),
}

impl AuthError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Everything a sign-in attempt can fail with.
///
/// `Internal` is not an authentication failure (e.g. the user store is down)
/// and is handed back to the caller untouched.
#[derive(Debug, Error)]
pub enum SignInError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
