use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use invoicedesk_core::UserId;

use crate::error::{AuthError, SignInError};
use crate::password::PasswordHash;

const MIN_PASSWORD_LEN: usize = 6;

/// Email + password as submitted by the login form.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Reject obviously malformed submissions before any lookup.
    ///
    /// A malformed submission is reported the same way as a wrong password.
    pub fn check_shape(&self) -> Result<(), AuthError> {
        let email_ok = match self.email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
            None => false,
        };
        if !email_ok || self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::CredentialsSignin);
        }
        Ok(())
    }

    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The identity a successful sign-in resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// External credentials collaborator.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, SignInError>;
}

#[async_trait]
impl<P> CredentialsProvider for Arc<P>
where
    P: CredentialsProvider + ?Sized,
{
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, SignInError> {
        (**self).sign_in(credentials).await
    }
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: SignedInUser,
    password: PasswordHash,
}

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialsProvider {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl InMemoryCredentialsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user; the password is stored as a salted digest.
    pub fn add_user(&self, name: &str, email: &str, password: &str) -> UserId {
        let id = UserId::new();
        let stored = StoredUser {
            user: SignedInUser {
                id,
                name: name.to_string(),
                email: email.to_string(),
            },
            password: PasswordHash::derive(id.to_string(), password),
        };
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        users.insert(email.trim().to_lowercase(), stored);
        id
    }
}

#[async_trait]
impl CredentialsProvider for InMemoryCredentialsProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, SignInError> {
        credentials.check_shape()?;

        let users = self
            .users
            .read()
            .map_err(|_| AuthError::other("user directory unavailable"))?;

        match users.get(&credentials.normalized_email()) {
            Some(stored) if stored.password.verify(&credentials.password) => Ok(stored.user.clone()),
            _ => Err(AuthError::CredentialsSignin.into()),
        }
    }
}
