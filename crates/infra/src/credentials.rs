//! Postgres-backed user directory for credentials sign-in.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use invoicedesk_auth::{AuthError, Credentials, CredentialsProvider, PasswordHash, SignInError, SignedInUser};
use invoicedesk_core::UserId;

const SELECT_USER_BY_EMAIL: &str =
    "SELECT id, name, email, password_salt, password_hash FROM users WHERE lower(email) = $1";

const INSERT_USER: &str = "INSERT INTO users (id, name, email, password_salt, password_hash) \
     VALUES ($1, $2, $3, $4, $5) ON CONFLICT (email) DO NOTHING";

#[derive(Debug, Clone)]
pub struct PostgresCredentialsProvider {
    pool: PgPool,
}

impl PostgresCredentialsProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a user unless the email is already taken.
    pub async fn add_user(&self, name: &str, email: &str, password: &str) -> anyhow::Result<UserId> {
        let id = UserId::new();
        let hash = PasswordHash::derive(id.to_string(), password);
        sqlx::query(INSERT_USER)
            .bind(id.as_uuid())
            .bind(name)
            .bind(email.trim().to_lowercase())
            .bind(hash.salt())
            .bind(hash.digest())
            .execute(&self.pool)
            .await
            .context("insert user")?;
        Ok(id)
    }
}

#[async_trait]
impl CredentialsProvider for PostgresCredentialsProvider {
    #[instrument(skip(self, credentials))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<SignedInUser, SignInError> {
        credentials.check_shape()?;

        let row = sqlx::query(SELECT_USER_BY_EMAIL)
            .bind(credentials.normalized_email())
            .fetch_optional(&self.pool)
            .await
            .context("look up user by email")?;

        let Some(row) = row else {
            return Err(AuthError::CredentialsSignin.into());
        };

        let id: Uuid = row.try_get("id").context("decode users.id")?;
        let salt: String = row.try_get("password_salt").context("decode users.password_salt")?;
        let digest: String = row.try_get("password_hash").context("decode users.password_hash")?;

        if !PasswordHash::from_parts(salt, digest).verify(&credentials.password) {
            return Err(AuthError::CredentialsSignin.into());
        }

        Ok(SignedInUser {
            id: UserId::from_uuid(id),
            name: row.try_get("name").context("decode users.name")?,
            email: row.try_get("email").context("decode users.email")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_and_parameterized() {
        assert!(SELECT_USER_BY_EMAIL.contains("lower(email) = $1"));
        assert!(INSERT_USER.contains("ON CONFLICT (email) DO NOTHING"));
    }

    #[tokio::test]
    async fn malformed_credentials_are_rejected_before_any_query() {
        // A lazy pool never connects unless a query runs.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        let provider = PostgresCredentialsProvider::new(pool);

        let err = provider
            .sign_in(&Credentials::new("not-an-email", "123456"))
            .await
            .unwrap_err();

        assert!(matches!(err, SignInError::Auth(AuthError::CredentialsSignin)));
    }
}
