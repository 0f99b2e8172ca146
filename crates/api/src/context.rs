use invoicedesk_auth::SessionClaims;
use invoicedesk_core::UserId;

/// The signed-in user behind a request.
///
/// Inserted by the auth middleware; present on every dashboard route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user_id: UserId,
    email: String,
}

impl SessionContext {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<SessionClaims> for SessionContext {
    fn from(claims: SessionClaims) -> Self {
        Self::new(claims.sub, claims.email)
    }
}
