//! Identity collaborator: turns a bearer credential into an [`Identity`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::tokens;
use crate::db::store::TrafficStore;
use crate::error::GatewayError;
use crate::models::user::Identity;

/// Resolves bearer credentials for both the gateway handshake and REST requests.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fails with `Unauthenticated` for a bad token or unknown user, and with
    /// `AccountInactive` for a disabled account.
    async fn resolve(&self, token: &str) -> Result<Identity, GatewayError>;
}

/// Verifies HS256 tokens and loads the user record from the store.
pub struct TokenIdentityResolver {
    secret: String,
    store: Arc<dyn TrafficStore>,
}

impl TokenIdentityResolver {
    pub fn new(secret: impl Into<String>, store: Arc<dyn TrafficStore>) -> Self {
        Self {
            secret: secret.into(),
            store,
        }
    }
}

#[async_trait]
impl IdentityResolver for TokenIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Identity, GatewayError> {
        let claims = tokens::verify_token(&self.secret, token)?;

        let user = self
            .store
            .find_user(&claims.sub)
            .await?
            .ok_or_else(|| GatewayError::Unauthenticated("User not found".to_string()))?;

        if !user.is_active {
            return Err(GatewayError::AccountInactive);
        }

        Ok(Identity::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::store::MemoryStore;
    use crate::models::user::{Department, Role, User};

    fn resolver_with(users: Vec<User>) -> TokenIdentityResolver {
        let store = MemoryStore::new();
        for u in users {
            store.insert_user(u);
        }
        TokenIdentityResolver::new("secret", Arc::new(store))
    }

    fn user(id: &str, active: bool) -> User {
        User {
            id: id.to_string(),
            username: format!("{id}_name"),
            email: None,
            role: Role::Operator,
            department: Department::Operations,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn resolves_active_user() {
        let resolver = resolver_with(vec![user("usr_a", true)]);
        let token = tokens::mint_token("secret", "usr_a", Duration::minutes(5)).unwrap();
        let identity = resolver.resolve(&token).await.unwrap();
        assert_eq!(identity.id, "usr_a");
        assert_eq!(identity.role, Role::Operator);
    }

    #[tokio::test]
    async fn inactive_user_is_rejected() {
        let resolver = resolver_with(vec![user("usr_b", false)]);
        let token = tokens::mint_token("secret", "usr_b", Duration::minutes(5)).unwrap();
        assert_eq!(
            resolver.resolve(&token).await.unwrap_err(),
            GatewayError::AccountInactive
        );
    }

    #[tokio::test]
    async fn unknown_user_is_unauthenticated() {
        let resolver = resolver_with(vec![]);
        let token = tokens::mint_token("secret", "usr_ghost", Duration::minutes(5)).unwrap();
        assert!(matches!(
            resolver.resolve(&token).await,
            Err(GatewayError::Unauthenticated(_))
        ));
    }
}
