use tracing::{error, info};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::Admin;
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Loading,
    SignedIn(Admin),
    SignedOut,
}

/// The acting admin, resolved once and handed to whatever stamps rows.
#[derive(Debug, Clone)]
pub struct AuthContext {
    state: AuthState,
}

impl Default for AuthContext {
    fn default() -> Self {
        Self {
            state: AuthState::Loading,
        }
    }
}

impl AuthContext {
    /// Looks up the admin profile for `admin_id`. A failed lookup is logged and
    /// leaves the context signed out rather than failing the caller.
    pub async fn init<S: RecordStore>(store: &S, admin_id: Option<Uuid>) -> Self {
        let state = match admin_id {
            None => AuthState::SignedOut,
            Some(id) => match store.find_admin(id).await {
                Ok(Some(admin)) => {
                    info!(admin = %admin.email, "admin session loaded");
                    AuthState::SignedIn(admin)
                }
                Ok(None) => {
                    error!(%id, "no admin profile for configured id");
                    AuthState::SignedOut
                }
                Err(err) => {
                    error!(%id, error = %err, "error loading admin");
                    AuthState::SignedOut
                }
            },
        };
        Self { state }
    }

    pub async fn sign_up<S: RecordStore>(
        store: &S,
        email: &str,
        name: &str,
    ) -> Result<Self, StoreError> {
        let admin = store.insert_admin(email.trim(), name.trim()).await?;
        info!(admin = %admin.email, id = %admin.id, "admin profile created");
        Ok(Self {
            state: AuthState::SignedIn(admin),
        })
    }

    pub fn sign_out(&mut self) {
        if let AuthState::SignedIn(admin) = &self.state {
            info!(admin = %admin.email, "admin signed out");
        }
        self.state = AuthState::SignedOut;
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, AuthState::Loading)
    }

    pub fn admin(&self) -> Option<&Admin> {
        match &self.state {
            AuthState::SignedIn(admin) => Some(admin),
            _ => None,
        }
    }

    /// Stamped on inserted rows; `None` when nobody is signed in.
    pub fn admin_id(&self) -> Option<Uuid> {
        self.admin().map(|admin| admin.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    #[tokio::test]
    async fn init_without_id_is_signed_out() {
        let store = MemoryStore::new();
        let context = AuthContext::init(&store, None).await;
        assert_eq!(context.state(), &AuthState::SignedOut);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn sign_up_then_init_resolves_admin() {
        let store = MemoryStore::new();
        let created = AuthContext::sign_up(&store, " lead@groupscholar.com ", "Lead Coach")
            .await
            .unwrap();
        let id = created.admin_id().unwrap();

        let context = AuthContext::init(&store, Some(id)).await;
        assert!(!context.is_loading());
        let admin = context.admin().unwrap();
        assert_eq!(admin.email, "lead@groupscholar.com");
        assert_eq!(context.admin_id(), Some(id));
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_a_conflict() {
        let store = MemoryStore::new();
        AuthContext::sign_up(&store, "lead@groupscholar.com", "Lead")
            .await
            .unwrap();
        let err = AuthContext::sign_up(&store, "lead@groupscholar.com", "Other")
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn unknown_or_failing_lookup_signs_out() {
        let store = MemoryStore::new();
        let context = AuthContext::init(&store, Some(Uuid::new_v4())).await;
        assert_eq!(context.admin_id(), None);

        store.fail_next_call();
        let context = AuthContext::init(&store, Some(Uuid::new_v4())).await;
        assert_eq!(context.state(), &AuthState::SignedOut);
    }

    #[tokio::test]
    async fn sign_out_clears_admin() {
        let store = MemoryStore::new();
        let mut context = AuthContext::sign_up(&store, "lead@groupscholar.com", "Lead")
            .await
            .unwrap();
        context.sign_out();
        assert_eq!(context.admin_id(), None);
        assert_eq!(context.state(), &AuthState::SignedOut);
    }
}
