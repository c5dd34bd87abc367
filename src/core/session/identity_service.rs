use super::auth_ports::IdentityProvider;
use super::session_models::{Identity, SessionHandle};

/// Wraps the interactive sign-in flow.
///
/// Failures never reach the caller as errors: they are logged and the caller
/// simply gets `None`, the same way a closed sign-in window would behave.
pub struct IdentityService {
    provider: Box<dyn IdentityProvider>,
    session: SessionHandle,
}

impl IdentityService {
    pub fn new(provider: Box<dyn IdentityProvider>, session: SessionHandle) -> Self {
        Self { provider, session }
    }

    /// Runs the sign-in flow. On success the identity is stored in the session
    /// and `on_login` fires before the identity is returned.
    pub async fn sign_in<F>(&self, on_login: F) -> Option<Identity>
    where
        F: FnOnce(&Identity),
    {
        match self.provider.sign_in().await {
            Ok(identity) => {
                tracing::info!(display_name = %identity.display_name, "User signed in");
                self.session.set_identity(identity.clone()).await;
                on_login(&identity);
                Some(identity)
            }
            Err(e) => {
                tracing::warn!("Sign-in failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::AuthError;
    use async_trait::async_trait;
    use std::cell::Cell;

    struct FixedProvider(Result<&'static str, ()>);

    #[async_trait]
    impl IdentityProvider for FixedProvider {
        async fn sign_in(&self) -> Result<Identity, AuthError> {
            match self.0 {
                Ok(name) => Ok(Identity {
                    display_name: name.to_string(),
                    email: None,
                }),
                Err(()) => Err(AuthError::Denied),
            }
        }
    }

    #[tokio::test]
    async fn successful_sign_in_fires_callback_and_stores_identity() {
        let session = SessionHandle::new();
        let service = IdentityService::new(Box::new(FixedProvider(Ok("Grace"))), session.clone());
        let fired = Cell::new(false);

        let identity = service.sign_in(|_| fired.set(true)).await;

        assert_eq!(identity.map(|i| i.display_name), Some("Grace".to_string()));
        assert!(fired.get());
        assert_eq!(
            session.identity().await.map(|i| i.display_name),
            Some("Grace".to_string())
        );
    }

    #[tokio::test]
    async fn failed_sign_in_is_silent() {
        let session = SessionHandle::new();
        let service = IdentityService::new(Box::new(FixedProvider(Err(()))), session.clone());
        let fired = Cell::new(false);

        let identity = service.sign_in(|_| fired.set(true)).await;

        assert!(identity.is_none());
        assert!(!fired.get());
        assert!(session.identity().await.is_none());
    }
}
