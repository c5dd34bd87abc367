use crate::core::session::{Identity, IdentityService, SessionHandle};

use super::editor_view::EditorView;

/// Top-level screen. Shows the sign-in prompt until somebody signs in, then
/// the greeting and the editor.
pub struct RootView {
    identity_service: IdentityService,
    session: SessionHandle,
    user: Option<Identity>,
    editor: EditorView,
    editor_mounted: bool,
}

impl RootView {
    pub fn new(
        identity_service: IdentityService,
        session: SessionHandle,
        editor: EditorView,
    ) -> Self {
        Self {
            identity_service,
            session,
            user: None,
            editor,
            editor_mounted: false,
        }
    }

    #[cfg(test)]
    pub fn user(&self) -> Option<&Identity> {
        self.user.as_ref()
    }

    /// The editor, once somebody is signed in.
    pub fn editor(&mut self) -> Option<&mut EditorView> {
        if self.user.is_some() {
            Some(&mut self.editor)
        } else {
            None
        }
    }

    /// Runs the sign-in flow. Returns whether somebody is signed in afterwards.
    pub async fn sign_in(&mut self) -> bool {
        let mut signed_in = None;
        self.identity_service
            .sign_in(|identity| signed_in = Some(identity.clone()))
            .await;

        if let Some(identity) = signed_in {
            self.user = Some(identity);
            if !self.editor_mounted {
                self.editor.mount().await;
                self.editor_mounted = true;
            }
        }
        self.user.is_some()
    }

    pub async fn sign_out(&mut self) {
        self.session.sign_out().await;
        self.user = None;
        self.editor.reset();
        tracing::info!("User signed out");
    }

    pub async fn render(&self) -> String {
        let Some(user) = &self.user else {
            return "Sign in with Google to start writing. Type `login`.\n".to_string();
        };

        let drive_status = if self.session.is_fully_authorized().await {
            "Google Drive: connected"
        } else {
            "Google Drive: not connected (type `connect`)"
        };
        format!(
            "Hey, {}!\n{}\n\n{}",
            user.display_name,
            drive_status,
            self.editor.render()
        )
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::core::drafts::DraftService;
    use crate::core::letters::{DriveApi, LetterError, LetterIndex, LetterRef, LetterService};
    use crate::core::session::{
        AccessToken, ApiClientConfigurator, AuthError, IdentityProvider, TokenGrant, TokenService,
    };
    use crate::infra::storage::InMemoryLocalStorage;
    use crate::ui::notifier::testing::RecordingNotifier;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Provider(Option<&'static str>);

    #[async_trait]
    impl IdentityProvider for Provider {
        async fn sign_in(&self) -> Result<Identity, AuthError> {
            match self.0 {
                Some(name) => Ok(Identity {
                    display_name: name.to_string(),
                    email: None,
                }),
                None => Err(AuthError::Denied),
            }
        }
    }

    struct CountingConfigurator(Arc<AtomicUsize>);

    #[async_trait]
    impl ApiClientConfigurator for CountingConfigurator {
        async fn configure(&self) -> Result<(), AuthError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Grant;

    #[async_trait]
    impl TokenGrant for Grant {
        async fn request_token(&self, scope: &str) -> Result<AccessToken, AuthError> {
            Ok(AccessToken::expiring_in("t", 3600, scope))
        }
    }

    struct NoRemote;

    #[async_trait]
    impl DriveApi for NoRemote {
        async fn find_root_folders(
            &self,
            _: &AccessToken,
            _: &str,
        ) -> Result<Vec<String>, LetterError> {
            Err(LetterError::Api("offline".to_string()))
        }

        async fn create_root_folder(&self, _: &AccessToken, _: &str) -> Result<String, LetterError> {
            Err(LetterError::Api("offline".to_string()))
        }

        async fn create_document(
            &self,
            _: &AccessToken,
            _: &str,
            _: &str,
        ) -> Result<String, LetterError> {
            Err(LetterError::Api("offline".to_string()))
        }

        async fn insert_text(
            &self,
            _: &AccessToken,
            _: &str,
            _: u32,
            _: &str,
        ) -> Result<(), LetterError> {
            Err(LetterError::Api("offline".to_string()))
        }

        async fn delete_file(&self, _: &AccessToken, _: &str) -> Result<(), LetterError> {
            Err(LetterError::Api("offline".to_string()))
        }
    }

    #[async_trait]
    impl LetterIndex for NoRemote {
        async fn fetch_letters(&self, _: &AccessToken) -> Result<Vec<LetterRef>, LetterError> {
            Ok(Vec::new())
        }
    }

    /// A root view whose sign-in succeeds as `user`, or fails when `None`.
    /// The counter tracks editor mounts.
    pub fn root(user: Option<&'static str>) -> (RootView, SessionHandle, Arc<AtomicUsize>) {
        let session = SessionHandle::new();
        let mounts = Arc::new(AtomicUsize::new(0));
        let remote = Arc::new(NoRemote);

        let editor = EditorView::new(
            DraftService::new(Box::new(InMemoryLocalStorage::new()), None),
            LetterService::new(remote.clone(), remote, session.clone()),
            TokenService::new(
                Box::new(CountingConfigurator(Arc::clone(&mounts))),
                Box::new(Grant),
                session.clone(),
            ),
            session.clone(),
            Arc::new(RecordingNotifier::default()),
            chrono_tz::UTC,
        );
        let view = RootView::new(
            IdentityService::new(Box::new(Provider(user)), session.clone()),
            session.clone(),
            editor,
        );
        (view, session, mounts)
    }
}
