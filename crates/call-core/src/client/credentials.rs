//! Signaling session bootstrap
//!
//! Every backend call that needs an authenticated signaling session goes
//! through [`CredentialBootstrapper::ensure_signaling_user`]. The login runs at
//! most once at a time: the first caller reads the stored credentials and
//! starts the login, every overlapping caller awaits the same shared future,
//! and later callers get the cached result.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::backend::{CredentialStore, SignalingBackend};
use crate::call::SignalingUser;
use crate::error::{CallError, CallResult};

type LoginFuture = Shared<BoxFuture<'static, CallResult<SignalingUser>>>;

/// Single-flight login against the signaling backend
pub struct CredentialBootstrapper {
    backend: Arc<dyn SignalingBackend>,
    store: Arc<dyn CredentialStore>,
    auth_token_key: String,
    signaling_uid_key: String,
    login: Mutex<Option<LoginFuture>>,
}

impl std::fmt::Debug for CredentialBootstrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBootstrapper")
            .field("auth_token_key", &self.auth_token_key)
            .field("signaling_uid_key", &self.signaling_uid_key)
            .finish()
    }
}

impl CredentialBootstrapper {
    pub fn new(
        backend: Arc<dyn SignalingBackend>,
        store: Arc<dyn CredentialStore>,
        auth_token_key: impl Into<String>,
        signaling_uid_key: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            store,
            auth_token_key: auth_token_key.into(),
            signaling_uid_key: signaling_uid_key.into(),
            login: Mutex::new(None),
        }
    }

    /// Return the logged-in signaling user, logging in if needed
    ///
    /// # Errors
    ///
    /// * `CallError::AuthCredentialsMissing` - the auth token or the signaling
    ///   user id is not in the credential store
    /// * `CallError::AuthenticationFailed` - the backend refused the login
    pub async fn ensure_signaling_user(&self) -> CallResult<SignalingUser> {
        let login = {
            // Held while reading the store so two first callers cannot both
            // start a login.
            let mut slot = self.login.lock().await;
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining existing signaling login");
                    existing.clone()
                }
                None => {
                    let uid = self.read_credentials().await?;
                    let backend = self.backend.clone();
                    let login = async move {
                        backend
                            .login(&uid)
                            .await
                            .map_err(|e| CallError::authentication_failed(e.to_string()))
                    }
                    .boxed()
                    .shared();
                    *slot = Some(login.clone());
                    login
                }
            }
        };

        let result = login.clone().await;
        match &result {
            Ok(user) => {
                debug!(uid = %user.uid, "Signaling user ready");
            }
            Err(e) => {
                warn!(error = %e, "Signaling login failed");
                // Drop the failed attempt so the next caller retries, unless a
                // newer attempt already replaced it.
                let mut slot = self.login.lock().await;
                if slot.as_ref().is_some_and(|current| current.ptr_eq(&login)) {
                    *slot = None;
                }
            }
        }
        result
    }

    /// True once a login has completed successfully
    pub async fn is_logged_in(&self) -> bool {
        let slot = self.login.lock().await;
        matches!(slot.as_ref().and_then(|login| login.peek()), Some(Ok(_)))
    }

    /// Forget the cached login so the next call logs in again
    pub async fn invalidate(&self) {
        *self.login.lock().await = None;
    }

    async fn read_credentials(&self) -> CallResult<String> {
        let auth_token = self.store.get_item(&self.auth_token_key).await?;
        if auth_token.as_deref().map_or(true, str::is_empty) {
            return Err(CallError::AuthCredentialsMissing {
                key: self.auth_token_key.clone(),
            });
        }

        match self.store.get_item(&self.signaling_uid_key).await? {
            Some(uid) if !uid.is_empty() => {
                info!(uid = %uid, "Logging in to signaling backend");
                Ok(uid)
            }
            _ => Err(CallError::AuthCredentialsMissing {
                key: self.signaling_uid_key.clone(),
            }),
        }
    }
}
