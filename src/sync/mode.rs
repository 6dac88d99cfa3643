//! Operating mode and the remote connection context.

use std::sync::Arc;

use crate::config::RemoteConfig;
use crate::errors::RosterError;
use crate::store::{RemoteSession, RemoteStore, Subscription};

/// Everything needed to talk to the remote store. Dropping it tears down the
/// leaders subscription.
pub struct CloudContext {
    remote: Arc<dyn RemoteStore>,
    config: RemoteConfig,
    session: RemoteSession,
    leaders_subscription: Option<Subscription>,
}

impl CloudContext {
    /// Establish an anonymous session.
    pub async fn connect(
        remote: Arc<dyn RemoteStore>,
        config: RemoteConfig,
    ) -> Result<Self, RosterError> {
        let session = remote.sign_in_anonymously(&config).await.map_err(|e| {
            tracing::error!("Anonymous sign-in failed: {}", e);
            RosterError::SessionFailed(format!("Could not sign in to the cloud database ({})", e))
        })?;
        tracing::info!(
            "Signed in to project {} as {}",
            config.project_id(),
            session.uid
        );

        Ok(Self {
            remote,
            config,
            session,
            leaders_subscription: None,
        })
    }

    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.remote)
    }

    pub fn session(&self) -> &RemoteSession {
        &self.session
    }

    pub(crate) fn set_leaders_subscription(&mut self, subscription: Subscription) {
        self.leaders_subscription = Some(subscription);
    }

    /// Release the session's subscriptions.
    pub fn teardown(mut self) {
        if let Some(subscription) = self.leaders_subscription.take() {
            subscription.unsubscribe();
        }
        tracing::info!(
            "Closed cloud session {} for project {}",
            self.session.uid,
            self.config.project_id()
        );
    }
}

/// Which store is authoritative.
pub enum SyncMode {
    Local,
    Cloud(CloudContext),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    Local,
    Cloud,
}

impl SyncMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            SyncMode::Local => ModeKind::Local,
            SyncMode::Cloud(_) => ModeKind::Cloud,
        }
    }

    pub fn cloud(&self) -> Option<&CloudContext> {
        match self {
            SyncMode::Local => None,
            SyncMode::Cloud(ctx) => Some(ctx),
        }
    }
}

impl std::fmt::Display for ModeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeKind::Local => write!(f, "local"),
            ModeKind::Cloud => write!(f, "cloud"),
        }
    }
}
