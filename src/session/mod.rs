//! Session identity, view state and action dispatch.
//!
//! The presentation layer talks to a [`Session`]; it decides who is acting and on
//! which bus, and keeps the orchestrator's viewed tour in step with the view.

use serde::Serialize;

use crate::auth;
use crate::config::RemoteConfig;
use crate::domain::BoardingSummary;
use crate::errors::RosterError;
use crate::models::{Identity, View};
use crate::share::{self, Clipboard, ShareOutcome};
use crate::sync::{CheckInOutcome, SyncOrchestrator};

/// Dashboard content for the viewed bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub bus_id: String,
    pub summary: BoardingSummary,
    /// Whether the current identity may manage this bus
    pub is_my_bus: bool,
}

pub struct Session {
    orchestrator: SyncOrchestrator,
    admin_password: String,
    identity: Option<Identity>,
    view: View,
}

impl Session {
    pub fn new(orchestrator: SyncOrchestrator, admin_password: impl Into<String>) -> Self {
        Self {
            orchestrator,
            admin_password: admin_password.into(),
            identity: None,
            view: View::Landing,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut SyncOrchestrator {
        &mut self.orchestrator
    }

    fn show(&mut self, view: View) {
        match view.bus_id() {
            Some(bus_id) => self.orchestrator.view_bus(bus_id),
            None => self.orchestrator.stop_viewing(),
        }
        tracing::debug!("Showing {:?}", view);
        self.view = view;
    }

    pub fn login_leader(&mut self, user: &str, password: &str) -> Result<(), RosterError> {
        let identity = auth::login_leader(self.orchestrator.leaders(), user, password)?;
        let bus_id = identity.bus_id().unwrap_or_default().to_string();
        self.identity = Some(identity);
        self.show(View::Dashboard { bus_id });
        Ok(())
    }

    /// Open the self check-in screen of a bus.
    pub fn enter_member_scan(&mut self, bus_id: &str) {
        self.identity = Some(Identity::Member);
        self.show(View::MemberScan {
            bus_id: bus_id.to_string(),
        });
    }

    pub fn open_admin_login(&mut self) {
        self.show(View::AdminLogin);
    }

    pub fn login_admin(&mut self, password: &str) -> Result<(), RosterError> {
        let identity = auth::login_admin(password, &self.admin_password)?;
        self.identity = Some(identity);
        self.show(View::AdminPanel);
        Ok(())
    }

    pub fn logout(&mut self) {
        self.identity = None;
        self.show(View::Landing);
    }

    /// Identity and bus of the current view.
    fn active<'a>(
        identity: &'a Option<Identity>,
        view: &'a View,
    ) -> Result<(&'a Identity, &'a str), RosterError> {
        let identity = identity
            .as_ref()
            .ok_or_else(|| RosterError::Unauthorized("Please log in first".to_string()))?;
        let bus_id = view.bus_id().ok_or_else(|| {
            RosterError::Validation("Open a bus before changing its roster".to_string())
        })?;
        Ok((identity, bus_id))
    }

    pub async fn import_members(&mut self, text: &str) -> Result<usize, RosterError> {
        let (identity, bus_id) = Self::active(&self.identity, &self.view)?;
        self.orchestrator.import_members(identity, bus_id, text).await
    }

    pub async fn check_in(&mut self, code: &str) -> Result<CheckInOutcome, RosterError> {
        let (identity, bus_id) = Self::active(&self.identity, &self.view)?;
        self.orchestrator.check_in(identity, bus_id, code).await
    }

    pub async fn set_boarding(&mut self, member_id: &str, boarding: bool) -> Result<(), RosterError> {
        let (identity, bus_id) = Self::active(&self.identity, &self.view)?;
        self.orchestrator
            .toggle_boarding(identity, bus_id, member_id, boarding)
            .await
    }

    pub async fn delete_member(&mut self, member_id: &str) -> Result<(), RosterError> {
        let (identity, bus_id) = Self::active(&self.identity, &self.view)?;
        self.orchestrator
            .delete_member(identity, bus_id, member_id)
            .await
    }

    pub async fn reset_boarding(&mut self) -> Result<(), RosterError> {
        let (identity, bus_id) = Self::active(&self.identity, &self.view)?;
        self.orchestrator.reset_boarding(identity, bus_id).await
    }

    pub async fn save_remote_config(&mut self, json: &str) -> Result<RemoteConfig, RosterError> {
        let identity = self
            .identity
            .as_ref()
            .ok_or_else(|| RosterError::Unauthorized("Please log in first".to_string()))?;
        self.orchestrator.save_remote_config(identity, json).await
    }

    pub async fn share_link(
        &self,
        current_url: &str,
        clipboard: Option<&dyn Clipboard>,
    ) -> Result<ShareOutcome, RosterError> {
        let config = self.orchestrator.remote_config().await?;
        share::share_magic_link(config.as_ref(), current_url, clipboard).await
    }

    pub fn qr_code_url(&self, page_url: &str) -> String {
        share::qr_code_url(page_url)
    }

    /// Summary of the viewed bus, if the view shows one.
    pub fn dashboard(&self) -> Option<Dashboard> {
        let bus_id = self.view.bus_id()?;
        let summary = self.orchestrator.summary(bus_id)?;
        let is_my_bus = self
            .identity
            .as_ref()
            .is_some_and(|identity| identity.can_manage(bus_id));
        Some(Dashboard {
            bus_id: bus_id.to_string(),
            summary,
            is_my_bus,
        })
    }

    pub async fn process_pending(&mut self) -> usize {
        self.orchestrator.process_pending().await
    }
}
