//! The sync orchestrator.
//!
//! One orchestrator per client process, driven from a single task. Mutations are
//! applied to the in-memory tree first and then forwarded to whichever store is
//! authoritative. Remote snapshots arrive through listener callbacks, are queued on
//! a channel, and are applied when the owner calls [`SyncOrchestrator::process_pending`]
//! or [`SyncOrchestrator::process_next`].

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use super::{CloudContext, DocKey, ModeKind, SyncMode, WriteState, WriteStates};
use crate::config::RemoteConfig;
use crate::domain::{
    append_members, match_check_in, parse_import, prune_boarded, with_boarding,
    BoardingSummary, CheckInMatch, MemberIdGenerator,
};
use crate::errors::{Notice, RosterError};
use crate::models::{Identity, Leader, LeadersDoc, Member, RosterData, Tour, TourPatch};
use crate::store::{
    load_remote_config_raw, load_roster, save_remote_config, save_roster, DocPath, LocalStore,
    RemoteSession, RemoteStore, SnapshotListener, SnapshotResult, Subscription,
};

/// Remote field holding boarded member ids.
pub const BOARDED_IDS_FIELD: &str = "boardedIds";

/// Everything the orchestrator needs at startup.
pub struct OrchestratorOptions {
    /// Namespace for remote documents
    pub app_id: String,
    pub local: Arc<dyn LocalStore>,
    /// Remote adapter, when this build has one
    pub remote: Option<Arc<dyn RemoteStore>>,
    /// First-run data, also used to bootstrap the remote leaders document
    pub seed: RosterData,
}

/// Document a queued snapshot belongs to.
#[derive(Debug, Clone)]
enum SyncTarget {
    Leaders,
    Tour { bus_id: String, generation: u64 },
}

struct SyncEvent {
    target: SyncTarget,
    result: SnapshotResult,
}

/// The bus currently being viewed and its live subscription.
struct TourView {
    bus_id: String,
    generation: u64,
    subscription: Option<Subscription>,
}

/// Result of a self check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// The member was boarded; the caller should clear its input.
    Boarded { member_id: String, name: String },
    /// Nothing changed.
    AlreadyBoarded { member_id: String, name: String },
}

impl CheckInOutcome {
    pub fn member_id(&self) -> &str {
        match self {
            CheckInOutcome::Boarded { member_id, .. }
            | CheckInOutcome::AlreadyBoarded { member_id, .. } => member_id,
        }
    }

    pub fn notice(&self) -> Notice {
        match self {
            CheckInOutcome::Boarded { name, .. } => {
                Notice::success("Checked in", format!("Welcome aboard, {name}!"))
            }
            CheckInOutcome::AlreadyBoarded { name, .. } => Notice::info(
                "Already checked in",
                format!("{name} has already checked in, nothing else to do."),
            ),
        }
    }
}

pub struct SyncOrchestrator {
    app_id: String,
    data: RosterData,
    seed: RosterData,
    local: Arc<dyn LocalStore>,
    mode: SyncMode,
    viewing: Option<TourView>,
    next_generation: u64,
    writes: WriteStates,
    ids: MemberIdGenerator,
    notices: Vec<Notice>,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
    events_rx: mpsc::UnboundedReceiver<SyncEvent>,
}

impl SyncOrchestrator {
    /// Select the operating mode and load initial state.
    ///
    /// Cloud mode requires a valid persisted remote config, a remote adapter and a
    /// successful anonymous sign-in. Anything else leaves the orchestrator in local
    /// mode with a notice queued; there is no automatic retry.
    pub async fn start(options: OrchestratorOptions) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut orchestrator = Self {
            app_id: options.app_id,
            data: options.seed.clone(),
            seed: options.seed,
            local: options.local,
            mode: SyncMode::Local,
            viewing: None,
            next_generation: 0,
            writes: WriteStates::default(),
            ids: MemberIdGenerator::new(),
            notices: Vec::new(),
            events_tx,
            events_rx,
        };

        match orchestrator.connect(options.remote).await {
            Ok(Some(ctx)) => {
                orchestrator.mode = SyncMode::Cloud(ctx);
                orchestrator.subscribe_leaders();
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Starting in local mode: {}", err);
                orchestrator.notices.push(err.notice());
            }
        }

        if orchestrator.mode_kind() == ModeKind::Local {
            orchestrator.load_local().await;
        }

        tracing::info!("Sync orchestrator started in {} mode", orchestrator.mode_kind());
        orchestrator
    }

    async fn connect(
        &self,
        remote: Option<Arc<dyn RemoteStore>>,
    ) -> Result<Option<CloudContext>, RosterError> {
        let Some(raw) = load_remote_config_raw(&*self.local).await? else {
            tracing::info!("No cloud configuration saved");
            return Ok(None);
        };
        let config = RemoteConfig::parse(&raw)?;
        let Some(remote) = remote else {
            tracing::warn!(
                "Cloud configuration for {} is saved but no remote adapter is available",
                config.project_id()
            );
            return Ok(None);
        };
        CloudContext::connect(remote, config).await.map(Some)
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn data(&self) -> &RosterData {
        &self.data
    }

    pub fn leaders(&self) -> &[Leader] {
        &self.data.leaders
    }

    pub fn tour(&self, bus_id: &str) -> Option<&Tour> {
        self.data.tour(bus_id)
    }

    pub fn summary(&self, bus_id: &str) -> Option<BoardingSummary> {
        self.data.tour(bus_id).map(BoardingSummary::of)
    }

    pub fn session(&self) -> Option<&RemoteSession> {
        self.mode.cloud().map(CloudContext::session)
    }

    pub fn viewing_bus(&self) -> Option<&str> {
        self.viewing.as_ref().map(|view| view.bus_id.as_str())
    }

    pub fn write_state(&self, key: &DocKey) -> WriteState {
        self.writes.state(key)
    }

    pub fn write_history(&self, key: &DocKey) -> Vec<WriteState> {
        self.writes.history(key)
    }

    /// Notices raised while processing events, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn remote(&self) -> Option<Arc<dyn RemoteStore>> {
        self.mode.cloud().map(CloudContext::remote)
    }

    fn listener(&self, target: SyncTarget) -> SnapshotListener {
        let events_tx = self.events_tx.clone();
        Arc::new(move |result| {
            // The receiver only closes when the orchestrator is gone.
            let _ = events_tx.send(SyncEvent {
                target: target.clone(),
                result,
            });
        })
    }

    fn subscribe_leaders(&mut self) {
        let listener = self.listener(SyncTarget::Leaders);
        let path = DocPath::leaders(&self.app_id);
        if let SyncMode::Cloud(ctx) = &mut self.mode {
            let subscription = ctx.remote().subscribe(&path, listener);
            ctx.set_leaders_subscription(subscription);
            tracing::info!("Subscribed to {}", path);
        }
    }

    /// Start viewing a bus. In cloud mode this subscribes to its tour document and
    /// releases the subscription of the previously viewed bus.
    pub fn view_bus(&mut self, bus_id: &str) {
        if self.viewing_bus() == Some(bus_id) {
            return;
        }
        self.stop_viewing();

        self.next_generation += 1;
        let generation = self.next_generation;
        let subscription = self.remote().map(|remote| {
            let path = DocPath::tour(&self.app_id, bus_id);
            let listener = self.listener(SyncTarget::Tour {
                bus_id: bus_id.to_string(),
                generation,
            });
            tracing::info!("Subscribed to {}", path);
            remote.subscribe(&path, listener)
        });

        self.viewing = Some(TourView {
            bus_id: bus_id.to_string(),
            generation,
            subscription,
        });
    }

    /// Stop viewing the current bus, if any.
    pub fn stop_viewing(&mut self) {
        if let Some(view) = self.viewing.take() {
            if let Some(subscription) = view.subscription {
                subscription.unsubscribe();
                tracing::info!("Unsubscribed from tour {}", view.bus_id);
            }
        }
    }

    fn is_current_view(&self, bus_id: &str, generation: u64) -> bool {
        self.viewing
            .as_ref()
            .is_some_and(|view| view.bus_id == bus_id && view.generation == generation)
    }

    /// Apply every queued snapshot without waiting. Returns how many were handled.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Wait for the next snapshot and apply it.
    pub async fn process_next(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: SyncEvent) {
        if self.mode_kind() != ModeKind::Cloud {
            tracing::debug!("Dropping {:?} snapshot received in local mode", event.target);
            return;
        }

        match event.target {
            SyncTarget::Leaders => self.apply_leaders_snapshot(event.result).await,
            SyncTarget::Tour { bus_id, generation } => {
                if !self.is_current_view(&bus_id, generation) {
                    tracing::debug!("Dropping stale snapshot for tour {}", bus_id);
                    return;
                }
                self.apply_tour_snapshot(&bus_id, event.result).await;
            }
        }
    }

    async fn apply_leaders_snapshot(&mut self, result: SnapshotResult) {
        match result {
            Ok(Some(doc)) => match serde_json::from_value::<LeadersDoc>(doc) {
                Ok(doc) => {
                    self.data.leaders = doc.leaders;
                    self.writes.tracker(&DocKey::Leaders).observe_snapshot();
                }
                Err(e) => tracing::warn!("Ignoring malformed leaders document: {}", e),
            },
            Ok(None) => {
                let doc = LeadersDoc {
                    leaders: self.seed.leaders.clone(),
                };
                let path = DocPath::leaders(&self.app_id);
                self.bootstrap(&path, serde_json::to_value(doc)).await;
            }
            Err(e) => {
                let err = RosterError::SubscriptionError(format!("Leader sync failed: {}", e));
                self.fall_back_to_local(err).await;
            }
        }
    }

    async fn apply_tour_snapshot(&mut self, bus_id: &str, result: SnapshotResult) {
        match result {
            Ok(Some(doc)) => match serde_json::from_value::<Tour>(doc) {
                Ok(mut tour) => {
                    // A peer may board a member another device just deleted.
                    let pruned = prune_boarded(&tour.boarded_ids, &tour.members);
                    let orphans: Vec<String> = tour
                        .boarded_ids
                        .iter()
                        .filter(|id| !pruned.contains(id))
                        .cloned()
                        .collect();
                    tour.boarded_ids = pruned;

                    self.data.tours.insert(bus_id.to_string(), tour);
                    self.writes.tracker(&DocKey::tour(bus_id)).observe_snapshot();
                    self.remove_orphans(bus_id, orphans).await;
                }
                Err(e) => tracing::warn!("Ignoring malformed tour document {}: {}", bus_id, e),
            },
            Ok(None) => {
                let initial = self
                    .data
                    .tour(bus_id)
                    .cloned()
                    .unwrap_or_else(|| Tour::empty(bus_id));
                let path = DocPath::tour(&self.app_id, bus_id);
                self.bootstrap(&path, serde_json::to_value(initial)).await;
            }
            Err(e) => {
                let err =
                    RosterError::SubscriptionError(format!("Tour {} sync failed: {}", bus_id, e));
                self.fall_back_to_local(err).await;
            }
        }
    }

    /// Drop boarded ids without a member from the remote document.
    async fn remove_orphans(&mut self, bus_id: &str, orphans: Vec<String>) {
        for member_id in orphans {
            tracing::info!("Removing orphaned boarding entry {} on {}", member_id, bus_id);
            if let Err(err) = self.remote_boarding(bus_id, &member_id, false).await {
                self.notices.push(err.notice());
            }
        }
    }

    /// Write-once creation of a missing remote document.
    async fn bootstrap(&mut self, path: &DocPath, doc: Result<Value, serde_json::Error>) {
        let Some(remote) = self.remote() else {
            return;
        };
        let doc = match doc {
            Ok(doc) => doc,
            Err(e) => {
                self.notices.push(RosterError::from(e).notice());
                return;
            }
        };
        tracing::info!("Initializing missing document {}", path);
        if let Err(e) = remote.set_if_absent(path, doc).await {
            self.notices.push(RosterError::from(e).notice());
        }
    }

    /// Leave cloud mode for good. Local storage becomes authoritative.
    async fn fall_back_to_local(&mut self, err: RosterError) {
        debug_assert!(err.changes_mode());
        tracing::warn!("Falling back to local mode: {}", err);

        if let Some(view) = self.viewing.as_mut() {
            if let Some(subscription) = view.subscription.take() {
                subscription.unsubscribe();
            }
        }
        if let SyncMode::Cloud(ctx) = std::mem::replace(&mut self.mode, SyncMode::Local) {
            ctx.teardown();
        }
        self.notices.push(err.notice());

        self.load_local().await;
    }

    async fn load_local(&mut self) {
        match load_roster(&*self.local).await {
            Ok(Some(data)) => {
                tracing::info!("Loaded local snapshot with {} tours", data.tours.len());
                self.data = data;
            }
            Ok(None) => tracing::info!("No local snapshot, using current data"),
            Err(err) => self.notices.push(err.notice()),
        }
        if let Err(err) = save_roster(&*self.local, &self.data).await {
            self.notices.push(err.notice());
        }
    }

    /// Persisted remote config, if one has been saved.
    pub async fn remote_config(&self) -> Result<Option<RemoteConfig>, RosterError> {
        match load_remote_config_raw(&*self.local).await? {
            Some(raw) => RemoteConfig::parse(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Validate and persist a remote config pasted by the admin. It takes effect
    /// on the next start.
    pub async fn save_remote_config(
        &self,
        identity: &Identity,
        json: &str,
    ) -> Result<RemoteConfig, RosterError> {
        if *identity != Identity::Admin {
            return Err(RosterError::Unauthorized(
                "Only the admin can change the cloud configuration".to_string(),
            ));
        }
        let config = RemoteConfig::parse(json)?;
        save_remote_config(&*self.local, &config).await?;
        tracing::info!("Saved cloud configuration for {}", config.project_id());
        Ok(config)
    }

    fn authorize(identity: &Identity, bus_id: &str) -> Result<(), RosterError> {
        if identity.can_manage(bus_id) {
            Ok(())
        } else {
            tracing::warn!("{} may not modify {}", identity.role(), bus_id);
            Err(RosterError::Unauthorized(
                "You can only operate the bus you are leading".to_string(),
            ))
        }
    }

    /// Shallow-merge `patch` into a tour, optimistically, then forward it.
    ///
    /// A failed remote write is not rolled back; the next snapshot corrects it.
    pub async fn update_bus_data(
        &mut self,
        identity: &Identity,
        bus_id: &str,
        patch: TourPatch,
    ) -> Result<(), RosterError> {
        Self::authorize(identity, bus_id)?;
        self.apply_bus_patch(bus_id, patch).await
    }

    async fn apply_bus_patch(&mut self, bus_id: &str, patch: TourPatch) -> Result<(), RosterError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.data.tour_mut(bus_id).apply_patch(&patch);

        let key = DocKey::tour(bus_id);
        self.writes.tracker(&key).begin();
        let result = match self.remote() {
            Some(remote) => {
                let fields = patch.to_fields()?;
                let path = DocPath::tour(&self.app_id, bus_id);
                remote.update(&path, fields).await.map_err(RosterError::from)
            }
            None => save_roster(&*self.local, &self.data).await,
        };
        self.settle(&key, &result);
        result
    }

    fn settle(&mut self, key: &DocKey, result: &Result<(), RosterError>) {
        let tracker = self.writes.tracker(key);
        match result {
            Ok(()) => tracker.confirm(),
            Err(_) => tracker.fail(),
        }
    }

    /// Board or unboard a member.
    ///
    /// Cloud mode uses the remote set primitives and waits for the snapshot to
    /// update memory. Local mode computes the new sequence and writes it through.
    pub async fn toggle_boarding(
        &mut self,
        identity: &Identity,
        bus_id: &str,
        member_id: &str,
        boarding: bool,
    ) -> Result<(), RosterError> {
        Self::authorize(identity, bus_id)?;
        self.set_boarding(bus_id, member_id, boarding).await
    }

    async fn set_boarding(
        &mut self,
        bus_id: &str,
        member_id: &str,
        boarding: bool,
    ) -> Result<(), RosterError> {
        let tour = self
            .data
            .tour(bus_id)
            .ok_or_else(|| RosterError::NotFound(format!("Unknown bus {}", bus_id)))?;
        if tour.member(member_id).is_none() {
            return Err(RosterError::NotFound(format!(
                "No passenger {} on {}",
                member_id, bus_id
            )));
        }
        let boarded_ids = with_boarding(&tour.boarded_ids, member_id, boarding);

        if self.mode_kind() == ModeKind::Cloud {
            self.remote_boarding(bus_id, member_id, boarding).await
        } else {
            self.apply_bus_patch(bus_id, TourPatch::boarded_ids(boarded_ids))
                .await
        }
    }

    async fn remote_boarding(
        &mut self,
        bus_id: &str,
        member_id: &str,
        boarding: bool,
    ) -> Result<(), RosterError> {
        let Some(remote) = self.remote() else {
            return Ok(());
        };
        let path = DocPath::tour(&self.app_id, bus_id);
        let value = Value::String(member_id.to_string());

        let key = DocKey::tour(bus_id);
        self.writes.tracker(&key).begin();
        let result = if boarding {
            remote.array_add(&path, BOARDED_IDS_FIELD, value).await
        } else {
            remote.array_remove(&path, BOARDED_IDS_FIELD, value).await
        }
        .map_err(RosterError::from);
        self.settle(&key, &result);
        result
    }

    /// Self check-in by phone suffix.
    ///
    /// Allowed for a member identity on any bus and for a leader on its own bus.
    pub async fn check_in(
        &mut self,
        identity: &Identity,
        bus_id: &str,
        code: &str,
    ) -> Result<CheckInOutcome, RosterError> {
        let permitted = match identity {
            Identity::Member => true,
            Identity::Leader(_) => identity.can_manage(bus_id),
            Identity::Admin => false,
        };
        if !permitted {
            return Err(RosterError::Unauthorized(
                "Self check-in is only available on the check-in screen".to_string(),
            ));
        }

        let tour = self
            .data
            .tour(bus_id)
            .ok_or_else(|| RosterError::NotFound(format!("Unknown bus {}", bus_id)))?;
        let (member_id, name) = match match_check_in(tour, code)? {
            CheckInMatch::AlreadyBoarded(member) => {
                return Ok(CheckInOutcome::AlreadyBoarded {
                    member_id: member.id.clone(),
                    name: member.name.clone(),
                });
            }
            CheckInMatch::Pending(member) => (member.id.clone(), member.name.clone()),
        };

        self.set_boarding(bus_id, &member_id, true).await?;
        tracing::info!("{} checked in on {}", member_id, bus_id);
        Ok(CheckInOutcome::Boarded { member_id, name })
    }

    /// Append members parsed from pasted text. Returns how many were added.
    pub async fn import_members(
        &mut self,
        identity: &Identity,
        bus_id: &str,
        text: &str,
    ) -> Result<usize, RosterError> {
        Self::authorize(identity, bus_id)?;

        let imported = parse_import(text, &mut self.ids);
        if imported.is_empty() {
            return Ok(0);
        }
        let count = imported.len();
        let existing: &[Member] = self
            .data
            .tour(bus_id)
            .map(|tour| tour.members.as_slice())
            .unwrap_or_default();
        let members = append_members(existing, imported);

        self.apply_bus_patch(bus_id, TourPatch::members(members))
            .await?;
        tracing::info!("Imported {} members into {}", count, bus_id);
        Ok(count)
    }

    /// Remove a member and its boarding entry.
    pub async fn delete_member(
        &mut self,
        identity: &Identity,
        bus_id: &str,
        member_id: &str,
    ) -> Result<(), RosterError> {
        Self::authorize(identity, bus_id)?;

        let tour = self
            .data
            .tour(bus_id)
            .ok_or_else(|| RosterError::NotFound(format!("Unknown bus {}", bus_id)))?;
        if tour.member(member_id).is_none() {
            return Err(RosterError::NotFound(format!(
                "No passenger {} on {}",
                member_id, bus_id
            )));
        }
        let was_boarded = tour.is_boarded(member_id);
        let members: Vec<Member> = tour
            .members
            .iter()
            .filter(|m| m.id != member_id)
            .cloned()
            .collect();
        let boarded_ids = prune_boarded(&tour.boarded_ids, &members);

        if self.mode_kind() == ModeKind::Cloud {
            // Concurrent boarding by peers must survive, so the id is removed with
            // the set primitive rather than by rewriting the array.
            self.apply_bus_patch(bus_id, TourPatch::members(members))
                .await?;
            self.data.tour_mut(bus_id).boarded_ids = boarded_ids;
            if was_boarded {
                self.remote_boarding(bus_id, member_id, false).await?;
            }
            Ok(())
        } else {
            let patch = TourPatch {
                members: Some(members),
                boarded_ids: Some(boarded_ids),
                ..TourPatch::default()
            };
            self.apply_bus_patch(bus_id, patch).await
        }
    }

    /// Mark every member of a bus as not boarded.
    pub async fn reset_boarding(
        &mut self,
        identity: &Identity,
        bus_id: &str,
    ) -> Result<(), RosterError> {
        Self::authorize(identity, bus_id)?;
        self.apply_bus_patch(bus_id, TourPatch::boarded_ids(Vec::new()))
            .await
    }

    /// Replace the global leader list. Admin only.
    pub async fn replace_leaders(
        &mut self,
        identity: &Identity,
        leaders: Vec<Leader>,
    ) -> Result<(), RosterError> {
        if *identity != Identity::Admin {
            return Err(RosterError::Unauthorized(
                "Only the admin can edit leader accounts".to_string(),
            ));
        }
        self.data.leaders = leaders;

        let key = DocKey::Leaders;
        self.writes.tracker(&key).begin();
        let result = match self.remote() {
            Some(remote) => {
                let mut fields = Map::new();
                fields.insert(
                    "leaders".to_string(),
                    serde_json::to_value(&self.data.leaders)?,
                );
                let path = DocPath::leaders(&self.app_id);
                remote.update(&path, fields).await.map_err(RosterError::from)
            }
            None => save_roster(&*self.local, &self.data).await,
        };
        self.settle(&key, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryLocalStore, MemoryRemoteStore};

    fn leader_a(data: &RosterData) -> Identity {
        Identity::Leader(data.leaders[0].clone())
    }

    async fn local_orchestrator() -> SyncOrchestrator {
        SyncOrchestrator::start(OrchestratorOptions {
            app_id: "test-app".to_string(),
            local: Arc::new(MemoryLocalStore::new()),
            remote: None,
            seed: RosterData::seed(),
        })
        .await
    }

    #[tokio::test]
    async fn test_starts_local_without_config() {
        let orchestrator = local_orchestrator().await;
        assert_eq!(orchestrator.mode_kind(), ModeKind::Local);
        assert!(orchestrator.session().is_none());
        assert_eq!(orchestrator.tour("bus_A").unwrap().members.len(), 1);
    }

    #[tokio::test]
    async fn test_config_without_adapter_stays_local() {
        let local = Arc::new(MemoryLocalStore::new());
        let config = RemoteConfig::parse(r#"{"apiKey":"k","projectId":"p"}"#).unwrap();
        save_remote_config(&*local, &config).await.unwrap();

        let mut orchestrator = SyncOrchestrator::start(OrchestratorOptions {
            app_id: "test-app".to_string(),
            local,
            remote: None,
            seed: RosterData::seed(),
        })
        .await;

        assert_eq!(orchestrator.mode_kind(), ModeKind::Local);
        assert!(orchestrator.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_bus_creates_tour() {
        let mut orchestrator = local_orchestrator().await;
        let mut leader = orchestrator.leaders()[0].clone();
        leader.bus_id = "bus_Z".to_string();
        let identity = Identity::Leader(leader);

        let patch = TourPatch {
            bus_name: Some("Z".to_string()),
            ..TourPatch::default()
        };
        orchestrator
            .update_bus_data(&identity, "bus_Z", patch)
            .await
            .unwrap();

        let tour = orchestrator.tour("bus_Z").unwrap();
        assert_eq!(tour.bus_name, "Z");
        assert!(tour.members.is_empty());
    }

    #[tokio::test]
    async fn test_empty_patch_is_not_a_write() {
        let mut orchestrator = local_orchestrator().await;
        let identity = leader_a(orchestrator.data());
        orchestrator
            .update_bus_data(&identity, "bus_A", TourPatch::default())
            .await
            .unwrap();
        assert_eq!(
            orchestrator.write_history(&DocKey::tour("bus_A")),
            vec![WriteState::Clean]
        );
    }

    #[tokio::test]
    async fn test_toggle_unknown_member_is_not_found() {
        let mut orchestrator = local_orchestrator().await;
        let identity = leader_a(orchestrator.data());
        let err = orchestrator
            .toggle_boarding(&identity, "bus_A", "ghost", true)
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_admin_cannot_check_in() {
        let mut orchestrator = local_orchestrator().await;
        let err = orchestrator
            .check_in(&Identity::Admin, "bus_A", "678")
            .await
            .unwrap_err();
        assert!(matches!(err, RosterError::Unauthorized(_)));
        assert!(orchestrator.tour("bus_A").unwrap().boarded_ids.is_empty());
    }

    #[tokio::test]
    async fn test_snapshots_dropped_in_local_mode() {
        let remote = MemoryRemoteStore::new();
        let mut orchestrator = local_orchestrator().await;
        let listener = orchestrator.listener(SyncTarget::Leaders);
        let _sub = remote.subscribe(&DocPath::leaders("test-app"), listener);

        assert_eq!(orchestrator.process_pending().await, 1);
        assert_eq!(orchestrator.leaders().len(), 3);
    }

    #[test]
    fn test_check_in_outcome_notice() {
        let outcome = CheckInOutcome::Boarded {
            member_id: "m1".into(),
            name: "Zhang".into(),
        };
        assert_eq!(outcome.member_id(), "m1");
        assert_eq!(outcome.notice().message, "Welcome aboard, Zhang!");
    }
}
