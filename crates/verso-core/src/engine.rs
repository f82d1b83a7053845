//! The lineage engine: the store behind a lock, with optional journaling.
//!
//! Every mutation runs under the write lock as build event, validate,
//! journal, apply. A journal failure returns before `apply`, so memory and
//! disk never disagree. Reads take the read lock and return owned values.

use std::path::Path;

use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::analytics::{AnalyticsSummary, EffectiveSettings, prompt_analytics};
use crate::branch::{fork_event, rollback_event};
use crate::clock::{Clock, MonotonicClock};
use crate::config::EngineConfig;
use crate::diff::{DiffResult, diff_versions};
use crate::error::LineageError;
use crate::journal::{HistoryLog, Journal};
use crate::model::{ChangeType, ContentId, ContentType, Lineage, Version, VersionDraft, VersionId};
use crate::search::{SearchHit, SnippetOptions, search_versions};
use crate::store::{StoreEvent, VersionStore, initial_parts};
use crate::tree::{LineageSummary, LineageView, branch_history, lineage_view};

struct State {
    store: VersionStore,
    log: Option<Box<dyn HistoryLog>>,
}

impl State {
    fn commit(&mut self, event: StoreEvent) -> Result<(), LineageError> {
        self.store.check(&event)?;
        if let Some(log) = self.log.as_mut() {
            log.append(&event)?;
        }
        self.store.apply(event)
    }
}

pub struct LineageEngine {
    state: RwLock<State>,
    clock: Box<dyn Clock>,
    config: EngineConfig,
}

impl std::fmt::Debug for LineageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("LineageEngine")
            .field("lineages", &state.store.lineage_count())
            .field("versions", &state.store.version_count())
            .field("journaled", &state.log.is_some())
            .finish_non_exhaustive()
    }
}

impl LineageEngine {
    /// Engine with default config and no journal.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_clock(EngineConfig::default(), MonotonicClock::new())
    }

    /// Engine with no journal and an injected clock.
    #[must_use]
    pub fn with_clock(config: EngineConfig, clock: impl Clock + 'static) -> Self {
        Self {
            state: RwLock::new(State {
                store: VersionStore::new(),
                log: None,
            }),
            clock: Box::new(clock),
            config,
        }
    }

    /// Engine that appends to `log`, starting from `history`.
    ///
    /// # Errors
    ///
    /// [`LineageError::InvalidReference`] if a replayed event names a parent
    /// that does not precede it, or duplicates an id.
    pub fn with_history(
        config: EngineConfig,
        log: Box<dyn HistoryLog>,
        history: Vec<StoreEvent>,
    ) -> Result<Self, LineageError> {
        let clock = MonotonicClock::new();
        let mut store = VersionStore::new();
        let replayed = history.len();
        for event in history {
            clock.observe(event.version().created_at);
            store.apply(event)?;
        }
        info!(
            events = replayed,
            lineages = store.lineage_count(),
            "history replayed"
        );
        Ok(Self {
            state: RwLock::new(State {
                store,
                log: Some(log),
            }),
            clock: Box::new(clock),
            config,
        })
    }

    /// Open the project at `project_root`: replay its journal, or start
    /// empty in memory when journaling is disabled.
    ///
    /// # Errors
    ///
    /// Journal read/lock failures, or an invalid reference in the history.
    pub fn open(project_root: &Path, config: EngineConfig) -> Result<Self, LineageError> {
        if !config.journal.enabled {
            debug!("journal disabled; running in memory");
            return Ok(Self::with_clock(config, MonotonicClock::new()));
        }
        let (journal, history) = Journal::open(project_root, &config)?;
        Self::with_history(config, Box::new(journal), history)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn stamp(&self, mut draft: VersionDraft) -> VersionDraft {
        if draft.actor.is_none() {
            draft.actor = Some(self.config.identity.default_actor.clone());
        }
        draft
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Start a new lineage; its first version is root, current and `main`.
    ///
    /// # Errors
    ///
    /// Only journal failures.
    #[instrument(skip(self, draft))]
    pub fn create_initial_version(
        &self,
        content_type: ContentType,
        draft: VersionDraft,
    ) -> Result<(ContentId, VersionId), LineageError> {
        let mut state = self.state.write();
        let (content_id, version) = initial_parts(content_type, self.stamp(draft), self.clock.now());
        let version_id = version.version_id.clone();
        state.commit(StoreEvent::LineageCreated {
            content_id: content_id.clone(),
            version,
        })?;
        Ok((content_id, version_id))
    }

    /// Add a version under `parent` on `branch_name`; it becomes current.
    ///
    /// # Errors
    ///
    /// NotFound for an unknown parent, `UnsupportedChange` for merge, or
    /// a journal failure.
    #[instrument(skip(self, draft))]
    pub fn create_new_version(
        &self,
        parent: &VersionId,
        draft: VersionDraft,
        change_type: ChangeType,
        branch_name: &str,
    ) -> Result<VersionId, LineageError> {
        let mut state = self.state.write();
        let event = state.store.new_version_event(
            parent,
            self.stamp(draft),
            change_type,
            branch_name,
            self.clock.now(),
        )?;
        let id = event.version().version_id.clone();
        state.commit(event)?;
        Ok(id)
    }

    /// Fork `branch_name` from `base`.
    ///
    /// # Errors
    ///
    /// NotFound for an unknown base, or a journal failure.
    #[instrument(skip(self, description))]
    pub fn create_branch(
        &self,
        base: &VersionId,
        branch_name: &str,
        description: &str,
    ) -> Result<VersionId, LineageError> {
        let mut state = self.state.write();
        let event = fork_event(
            &state.store,
            base,
            branch_name,
            description,
            &self.config.identity.default_actor,
            self.clock.now(),
        )?;
        let id = event.version().version_id.clone();
        state.commit(event)?;
        Ok(id)
    }

    /// Restore `target`'s content as a new `main` version.
    ///
    /// # Errors
    ///
    /// NotFound for an unknown target, or a journal failure.
    #[instrument(skip(self, description))]
    pub fn rollback_to_version(
        &self,
        target: &VersionId,
        description: &str,
    ) -> Result<VersionId, LineageError> {
        let mut state = self.state.write();
        let event = rollback_event(
            &state.store,
            target,
            description,
            &self.config.identity.default_actor,
            self.clock.now(),
        )?;
        let id = event.version().version_id.clone();
        state.commit(event)?;
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// NotFound if the id is unknown.
    pub fn get_version(&self, id: &VersionId) -> Result<Version, LineageError> {
        self.state.read().store.get_version(id).cloned()
    }

    /// # Errors
    ///
    /// NotFound if the id is unknown.
    pub fn get_version_lineage_id(&self, id: &VersionId) -> Result<ContentId, LineageError> {
        self.state.read().store.get_version_lineage_id(id).cloned()
    }

    /// # Errors
    ///
    /// NotFound if the content id is unknown.
    pub fn get_lineage(&self, content_id: &ContentId) -> Result<Lineage, LineageError> {
        self.state.read().store.lineage(content_id).cloned()
    }

    /// Lineages in creation order, optionally of one content type.
    #[must_use]
    pub fn list_lineages(&self, content_type: Option<ContentType>) -> Vec<LineageSummary> {
        self.state
            .read()
            .store
            .lineages()
            .filter(|l| content_type.is_none_or(|ct| ct == l.content_type))
            .map(LineageSummary::from)
            .collect()
    }

    /// Structural diff, `a` as the older side.
    ///
    /// # Errors
    ///
    /// NotFound if either id is unknown.
    pub fn get_version_diff(&self, a: &VersionId, b: &VersionId) -> Result<DiffResult, LineageError> {
        let state = self.state.read();
        let va = state.store.get_version(a)?;
        let vb = state.store.get_version(b)?;
        Ok(diff_versions(va, vb))
    }

    /// # Errors
    ///
    /// NotFound if the content id is unknown.
    pub fn get_version_lineage(&self, content_id: &ContentId) -> Result<LineageView, LineageError> {
        let state = self.state.read();
        Ok(lineage_view(state.store.lineage(content_id)?))
    }

    /// # Errors
    ///
    /// NotFound if the content id or branch is unknown.
    pub fn get_branch_history(
        &self,
        content_id: &ContentId,
        branch_name: &str,
    ) -> Result<Vec<Version>, LineageError> {
        let state = self.state.read();
        branch_history(state.store.lineage(content_id)?, branch_name)
    }

    #[must_use]
    pub fn search_versions(&self, query: &str, content_type: Option<ContentType>) -> Vec<SearchHit> {
        let options = SnippetOptions::from(&self.config.search);
        search_versions(&self.state.read().store, query, content_type, options)
    }

    /// # Errors
    ///
    /// NotFound if the content id is unknown.
    pub fn get_prompt_analytics(&self, content_id: &ContentId) -> Result<AnalyticsSummary, LineageError> {
        let fallback = EffectiveSettings::from(&self.config.analytics);
        let state = self.state.read();
        Ok(prompt_analytics(state.store.lineage(content_id)?, &fallback))
    }

    #[must_use]
    pub fn version_count(&self) -> usize {
        self.state.read().store.version_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SteppedClock;
    use crate::journal::JournalError;
    use crate::model::{GenerationContext, MAIN_BRANCH, content_from};
    use chrono::{TimeZone, Utc};

    fn engine() -> LineageEngine {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        LineageEngine::with_clock(EngineConfig::default(), SteppedClock::new(start, 1_000))
    }

    fn draft(persona: &str) -> VersionDraft {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ctx = GenerationContext::new("Describe", "ollama", "llama3", 0.7, "moderate", ts);
        VersionDraft::new(content_from([("persona", persona)]), ctx)
    }

    struct FailingLog;

    impl HistoryLog for FailingLog {
        fn append(&mut self, _event: &StoreEvent) -> Result<(), JournalError> {
            Err(JournalError::Io(std::io::Error::other("disk full")))
        }
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LineageEngine>();
    }

    #[test]
    fn default_actor_comes_from_config() {
        let mut config = EngineConfig::default();
        config.identity.default_actor = "writer-bot".into();
        let engine = LineageEngine::with_clock(config, MonotonicClock::new());
        let (_, root) = engine
            .create_initial_version(ContentType::CharacterAnalysis, draft("A"))
            .unwrap();
        assert_eq!(engine.get_version(&root).unwrap().created_by, "writer-bot");

        let explicit = engine
            .create_new_version(&root, draft("B").actor("alice"), ChangeType::Modification, MAIN_BRANCH)
            .unwrap();
        assert_eq!(engine.get_version(&explicit).unwrap().created_by, "alice");

        let fork = engine.create_branch(&root, "alt", "try").unwrap();
        assert_eq!(engine.get_version(&fork).unwrap().created_by, "writer-bot");
    }

    #[test]
    fn stepped_clock_orders_versions() {
        let engine = engine();
        let (_, root) = engine
            .create_initial_version(ContentType::CharacterAnalysis, draft("A"))
            .unwrap();
        let next = engine
            .create_new_version(&root, draft("B"), ChangeType::Modification, MAIN_BRANCH)
            .unwrap();
        assert!(
            engine.get_version(&next).unwrap().created_at
                > engine.get_version(&root).unwrap().created_at
        );
    }

    #[test]
    fn journal_failure_leaves_state_untouched() {
        let engine = LineageEngine::with_history(EngineConfig::default(), Box::new(FailingLog), Vec::new())
            .unwrap();
        let err = engine
            .create_initial_version(ContentType::BeatSheet, draft("A"))
            .unwrap_err();
        assert!(matches!(err, LineageError::Journal(_)));
        assert_eq!(engine.version_count(), 0);
        assert!(engine.list_lineages(None).is_empty());
    }

    #[test]
    fn list_lineages_filters_by_type() {
        let engine = engine();
        engine
            .create_initial_version(ContentType::BeatSheet, draft("A"))
            .unwrap();
        engine
            .create_initial_version(ContentType::TropeAnalysis, draft("B"))
            .unwrap();
        assert_eq!(engine.list_lineages(None).len(), 2);
        let beats = engine.list_lineages(Some(ContentType::BeatSheet));
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].content_type, ContentType::BeatSheet);
    }

    #[test]
    fn disabled_journal_opens_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.journal.enabled = false;
        let engine = LineageEngine::open(dir.path(), config).unwrap();
        engine
            .create_initial_version(ContentType::BeatSheet, draft("A"))
            .unwrap();
        assert!(!dir.path().join(".verso").exists());
    }
}
