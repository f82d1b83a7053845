//! The version store: authoritative lineage map plus the global version index.
//!
//! All state changes go through [`VersionStore::apply`], which takes a
//! [`StoreEvent`] describing a fully-formed new version. Live operations
//! build an event, validate it with [`VersionStore::check`], persist it, and
//! then apply it; journal replay feeds the same events back through `apply`.
//! Validation runs before any mutation, so a rejected event leaves both maps
//! untouched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LineageError;
use crate::model::{
    ChangeType, ContentId, ContentType, DEFAULT_ACTOR, Lineage, MAIN_BRANCH, Version, VersionDraft,
    VersionId,
};

/// A single state change: one new version and where it goes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A new lineage with its root version on `main`.
    LineageCreated {
        content_id: ContentId,
        version: Version,
    },
    /// A version appended to `version.branch`; becomes the lineage's current version.
    VersionAppended { version: Version },
    /// A fork: `version.branch` is (re)seeded with just this version.
    BranchForked { version: Version },
    /// A rollback copy appended to `main`; becomes the current version.
    RolledBack { version: Version },
}

impl StoreEvent {
    /// The version this event introduces.
    #[must_use]
    pub const fn version(&self) -> &Version {
        match self {
            Self::LineageCreated { version, .. }
            | Self::VersionAppended { version }
            | Self::BranchForked { version }
            | Self::RolledBack { version } => version,
        }
    }

    /// Stable dotted name used in the journal.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::LineageCreated { .. } => "lineage.create",
            Self::VersionAppended { .. } => "version.append",
            Self::BranchForked { .. } => "branch.fork",
            Self::RolledBack { .. } => "version.rollback",
        }
    }
}

/// In-memory lineages keyed by content id, plus `version id -> content id`.
#[derive(Debug, Clone, Default)]
pub struct VersionStore {
    lineages: IndexMap<ContentId, Lineage>,
    version_index: HashMap<VersionId, ContentId>,
}

impl VersionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Fetch a version by id.
    ///
    /// # Errors
    ///
    /// [`LineageError::NotFound`] if the id is unknown.
    pub fn get_version(&self, id: &VersionId) -> Result<&Version, LineageError> {
        let lineage = self.owning_lineage(id)?;
        lineage
            .version(id)
            .ok_or_else(|| LineageError::version_not_found(id))
    }

    /// The content id of the lineage that owns `id`.
    ///
    /// # Errors
    ///
    /// [`LineageError::NotFound`] if the id is unknown.
    pub fn get_version_lineage_id(&self, id: &VersionId) -> Result<&ContentId, LineageError> {
        self.version_index
            .get(id)
            .ok_or_else(|| LineageError::version_not_found(id))
    }

    /// Fetch a lineage by content id.
    ///
    /// # Errors
    ///
    /// [`LineageError::NotFound`] if the content id is unknown.
    pub fn lineage(&self, content_id: &ContentId) -> Result<&Lineage, LineageError> {
        self.lineages
            .get(content_id)
            .ok_or_else(|| LineageError::content_not_found(content_id))
    }

    /// Lineage that owns version `id`.
    ///
    /// # Errors
    ///
    /// [`LineageError::NotFound`] if the id is unknown.
    pub fn owning_lineage(&self, id: &VersionId) -> Result<&Lineage, LineageError> {
        let content_id = self.get_version_lineage_id(id)?;
        self.lineage(content_id)
    }

    /// All lineages in creation order.
    pub fn lineages(&self) -> impl Iterator<Item = &Lineage> {
        self.lineages.values()
    }

    #[must_use]
    pub fn lineage_count(&self) -> usize {
        self.lineages.len()
    }

    #[must_use]
    pub fn version_count(&self) -> usize {
        self.version_index.len()
    }

    // -----------------------------------------------------------------------
    // Event construction (pure)
    // -----------------------------------------------------------------------

    /// Build the event for a brand-new lineage.
    #[must_use]
    pub fn initial_event(
        content_type: ContentType,
        draft: VersionDraft,
        now: DateTime<Utc>,
    ) -> StoreEvent {
        let (content_id, version) = initial_parts(content_type, draft, now);
        StoreEvent::LineageCreated {
            content_id,
            version,
        }
    }

    /// Build the event for a new version parented to `parent`.
    ///
    /// # Errors
    ///
    /// - [`LineageError::NotFound`] if `parent` is unknown.
    /// - [`LineageError::UnsupportedChange`] for [`ChangeType::Merge`].
    pub fn new_version_event(
        &self,
        parent: &VersionId,
        draft: VersionDraft,
        change_type: ChangeType,
        branch_name: &str,
        now: DateTime<Utc>,
    ) -> Result<StoreEvent, LineageError> {
        if change_type == ChangeType::Merge {
            return Err(LineageError::UnsupportedChange(change_type));
        }
        let lineage = self.owning_lineage(parent)?;
        let version = version_from_draft(
            draft,
            Some(parent.clone()),
            lineage.content_type,
            change_type,
            branch_name,
            now,
        );
        Ok(StoreEvent::VersionAppended { version })
    }

    // -----------------------------------------------------------------------
    // Primitive mutations
    // -----------------------------------------------------------------------

    /// Create a lineage whose root, current and only `main` version is new.
    ///
    /// # Errors
    ///
    /// Only on an id collision, which fresh UUIDv7 ids make unreachable.
    pub fn create_initial_version(
        &mut self,
        content_type: ContentType,
        draft: VersionDraft,
        now: DateTime<Utc>,
    ) -> Result<(ContentId, VersionId), LineageError> {
        let (content_id, version) = initial_parts(content_type, draft, now);
        let version_id = version.version_id.clone();
        self.apply(StoreEvent::LineageCreated {
            content_id: content_id.clone(),
            version,
        })?;
        Ok((content_id, version_id))
    }

    /// Append a version under `parent` on `branch_name`.
    ///
    /// # Errors
    ///
    /// See [`Self::new_version_event`].
    pub fn create_new_version(
        &mut self,
        parent: &VersionId,
        draft: VersionDraft,
        change_type: ChangeType,
        branch_name: &str,
        now: DateTime<Utc>,
    ) -> Result<VersionId, LineageError> {
        let event = self.new_version_event(parent, draft, change_type, branch_name, now)?;
        let id = event.version().version_id.clone();
        self.apply(event)?;
        Ok(id)
    }

    /// Validate an event against current state without applying it.
    ///
    /// # Errors
    ///
    /// [`LineageError::InvalidReference`] when the event would duplicate an
    /// id, reference a parent that does not exist yet, or cross lineages.
    pub fn check(&self, event: &StoreEvent) -> Result<(), LineageError> {
        let version = event.version();
        if self.version_index.contains_key(&version.version_id) {
            return Err(invalid(&version.version_id, "version id already exists"));
        }

        match event {
            StoreEvent::LineageCreated { content_id, .. } => {
                if self.lineages.contains_key(content_id) {
                    return Err(invalid(content_id, "content id already exists"));
                }
                if version.parent_version_id.is_some() {
                    return Err(invalid(
                        &version.version_id,
                        "a root version cannot have a parent",
                    ));
                }
                Ok(())
            }
            StoreEvent::VersionAppended { .. }
            | StoreEvent::BranchForked { .. }
            | StoreEvent::RolledBack { .. } => {
                let parent = version.parent_version_id.as_ref().ok_or_else(|| {
                    invalid(&version.version_id, "only a lineage root may omit its parent")
                })?;
                let content_id = self
                    .version_index
                    .get(parent)
                    .ok_or_else(|| invalid(parent, "parent does not exist yet"))?;
                let lineage = self.lineage(content_id)?;
                if lineage.content_type != version.content_type {
                    return Err(invalid(
                        &version.version_id,
                        format!(
                            "content type {} does not match lineage type {}",
                            version.content_type, lineage.content_type
                        ),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Apply an event: the only path that inserts state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::check`]; nothing is mutated on error.
    pub fn apply(&mut self, event: StoreEvent) -> Result<(), LineageError> {
        self.check(&event)?;

        match event {
            StoreEvent::LineageCreated {
                content_id,
                version,
            } => {
                let version_id = version.version_id.clone();
                let mut lineage = Lineage {
                    content_id: content_id.clone(),
                    content_type: version.content_type,
                    root_version_id: version_id.clone(),
                    current_version_id: version_id.clone(),
                    versions: IndexMap::new(),
                    branches: IndexMap::new(),
                    created_at: version.created_at,
                    updated_at: version.created_at,
                };
                lineage
                    .branches
                    .insert(version.branch.clone(), vec![version_id.clone()]);
                lineage.versions.insert(version_id.clone(), version);
                self.lineages.insert(content_id.clone(), lineage);
                self.version_index.insert(version_id.clone(), content_id.clone());
                debug!(content_id = %content_id, version_id = %version_id, "lineage created");
            }
            StoreEvent::VersionAppended { version } | StoreEvent::RolledBack { version } => {
                let content_id = self.insert_child(version, true)?;
                debug!(content_id = %content_id, "version appended");
            }
            StoreEvent::BranchForked { version } => {
                let content_id = self.insert_child(version, false)?;
                debug!(content_id = %content_id, "branch forked");
            }
        }
        Ok(())
    }

    /// Insert a checked non-root version. `advance` appends to the branch
    /// and moves the current pointer; otherwise the branch is reseeded.
    fn insert_child(&mut self, version: Version, advance: bool) -> Result<ContentId, LineageError> {
        let parent = version
            .parent_version_id
            .clone()
            .ok_or_else(|| invalid(&version.version_id, "missing parent"))?;
        let content_id = self.get_version_lineage_id(&parent)?.clone();
        let lineage = self
            .lineages
            .get_mut(&content_id)
            .ok_or_else(|| LineageError::content_not_found(&content_id))?;

        let version_id = version.version_id.clone();
        if advance {
            lineage
                .branches
                .entry(version.branch.clone())
                .or_default()
                .push(version_id.clone());
            lineage.current_version_id = version_id.clone();
            lineage.updated_at = version.created_at;
        } else {
            lineage
                .branches
                .insert(version.branch.clone(), vec![version_id.clone()]);
        }
        tracing::trace!(
            version_id = %version_id,
            branch = %version.branch,
            change_type = %version.change_type,
            "inserted version"
        );
        lineage.versions.insert(version_id.clone(), version);
        self.version_index.insert(version_id, content_id.clone());
        Ok(content_id)
    }
}

/// A fresh content id and root version for a new lineage.
pub(crate) fn initial_parts(
    content_type: ContentType,
    draft: VersionDraft,
    now: DateTime<Utc>,
) -> (ContentId, Version) {
    let version = version_from_draft(
        draft,
        None,
        content_type,
        ChangeType::Creation,
        MAIN_BRANCH,
        now,
    );
    (ContentId::generate(), version)
}

/// Assemble a version from a draft plus engine-decided placement.
pub(crate) fn version_from_draft(
    draft: VersionDraft,
    parent: Option<VersionId>,
    content_type: ContentType,
    change_type: ChangeType,
    branch: &str,
    now: DateTime<Utc>,
) -> Version {
    Version {
        version_id: VersionId::generate(),
        parent_version_id: parent,
        content_type,
        content_data: draft.content,
        prompt_context: draft.context,
        change_type,
        change_description: draft.description,
        created_at: now,
        created_by: draft.actor.unwrap_or_else(|| DEFAULT_ACTOR.to_string()),
        branch: branch.to_string(),
        tags: draft.tags,
        notes: draft.notes,
        metrics: draft.metrics,
    }
}

fn invalid(id: impl std::fmt::Display, reason: impl Into<String>) -> LineageError {
    LineageError::InvalidReference {
        id: id.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationContext, content_from};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn draft(persona: &str) -> VersionDraft {
        let ctx = GenerationContext::new("Describe", "ollama", "llama3", 0.7, "moderate", ts(0));
        VersionDraft::new(content_from([("persona", persona)]), ctx)
    }

    #[test]
    fn initial_version_is_root_current_and_main() {
        let mut store = VersionStore::new();
        let (cid, vid) = store
            .create_initial_version(ContentType::CharacterAnalysis, draft("A"), ts(1))
            .unwrap();

        let lineage = store.lineage(&cid).unwrap();
        assert_eq!(lineage.root_version_id, vid);
        assert_eq!(lineage.current_version_id, vid);
        assert_eq!(lineage.branches[MAIN_BRANCH], vec![vid.clone()]);
        assert_eq!(store.get_version_lineage_id(&vid).unwrap(), &cid);
        assert_eq!(store.get_version(&vid).unwrap().change_type, ChangeType::Creation);
        assert_eq!(store.get_version(&vid).unwrap().created_by, DEFAULT_ACTOR);
    }

    #[test]
    fn new_version_advances_current_and_creates_branch_list() {
        let mut store = VersionStore::new();
        let (cid, root) = store
            .create_initial_version(ContentType::CharacterAnalysis, draft("A"), ts(1))
            .unwrap();
        let v2 = store
            .create_new_version(&root, draft("B"), ChangeType::Modification, "alt", ts(2))
            .unwrap();

        let lineage = store.lineage(&cid).unwrap();
        assert_eq!(lineage.current_version_id, v2);
        assert_eq!(lineage.branches["alt"], vec![v2.clone()]);
        assert_eq!(lineage.branches[MAIN_BRANCH], vec![root.clone()]);
        assert_eq!(lineage.updated_at, ts(2));
        assert_eq!(store.get_version(&v2).unwrap().parent_version_id, Some(root));
    }

    #[test]
    fn unknown_parent_is_not_found_and_store_unchanged() {
        let mut store = VersionStore::new();
        let err = store
            .create_new_version(
                &VersionId::from("ghost"),
                draft("B"),
                ChangeType::Modification,
                MAIN_BRANCH,
                ts(1),
            )
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.version_count(), 0);
    }

    #[test]
    fn merge_change_type_is_rejected() {
        let mut store = VersionStore::new();
        let (_, root) = store
            .create_initial_version(ContentType::BeatSheet, draft("A"), ts(1))
            .unwrap();
        let err = store
            .create_new_version(&root, draft("B"), ChangeType::Merge, MAIN_BRANCH, ts(2))
            .unwrap_err();
        assert!(matches!(err, LineageError::UnsupportedChange(ChangeType::Merge)));
        assert_eq!(store.version_count(), 1);
    }

    #[test]
    fn apply_rejects_forward_reference() {
        let mut store = VersionStore::new();
        let mut version = version_from_draft(
            draft("A"),
            Some(VersionId::from("not-yet")),
            ContentType::BeatSheet,
            ChangeType::Modification,
            MAIN_BRANCH,
            ts(1),
        );
        version.version_id = VersionId::from("child");
        let err = store
            .apply(StoreEvent::VersionAppended { version })
            .unwrap_err();
        assert!(matches!(err, LineageError::InvalidReference { ref id, .. } if id == "not-yet"));
    }

    #[test]
    fn apply_rejects_duplicate_version_id() {
        let mut store = VersionStore::new();
        let event = VersionStore::initial_event(ContentType::BeatSheet, draft("A"), ts(1));
        store.apply(event.clone()).unwrap();
        let err = store.apply(event).unwrap_err();
        assert!(matches!(err, LineageError::InvalidReference { .. }));
        assert_eq!(store.lineage_count(), 1);
    }

    #[test]
    fn apply_rejects_cross_type_child() {
        let mut store = VersionStore::new();
        let (_, root) = store
            .create_initial_version(ContentType::BeatSheet, draft("A"), ts(1))
            .unwrap();
        let version = version_from_draft(
            draft("B"),
            Some(root),
            ContentType::StoryContent,
            ChangeType::Modification,
            MAIN_BRANCH,
            ts(2),
        );
        let err = store
            .apply(StoreEvent::VersionAppended { version })
            .unwrap_err();
        assert!(matches!(err, LineageError::InvalidReference { .. }));
    }

    #[test]
    fn event_kinds_are_stable() {
        let event = VersionStore::initial_event(ContentType::BeatSheet, draft("A"), ts(1));
        assert_eq!(event.kind(), "lineage.create");
    }
}
