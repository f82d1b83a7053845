//! Branch forks and rollbacks.
//!
//! Neither operation edits history. A fork copies a base version into a new
//! version that seeds its own branch; a rollback copies a target version
//! into a new version appended to `main`, parented to whatever was current,
//! so the revert itself is recorded:
//!
//! | Operation | Parent | Branch list | Current pointer |
//! |---|---|---|---|
//! | fork | base version | new list with only the copy | unchanged |
//! | rollback | lineage's current version | appended to `main` | the copy |

use chrono::{DateTime, Utc};

use crate::error::LineageError;
use crate::model::{ChangeType, MAIN_BRANCH, Version, VersionId};
use crate::store::{StoreEvent, VersionStore};

/// Build the event that forks `branch_name` off `base`.
///
/// The copy keeps the base's content and generation context. Reusing an
/// existing branch name replaces that branch's list; the versions it held
/// stay in the lineage.
///
/// # Errors
///
/// [`LineageError::NotFound`] if `base` is unknown.
pub fn fork_event(
    store: &VersionStore,
    base: &VersionId,
    branch_name: &str,
    description: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<StoreEvent, LineageError> {
    let base_version = store.get_version(base)?;
    let version = copy_of(
        base_version,
        base.clone(),
        ChangeType::Branch,
        format!("Created branch '{branch_name}': {description}"),
        branch_name,
        actor,
        now,
    );
    Ok(StoreEvent::BranchForked { version })
}

/// Build the event that restores `target`'s content as a new `main` version.
///
/// # Errors
///
/// [`LineageError::NotFound`] if `target` is unknown.
pub fn rollback_event(
    store: &VersionStore,
    target: &VersionId,
    description: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<StoreEvent, LineageError> {
    let lineage = store.owning_lineage(target)?;
    let target_version = lineage
        .version(target)
        .ok_or_else(|| LineageError::version_not_found(target))?;
    let version = copy_of(
        target_version,
        lineage.current_version_id.clone(),
        ChangeType::Rollback,
        format!("Rolled back to version {target}: {description}"),
        MAIN_BRANCH,
        actor,
        now,
    );
    Ok(StoreEvent::RolledBack { version })
}

fn copy_of(
    source: &Version,
    parent: VersionId,
    change_type: ChangeType,
    description: String,
    branch: &str,
    actor: &str,
    now: DateTime<Utc>,
) -> Version {
    Version {
        version_id: VersionId::generate(),
        parent_version_id: Some(parent),
        content_type: source.content_type,
        content_data: source.content_data.clone(),
        prompt_context: source.prompt_context.clone(),
        change_type,
        change_description: description,
        created_at: now,
        created_by: actor.to_string(),
        branch: branch.to_string(),
        tags: std::collections::BTreeSet::new(),
        notes: String::new(),
        metrics: std::collections::BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, GenerationContext, VersionDraft, content_from};
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn draft(persona: &str) -> VersionDraft {
        let ctx = GenerationContext::new("Describe", "ollama", "llama3", 0.7, "moderate", ts(0));
        VersionDraft::new(content_from([("persona", persona)]), ctx)
    }

    fn seeded() -> (VersionStore, VersionId, VersionId) {
        let mut store = VersionStore::new();
        let (_, root) = store
            .create_initial_version(ContentType::CharacterAnalysis, draft("A"), ts(1))
            .unwrap();
        let v2 = store
            .create_new_version(&root, draft("B"), ChangeType::Modification, MAIN_BRANCH, ts(2))
            .unwrap();
        (store, root, v2)
    }

    #[test]
    fn fork_copies_base_and_leaves_main_alone() {
        let (mut store, root, v2) = seeded();
        let event = fork_event(&store, &root, "dark", "grittier take", "editor", ts(3)).unwrap();
        let forked = event.version().version_id.clone();
        store.apply(event).unwrap();

        let lineage = store.owning_lineage(&forked).unwrap();
        let copy = lineage.version(&forked).unwrap();
        assert_eq!(copy.parent_version_id.as_ref(), Some(&root));
        assert_eq!(copy.content_data, lineage.version(&root).unwrap().content_data);
        assert_eq!(copy.change_type, ChangeType::Branch);
        assert_eq!(copy.change_description, "Created branch 'dark': grittier take");
        assert_eq!(copy.created_by, "editor");
        assert_eq!(lineage.branches["dark"], vec![forked.clone()]);
        assert_eq!(lineage.branches[MAIN_BRANCH], vec![root, v2.clone()]);
        assert_eq!(lineage.current_version_id, v2);
    }

    #[test]
    fn rollback_parents_to_current_and_appends_to_main() {
        let (mut store, root, v2) = seeded();
        let event = rollback_event(&store, &root, "B was worse", "user", ts(3)).unwrap();
        let rolled = event.version().version_id.clone();
        store.apply(event).unwrap();

        let lineage = store.owning_lineage(&rolled).unwrap();
        let copy = lineage.version(&rolled).unwrap();
        assert_eq!(copy.parent_version_id.as_ref(), Some(&v2));
        assert_eq!(copy.content_data, lineage.version(&root).unwrap().content_data);
        assert_eq!(copy.change_type, ChangeType::Rollback);
        assert_eq!(lineage.current_version_id, rolled);
        assert_eq!(lineage.branches[MAIN_BRANCH].last(), Some(&rolled));
        assert_eq!(lineage.versions.len(), 3);
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let (store, _, _) = seeded();
        let ghost = VersionId::from("ghost");
        assert!(fork_event(&store, &ghost, "b", "", "user", ts(3))
            .unwrap_err()
            .is_not_found());
        assert!(rollback_event(&store, &ghost, "", "user", ts(3))
            .unwrap_err()
            .is_not_found());
    }
}
