use proptest::prelude::*;
use verso_core::LineageEngine;
use verso_core::model::{ChangeType, MAIN_BRANCH};

#[path = "generators.rs"]
mod generators;
use generators::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn chained_versions_keep_current_and_root(
        content_type in arb_content_type(),
        first in arb_draft(),
        rest in prop::collection::vec(arb_draft(), 0..12),
    ) {
        let engine = LineageEngine::in_memory();
        let (cid, root) = engine.create_initial_version(content_type, first).unwrap();

        let mut last = root.clone();
        for draft in rest.iter().cloned() {
            last = engine
                .create_new_version(&last, draft, ChangeType::Modification, MAIN_BRANCH)
                .unwrap();
            prop_assert_eq!(&engine.get_lineage(&cid).unwrap().current_version_id, &last);
        }

        let lineage = engine.get_lineage(&cid).unwrap();
        prop_assert_eq!(lineage.versions.len(), rest.len() + 1);
        let chain = lineage.ancestry(&last);
        prop_assert_eq!(chain.len(), rest.len() + 1);
        prop_assert_eq!(chain.last(), Some(&root));
        prop_assert_eq!(&lineage.root_version_id, &root);
    }

    #[test]
    fn self_diff_is_always_empty(content_type in arb_content_type(), draft in arb_draft()) {
        let engine = LineageEngine::in_memory();
        let (_, id) = engine.create_initial_version(content_type, draft).unwrap();
        let diff = engine.get_version_diff(&id, &id).unwrap();
        prop_assert!(diff.content_changes.is_empty());
        prop_assert!(diff.prompt_changes.is_empty());
        prop_assert!(diff.metadata_changes.tags.is_empty());
    }

    #[test]
    fn rollback_reproduces_target_content(
        first in arb_draft(),
        second in arb_draft(),
    ) {
        let engine = LineageEngine::in_memory();
        let (_, root) = engine
            .create_initial_version(verso_core::model::ContentType::StoryContent, first)
            .unwrap();
        engine
            .create_new_version(&root, second, ChangeType::Regeneration, MAIN_BRANCH)
            .unwrap();
        let before = engine.get_version(&root).unwrap();
        let restored = engine.rollback_to_version(&root, "revert").unwrap();
        prop_assert_eq!(&engine.get_version(&restored).unwrap().content_data, &before.content_data);
        prop_assert_eq!(engine.get_version(&root).unwrap(), before);
    }

    #[test]
    fn diff_counts_every_changed_field(a in arb_content(), b in arb_content()) {
        let changes = verso_core::diff::diff_content(&a, &b);
        let expected = a
            .keys()
            .chain(b.keys())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .filter(|k| a.get(*k) != b.get(*k))
            .count();
        prop_assert_eq!(changes.len(), expected);
    }
}
