use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::ids::{ContentId, VersionId};
use super::version::{ContentType, Version};

/// The version history of one piece of content.
///
/// `versions` preserves creation order; `branches` preserves the order
/// branches were first created and, within each branch, append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineage {
    pub content_id: ContentId,
    pub content_type: ContentType,
    /// First version; never changes.
    pub root_version_id: VersionId,
    /// Most recently created version on the main line.
    pub current_version_id: VersionId,
    pub versions: IndexMap<VersionId, Version>,
    pub branches: IndexMap<String, Vec<VersionId>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lineage {
    /// Look up a version that belongs to this lineage.
    #[must_use]
    pub fn version(&self, id: &VersionId) -> Option<&Version> {
        self.versions.get(id)
    }

    #[must_use]
    pub fn current_version(&self) -> Option<&Version> {
        self.versions.get(&self.current_version_id)
    }

    /// Branch names in creation order.
    #[must_use]
    pub fn branch_names(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    /// Walk parent pointers from `id` back to the root, inclusive.
    ///
    /// Stops early if a parent is missing from this lineage or a cycle is
    /// detected, so a damaged history never loops.
    #[must_use]
    pub fn ancestry(&self, id: &VersionId) -> Vec<VersionId> {
        let mut chain = Vec::new();
        let mut cursor = self.versions.get(id);
        while let Some(version) = cursor {
            if chain.contains(&version.version_id) {
                break;
            }
            chain.push(version.version_id.clone());
            cursor = version
                .parent_version_id
                .as_ref()
                .and_then(|parent| self.versions.get(parent));
        }
        chain
    }
}
