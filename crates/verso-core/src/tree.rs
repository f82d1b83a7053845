//! Lineage tree reconstruction and branch history.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::LineageError;
use crate::model::{ChangeType, ContentId, ContentType, Lineage, Version, VersionId};

/// One node of the lineage tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: VersionId,
    pub parent: Option<VersionId>,
    /// Children in creation order.
    pub children: Vec<VersionId>,
    pub change_type: ChangeType,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageTree {
    pub root: VersionId,
    /// Nodes keyed by version id, in creation order.
    pub versions: IndexMap<VersionId, TreeNode>,
}

impl LineageTree {
    /// Depth-first walk from the root: `(depth, node)` pairs, children in
    /// creation order. Used for indented rendering.
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
        let mut out = Vec::with_capacity(self.versions.len());
        let mut seen: HashSet<&VersionId> = HashSet::with_capacity(self.versions.len());
        let mut stack: Vec<(usize, &VersionId)> = vec![(0, &self.root)];
        while let Some((depth, id)) = stack.pop() {
            let Some(node) = self.versions.get(id) else {
                continue;
            };
            if !seen.insert(&node.id) {
                continue;
            }
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }
}

/// Condensed per-version row for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionSummary {
    pub version_id: VersionId,
    pub change_type: ChangeType,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub branch: String,
    pub ai_provider: String,
    pub prompt_length: usize,
    pub has_notes: bool,
    pub tag_count: usize,
}

impl From<&Version> for VersionSummary {
    fn from(v: &Version) -> Self {
        Self {
            version_id: v.version_id.clone(),
            change_type: v.change_type,
            description: v.change_description.clone(),
            created_at: v.created_at,
            branch: v.branch.clone(),
            ai_provider: v.prompt_context.ai_provider.clone(),
            prompt_length: v.prompt_context.prompt_len(),
            has_notes: !v.notes.is_empty(),
            tag_count: v.tags.len(),
        }
    }
}

/// Everything needed to render one lineage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageView {
    pub content_id: ContentId,
    pub content_type: ContentType,
    pub total_versions: usize,
    pub branches: Vec<String>,
    pub root_version: VersionId,
    pub current_version: VersionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lineage_tree: LineageTree,
    /// Newest first.
    pub version_summary: Vec<VersionSummary>,
}

/// Short listing row for [`crate::engine::LineageEngine::list_lineages`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageSummary {
    pub content_id: ContentId,
    pub content_type: ContentType,
    pub total_versions: usize,
    pub branches: Vec<String>,
    pub current_version: VersionId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Lineage> for LineageSummary {
    fn from(lineage: &Lineage) -> Self {
        Self {
            content_id: lineage.content_id.clone(),
            content_type: lineage.content_type,
            total_versions: lineage.versions.len(),
            branches: lineage.branch_names(),
            current_version: lineage.current_version_id.clone(),
            created_at: lineage.created_at,
            updated_at: lineage.updated_at,
        }
    }
}

/// Build the tree: one node per version, then a single pass linking each
/// version into its parent's children list when the parent is in the lineage.
#[must_use]
pub fn build_tree(lineage: &Lineage) -> LineageTree {
    let mut versions: IndexMap<VersionId, TreeNode> = lineage
        .versions
        .values()
        .map(|v| {
            (
                v.version_id.clone(),
                TreeNode {
                    id: v.version_id.clone(),
                    parent: v.parent_version_id.clone(),
                    children: Vec::new(),
                    change_type: v.change_type,
                    description: v.change_description.clone(),
                    created_at: v.created_at,
                    branch: v.branch.clone(),
                },
            )
        })
        .collect();

    let links: Vec<(VersionId, VersionId)> = versions
        .values()
        .filter_map(|node| node.parent.clone().map(|p| (p, node.id.clone())))
        .collect();
    for (parent, child) in links {
        if let Some(parent_node) = versions.get_mut(&parent) {
            parent_node.children.push(child);
        }
    }

    LineageTree {
        root: lineage.root_version_id.clone(),
        versions,
    }
}

/// Summaries of every version, newest first. Ties on timestamp keep the
/// later-created version first.
#[must_use]
pub fn version_summaries(lineage: &Lineage) -> Vec<VersionSummary> {
    let mut rows: Vec<VersionSummary> = lineage.versions.values().rev().map(Into::into).collect();
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

/// Full view of a lineage.
#[must_use]
pub fn lineage_view(lineage: &Lineage) -> LineageView {
    LineageView {
        content_id: lineage.content_id.clone(),
        content_type: lineage.content_type,
        total_versions: lineage.versions.len(),
        branches: lineage.branch_names(),
        root_version: lineage.root_version_id.clone(),
        current_version: lineage.current_version_id.clone(),
        created_at: lineage.created_at,
        updated_at: lineage.updated_at,
        lineage_tree: build_tree(lineage),
        version_summary: version_summaries(lineage),
    }
}

/// Versions listed on `branch_name`, oldest first.
///
/// Branch lists are appended in creation order already; the sort is stable
/// so equal timestamps keep list order.
///
/// # Errors
///
/// [`LineageError::NotFound`] if the branch does not exist in this lineage.
pub fn branch_history(lineage: &Lineage, branch_name: &str) -> Result<Vec<Version>, LineageError> {
    let ids = lineage
        .branches
        .get(branch_name)
        .ok_or_else(|| LineageError::branch_not_found(branch_name))?;
    let mut versions: Vec<Version> = ids
        .iter()
        .filter_map(|id| lineage.version(id).cloned())
        .collect();
    versions.sort_by_key(|v| v.created_at);
    Ok(versions)
}
