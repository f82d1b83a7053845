//! Structural diff between two versions.
//!
//! A [`DiffResult`] has three parts:
//!
//! - **content**: per-field additions, deletions and modifications, with a
//!   unified line diff attached when both sides of a modification are text;
//! - **context**: provider, temperature, safety tier and prompt changes;
//! - **metadata**: change-type transition and tag symmetric difference.
//!
//! Diffing is a pure function of the two versions.

pub mod text;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ChangeType, Content, ContentValue, GenerationContext, Version, VersionId};

pub use text::unified_diff;

/// Classification of one field-level content change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldChangeKind {
    /// Field present only in the newer version.
    Addition,
    /// Field present only in the older version.
    Deletion,
    /// Field present in both with different values.
    Modification,
}

/// One changed content field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    #[serde(rename = "type")]
    pub kind: FieldChangeKind,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<ContentValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<ContentValue>,
    /// Unified line diff, only for text-to-text modifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_diff: Option<Vec<String>>,
}

/// Before/after pair for a scalar setting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition<T> {
    pub from: T,
    pub to: T,
}

/// Differences between two generation contexts. Unchanged settings are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContextChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<Transition<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Transition<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_level: Option<Transition<String>>,
    /// Line diff of the prompt text when it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<Vec<String>>,
}

impl ContextChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ai_provider.is_none()
            && self.temperature.is_none()
            && self.safety_level.is_none()
            && self.prompt_text.is_none()
    }
}

/// Tags gained and lost between the two versions, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TagChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataChanges {
    pub change_type: Transition<ChangeType>,
    pub tags: TagChanges,
}

/// Identifying header for each side of a diff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionHeader {
    pub id: VersionId,
    pub created_at: DateTime<Utc>,
    pub change_description: String,
    pub prompt_context: GenerationContext,
}

impl From<&Version> for VersionHeader {
    fn from(v: &Version) -> Self {
        Self {
            id: v.version_id.clone(),
            created_at: v.created_at,
            change_description: v.change_description.clone(),
            prompt_context: v.prompt_context.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    pub version_1: VersionHeader,
    pub version_2: VersionHeader,
    pub content_changes: Vec<FieldChange>,
    pub prompt_changes: ContextChanges,
    pub metadata_changes: MetadataChanges,
}

impl DiffResult {
    /// True when content, context and tags are all unchanged.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.content_changes.is_empty()
            && self.prompt_changes.is_empty()
            && self.metadata_changes.tags.is_empty()
    }
}

/// Diff version `a` (older side) against version `b` (newer side).
#[must_use]
pub fn diff_versions(a: &Version, b: &Version) -> DiffResult {
    DiffResult {
        version_1: a.into(),
        version_2: b.into(),
        content_changes: diff_content(&a.content_data, &b.content_data),
        prompt_changes: diff_context(&a.prompt_context, &b.prompt_context),
        metadata_changes: MetadataChanges {
            change_type: Transition {
                from: a.change_type,
                to: b.change_type,
            },
            tags: TagChanges {
                added: b.tags.difference(&a.tags).cloned().collect(),
                removed: a.tags.difference(&b.tags).cloned().collect(),
            },
        },
    }
}

/// Field-level changes, in field-name order.
#[must_use]
pub fn diff_content(a: &Content, b: &Content) -> Vec<FieldChange> {
    let mut fields: Vec<&String> = a.keys().chain(b.keys()).collect();
    fields.sort();
    fields.dedup();

    fields
        .into_iter()
        .filter_map(|field| match (a.get(field), b.get(field)) {
            (None, Some(new)) => Some(FieldChange {
                kind: FieldChangeKind::Addition,
                field: field.clone(),
                old_value: None,
                new_value: Some(new.clone()),
                text_diff: None,
            }),
            (Some(old), None) => Some(FieldChange {
                kind: FieldChangeKind::Deletion,
                field: field.clone(),
                old_value: Some(old.clone()),
                new_value: None,
                text_diff: None,
            }),
            (Some(old), Some(new)) if old != new => Some(FieldChange {
                kind: FieldChangeKind::Modification,
                field: field.clone(),
                old_value: Some(old.clone()),
                new_value: Some(new.clone()),
                text_diff: match (old.as_text(), new.as_text()) {
                    (Some(o), Some(n)) => Some(unified_diff(o, n)),
                    _ => None,
                },
            }),
            _ => None,
        })
        .collect()
}

/// Setting-level changes between two generation contexts.
#[must_use]
pub fn diff_context(a: &GenerationContext, b: &GenerationContext) -> ContextChanges {
    ContextChanges {
        ai_provider: changed(&a.ai_provider, &b.ai_provider),
        temperature: (a.temperature.to_bits() != b.temperature.to_bits()
            && a.temperature != b.temperature)
            .then_some(Transition {
                from: a.temperature,
                to: b.temperature,
            }),
        safety_level: changed(&a.safety_level, &b.safety_level),
        prompt_text: (a.prompt_text != b.prompt_text)
            .then(|| unified_diff(&a.prompt_text, &b.prompt_text)),
    }
}

fn changed(a: &str, b: &str) -> Option<Transition<String>> {
    (a != b).then(|| Transition {
        from: a.to_string(),
        to: b.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, MAIN_BRANCH, content_from};
    use chrono::TimeZone;
    use std::collections::{BTreeMap, BTreeSet};

    fn version(id: &str, content: Content, provider: &str, prompt: &str) -> Version {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Version {
            version_id: VersionId::from(id),
            parent_version_id: None,
            content_type: ContentType::CharacterAnalysis,
            content_data: content,
            prompt_context: GenerationContext::new(prompt, provider, "m", 0.7, "moderate", ts),
            change_type: ChangeType::Creation,
            change_description: String::new(),
            created_at: ts,
            created_by: "user".into(),
            branch: MAIN_BRANCH.into(),
            tags: BTreeSet::new(),
            notes: String::new(),
            metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn self_diff_is_empty() {
        let v = version("a", content_from([("persona", "A")]), "ollama", "p");
        let diff = diff_versions(&v, &v);
        assert!(diff.is_identical());
        assert!(diff.content_changes.is_empty());
    }

    #[test]
    fn classifies_addition_deletion_modification() {
        let a = content_from([("persona", "A"), ("age", "30")]);
        let b = content_from([("persona", "B"), ("goal", "win")]);
        let changes = diff_content(&a, &b);

        let kinds: Vec<(&str, FieldChangeKind)> =
            changes.iter().map(|c| (c.field.as_str(), c.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("age", FieldChangeKind::Deletion),
                ("goal", FieldChangeKind::Addition),
                ("persona", FieldChangeKind::Modification),
            ]
        );
        let persona = &changes[2];
        assert_eq!(persona.old_value, Some(ContentValue::from("A")));
        assert_eq!(persona.new_value, Some(ContentValue::from("B")));
        assert!(persona.text_diff.as_ref().is_some_and(|d| d.contains(&"+B".to_string())));
    }

    #[test]
    fn non_text_modification_has_no_line_diff() {
        let a = content_from([("level", 3_i64)]);
        let b = content_from([("level", 4_i64)]);
        let changes = diff_content(&a, &b);
        assert_eq!(changes.len(), 1);
        assert!(changes[0].text_diff.is_none());
    }

    #[test]
    fn context_changes_report_provider_and_prompt() {
        let a = version("a", Content::new(), "ollama", "write a hero");
        let b = version("b", Content::new(), "claude", "write a villain");
        let changes = diff_context(&a.prompt_context, &b.prompt_context);
        assert_eq!(
            changes.ai_provider,
            Some(Transition {
                from: "ollama".into(),
                to: "claude".into()
            })
        );
        assert!(changes.temperature.is_none());
        assert!(changes.safety_level.is_none());
        assert!(changes.prompt_text.is_some());
    }

    #[test]
    fn tag_symmetric_difference() {
        let mut a = version("a", Content::new(), "ollama", "p");
        let mut b = version("b", Content::new(), "ollama", "p");
        a.tags = ["draft", "hero"].into_iter().map(String::from).collect();
        b.tags = ["hero", "final"].into_iter().map(String::from).collect();
        let diff = diff_versions(&a, &b);
        assert_eq!(diff.metadata_changes.tags.added, vec!["final".to_string()]);
        assert_eq!(diff.metadata_changes.tags.removed, vec!["draft".to_string()]);
    }

    #[test]
    fn serialized_change_uses_type_key() {
        let changes = diff_content(&content_from([("a", "x")]), &Content::new());
        let json = serde_json::to_value(&changes[0]).unwrap();
        assert_eq!(json["type"], "deletion");
        assert!(json.get("new_value").is_none());
    }
}
