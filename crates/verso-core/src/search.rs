//! Case-insensitive substring search across every lineage.
//!
//! A version matches when the query occurs in its description, tags, notes
//! or serialized content payload. Each hit carries a snippet centred on the
//! first occurrence of the query in the description/notes text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::content::content_search_text;
use crate::model::{ContentId, ContentType, Version, VersionId};
use crate::store::VersionStore;

/// Characters kept on each side of the first match.
pub const DEFAULT_SNIPPET_RADIUS: usize = 30;

/// Leading characters used when the match is not in description/notes.
pub const DEFAULT_FALLBACK_LEN: usize = 100;

const ELLIPSIS: &str = "...";

/// Snippet sizing, usually taken from `[search]` config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetOptions {
    pub radius: usize,
    pub fallback_len: usize,
}

impl Default for SnippetOptions {
    fn default() -> Self {
        Self {
            radius: DEFAULT_SNIPPET_RADIUS,
            fallback_len: DEFAULT_FALLBACK_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub content_id: ContentId,
    pub version_id: VersionId,
    pub content_type: ContentType,
    pub change_description: String,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
    pub relevance_snippet: String,
}

/// Scan every lineage (optionally only one content type) for `query`.
///
/// Results are grouped by lineage in creation order, then by version in
/// creation order. An empty query matches everything.
#[must_use]
pub fn search_versions(
    store: &VersionStore,
    query: &str,
    content_type: Option<ContentType>,
    options: SnippetOptions,
) -> Vec<SearchHit> {
    let needle = query.to_lowercase();
    let mut hits = Vec::new();

    for lineage in store.lineages() {
        if content_type.is_some_and(|ct| ct != lineage.content_type) {
            continue;
        }
        for version in lineage.versions.values() {
            if !matches(version, &needle) {
                continue;
            }
            hits.push(SearchHit {
                content_id: lineage.content_id.clone(),
                version_id: version.version_id.clone(),
                content_type: version.content_type,
                change_description: version.change_description.clone(),
                created_at: version.created_at,
                tags: version.tags.clone(),
                relevance_snippet: relevance_snippet(version, query, options),
            });
        }
    }
    hits
}

fn matches(version: &Version, needle: &str) -> bool {
    version.search_text().to_lowercase().contains(needle)
        || content_search_text(&version.content_data)
            .to_lowercase()
            .contains(needle)
}

/// Snippet around the first match in `"{description} {notes}"`, or its
/// leading characters when the query does not occur there.
#[must_use]
pub fn relevance_snippet(version: &Version, query: &str, options: SnippetOptions) -> String {
    let text = format!("{} {}", version.change_description, version.notes);
    let chars: Vec<char> = text.chars().collect();
    let query_len = query.chars().count();

    if let Some(pos) = find_case_insensitive(&chars, query) {
        let start = pos.saturating_sub(options.radius);
        let end = pos
            .saturating_add(query_len)
            .saturating_add(options.radius)
            .min(chars.len());
        let mut snippet: String = chars[start..end].iter().collect();
        if start > 0 {
            snippet.insert_str(0, ELLIPSIS);
        }
        if end < chars.len() {
            snippet.push_str(ELLIPSIS);
        }
        return snippet;
    }

    let mut snippet: String = chars.iter().take(options.fallback_len).collect();
    if chars.len() > options.fallback_len {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

/// Char index of the first case-insensitive occurrence of `query`.
fn find_case_insensitive(haystack: &[char], query: &str) -> Option<usize> {
    let needle: Vec<char> = query.chars().collect();
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len()).find(|&start| {
        haystack[start..start + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(h, n)| h.to_lowercase().eq(n.to_lowercase()))
    })
}
