use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::Content;
use super::context::GenerationContext;
use super::ids::VersionId;

/// Actor recorded on versions when the caller does not name one.
pub const DEFAULT_ACTOR: &str = "user";

/// The branch every lineage starts on.
pub const MAIN_BRANCH: &str = "main";

/// The kinds of content a lineage can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    CharacterAnalysis,
    StoryContent,
    BeatSheet,
    PowerSystem,
    StyleAnalysis,
    TropeAnalysis,
}

impl ContentType {
    pub const ALL: [Self; 6] = [
        Self::CharacterAnalysis,
        Self::StoryContent,
        Self::BeatSheet,
        Self::PowerSystem,
        Self::StyleAnalysis,
        Self::TropeAnalysis,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CharacterAnalysis => "character_analysis",
            Self::StoryContent => "story_content",
            Self::BeatSheet => "beat_sheet",
            Self::PowerSystem => "power_system",
            Self::StyleAnalysis => "style_analysis",
            Self::TropeAnalysis => "trope_analysis",
        }
    }
}

/// How a version relates to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// First version of a lineage.
    Creation,
    /// Direct edit.
    Modification,
    /// Provider regeneration with the same or a similar prompt.
    Regeneration,
    /// Fork point of a new branch.
    Branch,
    /// Reserved; no operation constructs merge versions.
    Merge,
    /// Restoration of an earlier version's content.
    Rollback,
}

impl ChangeType {
    pub const ALL: [Self; 6] = [
        Self::Creation,
        Self::Modification,
        Self::Regeneration,
        Self::Branch,
        Self::Merge,
        Self::Rollback,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creation => "creation",
            Self::Modification => "modification",
            Self::Regeneration => "regeneration",
            Self::Branch => "branch",
            Self::Merge => "merge",
            Self::Rollback => "rollback",
        }
    }
}

/// Error returned when parsing an unknown tag string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTag {
    pub what: &'static str,
    pub raw: String,
    pub expected: Vec<&'static str>,
}

impl fmt::Display for UnknownTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}': expected one of {}",
            self.what,
            self.raw,
            self.expected.join(", ")
        )
    }
}

impl std::error::Error for UnknownTag {}

macro_rules! impl_tag_str {
    ($T:ident, $what:literal) => {
        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $T {
            type Err = UnknownTag;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim().to_ascii_lowercase().replace('-', "_");
                Self::ALL
                    .into_iter()
                    .find(|t| t.as_str() == needle)
                    .ok_or_else(|| UnknownTag {
                        what: $what,
                        raw: s.to_string(),
                        expected: Self::ALL.iter().map(|t| t.as_str()).collect(),
                    })
            }
        }
    };
}

impl_tag_str!(ContentType, "content type");
impl_tag_str!(ChangeType, "change type");

/// One immutable snapshot of content.
///
/// Versions are write-once: the store hands out shared references and
/// clones, never mutable access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub version_id: VersionId,
    /// Absent only for the root version of a lineage.
    pub parent_version_id: Option<VersionId>,
    pub content_type: ContentType,
    pub content_data: Content,
    pub prompt_context: GenerationContext,
    pub change_type: ChangeType,
    pub change_description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    /// The branch this version was created on, fixed at creation.
    pub branch: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: String,
    /// Numeric quality metrics, e.g. `overall_score`.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl Version {
    /// Text matched by search besides the content payload.
    pub(crate) fn search_text(&self) -> String {
        let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
        format!("{} {} {}", self.change_description, tags.join(" "), self.notes)
    }
}

/// Caller-supplied inputs for a new version.
///
/// Ids, parentage, timestamps and branch placement are decided by the
/// engine; everything else about the version comes from the draft.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDraft {
    pub content: Content,
    pub context: GenerationContext,
    pub description: String,
    pub actor: Option<String>,
    pub tags: BTreeSet<String>,
    pub notes: String,
    pub metrics: BTreeMap<String, f64>,
}

impl VersionDraft {
    #[must_use]
    pub fn new(content: Content, context: GenerationContext) -> Self {
        Self {
            content,
            context,
            description: String::new(),
            actor: None,
            tags: BTreeSet::new(),
            notes: String::new(),
            metrics: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    #[must_use]
    pub fn metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_round_trips_through_strings() {
        for ct in ContentType::ALL {
            assert_eq!(ct.as_str().parse::<ContentType>().unwrap(), ct);
        }
        assert_eq!(
            "Beat-Sheet".parse::<ContentType>().unwrap(),
            ContentType::BeatSheet
        );
    }

    #[test]
    fn unknown_change_type_lists_options() {
        let err = "squash".parse::<ChangeType>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("squash"));
        assert!(msg.contains("rollback"));
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&ContentType::CharacterAnalysis).unwrap(),
            "\"character_analysis\""
        );
        assert_eq!(serde_json::to_string(&ChangeType::Merge).unwrap(), "\"merge\"");
    }
}
