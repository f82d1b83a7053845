//! Data model: identifiers, content payloads, generation context, versions
//! and lineages.

pub mod content;
pub mod context;
pub mod ids;
pub mod lineage;
pub mod version;

pub use content::{Content, ContentValue, content_from};
pub use context::GenerationContext;
pub use ids::{ContentId, VersionId};
pub use lineage::Lineage;
pub use version::{
    ChangeType, ContentType, DEFAULT_ACTOR, MAIN_BRANCH, UnknownTag, Version, VersionDraft,
};
