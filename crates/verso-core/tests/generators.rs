//! Shared proptest strategies.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use verso_core::model::{Content, ContentType, ContentValue, GenerationContext, VersionDraft};

pub fn arb_content_type() -> impl Strategy<Value = ContentType> {
    prop::sample::select(ContentType::ALL.to_vec())
}

pub fn arb_scalar() -> impl Strategy<Value = ContentValue> {
    prop_oneof![
        Just(ContentValue::Null),
        any::<bool>().prop_map(ContentValue::Bool),
        any::<i64>().prop_map(ContentValue::Integer),
        (-1.0e6_f64..1.0e6).prop_map(ContentValue::Float),
        "[a-zA-Z ]{0,12}(\n[a-zA-Z ]{0,12}){0,3}".prop_map(ContentValue::Text),
    ]
}

pub fn arb_value() -> impl Strategy<Value = ContentValue> {
    arb_scalar().prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(ContentValue::List),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(ContentValue::Map),
        ]
    })
}

pub fn arb_content() -> impl Strategy<Value = Content> {
    prop::collection::btree_map("[a-z_]{1,8}", arb_value(), 0..6)
}

pub fn arb_context() -> impl Strategy<Value = GenerationContext> {
    (
        "[a-zA-Z ]{0,40}",
        prop::sample::select(vec!["ollama", "claude", "gemini"]),
        0.0_f64..2.0,
        prop::sample::select(vec!["strict", "moderate", "relaxed"]),
    )
        .prop_map(|(prompt, provider, temperature, safety)| {
            let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
            GenerationContext::new(prompt, provider, "model", temperature, safety, ts)
        })
}

pub fn arb_draft() -> impl Strategy<Value = VersionDraft> {
    (
        arb_content(),
        arb_context(),
        "[a-zA-Z ]{0,30}",
        prop::collection::btree_set("[a-z]{1,6}", 0..3),
    )
        .prop_map(|(content, context, description, tags)| {
            let mut draft = VersionDraft::new(content, context).description(description);
            draft.tags = tags;
            draft
        })
}
