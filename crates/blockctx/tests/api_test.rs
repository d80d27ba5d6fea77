//! Integration tests for the public blockctx API.

use blockctx::{
    BlockCtxError, ContextBuilder,
    broker::Broker,
    config::{AppConfig, ResolutionConfig, SessionConfig},
    document::parse_document,
    mask::{self, MaskDocument, MaskEntry},
    node::NodeRef,
    resolve::set_raw_context,
    session::ScriptSession,
    store::{MemoryStore, PropertyStore},
};

const DOCUMENT: &str = r#"
[[diagram]]
id = 1
context = ["gain = 2", "offset = 0"]

[[block]]
id = 10
parent_diagram = 1
context = ["gain = 3"]

[block.mask]
title = "Amplifier"
entries = [{ name = "offset", value = "gain * 10", description = "Offset" }]

[[block]]
id = 11
parent_block = 10
parent_diagram = 1
context = ["out = gain + offset"]
"#;

#[test]
fn test_resolution_order() {
    let store = parse_document(DOCUMENT).unwrap();
    let resolved = ContextBuilder::default()
        .resolve(&store, NodeRef::block(11))
        .unwrap();

    assert_eq!(
        resolved.statements(),
        [
            "gain = 2",
            "offset = 0",
            "",
            "gain = 3",
            "",
            "offset = gain * 10",
            "out = gain + offset",
            "",
        ]
    );
}

#[test]
fn test_closest_binding_wins() {
    let store = parse_document(DOCUMENT).unwrap();
    let builder = ContextBuilder::default();
    let broker = builder.broker();

    let context = builder
        .evaluate(&broker, &store, NodeRef::block(11))
        .unwrap()
        .expect("broker should be free");

    assert_eq!(context["gain"].to_string(), "3");
    assert_eq!(context["offset"].to_string(), "30");
    assert_eq!(context["out"].to_string(), "33");
    assert!(!broker.is_held());
}

#[test]
fn test_evaluate_when_busy() {
    let store = parse_document(DOCUMENT).unwrap();
    let builder = ContextBuilder::default();
    let broker = builder.broker();

    let _held = broker.try_acquire().unwrap();
    let result = builder.evaluate(&broker, &store, NodeRef::diagram(1)).unwrap();
    assert!(result.is_none());
}

#[test]
fn test_failed_evaluation_keeps_last_values() {
    let mut store = parse_document(DOCUMENT).unwrap();
    let builder = ContextBuilder::default();
    let broker = builder.broker();

    let first = builder
        .evaluate(&broker, &store, NodeRef::diagram(1))
        .unwrap()
        .unwrap();

    set_raw_context(&mut store, NodeRef::diagram(1), ["gain = undefined_name"]).unwrap();
    let second = builder
        .evaluate(&broker, &store, NodeRef::diagram(1))
        .unwrap()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_check_reports_script_errors() {
    let builder = ContextBuilder::default();
    let context = builder.check(&["a = 1", "b = a + 1"]).unwrap();
    assert_eq!(context["b"].to_string(), "2");

    match builder.check(&["a = 1", "b = c"]) {
        Err(BlockCtxError::Script { err, src }) => {
            assert_eq!(src, "a = 1\nb = c");
            assert!(!err.diagnostics().is_empty());
        }
        other => panic!("expected script error, got {other:?}"),
    }
}

#[test]
fn test_mask_round_trip_through_store() {
    let mut store = parse_document(DOCUMENT).unwrap();
    let builder = ContextBuilder::default();
    let broker = builder.broker();

    let mut custom = builder
        .open_mask(&broker, &store, NodeRef::block(10))
        .unwrap()
        .unwrap();
    assert_eq!(custom.document().title(), "Amplifier");
    assert_eq!(custom.len(), 1);

    // "gain" is in scope and not yet exposed.
    custom.insert_row();
    assert_eq!(custom.entries()[1].name(), "gain");
    assert_eq!(custom.entries()[1].value(), "3");
    custom.save(&mut store).unwrap();

    let resolved = builder.resolve(&store, NodeRef::block(11)).unwrap();
    assert!(resolved.statements().contains(&"gain = 3".to_string()));

    let saved = mask::decode(&store.mask_exprs(NodeRef::block(10)).unwrap().unwrap()).unwrap();
    assert_eq!(saved.entries()[0], MaskEntry::new("offset", "gain * 10", "Offset"));
}

#[test]
fn test_cycles_are_reported() {
    let mut store = MemoryStore::new();
    store.add_diagram(1);
    store.add_block(2).parent_diagram(1).parent_block(3);
    store.add_block(3).parent_diagram(1).parent_block(2);

    let err = ContextBuilder::default()
        .resolve(&store, NodeRef::block(2))
        .unwrap_err();
    assert!(matches!(err, BlockCtxError::Cycle { .. }));
}

#[test]
fn test_depth_limit_from_config() {
    let mut store = MemoryStore::new();
    store.add_diagram(1);
    store.add_block(1u64).parent_diagram(1);
    for id in 2..=5u64 {
        store.add_block(id).parent_diagram(1).parent_block(id - 1);
    }

    let shallow = ContextBuilder::new(AppConfig::new(
        SessionConfig::default(),
        ResolutionConfig::new(3),
    ));
    assert!(matches!(
        shallow.resolve(&store, NodeRef::block(5)),
        Err(BlockCtxError::Cycle { .. })
    ));
    assert!(ContextBuilder::default().resolve(&store, NodeRef::block(5)).is_ok());
}

#[test]
fn test_custom_slots() {
    let mut store = MemoryStore::new();
    store.add_diagram(1).context(["x = [1, 2]"]);
    store
        .add_block(2)
        .parent_diagram(1)
        .mask(&MaskDocument::default().with_entries(vec![MaskEntry::new("y", "x * 2", "Y")]));

    let broker = Broker::new(
        ScriptSession::new(),
        SessionConfig::new("ctx", "ctx_names", "ctx_values"),
    );
    let context = ContextBuilder::default()
        .evaluate(&broker, &store, NodeRef::block(2))
        .unwrap()
        .unwrap();
    assert_eq!(context["y"].to_string(), "[2,4]");
}
