//! Reference graph, memoization, bundling, and the cross-document laws.

use protoscribe_descriptor::DescriptorPool;
use protoscribe_jsonschema::{generate, GenerationOptions, Generator};
use serde_json::{json, Value};

/// A graph with a cycle (Node -> Node), a diamond (Tree -> Node twice),
/// and a type reachable only transitively (Leaf).
fn graph_pool() -> DescriptorPool {
    let set = json!({
        "file": [{
            "name": "g.proto",
            "package": "g",
            "syntax": "proto3",
            "messageType": [
                {
                    "name": "Tree",
                    "field": [
                        {"name": "root", "number": 1, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_MESSAGE", "typeName": ".g.Node"},
                        {"name": "fallback", "number": 2, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_MESSAGE", "typeName": ".g.Node"}
                    ]
                },
                {
                    "name": "Node",
                    "field": [
                        {"name": "children", "number": 1, "label": "LABEL_REPEATED",
                         "type": "TYPE_MESSAGE", "typeName": ".g.Node"},
                        {"name": "leaf", "number": 2, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_MESSAGE", "typeName": ".g.Leaf"}
                    ]
                },
                {
                    "name": "Leaf",
                    "field": [
                        {"name": "value", "number": 1, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_STRING"}
                    ]
                }
            ]
        }]
    });
    DescriptorPool::from_json_str(&set.to_string()).expect("pool")
}

fn collect_refs(value: &Value, refs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if key == "$ref" {
                    if let Some(target) = nested.as_str() {
                        refs.push(target.to_string());
                    }
                } else {
                    collect_refs(nested, refs);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_refs(item, refs);
            }
        }
        _ => {}
    }
}

#[test]
fn cyclic_graphs_terminate_and_memoize() {
    let pool = graph_pool();
    let documents = generate(&pool, GenerationOptions::default(), &["g.Tree"]).expect("generate");
    // Split mode publishes every reachable type exactly once.
    assert_eq!(documents.len(), 3);
    assert!(documents.contains_key("g.Tree"));
    assert!(documents.contains_key("g.Node"));
    assert!(documents.contains_key("g.Leaf"));
}

#[test]
fn split_mode_has_no_dangling_refs() {
    let pool = graph_pool();
    let documents = generate(&pool, GenerationOptions::default(), &["g.Tree"]).expect("generate");
    let ids: Vec<String> = documents
        .values()
        .filter_map(|d| d["$id"].as_str().map(str::to_string))
        .collect();
    let mut refs = Vec::new();
    for document in documents.values() {
        collect_refs(document, &mut refs);
    }
    assert!(!refs.is_empty());
    for reference in refs {
        assert!(
            ids.contains(&reference),
            "dangling $ref {reference} not among {ids:?}"
        );
    }
}

#[test]
fn bundle_closure_is_complete() {
    let pool = graph_pool();
    let options = GenerationOptions {
        bundle: true,
        ..GenerationOptions::default()
    };
    let documents = generate(&pool, options, &["g.Tree"]).expect("generate");
    // Bundle mode publishes only the requested roots.
    assert_eq!(documents.len(), 1);
    let document = &documents["g.Tree"];
    assert_eq!(document["$id"], "g.Tree.schema.bundle.json");
    assert_eq!(document["$ref"], "#/$defs/g.Tree.schema.json");

    let defs = document["$defs"].as_object().expect("$defs");
    assert!(defs.contains_key("g.Tree.schema.json"));
    assert!(defs.contains_key("g.Node.schema.json"));
    assert!(defs.contains_key("g.Leaf.schema.json"));

    // Every $ref inside the bundle points into its own $defs.
    let mut refs = Vec::new();
    collect_refs(document, &mut refs);
    for reference in refs {
        let local = reference
            .strip_prefix("#/$defs/")
            .unwrap_or_else(|| panic!("non-local ref {reference}"));
        assert!(defs.contains_key(local), "missing def for {reference}");
    }
}

#[test]
fn added_is_tracked_independently_of_existence() {
    let pool = graph_pool();
    let options = GenerationOptions::default();
    let mut generator = Generator::new(&pool, options);
    generator.add("g.Tree").expect("add tree");
    // Node was pulled in transitively; requesting it afterwards flips the
    // flag without regenerating.
    let node = generator.entry("g.Node").expect("node entry");
    assert!(!node.added);
    generator.add("g.Node").expect("add node");
    let node = generator.entry("g.Node").expect("node entry");
    assert!(node.added);
    let tree = generator.entry("g.Tree").expect("tree entry");
    assert!(tree.added);
}

#[test]
fn bundle_publishes_each_requested_root() {
    let pool = graph_pool();
    let options = GenerationOptions {
        bundle: true,
        ..GenerationOptions::default()
    };
    let mut generator = Generator::new(&pool, options);
    generator.add("g.Tree").expect("add");
    generator.add("g.Leaf").expect("add");
    let documents = generator.finish().expect("finish");
    assert_eq!(documents.len(), 2);
    let leaf = &documents["g.Leaf"];
    assert_eq!(leaf["$id"], "g.Leaf.schema.bundle.json");
    let defs = leaf["$defs"].as_object().expect("$defs");
    assert_eq!(defs.len(), 1);
    assert!(defs.contains_key("g.Leaf.schema.json"));
}

#[test]
fn generation_is_deterministic() {
    let pool = graph_pool();
    for options in GenerationOptions::all_variants() {
        let first = generate(&pool, options, &["g.Tree"]).expect("generate");
        let second = generate(&pool, options, &["g.Tree"]).expect("generate");
        let first_rendered: Vec<String> = first
            .iter()
            .map(|(name, doc)| format!("{name}: {}", serde_json::to_string_pretty(doc).expect("render")))
            .collect();
        let second_rendered: Vec<String> = second
            .iter()
            .map(|(name, doc)| format!("{name}: {}", serde_json::to_string_pretty(doc).expect("render")))
            .collect();
        assert_eq!(first_rendered, second_rendered, "options {options:?}");
    }
}

#[test]
fn unresolved_references_are_fatal_with_context() {
    let set = json!({
        "file": [{
            "name": "t.proto",
            "package": "t",
            "syntax": "proto3",
            "messageType": [{
                "name": "M",
                "field": [{"name": "f", "number": 1, "label": "LABEL_OPTIONAL",
                           "type": "TYPE_MESSAGE", "typeName": ".t.Missing"}]
            }]
        }]
    });
    let pool = DescriptorPool::from_json_str(&set.to_string()).expect("pool");
    let err = generate(&pool, GenerationOptions::default(), &["t.M"]).expect_err("should fail");
    let message = err.to_string();
    assert!(message.contains("t.Missing"), "err={message}");
    assert!(message.contains("t.M.f"), "err={message}");
}

#[test]
fn wrapper_and_wkt_fragments_bypass_the_message_builder() {
    let set = json!({
        "file": [
            {
                "name": "google/protobuf/wrappers.proto",
                "package": "google.protobuf",
                "syntax": "proto3",
                "messageType": [
                    {"name": "Int64Value",
                     "field": [{"name": "value", "number": 1, "label": "LABEL_OPTIONAL",
                                "type": "TYPE_INT64"}]},
                    {"name": "Timestamp",
                     "field": [
                        {"name": "seconds", "number": 1, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_INT64"},
                        {"name": "nanos", "number": 2, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_INT32"}
                     ]}
                ]
            },
            {
                "name": "t.proto",
                "package": "t",
                "syntax": "proto3",
                "messageType": [{
                    "name": "M",
                    "field": [
                        {"name": "count", "number": 1, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_MESSAGE", "typeName": ".google.protobuf.Int64Value"},
                        {"name": "at", "number": 2, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_MESSAGE", "typeName": ".google.protobuf.Timestamp"}
                    ]
                }]
            }
        ]
    });
    let pool = DescriptorPool::from_json_str(&set.to_string()).expect("pool");
    let documents = generate(&pool, GenerationOptions::default(), &["t.M"]).expect("generate");

    let wrapper = &documents["google.protobuf.Int64Value"];
    // The wrapper carries the wrapped scalar's schema, not an object shape.
    assert!(wrapper.get("properties").is_none());
    assert!(wrapper["anyOf"].is_array());

    let timestamp = &documents["google.protobuf.Timestamp"];
    assert_eq!(timestamp["type"], "string");
    assert_eq!(timestamp["format"], "date-time");
}
