//! End-to-end tests driving the `protoscribe` binary.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_protoscribe"))
}

const DESCRIPTOR_JSON: &str = r#"{
  "file": [{
    "name": "shop/v1/order.proto",
    "package": "shop.v1",
    "syntax": "proto3",
    "messageType": [
      {
        "name": "Order",
        "field": [
          {"name": "order_id", "number": 1, "label": "LABEL_OPTIONAL",
           "type": "TYPE_STRING", "jsonName": "orderId",
           "options": {"[buf.validate.field]": {"required": true, "string": {"uuid": true}}}},
          {"name": "customer", "number": 2, "label": "LABEL_OPTIONAL",
           "type": "TYPE_MESSAGE", "typeName": ".shop.v1.Customer", "jsonName": "customer"}
        ]
      },
      {
        "name": "Customer",
        "field": [
          {"name": "name", "number": 1, "label": "LABEL_OPTIONAL",
           "type": "TYPE_STRING", "jsonName": "name"}
        ]
      }
    ]
  }]
}"#;

fn write_descriptor(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("descriptor.json");
    fs::write(&path, DESCRIPTOR_JSON).expect("write descriptor");
    path
}

#[test]
fn generate_writes_one_file_per_document_with_trailing_newline() {
    let dir = tempfile::tempdir().expect("tempdir");
    let descriptor = write_descriptor(&dir);
    let out = dir.path().join("schemas");

    let status = Command::new(bin())
        .args(["generate"])
        .arg(&descriptor)
        .arg("-o")
        .arg(&out)
        .status()
        .expect("run protoscribe");
    assert!(status.success());

    let order = out.join("shop.v1.Order.schema.json");
    let customer = out.join("shop.v1.Customer.schema.json");
    assert!(order.is_file(), "missing {}", order.display());
    assert!(customer.is_file(), "missing {}", customer.display());

    let text = fs::read_to_string(&order).expect("read order schema");
    assert!(text.ends_with('\n'));
    assert!(!text.ends_with("\n\n"));
    // Two-space indentation.
    assert!(text.contains("\n  \"$id\": \"shop.v1.Order.schema.json\""));

    let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(
        parsed["$schema"],
        "https://json-schema.org/draft/2020-12/schema"
    );
    assert_eq!(
        parsed["properties"]["customer"]["$ref"],
        "shop.v1.Customer.schema.json"
    );
}

#[test]
fn generate_is_deterministic_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let descriptor = write_descriptor(&dir);
    let first_out = dir.path().join("first");
    let second_out = dir.path().join("second");

    for out in [&first_out, &second_out] {
        let status = Command::new(bin())
            .args(["generate"])
            .arg(&descriptor)
            .arg("-o")
            .arg(out)
            .status()
            .expect("run protoscribe");
        assert!(status.success());
    }

    let file = "shop.v1.Order.schema.json";
    let first = fs::read(first_out.join(file)).expect("first");
    let second = fs::read(second_out.join(file)).expect("second");
    assert_eq!(first, second);
}

#[test]
fn all_variants_produces_the_eight_way_matrix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let descriptor = write_descriptor(&dir);
    let out = dir.path().join("schemas");

    let status = Command::new(bin())
        .args(["generate"])
        .arg(&descriptor)
        .arg("-o")
        .arg(&out)
        .arg("--all-variants")
        .arg("--type")
        .arg("shop.v1.Order")
        .status()
        .expect("run protoscribe");
    assert!(status.success());

    // Spot-check one identifier per suffix combination.
    for name in [
        "shop.v1.Order.schema.json",
        "shop.v1.Order.schema.strict.json",
        "shop.v1.Order.schema.bundle.json",
        "shop.v1.Order.schema.strict.bundle.json",
        "shop.v1.Order.jsonschema.json",
        "shop.v1.Order.jsonschema.strict.json",
        "shop.v1.Order.jsonschema.bundle.json",
        "shop.v1.Order.jsonschema.strict.bundle.json",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }
}

#[test]
fn bundle_flag_writes_self_contained_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let descriptor = write_descriptor(&dir);
    let out = dir.path().join("schemas");

    let status = Command::new(bin())
        .args(["generate"])
        .arg(&descriptor)
        .arg("-o")
        .arg(&out)
        .arg("--bundle")
        .arg("--type")
        .arg("shop.v1.Order")
        .status()
        .expect("run protoscribe");
    assert!(status.success());

    let text = fs::read_to_string(out.join("shop.v1.Order.schema.bundle.json")).expect("read");
    let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid JSON");
    assert_eq!(parsed["$ref"], "#/$defs/shop.v1.Order.schema.json");
    assert!(parsed["$defs"]["shop.v1.Customer.schema.json"].is_object());
    // Only the requested root is published.
    assert!(!out.join("shop.v1.Customer.schema.bundle.json").exists());
}

#[test]
fn types_lists_top_level_messages() {
    let dir = tempfile::tempdir().expect("tempdir");
    let descriptor = write_descriptor(&dir);

    let output = Command::new(bin())
        .args(["types"])
        .arg(&descriptor)
        .output()
        .expect("run protoscribe");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["shop.v1.Order", "shop.v1.Customer"]);
}

#[test]
fn unknown_root_type_fails_with_context() {
    let dir = tempfile::tempdir().expect("tempdir");
    let descriptor = write_descriptor(&dir);
    let out = dir.path().join("schemas");

    let output = Command::new(bin())
        .args(["generate"])
        .arg(&descriptor)
        .arg("-o")
        .arg(&out)
        .arg("--type")
        .arg("shop.v1.Nope")
        .output()
        .expect("run protoscribe");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shop.v1.Nope"), "stderr={stderr}");
}
