use protoscribe_descriptor::{DescriptorPool, TypeKind, Visibility};
use serde_json::json;

fn shop_pool() -> DescriptorPool {
    let set = json!({
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
                        {"name": "quantity", "number": 2, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_INT64", "jsonName": "quantity",
                         "options": {"[buf.validate.field]": {"int64": {"gte": "1", "lte": "100"}}}},
                        {"name": "status", "number": 3, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_ENUM", "typeName": ".shop.v1.Status", "jsonName": "status"},
                        {"name": "labels", "number": 4, "label": "LABEL_REPEATED",
                         "type": "TYPE_MESSAGE", "typeName": ".shop.v1.Order.LabelsEntry",
                         "jsonName": "labels"},
                        {"name": "nickname", "number": 5, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_STRING", "jsonName": "nickname", "proto3Optional": true,
                         "oneofIndex": 1},
                        {"name": "card_number", "number": 6, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_STRING", "jsonName": "cardNumber", "oneofIndex": 0},
                        {"name": "iban", "number": 7, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_STRING", "jsonName": "iban", "oneofIndex": 0},
                        {"name": "legacy_ref", "number": 8, "label": "LABEL_OPTIONAL",
                         "type": "TYPE_STRING", "jsonName": "legacyRef"}
                    ],
                    "nestedType": [{
                        "name": "LabelsEntry",
                        "field": [
                            {"name": "key", "number": 1, "label": "LABEL_OPTIONAL",
                             "type": "TYPE_STRING", "jsonName": "key"},
                            {"name": "value", "number": 2, "label": "LABEL_OPTIONAL",
                             "type": "TYPE_STRING", "jsonName": "value"}
                        ],
                        "options": {"mapEntry": true}
                    }],
                    "oneofDecl": [
                        {"name": "payment_method",
                         "options": {"[buf.validate.oneof]": {"required": true}}},
                        {"name": "_nickname"}
                    ]
                }
            ],
            "enumType": [{
                "name": "Status",
                "value": [
                    {"name": "STATUS_UNSPECIFIED", "number": 0},
                    {"name": "STATUS_OPEN", "number": 1},
                    {"name": "STATUS_SHIPPED", "number": 2}
                ]
            }],
            "sourceCodeInfo": {"location": [
                {"path": [4, 0], "leadingComments": " The order record.\n\n Full lifecycle of a shop order.\n"},
                {"path": [4, 0, 2, 7], "trailingComments": " jsonschema:hide\n"}
            ]}
        }]
    });
    DescriptorPool::from_json_str(&set.to_string()).expect("pool should resolve")
}

#[test]
fn qualifies_nested_names_and_tracks_top_level_roots() {
    let pool = shop_pool();
    assert_eq!(pool.top_level_messages(), ["shop.v1.Order"]);
    assert!(pool.message("shop.v1.Order").is_some());
    assert!(pool.message("shop.v1.Order.LabelsEntry").is_some());
    assert!(pool.enum_type("shop.v1.Status").is_some());
}

#[test]
fn map_entry_fields_become_typed_maps() {
    let pool = shop_pool();
    let order = pool.message("shop.v1.Order").expect("order");
    let labels = order.fields.iter().find(|f| f.name == "labels").expect("labels");
    assert!(!labels.is_list);
    let map = labels.map.as_ref().expect("map info");
    assert_eq!(map.key.kind, TypeKind::String);
    assert_eq!(map.value.kind, TypeKind::String);
    assert!(pool.message("shop.v1.Order.LabelsEntry").expect("entry").map_entry);
}

#[test]
fn presence_follows_proto3_rules() {
    let pool = shop_pool();
    let order = pool.message("shop.v1.Order").expect("order");
    let by_name = |name: &str| order.fields.iter().find(|f| f.name == name).expect(name);

    // Plain proto3 scalar: absence is the zero value.
    assert!(!by_name("quantity").explicit_presence);
    // `optional` scalar tracks presence through its synthetic oneof.
    assert!(by_name("nickname").explicit_presence);
    // Real oneof members track presence.
    assert!(by_name("card_number").explicit_presence);
}

#[test]
fn synthetic_oneofs_are_flagged() {
    let pool = shop_pool();
    let order = pool.message("shop.v1.Order").expect("order");
    assert_eq!(order.oneofs.len(), 2);
    assert!(!order.oneofs[0].synthetic);
    assert!(order.oneofs[0].required);
    assert!(order.oneofs[1].synthetic);
}

#[test]
fn comments_and_pragmas_are_attached() {
    let pool = shop_pool();
    let order = pool.message("shop.v1.Order").expect("order");
    assert_eq!(
        order.comment.as_deref(),
        Some("The order record.\n\n Full lifecycle of a shop order.")
    );
    let legacy = order.fields.iter().find(|f| f.name == "legacy_ref").expect("legacy");
    assert_eq!(legacy.visibility, Visibility::Hidden);
    let quantity = order.fields.iter().find(|f| f.name == "quantity").expect("quantity");
    assert_eq!(quantity.visibility, Visibility::Visible);
}

#[test]
fn field_rules_are_parsed_from_options() {
    let pool = shop_pool();
    let order = pool.message("shop.v1.Order").expect("order");
    let order_id = order.fields.iter().find(|f| f.name == "order_id").expect("order_id");
    let rule = order_id.rule.as_ref().expect("rule");
    assert!(rule.required);

    let quantity = order.fields.iter().find(|f| f.name == "quantity").expect("quantity");
    let rule = quantity.rule.as_ref().expect("rule");
    assert!(!rule.required);
}

#[test]
fn json_names_default_to_protoc_derivation() {
    let set = json!({
        "file": [{
            "name": "a.proto",
            "package": "a",
            "syntax": "proto3",
            "messageType": [{
                "name": "M",
                "field": [
                    {"name": "foo_bar_baz", "number": 1, "label": "LABEL_OPTIONAL",
                     "type": "TYPE_STRING"}
                ]
            }]
        }]
    });
    let pool = DescriptorPool::from_json_str(&set.to_string()).expect("pool");
    let message = pool.message("a.M").expect("message");
    assert_eq!(message.fields[0].json_name, "fooBarBaz");
}

#[test]
fn unknown_wire_types_are_rejected() {
    let set = json!({
        "file": [{
            "name": "a.proto",
            "package": "a",
            "messageType": [{
                "name": "M",
                "field": [
                    {"name": "x", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_BOGUS"}
                ]
            }]
        }]
    });
    let err = DescriptorPool::from_json_str(&set.to_string()).expect_err("should fail");
    assert!(err.to_string().contains("TYPE_BOGUS"), "err={err}");
}
