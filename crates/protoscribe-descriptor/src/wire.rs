//! Descriptor-set JSON (subset).
//!
//! Serde mirror of the parts of `google.protobuf.FileDescriptorSet` that the
//! schema engine consumes, as rendered by `buf build
//! --as-file-descriptor-set -o <file>.json`. Options are kept as raw JSON
//! maps so that bracketed extension keys (e.g. `"[buf.validate.field]"`)
//! survive verbatim for the `rules` module.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub type OptionsJson = BTreeMap<String, Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptorSetJson {
    #[serde(default)]
    pub file: Vec<FileDescriptorProtoJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileDescriptorProtoJson {
    pub name: Option<String>,
    pub package: Option<String>,
    #[serde(default, rename = "messageType")]
    pub message_type: Vec<DescriptorProtoJson>,
    #[serde(default, rename = "enumType")]
    pub enum_type: Vec<EnumDescriptorProtoJson>,
    #[serde(default, rename = "sourceCodeInfo")]
    pub source_code_info: Option<SourceCodeInfoJson>,
    pub syntax: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DescriptorProtoJson {
    pub name: Option<String>,
    #[serde(default)]
    pub field: Vec<FieldDescriptorProtoJson>,
    #[serde(default, rename = "nestedType")]
    pub nested_type: Vec<DescriptorProtoJson>,
    #[serde(default, rename = "enumType")]
    pub enum_type: Vec<EnumDescriptorProtoJson>,
    #[serde(default, rename = "oneofDecl")]
    pub oneof_decl: Vec<OneofDescriptorProtoJson>,
    #[serde(default)]
    pub options: Option<MessageOptionsJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageOptionsJson {
    #[serde(rename = "mapEntry")]
    pub map_entry: Option<bool>,
    /// Everything else, including `"[buf.validate.message]"`.
    #[serde(flatten)]
    pub rest: OptionsJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OneofDescriptorProtoJson {
    pub name: Option<String>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptorProtoJson {
    pub name: Option<String>,
    pub number: Option<i32>,
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub typ: Option<String>,
    #[serde(rename = "typeName")]
    pub type_name: Option<String>,
    #[serde(rename = "jsonName")]
    pub json_name: Option<String>,
    #[serde(rename = "proto3Optional")]
    pub proto3_optional: Option<bool>,
    #[serde(rename = "oneofIndex")]
    pub oneof_index: Option<i32>,
    #[serde(default)]
    pub options: Option<OptionsJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumDescriptorProtoJson {
    pub name: Option<String>,
    #[serde(default)]
    pub value: Vec<EnumValueDescriptorProtoJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumValueDescriptorProtoJson {
    pub name: Option<String>,
    pub number: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceCodeInfoJson {
    #[serde(default)]
    pub location: Vec<LocationJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationJson {
    #[serde(default)]
    pub path: Vec<i32>,
    #[serde(rename = "leadingComments")]
    pub leading_comments: Option<String>,
    #[serde(rename = "trailingComments")]
    pub trailing_comments: Option<String>,
}
