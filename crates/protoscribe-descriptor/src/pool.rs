//! Resolved descriptor pool.
//!
//! Two passes over the descriptor-set JSON:
//!
//! 1. Walk every file, qualifying nested message/enum names into
//!    fully-qualified names and attaching comments via `sourceCodeInfo`
//!    location paths (`[4, i]` message, `[5, i]` enum, `... 3 j` nested
//!    message, `... 2 j` field, `... 4 j` nested enum).
//! 2. Rewrite repeated message fields whose target is a synthesized
//!    map-entry message into map fields with typed key/value descriptors.
//!
//! The resulting pool is immutable; schema generation only reads it.

use crate::error::DescriptorError;
use crate::rules::{self, FieldRule};
use crate::wire::{
    DescriptorProtoJson, EnumDescriptorProtoJson, FieldDescriptorProtoJson,
    FileDescriptorSetJson, SourceCodeInfoJson,
};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Protobuf field kinds, the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Bool,
    Enum,
    Int32,
    Sint32,
    Sfixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint32,
    Fixed32,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Message,
    Group,
}

impl TypeKind {
    pub fn from_wire(name: &str) -> Option<Self> {
        Some(match name {
            "TYPE_BOOL" => Self::Bool,
            "TYPE_ENUM" => Self::Enum,
            "TYPE_INT32" => Self::Int32,
            "TYPE_SINT32" => Self::Sint32,
            "TYPE_SFIXED32" => Self::Sfixed32,
            "TYPE_INT64" => Self::Int64,
            "TYPE_SINT64" => Self::Sint64,
            "TYPE_SFIXED64" => Self::Sfixed64,
            "TYPE_UINT32" => Self::Uint32,
            "TYPE_FIXED32" => Self::Fixed32,
            "TYPE_UINT64" => Self::Uint64,
            "TYPE_FIXED64" => Self::Fixed64,
            "TYPE_FLOAT" => Self::Float,
            "TYPE_DOUBLE" => Self::Double,
            "TYPE_STRING" => Self::String,
            "TYPE_BYTES" => Self::Bytes,
            "TYPE_MESSAGE" => Self::Message,
            "TYPE_GROUP" => Self::Group,
            _ => return None,
        })
    }

    /// Signed 32-bit family.
    pub fn is_int32_family(self) -> bool {
        matches!(self, Self::Int32 | Self::Sint32 | Self::Sfixed32)
    }

    /// Signed 64-bit family.
    pub fn is_int64_family(self) -> bool {
        matches!(self, Self::Int64 | Self::Sint64 | Self::Sfixed64)
    }

    /// Unsigned 32-bit family.
    pub fn is_uint32_family(self) -> bool {
        matches!(self, Self::Uint32 | Self::Fixed32)
    }

    /// Unsigned 64-bit family.
    pub fn is_uint64_family(self) -> bool {
        matches!(self, Self::Uint64 | Self::Fixed64)
    }

    pub fn is_float_family(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Whether a singular field of this kind tracks presence in proto3
    /// without an explicit `optional`.
    pub fn tracks_presence(self) -> bool {
        matches!(self, Self::Message | Self::Group)
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Enum => "enum",
            Self::Int32 => "int32",
            Self::Sint32 => "sint32",
            Self::Sfixed32 => "sfixed32",
            Self::Int64 => "int64",
            Self::Sint64 => "sint64",
            Self::Sfixed64 => "sfixed64",
            Self::Uint32 => "uint32",
            Self::Fixed32 => "fixed32",
            Self::Uint64 => "uint64",
            Self::Fixed64 => "fixed64",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Message => "message",
            Self::Group => "group",
        }
    }
}

/// Field visibility, derived from authoring comment pragmas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    /// Reachable only through an alias pattern, never as a primary property.
    Hidden,
    /// Excluded from the schema entirely.
    Ignored,
}

const IGNORE_PRAGMA: &str = "jsonschema:ignore";
const HIDE_PRAGMA: &str = "jsonschema:hide";

#[derive(Debug, Clone)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
}

#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub full_name: String,
    pub name: String,
    pub comment: Option<String>,
    pub values: Vec<EnumValueDescriptor>,
}

#[derive(Debug, Clone)]
pub struct OneofDescriptor {
    pub name: String,
    /// Oneof-level `required` rule.
    pub required: bool,
    /// True for the single-member oneofs synthesized by `optional` in proto3.
    pub synthetic: bool,
}

/// Key/value descriptors synthesized from a map-entry message.
#[derive(Debug, Clone)]
pub struct MapInfo {
    pub key: FieldDescriptor,
    pub value: FieldDescriptor,
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub json_name: String,
    pub number: i32,
    pub kind: TypeKind,
    /// Fully-qualified target type for message/enum/group kinds.
    pub type_name: Option<String>,
    pub is_list: bool,
    pub map: Option<Box<MapInfo>>,
    /// Whether absence is distinguishable from the zero value.
    pub explicit_presence: bool,
    pub oneof_index: Option<usize>,
    pub visibility: Visibility,
    pub comment: Option<String>,
    pub rule: Option<FieldRule>,
}

impl FieldDescriptor {
    pub fn is_map(&self) -> bool {
        self.map.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct MessageDescriptor {
    pub full_name: String,
    pub name: String,
    pub comment: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    pub oneofs: Vec<OneofDescriptor>,
    /// True for compiler-synthesized map-entry messages.
    pub map_entry: bool,
    /// Message-level `validate.disabled` rule.
    pub validation_disabled: bool,
}

/// Immutable, fully-resolved view of a descriptor set.
#[derive(Debug, Default)]
pub struct DescriptorPool {
    messages: BTreeMap<String, MessageDescriptor>,
    enums: BTreeMap<String, EnumDescriptor>,
    top_level: Vec<String>,
}

impl DescriptorPool {
    pub fn from_json_str(text: &str) -> Result<Self, DescriptorError> {
        let set: FileDescriptorSetJson = serde_json::from_str(text)?;
        Self::from_set(&set)
    }

    pub fn from_set(set: &FileDescriptorSetJson) -> Result<Self, DescriptorError> {
        let mut pool = Self::default();
        for file in &set.file {
            let package = file.package.clone().unwrap_or_default();
            let proto2 = file.syntax.as_deref() == Some("proto2");
            let comments = CommentIndex::new(file.source_code_info.as_ref());
            for (i, message) in file.message_type.iter().enumerate() {
                let path = vec![4, i as i32];
                let fqn =
                    pool.add_message(&package, message, &comments, &path, proto2, &[])?;
                pool.top_level.push(fqn);
            }
            for (i, enumeration) in file.enum_type.iter().enumerate() {
                let path = vec![5, i as i32];
                pool.add_enum(&package, enumeration, &comments, &path, &[]);
            }
        }
        pool.resolve_maps()?;
        debug!(
            messages = pool.messages.len(),
            enums = pool.enums.len(),
            "descriptor pool resolved"
        );
        Ok(pool)
    }

    pub fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }

    pub fn enum_type(&self, full_name: &str) -> Option<&EnumDescriptor> {
        self.enums.get(full_name)
    }

    /// Fully-qualified names of file-level (non-nested) messages, in
    /// declaration order.
    pub fn top_level_messages(&self) -> &[String] {
        &self.top_level
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.messages.values()
    }

    fn add_message(
        &mut self,
        package: &str,
        message: &DescriptorProtoJson,
        comments: &CommentIndex,
        path: &[i32],
        proto2: bool,
        prefix: &[String],
    ) -> Result<String, DescriptorError> {
        let name = message.name.clone().unwrap_or_default();
        let mut nested_prefix = prefix.to_vec();
        nested_prefix.push(name.clone());
        let full_name = qualify(package, &nested_prefix);

        let mut fields = Vec::with_capacity(message.field.len());
        for (i, field) in message.field.iter().enumerate() {
            let mut field_path = path.to_vec();
            field_path.extend([2, i as i32]);
            fields.push(build_field(&full_name, field, comments, &field_path, proto2)?);
        }

        let mut oneofs = Vec::with_capacity(message.oneof_decl.len());
        for (index, oneof) in message.oneof_decl.iter().enumerate() {
            // proto3 `optional` synthesizes a single-member oneof holding
            // the optional field; those are presence plumbing, not unions.
            let members: Vec<&FieldDescriptorProtoJson> = message
                .field
                .iter()
                .filter(|f| f.oneof_index == Some(index as i32))
                .collect();
            let synthetic = members.len() == 1 && members[0].proto3_optional.unwrap_or(false);
            let required = oneof
                .options
                .as_ref()
                .and_then(|o| o.get(rules::ONEOF_RULES_KEY))
                .map(rules::parse_oneof_required)
                .unwrap_or(false);
            oneofs.push(OneofDescriptor {
                name: oneof.name.clone().unwrap_or_default(),
                required,
                synthetic,
            });
        }

        let (map_entry, validation_disabled) = match &message.options {
            Some(options) => (
                options.map_entry.unwrap_or(false),
                options
                    .rest
                    .get(rules::MESSAGE_RULES_KEY)
                    .map(rules::parse_message_disabled)
                    .unwrap_or(false),
            ),
            None => (false, false),
        };

        for (i, nested) in message.nested_type.iter().enumerate() {
            let mut nested_path = path.to_vec();
            nested_path.extend([3, i as i32]);
            self.add_message(package, nested, comments, &nested_path, proto2, &nested_prefix)?;
        }
        for (i, enumeration) in message.enum_type.iter().enumerate() {
            let mut enum_path = path.to_vec();
            enum_path.extend([4, i as i32]);
            self.add_enum(package, enumeration, comments, &enum_path, &nested_prefix);
        }

        self.messages.insert(
            full_name.clone(),
            MessageDescriptor {
                full_name: full_name.clone(),
                name,
                comment: comments.leading(path),
                fields,
                oneofs,
                map_entry,
                validation_disabled,
            },
        );
        Ok(full_name)
    }

    fn add_enum(
        &mut self,
        package: &str,
        enumeration: &EnumDescriptorProtoJson,
        comments: &CommentIndex,
        path: &[i32],
        prefix: &[String],
    ) {
        let name = enumeration.name.clone().unwrap_or_default();
        let mut qualified = prefix.to_vec();
        qualified.push(name.clone());
        let full_name = qualify(package, &qualified);
        let values = enumeration
            .value
            .iter()
            .map(|v| EnumValueDescriptor {
                name: v.name.clone().unwrap_or_default(),
                number: v.number.unwrap_or(0),
            })
            .collect();
        self.enums.insert(
            full_name.clone(),
            EnumDescriptor {
                full_name,
                name,
                comment: comments.leading(path),
                values,
            },
        );
    }

    /// Rewrite repeated message fields that target a map-entry message into
    /// map fields carrying the entry's key/value descriptors.
    fn resolve_maps(&mut self) -> Result<(), DescriptorError> {
        type Entry = Option<(FieldDescriptor, FieldDescriptor)>;
        let mut entries: HashMap<String, Entry> = HashMap::new();
        for message in self.messages.values() {
            if !message.map_entry {
                continue;
            }
            let key = message.fields.iter().find(|f| f.number == 1);
            let value = message.fields.iter().find(|f| f.number == 2);
            let pair = match (key, value) {
                (Some(key), Some(value)) => Some((key.clone(), value.clone())),
                _ => None,
            };
            entries.insert(message.full_name.clone(), pair);
        }
        for message in self.messages.values_mut() {
            if message.map_entry {
                continue;
            }
            let message_name = message.full_name.clone();
            for field in &mut message.fields {
                if !field.is_list || field.kind != TypeKind::Message {
                    continue;
                }
                let Some(target) = field.type_name.as_deref() else {
                    continue;
                };
                match entries.get(target) {
                    Some(Some((key, value))) => {
                        field.is_list = false;
                        field.map = Some(Box::new(MapInfo {
                            key: key.clone(),
                            value: value.clone(),
                        }));
                    }
                    Some(None) => {
                        return Err(DescriptorError::MalformedMapEntry {
                            entry: target.to_string(),
                            field: format!("{message_name}.{}", field.name),
                        });
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }
}

fn build_field(
    message_name: &str,
    field: &FieldDescriptorProtoJson,
    comments: &CommentIndex,
    path: &[i32],
    proto2: bool,
) -> Result<FieldDescriptor, DescriptorError> {
    let name = field.name.clone().unwrap_or_default();
    let qualified = format!("{message_name}.{name}");

    let wire_type = field.typ.clone().unwrap_or_default();
    let kind = TypeKind::from_wire(&wire_type).ok_or_else(|| DescriptorError::UnknownFieldType {
        field: qualified.clone(),
        wire_type: wire_type.clone(),
    })?;

    let type_name = field
        .type_name
        .as_deref()
        .map(|t| t.trim_start_matches('.').to_string());
    if type_name.is_none() && matches!(kind, TypeKind::Message | TypeKind::Enum | TypeKind::Group) {
        return Err(DescriptorError::MissingTypeName {
            field: qualified,
            kind: kind.wire_name(),
        });
    }

    let is_list = field.label.as_deref() == Some("LABEL_REPEATED");
    let proto3_optional = field.proto3_optional.unwrap_or(false);
    let oneof_index = field.oneof_index.map(|i| i as usize);
    let explicit_presence = !is_list
        && (kind.tracks_presence() || proto3_optional || oneof_index.is_some() || proto2);

    let leading = comments.leading(path);
    let trailing = comments.trailing(path);
    let visibility = visibility_from_comments(leading.as_deref(), trailing.as_deref());

    let rule = field
        .options
        .as_ref()
        .and_then(|o| o.get(rules::FIELD_RULES_KEY))
        .map(|v| rules::parse_field_rule(&qualified, v))
        .transpose()?;

    let json_name = field
        .json_name
        .clone()
        .unwrap_or_else(|| default_json_name(&name));

    Ok(FieldDescriptor {
        name,
        json_name,
        number: field.number.unwrap_or(0),
        kind,
        type_name,
        is_list,
        map: None,
        explicit_presence,
        oneof_index,
        visibility,
        comment: leading,
        rule,
    })
}

fn visibility_from_comments(leading: Option<&str>, trailing: Option<&str>) -> Visibility {
    let has = |pragma: &str| {
        leading.is_some_and(|c| c.contains(pragma)) || trailing.is_some_and(|c| c.contains(pragma))
    };
    if has(IGNORE_PRAGMA) {
        Visibility::Ignored
    } else if has(HIDE_PRAGMA) {
        Visibility::Hidden
    } else {
        Visibility::Visible
    }
}

/// Default JSON name for a field, mirroring protoc: drop each underscore and
/// uppercase the letter that follows it.
pub fn default_json_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut next_upper = false;
    for chr in name.chars() {
        if chr == '_' {
            next_upper = true;
            continue;
        }
        if next_upper {
            next_upper = false;
            result.extend(chr.to_uppercase());
        } else {
            result.push(chr);
        }
    }
    result
}

fn qualify(package: &str, parts: &[String]) -> String {
    let joined = parts.join(".");
    if package.is_empty() {
        joined
    } else {
        format!("{package}.{joined}")
    }
}

struct CommentIndex {
    locations: HashMap<Vec<i32>, (Option<String>, Option<String>)>,
}

impl CommentIndex {
    fn new(info: Option<&SourceCodeInfoJson>) -> Self {
        let mut locations = HashMap::new();
        if let Some(info) = info {
            for location in &info.location {
                let leading = trimmed(location.leading_comments.as_deref());
                let trailing = trimmed(location.trailing_comments.as_deref());
                if leading.is_some() || trailing.is_some() {
                    locations.insert(location.path.clone(), (leading, trailing));
                }
            }
        }
        Self { locations }
    }

    fn leading(&self, path: &[i32]) -> Option<String> {
        self.locations.get(path).and_then(|(l, _)| l.clone())
    }

    fn trailing(&self, path: &[i32]) -> Option<String> {
        self.locations.get(path).and_then(|(_, t)| t.clone())
    }
}

fn trimmed(comment: Option<&str>) -> Option<String> {
    let comment = comment?.trim();
    if comment.is_empty() {
        None
    } else {
        Some(comment.to_string())
    }
}
