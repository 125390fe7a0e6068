//! Table metadata as stored in an Iceberg `*.metadata.json` file.
//!
//! Only the parts the validators read are modelled. Parsing is lenient on
//! purpose: values such as non-positive field ids must survive
//! deserialization so the schema checks can report them.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of a schema field: a primitive name or a nested struct/list/map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldType(pub Value);

impl FieldType {
    /// Create a primitive type such as `long` or `decimal(10,2)`.
    pub fn primitive(name: impl Into<String>) -> Self {
        Self(Value::String(name.into()))
    }

    /// The primitive type name, or `None` for nested types.
    pub fn as_primitive(&self) -> Option<&str> {
        self.0.as_str()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type(&self.0, f)
    }
}

fn write_type(value: &Value, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{}", s),
        Value::Object(obj) => match obj.get("type").and_then(Value::as_str) {
            Some("struct") => {
                write!(f, "struct<")?;
                let fields = obj.get("fields").and_then(Value::as_array);
                for (i, field) in fields.into_iter().flatten().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let name = field.get("name").and_then(Value::as_str).unwrap_or("?");
                    write!(f, "{}: ", name)?;
                    write_type(field.get("type").unwrap_or(&Value::Null), f)?;
                }
                write!(f, ">")
            }
            Some("list") => {
                write!(f, "list<")?;
                write_type(obj.get("element").unwrap_or(&Value::Null), f)?;
                write!(f, ">")
            }
            Some("map") => {
                write!(f, "map<")?;
                write_type(obj.get("key").unwrap_or(&Value::Null), f)?;
                write!(f, ", ")?;
                write_type(obj.get("value").unwrap_or(&Value::Null), f)?;
                write!(f, ">")
            }
            _ => write!(f, "{}", value),
        },
        other => write!(f, "{}", other),
    }
}

/// A top-level schema field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    /// Field identifier, stable across schema evolution.
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    /// Create a field with a primitive type.
    pub fn new(id: i32, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            required: false,
            field_type: FieldType::primitive(field_type),
        }
    }
}

/// A table schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "schema-id", default)]
    pub schema_id: i32,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(schema_id: i32, fields: Vec<Field>) -> Self {
        Self { schema_id, fields }
    }

    /// Find a field by column name.
    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// One snapshot in the table history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Snapshot {
    pub snapshot_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_snapshot_id: Option<i64>,
    #[serde(default)]
    pub sequence_number: i64,
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_list: Option<String>,
    #[serde(default)]
    pub summary: IndexMap<String, String>,
}

impl Snapshot {
    pub fn new(snapshot_id: i64, timestamp_ms: i64) -> Self {
        Self {
            snapshot_id,
            parent_snapshot_id: None,
            sequence_number: 0,
            timestamp_ms,
            manifest_list: None,
            summary: IndexMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: i64) -> Self {
        self.parent_snapshot_id = Some(parent);
        self
    }

    pub fn with_sequence_number(mut self, sequence_number: i64) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    pub fn with_summary(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.summary.insert(key.into(), value.into());
        self
    }
}

/// Parsed contents of a table metadata file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableMetadata {
    pub format_version: i32,
    #[serde(default)]
    pub table_uuid: String,
    pub location: String,
    #[serde(default)]
    pub last_sequence_number: i64,
    #[serde(default)]
    pub last_updated_ms: i64,
    #[serde(default)]
    pub current_schema_id: Option<i32>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
    /// Single schema written by format v1 tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
    #[serde(default)]
    pub current_snapshot_id: Option<i64>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl TableMetadata {
    /// Minimal v2 metadata with one schema and no snapshots.
    pub fn new(location: impl Into<String>, schema: Schema) -> Self {
        Self {
            format_version: 2,
            table_uuid: String::new(),
            location: location.into(),
            last_sequence_number: 0,
            last_updated_ms: 0,
            current_schema_id: Some(schema.schema_id),
            schemas: vec![schema],
            schema: None,
            properties: IndexMap::new(),
            current_snapshot_id: None,
            snapshots: Vec::new(),
        }
    }

    /// Append a snapshot and make it current.
    pub fn with_current_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.last_sequence_number = self.last_sequence_number.max(snapshot.sequence_number);
        self.last_updated_ms = self.last_updated_ms.max(snapshot.timestamp_ms);
        self.current_snapshot_id = Some(snapshot.snapshot_id);
        self.snapshots.push(snapshot);
        self
    }

    /// The schema currently in effect.
    pub fn current_schema(&self) -> Option<&Schema> {
        match self.current_schema_id {
            Some(id) => self
                .schemas
                .iter()
                .find(|s| s.schema_id == id)
                .or(self.schema.as_ref()),
            None => self.schema.as_ref().or(self.schemas.last()),
        }
    }

    /// Id of the current snapshot. Writers use `-1` for "none".
    pub fn current_snapshot_id(&self) -> Option<i64> {
        self.current_snapshot_id.filter(|id| *id != -1)
    }

    /// The current snapshot, if the pointer resolves.
    pub fn current_snapshot(&self) -> Option<&Snapshot> {
        let id = self.current_snapshot_id()?;
        self.snapshot_by_id(id)
    }

    pub fn snapshot_by_id(&self, id: i64) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.snapshot_id == id)
    }
}
