//! Entity schemas and data records.
//!
//! Schemas are owned by the surrounding application and handed to the
//! engine read-only. The built-in set mirrors the entity types the demo
//! applications ship with, and is what the CLI falls back to.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One field's values for a single entity, keyed by field name.
pub type DataRecord = HashMap<String, String>;

/// Build a record from an arbitrary JSON object.
///
/// Strings are taken as-is, `null` becomes empty, and other scalars use their
/// JSON spelling (`42`, `true`). Returns `None` if `value` is not an object.
pub fn record_from_json(value: &serde_json::Value) -> Option<DataRecord> {
    let object = value.as_object()?;
    Some(
        object
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect(),
    )
}

/// Field shown in the designer's token palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
}

/// Field catalog and preview data for one entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    pub label: String,
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub sample_data: DataRecord,
}

impl EntitySchema {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fields: Vec::new(),
            sample_data: DataRecord::new(),
        }
    }

    /// Add a field with its sample value.
    pub fn field(mut self, name: &str, label: &str, sample: &str) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.to_string(),
            label: label.to_string(),
        });
        self.sample_data.insert(name.to_string(), sample.to_string());
        self
    }

    /// `{{name}}` token for every field, in declaration order.
    pub fn field_tokens(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| crate::template::token(&f.name))
            .collect()
    }
}

/// Schemas keyed by entity-type key. Ordered so listings are stable.
pub type SchemaMap = BTreeMap<String, EntitySchema>;

/// The schemas bundled with the crate.
pub fn builtin_schemas() -> SchemaMap {
    let mut schemas = SchemaMap::new();
    schemas.insert(
        "employee".to_string(),
        EntitySchema::new("Employee Badge")
            .field("fullName", "Full Name", "Alex Johnson")
            .field("employeeId", "Employee ID", "EMP-2024-889")
            .field("department", "Department", "Engineering")
            .field("joinDate", "Join Date", "2024-01-15"),
    );
    schemas.insert(
        "vendor".to_string(),
        EntitySchema::new("Vendor")
            .field("vendorName", "Vendor Name", "Acme Corp")
            .field("vendorCode", "Vendor Code", "VND-1001")
            .field("contactPerson", "Contact Person", "Mike Ross")
            .field("category", "Category", "Manufacturing"),
    );
    schemas.insert(
        "machine".to_string(),
        EntitySchema::new("Machine")
            .field("machineName", "Machine Name", "CNC Router")
            .field("machineId", "Machine ID", "MAC-05")
            .field("model", "Model", "Dyna-400")
            .field("installationDate", "Installation Date", "2023-05-12"),
    );
    schemas.insert(
        "inventory".to_string(),
        EntitySchema::new("Inventory Label")
            .field("sku", "SKU", "INV-9920-X")
            .field("itemName", "Item Name", "Wireless Mouse Pro")
            .field("category", "Category", "Peripherals")
            .field("price", "Price", "$49.99"),
    );
    schemas
}
