use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::document::NodeKind;
use crate::locator::SectionKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub name: String,
    pub value: Number,
}

impl ResourceEntry {
    pub fn is_integer(&self) -> bool {
        !self.value.is_f64()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingEntry {
    pub name: String,
    pub current: i64,
    #[serde(rename = "turnedOn")]
    pub turned_on: i64,
}

/// Proposed replacement for one building; `None` leaves the field as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildingEdit {
    pub current: Option<i64>,
    #[serde(rename = "turnedOn")]
    pub turned_on: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryItem {
    pub index: usize,
    pub item_id: Option<String>,
    pub amount: i64,
    pub quality: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventoryEdit {
    pub index: usize,
    pub amount: Option<i64>,
    pub quality: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentItem {
    pub index: usize,
    pub item_id: Option<String>,
    pub quality: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentSlot {
    pub name: String,
    pub items: Vec<EquipmentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquipmentEdit {
    pub slot: String,
    pub index: usize,
    pub quality: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

/// Result of a section edit. `value` is the complete replacement for the
/// section value; the input container is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub section: SectionKey,
    pub value: Value,
    pub changes: Vec<FieldChange>,
}

impl EditOutcome {
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Store the new section value in `container` when anything changed.
    pub fn apply_to(self, container: &mut Map<String, Value>) -> Vec<FieldChange> {
        if self.changed() {
            container.insert(self.section.as_str().to_string(), self.value);
        }
        self.changes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SectionInfo {
    pub key: SectionKey,
    pub path: Option<String>,
}

impl SectionInfo {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructureEntry {
    pub key: String,
    pub kind: NodeKind,
}
