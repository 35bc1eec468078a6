mod engine;
mod error;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use types::{
    BuildingEdit, BuildingEntry, EditOutcome, EquipmentEdit, EquipmentItem, EquipmentSlot,
    FieldChange, InventoryEdit, InventoryItem, ResourceEntry, SectionInfo, StructureEntry,
};
