//! Section views and pure section edits.
//!
//! Every `edit_*` function reads a container and returns an [`EditOutcome`]
//! holding a complete replacement value for the section. Nothing here
//! mutates its input; callers store the outcome with
//! [`EditOutcome::apply_to`].
//!
//! [`EditOutcome`]: crate::core_api::EditOutcome
//! [`EditOutcome::apply_to`]: crate::core_api::EditOutcome::apply_to

mod buildings;
mod equipment;
mod inventory;
mod resources;

use serde_json::{Map, Value};

use crate::core_api::{CoreError, CoreErrorCode, FieldChange};
use crate::locator::SectionKey;

pub use buildings::{building_entries, edit_buildings};
pub use equipment::{edit_equipment, equipment_slots};
pub use inventory::{edit_inventory, inventory_items};
pub use resources::{edit_resources, resource_entries};

const ITEM_ID_KEY: &str = "itemId";
const PARAMS_KEY: &str = "params";
const ITEM_QUALITY_KEY: &str = "itemQuality";
const MIN_QUALITY: i64 = 1;

fn section_value(container: &Map<String, Value>, key: SectionKey) -> Result<&Value, CoreError> {
    container.get(key.as_str()).ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::SectionNotFound,
            format!("container does not hold {key}"),
        )
    })
}

fn section_mapping(
    container: &Map<String, Value>,
    key: SectionKey,
) -> Result<&Map<String, Value>, CoreError> {
    section_value(container, key)?
        .as_object()
        .ok_or_else(|| malformed_section(key, "a mapping"))
}

fn section_sequence(container: &Map<String, Value>, key: SectionKey) -> Result<&Vec<Value>, CoreError> {
    section_value(container, key)?
        .as_array()
        .ok_or_else(|| malformed_section(key, "a sequence"))
}

fn malformed_section(key: SectionKey, expected: &str) -> CoreError {
    CoreError::new(
        CoreErrorCode::UnsupportedOperation,
        format!("{key} section is not {expected}"),
    )
}

fn item_id(record: &Map<String, Value>) -> Option<String> {
    record
        .get(ITEM_ID_KEY)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn item_quality(record: &Map<String, Value>) -> Option<i64> {
    record
        .get(PARAMS_KEY)?
        .as_object()?
        .get(ITEM_QUALITY_KEY)?
        .as_i64()
}

fn item_quality_mut(record: &mut Map<String, Value>) -> Option<&mut Value> {
    record
        .get_mut(PARAMS_KEY)?
        .as_object_mut()?
        .get_mut(ITEM_QUALITY_KEY)
        .filter(|value| value.is_i64())
}

/// Integer reading of a stored count. Floats are truncated; anything else
/// is `None`.
fn read_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
}

fn require_at_least(value: i64, minimum: i64, field: &str) -> Result<(), CoreError> {
    if value < minimum {
        return Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!("invalid {field} {value}, expected >= {minimum}"),
        ));
    }
    Ok(())
}

/// Overwrite `slot` with `after`, recording a change when the stored value
/// differs structurally (an integer replaced by an equal float counts).
fn replace_value(slot: &mut Value, after: Value, field: String, changes: &mut Vec<FieldChange>) {
    if *slot == after {
        return;
    }
    let before = std::mem::replace(slot, after.clone());
    changes.push(FieldChange {
        field,
        before,
        after,
    });
}
