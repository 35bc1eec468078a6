use serde_json::{Map, Value};

use super::{
    MIN_QUALITY, item_id, item_quality, item_quality_mut, read_integer, replace_value,
    require_at_least, section_sequence,
};
use crate::core_api::{CoreError, CoreErrorCode, EditOutcome, InventoryEdit, InventoryItem};
use crate::locator::SectionKey;

const AMOUNT_KEY: &str = "amount";
const ITEM_OCCURRENCE_KEY: &str = "itemOccurrence";
const MIN_AMOUNT: i64 = 1;

/// Item records in sequence order. `index` is the position in the
/// underlying sequence; elements that are not item records are skipped
/// without shifting later indices.
pub fn inventory_items(container: &Map<String, Value>) -> Result<Vec<InventoryItem>, CoreError> {
    let items = section_sequence(container, SectionKey::Inventory)?;
    Ok(items
        .iter()
        .enumerate()
        .filter_map(|(index, element)| {
            let record = element.as_object()?;
            let amount = read_integer(record.get(AMOUNT_KEY)?)?;
            let occurrence = record.get(ITEM_OCCURRENCE_KEY).and_then(Value::as_object);
            Some(InventoryItem {
                index,
                item_id: occurrence.and_then(item_id),
                amount,
                quality: occurrence.and_then(item_quality),
            })
        })
        .collect())
}

/// Apply per-index edits. The sequence keeps its length and order.
pub fn edit_inventory(
    container: &Map<String, Value>,
    edits: &[InventoryEdit],
) -> Result<EditOutcome, CoreError> {
    let items = section_sequence(container, SectionKey::Inventory)?;
    let mut updated = items.clone();
    let mut changes = Vec::new();

    for edit in edits {
        let len = updated.len();
        let record = updated
            .get_mut(edit.index)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::InvalidInput,
                    format!("inventory index {} out of range (len {len})", edit.index),
                )
            })?
            .as_object_mut()
            .ok_or_else(|| not_an_item(edit.index))?;

        if let Some(amount) = edit.amount {
            require_at_least(amount, MIN_AMOUNT, "amount")?;
            let slot = record
                .get_mut(AMOUNT_KEY)
                .ok_or_else(|| not_an_item(edit.index))?;
            replace_value(
                slot,
                Value::from(amount),
                format!("{}.amount", edit.index),
                &mut changes,
            );
        }

        if let Some(quality) = edit.quality {
            require_at_least(quality, MIN_QUALITY, "quality")?;
            let slot = record
                .get_mut(ITEM_OCCURRENCE_KEY)
                .and_then(Value::as_object_mut)
                .and_then(item_quality_mut)
                .ok_or_else(|| {
                    CoreError::new(
                        CoreErrorCode::UnsupportedOperation,
                        format!("inventory item {} has no quality to edit", edit.index),
                    )
                })?;
            replace_value(
                slot,
                Value::from(quality),
                format!("{}.quality", edit.index),
                &mut changes,
            );
        }
    }

    Ok(EditOutcome {
        section: SectionKey::Inventory,
        value: Value::Array(updated),
        changes,
    })
}

fn not_an_item(index: usize) -> CoreError {
    CoreError::new(
        CoreErrorCode::UnsupportedOperation,
        format!("inventory element {index} is not an item record"),
    )
}
