use serde_json::{Map, Value};

use super::{
    MIN_QUALITY, item_id, item_quality, item_quality_mut, replace_value, require_at_least,
    section_mapping,
};
use crate::core_api::{
    CoreError, CoreErrorCode, EditOutcome, EquipmentEdit, EquipmentItem, EquipmentSlot,
};
use crate::locator::SectionKey;

pub fn equipment_slots(container: &Map<String, Value>) -> Result<Vec<EquipmentSlot>, CoreError> {
    let equipment = section_mapping(container, SectionKey::Equipment)?;
    Ok(equipment
        .iter()
        .filter_map(|(name, items)| {
            let items = items.as_array()?;
            Some(EquipmentSlot {
                name: name.clone(),
                items: items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, element)| {
                        let record = element.as_object()?;
                        Some(EquipmentItem {
                            index,
                            item_id: item_id(record),
                            quality: item_quality(record),
                        })
                    })
                    .collect(),
            })
        })
        .collect())
}

/// Quality-only edits addressed by slot and item index. Items without a
/// quality value cannot be given one.
pub fn edit_equipment(
    container: &Map<String, Value>,
    edits: &[EquipmentEdit],
) -> Result<EditOutcome, CoreError> {
    let equipment = section_mapping(container, SectionKey::Equipment)?;
    let mut updated = equipment.clone();
    let mut changes = Vec::new();

    for edit in edits {
        require_at_least(edit.quality, MIN_QUALITY, "quality")?;

        let items = updated
            .get_mut(&edit.slot)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::InvalidInput,
                    format!("unknown equipment slot '{}'", edit.slot),
                )
            })?
            .as_array_mut()
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!("equipment slot '{}' is not a sequence", edit.slot),
                )
            })?;

        let len = items.len();
        let slot = items
            .get_mut(edit.index)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::InvalidInput,
                    format!(
                        "equipment index {} out of range for slot '{}' (len {len})",
                        edit.index, edit.slot
                    ),
                )
            })?
            .as_object_mut()
            .and_then(item_quality_mut)
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!(
                        "equipment item {}:{} has no quality to edit",
                        edit.slot, edit.index
                    ),
                )
            })?;

        replace_value(
            slot,
            Value::from(edit.quality),
            format!("{}:{}.quality", edit.slot, edit.index),
            &mut changes,
        );
    }

    Ok(EditOutcome {
        section: SectionKey::Equipment,
        value: Value::Object(updated),
        changes,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::{edit_equipment, equipment_slots};
    use crate::core_api::{CoreErrorCode, EquipmentEdit};

    fn sample() -> Map<String, Value> {
        match json!({
            "equipment": {
                "weapon": [{"itemId": "staff", "params": {"itemQuality": 2}}],
                "accessory": [
                    {"itemId": "ring"},
                    {"itemId": "amulet", "params": {"itemQuality": 5}}
                ],
                "broken": "n/a"
            }
        }) {
            Value::Object(map) => map,
            other => panic!("expected mapping fixture, got {other}"),
        }
    }

    fn edit(slot: &str, index: usize, quality: i64) -> EquipmentEdit {
        EquipmentEdit {
            slot: slot.to_string(),
            index,
            quality,
        }
    }

    #[test]
    fn slots_list_items_with_optional_quality() {
        let slots = equipment_slots(&sample()).expect("equipment should list");
        let names: Vec<&str> = slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["weapon", "accessory"]);
        assert_eq!(slots[1].items[0].quality, None);
        assert_eq!(slots[1].items[1].quality, Some(5));
        assert_eq!(slots[1].items[1].item_id.as_deref(), Some("amulet"));
    }

    #[test]
    fn quality_is_replaced_per_slot_and_index() {
        let c = sample();
        let outcome =
            edit_equipment(&c, &[edit("accessory", 1, 6)]).expect("edit should apply");
        assert!(outcome.changed());
        assert_eq!(outcome.changes[0].field, "accessory:1.quality");
        assert_eq!(outcome.value["accessory"][1]["params"]["itemQuality"], json!(6));
        assert_eq!(outcome.value["weapon"], c["equipment"]["weapon"]);
    }

    #[test]
    fn same_quality_is_not_a_change() {
        let outcome = edit_equipment(&sample(), &[edit("weapon", 0, 2)]).expect("edit should apply");
        assert!(!outcome.changed());
    }

    #[test]
    fn item_without_quality_is_immutable() {
        let err = edit_equipment(&sample(), &[edit("accessory", 0, 3)])
            .expect_err("ring has no quality");
        assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    }

    #[test]
    fn unknown_slot_and_bad_index_are_rejected() {
        let err = edit_equipment(&sample(), &[edit("boots", 0, 3)]).expect_err("no boots slot");
        assert_eq!(err.code, CoreErrorCode::InvalidInput);

        let err = edit_equipment(&sample(), &[edit("weapon", 3, 3)]).expect_err("index 3 missing");
        assert_eq!(err.code, CoreErrorCode::InvalidInput);

        let err = edit_equipment(&sample(), &[edit("broken", 0, 3)]).expect_err("not a sequence");
        assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    }

    #[test]
    fn quality_below_one_is_rejected() {
        let err = edit_equipment(&sample(), &[edit("weapon", 0, 0)]).expect_err("zero quality");
        assert_eq!(err.code, CoreErrorCode::InvalidInput);
    }
}
