use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::{read_integer, replace_value, section_mapping};
use crate::core_api::{BuildingEdit, BuildingEntry, CoreError, CoreErrorCode, EditOutcome, FieldChange};
use crate::locator::SectionKey;

const CURRENT_KEY: &str = "current";
const TURNED_ON_KEY: &str = "turnedOn";

/// Buildings in container order. A missing or non-numeric count reads as 0;
/// floats are truncated.
pub fn building_entries(container: &Map<String, Value>) -> Result<Vec<BuildingEntry>, CoreError> {
    let buildings = section_mapping(container, SectionKey::Buildings)?;
    Ok(buildings
        .iter()
        .filter_map(|(name, record)| {
            let fields = record.as_object()?;
            Some(BuildingEntry {
                name: name.clone(),
                current: read_count(fields.get(CURRENT_KEY)),
                turned_on: read_count(fields.get(TURNED_ON_KEY)),
            })
        })
        .collect())
}

pub fn edit_buildings(
    container: &Map<String, Value>,
    proposed: &BTreeMap<String, BuildingEdit>,
) -> Result<EditOutcome, CoreError> {
    let buildings = section_mapping(container, SectionKey::Buildings)?;

    for name in proposed.keys() {
        match buildings.get(name) {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!("building '{name}' is not a record"),
                ));
            }
            None => {
                return Err(CoreError::new(
                    CoreErrorCode::InvalidInput,
                    format!("unknown building '{name}'"),
                ));
            }
        }
    }

    let mut updated = buildings.clone();
    let mut changes = Vec::new();
    for (name, record) in updated.iter_mut() {
        let (Some(edit), Value::Object(fields)) = (proposed.get(name), record) else {
            continue;
        };
        set_count(fields, name, CURRENT_KEY, edit.current, &mut changes);
        set_count(fields, name, TURNED_ON_KEY, edit.turned_on, &mut changes);
    }

    Ok(EditOutcome {
        section: SectionKey::Buildings,
        value: Value::Object(updated),
        changes,
    })
}

fn read_count(value: Option<&Value>) -> i64 {
    value.and_then(read_integer).unwrap_or(0)
}

fn set_count(
    fields: &mut Map<String, Value>,
    building: &str,
    key: &str,
    proposed: Option<i64>,
    changes: &mut Vec<FieldChange>,
) {
    let Some(proposed) = proposed else {
        return;
    };
    let field = format!("{building}.{key}");
    match fields.get_mut(key) {
        Some(slot) => replace_value(slot, Value::from(proposed), field, changes),
        None if proposed == 0 => {}
        None => {
            fields.insert(key.to_string(), Value::from(proposed));
            changes.push(FieldChange {
                field,
                before: Value::Null,
                after: Value::from(proposed),
            });
        }
    }
}
