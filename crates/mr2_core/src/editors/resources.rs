use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use super::{replace_value, section_mapping};
use crate::core_api::{CoreError, CoreErrorCode, EditOutcome, ResourceEntry};
use crate::locator::SectionKey;

/// Numeric resources in container order. Non-numeric entries are not
/// editable and are left out.
pub fn resource_entries(container: &Map<String, Value>) -> Result<Vec<ResourceEntry>, CoreError> {
    let resources = section_mapping(container, SectionKey::Resources)?;
    Ok(resources
        .iter()
        .filter_map(|(name, value)| match value {
            Value::Number(number) => Some(ResourceEntry {
                name: name.clone(),
                value: number.clone(),
            }),
            _ => None,
        })
        .collect())
}

/// Replace resource values. Each proposed number is stored with its own
/// subtype; resources missing from `proposed` keep their value.
pub fn edit_resources(
    container: &Map<String, Value>,
    proposed: &BTreeMap<String, Number>,
) -> Result<EditOutcome, CoreError> {
    let resources = section_mapping(container, SectionKey::Resources)?;

    for name in proposed.keys() {
        match resources.get(name) {
            Some(Value::Number(_)) => {}
            Some(_) => {
                return Err(CoreError::new(
                    CoreErrorCode::UnsupportedOperation,
                    format!("resource '{name}' is not numeric"),
                ));
            }
            None => {
                return Err(CoreError::new(
                    CoreErrorCode::InvalidInput,
                    format!("unknown resource '{name}'"),
                ));
            }
        }
    }

    let mut updated = resources.clone();
    let mut changes = Vec::new();
    for (name, slot) in updated.iter_mut() {
        if let Some(number) = proposed.get(name) {
            replace_value(slot, Value::Number(number.clone()), name.clone(), &mut changes);
        }
    }

    Ok(EditOutcome {
        section: SectionKey::Resources,
        value: Value::Object(updated),
        changes,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::{Map, Number, Value, json};

    use super::{edit_resources, resource_entries};
    use crate::core_api::CoreErrorCode;

    fn container(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected mapping fixture, got {other}"),
        }
    }

    fn int(value: i64) -> Number {
        Number::from(value)
    }

    fn float(value: f64) -> Number {
        Number::from_f64(value).expect("finite float")
    }

    #[test]
    fn entries_keep_order_and_skip_non_numeric() {
        let c = container(json!({"resources": {"mana": 50.5, "label": "x", "gold": 100}}));
        let entries = resource_entries(&c).expect("resources should list");
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["mana", "gold"]);
        assert!(!entries[0].is_integer());
        assert!(entries[1].is_integer());
    }

    #[test]
    fn wide_integer_stays_an_integer_entry() {
        let c: Map<String, Value> =
            serde_json::from_str(r#"{"resources": {"gold": 123456789012345678901}}"#)
                .expect("container should parse");
        let entries = resource_entries(&c).expect("resources should list");
        assert!(entries[0].is_integer());
        assert_eq!(entries[0].value.to_string(), "123456789012345678901");
    }

    #[test]
    fn edit_updates_changed_value_and_keeps_others() {
        let c = container(json!({"resources": {"gold": 100, "mana": 50.5}}));
        let proposed = BTreeMap::from([
            ("gold".to_string(), int(150)),
            ("mana".to_string(), float(50.5)),
        ]);

        let outcome = edit_resources(&c, &proposed).expect("edit should apply");
        assert!(outcome.changed());
        assert_eq!(outcome.value, json!({"gold": 150, "mana": 50.5}));
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].field, "gold");
        assert_eq!(outcome.changes[0].before, json!(100));
        assert_eq!(outcome.changes[0].after, json!(150));
        assert_eq!(c["resources"]["gold"], json!(100));
    }

    #[test]
    fn float_proposal_replaces_equal_integer() {
        let c = container(json!({"resources": {"wood": 500}}));
        let proposed = BTreeMap::from([("wood".to_string(), float(500.0))]);

        let outcome = edit_resources(&c, &proposed).expect("edit should apply");
        assert!(outcome.changed());
        assert!(outcome.value["wood"].is_f64());
        assert_eq!(outcome.value["wood"].as_f64(), Some(500.0));
    }

    #[test]
    fn identical_proposal_is_not_a_change() {
        let c = container(json!({"resources": {"gold": 100, "mana": 50.5}}));
        let proposed = BTreeMap::from([
            ("gold".to_string(), int(100)),
            ("mana".to_string(), float(50.5)),
        ]);

        let outcome = edit_resources(&c, &proposed).expect("edit should apply");
        assert!(!outcome.changed());
        assert_eq!(&outcome.value, &c["resources"]);
    }

    #[test]
    fn unknown_resource_is_rejected() {
        let c = container(json!({"resources": {"gold": 1}}));
        let proposed = BTreeMap::from([("silver".to_string(), int(1))]);
        let err = edit_resources(&c, &proposed).expect_err("unknown name should fail");
        assert_eq!(err.code, CoreErrorCode::InvalidInput);
    }

    #[test]
    fn non_numeric_resource_is_rejected() {
        let c = container(json!({"resources": {"label": "x"}}));
        let proposed = BTreeMap::from([("label".to_string(), int(1))]);
        let err = edit_resources(&c, &proposed).expect_err("string value should fail");
        assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    }

    #[test]
    fn non_mapping_section_is_rejected() {
        let c = container(json!({"resources": 5}));
        let err = resource_entries(&c).expect_err("scalar section should fail");
        assert_eq!(err.code, CoreErrorCode::UnsupportedOperation);
    }
}
