use std::fmt::Write as _;

use mr2_core::codec::CodecLayers;
use mr2_core::core_api::{
    BuildingEntry, CoreError, EquipmentSlot, FieldChange, InventoryItem, ResourceEntry, Session,
    StructureEntry,
};
use mr2_core::locator::SectionKey;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

const TWO_COL_WIDTH_LEFT: usize = 36;
const TWO_COL_WIDTH_RIGHT: usize = 36;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SectionSelection {
    pub resources: bool,
    pub buildings: bool,
    pub inventory: bool,
    pub equipment: bool,
}

impl SectionSelection {
    pub fn all() -> Self {
        Self {
            resources: true,
            buildings: true,
            inventory: true,
            equipment: true,
        }
    }

    pub fn is_any_selected(&self) -> bool {
        self.resources || self.buildings || self.inventory || self.equipment
    }

    pub fn includes(&self, key: SectionKey) -> bool {
        match key {
            SectionKey::Resources => self.resources,
            SectionKey::Buildings => self.buildings,
            SectionKey::Inventory => self.inventory,
            SectionKey::Equipment => self.equipment,
        }
    }
}

/// Inventory rows sharing an item id and quality, for display only. The
/// underlying sequence is left as it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryGroup {
    pub item_id: Option<String>,
    pub quality: Option<i64>,
    pub total_amount: i64,
    pub indices: Vec<usize>,
}

pub fn group_inventory(items: &[InventoryItem]) -> Vec<InventoryGroup> {
    let mut groups: Vec<InventoryGroup> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|g| g.item_id == item.item_id && g.quality == item.quality)
        {
            Some(group) => {
                group.total_amount = group.total_amount.saturating_add(item.amount);
                group.indices.push(item.index);
            }
            None => groups.push(InventoryGroup {
                item_id: item.item_id.clone(),
                quality: item.quality,
                total_amount: item.amount,
                indices: vec![item.index],
            }),
        }
    }
    groups
}

pub fn render_json_full(session: &Session) -> JsonValue {
    render_json_selected(session, &SectionSelection::all())
}

/// One key per selected section, in canonical order. Absent sections render
/// as `null`; malformed ones as `{"error": ...}`.
pub fn render_json_selected(session: &Session, selection: &SectionSelection) -> JsonValue {
    let mut out = JsonMap::new();
    for key in SectionKey::ALL {
        if !selection.includes(key) {
            continue;
        }
        let value = match key {
            SectionKey::Resources => session.resources().map(|v| resources_to_json(&v)),
            SectionKey::Buildings => session.buildings().map(|v| buildings_to_json(&v)),
            SectionKey::Inventory => session.inventory().map(|v| inventory_to_json(&v)),
            SectionKey::Equipment => session.equipment().map(|v| equipment_to_json(&v)),
        };
        out.insert(key.as_str().to_string(), section_or_absent(value));
    }
    JsonValue::Object(out)
}

pub fn render_text(session: &Session, selection: &SectionSelection) -> String {
    let mut out = String::new();
    let mut first = true;
    for key in SectionKey::ALL {
        if !selection.includes(key) {
            continue;
        }
        if !first {
            writeln!(&mut out).expect("writing to String cannot fail");
        }
        first = false;

        writeln!(&mut out, " ::: {} :::", section_title(key)).expect("writing to String cannot fail");
        let rows = match key {
            SectionKey::Resources => session.resources().map(|v| resource_rows(&v)),
            SectionKey::Buildings => session.buildings().map(|v| building_rows(&v)),
            SectionKey::Inventory => session.inventory().map(|v| inventory_rows(&v)),
            SectionKey::Equipment => session.equipment().map(|v| equipment_rows(&v)),
        };
        match rows {
            Ok(rows) => write_two_column_rows(&mut out, &rows),
            Err(err) if err.is_not_found() => {
                writeln!(&mut out, "  No {key} found in the save file!")
                    .expect("writing to String cannot fail");
            }
            Err(err) => {
                writeln!(&mut out, "  {key} section is unreadable: {}", err.message)
                    .expect("writing to String cannot fail");
            }
        }
    }
    out
}

pub fn render_structure(entries: &[StructureEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        writeln!(&mut out, "{}: {}", entry.key, entry.kind).expect("writing to String cannot fail");
    }
    out
}

pub fn structure_to_json(entries: &[StructureEntry]) -> JsonValue {
    JsonValue::Object(
        entries
            .iter()
            .map(|e| (e.key.clone(), JsonValue::String(e.kind.to_string())))
            .collect(),
    )
}

pub fn render_layers(layers: &CodecLayers) -> String {
    format!(
        "outer_base64={}\ninner_base64={}\ngzip={}\njson={}\n",
        layers.outer_len, layers.inner_len, layers.compressed_len, layers.json_len
    )
}

pub fn layers_to_json(layers: &CodecLayers) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("outer_base64".to_string(), JsonValue::from(layers.outer_len));
    m.insert("inner_base64".to_string(), JsonValue::from(layers.inner_len));
    m.insert("gzip".to_string(), JsonValue::from(layers.compressed_len));
    m.insert("json".to_string(), JsonValue::from(layers.json_len));
    JsonValue::Object(m)
}

pub fn render_changes(changes: &[FieldChange]) -> String {
    let mut out = String::new();
    for change in changes {
        writeln!(&mut out, "{}: {} -> {}", change.field, change.before, change.after)
            .expect("writing to String cannot fail");
    }
    out
}

fn section_or_absent(value: Result<JsonValue, CoreError>) -> JsonValue {
    match value {
        Ok(value) => value,
        Err(err) if err.is_not_found() => JsonValue::Null,
        Err(err) => {
            let mut m = JsonMap::new();
            m.insert("error".to_string(), JsonValue::String(err.message));
            JsonValue::Object(m)
        }
    }
}

fn resources_to_json(entries: &[ResourceEntry]) -> JsonValue {
    JsonValue::Object(
        entries
            .iter()
            .map(|e| (e.name.clone(), JsonValue::Number(e.value.clone())))
            .collect(),
    )
}

fn buildings_to_json(entries: &[BuildingEntry]) -> JsonValue {
    JsonValue::Object(
        entries
            .iter()
            .map(|e| {
                let mut m = JsonMap::new();
                m.insert("current".to_string(), JsonValue::from(e.current));
                m.insert("turnedOn".to_string(), JsonValue::from(e.turned_on));
                (e.name.clone(), JsonValue::Object(m))
            })
            .collect(),
    )
}

fn inventory_to_json(items: &[InventoryItem]) -> JsonValue {
    JsonValue::Array(
        items
            .iter()
            .map(|item| {
                let mut m = JsonMap::new();
                m.insert("index".to_string(), JsonValue::from(item.index));
                m.insert("itemId".to_string(), JsonValue::from(item.item_id.clone()));
                m.insert("amount".to_string(), JsonValue::from(item.amount));
                m.insert("quality".to_string(), JsonValue::from(item.quality));
                JsonValue::Object(m)
            })
            .collect(),
    )
}

fn equipment_to_json(slots: &[EquipmentSlot]) -> JsonValue {
    JsonValue::Object(
        slots
            .iter()
            .map(|slot| {
                let items = slot
                    .items
                    .iter()
                    .map(|item| {
                        let mut m = JsonMap::new();
                        m.insert("index".to_string(), JsonValue::from(item.index));
                        m.insert("itemId".to_string(), JsonValue::from(item.item_id.clone()));
                        m.insert("quality".to_string(), JsonValue::from(item.quality));
                        JsonValue::Object(m)
                    })
                    .collect();
                (slot.name.clone(), JsonValue::Array(items))
            })
            .collect(),
    )
}

fn section_title(key: SectionKey) -> &'static str {
    match key {
        SectionKey::Resources => "Resources",
        SectionKey::Buildings => "Buildings",
        SectionKey::Inventory => "Inventory",
        SectionKey::Equipment => "Equipment",
    }
}

fn resource_rows(entries: &[ResourceEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.name, format_resource_value(&e.value)))
        .collect()
}

fn building_rows(entries: &[BuildingEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| format!("{}: {} built, {} on", e.name, e.current, e.turned_on))
        .collect()
}

fn inventory_rows(items: &[InventoryItem]) -> Vec<String> {
    group_inventory(items)
        .iter()
        .map(|group| {
            let mut row = format!(
                "{}x {}",
                group.total_amount,
                group.item_id.as_deref().unwrap_or("unknown")
            );
            if let Some(quality) = group.quality {
                write!(&mut row, " Q{quality}").expect("writing to String cannot fail");
            }
            let indices: Vec<String> = group.indices.iter().map(|i| format!("#{i}")).collect();
            write!(&mut row, " [{}]", indices.join(", ")).expect("writing to String cannot fail");
            row
        })
        .collect()
}

fn equipment_rows(slots: &[EquipmentSlot]) -> Vec<String> {
    let mut rows = Vec::new();
    for slot in slots {
        if slot.items.is_empty() {
            rows.push(format!("{}: empty", slot.name));
            continue;
        }
        for item in &slot.items {
            let mut row = format!(
                "{}:{} {}",
                slot.name,
                item.index,
                item.item_id.as_deref().unwrap_or("unknown")
            );
            if let Some(quality) = item.quality {
                write!(&mut row, " Q{quality}").expect("writing to String cannot fail");
            }
            rows.push(row);
        }
    }
    rows
}

fn format_resource_value(value: &Number) -> String {
    match value.as_f64() {
        Some(f) if value.is_f64() => format!("{f:.2}"),
        _ => value.to_string(),
    }
}

/// Entries fill the left column first, then the right, row by row.
fn write_two_column_rows(out: &mut String, rows: &[String]) {
    if rows.is_empty() {
        writeln!(out, "  none").expect("writing to String cannot fail");
        return;
    }

    for chunk in rows.chunks(2) {
        let left = chunk.first().map(String::as_str).unwrap_or("");
        let right = chunk.get(1).map(String::as_str).unwrap_or("");
        let line = format!(
            "  {:<a$}{:<b$}",
            fit_column(left, TWO_COL_WIDTH_LEFT),
            fit_column(right, TWO_COL_WIDTH_RIGHT),
            a = TWO_COL_WIDTH_LEFT,
            b = TWO_COL_WIDTH_RIGHT
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");
    }
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}
