use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use mr2_core::codec::{CodecOptions, DEFAULT_COMPRESSION_LEVEL};
use mr2_core::core_api::{
    BuildingEdit, Engine, EquipmentEdit, FieldChange, InventoryEdit, Session,
};
use mr2_render::{
    SectionSelection, layers_to_json, render_changes, render_json_full, render_json_selected,
    render_layers, render_structure, render_text, structure_to_json,
};
use serde_json::{Number, Value as JsonValue};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BuildingField {
    Current,
    #[value(name = "turnedOn")]
    TurnedOn,
}

#[derive(Clone, Debug, PartialEq)]
struct BuildingAssignment {
    name: String,
    field: BuildingField,
    value: i64,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(value_name = "SAVE.sav")]
    path: PathBuf,
    #[arg(long)]
    resources: bool,
    #[arg(long)]
    buildings: bool,
    #[arg(long)]
    inventory: bool,
    #[arg(long)]
    equipment: bool,
    /// Print the top-level keys of the decoded document and their kinds.
    #[arg(long)]
    structure: bool,
    /// Print the size of every encoding layer.
    #[arg(long)]
    layers: bool,
    #[arg(long)]
    json: bool,
    #[arg(
        long = "set-resource",
        value_name = "NAME=VALUE",
        value_parser = parse_resource_assignment
    )]
    set_resource: Vec<(String, Number)>,
    #[arg(
        long = "set-building",
        value_name = "NAME.current=N|NAME.turnedOn=N",
        value_parser = parse_building_assignment
    )]
    set_building: Vec<BuildingAssignment>,
    #[arg(
        long = "set-item-amount",
        value_name = "INDEX=N",
        value_parser = parse_index_assignment
    )]
    set_item_amount: Vec<(usize, i64)>,
    #[arg(
        long = "set-item-quality",
        value_name = "INDEX=Q",
        value_parser = parse_index_assignment
    )]
    set_item_quality: Vec<(usize, i64)>,
    #[arg(
        long = "set-equipment-quality",
        value_name = "SLOT:INDEX=Q",
        value_parser = parse_equipment_assignment
    )]
    set_equipment_quality: Vec<EquipmentEdit>,
    /// Replace the decoded document with JSON text read from PATH.
    #[arg(long = "import-raw", value_name = "PATH")]
    import_raw: Option<PathBuf>,
    /// Write the (edited) document as indented JSON text to PATH.
    #[arg(long = "export-raw", value_name = "PATH")]
    export_raw: Option<PathBuf>,
    #[arg(
        long = "compression-level",
        value_name = "0-9",
        default_value_t = DEFAULT_COMPRESSION_LEVEL,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    compression_level: u32,
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn has_edits(&self) -> bool {
        !self.set_resource.is_empty()
            || !self.set_building.is_empty()
            || !self.set_item_amount.is_empty()
            || !self.set_item_quality.is_empty()
            || !self.set_equipment_quality.is_empty()
            || self.import_raw.is_some()
    }

    fn is_report_mode(&self) -> bool {
        self.structure || self.layers
    }
}

fn selection_from_cli(cli: &Cli) -> SectionSelection {
    SectionSelection {
        resources: cli.resources,
        buildings: cli.buildings,
        inventory: cli.inventory,
        equipment: cli.equipment,
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let selection = selection_from_cli(&cli);
    let has_edits = cli.has_edits();

    if has_edits && cli.output.is_none() {
        eprintln!("--set-* and --import-raw flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one --set-* or --import-raw flag");
        process::exit(2);
    }

    let options = CodecOptions::with_compression_level(cli.compression_level).unwrap_or_else(|e| {
        eprintln!("Invalid compression level: {e}");
        process::exit(2);
    });

    let bytes = fs::read(&cli.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", cli.path.display());
        process::exit(1);
    });

    let engine = Engine::with_options(options);
    let layers = if cli.layers {
        Some(engine.inspect_bytes(&bytes).unwrap_or_else(|e| {
            eprintln!("Error inspecting save file: {}", cli.path.display());
            eprintln!("  {}", e);
            process::exit(1);
        }))
    } else {
        None
    };
    let mut session = engine.open_bytes(&bytes).unwrap_or_else(|e| {
        eprintln!("Error decoding save file: {}", cli.path.display());
        eprintln!("  {}", e);
        process::exit(1);
    });
    debug!(path = %cli.path.display(), "opened save");

    if let Some(import_path) = &cli.import_raw {
        import_raw_text(&mut session, import_path);
    }

    let changes = apply_edits(&mut session, &cli);

    if let Some(export_path) = &cli.export_raw {
        let text = session.raw_text().unwrap_or_else(|e| {
            eprintln!("Error rendering raw document text: {e}");
            process::exit(1);
        });
        fs::write(export_path, text).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", export_path.display());
            process::exit(1);
        });
    }

    if let Some(out_path) = &cli.output {
        let edited_bytes = session.to_bytes().unwrap_or_else(|e| {
            eprintln!("Error encoding edited save: {e}");
            process::exit(1);
        });
        fs::write(out_path, edited_bytes).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }

    if cli.json {
        let mut json = if selection.is_any_selected() {
            render_json_selected(&session, &selection)
        } else if cli.is_report_mode() || has_edits {
            JsonValue::Object(Default::default())
        } else {
            render_json_full(&session)
        };
        if let JsonValue::Object(map) = &mut json {
            if cli.structure {
                map.insert("structure".to_string(), structure_to_json(&session.structure()));
            }
            if let Some(layers) = &layers {
                map.insert("layers".to_string(), layers_to_json(layers));
            }
            if has_edits {
                map.insert("changes".to_string(), changes_to_json(&changes));
            }
        }
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if cli.structure {
        print!("{}", render_structure(&session.structure()));
    }
    if let Some(layers) = &layers {
        print!("{}", render_layers(layers));
    }
    if selection.is_any_selected() {
        print!("{}", render_text(&session, &selection));
    }
    if cli.is_report_mode() || selection.is_any_selected() {
        return;
    }

    if let Some(out_path) = &cli.output {
        print!("{}", render_changes(&changes));
        println!("Wrote edited save to {}", out_path.display());
        return;
    }

    print!("{}", render_text(&session, &SectionSelection::all()));
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// A submission that fails to parse is reported and skipped; the decoded
/// document stays in place.
fn import_raw_text(session: &mut Session, path: &Path) {
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    if let Err(e) = session.replace_from_text(&text) {
        warn!(path = %path.display(), "raw import rejected");
        eprintln!(
            "Warning: could not import {}: {}; keeping the decoded document",
            path.display(),
            e.message
        );
    }
}

fn apply_edits(session: &mut Session, cli: &Cli) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    if !cli.set_resource.is_empty() {
        let proposed: BTreeMap<String, Number> = cli.set_resource.iter().cloned().collect();
        changes.extend(session.set_resources(&proposed).unwrap_or_else(|e| {
            eprintln!("Error applying resource edit: {e}");
            process::exit(1);
        }));
    }

    if !cli.set_building.is_empty() {
        let mut proposed: BTreeMap<String, BuildingEdit> = BTreeMap::new();
        for assignment in &cli.set_building {
            let edit = proposed.entry(assignment.name.clone()).or_default();
            match assignment.field {
                BuildingField::Current => edit.current = Some(assignment.value),
                BuildingField::TurnedOn => edit.turned_on = Some(assignment.value),
            }
        }
        changes.extend(session.set_buildings(&proposed).unwrap_or_else(|e| {
            eprintln!("Error applying building edit: {e}");
            process::exit(1);
        }));
    }

    if !cli.set_item_amount.is_empty() || !cli.set_item_quality.is_empty() {
        let mut proposed: BTreeMap<usize, InventoryEdit> = BTreeMap::new();
        for &(index, amount) in &cli.set_item_amount {
            inventory_edit_entry(&mut proposed, index).amount = Some(amount);
        }
        for &(index, quality) in &cli.set_item_quality {
            inventory_edit_entry(&mut proposed, index).quality = Some(quality);
        }
        let edits: Vec<InventoryEdit> = proposed.into_values().collect();
        changes.extend(session.edit_inventory(&edits).unwrap_or_else(|e| {
            eprintln!("Error applying inventory edit: {e}");
            process::exit(1);
        }));
    }

    if !cli.set_equipment_quality.is_empty() {
        changes.extend(
            session
                .edit_equipment(&cli.set_equipment_quality)
                .unwrap_or_else(|e| {
                    eprintln!("Error applying equipment edit: {e}");
                    process::exit(1);
                }),
        );
    }

    changes
}

fn inventory_edit_entry(
    proposed: &mut BTreeMap<usize, InventoryEdit>,
    index: usize,
) -> &mut InventoryEdit {
    proposed.entry(index).or_insert(InventoryEdit {
        index,
        amount: None,
        quality: None,
    })
}

fn changes_to_json(changes: &[FieldChange]) -> JsonValue {
    JsonValue::Array(
        changes
            .iter()
            .map(|change| {
                serde_json::json!({
                    "field": change.field,
                    "before": change.before,
                    "after": change.after,
                })
            })
            .collect(),
    )
}

/// Number text is kept as written, so integers wider than 64 bits survive.
fn parse_number(value: &str) -> Result<Number, String> {
    let value = value.trim();
    value
        .parse::<Number>()
        .ok()
        .filter(|n| n.as_f64().is_some())
        .ok_or_else(|| format!("'{value}' is not a finite number"))
}

fn parse_integer(value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("'{value}' is not an integer"))
}

fn split_assignment(value: &str) -> Result<(&str, &str), String> {
    value
        .split_once('=')
        .map(|(lhs, rhs)| (lhs.trim(), rhs))
        .filter(|(lhs, _)| !lhs.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))
}

fn parse_resource_assignment(value: &str) -> Result<(String, Number), String> {
    let (name, number) = split_assignment(value)?;
    Ok((name.to_string(), parse_number(number)?))
}

fn parse_building_assignment(value: &str) -> Result<BuildingAssignment, String> {
    let (target, number) = split_assignment(value)?;
    let (name, field) = target
        .rsplit_once('.')
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME.current or NAME.turnedOn, got '{target}'"))?;
    let field = BuildingField::from_str(field, false)
        .map_err(|_| format!("unknown building field '{field}', expected current or turnedOn"))?;
    Ok(BuildingAssignment {
        name: name.to_string(),
        field,
        value: parse_integer(number)?,
    })
}

fn parse_index_assignment(value: &str) -> Result<(usize, i64), String> {
    let (index, number) = split_assignment(value)?;
    let index = index
        .parse::<usize>()
        .map_err(|_| format!("'{index}' is not an inventory index"))?;
    Ok((index, parse_integer(number)?))
}

fn parse_equipment_assignment(value: &str) -> Result<EquipmentEdit, String> {
    let (target, number) = split_assignment(value)?;
    let (slot, index) = target
        .rsplit_once(':')
        .filter(|(slot, _)| !slot.is_empty())
        .ok_or_else(|| format!("expected SLOT:INDEX, got '{target}'"))?;
    let index = index
        .parse::<usize>()
        .map_err(|_| format!("'{index}' is not an equipment index"))?;
    Ok(EquipmentEdit {
        slot: slot.to_string(),
        index,
        quality: parse_integer(number)?,
    })
}
