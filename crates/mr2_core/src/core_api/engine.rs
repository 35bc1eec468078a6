use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};
use tracing::{info, warn};

use crate::codec::{self, CodecLayers, CodecOptions};
use crate::document::SaveDocument;
use crate::editors;
use crate::locator::{self, SectionKey, SectionPath};

use super::error::{CoreError, CoreErrorCode};
use super::types::{
    BuildingEdit, BuildingEntry, EditOutcome, EquipmentEdit, EquipmentSlot, FieldChange,
    InventoryEdit, InventoryItem, ResourceEntry, SectionInfo, StructureEntry,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct Engine {
    options: CodecOptions,
}

/// One loaded save. All edits within a session act on the same document.
#[derive(Debug)]
pub struct Session {
    options: CodecOptions,
    document: SaveDocument,
    modified: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CodecOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn open_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<Session, CoreError> {
        let document = codec::decode(bytes.as_ref())?;
        Ok(self.open_document(document))
    }

    pub fn open_document(&self, document: SaveDocument) -> Session {
        Session {
            options: self.options,
            document,
            modified: false,
        }
    }

    pub fn inspect_bytes<B: AsRef<[u8]>>(&self, bytes: B) -> Result<CodecLayers, CoreError> {
        codec::inspect(bytes.as_ref())
    }
}

impl Session {
    pub fn document(&self) -> &SaveDocument {
        &self.document
    }

    pub fn into_document(self) -> SaveDocument {
        self.document
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn structure(&self) -> Vec<StructureEntry> {
        self.document.structure()
    }

    pub fn section_path(&self, key: SectionKey) -> Option<SectionPath> {
        locator::locate_path(self.document.root(), key.as_str(), key.shape())
    }

    pub fn sections(&self) -> Vec<SectionInfo> {
        SectionKey::ALL
            .iter()
            .map(|&key| SectionInfo {
                key,
                path: self.section_path(key).map(|path| path.to_string()),
            })
            .collect()
    }

    pub fn resources(&self) -> Result<Vec<ResourceEntry>, CoreError> {
        editors::resource_entries(self.container(SectionKey::Resources)?)
    }

    pub fn buildings(&self) -> Result<Vec<BuildingEntry>, CoreError> {
        editors::building_entries(self.container(SectionKey::Buildings)?)
    }

    pub fn inventory(&self) -> Result<Vec<InventoryItem>, CoreError> {
        editors::inventory_items(self.container(SectionKey::Inventory)?)
    }

    pub fn equipment(&self) -> Result<Vec<EquipmentSlot>, CoreError> {
        editors::equipment_slots(self.container(SectionKey::Equipment)?)
    }

    pub fn set_resources(
        &mut self,
        proposed: &BTreeMap<String, Number>,
    ) -> Result<Vec<FieldChange>, CoreError> {
        self.apply_edit(SectionKey::Resources, |container| {
            editors::edit_resources(container, proposed)
        })
    }

    pub fn set_buildings(
        &mut self,
        proposed: &BTreeMap<String, BuildingEdit>,
    ) -> Result<Vec<FieldChange>, CoreError> {
        self.apply_edit(SectionKey::Buildings, |container| {
            editors::edit_buildings(container, proposed)
        })
    }

    pub fn edit_inventory(&mut self, edits: &[InventoryEdit]) -> Result<Vec<FieldChange>, CoreError> {
        self.apply_edit(SectionKey::Inventory, |container| {
            editors::edit_inventory(container, edits)
        })
    }

    pub fn edit_equipment(&mut self, edits: &[EquipmentEdit]) -> Result<Vec<FieldChange>, CoreError> {
        self.apply_edit(SectionKey::Equipment, |container| {
            editors::edit_equipment(container, edits)
        })
    }

    pub fn raw_text(&self) -> Result<String, CoreError> {
        self.document.to_text_pretty()
    }

    /// Swap in a document parsed from `text`. On a parse error the current
    /// document is kept and the error is returned for the caller to report.
    pub fn replace_from_text(&mut self, text: &str) -> Result<(), CoreError> {
        let document = SaveDocument::from_text(text).inspect_err(|e| {
            warn!(error = %e, "rejected raw document text; keeping previous document");
        })?;

        if document != self.document {
            info!("replaced document from raw text");
            self.document = document;
            self.modified = true;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CoreError> {
        codec::encode_with(&self.document, &self.options)
    }

    fn container(&self, key: SectionKey) -> Result<&Map<String, Value>, CoreError> {
        locator::locate_section(self.document.root(), key).ok_or_else(|| section_not_found(key))
    }

    fn apply_edit<F>(&mut self, key: SectionKey, edit: F) -> Result<Vec<FieldChange>, CoreError>
    where
        F: FnOnce(&Map<String, Value>) -> Result<EditOutcome, CoreError>,
    {
        let container = locator::locate_mut(self.document.root_mut(), key.as_str(), key.shape())
            .ok_or_else(|| section_not_found(key))?;
        let changes = edit(&*container)?.apply_to(container);

        if !changes.is_empty() {
            info!(section = %key, changes = changes.len(), "applied section edit");
            self.modified = true;
        }
        Ok(changes)
    }
}

fn section_not_found(key: SectionKey) -> CoreError {
    CoreError::new(
        CoreErrorCode::SectionNotFound,
        format!("no {key} found in the save file"),
    )
}
