//! # Item Map
//!
//! Document-scoped index from item id to parent/label/type, built once per
//! document and discarded with it. Exists to make the nearest
//! section/category ancestor lookup O(depth) with O(1) parent hops.

use std::collections::HashMap;

use core_audit::{AuditDocument, ItemNode, ItemType};

#[derive(Debug, Clone)]
struct ItemMeta {
    parent_id: Option<String>,
    label: String,
    item_type: Option<ItemType>,
}

/// Per-document id → {parent, label, type} index.
///
/// Must be rebuilt for each document; ids are only unique within one.
#[derive(Debug, Default)]
pub struct ItemMap {
    entries: HashMap<String, ItemMeta>,
}

impl ItemMap {
    /// Build the index over all header and body items of a document.
    pub fn build(doc: &AuditDocument) -> Self {
        let mut entries = HashMap::new();
        for item in doc.all_items() {
            entries.insert(
                item.item_id.clone(),
                ItemMeta {
                    parent_id: item.parent_id.clone(),
                    label: item.label.clone().unwrap_or_default(),
                    item_type: item.parsed_type(),
                },
            );
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label of the nearest section/category ancestor of `item`, walking
    /// parent links upward. Empty when no such ancestor exists (root-level
    /// items) or a parent link dangles.
    pub fn category_of(&self, item: &ItemNode) -> String {
        let mut current = item.parent_id.as_deref();
        // Hop cap guards against malformed documents with parent cycles.
        let mut remaining = self.entries.len();

        while let Some(id) = current {
            if remaining == 0 {
                break;
            }
            remaining -= 1;

            match self.entries.get(id) {
                Some(meta) => {
                    if meta.item_type.map(|t| t.is_grouping()).unwrap_or(false) {
                        return meta.label.clone();
                    }
                    current = meta.parent_id.as_deref();
                }
                None => break,
            }
        }

        String::new()
    }
}
