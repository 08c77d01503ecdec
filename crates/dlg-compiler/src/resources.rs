use std::collections::BTreeMap;

use dlg_core::DialogueError;
use dlg_parser::XmlElementNode;

use crate::xml_utils::{element_error, get_optional_attr, get_required_attr};

pub const RESOURCES_TAG: &str = "resources";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    entries: BTreeMap<String, String>,
}

impl ResourceTable {
    pub fn from_element(element: &XmlElementNode) -> Result<Self, DialogueError> {
        let mut entries = BTreeMap::new();
        for entry in element.element_children() {
            let name = get_required_attr(entry, "name")?;
            let text = get_optional_attr(entry, "text").unwrap_or_default();
            if entries.insert(name.clone(), text).is_some() {
                return Err(element_error(
                    "RESOURCE_DUPLICATE",
                    format!("Resource \"{}\" is defined more than once", name),
                    entry,
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(name.into(), text.into());
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn resolve_or_literal(&self, name: &str) -> String {
        self.resolve(name).unwrap_or(name).to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
