//! # Document
//!
//! Arena-backed element tree with lookup by declared name.
//!
//! ## Identifiers
//!
//! Every element carrying a `name` attribute is indexed, except property
//! tags such as `<real name="density" .../>` whose names are local to their
//! parent. Names must be unique among indexed elements.
//!
//! ## Example
//!
//! ```rust
//! use hdds_document::Document;
//!
//! let mut doc = Document::new();
//! let hall = doc.append_element(None, "composition", &[("name", "HALL")]).unwrap();
//! let pos = doc.append_element(Some(hall), "posXYZ", &[("volume", "BOXA")]).unwrap();
//! assert_eq!(doc.lookup("HALL"), Some(hall));
//! assert_eq!(doc.children(hall).collect::<Vec<_>>(), vec![pos]);
//! ```

use std::collections::HashMap;
use tracing::trace;

use crate::element::{Element, ElementId};
use crate::error::{DocumentError, DocumentResult};

/// Tags whose `name` attribute names a property rather than an element.
pub const PROPERTY_TAGS: &[&str] = &["real", "int", "real_array", "int_array", "specify"];

/// In-memory element tree.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
    root: Option<ElementId>,
    index: HashMap<String, ElementId>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements, including synthesized ones.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the document holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The document element, if any.
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Borrow an element.
    ///
    /// Handles are only minted by this document, so a foreign handle is a
    /// programming error and reported as [`DocumentError::UnknownElement`] by
    /// [`Document::get`]; this accessor assumes a valid handle.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    /// Borrow an element, checking the handle.
    pub fn get(&self, id: ElementId) -> DocumentResult<&Element> {
        self.elements
            .get(id.0)
            .ok_or(DocumentError::UnknownElement(id.0))
    }

    /// Tag name of an element.
    pub fn tag(&self, id: ElementId) -> &str {
        self.element(id).tag()
    }

    /// Attribute value of an element.
    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.element(id).attribute(name)
    }

    /// Attribute value, treating an empty string as absent.
    pub fn non_empty_attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.attribute(id, name).filter(|value| !value.trim().is_empty())
    }

    /// The `name` attribute, or an empty string.
    pub fn name(&self, id: ElementId) -> &str {
        self.attribute(id, "name").unwrap_or("")
    }

    /// Child element handles in document order.
    pub fn children(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        self.element(id).children().iter().copied()
    }

    /// Look up an identified element by name.
    pub fn lookup(&self, name: &str) -> Option<ElementId> {
        self.index.get(name).copied()
    }

    /// Create a new element with attributes and attach it.
    ///
    /// ## Parameters
    ///
    /// - `parent`: Element to append to; `None` makes it the document root
    ///   when no root exists yet, and leaves it detached otherwise
    /// - `tag`: Tag name
    /// - `attributes`: Attributes in declaration order
    ///
    /// ## Returns
    ///
    /// Handle of the new element, or [`DocumentError::DuplicateIdentifier`]
    /// when its name is already taken.
    pub fn append_element(
        &mut self,
        parent: Option<ElementId>,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> DocumentResult<ElementId> {
        let mut element = Element::new(tag);
        for (key, value) in attributes {
            element.set_attribute(key, *value);
        }
        self.insert(parent, element)
    }

    /// Set or replace an attribute.
    ///
    /// Renaming an identified element keeps the index in sync.
    pub fn set_attribute(
        &mut self,
        id: ElementId,
        name: &str,
        value: impl Into<String>,
    ) -> DocumentResult<()> {
        self.get(id)?;
        let value = value.into();
        if name == "name" && !self.is_property(id) {
            if let Some(existing) = self.index.get(&value) {
                if *existing != id {
                    return Err(DocumentError::DuplicateIdentifier {
                        name: value,
                        tag: self.tag(id).to_string(),
                    });
                }
            }
            let old = self.name(id).to_string();
            self.index.remove(&old);
            self.index.insert(value.clone(), id);
        }
        self.elements[id.0].set_attribute(name, value);
        Ok(())
    }

    pub(crate) fn insert(
        &mut self,
        parent: Option<ElementId>,
        element: Element,
    ) -> DocumentResult<ElementId> {
        if let Some(parent) = parent {
            self.get(parent)?;
        }
        let id = ElementId(self.elements.len());
        let identified = !PROPERTY_TAGS.contains(&element.tag());
        if identified {
            if let Some(name) = element.attribute("name").filter(|n| !n.is_empty()) {
                if self.index.contains_key(name) {
                    return Err(DocumentError::DuplicateIdentifier {
                        name: name.to_string(),
                        tag: element.tag().to_string(),
                    });
                }
                self.index.insert(name.to_string(), id);
            }
        }
        trace!(tag = element.tag(), %id, "element inserted");
        self.elements.push(element);
        match parent {
            Some(parent) => {
                self.elements[parent.0].push_child(id);
                self.elements[id.0].set_parent(parent);
            }
            None if self.root.is_none() => self.root = Some(id),
            None => {}
        }
        Ok(id)
    }

    fn is_property(&self, id: ElementId) -> bool {
        PROPERTY_TAGS.contains(&self.tag(id))
    }
}
