//! # Elements
//!
//! Arena nodes of a [`crate::Document`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-owning handle to an element of a [`crate::Document`].
///
/// Handles are plain indices; they stay valid for the lifetime of the
/// document because elements are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Position of the element in the document arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One markup element: a tag, ordered attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<ElementId>,
    parent: Option<ElementId>,
}

impl Element {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Tag name without namespace prefix.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value, if the attribute is present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Child handles in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// Enclosing element, `None` for the root and for detached elements.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub(crate) fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub(crate) fn push_child(&mut self, child: ElementId) {
        self.children.push(child);
    }

    pub(crate) fn set_parent(&mut self, parent: ElementId) {
        self.parent = Some(parent);
    }
}
