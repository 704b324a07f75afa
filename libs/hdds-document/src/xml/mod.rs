//! # Markup Loader
//!
//! Builds a [`Document`] from HDDS markup text. The loader checks
//! well-formedness only; schema validation is left to external tooling.
//!
//! Namespace prefixes are stripped from tag names, `xmlns` declarations are
//! dropped, and text content is ignored (HDDS carries all data in
//! attributes).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::document::Document;
use crate::element::{Element, ElementId};
use crate::error::{DocumentError, DocumentResult};

impl Document {
    /// Parse markup text into a document.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use hdds_document::Document;
    ///
    /// let doc = Document::parse_str(
    ///     r#"<HDDS><composition name="HALL"><posXYZ volume="BOXA"/></composition></HDDS>"#,
    /// ).unwrap();
    /// let hall = doc.lookup("HALL").unwrap();
    /// assert_eq!(doc.children(hall).count(), 1);
    /// ```
    pub fn parse_str(source: &str) -> DocumentResult<Document> {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut doc = Document::new();
        let mut open: Vec<ElementId> = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| DocumentError::Xml {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;
            match event {
                Event::Start(ref start) => {
                    let element = read_element(&reader, start)?;
                    let id = doc.insert(open.last().copied(), element)?;
                    open.push(id);
                }
                Event::Empty(ref start) => {
                    let element = read_element(&reader, start)?;
                    doc.insert(open.last().copied(), element)?;
                }
                Event::End(ref end) => {
                    let found = utf8(&reader, end.local_name().as_ref())?;
                    let expected = open
                        .pop()
                        .map(|id| doc.tag(id).to_string())
                        .unwrap_or_default();
                    if expected != found {
                        return Err(DocumentError::UnbalancedTag { expected, found });
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(id) = open.pop() {
            return Err(DocumentError::UnbalancedTag {
                expected: doc.tag(id).to_string(),
                found: String::new(),
            });
        }
        if doc.is_empty() {
            return Err(DocumentError::EmptyDocument);
        }
        debug!(elements = doc.len(), "document loaded");
        Ok(doc)
    }
}

fn read_element(reader: &Reader<&[u8]>, start: &BytesStart) -> DocumentResult<Element> {
    let tag = utf8(reader, start.local_name().as_ref())?;
    let mut element = Element::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| xml_error(reader, e.to_string()))?;
        let key = utf8(reader, attr.key.as_ref())?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| xml_error(reader, e.to_string()))?;
        element.set_attribute(&key, value.into_owned());
    }
    Ok(element)
}

fn utf8(reader: &Reader<&[u8]>, bytes: &[u8]) -> DocumentResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| xml_error(reader, e.to_string()))
}

fn xml_error(reader: &Reader<&[u8]>, message: String) -> DocumentError {
    DocumentError::Xml {
        position: reader.buffer_position() as u64,
        message,
    }
}
