//! # HDDS Document
//!
//! In-memory element tree consumed by the geometry composition engine.
//!
//! ## Architecture
//!
//! ```text
//! HDDS markup → hdds-document (Document) → hdds-compose (events) → backend
//! ```
//!
//! Elements live in an arena owned by [`Document`] and are addressed by
//! [`ElementId`] handles. Elements carrying a `name` attribute are indexed so
//! volumes and materials can be looked up from anywhere in the tree, the way
//! schema-declared identifiers work in the markup.
//!
//! ## Example
//!
//! ```rust
//! use hdds_document::Document;
//!
//! let doc = Document::parse_str(r#"<box name="BOXA" X_Y_Z="1 2 3" material="Air"/>"#).unwrap();
//! let id = doc.lookup("BOXA").unwrap();
//! assert_eq!(doc.tag(id), "box");
//! assert_eq!(doc.attribute(id, "X_Y_Z"), Some("1 2 3"));
//! ```

pub mod document;
pub mod element;
pub mod error;
pub mod xml;

pub use document::Document;
pub use element::{Element, ElementId};
pub use error::{DocumentError, DocumentResult};
