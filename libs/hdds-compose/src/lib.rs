//! # HDDS Compose
//!
//! Geometry composition engine for HDDS detector descriptions.
//! Translates a tree of nested volumes into a flat, ordered stream of
//! registration and placement events for a simulation backend.
//!
//! ## Architecture
//!
//! ```text
//! hdds-document (Document) → hdds-compose (Composer) → Event stream → Emitter
//! ```
//!
//! ## Components
//!
//! - **Units**: per-element conversion into cm, rad, MeV and g
//! - **Frames**: origin and orientation accumulated down the tree
//! - **Materials**: aggregate properties of compound substances
//! - **Composer**: explicit placements versus divisions, identifier bookkeeping
//!
//! ## Usage
//!
//! ```rust
//! use hdds_compose::{translate, EventLog};
//! use hdds_document::Document;
//!
//! let mut doc = Document::parse_str(r#"
//!   <HDDS>
//!     <element name="Air" z="7.3" a="14.6"><real name="density" value="0.0012"/></element>
//!     <box name="HALL" X_Y_Z="100 100 100" material="Air"/>
//!     <box name="TARG" X_Y_Z="1 1 1" material="Air"/>
//!     <composition name="everything" envelope="HALL">
//!       <posXYZ volume="TARG" X_Y_Z="0 0 65"/>
//!     </composition>
//!   </HDDS>"#).unwrap();
//!
//! let root = doc.lookup("everything").unwrap();
//! let mut log = EventLog::new();
//! let summary = translate(&mut doc, root, &mut log).unwrap();
//! assert_eq!(summary.top_volume.as_deref(), Some("HALL"));
//! assert_eq!(log.of_kind("Placement").count(), 1);
//! ```

mod attributes;
pub mod composer;
pub mod context;
pub mod emitter;
pub mod error;
pub mod event;
pub mod frame;
pub mod material;
pub mod registry;
pub mod units;

pub use composer::{Composed, Composer};
pub use context::{IdentifierList, Summary, TranslationContext};
pub use emitter::{Emitter, EventLog};
pub use error::{TranslateError, TranslateResult};
pub use event::Event;
pub use frame::{DivisionAxis, MagneticField, ReferenceFrame};
pub use material::{MaterialResolver, Substance};

use config::constants::TranslationConfig;
use hdds_document::{Document, ElementId};
use tracing::info;

/// Translate the tree below `root` with the default configuration.
///
/// ## Parameters
///
/// - `document`: Source tree; gains one `division` element per division
/// - `root`: Volume to start from, composed under the identity frame
/// - `emitter`: Receives the event stream once the whole run has succeeded
///
/// ## Returns
///
/// Totals of the run, or the first error. On error the emitter has not
/// seen a single event.
pub fn translate(
    document: &mut Document,
    root: ElementId,
    emitter: &mut dyn Emitter,
) -> TranslateResult<Summary> {
    translate_with_config(document, root, emitter, &TranslationConfig::default())
}

/// Translate the tree below `root` with an explicit configuration.
pub fn translate_with_config(
    document: &mut Document,
    root: ElementId,
    emitter: &mut dyn Emitter,
    config: &TranslationConfig,
) -> TranslateResult<Summary> {
    let mut composer = Composer::new(document, config.clone());
    composer.compose_root(root)?;

    let context = composer.into_context();
    let summary = context.summary();
    for event in context.events() {
        emitter.emit(event)?;
    }

    info!(
        solids = summary.solids,
        divisions = summary.divisions,
        rotations = summary.rotations,
        materials = summary.materials,
        placements = summary.placements,
        top_volume = summary.top_volume.as_deref().unwrap_or(""),
        "translation finished"
    );
    Ok(summary)
}

/// Translate the volume named by `config.root_volume`.
pub fn translate_document(
    document: &mut Document,
    emitter: &mut dyn Emitter,
    config: &TranslationConfig,
) -> TranslateResult<Summary> {
    let root = document
        .lookup(&config.root_volume)
        .ok_or_else(|| TranslateError::UnknownVolume {
            context: "root volume".to_string(),
            name: config.root_volume.clone(),
        })?;
    translate_with_config(document, root, emitter, config)
}
