//! # Events
//!
//! The flat output of a translation run. Events arrive at the emitter in
//! traversal order; every id an event refers to has been registered by an
//! earlier event, except the parent of the very first placement, which is
//! the top volume.
//!
//! Events serialize with an internal `kind` tag:
//!
//! ```json
//! {"kind":"RotationRegistered","id":1,"matrix":[[...]],"axes":[[90.0,0.0],...]}
//! ```

use glam::DVec3;
use serde::Serialize;

use crate::frame::{DivisionAxis, MagneticField};
use crate::material::{ElementFraction, Substance};

/// One registration or placement instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Event {
    /// A material received an id.
    MaterialRegistered {
        /// Material id.
        id: u32,
        /// Resolved properties.
        substance: Substance,
        /// Elementary make-up of a compound; empty for simple substances.
        elements: Vec<ElementFraction>,
    },

    /// A primitive solid received an id.
    SolidRegistered {
        /// Solid id.
        id: u32,
        /// Volume name.
        name: String,
        /// Shape tag, e.g. `box` or `tubs`.
        shape: String,
        /// Shape attributes in declaration order, `profile` re-based.
        attributes: Vec<(String, String)>,
        /// Id of the solid's material.
        material: u32,
        /// Field tag for tracking.
        magnetic_field: MagneticField,
    },

    /// An orientation received an id.
    RotationRegistered {
        /// Rotation id.
        id: u32,
        /// Orientation matrix, row-major.
        matrix: [[f64; 3]; 3],
        /// `(theta, phi)` in degrees of each rotated axis.
        axes: [(f64, f64); 3],
    },

    /// A container was sliced into equal copies.
    DivisionRegistered {
        /// Division id, shared with the solid namespace.
        id: u32,
        /// Synthesized name, e.g. `sd01`.
        name: String,
        /// Id of the divided container.
        container: u32,
        /// Name of the divided container.
        container_name: String,
        /// Slicing axis.
        axis: DivisionAxis,
        /// Lower edge of the first slice (cm or rad).
        start: f64,
        /// Slice width (cm or rad).
        step: f64,
        /// Number of slices.
        copies: u32,
    },

    /// A solid was placed into a mother volume or division.
    Placement {
        /// Id of the mother solid or division.
        parent: u32,
        /// Name of the mother.
        parent_name: String,
        /// Id of the placed solid.
        child: u32,
        /// Name of the placed solid.
        child_name: String,
        /// Copy number, starting at 1 per solid.
        copy: u32,
        /// Position in the mother, cm.
        translation: DVec3,
        /// Rotation id, `None` for the identity.
        rotation: Option<u32>,
    },
}

impl Event {
    /// Variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::MaterialRegistered { .. } => "MaterialRegistered",
            Event::SolidRegistered { .. } => "SolidRegistered",
            Event::RotationRegistered { .. } => "RotationRegistered",
            Event::DivisionRegistered { .. } => "DivisionRegistered",
            Event::Placement { .. } => "Placement",
        }
    }

    /// Whether the event places a volume.
    pub fn is_placement(&self) -> bool {
        matches!(self, Event::Placement { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = Event::Placement {
            parent: 1,
            parent_name: "HALL".to_string(),
            child: 2,
            child_name: "TARG".to_string(),
            copy: 1,
            translation: DVec3::new(0.0, 0.0, 65.0),
            rotation: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "Placement");
        assert_eq!(json["child_name"], "TARG");
        assert_eq!(json["translation"][2], 65.0);
        assert!(json["rotation"].is_null());
        assert!(event.is_placement());
    }

    #[test]
    fn division_axis_serializes_by_name() {
        let event = Event::DivisionRegistered {
            id: 4,
            name: "sd01".to_string(),
            container: 3,
            container_name: "BCAL".to_string(),
            axis: DivisionAxis::Phi,
            start: -0.1,
            step: 0.2,
            copies: 48,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["axis"], "Phi");
        assert_eq!(event.kind(), "DivisionRegistered");
    }
}
