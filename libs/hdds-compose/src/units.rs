//! # Unit Context
//!
//! Per-element conversion factors into the engine's canonical units.
//!
//! ## Canonical Units
//!
//! | Quantity | Unit |
//! |----------|------|
//! | length   | cm   |
//! | angle    | rad  |
//! | energy   | MeV  |
//! | mass     | g    |
//! | volume   | cm³  |
//!
//! A context is read from one element's `unit_length`, `unit_angle` and
//! `unit` attributes and never inherited: an element without unit attributes
//! is in canonical units.
//!
//! ## Example
//!
//! ```rust
//! use hdds_compose::units::UnitContext;
//! use hdds_document::Document;
//!
//! let doc = Document::parse_str(r#"<posXYZ X_Y_Z="10 0 0" unit_length="mm"/>"#).unwrap();
//! let units = UnitContext::from_element(&doc, doc.root().unwrap()).unwrap();
//! assert_eq!(units.length(10.0), 1.0);
//! ```

use hdds_document::{Document, ElementId};
use std::f64::consts::PI;

use crate::error::{TranslateError, TranslateResult};

/// Conversion factors from one element's units into canonical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitContext {
    length: f64,
    angle: f64,
    energy: f64,
    mass: f64,
    volume: f64,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            length: 1.0,
            angle: 1.0,
            energy: 1.0,
            mass: 1.0,
            volume: 1.0,
        }
    }
}

impl UnitContext {
    /// Read the unit attributes of an element.
    ///
    /// ## Returns
    ///
    /// The element's context, or [`TranslateError::UnknownUnit`] naming the
    /// first token that is not recognized.
    pub fn from_element(doc: &Document, el: ElementId) -> TranslateResult<Self> {
        Self::default().overlay(doc, el)
    }

    /// Apply an element's unit attributes on top of this context.
    ///
    /// Quantities the element does not mention keep their current factor.
    pub fn overlay(self, doc: &Document, el: ElementId) -> TranslateResult<Self> {
        let mut units = self;

        if let Some(token) = doc.non_empty_attribute(el, "unit_length") {
            if !units.apply_length(token) {
                return Err(unknown(doc, el, "length unit", token));
            }
        }

        if let Some(token) = doc.non_empty_attribute(el, "unit_angle") {
            if !units.apply_angle(token) {
                return Err(unknown(doc, el, "angle unit", token));
            }
        }

        if let Some(token) = doc.non_empty_attribute(el, "unit") {
            if !units.apply_combined(token) {
                return Err(unknown(doc, el, "unit", token));
            }
        }

        Ok(units)
    }

    fn apply_length(&mut self, token: &str) -> bool {
        self.length = match token {
            "mm" => 0.1,
            "cm" => 1.0,
            "m" => 100.0,
            _ => return false,
        };
        true
    }

    fn apply_angle(&mut self, token: &str) -> bool {
        self.angle = match token {
            "deg" => PI / 180.0,
            "rad" => 1.0,
            "mrad" => 1.0e-3,
            _ => return false,
        };
        true
    }

    fn apply_combined(&mut self, token: &str) -> bool {
        if self.apply_length(token) || self.apply_angle(token) {
            return true;
        }
        match token {
            "eV" => self.energy = 1.0e-6,
            "KeV" => self.energy = 1.0e-3,
            "MeV" => self.energy = 1.0,
            "GeV" => self.energy = 1.0e3,
            "g/cm^2" => self.mass = 1.0,
            "g/cm^3" => {
                self.mass = 1.0;
                self.volume = 1.0;
            }
            "MeV/g/cm^2" => {
                self.energy = 1.0;
                self.mass = 1.0;
            }
            // Field strengths are accepted but never converted.
            "Tesla" | "kG" | "G" | "percent" | "none" => {}
            _ => return false,
        }
        true
    }

    /// Convert a length to cm.
    pub fn length(&self, value: f64) -> f64 {
        value * self.length
    }

    /// Convert an angle to radians.
    pub fn angle(&self, value: f64) -> f64 {
        value * self.angle
    }

    /// Convert an angle to degrees.
    pub fn to_degrees(&self, value: f64) -> f64 {
        self.angle(value) * 180.0 / PI
    }

    /// Convert a density to g/cm³.
    pub fn density(&self, value: f64) -> f64 {
        value * self.mass / self.volume
    }

    /// Convert a stopping power to MeV/cm.
    pub fn energy_loss(&self, value: f64) -> f64 {
        value * self.energy / self.length
    }
}

fn unknown(doc: &Document, el: ElementId, attribute: &str, token: &str) -> TranslateError {
    TranslateError::UnknownUnit {
        attribute: attribute.to_string(),
        token: token.to_string(),
        tag: doc.tag(el).to_string(),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn units_of(markup: &str) -> TranslateResult<UnitContext> {
        let doc = Document::parse_str(markup).unwrap();
        UnitContext::from_element(&doc, doc.root().unwrap())
    }

    #[test]
    fn test_defaults_are_canonical() {
        let units = units_of("<posXYZ/>").unwrap();
        assert_eq!(units, UnitContext::default());
        assert_eq!(units.length(3.5), 3.5);
        assert_eq!(units.angle(0.25), 0.25);
    }

    #[test]
    fn test_length_and_angle_attributes() {
        let units = units_of(r#"<posXYZ unit_length="m" unit_angle="deg"/>"#).unwrap();
        assert_relative_eq!(units.length(1.5), 150.0);
        assert_relative_eq!(units.angle(90.0), PI / 2.0);
        assert_relative_eq!(units.to_degrees(90.0), 90.0);
    }

    #[test]
    fn test_combined_unit_covers_lengths_and_angles() {
        let units = units_of(r#"<real unit="mm"/>"#).unwrap();
        assert_relative_eq!(units.length(10.0), 1.0);

        let units = units_of(r#"<real unit="mrad"/>"#).unwrap();
        assert_relative_eq!(units.angle(1000.0), 1.0);
    }

    #[test]
    fn test_physical_units() {
        let units = units_of(r#"<real unit="GeV"/>"#).unwrap();
        assert_relative_eq!(units.energy_loss(2.0), 2000.0);

        let units = units_of(r#"<real unit="Tesla"/>"#).unwrap();
        assert_eq!(units, UnitContext::default());

        let units = units_of(r#"<real unit="g/cm^3"/>"#).unwrap();
        assert_relative_eq!(units.density(2.7), 2.7);

        let units = units_of(r#"<real unit="percent"/>"#).unwrap();
        assert_eq!(units, UnitContext::default());
    }

    #[test]
    fn test_energy_loss_uses_length_unit() {
        let units = units_of(r#"<real unit_length="mm" unit="MeV"/>"#).unwrap();
        assert_relative_eq!(units.energy_loss(0.2), 2.0);
    }

    #[test]
    fn test_overlay_keeps_unmentioned_factors() {
        let doc = Document::parse_str(
            r#"<HDDS><mposPhi name="cmd" unit_angle="deg"/><tubs name="ring" unit_length="mm"/></HDDS>"#,
        )
        .unwrap();
        let command = UnitContext::from_element(&doc, doc.lookup("cmd").unwrap()).unwrap();
        let target = command.overlay(&doc, doc.lookup("ring").unwrap()).unwrap();
        assert_relative_eq!(target.to_degrees(45.0), 45.0);
        assert_relative_eq!(target.length(10.0), 1.0);
    }

    #[test]
    fn test_unknown_tokens_are_fatal() {
        let err = units_of(r#"<box unit_length="furlong"/>"#).unwrap_err();
        assert_eq!(
            err,
            TranslateError::UnknownUnit {
                attribute: "length unit".to_string(),
                token: "furlong".to_string(),
                tag: "box".to_string(),
            }
        );

        assert!(units_of(r#"<box unit_angle="grad"/>"#).is_err());
        assert!(units_of(r#"<real unit="barn"/>"#).is_err());
    }
}
