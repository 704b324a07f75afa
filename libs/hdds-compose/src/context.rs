//! # Translation Context
//!
//! All mutable state of one translation run: identifier counters, the
//! material resolver, per-element side tables and the buffered event stream.
//!
//! Side tables are keyed by [`ElementId`] instead of being written back into
//! the document as attributes, so the input tree only ever gains the
//! synthetic `division` elements.

use config::constants::TranslationConfig;
use glam::DVec3;
use hdds_document::{Document, ElementId};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{TranslateError, TranslateResult};
use crate::event::Event;
use crate::frame::{ReferenceFrame, RotationState, VolumeIdentifier};
use crate::material::MaterialResolver;
use crate::registry::Registries;

/// Placement of a registered solid that the caller still has to emit.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPlacement {
    /// Placed solid.
    pub child: ElementId,
    /// Mother volume or division.
    pub mother: ElementId,
    /// Copy number of the child.
    pub copy: u32,
    /// Position in the mother.
    pub translation: DVec3,
    /// Registered rotation, `None` for the identity.
    pub rotation: Option<u32>,
}

/// Per-copy values of one identifier field on a solid or division.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierList {
    /// Name of the solid or division.
    pub volume: String,
    /// Field name.
    pub field: String,
    /// Value of the field for copy `i + 1`; zero where a copy carried none.
    pub values: Vec<i64>,
}

/// Totals of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Solids registered, divisions included.
    pub solids: u32,
    /// Divisions registered.
    pub divisions: u32,
    /// Rotations registered.
    pub rotations: u32,
    /// Materials registered.
    pub materials: u32,
    /// Placement events.
    pub placements: usize,
    /// Mother of the first placement, the world volume of the output.
    pub top_volume: Option<String>,
    /// Identifier field names in order of first appearance.
    pub identifier_fields: Vec<String>,
    /// Identifier values, in document order of the volumes, then by field.
    pub identifiers: Vec<IdentifierList>,
}

/// Mutable state of one run.
#[derive(Debug)]
pub struct TranslationContext {
    config: TranslationConfig,
    registries: Registries,
    materials: MaterialResolver,
    material_ids: HashMap<ElementId, u32>,
    solid_ids: HashMap<ElementId, u32>,
    names: HashMap<ElementId, String>,
    copies: HashMap<ElementId, u32>,
    divides: HashMap<ElementId, String>,
    contains: HashMap<ElementId, ElementId>,
    identifier_lists: HashMap<(ElementId, String), Vec<i64>>,
    events: Vec<Event>,
    divisions: u32,
    placements: usize,
    top_volume: Option<String>,
}

impl TranslationContext {
    /// Fresh state for a run driven by `config`.
    pub fn new(config: TranslationConfig) -> Self {
        Self {
            config,
            registries: Registries::new(),
            materials: MaterialResolver::new(),
            material_ids: HashMap::new(),
            solid_ids: HashMap::new(),
            names: HashMap::new(),
            copies: HashMap::new(),
            divides: HashMap::new(),
            contains: HashMap::new(),
            identifier_lists: HashMap::new(),
            events: Vec::new(),
            divisions: 0,
            placements: 0,
            top_volume: None,
        }
    }

    /// Settings of the run.
    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Identifier counters.
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub(crate) fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    /// Material resolver with everything resolved so far.
    pub fn materials(&self) -> &MaterialResolver {
        &self.materials
    }

    /// Buffered events in traversal order.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Take the buffered events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Registered material id of a definition.
    pub fn material_id(&self, definition: ElementId) -> Option<u32> {
        self.material_ids.get(&definition).copied()
    }

    /// Registered solid or division id of an element.
    pub fn solid_id(&self, el: ElementId) -> Option<u32> {
        self.solid_ids.get(&el).copied()
    }

    /// Copies of a solid placed so far, `None` before registration.
    pub fn copies(&self, el: ElementId) -> Option<u32> {
        self.copies.get(&el).copied()
    }

    /// Shape a composition fills because it was placed into a division.
    pub fn divides(&self, el: ElementId) -> Option<&str> {
        self.divides.get(&el).map(String::as_str)
    }

    /// Content element an envelope has been claimed by.
    pub fn envelope_content(&self, envelope: ElementId) -> Option<ElementId> {
        self.contains.get(&envelope).copied()
    }

    /// Accumulated values of an identifier field on a solid or division.
    pub fn identifier_list(&self, el: ElementId, field: &str) -> &[i64] {
        self.identifier_lists
            .get(&(el, field.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Totals of the run so far.
    pub fn summary(&self) -> Summary {
        let (solids, rotations, materials) = self.registries.counts();
        Summary {
            solids,
            divisions: self.divisions,
            rotations,
            materials,
            placements: self.placements,
            top_volume: self.top_volume.clone(),
            identifier_fields: self.registries.fields().to_vec(),
            identifiers: self.identifiers(),
        }
    }

    fn identifiers(&self) -> Vec<IdentifierList> {
        let mut keys: Vec<&(ElementId, String)> = self.identifier_lists.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| IdentifierList {
                volume: self.names.get(&key.0).cloned().unwrap_or_default(),
                field: key.1.clone(),
                values: self.identifier_lists[key].clone(),
            })
            .collect()
    }

    pub(crate) fn set_divides(&mut self, el: ElementId, shape: &str) {
        self.divides.insert(el, shape.to_string());
    }

    pub(crate) fn claim_envelope(&mut self, envelope: ElementId, content: ElementId) {
        self.contains.insert(envelope, content);
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    /// Register a material definition and any unregistered components.
    ///
    /// The definition takes its id before its components, but component
    /// events are emitted first.
    pub fn register_material(&mut self, doc: &Document, definition: ElementId) -> TranslateResult<u32> {
        if let Some(id) = self.material_id(definition) {
            return Ok(id);
        }
        let id = self.registries.next_material();
        self.material_ids.insert(definition, id);

        let substance = self.materials.resolve(doc, definition)?.clone();
        for component in &substance.components {
            if self.material_id(component.material).is_none() {
                self.register_material(doc, component.material)?;
            }
        }

        let elements = self.materials.elemental_fractions(definition);
        debug!(id, material = %substance.name, compound = substance.is_compound(), "material registered");
        self.events.push(Event::MaterialRegistered {
            id,
            substance,
            elements,
        });
        Ok(id)
    }

    /// Register a primitive solid, its material first.
    pub(crate) fn register_solid(
        &mut self,
        doc: &Document,
        el: ElementId,
        frame: &ReferenceFrame,
        attributes: Vec<(String, String)>,
    ) -> TranslateResult<u32> {
        let name = doc.name(el).to_string();
        let material_name = doc.attribute(el, "material").unwrap_or("");
        let definition = doc.lookup(material_name).ok_or_else(|| TranslateError::UnknownVolume {
            context: format!("material of \"{name}\""),
            name: material_name.to_string(),
        })?;
        let material = self.register_material(doc, definition)?;

        let id = self.registries.next_solid();
        self.solid_ids.insert(el, id);
        self.names.insert(el, name.clone());
        self.copies.insert(el, 0);
        debug!(id, volume = %name, shape = doc.tag(el), material, "solid registered");
        self.events.push(Event::SolidRegistered {
            id,
            name,
            shape: doc.tag(el).to_string(),
            attributes,
            material,
            magnetic_field: frame.magnetic_field,
        });
        Ok(id)
    }

    /// Resolve the frame's rotation to an id, registering it when dirty.
    pub(crate) fn register_rotation(&mut self, frame: &mut ReferenceFrame) -> Option<u32> {
        match frame.rotation {
            RotationState::Identity => None,
            RotationState::Registered(id) => Some(id),
            RotationState::Dirty => {
                let id = self.registries.next_rotation();
                frame.rotation = RotationState::Registered(id);
                debug!(id, "rotation registered");
                self.events.push(Event::RotationRegistered {
                    id,
                    matrix: frame.rows(),
                    axes: frame.axis_angles(),
                });
                Some(id)
            }
        }
    }

    /// Give a synthetic division element its id and copy count.
    pub(crate) fn register_division(&mut self, division: ElementId, name: &str, copies: u32) -> u32 {
        let id = self.registries.next_solid();
        self.solid_ids.insert(division, id);
        self.names.insert(division, name.to_string());
        self.copies.insert(division, copies);
        self.divisions += 1;
        id
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Emit a placement event for a pending placement.
    pub(crate) fn place(&mut self, doc: &Document, pending: PendingPlacement) -> TranslateResult<()> {
        let parent = self.registered_id(doc, pending.mother)?;
        let child = self.registered_id(doc, pending.child)?;
        let parent_name = doc.name(pending.mother).to_string();
        if self.top_volume.is_none() {
            self.top_volume = Some(parent_name.clone());
        }
        self.placements += 1;
        self.events.push(Event::Placement {
            parent,
            parent_name,
            child,
            child_name: doc.name(pending.child).to_string(),
            copy: pending.copy,
            translation: pending.translation,
            rotation: pending.rotation,
        });
        Ok(())
    }

    fn registered_id(&self, doc: &Document, el: ElementId) -> TranslateResult<u32> {
        self.solid_id(el).ok_or_else(|| TranslateError::UnknownVolume {
            context: "placement".to_string(),
            name: doc.name(el).to_string(),
        })
    }

    // =========================================================================
    // IDENTIFIERS
    // =========================================================================

    pub(crate) fn set_copies(&mut self, el: ElementId, copy: u32) {
        self.copies.insert(el, copy);
    }

    pub(crate) fn set_identifier_list(&mut self, el: ElementId, field: &str, values: Vec<i64>) {
        self.identifier_lists.insert((el, field.to_string()), values);
    }

    /// Append the frame's identifier values to a solid's lists.
    ///
    /// Copies that did not carry a field are padded with zeros: with `copy`
    /// the solid's copy number and `k` the values already recorded,
    /// `max(copy − k − 1, 0)` zeros precede the new value.
    pub(crate) fn stamp_identifiers(&mut self, el: ElementId, copy: u32, identifiers: &[VolumeIdentifier]) {
        for identifier in identifiers {
            let list = self
                .identifier_lists
                .entry((el, identifier.field.clone()))
                .or_default();
            let missing = i64::from(copy) - list.len() as i64;
            for _ in 1..missing {
                list.push(0);
            }
            list.push(identifier.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier(field: &str, value: i64) -> VolumeIdentifier {
        VolumeIdentifier {
            field: field.to_string(),
            value,
            step: 1,
        }
    }

    #[test]
    fn identifiers_are_padded_for_missing_copies() {
        let mut doc = Document::new();
        let el = doc.append_element(None, "box", &[("name", "CELL")]).unwrap();
        let mut context = TranslationContext::new(TranslationConfig::default());

        context.stamp_identifiers(el, 1, &[identifier("column", 7)]);
        context.stamp_identifiers(el, 4, &[identifier("column", 9)]);
        assert_eq!(context.identifier_list(el, "column"), &[7, 0, 0, 9]);

        context.stamp_identifiers(el, 2, &[identifier("row", 5)]);
        assert_eq!(context.identifier_list(el, "row"), &[0, 5]);
        assert!(context.identifier_list(el, "sector").is_empty());
    }

    #[test]
    fn identity_rotation_is_not_registered() {
        let mut context = TranslationContext::new(TranslationConfig::default());
        let mut frame = ReferenceFrame::default();
        assert_eq!(context.register_rotation(&mut frame), None);
        assert!(context.events().is_empty());

        frame.rotate(DVec3::new(0.0, 0.0, 1.0));
        assert_eq!(context.register_rotation(&mut frame), Some(1));
        assert_eq!(frame.rotation, RotationState::Registered(1));
        assert_eq!(context.register_rotation(&mut frame), Some(1));
        assert_eq!(context.events().len(), 1);
    }

    #[test]
    fn materials_register_components_first() {
        let doc = Document::parse_str(
            r#"<materials>
                 <element name="H" z="1" a="1"><real name="density" value="0.07"/></element>
                 <element name="O" z="8" a="16"><real name="density" value="1.1"/></element>
                 <composite name="Water">
                   <addmaterial material="H"><natoms n="2"/></addmaterial>
                   <addmaterial material="O"><natoms n="1"/></addmaterial>
                   <real name="density" value="1.0"/>
                 </composite>
               </materials>"#,
        )
        .unwrap();
        let mut context = TranslationContext::new(TranslationConfig::default());
        let water = doc.lookup("Water").unwrap();

        assert_eq!(context.register_material(&doc, water).unwrap(), 1);
        assert_eq!(context.register_material(&doc, water).unwrap(), 1);
        assert_eq!(context.material_id(doc.lookup("H").unwrap()), Some(2));
        assert_eq!(context.material_id(doc.lookup("O").unwrap()), Some(3));

        let order: Vec<u32> = context
            .events()
            .iter()
            .filter_map(|event| match event {
                Event::MaterialRegistered { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
    }
}
