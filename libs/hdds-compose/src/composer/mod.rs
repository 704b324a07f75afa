//! # Volume Composer
//!
//! Walks the volume tree and turns it into registration and placement
//! events.
//!
//! ## Traversal
//!
//! ```text
//! place_volume(el, frame)
//!   └─ compose_volume(el, frame) → Composed { solid, copy, pending }
//!        ├─ envelope?     place the envelope, continue inside it
//!        ├─ composition   run each placement command → place_volume(target, derived frame)
//!        └─ primitive     register material + solid, return pending placement
//!   └─ emit the pending placement, if any
//! ```
//!
//! A primitive cannot place itself: its mother is only final once the
//! enclosing recursion has returned, so the placement travels back to the
//! caller in [`Composed::pending`].

mod division;
mod placement;

use config::constants::{
    approx_zero, TranslationConfig, STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES,
};
use hdds_document::{Document, ElementId};
use tracing::{trace, warn};

use crate::attributes;
use crate::context::{PendingPlacement, TranslationContext};
use crate::error::{TranslateError, TranslateResult};
use crate::frame::{MagneticField, ReferenceFrame};
use crate::units::UnitContext;

pub use placement::COMMANDS;

/// Result of composing one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Composed {
    /// Solid the element resolved to: itself for primitives, the envelope
    /// for enveloped compositions.
    pub solid: Option<u32>,
    /// Copy number of that solid.
    pub copy: u32,
    /// Placement the caller must emit.
    pub pending: Option<PendingPlacement>,
}

/// Driver of one translation run.
///
/// The document is borrowed mutably because divisions are materialized as
/// synthetic `division` elements under the container they slice.
pub struct Composer<'d> {
    doc: &'d mut Document,
    context: TranslationContext,
    depth: usize,
}

impl<'d> Composer<'d> {
    /// Start a run over `doc`.
    pub fn new(doc: &'d mut Document, config: TranslationConfig) -> Self {
        Self {
            doc,
            context: TranslationContext::new(config),
            depth: 0,
        }
    }

    /// The document being translated.
    pub fn document(&self) -> &Document {
        &*self.doc
    }

    /// State accumulated so far.
    pub fn context(&self) -> &TranslationContext {
        &self.context
    }

    /// Finish the run, handing back its state.
    pub fn into_context(self) -> TranslationContext {
        self.context
    }

    /// Compose the root volume under the identity frame.
    pub fn compose_root(&mut self, root: ElementId) -> TranslateResult<u32> {
        self.place_volume(root, &ReferenceFrame::default())
    }

    /// Compose an element and emit its placement.
    ///
    /// ## Returns
    ///
    /// Copy number of the solid the element resolved to.
    pub fn place_volume(&mut self, el: ElementId, frame: &ReferenceFrame) -> TranslateResult<u32> {
        let composed = self.compose_volume(el, frame)?;
        if let Some(pending) = composed.pending {
            self.context.place(self.doc, pending)?;
        }
        Ok(composed.copy)
    }

    /// Compose an element under `frame` without emitting its placement.
    pub fn compose_volume(&mut self, el: ElementId, frame: &ReferenceFrame) -> TranslateResult<Composed> {
        self.doc.get(el)?;
        let limit = self.context.config().max_depth;
        if self.depth >= limit {
            return Err(TranslateError::RecursionLimit {
                volume: self.doc.name(el).to_string(),
                limit,
            });
        }

        self.depth += 1;
        let result = stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            self.compose_element(el, frame)
        });
        self.depth -= 1;
        result
    }

    fn compose_element(&mut self, el: ElementId, frame: &ReferenceFrame) -> TranslateResult<Composed> {
        let name = self.doc.name(el).to_string();
        let tag = self.doc.tag(el).to_string();
        trace!(volume = %name, %tag, depth = self.depth, origin = ?frame.origin, "composing");

        match tag.as_str() {
            "union" | "intersection" | "subtraction" => {
                return Err(TranslateError::BooleanSolid { tag, volume: name });
            }
            "stackX" | "stackY" | "stackZ" => {
                return Err(TranslateError::StackedContainer { tag, volume: name });
            }
            _ => {}
        }

        let mut local = frame.clone();
        if let Some(field) = MagneticField::from_volume_name(&name) {
            local.magnetic_field = field;
        }

        let mut copy = 0;
        let envelope = match self.doc.non_empty_attribute(el, "envelope") {
            Some(envelope_name) => {
                let envelope_name = envelope_name.to_string();
                let env = self.lookup(&envelope_name, || format!("envelope of \"{name}\""))?;
                match self.context.envelope_content(env) {
                    Some(content) if content == el => {
                        let copy = self.place_volume(env, &local)?;
                        return Ok(Composed {
                            solid: self.context.solid_id(env),
                            copy,
                            pending: None,
                        });
                    }
                    Some(content) => {
                        return Err(TranslateError::EnvelopeReuse {
                            envelope: envelope_name,
                            contains: self.doc.name(content).to_string(),
                            volume: name,
                        });
                    }
                    None => {
                        self.context.claim_envelope(env, el);
                        copy = self.place_volume(env, &local)?;
                        local.identifiers.clear();
                        local.mother = Some(env);
                        local.reset();
                        Some(env)
                    }
                }
            }
            None => None,
        };

        if tag == "composition" {
            self.compose_children(el, envelope, &local)?;
            return Ok(Composed {
                solid: envelope.and_then(|env| self.context.solid_id(env)),
                copy,
                pending: None,
            });
        }

        self.compose_primitive(el, local)
    }

    fn compose_children(
        &mut self,
        el: ElementId,
        envelope: Option<ElementId>,
        frame: &ReferenceFrame,
    ) -> TranslateResult<()> {
        let commands: Vec<ElementId> = self.doc.children(el).collect();
        if commands.is_empty() {
            warn!(volume = self.doc.name(el), "composition places nothing");
        }

        let container = match envelope {
            Some(env) => Some(self.doc.tag(env).to_string()),
            None => self.context.divides(el).map(str::to_string),
        };
        let scope = placement::Scope {
            volume: self.doc.name(el).to_string(),
            siblings: commands.len(),
            container,
            frame: frame.clone(),
        };

        for command in commands {
            let command = placement::Command::read(self.doc, &mut self.context, command, &scope)?;
            self.run_command(&command, &scope)?;
        }
        Ok(())
    }

    fn compose_primitive(&mut self, el: ElementId, mut frame: ReferenceFrame) -> TranslateResult<Composed> {
        let mut copy = match self.context.copies(el) {
            Some(copy) => copy,
            None => {
                let attributes = self.shape_attributes(el, &frame)?;
                self.context.register_solid(self.doc, el, &frame, attributes)?;
                0
            }
        };

        let mut pending = None;
        if let Some(mother) = frame.mother {
            let rotation = self.context.register_rotation(&mut frame);
            copy += 1;
            pending = Some(PendingPlacement {
                child: el,
                mother,
                copy,
                translation: frame.origin,
                rotation,
            });
        }

        self.context.set_copies(el, copy);
        self.context.stamp_identifiers(el, copy, &frame.identifiers);
        Ok(Composed {
            solid: self.context.solid_id(el),
            copy,
            pending,
        })
    }

    /// Attributes of a primitive as reported with its registration.
    ///
    /// A `profile` (start and span angle) of a solid sitting on the beam axis
    /// is re-based by the azimuthal offset of the enclosing division.
    fn shape_attributes(&self, el: ElementId, frame: &ReferenceFrame) -> TranslateResult<Vec<(String, String)>> {
        let mut attributes: Vec<(String, String)> = self
            .doc
            .element(el)
            .attributes()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        let tolerance = self.context.config().tolerance;
        if !approx_zero(frame.phi_offset)
            && frame.is_on_axis(tolerance)
            && self.doc.non_empty_attribute(el, "profile").is_some()
        {
            let [phi0, dphi] = attributes::reals::<2>(self.doc, el, "profile")?;
            let units = UnitContext::from_element(self.doc, el)?;
            let offset = frame.phi_offset / units.angle(1.0);
            let rebased = format!("{} {}", phi0 - offset, dphi);
            trace!(volume = self.doc.name(el), profile = %rebased, "profile re-based");
            for (key, value) in attributes.iter_mut() {
                if key == "profile" {
                    *value = rebased.clone();
                }
            }
        }
        Ok(attributes)
    }

    fn lookup(&self, name: &str, context: impl FnOnce() -> String) -> TranslateResult<ElementId> {
        self.doc.lookup(name).ok_or_else(|| TranslateError::UnknownVolume {
            context: context(),
            name: name.to_string(),
        })
    }
}
