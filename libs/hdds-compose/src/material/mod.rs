//! # Material Resolver
//!
//! Computes the physical properties of material definitions, recursively
//! mixing compound materials from their components.
//!
//! ## Definitions
//!
//! ```xml
//! <element name="Hydrogen" symbol="H" z="1" a="1.00794">
//!   <real name="density" value="0.0708"/>
//! </element>
//! <composite name="Water">
//!   <addmaterial material="Hydrogen"><natoms n="2"/></addmaterial>
//!   <addmaterial material="Oxygen"><natoms n="1"/></addmaterial>
//!   <real name="density" value="1.0" unit="g/cm^3"/>
//! </composite>
//! ```
//!
//! ## Mixing Rules
//!
//! Weight fractions are normalized to sum to one. With `wᵢ` the component
//! weight (`natoms × A` for atom counts, the mass fraction otherwise) and
//! `vᵢ = wᵢ / ρᵢ` its volume share:
//!
//! | Property | Rule |
//! |----------|------|
//! | A, Z | `Σ wᵢ·Xᵢ / Σ wᵢ` |
//! | density | `Σ wᵢ / Σ (wᵢ/ρᵢ)` |
//! | radiation, absorption, collision length | `Σ vᵢ / Σ (vᵢ/Lᵢ)` |
//! | mean energy loss | `Σ vᵢ·dEᵢ / Σ vᵢ` |
//!
//! Values given directly on the definition always win. A length is only
//! derived when every component carries it. Components without a density
//! count towards A and Z only; a compound whose density cannot be derived
//! and is not given fails with a missing density.

use hdds_document::{Document, ElementId};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace};

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};

use crate::attributes;
use crate::error::{TranslateError, TranslateResult};
use crate::units::UnitContext;

// =============================================================================
// TYPES
// =============================================================================

/// Resolved properties of one material definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Substance {
    /// Declared name.
    pub name: String,
    /// Tag of the definition (`element`, `material`, `composite`).
    pub tag: String,
    /// Chemical symbol, if declared.
    pub symbol: Option<String>,
    /// Atomic weight, g/mol.
    pub atomic_weight: f64,
    /// Atomic number.
    pub atomic_number: f64,
    /// Density, g/cm³.
    pub density: f64,
    /// Radiation length, cm. Zero when unknown.
    pub radiation_length: f64,
    /// Nuclear absorption length, cm. Zero when unknown.
    pub absorption_length: f64,
    /// Nuclear collision length, cm. Zero when unknown.
    pub collision_length: f64,
    /// Minimum-ionizing energy loss, MeV/cm. Zero when unknown.
    pub mean_energy_loss: f64,
    /// Ingredients of a compound, in declaration order.
    pub components: Vec<Component>,
}

/// One weighted ingredient of a compound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    /// Definition of the ingredient.
    pub material: ElementId,
    /// Name of the ingredient.
    pub name: String,
    /// Normalized mass fraction.
    pub weight_fraction: f64,
    /// Atoms per molecule, zero for mass-fraction components.
    pub atom_count: u32,
}

/// Mass share of one elementary substance in a flattened compound.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementFraction {
    /// Name of the elementary substance.
    pub name: String,
    /// Atomic weight, g/mol.
    pub atomic_weight: f64,
    /// Atomic number.
    pub atomic_number: f64,
    /// Mass fraction within the compound.
    pub weight: f64,
}

impl Substance {
    fn new(doc: &Document, definition: ElementId) -> Self {
        Self {
            name: doc.name(definition).to_string(),
            tag: doc.tag(definition).to_string(),
            symbol: doc.non_empty_attribute(definition, "symbol").map(str::to_string),
            atomic_weight: 0.0,
            atomic_number: 0.0,
            density: -1.0,
            radiation_length: 0.0,
            absorption_length: 0.0,
            collision_length: 0.0,
            mean_energy_loss: 0.0,
            components: Vec::new(),
        }
    }

    /// Whether the substance is mixed from components.
    pub fn is_compound(&self) -> bool {
        !self.components.is_empty()
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Memoizing resolver for material definitions.
///
/// Each definition is resolved at most once per resolver; structurally
/// identical definitions under different names are resolved separately.
#[derive(Debug, Default)]
pub struct MaterialResolver {
    resolved: HashMap<ElementId, Substance>,
    in_progress: Vec<ElementId>,
}

impl MaterialResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of definitions resolved so far.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether nothing has been resolved yet.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Previously resolved substance of a definition.
    pub fn get(&self, definition: ElementId) -> Option<&Substance> {
        self.resolved.get(&definition)
    }

    /// Resolve a material definition and its components.
    ///
    /// ## Returns
    ///
    /// The memoized substance, or an error if a component is missing or
    /// misused, or the density cannot be determined.
    pub fn resolve(&mut self, doc: &Document, definition: ElementId) -> TranslateResult<&Substance> {
        doc.get(definition)?;
        if self.resolved.contains_key(&definition) {
            return Ok(&self.resolved[&definition]);
        }
        if self.in_progress.contains(&definition) {
            return Err(TranslateError::InvalidComponent {
                material: doc.name(definition).to_string(),
                reason: "material contains itself".to_string(),
            });
        }

        self.in_progress.push(definition);
        let result = stacker::maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            self.mix(doc, definition)
        });
        self.in_progress.pop();

        let substance = result?;
        debug!(
            material = %substance.name,
            a = substance.atomic_weight,
            z = substance.atomic_number,
            density = substance.density,
            components = substance.components.len(),
            "material resolved"
        );
        Ok(self.resolved.entry(definition).or_insert(substance))
    }

    /// Flatten a resolved compound into its elementary substances.
    ///
    /// Components are expanded breadth-first and weights multiplied along
    /// the way. A substance without components yields an empty list.
    pub fn elemental_fractions(&self, definition: ElementId) -> Vec<ElementFraction> {
        let Some(root) = self.resolved.get(&definition) else {
            return Vec::new();
        };
        if !root.is_compound() {
            return Vec::new();
        }

        let mut fractions = Vec::new();
        let mut queue: VecDeque<(f64, &Substance)> = VecDeque::from([(1.0, root)]);
        while let Some((weight, substance)) = queue.pop_front() {
            if substance.is_compound() {
                for component in &substance.components {
                    if let Some(sub) = self.resolved.get(&component.material) {
                        queue.push_back((weight * component.weight_fraction, sub));
                    }
                }
            } else {
                fractions.push(ElementFraction {
                    name: substance.name.clone(),
                    atomic_weight: substance.atomic_weight,
                    atomic_number: substance.atomic_number,
                    weight,
                });
            }
        }
        fractions
    }

    fn mix(&mut self, doc: &Document, definition: ElementId) -> TranslateResult<Substance> {
        let mut substance = Substance::new(doc, definition);
        substance.atomic_weight = attributes::real(doc, definition, "a")?;
        substance.atomic_number = attributes::real(doc, definition, "z")?;

        let children: Vec<ElementId> = doc.children(definition).collect();
        for child in children {
            match doc.tag(child) {
                "real" => read_property(doc, child, &mut substance)?,
                "addmaterial" => {
                    let component = self.read_component(doc, definition, child)?;
                    substance.components.push(component);
                }
                _ => {}
            }
        }

        if substance.is_compound() {
            self.aggregate(&mut substance)?;
        }

        if substance.density < 0.0 {
            return Err(TranslateError::MissingDensity {
                tag: substance.tag,
                material: substance.name,
                atomic_number: substance.atomic_number,
                atomic_weight: substance.atomic_weight,
            });
        }
        Ok(substance)
    }

    fn read_component(
        &mut self,
        doc: &Document,
        compound: ElementId,
        add: ElementId,
    ) -> TranslateResult<Component> {
        let name = doc.attribute(add, "material").unwrap_or("").to_string();
        let target = doc.lookup(&name).ok_or_else(|| TranslateError::UnknownVolume {
            context: format!("addmaterial in \"{}\"", doc.name(compound)),
            name: name.clone(),
        })?;
        let atomic_weight = self.resolve(doc, target)?.atomic_weight;

        let mut component = Component {
            material: target,
            name,
            weight_fraction: 0.0,
            atom_count: 0,
        };
        let mix: Vec<ElementId> = doc.children(add).collect();
        for amount in mix {
            match doc.tag(amount) {
                "natoms" => {
                    if doc.tag(target) != "element" {
                        return Err(TranslateError::InvalidComponent {
                            material: doc.name(compound).to_string(),
                            reason: format!(
                                "natoms can only be specified for elements, \"{}\" is a <{}>",
                                component.name,
                                doc.tag(target)
                            ),
                        });
                    }
                    let n = attributes::integer(doc, amount, "n")?;
                    component.atom_count = u32::try_from(n).map_err(|_| {
                        TranslateError::InvalidComponent {
                            material: doc.name(compound).to_string(),
                            reason: format!("negative atom count {n} for \"{}\"", component.name),
                        }
                    })?;
                    component.weight_fraction = f64::from(component.atom_count) * atomic_weight;
                }
                "fractionmass" => {
                    component.weight_fraction = attributes::real(doc, amount, "fraction")?;
                }
                _ => {}
            }
        }
        trace!(component = %component.name, weight = component.weight_fraction, "component read");
        Ok(component)
    }

    fn aggregate(&self, substance: &mut Substance) -> TranslateResult<()> {
        let name = substance.name.clone();
        let total: f64 = substance.components.iter().map(|c| c.weight_fraction).sum();

        let mut a = Mean::default();
        let mut z = Mean::default();
        let mut density = Harmonic::default();
        let mut radlen = Harmonic::default();
        let mut abslen = Harmonic::default();
        let mut collen = Harmonic::default();
        let mut dedx = Mean::default();

        for component in substance.components.iter_mut() {
            if total > 0.0 {
                component.weight_fraction /= total;
            }
            let sub = self.resolved.get(&component.material).ok_or_else(|| {
                TranslateError::InvalidComponent {
                    material: name.clone(),
                    reason: format!("component \"{}\" is unresolved", component.name),
                }
            })?;

            let weight = if component.atom_count > 0 {
                f64::from(component.atom_count) * sub.atomic_weight
            } else {
                component.weight_fraction
            };
            a.add(weight, sub.atomic_weight);
            z.add(weight, sub.atomic_number);

            // Components without density carry no volume fraction.
            if sub.density <= 0.0 {
                trace!(material = %name, component = %component.name, "component without density skipped");
                continue;
            }
            density.add(weight, sub.density);

            let volume = weight / sub.density;
            radlen.add(volume, sub.radiation_length);
            abslen.add(volume, sub.absorption_length);
            collen.add(volume, sub.collision_length);
            dedx.add(volume, sub.mean_energy_loss);
        }

        if substance.atomic_weight == 0.0 {
            substance.atomic_weight = a.value().unwrap_or(0.0);
        }
        if substance.atomic_number == 0.0 {
            substance.atomic_number = z.value().unwrap_or(0.0);
        }
        if substance.density <= 0.0 {
            if let Some(value) = density.value() {
                substance.density = value;
            }
        }
        if substance.radiation_length == 0.0 {
            substance.radiation_length = radlen.value().unwrap_or(0.0);
        }
        if substance.absorption_length == 0.0 {
            substance.absorption_length = abslen.value().unwrap_or(0.0);
        }
        if substance.collision_length == 0.0 {
            substance.collision_length = collen.value().unwrap_or(0.0);
        }
        if substance.mean_energy_loss == 0.0 {
            substance.mean_energy_loss = dedx.value().unwrap_or(0.0);
        }
        Ok(())
    }
}

fn read_property(doc: &Document, property: ElementId, substance: &mut Substance) -> TranslateResult<()> {
    let units = UnitContext::from_element(doc, property)?;
    let value = attributes::real(doc, property, "value")?;
    match doc.name(property) {
        "density" => substance.density = units.density(value),
        "radlen" => substance.radiation_length = units.length(value),
        "abslen" => substance.absorption_length = units.length(value),
        "collen" => substance.collision_length = units.length(value),
        "dedx" => substance.mean_energy_loss = units.energy_loss(value),
        _ => {}
    }
    Ok(())
}

// =============================================================================
// ACCUMULATORS
// =============================================================================

/// Weighted arithmetic mean.
#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    norm: f64,
}

impl Mean {
    fn add(&mut self, weight: f64, value: f64) {
        self.sum += weight * value;
        self.norm += weight;
    }

    fn value(&self) -> Option<f64> {
        (self.norm > 0.0).then(|| self.sum / self.norm)
    }
}

/// Weighted harmonic mean; undefined once any value is missing.
#[derive(Debug)]
struct Harmonic {
    sum: f64,
    norm: f64,
    complete: bool,
}

impl Default for Harmonic {
    fn default() -> Self {
        Self {
            sum: 0.0,
            norm: 0.0,
            complete: true,
        }
    }
}

impl Harmonic {
    fn add(&mut self, weight: f64, value: f64) {
        if value == 0.0 {
            self.complete = false;
            return;
        }
        self.sum += weight / value;
        self.norm += weight;
    }

    fn value(&self) -> Option<f64> {
        (self.complete && self.sum > 0.0).then(|| self.norm / self.sum)
    }
}
