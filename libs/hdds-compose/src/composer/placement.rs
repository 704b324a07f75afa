//! Placement commands of a composition.
//!
//! | Command | Placement |
//! |---------|-----------|
//! | `posXYZ` | one copy at `X_Y_Z` |
//! | `posRPhiZ` | one copy at `R_Phi_Z`, offset `S` perpendicular to the radius |
//! | `mposPhi` | `ncopy` copies around the beam axis from `Phi0` in steps of `dPhi` |
//! | `mposR` | `ncopy` copies outwards from `R0` in steps of `dR` |
//! | `mposX` | `ncopy` copies along x from `X0` in steps of `dX` |
//! | `mposY` | `ncopy` copies along y from `Y0` in steps of `dY` |
//! | `mposZ` | `ncopy` copies along z from `Z0` in steps of `dZ` |
//!
//! Repeated forms become a single division instead when the command is
//! the only one in its composition, declares no rotation and the container
//! has a shape the slicing axis applies to.

use config::constants::approx_zero;
use glam::DVec3;
use hdds_document::{Document, ElementId};
use std::f64::consts::PI;
use tracing::trace;

use super::Composer;
use crate::attributes;
use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::frame::{DivisionAxis, Partition, ReferenceFrame, VolumeIdentifier};
use crate::units::UnitContext;

/// Tags accepted inside a composition.
pub const COMMANDS: &[&str] = &[
    "posXYZ", "posRPhiZ", "mposPhi", "mposR", "mposX", "mposY", "mposZ",
];

const CYLINDRICAL: &[&str] = &["pcon", "cons", "tubs"];
const CARTESIAN: &[&str] = &["box"];

/// The composition a command belongs to.
pub(super) struct Scope {
    /// Name of the composition.
    pub volume: String,
    /// Number of commands in the composition.
    pub siblings: usize,
    /// Shape enclosing the composition: its envelope, or the shape it
    /// divides.
    pub container: Option<String>,
    /// Frame inside the composition.
    pub frame: ReferenceFrame,
}

/// A parsed placement command.
pub(super) struct Command {
    pub element: ElementId,
    pub tag: String,
    pub target: ElementId,
    pub units: UnitContext,
    pub angle: DVec3,
    /// Frame for the target, carrying the command's identifiers.
    pub frame: ReferenceFrame,
}

impl Command {
    /// Read the parts every command shares: unit context, target, `rot` and
    /// `identifier` children.
    pub fn read(
        doc: &Document,
        context: &mut TranslationContext,
        element: ElementId,
        scope: &Scope,
    ) -> TranslateResult<Self> {
        let tag = doc.tag(element).to_string();
        if !COMMANDS.contains(&tag.as_str()) {
            return Err(TranslateError::UnknownCommand {
                volume: scope.volume.clone(),
                tag,
            });
        }

        let units = UnitContext::from_element(doc, element)?;
        let target_name = doc.attribute(element, "volume").unwrap_or("");
        let target = doc.lookup(target_name).ok_or_else(|| TranslateError::UnknownVolume {
            context: format!("<{tag}> in \"{}\"", scope.volume),
            name: target_name.to_string(),
        })?;

        let [rx, ry, rz] = attributes::reals::<3>(doc, element, "rot")?;
        let angle = DVec3::new(units.angle(rx), units.angle(ry), units.angle(rz));

        let mut frame = scope.frame.clone();
        for ident in doc.children(element) {
            if doc.tag(ident) != "identifier" {
                continue;
            }
            let field = doc.attribute(ident, "field").unwrap_or("").to_string();
            context.registries_mut().record_field(&field);
            frame.identifiers.push(VolumeIdentifier {
                value: attributes::integer(doc, ident, "value")?,
                step: attributes::integer(doc, ident, "step")?,
                field,
            });
        }

        Ok(Self {
            element,
            tag,
            target,
            units,
            angle,
            frame,
        })
    }

    fn length(&self, doc: &Document, attribute: &str) -> TranslateResult<f64> {
        Ok(self.units.length(attributes::real(doc, self.element, attribute)?))
    }

    fn copies(&self, doc: &Document, scope: &Scope) -> TranslateResult<u32> {
        let count = attributes::integer(doc, self.element, "ncopy")?;
        u32::try_from(count)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| TranslateError::InvalidCopyCount {
                volume: scope.volume.clone(),
                count,
            })
    }

    fn implied_rotation(&self, doc: &Document) -> bool {
        attributes::flag(doc, self.element, "impliedRot")
    }

    /// Whether a repeated placement may become a division.
    fn divisible(&self, scope: &Scope, shapes: Option<&[&str]>) -> bool {
        let Some(container) = scope.container.as_deref() else {
            return false;
        };
        self.angle == DVec3::ZERO
            && scope.siblings == 1
            && self.frame.mother.is_some()
            && shapes.map_or(!container.is_empty(), |shapes| shapes.contains(&container))
    }
}

/// Step every identifier to the next copy.
fn advance_identifiers(identifiers: &mut [VolumeIdentifier], volume: &str) -> TranslateResult<()> {
    for identifier in identifiers.iter_mut() {
        identifier.value = identifier
            .value
            .checked_add(identifier.step)
            .ok_or_else(|| TranslateError::IdentifierOverflow {
                volume: volume.to_string(),
                field: identifier.field.clone(),
            })?;
    }
    Ok(())
}

/// Values of an identifier for `copies` consecutive copies.
pub(super) fn identifier_values(
    identifier: &VolumeIdentifier,
    copies: u32,
    volume: &str,
) -> TranslateResult<Vec<i64>> {
    (0..i64::from(copies))
        .map(|i| {
            i.checked_mul(identifier.step)
                .and_then(|offset| identifier.value.checked_add(offset))
                .ok_or_else(|| TranslateError::IdentifierOverflow {
                    volume: volume.to_string(),
                    field: identifier.field.clone(),
                })
        })
        .collect()
}

/// Position `(r, s)` in polar coordinates: `r` along the radius at `phi`,
/// `s` perpendicular to it.
fn polar(r: f64, s: f64, phi: f64, z: f64) -> DVec3 {
    let (sin, cos) = phi.sin_cos();
    DVec3::new(r * cos - s * sin, r * sin + s * cos, z)
}

impl Composer<'_> {
    pub(super) fn run_command(&mut self, command: &Command, scope: &Scope) -> TranslateResult<()> {
        trace!(command = %command.tag, volume = %scope.volume, target = self.doc.name(command.target), "placement command");
        match command.tag.as_str() {
            "posXYZ" => self.pos_xyz(command),
            "posRPhiZ" => self.pos_rphiz(command),
            "mposPhi" => self.mpos_phi(command, scope),
            "mposR" => self.mpos_r(command, scope),
            "mposX" => self.mpos_x(command, scope),
            "mposY" => self.mpos_y(command, scope),
            "mposZ" => self.mpos_z(command, scope),
            _ => Err(TranslateError::UnknownCommand {
                volume: scope.volume.clone(),
                tag: command.tag.clone(),
            }),
        }
    }

    fn pos_xyz(&mut self, command: &Command) -> TranslateResult<()> {
        let [x, y, z] = attributes::reals::<3>(self.doc, command.element, "X_Y_Z")?;
        let units = &command.units;
        let mut frame = command.frame.clone();
        frame.shift(DVec3::new(units.length(x), units.length(y), units.length(z)));
        frame.rotate(command.angle);
        self.place_volume(command.target, &frame)?;
        Ok(())
    }

    fn pos_rphiz(&mut self, command: &Command) -> TranslateResult<()> {
        let doc = &*self.doc;
        let [r, phi, z] = attributes::reals::<3>(doc, command.element, "R_Phi_Z")?;
        let units = &command.units;
        let phi = units.angle(phi);
        let s = command.length(doc, "S")?;
        let origin = polar(units.length(r), s, phi, units.length(z));

        let mut angle = command.angle;
        if command.implied_rotation(doc) && !approx_zero(phi) {
            angle.z += phi;
        }
        let mut frame = command.frame.clone();
        frame.shift(origin);
        frame.rotate(angle);
        self.place_volume(command.target, &frame)?;
        Ok(())
    }

    fn mpos_phi(&mut self, command: &Command, scope: &Scope) -> TranslateResult<()> {
        let doc = &*self.doc;
        let units = command.units;
        let copies = command.copies(doc, scope)?;
        let mut phi0 = units.angle(attributes::real(doc, command.element, "Phi0")?);
        let dphi = match attributes::optional_real(doc, command.element, "dPhi")? {
            Some(dphi) => units.angle(dphi),
            None => 2.0 * PI / f64::from(copies),
        };
        let [r, z] = attributes::reals::<2>(doc, command.element, "R_Z")?;
        let (r, z) = (units.length(r), units.length(z));
        let s = command.length(doc, "S")?;
        let implied = command.implied_rotation(doc);

        if implied && command.divisible(scope, Some(CYLINDRICAL)) {
            let mut frame = command.frame.clone();
            if approx_zero(r) {
                if let Some(offset) = self.profile_offset(command.target, &units)? {
                    frame.phi_offset = offset;
                    phi0 += offset;
                }
            }
            let start = phi0 - dphi / 2.0 - scope.frame.phi_offset;
            return self.divide(
                command,
                scope,
                frame,
                Partition {
                    axis: DivisionAxis::Phi,
                    start,
                    step: dphi,
                    copies,
                    division: None,
                },
                DVec3::new(r, s, z),
                DVec3::ZERO,
            );
        }

        let mut angle = command.angle;
        self.repeat(command, copies, |inst, base, frame| {
            let phi = phi0 + f64::from(inst) * dphi;
            frame.shift_from(base, polar(r, s, phi, z));
            if implied {
                angle.z += if inst == 0 { phi0 } else { dphi };
                frame.rotate_from(base, angle);
            }
        })
    }

    fn mpos_r(&mut self, command: &Command, scope: &Scope) -> TranslateResult<()> {
        let doc = &*self.doc;
        let units = command.units;
        let copies = command.copies(doc, scope)?;
        let r0 = command.length(doc, "R0")?;
        let dr = command.length(doc, "dR")?;
        let [z, phi] = attributes::reals::<2>(doc, command.element, "Z_Phi")?;
        let (z, phi) = (units.length(z), units.angle(phi));
        let s = command.length(doc, "S")?;

        if command.divisible(scope, Some(CYLINDRICAL)) {
            return self.divide(
                command,
                scope,
                command.frame.clone(),
                Partition {
                    axis: DivisionAxis::Rho,
                    start: r0 - dr / 2.0,
                    step: dr,
                    copies,
                    division: None,
                },
                polar(r0, s, phi, z),
                command.angle,
            );
        }

        self.repeat(command, copies, |inst, base, frame| {
            let r = r0 + f64::from(inst) * dr;
            frame.shift_from(base, polar(r, s, phi, z));
        })
    }

    fn mpos_x(&mut self, command: &Command, scope: &Scope) -> TranslateResult<()> {
        let doc = &*self.doc;
        let units = command.units;
        let copies = command.copies(doc, scope)?;
        let x0 = command.length(doc, "X0")?;
        let dx = command.length(doc, "dX")?;
        let [y, z] = attributes::reals::<2>(doc, command.element, "Y_Z")?;
        let (y, z) = (units.length(y), units.length(z));
        let s = command.length(doc, "S")?;

        if command.divisible(scope, Some(CARTESIAN)) {
            return self.divide(
                command,
                scope,
                command.frame.clone(),
                Partition {
                    axis: DivisionAxis::X,
                    start: x0 - dx / 2.0,
                    step: dx,
                    copies,
                    division: None,
                },
                DVec3::new(0.0, y + s, z),
                command.angle,
            );
        }

        self.repeat(command, copies, |inst, base, frame| {
            let x = x0 + f64::from(inst) * dx;
            frame.shift_from(base, DVec3::new(x, y + s, z));
        })
    }

    fn mpos_y(&mut self, command: &Command, scope: &Scope) -> TranslateResult<()> {
        let doc = &*self.doc;
        let units = command.units;
        let copies = command.copies(doc, scope)?;
        let y0 = command.length(doc, "Y0")?;
        let dy = command.length(doc, "dY")?;
        let [z, x] = attributes::reals::<2>(doc, command.element, "Z_X")?;
        let (z, x) = (units.length(z), units.length(x));
        let s = command.length(doc, "S")?;

        if command.divisible(scope, Some(CARTESIAN)) {
            return self.divide(
                command,
                scope,
                command.frame.clone(),
                Partition {
                    axis: DivisionAxis::Y,
                    start: y0 - dy / 2.0,
                    step: dy,
                    copies,
                    division: None,
                },
                DVec3::new(x + s, 0.0, z),
                command.angle,
            );
        }

        self.repeat(command, copies, |inst, base, frame| {
            let y = y0 + f64::from(inst) * dy;
            frame.shift_from(base, DVec3::new(x + s, y, z));
        })
    }

    fn mpos_z(&mut self, command: &Command, scope: &Scope) -> TranslateResult<()> {
        let doc = &*self.doc;
        let units = command.units;
        let copies = command.copies(doc, scope)?;
        let z0 = command.length(doc, "Z0")?;
        let dz = command.length(doc, "dZ")?;
        let (x, y) = if doc.non_empty_attribute(command.element, "X_Y").is_some() {
            let [x, y] = attributes::reals::<2>(doc, command.element, "X_Y")?;
            (units.length(x), units.length(y))
        } else {
            let [r, phi] = attributes::reals::<2>(doc, command.element, "R_Phi")?;
            let (sin, cos) = units.angle(phi).sin_cos();
            (units.length(r * cos), units.length(r * sin))
        };
        let s = command.length(doc, "S")?;
        let (sin, cos) = y.atan2(x).sin_cos();
        let (x, y) = (x - s * sin, y + s * cos);

        if command.divisible(scope, None) {
            return self.divide(
                command,
                scope,
                command.frame.clone(),
                Partition {
                    axis: DivisionAxis::Z,
                    start: z0 - dz / 2.0,
                    step: dz,
                    copies,
                    division: None,
                },
                DVec3::new(x, y, 0.0),
                command.angle,
            );
        }

        self.repeat(command, copies, |inst, base, frame| {
            let z = z0 + f64::from(inst) * dz;
            frame.shift_from(base, DVec3::new(x, y, z));
        })
    }

    /// Place `copies` explicit instances of the target.
    ///
    /// `locate` moves the working frame for copy `inst`, given the frame the
    /// command started from; identifiers advance by their step between
    /// copies.
    fn repeat<F>(&mut self, command: &Command, copies: u32, mut locate: F) -> TranslateResult<()>
    where
        F: FnMut(u32, &ReferenceFrame, &mut ReferenceFrame),
    {
        let base = command.frame.clone();
        let mut frame = base.clone();
        frame.rotate(command.angle);
        for inst in 0..copies {
            if inst > 0 {
                advance_identifiers(&mut frame.identifiers, self.doc.name(command.target))?;
            }
            locate(inst, &base, &mut frame);
            self.place_volume(command.target, &frame)?;
        }
        Ok(())
    }

    /// Azimuthal offset of the target's profile mid-angle, in radians.
    ///
    /// The profile is read from the target's envelope when it has one.
    fn profile_offset(&self, target: ElementId, units: &UnitContext) -> TranslateResult<Option<f64>> {
        let doc = &*self.doc;
        let shape = match doc.non_empty_attribute(target, "envelope") {
            Some(name) => doc.lookup(name).ok_or_else(|| TranslateError::UnknownVolume {
                context: format!("envelope of \"{}\"", doc.name(target)),
                name: name.to_string(),
            })?,
            None => target,
        };
        if doc.non_empty_attribute(shape, "profile").is_none() {
            return Ok(None);
        }
        let [phi1, dphi1] = attributes::reals::<2>(doc, shape, "profile")?;
        let shape_units = units.overlay(doc, shape)?;
        Ok(Some(shape_units.angle(phi1 + dphi1 / 2.0)))
    }
}
