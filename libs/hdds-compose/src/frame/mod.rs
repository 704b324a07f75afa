//! # Reference Frames
//!
//! Coordinate system accumulated while descending the volume tree.
//!
//! A frame carries the position and orientation of the local system in the
//! root frame, plus the branch state the composer needs further down: the
//! mother volume, the magnetic field tag, the azimuthal offset of enclosing
//! divisions, the active volume identifiers and the current partition.
//!
//! ## Conventions
//!
//! - The orientation `R` maps local vectors into the mother frame: a shift
//!   by `v` moves the origin by `R·v`
//! - Angles are radians, lengths are cm
//! - Rotations compose intrinsically about z, then y, then x
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//! use hdds_compose::frame::{ReferenceFrame, RotationState};
//!
//! let mut frame = ReferenceFrame::default();
//! frame.rotate(DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2));
//! frame.shift(DVec3::new(1.0, 0.0, 0.0));
//! assert_eq!(frame.rotation, RotationState::Dirty);
//! assert!((frame.origin.y - 1.0).abs() < 1e-12);
//! ```

use config::constants::{MAPPED_FIELD_MARKER, UNIFORM_FIELD_MARKER};
use glam::{DMat3, DVec3};
use hdds_document::ElementId;
use serde::Serialize;
use std::fmt;
use tracing::trace;

// =============================================================================
// BRANCH STATE
// =============================================================================

/// Registration state of a frame's orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RotationState {
    /// The orientation is the identity.
    #[default]
    Identity,
    /// The orientation has been registered under this id.
    Registered(u32),
    /// The orientation changed and has no id yet.
    Dirty,
}

/// Magnetic field tag attached to solids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MagneticField {
    /// No field.
    #[default]
    None,
    /// Field taken from a map.
    Mapped,
    /// Uniform field.
    Uniform,
}

impl MagneticField {
    /// Numeric tracking code of the field kind.
    pub fn code(self) -> u8 {
        match self {
            MagneticField::None => 0,
            MagneticField::Mapped => 2,
            MagneticField::Uniform => 3,
        }
    }

    /// Field kind implied by a volume name, if any.
    ///
    /// `fieldVolume` wins over `Magnet` when a name contains both.
    pub fn from_volume_name(name: &str) -> Option<Self> {
        if name.contains(MAPPED_FIELD_MARKER) {
            Some(MagneticField::Mapped)
        } else if name.contains(UNIFORM_FIELD_MARKER) {
            Some(MagneticField::Uniform)
        } else {
            None
        }
    }
}

/// One active identifier field: its value for the current copy and the
/// increment applied between copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeIdentifier {
    /// Field name, e.g. `layer`.
    pub field: String,
    /// Value for the current copy.
    pub value: i64,
    /// Increment per copy.
    pub step: i64,
}

/// Axis along which a division slices its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DivisionAxis {
    /// Cartesian x.
    X,
    /// Cartesian y.
    Y,
    /// Cartesian z (beam axis).
    Z,
    /// Cylindrical radius.
    Rho,
    /// Azimuth.
    Phi,
}

impl DivisionAxis {
    /// All axes in registry order.
    pub const ALL: [DivisionAxis; 5] = [
        DivisionAxis::Phi,
        DivisionAxis::Rho,
        DivisionAxis::X,
        DivisionAxis::Y,
        DivisionAxis::Z,
    ];

    /// Axis label as used by geometry backends.
    pub fn label(self) -> &'static str {
        match self {
            DivisionAxis::X => "x",
            DivisionAxis::Y => "y",
            DivisionAxis::Z => "z",
            DivisionAxis::Rho => "rho",
            DivisionAxis::Phi => "phi",
        }
    }

    /// Prefix of synthesized division names.
    pub fn name_prefix(self) -> char {
        match self {
            DivisionAxis::X => 'x',
            DivisionAxis::Y => 'y',
            DivisionAxis::Z => 'z',
            DivisionAxis::Rho => 'r',
            DivisionAxis::Phi => 's',
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            DivisionAxis::Phi => 0,
            DivisionAxis::Rho => 1,
            DivisionAxis::X => 2,
            DivisionAxis::Y => 3,
            DivisionAxis::Z => 4,
        }
    }
}

impl fmt::Display for DivisionAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Slicing of a container into equal copies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Partition {
    /// Slicing axis.
    pub axis: DivisionAxis,
    /// Lower edge of the first slice.
    pub start: f64,
    /// Slice width.
    pub step: f64,
    /// Number of slices.
    pub copies: u32,
    /// Synthetic division element, once created.
    pub division: Option<ElementId>,
}

// =============================================================================
// REFERENCE FRAME
// =============================================================================

/// Accumulated transform plus branch state at one point of the tree.
///
/// Frames are passed by value into the recursion and cloned at every branch
/// point, so a child can never disturb its siblings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrame {
    /// Position of the local system in the mother's frame.
    pub origin: DVec3,
    orientation: [[f64; 3]; 3],
    /// Registration state of the orientation.
    pub rotation: RotationState,
    /// Volume the current element is placed into.
    pub mother: Option<ElementId>,
    /// Field tag inherited by solids below this point.
    pub magnetic_field: MagneticField,
    /// Azimuthal offset of an enclosing division, radians.
    pub phi_offset: f64,
    /// Identifier fields stamped onto solids below this point.
    pub identifiers: Vec<VolumeIdentifier>,
    /// Division being built for the current placement, if any.
    pub partition: Option<Partition>,
}

const IDENTITY: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            origin: DVec3::ZERO,
            orientation: IDENTITY,
            rotation: RotationState::Identity,
            mother: None,
            magnetic_field: MagneticField::None,
            phi_offset: 0.0,
            identifiers: Vec::new(),
            partition: None,
        }
    }
}

impl ReferenceFrame {
    /// Orientation rows, row-major.
    pub fn rows(&self) -> [[f64; 3]; 3] {
        self.orientation
    }

    /// Orientation as a matrix.
    pub fn orientation(&self) -> DMat3 {
        DMat3::from_cols_array_2d(&self.orientation).transpose()
    }

    /// Restore the identity transform, keeping the branch state.
    pub fn reset(&mut self) -> &mut Self {
        self.origin = DVec3::ZERO;
        self.orientation = IDENTITY;
        self.rotation = RotationState::Identity;
        self
    }

    /// Translate the origin by a vector given in the local axes.
    pub fn shift(&mut self, local: DVec3) -> &mut Self {
        let m = &self.orientation;
        self.origin += DVec3::new(
            m[0][0] * local.x + m[0][1] * local.y + m[0][2] * local.z,
            m[1][0] * local.x + m[1][1] * local.y + m[1][2] * local.z,
            m[2][0] * local.x + m[2][1] * local.y + m[2][2] * local.z,
        );
        self
    }

    /// Take the origin of another frame.
    pub fn shift_to(&mut self, other: &ReferenceFrame) -> &mut Self {
        self.origin = other.origin;
        self
    }

    /// Take the origin of `base` shifted by `local` in `base`'s axes.
    pub fn shift_from(&mut self, base: &ReferenceFrame, local: DVec3) -> &mut Self {
        let mut shifted = base.clone();
        shifted.shift(local);
        self.shift_to(&shifted)
    }

    /// Rotate the local axes by `omega` (radians about z, then y, then x).
    ///
    /// A zero vector leaves the frame untouched; anything else marks the
    /// rotation dirty.
    pub fn rotate(&mut self, omega: DVec3) -> &mut Self {
        if omega == DVec3::ZERO {
            return self;
        }
        let (sx, cx) = omega.x.sin_cos();
        let (sy, cy) = omega.y.sin_cos();
        let (sz, cz) = omega.z.sin_cos();

        for row in self.orientation.iter_mut() {
            let x0 = row[0] * cz + row[1] * sz;
            let x1 = row[1] * cz - row[0] * sz;
            let x2 = row[2];

            let xx0 = x0 * cy - x2 * sy;
            let xx1 = x1;
            let xx2 = x2 * cy + x0 * sy;

            row[0] = xx0;
            row[1] = xx1 * cx + xx2 * sx;
            row[2] = xx2 * cx - xx1 * sx;
        }
        self.rotation = RotationState::Dirty;
        trace!(?omega, "frame rotated");
        self
    }

    /// Take the orientation and rotation state of another frame.
    pub fn rotate_to(&mut self, other: &ReferenceFrame) -> &mut Self {
        self.orientation = other.orientation;
        self.rotation = other.rotation;
        self
    }

    /// Take the orientation of `base` rotated by `omega`.
    pub fn rotate_from(&mut self, base: &ReferenceFrame, omega: DVec3) -> &mut Self {
        let mut rotated = base.clone();
        rotated.rotate(omega);
        self.rotate_to(&rotated)
    }

    /// Polar and azimuthal angles, in degrees, of each rotated axis.
    ///
    /// Entry `i` describes orientation column `i`:
    /// `theta = atan2(√(m0ᵢ² + m1ᵢ²), m2ᵢ)`, `phi = atan2(m1ᵢ, m0ᵢ)`.
    pub fn axis_angles(&self) -> [(f64, f64); 3] {
        let m = &self.orientation;
        let mut angles = [(0.0, 0.0); 3];
        for (i, angle) in angles.iter_mut().enumerate() {
            let r = m[0][i].hypot(m[1][i]);
            *angle = (
                r.atan2(m[2][i]).to_degrees(),
                m[1][i].atan2(m[0][i]).to_degrees(),
            );
        }
        angles
    }

    /// Whether the origin lies on the beam axis within `tolerance`.
    pub fn is_on_axis(&self, tolerance: f64) -> bool {
        self.origin.x.abs() <= tolerance && self.origin.y.abs() <= tolerance
    }

    /// Whether the orientation is orthonormal within `tolerance`.
    pub fn is_orthonormal(&self, tolerance: f64) -> bool {
        let m = self.orientation();
        (m * m.transpose()).abs_diff_eq(DMat3::IDENTITY, tolerance)
    }
}
