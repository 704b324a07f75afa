//! # Translation Errors
//!
//! Error types for geometry composition. All errors are fatal: the run stops
//! at the first violation and the emitter never sees a partial stream.
//!
//! ## Error Policy
//!
//! - *Structural* errors reject tree shapes the engine does not translate
//! - *Physical* errors reject materials whose properties cannot be resolved
//! - Every message names the offending element or attribute

use hdds_document::DocumentError;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while translating a geometry description.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TranslateError {
    /// Boolean solids have no counterpart in the target geometry model.
    #[error("boolean {tag} operator in volume \"{volume}\" is not supported")]
    BooleanSolid {
        /// `union`, `intersection` or `subtraction`.
        tag: String,
        /// Name of the offending volume.
        volume: String,
    },

    /// Stacks must be written as compositions instead.
    #[error("stack {tag} in volume \"{volume}\" is not supported, use a composition instead")]
    StackedContainer {
        /// `stackX`, `stackY` or `stackZ`.
        tag: String,
        /// Name of the offending volume.
        volume: String,
    },

    /// A composition contains a child that is not a placement command.
    #[error("composition of volume \"{volume}\" contains unknown tag <{tag}>")]
    UnknownCommand {
        /// Name of the composition.
        volume: String,
        /// The unrecognized tag.
        tag: String,
    },

    /// A reference names no element of the document.
    #[error("{context} refers to unknown volume or material \"{name}\"")]
    UnknownVolume {
        /// What made the reference.
        context: String,
        /// The missing name.
        name: String,
    },

    /// An envelope was claimed by a second, different content element.
    #[error("re-use of envelope \"{envelope}\" by \"{volume}\" is not allowed (already contains \"{contains}\")")]
    EnvelopeReuse {
        /// The envelope shape.
        envelope: String,
        /// The element that already owns the envelope.
        contains: String,
        /// The element trying to use it.
        volume: String,
    },

    /// A repeated placement asked for zero or negative copies.
    #[error("volume \"{volume}\" is positioned with {count} copies")]
    InvalidCopyCount {
        /// Name of the composition holding the command.
        volume: String,
        /// Requested copy count.
        count: i64,
    },

    /// Advancing an identifier field left the range of `i64`.
    #[error("identifier field \"{field}\" of volume \"{volume}\" overflows")]
    IdentifierOverflow {
        /// Volume being placed.
        volume: String,
        /// Field name.
        field: String,
    },

    /// A repeated placement would be divided, but its composition has no
    /// mother volume to slice.
    #[error("composition \"{volume}\" cannot divide a container without a mother volume")]
    DivisionWithoutMother {
        /// Name of the composition.
        volume: String,
    },

    /// A backend cannot partition along the requested axis.
    #[error("volume \"{volume}\" is divided along unsupported axis \"{axis}\"")]
    UnsupportedDivisionAxis {
        /// Name of the divided container.
        volume: String,
        /// Axis label.
        axis: String,
    },

    /// A unit token was not recognized.
    #[error("unknown {attribute} \"{token}\" on <{tag}>")]
    UnknownUnit {
        /// Attribute that carried the token.
        attribute: String,
        /// The unrecognized token.
        token: String,
        /// Tag of the element.
        tag: String,
    },

    /// An attribute could not be read as the expected numbers.
    #[error("attribute {attribute}=\"{value}\" on <{tag}> is malformed: {reason}")]
    MalformedAttribute {
        /// Tag of the element.
        tag: String,
        /// Attribute name.
        attribute: String,
        /// Raw value.
        value: String,
        /// What was expected.
        reason: String,
    },

    /// A compound material lists an ingredient the engine cannot mix.
    #[error("error processing composite \"{material}\": {reason}")]
    InvalidComponent {
        /// Name of the compound.
        material: String,
        /// Description of the violation.
        reason: String,
    },

    /// Volumes nest deeper than the configured limit, usually a cycle.
    #[error("volume \"{volume}\" nests deeper than {limit} levels")]
    RecursionLimit {
        /// Volume at which the limit was hit.
        volume: String,
        /// Configured limit.
        limit: usize,
    },

    /// A material has no density and none can be derived.
    #[error("{tag} \"{material}\", atomic number {atomic_number}, atomic weight {atomic_weight} is missing a density specification")]
    MissingDensity {
        /// Tag of the material definition.
        tag: String,
        /// Name of the material.
        material: String,
        /// Resolved atomic number.
        atomic_number: f64,
        /// Resolved atomic weight.
        atomic_weight: f64,
    },

    /// The document collaborator rejected an operation.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
}

impl TranslateError {
    /// Whether the error rejects the shape of the input tree.
    pub fn is_structural(&self) -> bool {
        !self.is_physical()
    }

    /// Whether the error rejects a physical property of the input.
    pub fn is_physical(&self) -> bool {
        matches!(self, TranslateError::MissingDensity { .. })
    }
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================

/// Result type alias for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

// =============================================================================
// TESTS
// =============================================================================
