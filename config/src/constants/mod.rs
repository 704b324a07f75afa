//! Centralized configuration values shared across the HDDS translation pipeline.
//!
//! Each public item in this module documents its purpose and provides a minimal
//! usage example so that downstream crates can remain declarative and avoid
//! scattering literals.

use std::fmt;

// =============================================================================
// PRECISION CONSTANTS
// =============================================================================

/// Numerical tolerance used when checking frame orthonormality and comparing
/// derived material properties.
///
/// # Examples
/// ```
/// use config::constants::EPSILON_TOLERANCE;
/// assert!(EPSILON_TOLERANCE < 1.0e-6);
/// ```
pub const EPSILON_TOLERANCE: f64 = 1.0e-9;

/// Checks if a value is approximately zero within [`EPSILON_TOLERANCE`].
///
/// # Examples
/// ```
/// use config::constants::approx_zero;
/// assert!(approx_zero(1e-12));
/// assert!(!approx_zero(0.1));
/// ```
#[inline]
pub fn approx_zero(value: f64) -> bool {
    value.abs() < EPSILON_TOLERANCE
}

// =============================================================================
// RECURSION LIMITS
// =============================================================================

/// Bytes of stack space reserved when growing recursion limits using the
/// `stacker` crate.
///
/// # Examples
/// ```
/// use config::constants::STACKER_STACK_SIZE_BYTES;
/// assert!(STACKER_STACK_SIZE_BYTES >= 1024);
/// ```
pub const STACKER_STACK_SIZE_BYTES: usize = 8 * 1024 * 1024;

/// Remaining stack below which `stacker` allocates a fresh segment.
///
/// # Examples
/// ```
/// use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
/// assert!(STACKER_RED_ZONE_BYTES < STACKER_STACK_SIZE_BYTES);
/// ```
pub const STACKER_RED_ZONE_BYTES: usize = STACKER_STACK_SIZE_BYTES / 8;

/// Maximum nesting depth of volumes before the composer gives up.
///
/// Real detector descriptions nest a few dozen levels; anything beyond this is
/// a volume that (indirectly) places itself.
///
/// # Examples
/// ```
/// use config::constants::MAX_RECURSION_DEPTH;
/// assert!(MAX_RECURSION_DEPTH >= 64);
/// ```
pub const MAX_RECURSION_DEPTH: usize = 256;

// =============================================================================
// NAMING CONVENTIONS
// =============================================================================

/// Name of the volume translated when the caller does not pick one.
pub const DEFAULT_ROOT_VOLUME: &str = "everything";

/// Substring marking compositions whose contents sit in a mapped field.
pub const MAPPED_FIELD_MARKER: &str = "fieldVolume";

/// Substring marking compositions whose contents sit in a uniform field.
pub const UNIFORM_FIELD_MARKER: &str = "Magnet";

/// Base value of the per-axis division name counters.
///
/// The first division along an axis is named with `DIVISION_NAME_BASE + 1`
/// rendered as three lower-case hex digits, e.g. `sd01`.
///
/// # Examples
/// ```
/// use config::constants::DIVISION_NAME_BASE;
/// assert_eq!(format!("s{:03x}", DIVISION_NAME_BASE + 1), "sd01");
/// ```
pub const DIVISION_NAME_BASE: u32 = 0xd00;

// =============================================================================
// TRANSLATION CONFIG
// =============================================================================

/// Immutable snapshot of the settings a translation run is driven by.
///
/// # Examples
/// ```
/// use config::constants::TranslationConfig;
/// let config = TranslationConfig::default();
/// assert_eq!(config.root_volume, "everything");
/// assert!(config.tolerance > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Name of the volume the translation starts from.
    pub root_volume: String,
    /// Numeric tolerance for orthonormality and zero checks.
    pub tolerance: f64,
    /// Maximum volume nesting depth.
    pub max_depth: usize,
}

impl TranslationConfig {
    /// Builds a configuration enforcing strict validation of the supplied
    /// values.
    ///
    /// # Examples
    /// ```
    /// use config::constants::TranslationConfig;
    /// let cfg = TranslationConfig::new("HALL", 1.0e-6, 32).expect("valid config");
    /// assert_eq!(cfg.max_depth, 32);
    /// ```
    pub fn new(
        root_volume: impl Into<String>,
        tolerance: f64,
        max_depth: usize,
    ) -> Result<Self, ConfigError> {
        let root_volume = root_volume.into();
        if root_volume.trim().is_empty() {
            return Err(ConfigError::EmptyRootVolume);
        }
        if tolerance <= 0.0 || !tolerance.is_finite() {
            return Err(ConfigError::InvalidTolerance(tolerance));
        }
        if max_depth == 0 {
            return Err(ConfigError::InvalidDepth(max_depth));
        }
        Ok(Self {
            root_volume,
            tolerance,
            max_depth,
        })
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            root_volume: DEFAULT_ROOT_VOLUME.to_string(),
            tolerance: EPSILON_TOLERANCE,
            max_depth: MAX_RECURSION_DEPTH,
        }
    }
}

/// Error returned when invalid configuration values are provided.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Raised when the root volume name is blank.
    EmptyRootVolume,
    /// Raised when tolerance is zero, negative or not finite.
    InvalidTolerance(f64),
    /// Raised when the depth limit would forbid even the root volume.
    InvalidDepth(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyRootVolume => write!(f, "root volume name must not be empty"),
            ConfigError::InvalidTolerance(value) => {
                write!(f, "tolerance must be positive: {value}")
            }
            ConfigError::InvalidDepth(value) => {
                write!(f, "max_depth must be >= 1: {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests;
