//! Tests for the centralized configuration constants.

use super::*;

/// Ensures default constants are sane and positive.
///
/// # Examples
/// ```
/// use config::constants::TranslationConfig;
/// let cfg = TranslationConfig::default();
/// assert!(cfg.tolerance > 0.0);
/// ```
#[test]
fn default_constants_are_valid() {
    let cfg = TranslationConfig::default();
    assert!(cfg.tolerance > 0.0);
    assert!(cfg.max_depth >= 1);
    assert_eq!(cfg.root_volume, DEFAULT_ROOT_VOLUME);
}

/// Validates the builder rejects invalid values.
///
/// # Examples
/// ```
/// use config::constants::TranslationConfig;
/// assert!(TranslationConfig::new("HALL", 0.0, 24).is_err());
/// ```
#[test]
fn new_validates_inputs() {
    assert_eq!(
        TranslationConfig::new("HALL", 0.0, 24).unwrap_err(),
        ConfigError::InvalidTolerance(0.0)
    );
    assert_eq!(
        TranslationConfig::new("HALL", 1.0e-9, 0).unwrap_err(),
        ConfigError::InvalidDepth(0)
    );
    assert_eq!(
        TranslationConfig::new("  ", 1.0e-9, 8).unwrap_err(),
        ConfigError::EmptyRootVolume
    );
}

#[test]
fn division_names_start_after_base() {
    assert_eq!(format!("x{:03x}", DIVISION_NAME_BASE + 1), "xd01");
    assert_eq!(format!("z{:03x}", DIVISION_NAME_BASE + 0x10), "zd10");
}
