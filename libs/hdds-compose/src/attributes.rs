//! Numeric attribute readers.
//!
//! HDDS stores vectors as whitespace-separated lists (`X_Y_Z="0 0 65"`). An
//! absent or blank attribute reads as zeros; a present one must hold enough
//! well-formed numbers.

use hdds_document::{Document, ElementId};

use crate::error::{TranslateError, TranslateResult};

/// Read a fixed-length list of reals.
pub(crate) fn reals<const N: usize>(
    doc: &Document,
    el: ElementId,
    attribute: &str,
) -> TranslateResult<[f64; N]> {
    let mut values = [0.0; N];
    let Some(raw) = doc.non_empty_attribute(el, attribute) else {
        return Ok(values);
    };
    let mut tokens = raw.split_whitespace();
    for (i, slot) in values.iter_mut().enumerate() {
        let token = tokens
            .next()
            .ok_or_else(|| malformed(doc, el, attribute, raw, format!("expected {N} numbers, found {i}")))?;
        *slot = token
            .parse()
            .map_err(|_| malformed(doc, el, attribute, raw, format!("\"{token}\" is not a number")))?;
    }
    Ok(values)
}

/// Read a single real, zero when absent.
pub(crate) fn real(doc: &Document, el: ElementId, attribute: &str) -> TranslateResult<f64> {
    Ok(optional_real(doc, el, attribute)?.unwrap_or(0.0))
}

/// Read a single real, `None` when absent.
pub(crate) fn optional_real(
    doc: &Document,
    el: ElementId,
    attribute: &str,
) -> TranslateResult<Option<f64>> {
    match doc.non_empty_attribute(el, attribute) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| malformed(doc, el, attribute, raw, "not a number".to_string())),
    }
}

/// Read a single integer, zero when absent.
pub(crate) fn integer(doc: &Document, el: ElementId, attribute: &str) -> TranslateResult<i64> {
    match doc.non_empty_attribute(el, attribute) {
        None => Ok(0),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| malformed(doc, el, attribute, raw, "not an integer".to_string())),
    }
}

/// Whether an attribute is literally `true`.
pub(crate) fn flag(doc: &Document, el: ElementId, attribute: &str) -> bool {
    doc.attribute(el, attribute) == Some("true")
}

fn malformed(
    doc: &Document,
    el: ElementId,
    attribute: &str,
    value: &str,
    reason: String,
) -> TranslateError {
    TranslateError::MalformedAttribute {
        tag: doc.tag(el).to_string(),
        attribute: attribute.to_string(),
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(markup: &str) -> (Document, ElementId) {
        let doc = Document::parse_str(markup).unwrap();
        let root = doc.root().unwrap();
        (doc, root)
    }

    #[test]
    fn reads_lists_and_defaults() {
        let (doc, el) = element(r#"<posXYZ X_Y_Z="1 -2.5 3e1" rot=""/>"#);
        assert_eq!(reals::<3>(&doc, el, "X_Y_Z").unwrap(), [1.0, -2.5, 30.0]);
        assert_eq!(reals::<3>(&doc, el, "rot").unwrap(), [0.0; 3]);
        assert_eq!(reals::<2>(&doc, el, "R_Z").unwrap(), [0.0; 2]);
    }

    #[test]
    fn short_lists_are_malformed() {
        let (doc, el) = element(r#"<posXYZ X_Y_Z="1 2"/>"#);
        let err = reals::<3>(&doc, el, "X_Y_Z").unwrap_err();
        assert!(matches!(err, TranslateError::MalformedAttribute { ref attribute, .. } if attribute == "X_Y_Z"));
    }

    #[test]
    fn scalars() {
        let (doc, el) = element(r#"<mposPhi ncopy="12" Phi0="7.5" impliedRot="true" S="x"/>"#);
        assert_eq!(integer(&doc, el, "ncopy").unwrap(), 12);
        assert_eq!(real(&doc, el, "Phi0").unwrap(), 7.5);
        assert_eq!(optional_real(&doc, el, "dPhi").unwrap(), None);
        assert!(flag(&doc, el, "impliedRot"));
        assert!(real(&doc, el, "S").is_err());
    }
}
