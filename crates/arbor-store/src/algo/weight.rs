// SPDX-License-Identifier: Apache-2.0
//! Edge-weight extraction and inversion.
//!
//! Weights live in the edge payload under a string key (`"weight"` unless
//! the caller names another property). A missing or non-numeric value falls
//! back to the configured default.
//!
//! When a caller prefers *higher* weights, selection runs on the reciprocal:
//! `1/w` for positive `w`, and `f64::MAX` for zero or negative weights (a
//! non-positive weight cannot be meaningfully maximized, so it sorts last).
//! Reported totals always sum the stored weights, never the inverted ones.
use arbor_model::EdgeRecord;
use serde_json::Value;

/// The stored weight of an edge under `property`, or `default`.
pub(crate) fn stored(edge: &EdgeRecord, property: &str, default: f64) -> f64 {
    edge.data
        .get(property)
        .and_then(Value::as_f64)
        .unwrap_or(default)
}

/// The weight used for selection: identity when minimizing, reciprocal
/// when maximizing.
pub(crate) fn selection(stored: f64, prefer_lower: bool) -> f64 {
    if prefer_lower {
        stored
    } else if stored > 0.0 {
        1.0 / stored
    } else {
        f64::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::DataMap;
    use serde_json::json;

    fn edge_with(value: Value) -> EdgeRecord {
        let mut data = DataMap::new();
        data.insert("weight".to_owned(), value);
        EdgeRecord::new("a", "b", data)
    }

    #[test]
    fn numeric_weights_are_read_from_the_payload() {
        assert_eq!(stored(&edge_with(json!(2.5)), "weight", 1.0), 2.5);
        assert_eq!(stored(&edge_with(json!(3)), "weight", 1.0), 3.0);
    }

    #[test]
    fn missing_or_non_numeric_weights_fall_back() {
        assert_eq!(stored(&edge_with(json!("heavy")), "weight", 1.0), 1.0);
        let bare = EdgeRecord::new("a", "b", DataMap::new());
        assert_eq!(stored(&bare, "weight", 4.0), 4.0);
    }

    #[test]
    fn inversion_is_reciprocal_with_a_safe_fallback() {
        assert_eq!(selection(2.0, false), 0.5);
        assert_eq!(selection(2.0, true), 2.0);
        assert_eq!(selection(0.0, false), f64::MAX);
        assert_eq!(selection(-3.0, false), f64::MAX);
    }
}
