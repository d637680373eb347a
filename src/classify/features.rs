//! Fixed-order feature vectors for the line classifier.
//!
//! The order of [`FEATURE_ORDER`] is a contract with every trained model:
//! changing it invalidates existing artifacts.

use serde::{Deserialize, Serialize};

use crate::model::Line;

use super::Insights;

/// Nominal page height used to normalise `top`.
pub const NOMINAL_PAGE_HEIGHT: f64 = 800.0;

/// Number of features per line.
pub const FEATURE_COUNT: usize = 13;

/// Feature names in vector order.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "word_count",
    "has_symbol",
    "starts_with_number",
    "ends_with_punctuation",
    "is_paragraph_font",
    "is_heading_size",
    "normalized_top",
    "is_tiny",
    "is_numeric_only",
    "alpha_ratio",
    "digit_ratio",
    "symbol_ratio",
    "has_math_symbol",
];

/// Numeric description of one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Build the feature vector of a repaired line.
    pub fn from_line(line: &Line, insights: &Insights) -> Self {
        let is_paragraph_font = insights
            .paragraph_font
            .as_deref()
            .map_or(false, |font| line.has_font(font));
        let is_heading_size = insights
            .heading_size
            .map_or(false, |size| line.has_size(size));
        let f = &line.features;

        Self([
            line.word_count as f64,
            flag(line.has_symbol),
            flag(line.starts_with_number),
            flag(line.ends_with_punctuation),
            flag(is_paragraph_font),
            flag(is_heading_size),
            round3(line.layout.top as f64 / NOMINAL_PAGE_HEIGHT),
            flag(f.is_tiny),
            flag(f.is_numeric_only),
            round3(f.alpha_ratio),
            round3(f.digit_ratio),
            round3(f.symbol_ratio),
            flag(f.has_math_symbol),
        ])
    }

    /// Feature value by index.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Feature value by name.
    pub fn by_name(&self, name: &str) -> Option<f64> {
        FEATURE_ORDER
            .iter()
            .position(|n| *n == name)
            .map(|i| self.0[i])
    }

    /// The features as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Feature names as owned strings, for artifacts.
pub fn feature_names() -> Vec<String> {
    FEATURE_ORDER.iter().map(|s| s.to_string()).collect()
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SizeKey, TextFeatures};
    use indexmap::IndexMap;

    fn insights() -> Insights {
        Insights {
            paragraph_font: Some("Times".to_string()),
            heading_fonts: vec!["Times-Bold".to_string()],
            paragraph_size: Some(SizeKey::from_points(12.0)),
            heading_size: Some(SizeKey::from_points(16.0)),
        }
    }

    fn heading_line() -> Line {
        let mut sizes = IndexMap::new();
        sizes.insert(SizeKey::from_points(16.0), 1);
        let mut fonts = IndexMap::new();
        fonts.insert("Times-Bold".to_string(), 1);
        let mut line = Line::new("1. Introduction", 0, 0, 100.0, sizes, fonts);
        line.features = TextFeatures {
            is_tiny: true,
            is_numeric_only: false,
            alpha_ratio: 12.0 / 15.0,
            digit_ratio: 1.0 / 15.0,
            symbol_ratio: 1.0 / 15.0,
            has_math_symbol: false,
        };
        line
    }

    #[test]
    fn test_feature_vector_order() {
        let v = FeatureVector::from_line(&heading_line(), &insights());
        assert_eq!(
            v.0,
            [2.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.125, 1.0, 0.0, 0.8, 0.067, 0.067, 0.0]
        );
        assert_eq!(v.by_name("is_heading_size"), Some(1.0));
        assert_eq!(v.by_name("missing"), None);
    }

    #[test]
    fn test_absent_insights_disable_signals() {
        let v = FeatureVector::from_line(&heading_line(), &Insights::default());
        assert_eq!(v.by_name("is_paragraph_font"), Some(0.0));
        assert_eq!(v.by_name("is_heading_size"), Some(0.0));
    }

    #[test]
    fn test_serializes_as_array() {
        let v = FeatureVector([0.0; FEATURE_COUNT]);
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(feature_names().len(), FEATURE_COUNT);
    }
}
